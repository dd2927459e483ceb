//! Month calendar for a feed of timed events.
//!
//! Events flow one way: the feed payload is parsed into [`api::RawEvent`]s,
//! each event is expanded into the calendar days it touches, packed into
//! lanes per day, and collected into an immutable [`calendar::EventIndex`]
//! that the terminal UI queries per day cell.

pub mod api;
pub mod app;
pub mod calendar;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod presentation;
pub mod status;
pub mod translate;
pub mod ui;
