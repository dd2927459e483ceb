//! Event-to-day expansion, lane packing and the published day index.

pub mod day;
pub mod index;
pub mod lanes;

pub use day::{expand, CalendarDay, DaySpan};
pub use index::{color_for, EventIndex, LaidOutEvent, LayoutOptions, COLOR_POOL_SIZE};
pub use lanes::{first_day_offset, lane_number, LaneAssigner, BASE_LANE_OFFSET, LANE_STEP};
