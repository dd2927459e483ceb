pub mod client;
pub mod models;

pub use client::FeedClient;
pub use models::RawEvent;
