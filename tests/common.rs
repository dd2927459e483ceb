#![allow(dead_code)]
use chrono::{FixedOffset, NaiveDate};
use std::future::Future;

use eventy::calendar::{CalendarDay, LayoutOptions};
use eventy::feed::EventSource;
use eventy::translate::Translator;

/// Feed stand-in that always answers with the same body ("" = unavailable).
pub struct StubSource {
    body: String,
}

impl StubSource {
    pub fn serving(body: &str) -> Self {
        Self {
            body: body.to_string(),
        }
    }

    pub fn offline() -> Self {
        Self::serving("")
    }
}

impl EventSource for StubSource {
    fn fetch(&self, _revision: u64) -> impl Future<Output = String> + Send {
        let body = self.body.clone();
        async move { body }
    }
}

pub fn utc_options() -> LayoutOptions {
    LayoutOptions::new(FixedOffset::east_opt(0).unwrap(), Translator::identity())
}

pub fn day(y: i32, m: u32, d: u32) -> CalendarDay {
    CalendarDay::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Two overlapping events in early May 2024.
pub const MAY_FEED: &str = r#"[
    {"id": 1, "name": "Moonfire Faire", "begin": "2024-05-01 08:00:00Z", "end": "2024-05-03 14:59:00Z", "special": false, "pvp": false, "url": "https://eu.example.com/news/1"},
    {"id": 2, "name": "Maintenance", "begin": "2024-05-02 02:00:00Z", "end": "2024-05-02 06:00:00Z", "special": false, "pvp": false, "url": ""}
]"#;
