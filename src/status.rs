use chrono::{FixedOffset, NaiveDate};
use std::time::{Duration, Instant};

use crate::calendar::{CalendarDay, EventIndex, LaidOutEvent};
use crate::config::Settings;
use crate::presentation::time_range;

/// Minimum time between two recomputations of the status line.
pub const STATUS_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

const CLOCK: char = '◷';

/// Today's events condensed into one line plus a tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSummary {
    pub text: String,
    pub tooltip: Vec<String>,
    pub count: usize,
}

/// Summary for `today`, or `None` when the entry should be hidden.
pub fn summarize(
    index: &EventIndex,
    today: NaiveDate,
    settings: &Settings,
    offset: &FixedOffset,
) -> Option<StatusSummary> {
    if !settings.show_status_entry {
        return None;
    }

    let day = CalendarDay::from_date(today);
    let has_bucket = index.contains_day(day);
    let events: Vec<&LaidOutEvent> = index
        .lookup(day)
        .iter()
        .filter(|ev| settings.show_completed_events || !settings.is_completed(ev.id))
        .filter(|ev| settings.show_pvp || !ev.is_pvp)
        .collect();

    if settings.hide_for_zero_events && events.is_empty() {
        return None;
    }

    if !has_bucket {
        let text = if settings.use_short_version {
            format!("{} 0", CLOCK)
        } else {
            "No Events".to_string()
        };
        return Some(StatusSummary {
            text,
            tooltip: Vec::new(),
            count: 0,
        });
    }

    let text = if settings.use_short_version {
        format!("{} {}", CLOCK, events.len())
    } else {
        format!("Ongoing Events: {}", events.len())
    };

    let tooltip = events
        .iter()
        .flat_map(|ev| [ev.name.clone(), time_range(ev, offset, ev.special)])
        .collect();

    Some(StatusSummary {
        text,
        tooltip,
        count: events.len(),
    })
}

/// Throttled holder of the current status line. Lives on the foreground loop.
#[derive(Debug, Default)]
pub struct StatusBar {
    last_refresh: Option<Instant>,
    current: Option<StatusSummary>,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the throttle so the next `update` recomputes.
    pub fn force_refresh(&mut self) {
        self.last_refresh = None;
    }

    /// Recompute when the interval has passed. Returns whether it did.
    pub fn update(
        &mut self,
        now: Instant,
        index: &EventIndex,
        today: NaiveDate,
        settings: &Settings,
        offset: &FixedOffset,
    ) -> bool {
        if let Some(last) = self.last_refresh {
            if now.saturating_duration_since(last) < STATUS_REFRESH_INTERVAL {
                return false;
            }
        }

        self.last_refresh = Some(now);
        self.current = summarize(index, today, settings, offset);
        true
    }

    pub fn current(&self) -> Option<&StatusSummary> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RawEvent;
    use crate::calendar::LayoutOptions;
    use crate::translate::Translator;
    use chrono::{TimeZone, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn may(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn index() -> EventIndex {
        let ev = |id: i64, is_pvp: bool| RawEvent {
            id,
            name: format!("event {}", id),
            begin: Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 5, 3, 8, 0, 0).unwrap(),
            special: false,
            is_pvp,
            url: String::new(),
        };
        EventIndex::build(
            &[ev(1, false), ev(2, true), ev(3, false)],
            &LayoutOptions::new(utc(), Translator::identity()),
        )
    }

    #[test]
    fn counts_todays_events() {
        let summary = summarize(&index(), may(2), &Settings::default(), &utc()).unwrap();
        assert_eq!(summary.text, "Ongoing Events: 3");
        assert_eq!(summary.count, 3);
        assert_eq!(summary.tooltip.len(), 6);
        assert_eq!(summary.tooltip[0], "event 1");
    }

    #[test]
    fn filters_completed_and_pvp() {
        let mut settings = Settings::default();
        settings.show_pvp = false;
        settings.show_completed_events = false;
        settings.toggle_completed(1);

        let summary = summarize(&index(), may(2), &settings, &utc()).unwrap();
        assert_eq!(summary.count, 1);

        settings.use_short_version = true;
        let summary = summarize(&index(), may(2), &settings, &utc()).unwrap();
        assert_eq!(summary.text, "◷ 1");
    }

    #[test]
    fn empty_day_texts() {
        let mut settings = Settings::default();
        let summary = summarize(&index(), may(20), &settings, &utc()).unwrap();
        assert_eq!(summary.text, "No Events");

        settings.use_short_version = true;
        let summary = summarize(&index(), may(20), &settings, &utc()).unwrap();
        assert_eq!(summary.text, "◷ 0");
    }

    #[test]
    fn hidden_when_disabled_or_empty() {
        let mut settings = Settings::default();
        settings.hide_for_zero_events = true;
        assert_eq!(summarize(&index(), may(20), &settings, &utc()), None);

        // Bucket exists but everything is filtered away.
        settings.show_completed_events = false;
        for id in 1..=3 {
            settings.toggle_completed(id);
        }
        assert_eq!(summarize(&index(), may(2), &settings, &utc()), None);

        let settings = Settings {
            show_status_entry: false,
            ..Settings::default()
        };
        assert_eq!(summarize(&index(), may(2), &settings, &utc()), None);
    }

    #[test]
    fn throttles_to_five_seconds() {
        let index = index();
        let settings = Settings::default();
        let mut bar = StatusBar::new();
        let start = Instant::now();

        assert!(bar.update(start, &index, may(2), &settings, &utc()));
        assert_eq!(bar.current().unwrap().count, 3);

        assert!(!bar.update(start + Duration::from_secs(4), &index, may(20), &settings, &utc()));
        assert_eq!(bar.current().unwrap().count, 3);

        assert!(bar.update(start + Duration::from_secs(5), &index, may(20), &settings, &utc()));
        assert_eq!(bar.current().unwrap().text, "No Events");

        bar.force_refresh();
        assert!(bar.update(start + Duration::from_secs(6), &index, may(2), &settings, &utc()));
        assert_eq!(bar.current().unwrap().count, 3);
    }
}
