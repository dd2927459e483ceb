//! Query side of the calendar: which days a month view shows, what each cell
//! contains, and the text shown for an event. Holds no state of its own.

use chrono::{Datelike, Days, FixedOffset, Months, NaiveDate};
use tracing::{info, warn};

use crate::calendar::{CalendarDay, EventIndex, LaidOutEvent};
use crate::config::{Settings, Subdomain};

pub const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// The month currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthView {
    first: NaiveDate,
}

impl MonthView {
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    pub fn days_in_month(&self) -> u32 {
        match self.first.checked_add_months(Months::new(1)) {
            Some(next) => (next - self.first).num_days() as u32,
            None => 31,
        }
    }

    pub fn shift_months(&self, months: i32) -> Self {
        let shifted = if months >= 0 {
            self.first.checked_add_months(Months::new(months as u32))
        } else {
            self.first.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        Self {
            first: shifted.unwrap_or(self.first),
        }
    }

    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string()
    }

    /// Sunday-first weeks covering the month, padded with neighbouring days.
    pub fn weeks(&self) -> Vec<[NaiveDate; 7]> {
        let lead = self.first.weekday().num_days_from_sunday();
        let start = self.first - Days::new(lead as u64);
        let rows = (lead + self.days_in_month()).div_ceil(7);

        (0..rows)
            .map(|row| {
                let mut week = [start; 7];
                for (col, slot) in week.iter_mut().enumerate() {
                    *slot = start + Days::new((row * 7) as u64 + col as u64);
                }
                week
            })
            .collect()
    }
}

/// Everything needed to draw one day cell.
#[derive(Debug, Clone)]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    /// First named special event of the day; tints the whole cell.
    pub special: Option<&'a LaidOutEvent>,
    /// Events drawn as lane bars, in placement order.
    pub lanes: Vec<&'a LaidOutEvent>,
}

pub fn day_cell<'a>(
    index: &'a EventIndex,
    date: NaiveDate,
    view: &MonthView,
    today: NaiveDate,
    settings: &Settings,
) -> DayCell<'a> {
    let events = index.lookup(CalendarDay::from_date(date));

    DayCell {
        date,
        in_month: view.contains(date),
        is_today: date == today,
        special: events.iter().find(|ev| ev.special && !ev.name.is_empty()),
        lanes: events
            .iter()
            .filter(|ev| !ev.special)
            .filter(|ev| !ev.is_pvp || settings.show_pvp)
            .collect(),
    }
}

/// Events listed for a selected day: everything but hidden PvP entries.
pub fn listed_events<'a>(index: &'a EventIndex, date: NaiveDate, settings: &Settings) -> Vec<&'a LaidOutEvent> {
    index
        .lookup(CalendarDay::from_date(date))
        .iter()
        .filter(|ev| !ev.is_pvp || settings.show_pvp)
        .collect()
}

/// `begin - end` in the display offset, with or without the time of day.
pub fn time_range(event: &LaidOutEvent, offset: &FixedOffset, with_time: bool) -> String {
    let layout = if with_time {
        "%A, %B %-d, %Y %H:%M"
    } else {
        "%A, %B %-d, %Y"
    };
    format!(
        "{} - {}",
        event.begin.with_timezone(offset).format(layout),
        event.end.with_timezone(offset).format(layout)
    )
}

pub fn tooltip(event: &LaidOutEvent, offset: &FixedOffset) -> String {
    format!("{}\n{}", event.name, time_range(event, offset, true))
}

/// URL to open for an event, rewritten for the chosen region.
pub fn event_url(event: &LaidOutEvent, subdomain: Subdomain) -> Option<String> {
    if event.url.is_empty() {
        None
    } else {
        Some(subdomain.apply(&event.url))
    }
}

/// Open an event's page in the browser. Returns whether anything was opened.
pub fn open_event(event: &LaidOutEvent, subdomain: Subdomain) -> bool {
    let Some(url) = event_url(event, subdomain) else {
        return false;
    };

    match opener::open(&url) {
        Ok(()) => {
            info!(%url, id = event.id, "opened event page");
            true
        }
        Err(e) => {
            warn!(%url, error = %e, "failed to open event page");
            false
        }
    }
}
