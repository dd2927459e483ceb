use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::fmt;
use std::iter::FusedIterator;

use crate::api::RawEvent;
use crate::error::EventError;

/// A calendar date in the display offset. Only used as a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Truncate a timestamp to midnight in `offset`.
    pub fn of(ts: &DateTime<Utc>, offset: &FixedOffset) -> Self {
        Self(ts.with_timezone(offset).date_naive())
    }

    pub fn today(offset: &FixedOffset) -> Self {
        Self::of(&Utc::now(), offset)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Every calendar day from an event's begin date through its end date,
/// paired with its zero-based position in the span.
///
/// The sequence is lazy; clone it before iterating to walk it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySpan {
    first: NaiveDate,
    last: NaiveDate,
    next: Option<NaiveDate>,
    index: usize,
}

impl DaySpan {
    fn new(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            first,
            last,
            next: Some(first),
            index: 0,
        }
    }

    pub fn first_day(&self) -> CalendarDay {
        CalendarDay(self.first)
    }

    pub fn last_day(&self) -> CalendarDay {
        CalendarDay(self.last)
    }

    /// Same span positioned back at its first day.
    pub fn restart(&self) -> Self {
        Self::new(self.first, self.last)
    }
}

impl Iterator for DaySpan {
    type Item = (usize, CalendarDay);

    fn next(&mut self) -> Option<Self::Item> {
        let day = self.next?;
        let index = self.index;

        self.index += 1;
        self.next = if day < self.last { day.succ_opt() } else { None };

        Some((index, CalendarDay(day)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(day) => (self.last - day).num_days() as usize + 1,
            None => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DaySpan {}

impl FusedIterator for DaySpan {}

/// Enumerate the days an event touches. Fails up front on an inverted range,
/// so no partial span is ever observed.
pub fn expand(event: &RawEvent, offset: &FixedOffset) -> Result<DaySpan, EventError> {
    if !event.has_valid_range() {
        return Err(EventError::InvalidRange {
            id: event.id,
            begin: event.begin,
            end: event.end,
        });
    }

    Ok(DaySpan::new(
        CalendarDay::of(&event.begin, offset).date(),
        CalendarDay::of(&event.end, offset).date(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn event(begin: DateTime<Utc>, end: DateTime<Utc>) -> RawEvent {
        RawEvent {
            id: 1,
            name: "Test".to_string(),
            begin,
            end,
            special: false,
            is_pvp: false,
            url: String::new(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> CalendarDay {
        CalendarDay::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn single_day_event_yields_one_day() {
        let ev = event(
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 59).unwrap(),
        );
        let days: Vec<_> = expand(&ev, &utc()).unwrap().collect();
        assert_eq!(days, vec![(0, date(2024, 5, 1))]);
    }

    #[test]
    fn multi_day_event_has_no_gaps() {
        let ev = event(
            Utc.with_ymd_and_hms(2024, 2, 27, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 2, 1, 0, 0).unwrap(),
        );
        let span = expand(&ev, &utc()).unwrap();
        assert_eq!(span.len(), 5);

        let days: Vec<_> = span.map(|(_, day)| day).collect();
        assert_eq!(
            days,
            vec![
                date(2024, 2, 27),
                date(2024, 2, 28),
                date(2024, 2, 29),
                date(2024, 3, 1),
                date(2024, 3, 2),
            ]
        );
    }

    #[test]
    fn indices_start_at_zero() {
        let ev = event(
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap(),
        );
        let indices: Vec<_> = expand(&ev, &utc()).unwrap().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let ev = event(
            Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        );
        assert!(matches!(
            expand(&ev, &utc()),
            Err(EventError::InvalidRange { id: 1, .. })
        ));
    }

    #[test]
    fn display_offset_moves_day_boundary() {
        // 23:30 UTC on the 1st is already the 2nd at UTC+8.
        let ev = event(
            Utc.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 23, 45, 0).unwrap(),
        );
        let plus_eight = FixedOffset::east_opt(8 * 3600).unwrap();
        let days: Vec<_> = expand(&ev, &plus_eight).unwrap().map(|(_, d)| d).collect();
        assert_eq!(days, vec![date(2024, 5, 2)]);
    }

    #[test]
    fn restart_walks_the_span_again() {
        let ev = event(
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
        );
        let mut span = expand(&ev, &utc()).unwrap();
        span.next();
        span.next();
        assert_eq!(span.next(), None);

        let again: Vec<_> = span.restart().collect();
        assert_eq!(again.len(), 2);
        assert_eq!(span.first_day(), date(2024, 5, 1));
        assert_eq!(span.last_day(), date(2024, 5, 2));
    }
}
