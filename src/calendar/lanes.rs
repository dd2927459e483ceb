use std::collections::HashMap;

use super::day::{CalendarDay, DaySpan};
use super::index::LaidOutEvent;

/// Offset of the topmost lane in a day cell.
pub const BASE_LANE_OFFSET: f32 = 20.0;

/// Distance between two neighbouring lanes.
pub const LANE_STEP: f32 = 10.0;

/// Offset for an event whose first day lands on a cell already holding
/// `placed` (in placement order).
///
/// Takes the first gap from the top: at position `k` the candidate is
/// `BASE + STEP * k`, and a neighbour sitting strictly lower leaves that
/// slot free. Otherwise the event stacks just below the last entry. There
/// is no upper bound; crowded days simply grow taller.
pub fn first_day_offset<I>(placed: I) -> f32
where
    I: IntoIterator<Item = f32>,
{
    let mut offset = BASE_LANE_OFFSET;

    for (k, existing) in placed.into_iter().enumerate() {
        let candidate = BASE_LANE_OFFSET + LANE_STEP * k as f32;
        if existing > candidate {
            return candidate;
        }
        offset = existing + LANE_STEP;
    }

    offset
}

/// Zero-based lane row for an offset.
pub fn lane_number(offset: f32) -> usize {
    ((offset - BASE_LANE_OFFSET) / LANE_STEP).round().max(0.0) as usize
}

/// Per-day placement lists, filled event by event.
#[derive(Debug, Default)]
pub struct LaneAssigner {
    days: HashMap<CalendarDay, Vec<LaidOutEvent>>,
}

impl LaneAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place one event on every day of its span.
    ///
    /// The offset is computed once, against the first day's list, stored on
    /// the record and then copied to the remaining days so the event keeps
    /// one lane for its whole span.
    pub fn place_span(&mut self, mut record: LaidOutEvent, span: DaySpan) {
        record.lane_offset = BASE_LANE_OFFSET;

        for (index, day) in span {
            let placed = self.days.entry(day).or_default();

            if index == 0 {
                record.lane_offset = first_day_offset(placed.iter().map(|ev| ev.lane_offset));
            }

            placed.push(LaidOutEvent {
                is_first_day: index == 0,
                ..record.clone()
            });
        }
    }

    pub fn into_days(self) -> HashMap<CalendarDay, Vec<LaidOutEvent>> {
        self.days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_day_gets_base_offset() {
        assert_eq!(first_day_offset([]), 20.0);
    }

    #[test]
    fn stacks_below_packed_entries() {
        assert_eq!(first_day_offset([20.0]), 30.0);
        assert_eq!(first_day_offset([20.0, 30.0]), 40.0);
        assert_eq!(first_day_offset([20.0, 30.0, 40.0, 50.0, 60.0]), 70.0);
    }

    #[test]
    fn reclaims_gap_left_by_lower_neighbour() {
        // Slot 30 is free because the second entry sits at 40.
        assert_eq!(first_day_offset([20.0, 40.0]), 30.0);
        // Top slot is free when the first entry was carried in lower.
        assert_eq!(first_day_offset([30.0]), 20.0);
    }

    #[test]
    fn placement_order_not_offset_order() {
        // The scan compares each entry with its position in the list, never
        // with a sorted view of the offsets.
        assert_eq!(first_day_offset([30.0, 20.0]), 20.0);
        assert_eq!(first_day_offset([20.0, 40.0, 30.0]), 30.0);
    }

    #[test]
    fn no_cap_on_dense_days() {
        let placed: Vec<f32> = (0..12).map(|k| 20.0 + 10.0 * k as f32).collect();
        assert_eq!(first_day_offset(placed), 140.0);
    }

    #[test]
    fn lane_numbers() {
        assert_eq!(lane_number(20.0), 0);
        assert_eq!(lane_number(30.0), 1);
        assert_eq!(lane_number(70.0), 5);
    }
}
