use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::day::{expand, CalendarDay};
use super::lanes::{lane_number, LaneAssigner, BASE_LANE_OFFSET};
use crate::api::RawEvent;
use crate::translate::Translator;

/// Size of the rotating event color pool.
pub const COLOR_POOL_SIZE: usize = 8;

/// Round-robin color slot for the `ordinal`-th event in begin order.
pub fn color_for(ordinal: usize, pool_size: usize) -> usize {
    if pool_size == 0 {
        0
    } else {
        ordinal % pool_size
    }
}

/// An event as placed on one particular day.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutEvent {
    pub id: i64,
    pub name: String,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub special: bool,
    pub is_pvp: bool,
    pub url: String,
    pub color_index: usize,
    pub is_first_day: bool,
    pub lane_offset: f32,
}

impl LaidOutEvent {
    fn from_raw(event: &RawEvent, name: String, color_index: usize) -> Self {
        Self {
            id: event.id,
            name,
            begin: event.begin,
            end: event.end,
            special: event.special,
            is_pvp: event.is_pvp,
            url: event.url.clone(),
            color_index,
            is_first_day: false,
            lane_offset: BASE_LANE_OFFSET,
        }
    }

    pub fn lane(&self) -> usize {
        lane_number(self.lane_offset)
    }
}

/// Inputs that shape a build besides the events themselves.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    pub display_offset: FixedOffset,
    pub translator: Translator,
    pub color_pool: usize,
}

impl LayoutOptions {
    pub fn new(display_offset: FixedOffset, translator: Translator) -> Self {
        Self {
            display_offset,
            translator,
            color_pool: COLOR_POOL_SIZE,
        }
    }

    /// Fixed offset `minutes` east of UTC, if it is a valid offset.
    pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
        minutes.checked_mul(60).and_then(FixedOffset::east_opt)
    }

    /// Offset of the local timezone right now.
    pub fn local_offset() -> FixedOffset {
        Local::now().offset().fix()
    }
}

/// Immutable day → laid-out events map. A new one is built on every refresh
/// and published whole; nothing mutates an index after `build` returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventIndex {
    days: HashMap<CalendarDay, Vec<LaidOutEvent>>,
    event_count: usize,
    skipped: usize,
}

impl EventIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn build(events: &[RawEvent], options: &LayoutOptions) -> Self {
        // Stable sort: equal begins keep feed order.
        let mut ordered: Vec<&RawEvent> = events.iter().collect();
        ordered.sort_by_key(|ev| ev.begin);

        let mut lanes = LaneAssigner::new();
        let mut event_count = 0;
        let mut skipped = 0;

        for (ordinal, event) in ordered.into_iter().enumerate() {
            let color_index = color_for(ordinal, options.color_pool);

            let span = match expand(event, &options.display_offset) {
                Ok(span) => span,
                Err(err) => {
                    warn!(error = %err, "skipping malformed event");
                    skipped += 1;
                    continue;
                }
            };

            let name = options.translator.translate(&event.name);
            lanes.place_span(LaidOutEvent::from_raw(event, name, color_index), span);
            event_count += 1;
        }

        let index = Self {
            days: lanes.into_days(),
            event_count,
            skipped,
        };
        debug!(
            events = index.event_count,
            skipped = index.skipped,
            days = index.days.len(),
            "built event index"
        );
        index
    }

    /// Events on `day` in placement order, or an empty slice.
    pub fn lookup(&self, day: CalendarDay) -> &[LaidOutEvent] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_day(&self, day: CalendarDay) -> bool {
        self.days.contains_key(&day)
    }

    pub fn event_count(&self) -> usize {
        self.event_count
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
