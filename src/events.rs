use std::sync::Arc;

use crate::calendar::EventIndex;
use crate::feed::PayloadOrigin;

/// Messages from the background refresh task to the foreground loop
#[derive(Debug)]
pub enum AppEvent {
    /// A complete snapshot, ready to replace the current one
    IndexPublished {
        index: Arc<EventIndex>,
        origin: PayloadOrigin,
    },

    /// The refresh cycle failed; the current snapshot stays
    RefreshFailed(String),
}
