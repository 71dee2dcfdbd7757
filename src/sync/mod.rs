//! Readiness gating and synchronized transport for the media pair

mod playback;
mod readiness;

pub use playback::{PlaybackSynchronizer, SeekOutcome, ToggleOutcome, DEFAULT_SEEK_SETTLE};
pub use readiness::{ReadinessOutcome, ReadinessTracker, DEFAULT_READINESS_TIMEOUT};
