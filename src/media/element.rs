//! Media element trait and the events it reports

use futures_util::future::LocalBoxFuture;
use std::path::Path;

/// Which of the two session resources an element is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Stitched three-panel video, always muted
    Video,
    /// Six-channel audio track
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// How much of the resource is available for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

/// One-shot notifications from a media element
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Metadata (duration, channel layout) has been parsed
    LoadedMetadata,
    /// Enough data is buffered to start playback
    CanPlay,
    /// Loading failed
    Error(String),
}

/// Errors reported by media elements
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MediaError {
    #[error("Failed to open {path}: {reason}")]
    OpenFailed { path: String, reason: String },
    #[error("Media is not loaded")]
    NotLoaded,
    #[error("Playback was blocked: {0}")]
    PlayBlocked(String),
    #[error("Invalid playback position {0}")]
    InvalidPosition(f64),
    #[error("Media operation failed: {0}")]
    Failed(String),
}

/// A playable time-based resource
pub trait MediaElement {
    fn kind(&self) -> MediaKind;

    /// Location the element was opened from
    fn source(&self) -> &Path;

    /// Number of audio channels carried by the resource
    fn channel_count(&self) -> usize;

    fn ready_state(&self) -> ReadyState;

    /// Playback position in seconds; may be NaN before metadata is known
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64) -> Result<(), MediaError>;

    fn is_paused(&self) -> bool;

    /// Request playback; settles once playback started or was refused
    fn play(&mut self) -> LocalBoxFuture<'_, Result<(), MediaError>>;

    fn pause(&mut self) -> Result<(), MediaError>;

    fn is_muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    /// Next pending notification, if any
    fn poll_event(&mut self) -> Option<MediaEvent>;
}
