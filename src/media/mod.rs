//! Media resources: the muted stitched video and the six-channel audio track
//!
//! Both are exposed through the [`MediaElement`] trait so the synchronizer and
//! the readiness tracker work the same with file-backed elements and with
//! platform players.

mod clock;
mod element;
mod file;
mod header;
#[cfg(test)]
pub(crate) mod testing;

use std::path::Path;

pub use clock::PlaybackClock;
pub use element::{MediaElement, MediaError, MediaEvent, MediaKind, ReadyState};
pub use file::{FileMedia, FileMediaFactory, MediaInfo};

/// Opens the session's two media resources
pub trait MediaFactory {
    fn open_video(&mut self, path: &Path) -> Result<Box<dyn MediaElement>, MediaError>;

    fn open_audio(&mut self, path: &Path) -> Result<Box<dyn MediaElement>, MediaError>;
}

/// The session's video and audio resources, created together once
pub struct MediaPair {
    pub video: Box<dyn MediaElement>,
    pub audio: Box<dyn MediaElement>,
}

impl MediaPair {
    pub fn new(video: Box<dyn MediaElement>, audio: Box<dyn MediaElement>) -> Self {
        Self { video, audio }
    }

    /// Whether both resources report paused
    pub fn all_paused(&self) -> bool {
        self.video.is_paused() && self.audio.is_paused()
    }

    /// Whether at least one resource is playing
    pub fn any_playing(&self) -> bool {
        !self.audio.is_paused() || !self.video.is_paused()
    }

    /// Drain pending events from both resources
    pub fn drain_events(&mut self) -> Vec<(MediaKind, MediaEvent)> {
        let mut events = Vec::new();
        while let Some(event) = self.video.poll_event() {
            events.push((MediaKind::Video, event));
        }
        while let Some(event) = self.audio.poll_event() {
            events.push((MediaKind::Audio, event));
        }
        events
    }
}

impl std::fmt::Debug for MediaPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPair")
            .field("video", &self.video.source())
            .field("audio", &self.audio.source())
            .finish()
    }
}
