//! Media readiness tracking
//!
//! Two one-shot signals gate playback: the video can play, and the audio
//! metadata is loaded. Once both have fired the media is ready for good. A
//! fallback deadline forces readiness when the signals never arrive.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::media::{MediaEvent, MediaKind};

/// Default bound on how long setup may wait for both signals
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(10);

/// How readiness was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ReadinessOutcome {
    /// Setup has not begun or signals are still outstanding
    #[default]
    Pending,
    /// Both signals fired
    Ready,
    /// The fallback deadline forced readiness; the flags record which
    /// signals had actually fired
    Forced {
        #[serde(rename = "videoReady")]
        video_ready: bool,
        #[serde(rename = "audioMetaReady")]
        audio_meta_ready: bool,
    },
}

#[derive(Debug, Clone)]
pub struct ReadinessTracker {
    timeout: Duration,
    started_at: Option<Instant>,
    video_ready: bool,
    audio_meta_ready: bool,
    outcome: ReadinessOutcome,
    deadline_handled: bool,
}

impl ReadinessTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            started_at: None,
            video_ready: false,
            audio_meta_ready: false,
            outcome: ReadinessOutcome::Pending,
            deadline_handled: false,
        }
    }

    /// Start waiting for the signals
    ///
    /// A video that already has current data counts as able to play. Only
    /// the first call has any effect.
    pub fn begin(&mut self, now: Instant, video_has_current_data: bool) {
        if self.started_at.is_some() {
            return;
        }
        self.started_at = Some(now);
        if video_has_current_data {
            self.video_ready = true;
        }
        self.try_ready();
        tracing::info!("Media setup: waiting for video canplay and audio metadata");
    }

    pub fn has_begun(&self) -> bool {
        self.started_at.is_some()
    }

    /// Feed one media event; returns true if this event made the media ready
    pub fn on_event(&mut self, kind: MediaKind, event: &MediaEvent) -> bool {
        match (kind, event) {
            (MediaKind::Video, MediaEvent::CanPlay) => self.video_ready = true,
            (MediaKind::Audio, MediaEvent::LoadedMetadata) => self.audio_meta_ready = true,
            (MediaKind::Audio, MediaEvent::Error(reason)) => {
                tracing::warn!("Audio load error, continuing without metadata: {}", reason);
                self.audio_meta_ready = true;
            }
            _ => return false,
        }
        self.try_ready()
    }

    fn try_ready(&mut self) -> bool {
        if self.outcome == ReadinessOutcome::Pending && self.video_ready && self.audio_meta_ready {
            self.outcome = ReadinessOutcome::Ready;
            tracing::info!("Media ready: video and audio metadata present");
            return true;
        }
        false
    }

    /// Check the fallback deadline
    ///
    /// Fires at most once. Readiness is forced only when both media resources
    /// exist; either way the warning is logged. Returns true if readiness was
    /// forced by this call.
    pub fn poll_deadline(&mut self, now: Instant, resources_present: bool) -> bool {
        let Some(started_at) = self.started_at else {
            return false;
        };
        if self.deadline_handled || self.outcome != ReadinessOutcome::Pending {
            return false;
        }
        if now.saturating_duration_since(started_at) < self.timeout {
            return false;
        }

        self.deadline_handled = true;
        tracing::warn!(
            "Media not fully reported ready after {:?} (video ready: {}, audio metadata: {}); forcing media ready = {}",
            self.timeout,
            self.video_ready,
            self.audio_meta_ready,
            resources_present
        );
        if resources_present {
            self.outcome = ReadinessOutcome::Forced {
                video_ready: self.video_ready,
                audio_meta_ready: self.audio_meta_ready,
            };
        }
        resources_present
    }

    pub fn is_ready(&self) -> bool {
        self.outcome != ReadinessOutcome::Pending
    }

    pub fn outcome(&self) -> ReadinessOutcome {
        self.outcome
    }

    pub fn video_ready(&self) -> bool {
        self.video_ready
    }

    pub fn audio_meta_ready(&self) -> bool {
        self.audio_meta_ready
    }
}

impl Default for ReadinessTracker {
    fn default() -> Self {
        Self::new(DEFAULT_READINESS_TIMEOUT)
    }
}
