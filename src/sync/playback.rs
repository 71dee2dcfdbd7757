//! Play, pause and seek across the video and audio resources
//!
//! `playing` is a derived value. Whenever a request's own outcome cannot be
//! trusted it is recomputed from the resources with [`PlaybackSynchronizer::reconcile`]:
//! playing while either resource is not paused.
//!
//! A seek during playback pauses both resources and leaves them to settle.
//! Nothing waits for the settle; the frame loop calls
//! [`PlaybackSynchronizer::resume_if_due`] and both resume once it is over.

use std::time::{Duration, Instant};

use futures_util::future;

use crate::media::MediaPair;

/// Default pause before resuming after a seek
pub const DEFAULT_SEEK_SETTLE: Duration = Duration::from_millis(80);

/// Result of a play/pause toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Media not ready; nothing was touched
    NotReady,
    /// Both resources accepted the play request
    Started,
    /// At least one play request was rejected; state follows the resources
    Rejected { playing: bool },
    Paused,
}

/// Result of a seek request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOutcome {
    NotReady,
    /// Positions set while stopped
    Positioned,
    /// Positions set and playback paused; resumes at `resume_at`
    Settling { resume_at: Instant },
}

#[derive(Debug, Clone)]
pub struct PlaybackSynchronizer {
    playing: bool,
    settle_interval: Duration,
    resume_at: Option<Instant>,
}

impl PlaybackSynchronizer {
    pub fn new(settle_interval: Duration) -> Self {
        Self {
            playing: false,
            settle_interval,
            resume_at: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether a seek is waiting to resume playback
    pub fn is_settling(&self) -> bool {
        self.resume_at.is_some()
    }

    /// Recompute `playing` from the observed paused state of both resources
    pub fn reconcile(&mut self, media: &MediaPair) -> bool {
        self.playing = media.any_playing();
        self.playing
    }

    /// Notice resources that stopped on their own, such as at the end of the film
    pub fn follow(&mut self, media: &MediaPair) {
        if self.playing && self.resume_at.is_none() && !media.any_playing() {
            self.playing = false;
            tracing::info!("Playback stopped: both resources paused");
        }
    }

    /// Start both resources when stopped, pause both when playing
    ///
    /// The caller resumes the audio output before calling this.
    pub async fn toggle(&mut self, ready: bool, media: Option<&mut MediaPair>) -> ToggleOutcome {
        let media = match media {
            Some(media) if ready => media,
            _ => {
                tracing::warn!("Media not ready; ignoring play request");
                return ToggleOutcome::NotReady;
            }
        };

        if self.playing {
            self.pause_all(media);
            self.playing = false;
            self.resume_at = None;
            tracing::info!("Playback paused");
            return ToggleOutcome::Paused;
        }

        // Video position is authoritative when playback starts
        let video_time = media.video.current_time();
        let baseline = if video_time.is_finite() { video_time } else { 0.0 };
        if let Err(e) = media.audio.set_current_time(baseline) {
            tracing::debug!("Baseline sync to {:.3}s failed: {}", baseline, e);
        }

        let (video, audio) = future::join(media.video.play(), media.audio.play()).await;
        let outcome = match (video, audio) {
            (Ok(()), Ok(())) => {
                self.playing = true;
                ToggleOutcome::Started
            }
            (video, audio) => {
                if let Err(e) = video {
                    tracing::warn!("Video play rejected: {}", e);
                }
                if let Err(e) = audio {
                    tracing::warn!("Audio play rejected: {}", e);
                }
                tracing::warn!("Some media failed to play; a user gesture may be required");
                ToggleOutcome::Rejected {
                    playing: self.reconcile(media),
                }
            }
        };
        tracing::info!("Toggle play/pause: playing = {}", self.playing);
        outcome
    }

    /// Move both resources to `seconds`
    ///
    /// While playing, both are paused and scheduled to resume once the
    /// settle interval has passed. `playing` stays set meanwhile.
    pub fn seek(&mut self, ready: bool, media: Option<&mut MediaPair>, seconds: f64, now: Instant) -> SeekOutcome {
        let media = match media {
            Some(media) if ready => media,
            _ => {
                tracing::warn!("Seek to {:.3}s ignored: media not ready", seconds);
                return SeekOutcome::NotReady;
            }
        };

        tracing::info!("Seeking to {:.3}s", seconds);
        if let Err(e) = media.video.set_current_time(seconds) {
            tracing::warn!("Video seek failed: {}", e);
        }
        if let Err(e) = media.audio.set_current_time(seconds) {
            tracing::warn!("Audio seek failed: {}", e);
        }

        if !self.playing {
            return SeekOutcome::Positioned;
        }

        self.pause_all(media);
        let resume_at = now + self.settle_interval;
        self.resume_at = Some(resume_at);
        SeekOutcome::Settling { resume_at }
    }

    /// Resume video then audio once a pending settle is over
    ///
    /// Returns the reconciled `playing` when a resume happened.
    pub async fn resume_if_due(&mut self, now: Instant, media: Option<&mut MediaPair>) -> Option<bool> {
        if !self.resume_at.is_some_and(|at| now >= at) {
            return None;
        }
        self.resume_at = None;
        let media = media?;

        if let Err(e) = media.video.play().await {
            tracing::warn!("Video resume after seek failed: {}", e);
        }
        if let Err(e) = media.audio.play().await {
            tracing::warn!("Audio resume after seek failed: {}", e);
        }
        Some(self.reconcile(media))
    }

    fn pause_all(&self, media: &mut MediaPair) {
        if let Err(e) = media.video.pause() {
            tracing::warn!("Video pause failed: {}", e);
        }
        if let Err(e) = media.audio.pause() {
            tracing::warn!("Audio pause failed: {}", e);
        }
    }
}

impl Default for PlaybackSynchronizer {
    fn default() -> Self {
        Self::new(DEFAULT_SEEK_SETTLE)
    }
}
