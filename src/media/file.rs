//! File-backed media elements
//!
//! Opens the cinema assets from disk, reads their container headers and
//! drives the playback position with a [`PlaybackClock`]. Frame and sample
//! decoding belong to the renderer and the audio platform; this element owns
//! transport state and readiness events.
//!
//! Elements never loop. Once the position reaches the duration the element
//! reports paused, and the next play request starts over from zero.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures_util::future::{self, FutureExt, LocalBoxFuture};

use super::clock::PlaybackClock;
use super::element::{MediaElement, MediaError, MediaEvent, MediaKind, ReadyState};
use super::header::read_header;
use super::MediaFactory;
use crate::audio::CHANNEL_COUNT;

/// Static facts about an opened media file
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub kind: MediaKind,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub channels: usize,
    pub duration: Option<f64>,
}

/// Media element over an asset file
pub struct FileMedia {
    info: MediaInfo,
    clock: PlaybackClock,
    ready_state: ReadyState,
    muted: bool,
    events: VecDeque<MediaEvent>,
    load_error: Option<String>,
}

impl FileMedia {
    /// Open an asset; an unreadable file or header is reported as an error event
    pub fn open(kind: MediaKind, path: &Path) -> Self {
        let mut info = MediaInfo {
            kind,
            path: path.to_path_buf(),
            size_bytes: 0,
            channels: 0,
            duration: None,
        };
        let mut events = VecDeque::new();

        let opened = fs::metadata(path)
            .map_err(|e| MediaError::OpenFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
            .and_then(|meta| read_header(path).map(|stream| (meta.len(), stream)));

        let (ready_state, load_error) = match opened {
            Ok((size_bytes, stream)) => {
                info.size_bytes = size_bytes;
                info.channels = stream.channels;
                info.duration = stream.duration;
                tracing::info!(
                    "FileMedia: opened {} {} ({} bytes, {} channels, duration {:?})",
                    kind,
                    path.display(),
                    size_bytes,
                    stream.channels,
                    stream.duration
                );
                events.push_back(MediaEvent::LoadedMetadata);
                events.push_back(MediaEvent::CanPlay);
                (ReadyState::HaveEnoughData, None)
            }
            Err(e) => {
                tracing::warn!("FileMedia: {}", e);
                let reason = e.to_string();
                events.push_back(MediaEvent::Error(reason.clone()));
                (ReadyState::HaveNothing, Some(reason))
            }
        };

        Self {
            clock: PlaybackClock::new(info.duration),
            info,
            ready_state,
            muted: false,
            events,
            load_error,
        }
    }

    pub fn info(&self) -> &MediaInfo {
        &self.info
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    fn has_ended(&self) -> bool {
        self.clock.has_ended_at(Instant::now())
    }
}

impl MediaElement for FileMedia {
    fn kind(&self) -> MediaKind {
        self.info.kind
    }

    fn source(&self) -> &Path {
        &self.info.path
    }

    fn channel_count(&self) -> usize {
        self.info.channels
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn current_time(&self) -> f64 {
        if self.ready_state == ReadyState::HaveNothing {
            return f64::NAN;
        }
        self.clock.position()
    }

    fn set_current_time(&mut self, seconds: f64) -> Result<(), MediaError> {
        if !seconds.is_finite() {
            return Err(MediaError::InvalidPosition(seconds));
        }
        if self.ready_state == ReadyState::HaveNothing {
            return Err(MediaError::NotLoaded);
        }
        self.clock.seek_at(seconds, Instant::now());
        Ok(())
    }

    fn is_paused(&self) -> bool {
        !self.clock.is_running() || self.has_ended()
    }

    fn play(&mut self) -> LocalBoxFuture<'_, Result<(), MediaError>> {
        let result = if self.ready_state == ReadyState::HaveNothing {
            Err(MediaError::NotLoaded)
        } else {
            let now = Instant::now();
            if self.clock.has_ended_at(now) {
                self.clock.stop_at(now);
                self.clock.seek_at(0.0, now);
            }
            self.clock.start_at(now);
            tracing::info!("FileMedia: {} playing", self.info.kind);
            Ok(())
        };
        future::ready(result).boxed_local()
    }

    fn pause(&mut self) -> Result<(), MediaError> {
        self.clock.stop_at(Instant::now());
        tracing::info!("FileMedia: {} paused", self.info.kind);
        Ok(())
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        self.events.pop_front()
    }
}

/// Opens the cinema assets as [`FileMedia`] elements
#[derive(Debug, Clone, Default)]
pub struct FileMediaFactory {
    /// Directory the asset paths are resolved against
    pub base_dir: Option<PathBuf>,
}

impl FileMediaFactory {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl MediaFactory for FileMediaFactory {
    fn open_video(&mut self, path: &Path) -> Result<Box<dyn MediaElement>, MediaError> {
        let mut video = FileMedia::open(MediaKind::Video, &self.resolve(path));
        video.set_muted(true);
        Ok(Box::new(video))
    }

    fn open_audio(&mut self, path: &Path) -> Result<Box<dyn MediaElement>, MediaError> {
        let mut audio = FileMedia::open(MediaKind::Audio, &self.resolve(path));
        let channels = audio.channel_count();
        if audio.load_error().is_none() && channels != CHANNEL_COUNT {
            tracing::warn!(
                "Audio track {} has {} channels, expected {}",
                path.display(),
                channels,
                CHANNEL_COUNT
            );
        }
        audio.set_muted(false);
        Ok(Box::new(audio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{GraphBuildError, GraphConfig, SoftwareAudioContext, SpatialAudioGraph, SpatialPositions};
    use crate::media::testing::write_wav;
    use std::time::Duration;

    #[test]
    fn test_missing_file_reports_error_event() {
        let mut media = FileMedia::open(MediaKind::Audio, Path::new("/nonexistent/5p1.m4a"));
        assert!(matches!(media.poll_event(), Some(MediaEvent::Error(_))));
        assert_eq!(media.poll_event(), None);
        assert_eq!(media.ready_state(), ReadyState::HaveNothing);
        assert!(media.current_time().is_nan());
        assert!(media.load_error().is_some());
    }

    #[test]
    fn test_header_facts_reach_the_element() {
        let path = write_wav("file-51.wav", 6, 1000, 2500);
        let mut media = FileMedia::open(MediaKind::Audio, &path);
        let _ = fs::remove_file(&path);

        assert_eq!(media.poll_event(), Some(MediaEvent::LoadedMetadata));
        assert_eq!(media.poll_event(), Some(MediaEvent::CanPlay));
        assert_eq!(media.poll_event(), None);
        assert_eq!(media.channel_count(), 6);
        assert_eq!(media.info().duration, Some(2.5));
        assert!(media.info().size_bytes > 0);
    }

    #[test]
    fn test_unrecognised_container_fails_to_load() {
        let path = std::env::temp_dir().join(format!("screenx-cinema-{}-film.bin", std::process::id()));
        fs::write(&path, b"asset").unwrap();
        let mut media = FileMedia::open(MediaKind::Video, &path);
        let _ = fs::remove_file(&path);

        assert!(matches!(media.poll_event(), Some(MediaEvent::Error(_))));
        assert_eq!(media.ready_state(), ReadyState::HaveNothing);
    }

    #[tokio::test]
    async fn test_play_pause_and_seek() {
        let path = write_wav("file-long.wav", 6, 100, 6000);
        let mut media = FileMedia::open(MediaKind::Audio, &path);
        let _ = fs::remove_file(&path);

        assert!(media.is_paused());
        media.set_current_time(32.0).unwrap();
        assert_eq!(media.current_time(), 32.0);

        media.play().await.unwrap();
        assert!(!media.is_paused());
        media.pause().unwrap();
        assert!(media.is_paused());
        assert!(media.current_time() >= 32.0);
    }

    #[tokio::test]
    async fn test_seek_past_end_stops_at_duration() {
        let path = write_wav("file-end.wav", 6, 100, 6000);
        let mut media = FileMedia::open(MediaKind::Audio, &path);
        let _ = fs::remove_file(&path);

        media.play().await.unwrap();
        media.set_current_time(1e7).unwrap();
        assert!(media.is_paused());
        assert_eq!(media.current_time(), 60.0);

        // Playing again starts over
        media.play().await.unwrap();
        assert!(!media.is_paused());
        assert!(media.current_time() < 1.0);
    }

    #[tokio::test]
    async fn test_playback_runs_out() {
        let path = write_wav("file-short.wav", 6, 1000, 20);
        let mut media = FileMedia::open(MediaKind::Audio, &path);
        let _ = fs::remove_file(&path);

        media.play().await.unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert!(media.is_paused());
        assert_eq!(media.current_time(), 0.02);
    }

    #[tokio::test]
    async fn test_play_refused_when_not_loaded() {
        let mut media = FileMedia::open(MediaKind::Video, Path::new("/nonexistent/video.mp4"));
        assert_eq!(media.play().await, Err(MediaError::NotLoaded));
        assert!(media.is_paused());
    }

    #[test]
    fn test_factory_mutes_video_only() {
        let path = write_wav("factory-stereo.wav", 2, 1000, 100);
        let mut factory = FileMediaFactory::new(path.parent().map(Path::to_path_buf));
        let name = path.file_name().map(PathBuf::from).unwrap();
        let video = factory.open_video(Path::new("/nonexistent/v.mp4")).unwrap();
        let audio = factory.open_audio(&name).unwrap();
        let _ = fs::remove_file(&path);

        assert!(video.is_muted());
        assert!(!audio.is_muted());
        assert_eq!(audio.channel_count(), 2);
    }

    #[test]
    fn test_missing_audio_leaves_no_source_for_the_graph() {
        let mut factory = FileMediaFactory::default();
        let audio = factory.open_audio(Path::new("/nonexistent/5p1.m4a")).unwrap();
        assert_eq!(audio.channel_count(), 0);

        let mut ctx = SoftwareAudioContext::new(48000.0);
        let result = SpatialAudioGraph::build(&mut ctx, &*audio, &SpatialPositions::default(), &GraphConfig::default());
        assert!(matches!(result, Err(GraphBuildError::Source(_))));
    }
}
