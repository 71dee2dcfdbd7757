//! Scriptable media elements for unit tests

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use futures_util::future::{self, FutureExt, LocalBoxFuture};

use super::{MediaElement, MediaError, MediaEvent, MediaFactory, MediaKind, ReadyState};

/// Transport call observed on a mock element
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    SetTime(f64),
    /// Play requested while the element was at `at` seconds
    Play { at: f64 },
    Pause,
}

pub type CallLog = Rc<RefCell<Vec<(MediaKind, MockCall)>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Silent 16-bit WAV in the temp dir
pub fn write_wav(name: &str, channels: u16, sample_rate: u32, frames: u32) -> PathBuf {
    let path = std::env::temp_dir().join(format!("screenx-cinema-{}-{}", std::process::id(), name));
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..frames * channels as u32 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}

pub struct MockMedia {
    kind: MediaKind,
    path: PathBuf,
    channels: usize,
    time: f64,
    paused: bool,
    muted: bool,
    ready: ReadyState,
    events: VecDeque<MediaEvent>,
    log: CallLog,
    block_play: bool,
    fail_pause: bool,
    fail_seek: bool,
}

impl MockMedia {
    pub fn new(kind: MediaKind, log: &CallLog) -> Self {
        let channels = match kind {
            MediaKind::Video => 0,
            MediaKind::Audio => 6,
        };
        Self {
            kind,
            path: PathBuf::from(format!("mock-{}", kind)),
            channels,
            time: 0.0,
            paused: true,
            muted: false,
            ready: ReadyState::HaveMetadata,
            events: VecDeque::new(),
            log: Rc::clone(log),
            block_play: false,
            fail_pause: false,
            fail_seek: false,
        }
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_ready_state(mut self, ready: ReadyState) -> Self {
        self.ready = ready;
        self
    }

    pub fn with_events(mut self, events: Vec<MediaEvent>) -> Self {
        self.events.extend(events);
        self
    }

    /// Every play request is refused, as under an autoplay policy
    pub fn blocking_play(mut self) -> Self {
        self.block_play = true;
        self
    }

    pub fn failing_pause(mut self) -> Self {
        self.fail_pause = true;
        self
    }

    pub fn failing_seek(mut self) -> Self {
        self.fail_seek = true;
        self
    }
}

impl MediaElement for MockMedia {
    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn source(&self) -> &Path {
        &self.path
    }

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn ready_state(&self) -> ReadyState {
        self.ready
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, seconds: f64) -> Result<(), MediaError> {
        if self.fail_seek {
            return Err(MediaError::Failed("seek refused".to_string()));
        }
        self.time = seconds;
        self.log.borrow_mut().push((self.kind, MockCall::SetTime(seconds)));
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn play(&mut self) -> LocalBoxFuture<'_, Result<(), MediaError>> {
        self.log.borrow_mut().push((self.kind, MockCall::Play { at: self.time }));
        let result = if self.block_play {
            Err(MediaError::PlayBlocked("user gesture required".to_string()))
        } else {
            self.paused = false;
            Ok(())
        };
        future::ready(result).boxed_local()
    }

    fn pause(&mut self) -> Result<(), MediaError> {
        self.log.borrow_mut().push((self.kind, MockCall::Pause));
        if self.fail_pause {
            return Err(MediaError::Failed("pause refused".to_string()));
        }
        self.paused = true;
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

/// Hands out pre-built mock elements once
pub struct MockFactory {
    pub video: Option<MockMedia>,
    pub audio: Option<MockMedia>,
    pub opened: Rc<RefCell<Vec<MediaKind>>>,
}

impl MockFactory {
    pub fn new(video: MockMedia, audio: MockMedia) -> Self {
        Self {
            video: Some(video),
            audio: Some(audio),
            opened: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl MediaFactory for MockFactory {
    fn open_video(&mut self, _path: &Path) -> Result<Box<dyn MediaElement>, MediaError> {
        self.opened.borrow_mut().push(MediaKind::Video);
        self.video
            .take()
            .map(|m| Box::new(m) as Box<dyn MediaElement>)
            .ok_or_else(|| MediaError::Failed("video already opened".to_string()))
    }

    fn open_audio(&mut self, _path: &Path) -> Result<Box<dyn MediaElement>, MediaError> {
        self.opened.borrow_mut().push(MediaKind::Audio);
        self.audio
            .take()
            .map(|m| Box::new(m) as Box<dyn MediaElement>)
            .ok_or_else(|| MediaError::Failed("audio already opened".to_string()))
    }
}
