//! Cinema session
//!
//! Owns every piece of the media core for one viewer session: the scene and
//! audio collaborators, the media pair once created, and the readiness and
//! playback state. The application drives it with [`CinemaSession::tick`]
//! once per frame, then awaits [`CinemaSession::finish_pending_seek`], and
//! forwards key presses to [`CinemaSession::handle_key`]. No call waits on a
//! timer, so a chapter jump never holds up the frame loop.
//!
//! Setup order is fixed: planes are discovered first, then the video and
//! audio are opened together, the audio graph is built, the video textures
//! are attached and readiness tracking begins. Setup runs at most once.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use glam::Vec3;

use crate::audio::{
    AudioBackend, ChannelRole, ContextState, GraphConfig, ListenerPose, SpatialAudioGraph, SpatialPositions,
};
use crate::control::{ChapterTable, ControlSurface, KeyInput, TransportCommand};
use crate::media::{MediaEvent, MediaFactory, MediaKind, MediaPair, ReadyState};
use crate::scene::{FoundPlanes, PlaneDiscovery, SceneGraph, ScreenLayout};
use crate::settings::{CinemaSettings, SettingsError};
use crate::status::StatusSnapshot;
use crate::sync::{
    PlaybackSynchronizer, ReadinessTracker, SeekOutcome, ToggleOutcome, DEFAULT_READINESS_TIMEOUT,
    DEFAULT_SEEK_SETTLE,
};
use crate::video::StitchedVideoTextures;

/// Everything a session needs from the environment settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    pub layout: ScreenLayout,
    pub speakers: SpatialPositions,
    pub graph: GraphConfig,
    pub readiness_timeout: Duration,
    pub seek_settle: Duration,
    pub chapters: ChapterTable,
}

impl SessionConfig {
    pub fn from_settings(settings: &CinemaSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let readiness_timeout = Duration::try_from_secs_f64(settings.readiness_timeout_secs)
            .map_err(|e| SettingsError::Invalid(format!("readiness timeout: {}", e)))?;
        Ok(Self {
            video_path: PathBuf::from(&settings.video_path),
            audio_path: PathBuf::from(&settings.audio_path),
            layout: ScreenLayout::from_settings(&settings.screen),
            speakers: settings.speakers.to_positions(),
            graph: GraphConfig {
                panner: settings.panner.to_config(),
                lfe_cutoff_hz: settings.lfe_cutoff_hz,
            },
            readiness_timeout,
            seek_settle: Duration::from_millis(settings.seek_settle_ms),
            chapters: settings.chapter_table()?,
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        let settings = CinemaSettings::default();
        Self {
            video_path: PathBuf::from(&settings.video_path),
            audio_path: PathBuf::from(&settings.audio_path),
            layout: ScreenLayout::default(),
            speakers: settings.speakers.to_positions(),
            graph: GraphConfig::default(),
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            seek_settle: DEFAULT_SEEK_SETTLE,
            chapters: ChapterTable::default(),
        }
    }
}

pub struct CinemaSession<S, B, F> {
    config: SessionConfig,
    scene: S,
    audio: B,
    factory: F,
    discovery: PlaneDiscovery,
    media: Option<MediaPair>,
    textures: Option<StitchedVideoTextures>,
    graph: Option<SpatialAudioGraph>,
    positions: SpatialPositions,
    readiness: ReadinessTracker,
    playback: PlaybackSynchronizer,
    controls: ControlSurface,
    current_fragment: u8,
    scene_loaded: bool,
    setup_started: bool,
    first_play_done: bool,
}

impl<S, B, F> CinemaSession<S, B, F>
where
    S: SceneGraph,
    B: AudioBackend,
    F: MediaFactory,
{
    pub fn new(config: SessionConfig, scene: S, audio: B, factory: F) -> Self {
        let discovery = PlaneDiscovery::new(config.layout.expected_surfaces());
        let readiness = ReadinessTracker::new(config.readiness_timeout);
        let playback = PlaybackSynchronizer::new(config.seek_settle);
        let controls = ControlSurface::new(config.chapters.clone());
        let positions = config.speakers;
        Self {
            config,
            scene,
            audio,
            factory,
            discovery,
            media: None,
            textures: None,
            graph: None,
            positions,
            readiness,
            playback,
            controls,
            current_fragment: 0,
            scene_loaded: false,
            setup_started: false,
            first_play_done: false,
        }
    }

    /// Per-frame update
    pub fn tick(&mut self, now: Instant) {
        if !self.discovery.is_found() && self.discovery.poll(&self.scene).is_some() {
            self.setup_media(now);
        }

        if let Some(media) = self.media.as_mut() {
            for (kind, event) in media.drain_events() {
                if let (MediaKind::Video, MediaEvent::Error(reason)) = (kind, &event) {
                    tracing::warn!("Video load error: {}", reason);
                }
                self.readiness.on_event(kind, &event);
            }
            self.playback.follow(media);
        }
        self.readiness.poll_deadline(now, self.media.is_some());

        if let Some(graph) = &self.graph {
            graph.update_positions(&mut self.audio, &self.positions);
        }
    }

    /// Create the media pair and everything that hangs off it
    ///
    /// Requires discovered planes. Runs at most once; a failure to open either
    /// resource leaves the session without media.
    pub fn setup_media(&mut self, now: Instant) {
        if self.setup_started {
            return;
        }
        let Some(planes) = self.discovery.found() else {
            tracing::warn!("Media setup requested before the projection planes were found");
            return;
        };
        self.setup_started = true;

        let mut video = match self.factory.open_video(&self.config.video_path) {
            Ok(video) => video,
            Err(e) => {
                tracing::error!("Failed to create video for {}: {}", self.config.video_path.display(), e);
                return;
            }
        };
        let mut audio = match self.factory.open_audio(&self.config.audio_path) {
            Ok(audio) => audio,
            Err(e) => {
                tracing::error!("Failed to create audio for {}: {}", self.config.audio_path.display(), e);
                return;
            }
        };
        video.set_muted(true);
        audio.set_muted(false);
        tracing::info!("Media pair opened (video muted, audio unmuted)");

        self.graph = match SpatialAudioGraph::build(&mut self.audio, &*audio, &self.positions, &self.config.graph) {
            Ok(graph) => Some(graph),
            Err(e) => {
                tracing::warn!("Continuing without spatial audio: {}", e);
                None
            }
        };

        let mut textures = StitchedVideoTextures::new(video.source());
        textures.attach(&mut self.scene, &planes);
        self.textures = Some(textures);

        let has_current_data = video.ready_state() >= ReadyState::HaveCurrentData;
        self.media = Some(MediaPair::new(video, audio));
        self.readiness.begin(now, has_current_data);
    }

    /// Handle one key press; returns the command it mapped to
    pub async fn handle_key(&mut self, key: KeyInput, now: Instant) -> Option<TransportCommand> {
        let command = self.controls.map(key)?;
        match command {
            TransportCommand::TogglePlayPause => {
                self.resume_audio().await;
                if !self.readiness.is_ready() {
                    self.setup_media(now);
                }
                self.toggle_play_pause().await;
            }
            TransportCommand::SeekChapter { index, seconds } => {
                self.seek_all_to(seconds, index, now);
            }
        }
        Some(command)
    }

    async fn resume_audio(&mut self) {
        if self.audio.state() == ContextState::Running {
            return;
        }
        match self.audio.resume().await {
            Ok(()) => tracing::info!("Audio context resumed"),
            Err(e) => tracing::warn!("Audio context resume failed: {}", e),
        }
    }

    /// Toggle playback of both resources
    pub async fn toggle_play_pause(&mut self) -> ToggleOutcome {
        let ready = self.readiness.is_ready();
        if ready {
            self.resume_audio().await;
            if !self.playback.is_playing() && !self.first_play_done {
                self.reattach_textures();
                self.first_play_done = true;
            }
        }
        self.playback.toggle(ready, self.media.as_mut()).await
    }

    fn reattach_textures(&mut self) {
        if let (Some(textures), Some(planes)) = (self.textures.as_mut(), self.discovery.found()) {
            if !textures.all_attached() {
                textures.attach(&mut self.scene, &planes);
            }
        }
    }

    /// Seek both resources; a non-zero `fragment` is recorded as the current chapter
    pub fn seek_all_to(&mut self, seconds: f64, fragment: u8, now: Instant) -> SeekOutcome {
        let ready = self.readiness.is_ready();
        if ready && fragment != 0 {
            self.current_fragment = fragment;
        }
        self.playback.seek(ready, self.media.as_mut(), seconds, now)
    }

    /// Resume playback after a seek once the settle interval is over
    pub async fn finish_pending_seek(&mut self, now: Instant) -> Option<bool> {
        self.playback.resume_if_due(now, self.media.as_mut()).await
    }

    /// Record whether the environment model finished loading
    pub fn set_scene_loaded(&mut self, loaded: bool) {
        if loaded {
            tracing::info!("Scene model loaded");
        } else {
            tracing::warn!("Scene model failed to load; walking surface unavailable");
        }
        self.scene_loaded = loaded;
    }

    /// Move a speaker; panners pick it up on the next tick
    pub fn set_speaker_position(&mut self, role: ChannelRole, position: Vec3) {
        self.positions.set(role, position);
    }

    pub fn set_listener_pose(&mut self, pose: ListenerPose) {
        self.audio.set_listener(pose);
    }

    pub fn status(&self) -> StatusSnapshot {
        let time = |t: f64| t.is_finite().then_some(t);
        StatusSnapshot {
            planes_found: self.discovery.is_found(),
            media_ready: self.readiness.is_ready(),
            playing: self.playback.is_playing(),
            video_current_time: self.media.as_ref().and_then(|m| time(m.video.current_time())),
            audio_current_time: self.media.as_ref().and_then(|m| time(m.audio.current_time())),
            scene_loaded: self.scene_loaded,
            current_fragment: self.current_fragment,
            readiness: self.readiness.outcome(),
            audio_graph: self.graph.is_some(),
        }
    }

    pub fn planes(&self) -> Option<FoundPlanes> {
        self.discovery.found()
    }

    pub fn is_media_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn current_fragment(&self) -> u8 {
        self.current_fragment
    }

    pub fn media(&self) -> Option<&MediaPair> {
        self.media.as_ref()
    }

    pub fn audio_graph(&self) -> Option<&SpatialAudioGraph> {
        self.graph.as_ref()
    }

    pub fn textures(&self) -> Option<&StitchedVideoTextures> {
        self.textures.as_ref()
    }

    pub fn positions(&self) -> &SpatialPositions {
        &self.positions
    }

    pub fn controls(&self) -> &ControlSurface {
        &self.controls
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn audio_backend(&self) -> &B {
        &self.audio
    }

    pub fn audio_backend_mut(&mut self) -> &mut B {
        &mut self.audio
    }
}
