//! Settings management for ScreenX Cinema
//!
//! Handles loading/saving of cinema environment XML files and application preferences.

use glam::Vec3;
use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::{ChannelRole, PannerConfig, SpatialPositions};
use crate::control::ChapterTable;

/// A 3D position as stored in settings files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position3 {
    #[serde(rename = "x")]
    pub x: f32,
    #[serde(rename = "y")]
    pub y: f32,
    #[serde(rename = "z")]
    pub z: f32,
}

impl Position3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<Position3> for Vec3 {
    fn from(p: Position3) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

impl From<Vec3> for Position3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Geometry of the three-panel screen and discovery tolerances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenSettings {
    /// Width of each panel in world units
    #[serde(rename = "width", default = "default_screen_width")]
    pub width: f32,
    /// Height of each panel in world units
    #[serde(rename = "height", default = "default_screen_height")]
    pub height: f32,
    /// Center panel position
    #[serde(rename = "center", default = "default_screen_center")]
    pub center: Position3,
    /// Angle of the side panels relative to the center panel, in degrees
    #[serde(rename = "sideAngleDegrees", default = "default_side_angle")]
    pub side_angle_degrees: f32,
    /// Extra horizontal distance between the center panel edge and a side panel
    #[serde(rename = "sideGap", default = "default_side_gap")]
    pub side_gap: f32,
    /// Match radius for the center panel
    #[serde(rename = "centerTolerance", default = "default_center_tolerance")]
    pub center_tolerance: f32,
    /// Match radius for the left and right panels
    #[serde(rename = "sideTolerance", default = "default_side_tolerance")]
    pub side_tolerance: f32,
}

fn default_screen_width() -> f32 {
    21.0
}
fn default_screen_height() -> f32 {
    12.0
}
fn default_screen_center() -> Position3 {
    Position3::new(-0.2, 7.4, 5.0)
}
fn default_side_angle() -> f32 {
    77.0
}
fn default_side_gap() -> f32 {
    3.0
}
fn default_center_tolerance() -> f32 {
    0.9
}
fn default_side_tolerance() -> f32 {
    1.6
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
            center: default_screen_center(),
            side_angle_degrees: default_side_angle(),
            side_gap: default_side_gap(),
            center_tolerance: default_center_tolerance(),
            side_tolerance: default_side_tolerance(),
        }
    }
}

/// Speaker positions for the six channels of the 5.1 track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerLayout {
    #[serde(rename = "left", default = "default_left")]
    pub left: Position3,
    #[serde(rename = "right", default = "default_right")]
    pub right: Position3,
    #[serde(rename = "center", default = "default_center")]
    pub center: Position3,
    /// Nominal only; the LFE channel is never spatialized
    #[serde(rename = "lfe", default = "default_lfe")]
    pub lfe: Position3,
    #[serde(rename = "surroundLeft", default = "default_surround_left")]
    pub surround_left: Position3,
    #[serde(rename = "surroundRight", default = "default_surround_right")]
    pub surround_right: Position3,
}

fn default_left() -> Position3 {
    Position3::new(12.0, 7.0, 5.0)
}
fn default_right() -> Position3 {
    Position3::new(-12.0, 7.0, 5.0)
}
fn default_center() -> Position3 {
    Position3::new(0.2, 7.4, 5.0)
}
fn default_lfe() -> Position3 {
    Position3::new(0.2, 3.0, 5.0)
}
fn default_surround_left() -> Position3 {
    Position3::new(14.0, 9.0, -12.0)
}
fn default_surround_right() -> Position3 {
    Position3::new(-14.0, 9.0, -12.0)
}

impl Default for SpeakerLayout {
    fn default() -> Self {
        Self {
            left: default_left(),
            right: default_right(),
            center: default_center(),
            lfe: default_lfe(),
            surround_left: default_surround_left(),
            surround_right: default_surround_right(),
        }
    }
}

impl SpeakerLayout {
    /// Position configured for a channel role
    pub fn position(&self, role: ChannelRole) -> Position3 {
        match role {
            ChannelRole::Left => self.left,
            ChannelRole::Right => self.right,
            ChannelRole::Center => self.center,
            ChannelRole::Lfe => self.lfe,
            ChannelRole::SurroundLeft => self.surround_left,
            ChannelRole::SurroundRight => self.surround_right,
        }
    }

    /// Build the live position table used by the audio graph
    pub fn to_positions(&self) -> SpatialPositions {
        let mut positions = SpatialPositions::default();
        for role in ChannelRole::ALL {
            positions.set(role, self.position(role).into());
        }
        positions
    }
}

/// Positional panner parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PannerSettings {
    #[serde(rename = "refDistance", default = "default_ref_distance")]
    pub ref_distance: f32,
    #[serde(rename = "maxDistance", default = "default_max_distance")]
    pub max_distance: f32,
    #[serde(rename = "rolloffFactor", default = "default_rolloff")]
    pub rolloff_factor: f32,
    /// Request HRTF panning (falls back to equal-power where unsupported)
    #[serde(rename = "hrtf", default = "default_hrtf")]
    pub hrtf: bool,
}

fn default_ref_distance() -> f32 {
    6.0
}
fn default_max_distance() -> f32 {
    100.0
}
fn default_rolloff() -> f32 {
    1.6
}
fn default_hrtf() -> bool {
    true
}

impl Default for PannerSettings {
    fn default() -> Self {
        Self {
            ref_distance: default_ref_distance(),
            max_distance: default_max_distance(),
            rolloff_factor: default_rolloff(),
            hrtf: default_hrtf(),
        }
    }
}

impl PannerSettings {
    pub fn to_config(&self) -> PannerConfig {
        PannerConfig {
            panning_model: if self.hrtf {
                crate::audio::PanningModel::Hrtf
            } else {
                crate::audio::PanningModel::EqualPower
            },
            distance_model: crate::audio::DistanceModel::Inverse,
            ref_distance: self.ref_distance,
            max_distance: self.max_distance,
            rolloff_factor: self.rolloff_factor,
        }
    }
}

/// Chapter start times in seconds (index 0 is the start of the film)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterList {
    #[serde(rename = "chapter", default)]
    pub times: Vec<f64>,
}

impl Default for ChapterList {
    fn default() -> Self {
        Self {
            times: vec![
                0.0,
                32.0,                     // 0:00:32
                (7 * 60 + 4) as f64,      // 0:07:04
                (17 * 60 + 19) as f64,    // 0:17:19
                (28 * 60 + 17) as f64,    // 0:28:17
                (32 * 60 + 29) as f64,    // 0:32:29
                (44 * 60 + 9) as f64,     // 0:44:09
                (54 * 60 + 17) as f64,    // 0:54:17
            ],
        }
    }
}

/// Cinema environment settings stored in XML files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "CinemaEnvironment")]
pub struct CinemaSettings {
    /// Stitched left/center/right video file
    #[serde(rename = "videoPath", default = "default_video_path")]
    pub video_path: String,

    /// Six-channel audio file (L, R, C, LFE, SL, SR)
    #[serde(rename = "audioPath", default = "default_audio_path")]
    pub audio_path: String,

    /// Walkable scene model (terrain, seats, room)
    #[serde(rename = "sceneModel", default = "default_scene_model")]
    pub scene_model: String,

    /// Target frame rate for the update loop (24-240)
    #[serde(rename = "targetFps", default = "default_target_fps")]
    pub target_fps: u32,

    #[serde(rename = "screen", default)]
    pub screen: ScreenSettings,

    #[serde(rename = "speakers", default)]
    pub speakers: SpeakerLayout,

    #[serde(rename = "panner", default)]
    pub panner: PannerSettings,

    /// Low-pass cutoff applied to the LFE channel
    #[serde(rename = "lfeCutoffHz", default = "default_lfe_cutoff")]
    pub lfe_cutoff_hz: f32,

    /// Seconds before media is forced ready
    #[serde(rename = "readinessTimeoutSecs", default = "default_readiness_timeout")]
    pub readiness_timeout_secs: f64,

    /// Pause length used when seeking during playback
    #[serde(rename = "seekSettleMs", default = "default_seek_settle_ms")]
    pub seek_settle_ms: u64,

    #[serde(rename = "chapters", default)]
    pub chapters: ChapterList,
}

fn default_video_path() -> String {
    "stitched-LCR-final.mp4".to_string()
}
fn default_audio_path() -> String {
    "5p1.m4a".to_string()
}
fn default_scene_model() -> String {
    "https://acousticheritagecollective.org/narrowbackroads3d/cine.glb".to_string()
}
fn default_target_fps() -> u32 {
    60
}
fn default_lfe_cutoff() -> f32 {
    120.0
}
fn default_readiness_timeout() -> f64 {
    10.0
}
fn default_seek_settle_ms() -> u64 {
    80
}

impl Default for CinemaSettings {
    fn default() -> Self {
        Self {
            video_path: default_video_path(),
            audio_path: default_audio_path(),
            scene_model: default_scene_model(),
            target_fps: default_target_fps(),
            screen: ScreenSettings::default(),
            speakers: SpeakerLayout::default(),
            panner: PannerSettings::default(),
            lfe_cutoff_hz: default_lfe_cutoff(),
            readiness_timeout_secs: default_readiness_timeout(),
            seek_settle_ms: default_seek_settle_ms(),
            chapters: ChapterList::default(),
        }
    }
}

impl CinemaSettings {
    /// Clamp FPS to valid range (24-240)
    pub fn clamp_fps(&mut self) {
        self.target_fps = self.target_fps.clamp(24, 240);
    }

    /// Check values that would leave the media core unusable
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.chapters.times.len() != ChapterTable::LEN {
            return Err(SettingsError::Invalid(format!(
                "expected {} chapter times, found {}",
                ChapterTable::LEN,
                self.chapters.times.len()
            )));
        }
        if let Some(bad) = self.chapters.times.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(SettingsError::Invalid(format!("invalid chapter time {}", bad)));
        }
        if self.screen.center_tolerance <= 0.0 || self.screen.side_tolerance <= 0.0 {
            return Err(SettingsError::Invalid("discovery tolerances must be positive".to_string()));
        }
        if self.readiness_timeout_secs < 0.0 || !self.readiness_timeout_secs.is_finite() {
            return Err(SettingsError::Invalid("readiness timeout must be a non-negative number".to_string()));
        }
        Ok(())
    }

    /// Chapter table built from the validated chapter list
    pub fn chapter_table(&self) -> Result<ChapterTable, SettingsError> {
        ChapterTable::new(self.chapters.times.clone()).map_err(SettingsError::Invalid)
    }

    /// Load settings from a cinema environment XML file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(SettingsError::Io)?;
        let mut settings: Self = from_str(&contents).map_err(SettingsError::XmlParse)?;
        settings.clamp_fps();
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a cinema environment XML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        let xml = to_string(self).map_err(SettingsError::XmlWrite)?;
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);

        fs::write(path, formatted).map_err(SettingsError::Io)?;
        Ok(())
    }
}

/// Application preferences (stored in config directory)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename = "CinemaPreferences")]
pub struct AppPreferences {
    /// Path to the last loaded environment file
    #[serde(rename = "lastOpenedFile", default, skip_serializing_if = "Option::is_none")]
    pub last_opened_file: Option<String>,
}

impl AppPreferences {
    fn get_prefs_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("ScreenXCinema");
            p.push("preferences.xml");
            p
        })
    }

    /// Load preferences from config directory
    pub fn load() -> Self {
        let Some(path) = Self::get_prefs_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save preferences to config directory
    pub fn save(&self) -> Result<(), SettingsError> {
        let Some(path) = Self::get_prefs_path() else {
            return Err(SettingsError::NoConfigDir);
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(SettingsError::Io)?;
        }

        let xml = to_string(self).map_err(SettingsError::XmlWrite)?;
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);

        fs::write(&path, formatted).map_err(SettingsError::Io)?;
        Ok(())
    }

    /// Set the last opened file and save
    pub fn set_last_opened(&mut self, path: &Path) {
        self.last_opened_file = Some(path.to_string_lossy().to_string());
        if let Err(e) = self.save() {
            tracing::warn!("Failed to save preferences: {:?}", e);
        }
    }

    /// Get the last opened file path if it exists
    pub fn get_last_opened(&self) -> Option<PathBuf> {
        self.last_opened_file.as_ref().map(PathBuf::from).filter(|p| p.exists())
    }
}

/// Settings-related errors
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    XmlParse(quick_xml::DeError),
    XmlWrite(quick_xml::SeError),
    Invalid(String),
    NoConfigDir,
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::XmlParse(e) => write!(f, "XML parse error: {}", e),
            SettingsError::XmlWrite(e) => write!(f, "XML write error: {}", e),
            SettingsError::Invalid(msg) => write!(f, "Invalid settings: {}", msg),
            SettingsError::NoConfigDir => write!(f, "Could not find config directory"),
        }
    }
}

impl std::error::Error for SettingsError {}
