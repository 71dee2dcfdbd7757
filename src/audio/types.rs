//! Audio types shared across the audio module

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Number of channels in the cinema audio asset
pub const CHANNEL_COUNT: usize = 6;

/// Semantic role of one channel of the 5.1 track
///
/// The ordinal of each role is its channel index in the source asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelRole {
    Left,
    Right,
    Center,
    /// Low-frequency effects, routed flat to the output
    Lfe,
    SurroundLeft,
    SurroundRight,
}

/// Channel order of the audio asset: L, R, C, LFE, SL, SR
pub const CHANNEL_ORDER: [ChannelRole; CHANNEL_COUNT] = ChannelRole::ALL;

impl ChannelRole {
    /// All roles, in source channel order
    pub const ALL: [ChannelRole; CHANNEL_COUNT] = [
        ChannelRole::Left,
        ChannelRole::Right,
        ChannelRole::Center,
        ChannelRole::Lfe,
        ChannelRole::SurroundLeft,
        ChannelRole::SurroundRight,
    ];

    /// Role carried by a source channel index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Source channel index of this role
    pub fn index(self) -> usize {
        match self {
            ChannelRole::Left => 0,
            ChannelRole::Right => 1,
            ChannelRole::Center => 2,
            ChannelRole::Lfe => 3,
            ChannelRole::SurroundLeft => 4,
            ChannelRole::SurroundRight => 5,
        }
    }

    /// Whether this channel gets a positional panner
    pub fn is_positional(self) -> bool {
        !matches!(self, ChannelRole::Lfe)
    }

    /// Short label
    pub fn label(self) -> &'static str {
        match self {
            ChannelRole::Left => "L",
            ChannelRole::Right => "R",
            ChannelRole::Center => "C",
            ChannelRole::Lfe => "LFE",
            ChannelRole::SurroundLeft => "SL",
            ChannelRole::SurroundRight => "SR",
        }
    }
}

impl std::fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Live speaker position table, one entry per channel role
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpatialPositions {
    positions: [Vec3; CHANNEL_COUNT],
}

impl SpatialPositions {
    pub fn get(&self, role: ChannelRole) -> Vec3 {
        self.positions[role.index()]
    }

    pub fn set(&mut self, role: ChannelRole, position: Vec3) {
        self.positions[role.index()] = position;
    }

    /// Positions of the spatialized roles only
    pub fn positional(&self) -> impl Iterator<Item = (ChannelRole, Vec3)> + '_ {
        ChannelRole::ALL
            .into_iter()
            .filter(|role| role.is_positional())
            .map(move |role| (role, self.get(role)))
    }
}

/// Panning algorithm requested for a positional node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PanningModel {
    #[default]
    Hrtf,
    EqualPower,
}

/// Distance attenuation curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceModel {
    #[default]
    Inverse,
    Linear,
    Exponential,
}

/// Configuration of a positional sound node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PannerConfig {
    pub panning_model: PanningModel,
    pub distance_model: DistanceModel,
    pub ref_distance: f32,
    pub max_distance: f32,
    pub rolloff_factor: f32,
}

impl Default for PannerConfig {
    fn default() -> Self {
        Self {
            panning_model: PanningModel::Hrtf,
            distance_model: DistanceModel::Inverse,
            ref_distance: 6.0,
            max_distance: 100.0,
            rolloff_factor: 1.6,
        }
    }
}

/// Run state of the audio output context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created but not yet allowed to produce output
    Suspended,
    Running,
    Closed,
}

/// How the backend lets callers move a positional node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionCapability {
    /// Per-axis parameters scheduled at a context time
    Automated,
    /// Single immediate setter
    Immediate,
    /// Positions are fixed once created
    Unsupported,
}

/// Listener placement, normally following the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerPose {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl Default for ListenerPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }
}
