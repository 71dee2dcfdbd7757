//! Audio backend trait
//!
//! The node-graph operations the spatial router needs from a platform audio
//! API. [`SoftwareAudioContext`](super::SoftwareAudioContext) is the in-process
//! implementation.

use futures_util::future::LocalBoxFuture;
use glam::Vec3;

use super::types::{ContextState, ListenerPose, PannerConfig, PositionCapability};
use crate::media::MediaElement;

/// Handle to a node owned by an audio backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AudioNodeId(pub u32);

impl std::fmt::Display for AudioNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Errors reported by an audio backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AudioError {
    #[error("Cannot create media source: {0}")]
    SourceUnavailable(String),
    #[error("Unknown audio node {0}")]
    UnknownNode(AudioNodeId),
    #[error("Output {output} out of range for {node}")]
    OutputOutOfRange { node: AudioNodeId, output: usize },
    #[error("Connection {from} -> {to} rejected: {reason}")]
    ConnectionRejected {
        from: AudioNodeId,
        to: AudioNodeId,
        reason: String,
    },
    #[error("Node {0} is not positional")]
    NotPositional(AudioNodeId),
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
    #[error("Audio context is closed")]
    Closed,
}

/// Platform audio graph operations
pub trait AudioBackend {
    /// Current run state of the output context
    fn state(&self) -> ContextState;

    /// Ask the context to start producing output
    fn resume(&mut self) -> LocalBoxFuture<'_, Result<(), AudioError>>;

    /// Context clock in seconds
    fn current_time(&self) -> f64;

    /// How positional nodes can be moved on this backend
    fn position_capability(&self) -> PositionCapability;

    /// The final output node
    fn destination(&self) -> AudioNodeId;

    /// Create a source node fed by a media element
    fn create_media_source(&mut self, media: &dyn MediaElement) -> Result<AudioNodeId, AudioError>;

    /// Create a node that splits its input into `outputs` mono outputs
    fn create_channel_splitter(&mut self, outputs: usize) -> Result<AudioNodeId, AudioError>;

    fn create_gain(&mut self, gain: f32) -> Result<AudioNodeId, AudioError>;

    fn create_lowpass(&mut self, cutoff_hz: f32) -> Result<AudioNodeId, AudioError>;

    fn create_panner(&mut self, config: &PannerConfig, position: Vec3) -> Result<AudioNodeId, AudioError>;

    /// Connect output `output` of `from` to the input of `to`
    fn connect(&mut self, from: AudioNodeId, output: usize, to: AudioNodeId) -> Result<(), AudioError>;

    /// Schedule a panner position at a context time ([`PositionCapability::Automated`])
    fn schedule_position(&mut self, panner: AudioNodeId, position: Vec3, at_time: f64) -> Result<(), AudioError>;

    /// Move a panner immediately ([`PositionCapability::Immediate`])
    fn set_position(&mut self, panner: AudioNodeId, position: Vec3) -> Result<(), AudioError>;

    fn set_listener(&mut self, pose: ListenerPose);
}
