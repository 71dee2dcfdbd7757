//! Spatial audio for the 5.1 track
//!
//! The six channels of the audio asset are split apart and each routed to its
//! own output node: five positional panners placed around the hall and a
//! low-passed flat path for the LFE channel.

mod backend;
pub mod dsp;
mod graph;
mod software;
mod types;

pub use backend::{AudioBackend, AudioError, AudioNodeId};
pub use graph::{
    ChannelChain, ChannelSink, GraphBuildError, GraphConfig, SpatialAudioGraph, WiringStatus, DEFAULT_CHANNEL_GAIN,
};
pub use software::{Connection, SoftwareAudioContext, SoftwareNode};
pub use types::{
    ChannelRole, ContextState, DistanceModel, ListenerPose, PannerConfig, PanningModel, PositionCapability,
    SpatialPositions, CHANNEL_COUNT, CHANNEL_ORDER,
};
