//! Spatial routing graph for the 5.1 track
//!
//! ```text
//! source -> splitter(6) -+- [0] gain -> panner(L)  -> destination
//!                        +- [1] gain -> panner(R)  -> destination
//!                        +- [2] gain -> panner(C)  -> destination
//!                        +- [3] gain -> lowpass    -> destination
//!                        +- [4] gain -> panner(SL) -> destination
//!                        +- [5] gain -> panner(SR) -> destination
//! ```
//!
//! Channel wiring is best-effort: every connection step is attempted on its
//! own and its outcome recorded, so one broken channel leaves the others
//! audible.

use glam::Vec3;

use super::backend::{AudioBackend, AudioError, AudioNodeId};
use super::types::{ChannelRole, PannerConfig, PositionCapability, SpatialPositions, CHANNEL_COUNT, CHANNEL_ORDER};
use crate::media::MediaElement;

/// Unity gain applied to every channel
pub const DEFAULT_CHANNEL_GAIN: f32 = 1.0;

/// Parameters of the routing graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphConfig {
    pub panner: PannerConfig,
    pub lfe_cutoff_hz: f32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            panner: PannerConfig::default(),
            lfe_cutoff_hz: 120.0,
        }
    }
}

/// Why the graph could not be built at all
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphBuildError {
    #[error("media source unavailable: {0}")]
    Source(AudioError),
    #[error("channel splitter unavailable: {0}")]
    Splitter(AudioError),
    #[error("source -> splitter connection failed: {0}")]
    SourceConnection(AudioError),
}

/// Processing node at the end of a channel chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSink {
    /// Positional node for L, R, C, SL, SR
    Panner(AudioNodeId),
    /// Band-limited flat path for LFE
    Lowpass(AudioNodeId),
}

impl ChannelSink {
    pub fn node(&self) -> AudioNodeId {
        match self {
            ChannelSink::Panner(id) | ChannelSink::Lowpass(id) => *id,
        }
    }
}

/// Outcome of each wiring step of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WiringStatus {
    pub splitter_to_gain: bool,
    pub gain_to_sink: bool,
    pub sink_to_output: bool,
}

impl WiringStatus {
    pub fn is_complete(&self) -> bool {
        self.splitter_to_gain && self.gain_to_sink && self.sink_to_output
    }
}

/// One channel's chain from a splitter output to the destination
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelChain {
    pub role: ChannelRole,
    pub splitter_output: usize,
    pub gain: Option<AudioNodeId>,
    pub sink: Option<ChannelSink>,
    pub wiring: WiringStatus,
}

/// The built routing graph
#[derive(Debug, Clone)]
pub struct SpatialAudioGraph {
    source: AudioNodeId,
    splitter: AudioNodeId,
    chains: Vec<ChannelChain>,
    capability: PositionCapability,
}

impl SpatialAudioGraph {
    /// Build the graph for a six-channel media element
    ///
    /// Fails only when the source or splitter cannot exist; per-channel
    /// problems are logged and recorded in each chain's [`WiringStatus`].
    pub fn build<B: AudioBackend + ?Sized>(
        backend: &mut B,
        media: &dyn MediaElement,
        positions: &SpatialPositions,
        config: &GraphConfig,
    ) -> Result<Self, GraphBuildError> {
        let source = backend.create_media_source(media).map_err(|e| {
            tracing::error!("Failed to create media source for {}: {}", media.source().display(), e);
            GraphBuildError::Source(e)
        })?;

        let splitter = backend.create_channel_splitter(CHANNEL_COUNT).map_err(|e| {
            tracing::error!("Failed to create channel splitter: {}", e);
            GraphBuildError::Splitter(e)
        })?;

        backend.connect(source, 0, splitter).map_err(|e| {
            tracing::error!("Failed to connect media source to splitter: {}", e);
            GraphBuildError::SourceConnection(e)
        })?;

        // Resolved once; per-frame updates reuse it
        let capability = backend.position_capability();
        let destination = backend.destination();

        let chains = CHANNEL_ORDER
            .iter()
            .enumerate()
            .map(|(index, role)| Self::build_chain(backend, splitter, destination, index, *role, positions, config))
            .collect::<Vec<_>>();

        let complete = chains.iter().filter(|c| c.wiring.is_complete()).count();
        tracing::info!(
            "Multichannel audio graph created: {}/{} channels wired, positions {:?}",
            complete,
            CHANNEL_COUNT,
            capability
        );

        Ok(Self {
            source,
            splitter,
            chains,
            capability,
        })
    }

    fn build_chain<B: AudioBackend + ?Sized>(
        backend: &mut B,
        splitter: AudioNodeId,
        destination: AudioNodeId,
        index: usize,
        role: ChannelRole,
        positions: &SpatialPositions,
        config: &GraphConfig,
    ) -> ChannelChain {
        let mut chain = ChannelChain {
            role,
            splitter_output: index,
            gain: None,
            sink: None,
            wiring: WiringStatus::default(),
        };

        match backend.create_gain(DEFAULT_CHANNEL_GAIN) {
            Ok(gain) => chain.gain = Some(gain),
            Err(e) => tracing::warn!("Failed to create gain for {}: {}", role, e),
        }

        let sink = if role.is_positional() {
            backend
                .create_panner(&config.panner, positions.get(role))
                .map(ChannelSink::Panner)
        } else {
            backend.create_lowpass(config.lfe_cutoff_hz).map(ChannelSink::Lowpass)
        };
        match sink {
            Ok(sink) => chain.sink = Some(sink),
            Err(e) => tracing::warn!("Failed to create output node for {}: {}", role, e),
        }

        if let Some(gain) = chain.gain {
            match backend.connect(splitter, index, gain) {
                Ok(()) => chain.wiring.splitter_to_gain = true,
                Err(e) => tracing::warn!("Failed to connect splitter -> gain for {}: {}", role, e),
            }
            if let Some(sink) = chain.sink {
                match backend.connect(gain, 0, sink.node()) {
                    Ok(()) => chain.wiring.gain_to_sink = true,
                    Err(e) => tracing::warn!("Failed to connect gain -> {:?} for {}: {}", sink, role, e),
                }
            }
        }
        if let Some(sink) = chain.sink {
            match backend.connect(sink.node(), 0, destination) {
                Ok(()) => chain.wiring.sink_to_output = true,
                Err(e) => tracing::warn!("Failed to connect {:?} -> output for {}: {}", sink, role, e),
            }
        }

        chain
    }

    pub fn source(&self) -> AudioNodeId {
        self.source
    }

    pub fn splitter(&self) -> AudioNodeId {
        self.splitter
    }

    pub fn chains(&self) -> &[ChannelChain] {
        &self.chains
    }

    pub fn chain(&self, role: ChannelRole) -> Option<&ChannelChain> {
        self.chains.iter().find(|c| c.role == role)
    }

    pub fn capability(&self) -> PositionCapability {
        self.capability
    }

    /// Panner node of each positional channel that has one
    pub fn panners(&self) -> impl Iterator<Item = (ChannelRole, AudioNodeId)> + '_ {
        self.chains.iter().filter_map(|c| match c.sink {
            Some(ChannelSink::Panner(id)) => Some((c.role, id)),
            _ => None,
        })
    }

    /// Re-assert every panner position from the live table
    ///
    /// Called once per frame. Failures are logged at trace level; a failed
    /// update keeps the previous position.
    pub fn update_positions<B: AudioBackend + ?Sized>(&self, backend: &mut B, positions: &SpatialPositions) {
        if self.capability == PositionCapability::Unsupported {
            return;
        }
        let now = backend.current_time();
        for (role, panner) in self.panners() {
            let position: Vec3 = positions.get(role);
            let result = match self.capability {
                PositionCapability::Automated => backend.schedule_position(panner, position, now),
                PositionCapability::Immediate => backend.set_position(panner, position),
                PositionCapability::Unsupported => Ok(()),
            };
            if let Err(e) = result {
                tracing::trace!("Panner update for {} failed: {}", role, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::software::{SoftwareAudioContext, SoftwareNode};
    use crate::audio::types::{ContextState, ListenerPose};
    use crate::media::testing::{call_log, MockMedia};
    use crate::media::MediaKind;
    use futures_util::future::LocalBoxFuture;

    fn default_positions() -> SpatialPositions {
        crate::settings::SpeakerLayout::default().to_positions()
    }

    fn audio_media() -> MockMedia {
        MockMedia::new(MediaKind::Audio, &call_log())
    }

    /// Delegates to a software context, refusing selected connections
    struct FlakyBackend {
        inner: SoftwareAudioContext,
        refuse_splitter_outputs: Vec<usize>,
        refuse_panners: bool,
    }

    impl AudioBackend for FlakyBackend {
        fn state(&self) -> ContextState {
            self.inner.state()
        }
        fn resume(&mut self) -> LocalBoxFuture<'_, Result<(), AudioError>> {
            self.inner.resume()
        }
        fn current_time(&self) -> f64 {
            self.inner.current_time()
        }
        fn position_capability(&self) -> PositionCapability {
            self.inner.position_capability()
        }
        fn destination(&self) -> AudioNodeId {
            self.inner.destination()
        }
        fn create_media_source(&mut self, media: &dyn MediaElement) -> Result<AudioNodeId, AudioError> {
            self.inner.create_media_source(media)
        }
        fn create_channel_splitter(&mut self, outputs: usize) -> Result<AudioNodeId, AudioError> {
            self.inner.create_channel_splitter(outputs)
        }
        fn create_gain(&mut self, gain: f32) -> Result<AudioNodeId, AudioError> {
            self.inner.create_gain(gain)
        }
        fn create_lowpass(&mut self, cutoff_hz: f32) -> Result<AudioNodeId, AudioError> {
            self.inner.create_lowpass(cutoff_hz)
        }
        fn create_panner(&mut self, config: &PannerConfig, position: Vec3) -> Result<AudioNodeId, AudioError> {
            if self.refuse_panners {
                return Err(AudioError::Unsupported("panner"));
            }
            self.inner.create_panner(config, position)
        }
        fn connect(&mut self, from: AudioNodeId, output: usize, to: AudioNodeId) -> Result<(), AudioError> {
            if matches!(self.inner.node(from), Some(SoftwareNode::Splitter { .. }))
                && self.refuse_splitter_outputs.contains(&output)
            {
                return Err(AudioError::ConnectionRejected {
                    from,
                    to,
                    reason: "refused".to_string(),
                });
            }
            self.inner.connect(from, output, to)
        }
        fn schedule_position(&mut self, panner: AudioNodeId, position: Vec3, at_time: f64) -> Result<(), AudioError> {
            self.inner.schedule_position(panner, position, at_time)
        }
        fn set_position(&mut self, panner: AudioNodeId, position: Vec3) -> Result<(), AudioError> {
            self.inner.set_position(panner, position)
        }
        fn set_listener(&mut self, pose: ListenerPose) {
            self.inner.set_listener(pose)
        }
    }

    #[test]
    fn test_graph_shape_for_six_channel_source() {
        let mut ctx = SoftwareAudioContext::new(48000.0);
        let graph = SpatialAudioGraph::build(&mut ctx, &audio_media(), &default_positions(), &GraphConfig::default()).unwrap();

        let panners: Vec<_> = ctx.nodes().filter(|(_, n)| matches!(n, SoftwareNode::Panner { .. })).collect();
        let lowpasses: Vec<_> = ctx.nodes().filter(|(_, n)| matches!(n, SoftwareNode::Lowpass { .. })).collect();
        assert_eq!(panners.len(), 5);
        assert_eq!(lowpasses.len(), 1);
        assert_eq!(lowpasses[0].1, &SoftwareNode::Lowpass { cutoff_hz: 120.0 });

        // Each output node is fed by a gain fed from a distinct splitter output
        let destination = ctx.destination();
        let mut splitter_outputs = Vec::new();
        for (sink, _) in panners.iter().chain(lowpasses.iter()) {
            assert!(ctx.connections().iter().any(|c| c.from == *sink && c.to == destination));
            let gain = ctx.inputs_of(*sink).next().unwrap().from;
            let feed = ctx.inputs_of(gain).next().unwrap();
            assert_eq!(feed.from, graph.splitter());
            splitter_outputs.push(feed.output);
        }
        splitter_outputs.sort_unstable();
        assert_eq!(splitter_outputs, vec![0, 1, 2, 3, 4, 5]);
        assert!(graph.chains().iter().all(|c| c.wiring.is_complete()));
    }

    #[test]
    fn test_lfe_chain_is_lowpass_on_output_three() {
        let mut ctx = SoftwareAudioContext::new(48000.0);
        let graph = SpatialAudioGraph::build(&mut ctx, &audio_media(), &default_positions(), &GraphConfig::default()).unwrap();

        let lfe = graph.chain(ChannelRole::Lfe).unwrap();
        assert_eq!(lfe.splitter_output, 3);
        assert!(matches!(lfe.sink, Some(ChannelSink::Lowpass(_))));
        assert_eq!(graph.panners().count(), 5);
        assert!(graph.panners().all(|(role, _)| role != ChannelRole::Lfe));
    }

    #[test]
    fn test_panners_use_configured_parameters_and_positions() {
        let mut ctx = SoftwareAudioContext::new(48000.0);
        let positions = default_positions();
        let graph = SpatialAudioGraph::build(&mut ctx, &audio_media(), &positions, &GraphConfig::default()).unwrap();

        for (role, panner) in graph.panners() {
            match ctx.node(panner) {
                Some(SoftwareNode::Panner { config, position }) => {
                    assert_eq!(config.ref_distance, 6.0);
                    assert_eq!(config.max_distance, 100.0);
                    assert_eq!(config.rolloff_factor, 1.6);
                    assert_eq!(*position, positions.get(role));
                }
                other => panic!("expected panner, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_source_failure_aborts_build() {
        let mut ctx = SoftwareAudioContext::new(48000.0);
        let media = audio_media().with_channels(0);
        let result = SpatialAudioGraph::build(&mut ctx, &media, &default_positions(), &GraphConfig::default());
        assert!(matches!(result, Err(GraphBuildError::Source(_))));
    }

    #[test]
    fn test_one_channel_failure_leaves_others_wired() {
        let mut backend = FlakyBackend {
            inner: SoftwareAudioContext::new(48000.0),
            refuse_splitter_outputs: vec![1],
            refuse_panners: false,
        };
        let graph = SpatialAudioGraph::build(&mut backend, &audio_media(), &default_positions(), &GraphConfig::default()).unwrap();

        let right = graph.chain(ChannelRole::Right).unwrap();
        assert!(!right.wiring.splitter_to_gain);
        // Later steps of the broken channel are still attempted
        assert!(right.wiring.gain_to_sink);
        assert!(right.wiring.sink_to_output);

        for chain in graph.chains().iter().filter(|c| c.role != ChannelRole::Right) {
            assert!(chain.wiring.is_complete(), "{} should be wired", chain.role);
        }
    }

    #[test]
    fn test_missing_panners_keep_lfe_path() {
        let mut backend = FlakyBackend {
            inner: SoftwareAudioContext::new(48000.0),
            refuse_splitter_outputs: Vec::new(),
            refuse_panners: true,
        };
        let graph = SpatialAudioGraph::build(&mut backend, &audio_media(), &default_positions(), &GraphConfig::default()).unwrap();

        assert_eq!(graph.panners().count(), 0);
        assert!(graph.chain(ChannelRole::Lfe).unwrap().wiring.is_complete());
        let left = graph.chain(ChannelRole::Left).unwrap();
        assert!(left.sink.is_none());
        assert!(left.wiring.splitter_to_gain);
    }

    #[test]
    fn test_update_positions_follows_table() {
        let mut ctx = SoftwareAudioContext::new(48000.0);
        let mut positions = default_positions();
        let graph = SpatialAudioGraph::build(&mut ctx, &audio_media(), &positions, &GraphConfig::default()).unwrap();

        positions.set(ChannelRole::Center, Vec3::new(1.0, 2.0, 3.0));
        graph.update_positions(&mut ctx, &positions);

        let (_, center) = graph.panners().find(|(r, _)| *r == ChannelRole::Center).unwrap();
        assert!(matches!(ctx.node(center), Some(SoftwareNode::Panner { position, .. }) if *position == Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_immediate_capability_resolved_at_build() {
        let mut ctx = SoftwareAudioContext::new(48000.0).with_position_capability(PositionCapability::Immediate);
        let mut positions = default_positions();
        let graph = SpatialAudioGraph::build(&mut ctx, &audio_media(), &positions, &GraphConfig::default()).unwrap();
        assert_eq!(graph.capability(), PositionCapability::Immediate);

        positions.set(ChannelRole::SurroundLeft, Vec3::ZERO);
        graph.update_positions(&mut ctx, &positions);
        let (_, sl) = graph.panners().find(|(r, _)| *r == ChannelRole::SurroundLeft).unwrap();
        assert!(matches!(ctx.node(sl), Some(SoftwareNode::Panner { position, .. }) if *position == Vec3::ZERO));
    }

    #[test]
    fn test_unsupported_capability_keeps_initial_positions() {
        let mut ctx = SoftwareAudioContext::new(48000.0).with_position_capability(PositionCapability::Unsupported);
        let mut positions = default_positions();
        let initial = positions.get(ChannelRole::Left);
        let graph = SpatialAudioGraph::build(&mut ctx, &audio_media(), &positions, &GraphConfig::default()).unwrap();

        positions.set(ChannelRole::Left, Vec3::ZERO);
        graph.update_positions(&mut ctx, &positions);
        let (_, left) = graph.panners().find(|(r, _)| *r == ChannelRole::Left).unwrap();
        assert!(matches!(ctx.node(left), Some(SoftwareNode::Panner { position, .. }) if *position == initial));
    }
}
