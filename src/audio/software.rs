//! In-process audio graph
//!
//! Implements [`AudioBackend`] with a small block renderer: media source,
//! channel splitter, gain, low-pass biquad, distance-attenuated equal-power
//! panner and a stereo destination. Blocks are pulled with
//! [`SoftwareAudioContext::render`] from whatever thread owns the context.

use std::collections::{HashMap, VecDeque};

use futures_util::future::{self, FutureExt, LocalBoxFuture};
use glam::Vec3;

use super::backend::{AudioBackend, AudioError, AudioNodeId};
use super::dsp::{distance_gain, equal_power_gains, Biquad, BUTTERWORTH_Q};
use super::types::{ContextState, ListenerPose, PannerConfig, PanningModel, PositionCapability};
use crate::media::MediaElement;

/// Maximum channel count accepted for a media source
const MAX_SOURCE_CHANNELS: usize = 32;

/// Node as seen from outside the context
#[derive(Debug, Clone, PartialEq)]
pub enum SoftwareNode {
    MediaSource { channels: usize },
    Splitter { outputs: usize },
    Gain { gain: f32 },
    Lowpass { cutoff_hz: f32 },
    Panner { config: PannerConfig, position: Vec3 },
    Destination,
}

impl SoftwareNode {
    fn output_count(&self) -> usize {
        match self {
            SoftwareNode::Splitter { outputs } => *outputs,
            SoftwareNode::Destination => 0,
            _ => 1,
        }
    }

    fn accepts_input(&self) -> bool {
        !matches!(self, SoftwareNode::MediaSource { .. })
    }
}

/// An edge from one node output to another node's input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub from: AudioNodeId,
    pub output: usize,
    pub to: AudioNodeId,
}

/// Channels x frames
type Bus = Vec<Vec<f32>>;

pub struct SoftwareAudioContext {
    sample_rate: f32,
    state: ContextState,
    capability: PositionCapability,
    nodes: Vec<SoftwareNode>,
    connections: Vec<Connection>,
    listener: ListenerPose,
    frames_rendered: u64,
    /// Biquad state per low-pass node, one filter per channel
    filters: HashMap<AudioNodeId, Vec<Biquad>>,
    /// Scheduled panner moves, ordered by time per node
    automation: HashMap<AudioNodeId, VecDeque<(f64, Vec3)>>,
}

impl SoftwareAudioContext {
    /// Create a suspended context with automated panner positions
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            state: ContextState::Suspended,
            capability: PositionCapability::Automated,
            nodes: vec![SoftwareNode::Destination],
            connections: Vec::new(),
            listener: ListenerPose::default(),
            frames_rendered: 0,
            filters: HashMap::new(),
            automation: HashMap::new(),
        }
    }

    /// Restrict how panners may be moved (mirrors older platform APIs)
    pub fn with_position_capability(mut self, capability: PositionCapability) -> Self {
        self.capability = capability;
        self
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn close(&mut self) {
        self.state = ContextState::Closed;
    }

    pub fn node(&self, id: AudioNodeId) -> Option<&SoftwareNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (AudioNodeId, &SoftwareNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (AudioNodeId(i as u32), n))
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connections feeding `node`
    pub fn inputs_of(&self, node: AudioNodeId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.to == node)
    }

    pub fn listener(&self) -> &ListenerPose {
        &self.listener
    }

    fn add_node(&mut self, node: SoftwareNode) -> Result<AudioNodeId, AudioError> {
        if self.state == ContextState::Closed {
            return Err(AudioError::Closed);
        }
        let id = AudioNodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        Ok(id)
    }

    fn panner_mut(&mut self, id: AudioNodeId) -> Result<&mut Vec3, AudioError> {
        match self.nodes.get_mut(id.0 as usize) {
            Some(SoftwareNode::Panner { position, .. }) => Ok(position),
            Some(_) => Err(AudioError::NotPositional(id)),
            None => Err(AudioError::UnknownNode(id)),
        }
    }

    fn apply_automation(&mut self, now: f64) {
        let mut moves = Vec::new();
        for (node, queue) in self.automation.iter_mut() {
            while let Some(&(at, position)) = queue.front() {
                if at > now {
                    break;
                }
                queue.pop_front();
                moves.push((*node, position));
            }
        }
        for (node, position) in moves {
            if let Ok(current) = self.panner_mut(node) {
                *current = position;
            }
        }
    }

    /// Nodes in dependency order (Kahn); nodes on cycles are left out
    fn processing_order(&self) -> Vec<usize> {
        let count = self.nodes.len();
        let mut in_degree = vec![0usize; count];
        for c in &self.connections {
            in_degree[c.to.0 as usize] += 1;
        }
        let mut ready: VecDeque<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(count);
        while let Some(index) = ready.pop_front() {
            order.push(index);
            for c in self.connections.iter().filter(|c| c.from.0 as usize == index) {
                let to = c.to.0 as usize;
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    ready.push_back(to);
                }
            }
        }
        order
    }

    /// Render one block
    ///
    /// `source` holds interleaved frames for the media source node. Returns
    /// interleaved stereo. A context that is not running renders silence and
    /// does not advance its clock.
    pub fn render(&mut self, source: &[f32]) -> Vec<f32> {
        let source_channels = self
            .nodes
            .iter()
            .find_map(|n| match n {
                SoftwareNode::MediaSource { channels } => Some(*channels),
                _ => None,
            })
            .unwrap_or(1)
            .max(1);
        let frames = source.len() / source_channels;

        if self.state != ContextState::Running {
            return vec![0.0; frames * 2];
        }

        let block_start = self.current_time();
        self.apply_automation(block_start);

        let mut outputs: Vec<Vec<Bus>> = vec![Vec::new(); self.nodes.len()];
        let mut destination: Bus = Vec::new();

        for index in self.processing_order() {
            let id = AudioNodeId(index as u32);
            let mut input: Bus = Vec::new();
            for c in self.connections.iter().filter(|c| c.to == id) {
                if let Some(bus) = outputs[c.from.0 as usize].get(c.output) {
                    mix_into(&mut input, bus, frames);
                }
            }
            if input.is_empty() {
                input = vec![vec![0.0; frames]];
            }

            let node = self.nodes[index].clone();
            outputs[index] = match node {
                SoftwareNode::MediaSource { channels } => {
                    let mut bus = vec![vec![0.0; frames]; channels];
                    for (frame, samples) in source.chunks_exact(channels).enumerate() {
                        for (ch, sample) in samples.iter().enumerate() {
                            bus[ch][frame] = *sample;
                        }
                    }
                    vec![bus]
                }
                SoftwareNode::Splitter { outputs: count } => (0..count)
                    .map(|ch| vec![input.get(ch).cloned().unwrap_or_else(|| vec![0.0; frames])])
                    .collect(),
                SoftwareNode::Gain { gain } => {
                    for channel in input.iter_mut() {
                        channel.iter_mut().for_each(|s| *s *= gain);
                    }
                    vec![input]
                }
                SoftwareNode::Lowpass { cutoff_hz } => {
                    let sample_rate = self.sample_rate;
                    let filters = self.filters.entry(id).or_default();
                    while filters.len() < input.len() {
                        filters.push(Biquad::lowpass(cutoff_hz, BUTTERWORTH_Q, sample_rate));
                    }
                    for (channel, filter) in input.iter_mut().zip(filters.iter_mut()) {
                        channel.iter_mut().for_each(|s| *s = filter.process(*s));
                    }
                    vec![input]
                }
                SoftwareNode::Panner { config, position } => {
                    let distance = position.distance(self.listener.position);
                    let gain = distance_gain(&config, distance);
                    let (left_gain, right_gain) = equal_power_gains(&self.listener, position);
                    let scale = 1.0 / input.len() as f32;
                    let mut left = vec![0.0; frames];
                    let mut right = vec![0.0; frames];
                    for frame in 0..frames {
                        let mono: f32 = input.iter().map(|ch| ch[frame]).sum::<f32>() * scale * gain;
                        left[frame] = mono * left_gain;
                        right[frame] = mono * right_gain;
                    }
                    vec![vec![left, right]]
                }
                SoftwareNode::Destination => {
                    destination = input;
                    Vec::new()
                }
            };
        }

        self.frames_rendered += frames as u64;

        let mut out = vec![0.0; frames * 2];
        let (left, right) = match destination.len() {
            0 => return out,
            1 => (&destination[0], &destination[0]),
            _ => (&destination[0], &destination[1]),
        };
        for frame in 0..frames {
            out[frame * 2] = left[frame];
            out[frame * 2 + 1] = right[frame];
        }
        out
    }
}

/// Sum `src` into `dst`, up-mixing mono to the wider layout
fn mix_into(dst: &mut Bus, src: &Bus, frames: usize) {
    if dst.is_empty() {
        *dst = src.clone();
        return;
    }
    if src.len() > dst.len() {
        if dst.len() == 1 {
            let mono = dst[0].clone();
            dst.resize(src.len(), mono);
        } else {
            dst.resize(src.len(), vec![0.0; frames]);
        }
    }
    for (index, channel) in dst.iter_mut().enumerate() {
        let from = if src.len() == 1 {
            &src[0]
        } else if let Some(ch) = src.get(index) {
            ch
        } else {
            continue;
        };
        for (d, s) in channel.iter_mut().zip(from.iter()) {
            *d += *s;
        }
    }
}

impl AudioBackend for SoftwareAudioContext {
    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> LocalBoxFuture<'_, Result<(), AudioError>> {
        let result = match self.state {
            ContextState::Closed => Err(AudioError::Closed),
            _ => {
                self.state = ContextState::Running;
                Ok(())
            }
        };
        future::ready(result).boxed_local()
    }

    fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    fn position_capability(&self) -> PositionCapability {
        self.capability
    }

    fn destination(&self) -> AudioNodeId {
        AudioNodeId(0)
    }

    fn create_media_source(&mut self, media: &dyn MediaElement) -> Result<AudioNodeId, AudioError> {
        let channels = media.channel_count();
        if channels == 0 || channels > MAX_SOURCE_CHANNELS {
            return Err(AudioError::SourceUnavailable(format!(
                "{} has {} audio channels",
                media.source().display(),
                channels
            )));
        }
        self.add_node(SoftwareNode::MediaSource { channels })
    }

    fn create_channel_splitter(&mut self, outputs: usize) -> Result<AudioNodeId, AudioError> {
        if outputs == 0 || outputs > MAX_SOURCE_CHANNELS {
            return Err(AudioError::Unsupported("splitter output count"));
        }
        self.add_node(SoftwareNode::Splitter { outputs })
    }

    fn create_gain(&mut self, gain: f32) -> Result<AudioNodeId, AudioError> {
        self.add_node(SoftwareNode::Gain { gain })
    }

    fn create_lowpass(&mut self, cutoff_hz: f32) -> Result<AudioNodeId, AudioError> {
        if !(cutoff_hz > 0.0 && cutoff_hz < self.sample_rate / 2.0) {
            return Err(AudioError::Unsupported("low-pass cutoff outside (0, nyquist)"));
        }
        self.add_node(SoftwareNode::Lowpass { cutoff_hz })
    }

    fn create_panner(&mut self, config: &PannerConfig, position: Vec3) -> Result<AudioNodeId, AudioError> {
        if config.panning_model == PanningModel::Hrtf {
            tracing::debug!("SoftwareAudioContext: HRTF panning rendered as equal-power");
        }
        self.add_node(SoftwareNode::Panner { config: *config, position })
    }

    fn connect(&mut self, from: AudioNodeId, output: usize, to: AudioNodeId) -> Result<(), AudioError> {
        let source = self.node(from).ok_or(AudioError::UnknownNode(from))?;
        let target = self.node(to).ok_or(AudioError::UnknownNode(to))?;
        if output >= source.output_count() {
            return Err(AudioError::OutputOutOfRange { node: from, output });
        }
        if !target.accepts_input() || from == to {
            return Err(AudioError::ConnectionRejected {
                from,
                to,
                reason: "target does not take input".to_string(),
            });
        }
        let connection = Connection { from, output, to };
        if !self.connections.contains(&connection) {
            self.connections.push(connection);
        }
        Ok(())
    }

    fn schedule_position(&mut self, panner: AudioNodeId, position: Vec3, at_time: f64) -> Result<(), AudioError> {
        if self.capability != PositionCapability::Automated {
            return Err(AudioError::Unsupported("scheduled positions"));
        }
        let now = self.current_time();
        if at_time <= now {
            *self.panner_mut(panner)? = position;
            return Ok(());
        }
        self.panner_mut(panner)?;
        let queue = self.automation.entry(panner).or_default();
        // A new event supersedes any scheduled after it
        queue.retain(|(at, _)| *at < at_time);
        queue.push_back((at_time, position));
        Ok(())
    }

    fn set_position(&mut self, panner: AudioNodeId, position: Vec3) -> Result<(), AudioError> {
        if self.capability == PositionCapability::Unsupported {
            return Err(AudioError::Unsupported("panner positions"));
        }
        *self.panner_mut(panner)? = position;
        Ok(())
    }

    fn set_listener(&mut self, pose: ListenerPose) {
        self.listener = pose;
    }
}
