//! Sample-level building blocks for the software context
//!
//! Low-pass biquad (RBJ cookbook), distance attenuation curves and
//! equal-power stereo panning.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use glam::Vec3;

use super::types::{DistanceModel, ListenerPose, PannerConfig};

/// Butterworth Q used for the LFE low-pass
pub const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Second-order low-pass section, transposed direct form II
#[derive(Debug, Clone)]
pub struct Biquad {
    /// Feed-forward taps, already divided by a0
    b: [f32; 3],
    /// Feedback taps a1, a2, already divided by a0
    a: [f32; 2],
    state: [f32; 2],
}

impl Biquad {
    /// RBJ cookbook low-pass at `cutoff_hz`
    pub fn lowpass(cutoff_hz: f32, q: f32, sample_rate: f32) -> Self {
        let omega = 2.0 * PI * cutoff_hz / sample_rate;
        let (sin, cos) = omega.sin_cos();
        let alpha = sin / (2.0 * q);
        let norm = 1.0 / (1.0 + alpha);
        let side = (1.0 - cos) * 0.5 * norm;
        Self {
            b: [side, 2.0 * side, side],
            a: [-2.0 * cos * norm, (1.0 - alpha) * norm],
            state: [0.0; 2],
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b[0] * input + self.state[0];
        self.state[0] = self.b[1] * input - self.a[0] * output + self.state[1];
        self.state[1] = self.b[2] * input - self.a[1] * output;
        output
    }
}

/// Distance gain for a source `distance` units from the listener
///
/// Uses the usual linear, inverse and exponential rolloff curves; the distance is clamped to
/// `[ref_distance, max_distance]` for the inverse and exponential curves.
pub fn distance_gain(config: &PannerConfig, distance: f32) -> f32 {
    let reference = config.ref_distance.max(f32::EPSILON);
    let max = config.max_distance.max(reference);
    let rolloff = config.rolloff_factor.max(0.0);

    match config.distance_model {
        DistanceModel::Inverse => {
            let d = distance.clamp(reference, max);
            reference / (reference + rolloff * (d - reference))
        }
        DistanceModel::Linear => {
            let d = distance.clamp(reference, max);
            if max <= reference {
                return 1.0;
            }
            1.0 - rolloff.min(1.0) * (d - reference) / (max - reference)
        }
        DistanceModel::Exponential => {
            let d = distance.clamp(reference, max);
            (d / reference).powf(-rolloff)
        }
    }
}

/// Equal-power `(left, right)` gains for a source at `position`
///
/// The pan follows the source's projection onto the listener's right axis;
/// a source straight ahead or behind is centered.
pub fn equal_power_gains(listener: &ListenerPose, position: Vec3) -> (f32, f32) {
    let to_source = position - listener.position;
    if to_source.length_squared() <= f32::EPSILON {
        return (FRAC_PI_4.cos(), FRAC_PI_4.sin());
    }

    let forward = listener.forward.normalize_or_zero();
    let right = forward.cross(listener.up).normalize_or_zero();
    let pan = to_source.normalize().dot(right).clamp(-1.0, 1.0);

    // Map pan [-1, 1] to [0, pi/2]
    let angle = (pan + 1.0) * FRAC_PI_2 / 2.0;
    (angle.cos(), angle.sin())
}
