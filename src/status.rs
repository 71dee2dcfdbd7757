//! Read-only session status for inspection and the debug overlay

use serde::Serialize;

use crate::sync::ReadinessOutcome;

/// Snapshot of the media core at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub planes_found: bool,
    pub media_ready: bool,
    pub playing: bool,
    /// None before the video exists or while its position is unknown
    pub video_current_time: Option<f64>,
    pub audio_current_time: Option<f64>,
    pub scene_loaded: bool,
    /// Last chapter jumped to, 0 before any jump
    pub current_fragment: u8,
    pub readiness: ReadinessOutcome,
    pub audio_graph: bool,
}

impl StatusSnapshot {
    /// Render the overlay lines
    pub fn overlay_text(&self) -> String {
        format!(
            "planesFound: {}\nmediaReady: {} playing: {}\nvideo: {}s audio: {}s\nscene loaded: {}\ncurrent fragment: {}",
            self.planes_found,
            self.media_ready,
            self.playing,
            format_time(self.video_current_time),
            format_time(self.audio_current_time),
            self.scene_loaded,
            self.current_fragment
        )
    }
}

fn format_time(time: Option<f64>) -> String {
    match time {
        Some(t) if t.is_finite() => format!("{:.3}", t),
        _ => "-".to_string(),
    }
}
