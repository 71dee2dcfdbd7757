//! Container header reading
//!
//! Reads duration and audio channel count without decoding: RIFF/WAVE through
//! `hound`, ISO-BMFF (mp4, m4a, mov) through `mp4`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::element::MediaError;

/// What the container header says about the stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamHeader {
    /// Seconds; None when the header carries no duration
    pub duration: Option<f64>,
    /// Channels of the first audio track, 0 without one
    pub channels: usize,
}

/// Read the header of the file at `path`
pub fn read_header(path: &Path) -> Result<StreamHeader, MediaError> {
    let fail = |reason: String| MediaError::OpenFailed {
        path: path.display().to_string(),
        reason,
    };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "wav" | "wave" => read_wav_header(path).map_err(fail),
        "mp4" | "m4a" | "m4v" | "mov" => read_mp4_header(path).map_err(fail),
        other => Err(fail(format!("unsupported container '{}'", other))),
    }
}

fn read_wav_header(path: &Path) -> Result<StreamHeader, String> {
    let reader = hound::WavReader::open(path).map_err(|e| e.to_string())?;
    let spec = reader.spec();
    let duration = (spec.sample_rate > 0).then(|| reader.duration() as f64 / spec.sample_rate as f64);
    Ok(StreamHeader {
        duration,
        channels: spec.channels as usize,
    })
}

fn read_mp4_header(path: &Path) -> Result<StreamHeader, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let size = file.metadata().map_err(|e| e.to_string())?.len();
    let mp4 = mp4::Mp4Reader::read_header(BufReader::new(file), size).map_err(|e| e.to_string())?;

    let seconds = mp4.duration().as_secs_f64();
    let duration = (seconds > 0.0).then_some(seconds);

    let channels = mp4
        .tracks()
        .values()
        .filter(|track| matches!(track.track_type(), Ok(mp4::TrackType::Audio)))
        .find_map(|track| track.channel_config().ok())
        .map(channels_for)
        .unwrap_or(0);

    Ok(StreamHeader { duration, channels })
}

/// AAC channel configuration index to speaker count
fn channels_for(config: mp4::ChannelConfig) -> usize {
    match config as u8 {
        // Configuration 7 is 7.1
        7 => 8,
        n => n as usize,
    }
}
