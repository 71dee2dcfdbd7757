//! Keyboard transport: space toggles playback, digits 1-7 jump to chapters

use std::str::FromStr;

/// Chapter start times in seconds
///
/// Index 0 is the start of the film; 1..=7 are addressable from the keyboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterTable {
    times: [f64; ChapterTable::LEN],
}

impl ChapterTable {
    pub const LEN: usize = 8;

    /// Highest chapter reachable from a digit key
    pub const LAST: u8 = (Self::LEN - 1) as u8;

    pub fn new(times: Vec<f64>) -> Result<Self, String> {
        let times: [f64; Self::LEN] = times
            .try_into()
            .map_err(|t: Vec<f64>| format!("expected {} chapter times, found {}", Self::LEN, t.len()))?;
        if let Some(bad) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(format!("invalid chapter time {}", bad));
        }
        Ok(Self { times })
    }

    /// Start of chapter `n`, for 1..=7
    pub fn get(&self, n: u8) -> Option<f64> {
        if n == 0 || n > Self::LAST {
            return None;
        }
        self.times.get(n as usize).copied()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }
}

impl Default for ChapterTable {
    fn default() -> Self {
        Self {
            times: [0.0, 32.0, 424.0, 1039.0, 1697.0, 1949.0, 2649.0, 3257.0],
        }
    }
}

/// A key press as the transport sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Space,
    Digit(u8),
    Other,
}

impl FromStr for KeyInput {
    type Err = std::convert::Infallible;

    /// Accepts key codes ("Space", "Digit3") and key values (" ", "3")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == " " {
            return Ok(KeyInput::Space);
        }
        let s = s.trim();
        if s.eq_ignore_ascii_case("space") {
            return Ok(KeyInput::Space);
        }
        let digits = s.strip_prefix("Digit").unwrap_or(s);
        let mut chars = digits.chars();
        Ok(match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_digit() => KeyInput::Digit(c as u8 - b'0'),
            _ => KeyInput::Other,
        })
    }
}

/// Transport action produced by a key
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportCommand {
    TogglePlayPause,
    SeekChapter { index: u8, seconds: f64 },
}

/// Maps keys to transport commands
#[derive(Debug, Clone, Default)]
pub struct ControlSurface {
    chapters: ChapterTable,
}

impl ControlSurface {
    pub fn new(chapters: ChapterTable) -> Self {
        Self { chapters }
    }

    pub fn chapters(&self) -> &ChapterTable {
        &self.chapters
    }

    pub fn map(&self, key: KeyInput) -> Option<TransportCommand> {
        match key {
            KeyInput::Space => Some(TransportCommand::TogglePlayPause),
            KeyInput::Digit(n) => self
                .chapters
                .get(n)
                .map(|seconds| TransportCommand::SeekChapter { index: n, seconds }),
            KeyInput::Other => None,
        }
    }
}
