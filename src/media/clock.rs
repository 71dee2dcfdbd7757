//! Playback position clock
//!
//! Tracks a media position that advances in real time while running and
//! holds still while paused.

use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    /// Position when the clock was last anchored
    base_position: f64,
    /// Wall time of the anchor while running
    running_since: Option<Instant>,
    /// Upper bound for the position, if the duration is known
    duration: Option<f64>,
}

impl PlaybackClock {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            base_position: 0.0,
            running_since: None,
            duration,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn position_at(&self, now: Instant) -> f64 {
        let position = match self.running_since {
            Some(since) => self.base_position + now.saturating_duration_since(since).as_secs_f64(),
            None => self.base_position,
        };
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    pub fn position(&self) -> f64 {
        self.position_at(Instant::now())
    }

    pub fn start_at(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    pub fn stop_at(&mut self, now: Instant) {
        self.base_position = self.position_at(now);
        self.running_since = None;
    }

    /// Jump to `position`, keeping the running state
    pub fn seek_at(&mut self, position: f64, now: Instant) {
        let position = match self.duration {
            Some(duration) => position.clamp(0.0, duration),
            None => position.max(0.0),
        };
        self.base_position = position;
        if self.running_since.is_some() {
            self.running_since = Some(now);
        }
    }

    /// Whether the position has reached a known duration
    pub fn has_ended_at(&self, now: Instant) -> bool {
        match self.duration {
            Some(duration) => self.position_at(now) >= duration,
            None => false,
        }
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clock_advances_only_while_running() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new(None);
        assert_eq!(clock.position_at(t0 + Duration::from_secs(5)), 0.0);

        clock.start_at(t0);
        assert!((clock.position_at(t0 + Duration::from_secs(2)) - 2.0).abs() < 1e-9);

        clock.stop_at(t0 + Duration::from_secs(3));
        assert!((clock.position_at(t0 + Duration::from_secs(10)) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_seek_while_running_reanchors() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new(None);
        clock.start_at(t0);
        clock.seek_at(1039.0, t0 + Duration::from_secs(1));
        assert!((clock.position_at(t0 + Duration::from_secs(2)) - 1040.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_clamped_to_duration() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new(Some(10.0));
        clock.seek_at(50.0, t0);
        assert_eq!(clock.position_at(t0), 10.0);
        clock.seek_at(-3.0, t0);
        assert_eq!(clock.position_at(t0), 0.0);
    }

    #[test]
    fn test_ends_at_duration() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new(Some(3.0));
        clock.start_at(t0);
        assert!(!clock.has_ended_at(t0 + Duration::from_secs(2)));
        assert!(clock.has_ended_at(t0 + Duration::from_secs(3)));
        assert_eq!(clock.position_at(t0 + Duration::from_secs(60)), 3.0);

        assert!(!PlaybackClock::new(None).has_ended_at(t0 + Duration::from_secs(60)));
    }
}
