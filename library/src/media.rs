//! The media collaborator the editor reads the playhead from.

/// Anything that has a current playback position and can be seeked.
pub trait MediaClock {
    /// Current playhead position in seconds.
    fn current_time(&self) -> f64;

    fn seek(&mut self, time: f64);
}

/// A clock with no media behind it; just remembers the last seek.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualClock {
    time: f64,
}

impl ManualClock {
    pub fn at(time: f64) -> Self {
        Self { time: time.max(0.0) }
    }
}

impl MediaClock for ManualClock {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn seek(&mut self, time: f64) {
        if time.is_finite() {
            self.time = time.max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_clamps_and_ignores_nan() {
        let mut clock = ManualClock::at(3.0);
        clock.seek(-1.0);
        assert_eq!(clock.current_time(), 0.0);
        clock.seek(f64::NAN);
        assert_eq!(clock.current_time(), 0.0);
        clock.seek(7.5);
        assert_eq!(clock.current_time(), 7.5);
    }
}
