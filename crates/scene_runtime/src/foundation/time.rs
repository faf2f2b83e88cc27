//! Time management utilities

use std::time::{Duration, Instant};

/// Accumulates how long each frame update took
///
/// The simulation clock is driven by the caller's `dt`; this only measures
/// wall time spent inside updates for reporting.
#[derive(Debug)]
pub struct FrameTimer {
    started: Option<Instant>,
    total: Duration,
    slowest: Duration,
    frame_count: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a new timer with no recorded frames
    pub fn new() -> Self {
        Self {
            started: None,
            total: Duration::ZERO,
            slowest: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Mark the start of a frame update
    pub fn begin(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Mark the end of a frame update and record its duration
    pub fn end(&mut self) -> Duration {
        let Some(start) = self.started.take() else {
            return Duration::ZERO;
        };
        let elapsed = start.elapsed();
        self.total += elapsed;
        self.slowest = self.slowest.max(elapsed);
        self.frame_count += 1;
        elapsed
    }

    /// Number of recorded frames
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average update time in milliseconds
    pub fn average_millis(&self) -> f32 {
        if self.frame_count == 0 {
            return 0.0;
        }
        self.total.as_secs_f32() * 1000.0 / self.frame_count as f32
    }

    /// Slowest recorded update in milliseconds
    pub fn slowest_millis(&self) -> f32 {
        self.slowest.as_secs_f32() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_without_begin_records_nothing() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.end(), Duration::ZERO);
        assert_eq!(timer.frame_count(), 0);
        assert_eq!(timer.average_millis(), 0.0);
    }

    #[test]
    fn test_frames_are_counted() {
        let mut timer = FrameTimer::new();
        for _ in 0..3 {
            timer.begin();
            timer.end();
        }
        assert_eq!(timer.frame_count(), 3);
        assert!(timer.slowest_millis() >= 0.0);
    }
}
