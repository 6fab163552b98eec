//! Frame counting and frames-per-second reporting.

use std::time::{Duration, Instant};

/// Minimum length of an FPS averaging window.
pub const FPS_WINDOW: Duration = Duration::from_secs(5);

/// Counts frames and reports the average rate over windows of at least
/// [`FPS_WINDOW`]. Purely observational: it never blocks.
#[derive(Debug, Clone)]
pub struct FrameClock {
    total_frames: u64,
    window_frames: u64,
    window_start: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// A clock whose first window opens at `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            total_frames: 0,
            window_frames: 0,
            window_start: start,
        }
    }

    /// Records one rendered frame.
    pub fn tick(&mut self) {
        self.total_frames += 1;
        self.window_frames += 1;
    }

    /// Frames recorded since construction.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Average rate over the current window, measured at `now`.
    ///
    /// Returns `None` until the window has lasted [`FPS_WINDOW`]; once it
    /// has, returns the rate and starts a new window at `now`.
    pub fn fps_at(&mut self, now: Instant) -> Option<f64> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < FPS_WINDOW {
            return None;
        }
        let fps = self.window_frames as f64 / elapsed.as_secs_f64();
        self.window_frames = 0;
        self.window_start = now;
        Some(fps)
    }

    /// [`fps_at`](Self::fps_at) measured now.
    pub fn fps(&mut self) -> Option<f64> {
        self.fps_at(Instant::now())
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_counts_frames() {
        let mut clock = FrameClock::new();
        for _ in 0..7 {
            clock.tick();
        }
        assert_eq!(clock.total_frames(), 7);
    }

    #[test]
    fn fps_is_none_before_window_elapses() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        clock.tick();
        assert_eq!(clock.fps_at(start + Duration::from_millis(4_999)), None);
    }

    #[test]
    fn fps_over_five_seconds_is_frames_over_five() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        for _ in 0..300 {
            clock.tick();
        }
        let fps = clock.fps_at(start + FPS_WINDOW).unwrap();
        assert!((fps - 60.0).abs() < 1e-9, "fps = {fps}");
    }

    #[test]
    fn fps_resets_window_after_report() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        for _ in 0..100 {
            clock.tick();
        }
        assert!(clock.fps_at(start + FPS_WINDOW).is_some());
        for _ in 0..50 {
            clock.tick();
        }
        assert_eq!(clock.fps_at(start + FPS_WINDOW + Duration::from_secs(1)), None);
        let fps = clock
            .fps_at(start + FPS_WINDOW + Duration::from_secs(10))
            .unwrap();
        assert!((fps - 5.0).abs() < 1e-9, "fps = {fps}");
        assert_eq!(clock.total_frames(), 150);
    }

    #[test]
    fn longer_windows_average_over_actual_elapsed_time() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        for _ in 0..80 {
            clock.tick();
        }
        let fps = clock.fps_at(start + Duration::from_secs(8)).unwrap();
        assert!((fps - 10.0).abs() < 1e-9, "fps = {fps}");
    }
}
