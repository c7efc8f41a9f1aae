use std::collections::VecDeque;

const DEFAULT_MAX_DELTA: f32 = 0.1;
const RUNNING_WINDOW: usize = 60;

/// Per-frame delta time bookkeeping.
///
/// Fed the current time in seconds once per frame. The first frame measures
/// from zero; deltas are clamped so a stall does not teleport the camera.
#[derive(Debug, Clone)]
pub struct FrameTiming {
    last_frame: f64,
    delta: f32,
    frame_count: u64,
    max_delta: f32,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            last_frame: 0.0,
            delta: 0.0,
            frame_count: 0,
            max_delta: DEFAULT_MAX_DELTA,
        }
    }
}

impl FrameTiming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_delta(max_delta: f32) -> Self {
        Self {
            max_delta,
            ..Self::default()
        }
    }

    /// Record a new frame at `now` seconds and return its delta.
    pub fn advance(&mut self, now: f64) -> f32 {
        let raw = (now - self.last_frame).max(0.0) as f32;
        self.delta = raw.min(self.max_delta);
        self.last_frame = now;
        self.frame_count += 1;
        self.delta
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Time of the most recent frame, in seconds.
    pub fn elapsed(&self) -> f64 {
        self.last_frame
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Running average of recent frame times.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    frame_times: VecDeque<f32>,
}

impl FrameCounter {
    pub fn new_frame(&mut self, delta_time: f32) {
        if self.frame_times.len() >= RUNNING_WINDOW {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(delta_time);
    }

    pub fn delta_mean(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32
    }

    pub fn fps_mean(&self) -> u32 {
        let dt = self.delta_mean();
        if dt < f32::EPSILON { 0 } else { (1.0 / dt) as u32 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_measures_from_zero() {
        let mut t = FrameTiming::with_max_delta(1.0);
        assert_eq!(t.advance(0.25), 0.25);
        assert_eq!(t.advance(0.5), 0.25);
        assert_eq!(t.frame_count(), 2);
        assert_eq!(t.elapsed(), 0.5);
    }

    #[test]
    fn delta_is_clamped() {
        let mut t = FrameTiming::new();
        t.advance(1.0);
        assert_eq!(t.delta(), 0.1);
        t.advance(5.0);
        assert_eq!(t.delta(), 0.1);
    }

    #[test]
    fn time_going_backwards_yields_zero() {
        let mut t = FrameTiming::new();
        t.advance(2.0);
        assert_eq!(t.advance(1.0), 0.0);
    }

    #[test]
    fn counter_tracks_mean_over_window() {
        let mut c = FrameCounter::default();
        assert_eq!(c.fps_mean(), 0);
        for _ in 0..RUNNING_WINDOW {
            c.new_frame(0.5);
        }
        for _ in 0..RUNNING_WINDOW {
            c.new_frame(0.25);
        }
        assert_eq!(c.delta_mean(), 0.25);
        assert_eq!(c.fps_mean(), 4);
    }
}
