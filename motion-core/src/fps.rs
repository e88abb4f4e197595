//! Frame-rate sampling over fixed windows.

/// One completed sampling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsSample {
    /// Frames per second over the window, rounded.
    pub fps: f64,
    /// Frames counted in the window.
    pub frames: u32,
    /// Window length in milliseconds.
    pub elapsed_ms: f64,
}

/// Counts animation frames and reports the rate once per window.
#[derive(Debug, Clone)]
pub struct FpsMonitor {
    window_ms: f64,
    window_start: Option<f64>,
    frames: u32,
    last: Option<FpsSample>,
}

impl FpsMonitor {
    /// Create a monitor reporting every `window_ms`.
    #[must_use]
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            window_start: None,
            frames: 0,
            last: None,
        }
    }

    /// Most recent completed sample.
    #[must_use]
    pub const fn last_sample(&self) -> Option<FpsSample> {
        self.last
    }

    /// Begin a fresh window at `now_ms`, discarding partial counts.
    pub fn restart(&mut self, now_ms: f64) {
        self.window_start = Some(now_ms);
        self.frames = 0;
    }

    /// Count a frame delivered at `now_ms`.
    ///
    /// Returns a sample when the frame closes a window. The first frame ever
    /// seen only opens the window.
    pub fn record_frame(&mut self, now_ms: f64) -> Option<FpsSample> {
        let Some(start) = self.window_start else {
            self.restart(now_ms);
            return None;
        };
        self.frames += 1;
        let elapsed_ms = now_ms - start;
        if elapsed_ms < self.window_ms {
            return None;
        }
        let sample = FpsSample {
            fps: (f64::from(self.frames) * 1000.0 / elapsed_ms).round(),
            frames: self.frames,
            elapsed_ms,
        };
        self.last = Some(sample);
        self.restart(now_ms);
        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(monitor: &mut FpsMonitor, from: f64, interval: f64, count: u32) -> Vec<FpsSample> {
        (1..=count)
            .filter_map(|i| monitor.record_frame(from + f64::from(i) * interval))
            .collect()
    }

    #[test]
    fn sixty_fps_feed() {
        let mut monitor = FpsMonitor::new(1000.0);
        monitor.record_frame(0.0);
        let samples = feed(&mut monitor, 0.0, 1000.0 / 60.0, 61);
        assert_eq!(samples.len(), 1);
        assert!((samples[0].fps - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn twenty_fps_feed_reports_each_window() {
        let mut monitor = FpsMonitor::new(1000.0);
        monitor.record_frame(0.0);
        let samples = feed(&mut monitor, 0.0, 50.0, 40);
        assert_eq!(samples.len(), 2);
        for sample in samples {
            assert!((sample.fps - 20.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn partial_window_reports_nothing() {
        let mut monitor = FpsMonitor::new(1000.0);
        monitor.record_frame(0.0);
        assert!(feed(&mut monitor, 0.0, 16.0, 30).is_empty());
        assert!(monitor.last_sample().is_none());
    }

    #[test]
    fn restart_discards_partial_window() {
        let mut monitor = FpsMonitor::new(1000.0);
        monitor.record_frame(0.0);
        feed(&mut monitor, 0.0, 100.0, 5);
        // A long pause (hidden tab) followed by a restart must not produce a
        // sample spanning the pause.
        monitor.restart(10_000.0);
        assert!(monitor.record_frame(10_016.0).is_none());
    }
}
