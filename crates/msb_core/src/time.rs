//! Host frame-interval bookkeeping.
//!
//! The bridge never owns a loop: the host reports its frame interval to
//! `tick(dt)` and that interval goes straight to the simulation library. There
//! is no accumulator and no sub-stepping, so simulation speed follows host
//! frame-rate variability. `FrameStats` only observes the intervals so long
//! frames can be logged.

const FPS_SAMPLE_COUNT: usize = 30;

pub struct FrameStats {
    /// Intervals longer than this are reported with `log::warn!`.
    pub long_frame_threshold: f64,
    pub frame_count: u64,
    pub total_time: f64,
    pub last_dt: f64,
    pub long_frames: u64,

    dt_samples: [f64; FPS_SAMPLE_COUNT],
    dt_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameStats {
    pub fn new(target_rate: u32) -> Self {
        let target_dt = 1.0 / target_rate.max(1) as f64;
        Self {
            long_frame_threshold: target_dt * 4.0,
            frame_count: 0,
            total_time: 0.0,
            last_dt: 0.0,
            long_frames: 0,
            dt_samples: [target_dt; FPS_SAMPLE_COUNT],
            dt_sample_index: 0,
            smoothed_fps: 1.0 / target_dt,
            smoothed_frame_time_ms: target_dt * 1000.0,
        }
    }

    /// Records one host-reported interval. Negative or NaN intervals are
    /// treated as zero.
    pub fn record(&mut self, dt: f64) -> f64 {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.last_dt = dt;
        self.total_time += dt;
        self.frame_count += 1;

        if dt > self.long_frame_threshold {
            self.long_frames += 1;
            log::warn!(
                "Host frame took {:.1}ms; simulation advances by the full interval",
                dt * 1000.0
            );
        }

        self.dt_samples[self.dt_sample_index] = dt;
        self.dt_sample_index = (self.dt_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.dt_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
        dt
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(30)
    }
}
