//! Per-frame clock. The session advances once per rendered frame with that
//! frame's elapsed time, so there is no fixed-step accumulator here; the clock
//! only measures, caps, and smooths.

use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

pub struct FrameClock {
    /// Longest delta handed to the simulation. Long stalls (window drag,
    /// debugger) would otherwise let the player tunnel through walls.
    pub max_dt: f64,
    pub total_time: f64,
    pub frame_count: u64,
    pub real_dt: f64,
    pub dt: f64,
    last_instant: Instant,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            max_dt: 0.25,
            total_time: 0.0,
            frame_count: 0,
            real_dt: 0.0,
            dt: 0.0,
            last_instant: Instant::now(),
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    /// Measure wall-clock time since the previous frame. Returns the capped
    /// delta in seconds.
    pub fn begin_frame(&mut self) -> f32 {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(real_dt)
    }

    /// Feed an explicit delta. `begin_frame` routes through here; replays and
    /// tests call it directly.
    pub fn advance(&mut self, real_dt: f64) -> f32 {
        self.real_dt = real_dt.max(0.0);
        self.dt = self.real_dt;
        if self.dt > self.max_dt {
            log::warn!(
                "Frame took {:.1}ms, capping simulation delta to {}ms",
                self.real_dt * 1000.0,
                self.max_dt * 1000.0
            );
            self.dt = self.max_dt;
        }

        self.total_time += self.dt;
        self.frame_count += 1;

        // FPS smoothing
        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };

        self.dt as f32
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
