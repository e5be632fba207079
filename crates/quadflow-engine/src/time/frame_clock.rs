use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick (clamped, or the fixed delta).
    pub dt: f32,

    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Produces [`FrameTime`] snapshots.
///
/// Measured delta time is clamped so a debugger pause or a stalled frame does
/// not launch every particle out of bounds. A fixed delta can be switched on
/// for deterministic stepping; it replaces the measured value entirely.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
    fixed_dt: Option<f32>,
}

impl FrameClock {
    pub const DEFAULT_DT_MIN: Duration = Duration::from_micros(100);
    pub const DEFAULT_DT_MAX: Duration = Duration::from_millis(250);

    pub fn new() -> Self {
        Self::with_clamps(Self::DEFAULT_DT_MIN, Self::DEFAULT_DT_MAX)
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
            fixed_dt: None,
        }
    }

    /// Clock that always reports `dt` seconds.
    pub fn with_fixed_delta(dt: f32) -> Self {
        let mut clock = Self::new();
        clock.set_fixed_delta(Some(dt));
        clock
    }

    /// Switches fixed-delta stepping on (`Some`) or off (`None`).
    ///
    /// Non-finite or non-positive values are rejected with a warning.
    pub fn set_fixed_delta(&mut self, dt: Option<f32>) {
        match dt {
            Some(dt) if !(dt.is_finite() && dt > 0.0) => {
                log::warn!("ignoring invalid fixed delta {dt}");
            }
            _ => self.fixed_dt = dt,
        }
    }

    #[inline]
    pub fn fixed_delta(&self) -> Option<f32> {
        self.fixed_dt
    }

    /// Resets the baseline, e.g. after resuming from a pause.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let measured = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: self.fixed_dt.unwrap_or(measured.as_secs_f32()),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
