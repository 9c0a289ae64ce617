//! Simulated timebase.
//!
//! Every duration in the engine is expressed in seconds of simulated time.
//! The host feeds real elapsed time into [`Clock::advance`], which applies the
//! global speed multiplier (and pause state) and returns the simulated delta
//! that all registries, channels and timelines are advanced by. Because there
//! is exactly one source of `dt`, pausing or fast-forwarding affects every
//! effect in the battle at once.

use crate::config::EngineConfig;
use crate::state::Seconds;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Clock {
    elapsed: Seconds,
    speed_multiplier: f64,
    max_speed_multiplier: f64,
    paused: bool,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            speed_multiplier: 1.0,
            max_speed_multiplier: EngineConfig::DEFAULT_MAX_SPEED_MULTIPLIER,
            paused: false,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut clock = Self::new();
        clock.max_speed_multiplier = if config.max_speed_multiplier.is_finite() {
            config.max_speed_multiplier.max(1.0)
        } else {
            EngineConfig::DEFAULT_MAX_SPEED_MULTIPLIER
        };
        clock
    }

    /// Total simulated time since the battle started.
    pub fn now(&self) -> Seconds {
        self.elapsed
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    /// Sets the speed multiplier, clamped to `[0, max_speed_multiplier]`.
    ///
    /// Non-finite values are ignored.
    pub fn set_speed_multiplier(&mut self, multiplier: f64) {
        if !multiplier.is_finite() {
            tracing::debug!(multiplier, "ignoring non-finite speed multiplier");
            return;
        }
        self.speed_multiplier = multiplier.clamp(0.0, self.max_speed_multiplier);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Converts real elapsed time into simulated time without advancing.
    pub fn scale(&self, real_dt: Seconds) -> Seconds {
        if self.paused || !real_dt.is_finite() || real_dt <= 0.0 {
            return 0.0;
        }
        real_dt * self.speed_multiplier
    }

    /// Advances the clock and returns the simulated delta for this tick.
    pub fn advance(&mut self, real_dt: Seconds) -> Seconds {
        let dt = self.scale(real_dt);
        self.elapsed += dt;
        dt
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
