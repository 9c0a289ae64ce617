//! Reference scheduler configuration.
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

/// Settings for [`BattleRunner`](crate::BattleRunner), read from the
/// `[runner]` table of the battle configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Wall seconds fed to the engine per step.
    pub tick_seconds: f64,

    pub speed_multiplier: f64,

    /// Simulated seconds after which the battle ends without a winner.
    pub max_duration: f64,

    pub seed: u64,

    /// Simulated seconds between two action slots of a combatant with zero
    /// speed.
    pub attack_interval: f64,
}

impl RunnerConfig {
    pub const DEFAULT_TICK_SECONDS: f64 = 0.1;
    pub const DEFAULT_MAX_DURATION: f64 = 120.0;
    pub const DEFAULT_ATTACK_INTERVAL: f64 = 1.5;

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_duration(mut self, seconds: f64) -> Self {
        self.max_duration = seconds;
        self
    }

    /// Rejects settings that would stall the scheduler.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(RuntimeError::InvalidConfig {
                    field: name,
                    value,
                })
            }
        };
        positive("tick_seconds", self.tick_seconds)?;
        positive("speed_multiplier", self.speed_multiplier)?;
        positive("max_duration", self.max_duration)?;
        positive("attack_interval", self.attack_interval)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_seconds: Self::DEFAULT_TICK_SECONDS,
            speed_multiplier: 1.0,
            max_duration: Self::DEFAULT_MAX_DURATION,
            seed: 0,
            attack_interval: Self::DEFAULT_ATTACK_INTERVAL,
        }
    }
}
