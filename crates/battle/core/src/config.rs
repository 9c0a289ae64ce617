/// Engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Upper bound for the global speed multiplier.
    pub max_speed_multiplier: f64,

    /// Smallest accepted `tick_interval` for periodic effects and channel pulses.
    /// Shorter intervals are raised to this value when an effect is registered.
    pub min_tick_interval: f64,
}

impl EngineConfig {
    // ===== compile-time constants =====
    /// Tolerance used when comparing accumulated simulated time.
    ///
    /// Durations are accumulated from many small `dt` steps; anything within
    /// this distance of a boundary counts as having reached it.
    pub const TIME_EPSILON: f64 = 1e-9;

    /// Default cap on stacks when a spec does not declare one.
    pub const DEFAULT_MAX_STACKS: u32 = 1;

    /// Identifier of the built-in basic attack.
    pub const BASIC_ATTACK: &'static str = "basic_attack";

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_SPEED_MULTIPLIER: f64 = 16.0;
    pub const DEFAULT_MIN_TICK_INTERVAL: f64 = 0.05;

    pub fn new() -> Self {
        Self {
            max_speed_multiplier: Self::DEFAULT_MAX_SPEED_MULTIPLIER,
            min_tick_interval: Self::DEFAULT_MIN_TICK_INTERVAL,
        }
    }

    pub fn with_max_speed_multiplier(mut self, max: f64) -> Self {
        self.max_speed_multiplier = max;
        self
    }

    pub fn with_min_tick_interval(mut self, interval: f64) -> Self {
        self.min_tick_interval = interval;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
