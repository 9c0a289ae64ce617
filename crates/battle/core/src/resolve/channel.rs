//! Channel state machine: `Idle -> Windup -> Active -> Resolution -> Idle`.
//!
//! Only `Idle -> Windup` is caller-initiated (a cast). Every other transition
//! is driven by [`ChannelState::advance`] with simulated time. Resolution is
//! instantaneous: the step that enters it also returns the channel to idle.

use crate::ability::{AbilityId, ChannelSpec, Payload};
use crate::config::EngineConfig;
use crate::state::{CombatantId, Seconds};

const EPSILON: f64 = EngineConfig::TIME_EPSILON;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelPhase {
    #[default]
    Idle,
    Windup,
    Active,
    Resolution,
}

/// A channel in flight.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveChannel {
    pub ability: AbilityId,
    pub targets: Vec<CombatantId>,
    pub spec: ChannelSpec,
    pub phase: ChannelPhase,
    /// Time spent in the current phase.
    pub phase_elapsed: Seconds,
    pulse_elapsed: Seconds,
    /// Resource consumed when the channel was cast.
    pub consumed: f64,
}

/// Work produced by advancing a channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelStep {
    /// `Active` for periodic pulses, `Resolution` for the final burst.
    pub phase: ChannelPhase,
    pub ability: AbilityId,
    pub targets: Vec<CombatantId>,
    pub payloads: Vec<Payload>,
    pub consumed: f64,
}

/// Per-combatant channel slot. At most one channel runs at a time.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelState {
    current: Option<ActiveChannel>,
}

impl ChannelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ChannelPhase {
        self.current
            .as_ref()
            .map_or(ChannelPhase::Idle, |channel| channel.phase)
    }

    pub fn is_channeling(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&ActiveChannel> {
        self.current.as_ref()
    }

    /// Starts a channel. Returns `false` (and changes nothing) if one is
    /// already running.
    pub fn begin(
        &mut self,
        ability: AbilityId,
        targets: Vec<CombatantId>,
        spec: ChannelSpec,
        consumed: f64,
    ) -> bool {
        if self.current.is_some() {
            return false;
        }
        let phase = if spec.windup > EPSILON {
            ChannelPhase::Windup
        } else {
            ChannelPhase::Active
        };
        self.current = Some(ActiveChannel {
            ability,
            targets,
            spec,
            phase,
            phase_elapsed: 0.0,
            pulse_elapsed: 0.0,
            consumed,
        });
        true
    }

    /// Aborts the running channel without resolving it. Nothing is refunded.
    pub fn cancel(&mut self) -> Option<ActiveChannel> {
        let cancelled = self.current.take();
        if let Some(channel) = &cancelled {
            tracing::debug!(ability = %channel.ability, phase = ?channel.phase, "channel cancelled");
        }
        cancelled
    }

    /// Advances the channel by `dt`, carrying leftover time across phase
    /// boundaries so a coarse tick never loses pulses.
    pub fn advance(&mut self, dt: Seconds) -> Vec<ChannelStep> {
        let mut steps = Vec::new();
        if !dt.is_finite() || dt <= 0.0 {
            return steps;
        }
        let Some(channel) = self.current.as_mut() else {
            return steps;
        };

        let mut left = dt;
        let mut finished = false;

        if channel.phase == ChannelPhase::Windup {
            let remaining = (channel.spec.windup - channel.phase_elapsed).max(0.0);
            if left + EPSILON < remaining {
                channel.phase_elapsed += left;
                return steps;
            }
            left -= remaining;
            channel.phase = ChannelPhase::Active;
            channel.phase_elapsed = 0.0;
        }

        if channel.phase == ChannelPhase::Active {
            let remaining = (channel.spec.duration - channel.phase_elapsed).max(0.0);
            let spent = left.min(remaining);
            channel.phase_elapsed += spent;

            if let Some(interval) = channel.spec.pulse_interval.filter(|i| *i > EPSILON) {
                channel.pulse_elapsed += spent;
                while channel.pulse_elapsed + EPSILON >= interval {
                    channel.pulse_elapsed -= interval;
                    steps.push(channel.step(ChannelPhase::Active));
                }
            }

            if channel.phase_elapsed + EPSILON >= channel.spec.duration {
                channel.phase = ChannelPhase::Resolution;
                steps.push(channel.step(ChannelPhase::Resolution));
                finished = true;
            }
        }

        if finished {
            self.current = None;
        }
        steps
    }
}

impl ActiveChannel {
    fn step(&self, phase: ChannelPhase) -> ChannelStep {
        let payloads = match phase {
            ChannelPhase::Resolution => self.spec.resolution.clone(),
            _ => self.spec.pulse.clone(),
        };
        ChannelStep {
            phase,
            ability: self.ability.clone(),
            targets: self.targets.clone(),
            payloads,
            consumed: self.consumed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(windup: Seconds, duration: Seconds, interval: Option<Seconds>) -> ChannelSpec {
        ChannelSpec {
            windup,
            duration,
            pulse_interval: interval,
            pulse: vec![Payload::Cleanse],
            resolution: vec![Payload::Script { hook: 7 }],
        }
    }

    fn begin(state: &mut ChannelState, spec: ChannelSpec) {
        assert!(state.begin(AbilityId::from("beam"), vec![CombatantId(2)], spec, 0.0));
    }

    #[test]
    fn walks_through_every_phase() {
        let mut state = ChannelState::new();
        assert_eq!(state.phase(), ChannelPhase::Idle);

        begin(&mut state, spec(1.0, 2.0, None));
        assert_eq!(state.phase(), ChannelPhase::Windup);

        assert!(state.advance(0.5).is_empty());
        assert_eq!(state.phase(), ChannelPhase::Windup);

        assert!(state.advance(1.0).is_empty());
        assert_eq!(state.phase(), ChannelPhase::Active);

        let steps = state.advance(2.0);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].phase, ChannelPhase::Resolution);
        assert_eq!(steps[0].payloads, vec![Payload::Script { hook: 7 }]);
        assert_eq!(state.phase(), ChannelPhase::Idle);
    }

    #[test]
    fn pulses_catch_up_on_large_ticks() {
        let mut state = ChannelState::new();
        begin(&mut state, spec(0.0, 3.0, Some(1.0)));

        let steps = state.advance(10.0);
        let pulses = steps
            .iter()
            .filter(|s| s.phase == ChannelPhase::Active)
            .count();
        assert_eq!(pulses, 3);
        assert_eq!(steps.last().map(|s| s.phase), Some(ChannelPhase::Resolution));
        assert!(!state.is_channeling());
    }

    #[test]
    fn windup_overflow_carries_into_active() {
        let mut state = ChannelState::new();
        begin(&mut state, spec(1.0, 4.0, Some(1.0)));

        let steps = state.advance(2.5);
        assert_eq!(steps.len(), 1);
        assert_eq!(state.phase(), ChannelPhase::Active);
    }

    #[test]
    fn cancel_skips_resolution() {
        let mut state = ChannelState::new();
        begin(&mut state, spec(0.0, 3.0, Some(1.0)));
        state.advance(1.5);

        let cancelled = state.cancel();
        assert_eq!(cancelled.map(|c| c.phase), Some(ChannelPhase::Active));
        assert!(state.advance(5.0).is_empty());
        assert_eq!(state.phase(), ChannelPhase::Idle);
    }

    #[test]
    fn rejects_second_channel() {
        let mut state = ChannelState::new();
        begin(&mut state, spec(0.0, 3.0, None));
        assert!(!state.begin(
            AbilityId::from("other"),
            vec![],
            spec(0.0, 1.0, None),
            0.0
        ));
        assert_eq!(
            state.current().map(|c| c.ability.as_str()),
            Some("beam")
        );
    }
}
