//! Ability Resolver.
//!
//! Turns a cast request into damage, healing, shields and effects, and drives
//! the deferred parts of abilities (channels, delayed payloads, effect pulses)
//! from the shared simulation clock.

mod channel;
mod context;
mod error;
mod pipeline;

pub use channel::{ActiveChannel, ChannelPhase, ChannelState, ChannelStep};
pub use context::ActionContext;
pub use error::ResolveError;
pub use pipeline::{ability_definition, apply_payloads, apply_pulse, resolve};
