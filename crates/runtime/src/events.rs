//! Topic-based event bus for battle observers.
//!
//! The runner publishes combat results and presentation cues here instead of
//! drawing anything itself. Publishing is best-effort: events sent while
//! nobody listens on a topic are dropped.

use std::collections::HashMap;

use battle_core::{AbilityId, AbilityOutcome, CombatantId, Presenter, Seconds, Team, TextStyle};
use tokio::sync::broadcast;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Topic {
    /// Battle lifecycle and combat results
    Combat,
    /// Floating text, VFX and projectile cues
    Presentation,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::Combat, Topic::Presentation];
}

#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    Started {
        seed: u64,
        combatants: usize,
    },
    Acted {
        actor: CombatantId,
        ability: AbilityId,
        outcomes: Vec<AbilityOutcome>,
    },
    /// A cast was rejected; the actor loses its slot.
    ActionFailed {
        actor: CombatantId,
        code: &'static str,
        reason: String,
    },
    /// Outcomes produced by the tick itself (effect pulses, channels,
    /// scheduled payloads).
    Ticked {
        now: Seconds,
        outcomes: Vec<AbilityOutcome>,
    },
    Retired {
        id: CombatantId,
    },
    Finished {
        winner: Option<Team>,
        elapsed: Seconds,
        digest: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    FloatingText {
        target: CombatantId,
        text: String,
        style: TextStyle,
    },
    Vfx {
        target: CombatantId,
        name: String,
    },
    Projectile {
        from: CombatantId,
        to: CombatantId,
        name: String,
    },
    AbilityName {
        actor: CombatantId,
        name: String,
    },
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Combat(CombatEvent),
    Presentation(PresentationEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Combat(_) => Topic::Combat,
            Event::Presentation(_) => Topic::Presentation,
        }
    }
}

/// Topic-based event bus
///
/// Cloning the bus shares its channels.
#[derive(Clone)]
pub struct EventBus {
    channels: HashMap<Topic, broadcast::Sender<Event>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity.max(1)).0))
            .collect();
        Self { channels }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    pub fn combat(&self, event: CombatEvent) {
        self.publish(Event::Combat(event));
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> Option<broadcast::Receiver<Event>> {
        self.channels.get(&topic).map(broadcast::Sender::subscribe)
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .filter_map(|topic| Some((*topic, self.subscribe(*topic)?)))
            .collect()
    }

    /// Number of live receivers on a topic.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channels
            .get(&topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Presenter`] that forwards every cue to the presentation topic.
pub struct BusPresenter<'a> {
    bus: &'a EventBus,
}

impl<'a> BusPresenter<'a> {
    pub fn new(bus: &'a EventBus) -> Self {
        Self { bus }
    }

    fn send(&self, event: PresentationEvent) {
        self.bus.publish(Event::Presentation(event));
    }
}

impl Presenter for BusPresenter<'_> {
    fn show_floating_text(&mut self, target: CombatantId, text: &str, style: TextStyle) {
        self.send(PresentationEvent::FloatingText {
            target,
            text: text.to_owned(),
            style,
        });
    }

    fn play_vfx(&mut self, target: CombatantId, name: &str) {
        self.send(PresentationEvent::Vfx {
            target,
            name: name.to_owned(),
        });
    }

    fn show_projectile(&mut self, from: CombatantId, to: CombatantId, name: &str) {
        self.send(PresentationEvent::Projectile {
            from,
            to,
            name: name.to_owned(),
        });
    }

    fn show_ability_name(&mut self, actor: CombatantId, name: &str) {
        self.send(PresentationEvent::AbilityName {
            actor,
            name: name.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_reach_only_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut combat = bus.subscribe(Topic::Combat).unwrap();
        let mut cues = bus.subscribe(Topic::Presentation).unwrap();

        bus.combat(CombatEvent::Retired { id: CombatantId(4) });
        BusPresenter::new(&bus).play_vfx(CombatantId(4), "smoke");

        assert_eq!(
            combat.try_recv().unwrap(),
            Event::Combat(CombatEvent::Retired { id: CombatantId(4) })
        );
        assert!(combat.try_recv().is_err());
        assert!(matches!(
            cues.try_recv().unwrap(),
            Event::Presentation(PresentationEvent::Vfx { .. })
        ));
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(Topic::Combat), 0);
        bus.combat(CombatEvent::Started {
            seed: 1,
            combatants: 0,
        });
    }
}
