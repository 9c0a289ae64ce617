//! Authored kit data.

use std::collections::BTreeSet;

use battle_core::{
    AbilityDefinition, EffectKind, Element, Payload, ResourceDeclaration, Scaling, TickPayload,
    TimedEffectSpec,
};

/// One character's abilities, resources, passives and script hooks.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KitDefinition {
    pub name: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub resources: Vec<ResourceDeclaration>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub abilities: Vec<AbilityDefinition>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub passives: Vec<PassiveSpec>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub scripts: Vec<ScriptRule>,
}

/// Per-tick behaviour run by the passive updater.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PassiveSpec {
    /// Trickles one of the kit's resources.
    Regenerate { resource: String, per_second: f64 },

    /// Heals `per_second × max HP` each second while below `below` HP fraction.
    Recover { per_second: f64, below: f64 },

    /// Keeps a permanent self effect up.
    Aura { kind: EffectKind, magnitude: f64 },

    /// Applies `spec` to self whenever HP is below `threshold` and the
    /// effect is not already active.
    Enrage {
        threshold: f64,
        spec: TimedEffectSpec,
    },
}

/// Binds a `Script { hook }` payload to a behaviour.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScriptRule {
    pub hook: u32,
    pub action: ScriptAction,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScriptAction {
    /// Consumes every stack of `effect` the actor applied to each target and
    /// deals `scaling × stacks` damage.
    Detonate {
        effect: EffectKind,
        scaling: Scaling,
        #[cfg_attr(feature = "serde", serde(default))]
        element: Option<Element>,
    },

    /// Extra damage against targets below `threshold` HP fraction.
    Execute { threshold: f64, scaling: Scaling },

    /// Deals `ratio ×` the invocation amount to each target. Effect hooks
    /// pass `magnitude × stacks`, casts pass the resource consumed.
    Burst {
        ratio: f64,
        #[cfg_attr(feature = "serde", serde(default))]
        element: Option<Element>,
    },

    /// Grants the caster `amount` of a resource per target.
    GainPerTarget {
        resource: String,
        amount: f64,
        cap: f64,
    },
}

impl KitDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
            abilities: Vec::new(),
            passives: Vec::new(),
            scripts: Vec::new(),
        }
    }

    pub fn with_resource(mut self, resource: ResourceDeclaration) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_ability(mut self, ability: AbilityDefinition) -> Self {
        self.abilities.push(ability);
        self
    }

    pub fn with_passive(mut self, passive: PassiveSpec) -> Self {
        self.passives.push(passive);
        self
    }

    pub fn with_script(mut self, hook: u32, action: ScriptAction) -> Self {
        self.scripts.push(ScriptRule { hook, action });
        self
    }

    pub fn script(&self, hook: u32) -> Option<&ScriptAction> {
        self.scripts.iter().find(|s| s.hook == hook).map(|s| &s.action)
    }

    fn declares(&self, resource: &str) -> bool {
        self.resources.iter().any(|r| r.name == resource)
    }

    /// Checks references inside the kit: ability ids are unique, costs and
    /// regeneration name declared resources, every script hook is bound, and
    /// numbers are finite and non-negative where they must be.
    pub fn validate(&self) -> Result<(), String> {
        let mut ids = BTreeSet::new();
        for resource in &self.resources {
            if !resource.cap.is_finite() || resource.cap < 0.0 {
                return Err(format!("resource '{}' has invalid cap", resource.name));
            }
        }

        for ability in &self.abilities {
            if !ids.insert(ability.id.as_str()) {
                return Err(format!("duplicate ability '{}'", ability.id));
            }
            if !ability.cooldown.is_finite() || ability.cooldown < 0.0 {
                return Err(format!("ability '{}' has invalid cooldown", ability.id));
            }
            if let Some(cost) = &ability.cost
                && !self.declares(&cost.resource)
            {
                return Err(format!(
                    "ability '{}' costs undeclared resource '{}'",
                    ability.id, cost.resource
                ));
            }
            for hook in script_hooks(ability) {
                if self.script(hook).is_none() {
                    return Err(format!(
                        "ability '{}' uses unbound script hook {hook}",
                        ability.id
                    ));
                }
            }
        }

        for passive in &self.passives {
            if let PassiveSpec::Regenerate { resource, .. } = passive
                && !self.declares(resource)
            {
                return Err(format!("passive regenerates undeclared resource '{resource}'"));
            }
        }
        Ok(())
    }
}

/// Every script hook an ability can fire: immediate, delayed, channel
/// payloads and the tick/expiry payloads of effects it applies.
fn script_hooks(ability: &AbilityDefinition) -> Vec<u32> {
    let channel = ability
        .channel
        .iter()
        .flat_map(|c| c.pulse.iter().chain(&c.resolution));
    let delayed = ability.delayed.iter().map(|d| &d.payload);

    let mut hooks = Vec::new();
    for payload in ability.payloads.iter().chain(delayed).chain(channel) {
        match payload {
            Payload::Script { hook } => hooks.push(*hook),
            Payload::ApplyEffect { spec, .. } => {
                for tick in spec.tick_payload.iter().chain(&spec.expire_payload) {
                    if let TickPayload::Script { hook } = tick {
                        hooks.push(*hook);
                    }
                }
            }
            _ => {}
        }
    }
    hooks
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{AbilityKind, CostMode};

    fn pyro() -> KitDefinition {
        KitDefinition::new("pyro")
            .with_resource(ResourceDeclaration::new("mana", 100.0))
            .with_ability(
                AbilityDefinition::new("fireball", AbilityKind::Skill)
                    .with_cost("mana", 20.0, CostMode::Hard)
                    .with_payload(Payload::Script { hook: 1 }),
            )
            .with_script(
                1,
                ScriptAction::Burst {
                    ratio: 1.0,
                    element: None,
                },
            )
    }

    #[test]
    fn well_formed_kit_validates() {
        assert_eq!(pyro().validate(), Ok(()));
    }

    #[test]
    fn rejects_undeclared_cost_resource() {
        let kit = pyro().with_ability(
            AbilityDefinition::new("drain", AbilityKind::Skill).with_cost(
                "rage",
                10.0,
                CostMode::Hard,
            ),
        );
        assert!(kit.validate().unwrap_err().contains("rage"));
    }

    #[test]
    fn rejects_unbound_hook_in_effect_payload() {
        let bomb = TimedEffectSpec::new(EffectKind::custom("bomb"), 5.0, 3.0)
            .on_expire(TickPayload::Script { hook: 9 });
        let kit = pyro().with_ability(
            AbilityDefinition::new("plant", AbilityKind::Skill).with_payload(
                Payload::ApplyEffect {
                    spec: bomb,
                    on: Default::default(),
                },
            ),
        );
        assert!(kit.validate().unwrap_err().contains("hook 9"));
    }

    #[test]
    fn rejects_duplicate_ability_ids() {
        let kit = pyro().with_ability(AbilityDefinition::new("fireball", AbilityKind::Basic));
        assert!(kit.validate().is_err());
    }

    #[test]
    fn rejects_regenerating_unknown_resource() {
        let kit = pyro().with_passive(PassiveSpec::Regenerate {
            resource: "focus".into(),
            per_second: 1.0,
        });
        assert!(kit.validate().is_err());

        let kit = pyro().with_passive(PassiveSpec::Recover {
            per_second: 0.01,
            below: 0.5,
        });
        assert!(kit.validate().is_ok());
    }
}
