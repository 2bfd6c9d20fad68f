//! Global EQP rules.
//!
//! Unlike the per-identifier categories, a global rule is not written into a
//! file. Each rule names a visibility flag group that should never be hidden,
//! optionally only while a specific item is equipped, and is evaluated against
//! the character's equipment whenever the game reads an EQP row.

use crate::categories::eqp::EqpEntry;
use crate::mods::ModId;
use crate::types::{EquipSlot, PrimaryId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What a global rule keeps visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GlobalEqpType {
    DoNotHideEarrings,
    DoNotHideNecklace,
    DoNotHideBracelets,
    DoNotHideRingR,
    DoNotHideRingL,
    DoNotHideHrothgarHats,
    DoNotHideVieraHats,
}

impl GlobalEqpType {
    /// Flags forced on when the rule matches.
    pub fn flags(self) -> EqpEntry {
        match self {
            GlobalEqpType::DoNotHideEarrings => {
                EqpEntry::HEAD_SHOW_EARRINGS
                    | EqpEntry::HEAD_SHOW_EARRINGS_HUMAN
                    | EqpEntry::HEAD_SHOW_EARRINGS_AU_RA
            }
            GlobalEqpType::DoNotHideNecklace => {
                EqpEntry::HEAD_SHOW_NECKLACE | EqpEntry::BODY_SHOW_NECKLACE
            }
            GlobalEqpType::DoNotHideBracelets => {
                EqpEntry::BODY_SHOW_BRACELET | EqpEntry::HANDS_SHOW_BRACELET
            }
            GlobalEqpType::DoNotHideRingR => EqpEntry::HANDS_SHOW_RING_R,
            GlobalEqpType::DoNotHideRingL => EqpEntry::HANDS_SHOW_RING_L,
            GlobalEqpType::DoNotHideHrothgarHats => EqpEntry::HEAD_SHOW_HROTHGAR_HAT,
            GlobalEqpType::DoNotHideVieraHats => EqpEntry::HEAD_SHOW_VIERA_HAT,
        }
    }

    /// Equipment slot whose item a conditional rule is matched against.
    pub fn condition_slot(self) -> EquipSlot {
        match self {
            GlobalEqpType::DoNotHideEarrings
            | GlobalEqpType::DoNotHideHrothgarHats
            | GlobalEqpType::DoNotHideVieraHats => EquipSlot::Head,
            GlobalEqpType::DoNotHideNecklace => EquipSlot::Body,
            GlobalEqpType::DoNotHideBracelets
            | GlobalEqpType::DoNotHideRingR
            | GlobalEqpType::DoNotHideRingL => EquipSlot::Hands,
        }
    }
}

/// One global rule. A `condition` of `0` matches any equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalEqpManipulation {
    #[serde(rename = "type")]
    pub rule: GlobalEqpType,
    #[serde(default)]
    pub condition: PrimaryId,
}

impl GlobalEqpManipulation {
    pub fn new(rule: GlobalEqpType, condition: PrimaryId) -> Self {
        Self { rule, condition }
    }

    pub fn unconditional(rule: GlobalEqpType) -> Self {
        Self::new(rule, PrimaryId(0))
    }

    pub fn matches(&self, armor: &CharacterArmor) -> bool {
        self.condition == PrimaryId(0)
            || armor.primary_id(self.rule.condition_slot()) == self.condition
    }
}

/// Primary ids of the items a character currently wears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharacterArmor {
    pub head: PrimaryId,
    pub body: PrimaryId,
    pub hands: PrimaryId,
    pub legs: PrimaryId,
    pub feet: PrimaryId,
}

impl CharacterArmor {
    pub fn primary_id(&self, slot: EquipSlot) -> PrimaryId {
        match slot {
            EquipSlot::Head => self.head,
            EquipSlot::Body => self.body,
            EquipSlot::Hands => self.hands,
            EquipSlot::Legs => self.legs,
            EquipSlot::Feet => self.feet,
            _ => PrimaryId(0),
        }
    }
}

/// Registered global rules and the mod that registered each, in insertion order.
#[derive(Debug, Default)]
pub struct GlobalEqpCache {
    rules: IndexMap<GlobalEqpManipulation, ModId>,
}

impl GlobalEqpCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Register `rule` for `source`. Re-registering moves ownership but keeps
    /// the rule's original evaluation position.
    pub fn apply_mod(&mut self, source: ModId, rule: GlobalEqpManipulation) -> bool {
        tracing::trace!("GlobalEQP: apply {:?} mod={}", rule, source);
        self.rules.insert(rule, source);
        true
    }

    pub fn revert_mod(&mut self, rule: &GlobalEqpManipulation) -> Option<ModId> {
        let source = self.rules.shift_remove(rule)?;
        tracing::trace!("GlobalEQP: revert {:?} mod={}", rule, source);
        Some(source)
    }

    pub fn try_get(&self, rule: &GlobalEqpManipulation) -> Option<&ModId> {
        self.rules.get(rule)
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GlobalEqpManipulation, &ModId)> + '_ {
        self.rules.iter()
    }

    /// Evaluate every rule against `armor`, in registration order.
    ///
    /// Reads only; never allocates.
    pub fn apply(&self, base: EqpEntry, armor: &CharacterArmor) -> EqpEntry {
        self.rules
            .keys()
            .filter(|rule| rule.matches(armor))
            .fold(base, |entry, rule| entry | rule.rule.flags())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armor(head: u16, hands: u16) -> CharacterArmor {
        CharacterArmor {
            head: PrimaryId(head),
            hands: PrimaryId(hands),
            ..CharacterArmor::default()
        }
    }

    #[test]
    fn test_unconditional_rule_always_applies() {
        let mut cache = GlobalEqpCache::new();
        let rule = GlobalEqpManipulation::unconditional(GlobalEqpType::DoNotHideVieraHats);
        assert!(cache.apply_mod(ModId::new("Baz"), rule));

        let base = EqpEntry::HEAD_ENABLED;
        let result = cache.apply(base, &CharacterArmor::default());
        assert_eq!(result, base | EqpEntry::HEAD_SHOW_VIERA_HAT);
    }

    #[test]
    fn test_conditional_rule_matches_slot_item() {
        let mut cache = GlobalEqpCache::new();
        let rule = GlobalEqpManipulation::new(GlobalEqpType::DoNotHideRingL, PrimaryId(42));
        cache.apply_mod(ModId::new("Baz"), rule);

        let base = EqpEntry::empty();
        assert_eq!(cache.apply(base, &armor(42, 0)), base);
        assert_eq!(cache.apply(base, &armor(0, 42)), EqpEntry::HANDS_SHOW_RING_L);
    }

    #[test]
    fn test_revert_restores_base() {
        let mut cache = GlobalEqpCache::new();
        let rule = GlobalEqpManipulation::unconditional(GlobalEqpType::DoNotHideEarrings);
        cache.apply_mod(ModId::new("Baz"), rule);
        let base = EqpEntry::HEAD_ENABLED;
        assert_ne!(cache.apply(base, &armor(1, 1)), base);

        assert_eq!(cache.revert_mod(&rule), Some(ModId::new("Baz")));
        assert_eq!(cache.revert_mod(&rule), None);
        assert_eq!(cache.apply(base, &armor(1, 1)), base);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut cache = GlobalEqpCache::new();
        let a = GlobalEqpManipulation::unconditional(GlobalEqpType::DoNotHideNecklace);
        let b = GlobalEqpManipulation::unconditional(GlobalEqpType::DoNotHideBracelets);
        let c = GlobalEqpManipulation::unconditional(GlobalEqpType::DoNotHideRingR);
        cache.apply_mod(ModId::new("x"), a);
        cache.apply_mod(ModId::new("x"), b);
        cache.apply_mod(ModId::new("x"), c);
        cache.revert_mod(&b);
        cache.apply_mod(ModId::new("y"), a);

        let order = cache.iter().map(|(rule, _)| *rule).collect::<Vec<_>>();
        assert_eq!(order, vec![a, c]);
        assert_eq!(cache.try_get(&a), Some(&ModId::new("y")));
    }

    #[test]
    fn test_clear() {
        let mut cache = GlobalEqpCache::new();
        cache.apply_mod(
            ModId::new("x"),
            GlobalEqpManipulation::unconditional(GlobalEqpType::DoNotHideHrothgarHats),
        );
        cache.clear();
        assert!(cache.is_empty());
    }
}
