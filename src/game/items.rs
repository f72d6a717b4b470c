//! Magical items and the combat bonuses they grant.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A magical item. Inventories are ordered lists of these; duplicates stack
/// additively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    /// +2 attack.
    MagicSword,
    /// +2 defense.
    ShieldOfProtection,
    /// Consumable heal.
    HealthPotion,
    /// +1 to every combat roll.
    CrystalOfPower,
    /// +2 attack.
    EnchantedBow,
    /// +3 attack, lost after the next won monster fight.
    StrengthElixir,
    /// One reroll per combat.
    LuckyCharm,
    /// Strike first in combat.
    BladeOfSwiftness,
}

impl Item {
    /// Every item, in catalog order.
    pub const ALL: [Item; 8] = [
        Item::MagicSword,
        Item::ShieldOfProtection,
        Item::HealthPotion,
        Item::CrystalOfPower,
        Item::EnchantedBow,
        Item::StrengthElixir,
        Item::LuckyCharm,
        Item::BladeOfSwiftness,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Item::MagicSword => "Magic Sword",
            Item::ShieldOfProtection => "Shield of Protection",
            Item::HealthPotion => "Health Potion",
            Item::CrystalOfPower => "Crystal of Power",
            Item::EnchantedBow => "Enchanted Bow",
            Item::StrengthElixir => "Strength Elixir",
            Item::LuckyCharm => "Lucky Charm",
            Item::BladeOfSwiftness => "Blade of Swiftness",
        }
    }

    /// Short effect description.
    #[must_use]
    pub const fn effect(self) -> &'static str {
        match self {
            Item::MagicSword | Item::EnchantedBow => "Permanent +2 attack",
            Item::ShieldOfProtection => "Permanent +2 defense",
            Item::HealthPotion => "Restores health",
            Item::CrystalOfPower => "Permanent +1 to all rolls",
            Item::StrengthElixir => "Temporary +3 attack for one combat",
            Item::LuckyCharm => "Can reroll once per combat",
            Item::BladeOfSwiftness => "Attack first in combat",
        }
    }

    /// Whether the item is spent after a single won monster combat.
    #[must_use]
    pub const fn is_temporary(self) -> bool {
        matches!(self, Item::StrengthElixir)
    }

    /// Whether `use_item` can do anything with this item.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        matches!(self, Item::HealthPotion | Item::StrengthElixir)
    }

    /// Contribution of a single copy of this item to the bonus tuple.
    #[must_use]
    pub const fn bonus(self) -> CombatBonuses {
        let mut bonus = CombatBonuses::NONE;
        match self {
            Item::MagicSword | Item::EnchantedBow => bonus.attack_bonus = 2,
            Item::StrengthElixir => bonus.attack_bonus = 3,
            Item::ShieldOfProtection => bonus.defense_bonus = 2,
            Item::CrystalOfPower => bonus.roll_bonus = 1,
            Item::LuckyCharm => bonus.can_reroll = true,
            Item::BladeOfSwiftness => bonus.attack_first = true,
            Item::HealthPotion => {}
        }
        bonus
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.effect())
    }
}

/// The bonus tuple derived from an inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombatBonuses {
    /// Added to outgoing damage.
    pub attack_bonus: u32,
    /// Subtracted from incoming damage (PvP and monster counter-attacks).
    pub defense_bonus: u32,
    /// Added to every two-dice combat roll.
    pub roll_bonus: u32,
    /// One reroll per encounter.
    pub can_reroll: bool,
    /// Strike before the other side.
    pub attack_first: bool,
}

impl CombatBonuses {
    /// No bonuses at all.
    pub const NONE: CombatBonuses = CombatBonuses {
        attack_bonus: 0,
        defense_bonus: 0,
        roll_bonus: 0,
        can_reroll: false,
        attack_first: false,
    };

    /// Combine two bonus tuples: numbers add, flags or.
    #[must_use]
    pub const fn combine(self, other: CombatBonuses) -> CombatBonuses {
        CombatBonuses {
            attack_bonus: self.attack_bonus + other.attack_bonus,
            defense_bonus: self.defense_bonus + other.defense_bonus,
            roll_bonus: self.roll_bonus + other.roll_bonus,
            can_reroll: self.can_reroll || other.can_reroll,
            attack_first: self.attack_first || other.attack_first,
        }
    }
}

/// Fold an inventory into its bonus tuple.
///
/// Pure: the same inventory always yields the same tuple. Must be recomputed
/// at every combat start since temporary items come and go.
#[must_use]
pub fn calculate_combat_bonuses(inventory: &[Item]) -> CombatBonuses {
    inventory
        .iter()
        .fold(CombatBonuses::NONE, |acc, item| acc.combine(item.bonus()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inventory_has_no_bonus() {
        assert_eq!(calculate_combat_bonuses(&[]), CombatBonuses::NONE);
    }

    #[test]
    fn test_attack_items_stack() {
        let bonuses = calculate_combat_bonuses(&[
            Item::MagicSword,
            Item::EnchantedBow,
            Item::MagicSword,
            Item::StrengthElixir,
        ]);
        assert_eq!(bonuses.attack_bonus, 9);
        assert_eq!(bonuses.defense_bonus, 0);
    }

    #[test]
    fn test_every_field_reachable() {
        let bonuses = calculate_combat_bonuses(&[
            Item::ShieldOfProtection,
            Item::CrystalOfPower,
            Item::LuckyCharm,
            Item::BladeOfSwiftness,
        ]);
        assert_eq!(
            bonuses,
            CombatBonuses {
                attack_bonus: 0,
                defense_bonus: 2,
                roll_bonus: 1,
                can_reroll: true,
                attack_first: true,
            }
        );
    }

    #[test]
    fn test_potion_contributes_nothing() {
        let bonuses = calculate_combat_bonuses(&[Item::HealthPotion, Item::HealthPotion]);
        assert_eq!(bonuses, CombatBonuses::NONE);
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = calculate_combat_bonuses(&[Item::MagicSword, Item::LuckyCharm, Item::CrystalOfPower]);
        let b = calculate_combat_bonuses(&[Item::CrystalOfPower, Item::MagicSword, Item::LuckyCharm]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_item_flags() {
        assert!(Item::StrengthElixir.is_temporary());
        assert!(!Item::MagicSword.is_temporary());
        assert!(Item::HealthPotion.is_usable());
        assert!(!Item::ShieldOfProtection.is_usable());
    }

    #[test]
    fn test_item_display() {
        assert_eq!(Item::MagicSword.to_string(), "Magic Sword (Permanent +2 attack)");
    }
}
