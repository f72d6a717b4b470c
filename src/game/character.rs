//! Character archetypes and their abilities.
//!
//! Each character carries one board ability (used between moves) and one
//! combat ability (used inside an encounter). Activation goes through a
//! lookup table from ability id to effect function, so a new character only
//! needs a new table row.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::game::{Monster, Player, RoundModifiers, TurnState};

/// Playable character archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterId {
    /// Charge / Berserker Rage.
    Warrior,
    /// Teleport / Magic Missile.
    Mage,
    /// Eagle Eye / Precise Shot.
    Archer,
    /// Stealth / Backstab.
    Rogue,
    /// Divine Protection / Holy Strike.
    Paladin,
    /// Nature's Path / Wild Shape.
    Druid,
}

impl CharacterId {
    /// Every archetype, in roster order.
    pub const ALL: [CharacterId; 6] = [
        CharacterId::Warrior,
        CharacterId::Mage,
        CharacterId::Archer,
        CharacterId::Rogue,
        CharacterId::Paladin,
        CharacterId::Druid,
    ];
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Board ability identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardAbilityId {
    /// Extra moves this turn.
    Charge,
    /// Next move may land on any empty tile.
    Teleport,
    /// Reveal every living monster.
    EagleEye,
    /// Walk through other players.
    Stealth,
    /// Heal.
    DivineProtection,
    /// Walk through obstacles.
    NaturesPath,
}

/// Combat ability identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatAbilityId {
    /// +4 damage this round.
    BerserkerRage,
    /// Exactly 8 damage, no dice.
    MagicMissile,
    /// Both dice show six.
    PreciseShot,
    /// Strike first, +3 damage.
    Backstab,
    /// Damage equal to missing health.
    HolyStrike,
    /// Halve incoming damage for a few rounds.
    WildShape,
}

/// A limited-use ability. `uses` only goes down, and never above `max_uses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability<K> {
    /// Which effect this ability triggers.
    pub kind: K,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Uses left.
    pub uses: u32,
    /// Uses at character assignment.
    pub max_uses: u32,
}

impl<K: Copy> Ability<K> {
    /// New ability with a full charge.
    #[must_use]
    pub fn new(kind: K, name: &str, description: &str, max_uses: u32) -> Self {
        Self {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            uses: max_uses,
            max_uses,
        }
    }

    /// Whether at least one use remains.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.uses > 0
    }

    /// Spend one use. Returns `false` when none were left.
    pub fn consume(&mut self) -> bool {
        if self.uses == 0 {
            return false;
        }
        self.uses -= 1;
        true
    }
}

/// Static description of a character archetype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDef {
    /// Archetype.
    pub id: CharacterId,
    /// Board glyph, cosmetic.
    pub emoji: String,
    /// Color tag, cosmetic.
    pub color: String,
    /// Ability used on the board.
    pub board_ability: Ability<BoardAbilityId>,
    /// Ability used in combat.
    pub combat_ability: Ability<CombatAbilityId>,
}

/// The six standard characters.
#[must_use]
pub fn default_characters() -> Vec<CharacterDef> {
    let def = |id, emoji: &str, color: &str, board, combat| CharacterDef {
        id,
        emoji: emoji.to_string(),
        color: color.to_string(),
        board_ability: board,
        combat_ability: combat,
    };
    vec![
        def(
            CharacterId::Warrior,
            "⚔️",
            "red",
            Ability::new(BoardAbilityId::Charge, "Charge", "Move 2 extra tiles once per turn", 1),
            Ability::new(CombatAbilityId::BerserkerRage, "Berserker Rage", "Deal +4 damage for one attack", 2),
        ),
        def(
            CharacterId::Mage,
            "🧙",
            "blue",
            Ability::new(BoardAbilityId::Teleport, "Teleport", "Move to any empty tile", 1),
            Ability::new(CombatAbilityId::MagicMissile, "Magic Missile", "Guaranteed 8 damage (no dice)", 1),
        ),
        def(
            CharacterId::Archer,
            "🏹",
            "green",
            Ability::new(BoardAbilityId::EagleEye, "Eagle Eye", "See all monster positions", 3),
            Ability::new(CombatAbilityId::PreciseShot, "Precise Shot", "Always roll maximum on dice", 1),
        ),
        def(
            CharacterId::Rogue,
            "🗡️",
            "purple",
            Ability::new(BoardAbilityId::Stealth, "Stealth", "Move through other players", 2),
            Ability::new(CombatAbilityId::Backstab, "Backstab", "Attack first and deal +3 damage", 2),
        ),
        def(
            CharacterId::Paladin,
            "🛡️",
            "yellow",
            Ability::new(BoardAbilityId::DivineProtection, "Divine Protection", "Heal 20 HP", 2),
            Ability::new(CombatAbilityId::HolyStrike, "Holy Strike", "Deal damage equal to missing health", 1),
        ),
        def(
            CharacterId::Druid,
            "🌿",
            "emerald",
            Ability::new(BoardAbilityId::NaturesPath, "Nature's Path", "Move through obstacles", 3),
            Ability::new(CombatAbilityId::WildShape, "Wild Shape", "Take half damage for 3 rounds", 1),
        ),
    ]
}

/// Everything a board ability may touch.
#[derive(Debug)]
pub struct BoardAbilityContext<'a> {
    /// The activating player.
    pub player: &'a mut Player,
    /// The current turn.
    pub turn: &'a mut TurnState,
    /// All monsters, read only.
    pub monsters: &'a [Monster],
    /// Active configuration.
    pub config: &'a GameConfig,
}

/// Board ability effect. Returns the narration line.
pub type BoardEffect = fn(&mut BoardAbilityContext<'_>) -> String;

/// Everything a combat ability may touch.
#[derive(Debug)]
pub struct CombatAbilityContext<'a> {
    /// The activating player.
    pub player: &'a mut Player,
    /// Modifiers for the round being fought.
    pub modifiers: &'a mut RoundModifiers,
    /// Active configuration.
    pub config: &'a GameConfig,
}

/// Combat ability effect. Returns the narration line.
pub type CombatEffect = fn(&mut CombatAbilityContext<'_>) -> String;

const BOARD_EFFECTS: [(BoardAbilityId, BoardEffect); 6] = [
    (BoardAbilityId::Charge, charge),
    (BoardAbilityId::Teleport, teleport),
    (BoardAbilityId::EagleEye, eagle_eye),
    (BoardAbilityId::Stealth, stealth),
    (BoardAbilityId::DivineProtection, divine_protection),
    (BoardAbilityId::NaturesPath, natures_path),
];

const COMBAT_EFFECTS: [(CombatAbilityId, CombatEffect); 6] = [
    (CombatAbilityId::BerserkerRage, berserker_rage),
    (CombatAbilityId::MagicMissile, magic_missile),
    (CombatAbilityId::PreciseShot, precise_shot),
    (CombatAbilityId::Backstab, backstab),
    (CombatAbilityId::HolyStrike, holy_strike),
    (CombatAbilityId::WildShape, wild_shape),
];

/// Effect function for a board ability.
#[must_use]
pub fn board_effect(id: BoardAbilityId) -> Option<BoardEffect> {
    BOARD_EFFECTS
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, effect)| *effect)
}

/// Effect function for a combat ability.
#[must_use]
pub fn combat_effect(id: CombatAbilityId) -> Option<CombatEffect> {
    COMBAT_EFFECTS
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, effect)| *effect)
}

fn charge(ctx: &mut BoardAbilityContext<'_>) -> String {
    ctx.turn.moves_left += ctx.config.charge_moves;
    format!(
        "{} used Charge! +{} movement this turn.",
        ctx.player.name, ctx.config.charge_moves
    )
}

fn teleport(ctx: &mut BoardAbilityContext<'_>) -> String {
    ctx.turn.teleport_armed = true;
    format!("{} can teleport to any empty tile!", ctx.player.name)
}

fn eagle_eye(ctx: &mut BoardAbilityContext<'_>) -> String {
    let sightings: Vec<String> = ctx
        .monsters
        .iter()
        .filter(|m| m.is_alive())
        .map(|m| format!("{} at {}", m.kind, m.position))
        .collect();
    if sightings.is_empty() {
        format!("{} used Eagle Eye! No monsters remain.", ctx.player.name)
    } else {
        format!(
            "{} used Eagle Eye! Monsters revealed: {}.",
            ctx.player.name,
            sightings.join(", ")
        )
    }
}

fn stealth(ctx: &mut BoardAbilityContext<'_>) -> String {
    format!("{} can move through other players this turn!", ctx.player.name)
}

fn divine_protection(ctx: &mut BoardAbilityContext<'_>) -> String {
    let healed = ctx.player.heal(ctx.config.divine_heal);
    format!("{} healed {healed} HP!", ctx.player.name)
}

fn natures_path(ctx: &mut BoardAbilityContext<'_>) -> String {
    format!("{} can move through obstacles this turn!", ctx.player.name)
}

fn berserker_rage(ctx: &mut CombatAbilityContext<'_>) -> String {
    ctx.modifiers.extra_damage += 4;
    format!("{} flies into a Berserker Rage! (+4 damage)", ctx.player.name)
}

fn magic_missile(ctx: &mut CombatAbilityContext<'_>) -> String {
    ctx.modifiers.fixed_damage = Some(8);
    format!("{} conjures a Magic Missile! (8 damage)", ctx.player.name)
}

fn precise_shot(ctx: &mut CombatAbilityContext<'_>) -> String {
    ctx.modifiers.max_roll = true;
    format!("{} lines up a Precise Shot!", ctx.player.name)
}

fn backstab(ctx: &mut CombatAbilityContext<'_>) -> String {
    ctx.modifiers.extra_damage += 3;
    ctx.modifiers.strike_first = true;
    format!("{} slips in for a Backstab! (+3 damage, strikes first)", ctx.player.name)
}

fn holy_strike(ctx: &mut CombatAbilityContext<'_>) -> String {
    ctx.modifiers.missing_health_damage = true;
    format!("{} calls down a Holy Strike!", ctx.player.name)
}

fn wild_shape(ctx: &mut CombatAbilityContext<'_>) -> String {
    ctx.player.wild_shape_rounds = ctx.config.wild_shape_rounds;
    format!(
        "{} takes Wild Shape! (half damage for {} rounds)",
        ctx.player.name, ctx.config.wild_shape_rounds
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Coord;

    fn player(character: CharacterId) -> Player {
        let defs = default_characters();
        let def = defs.iter().find(|d| d.id == character).unwrap();
        Player::new(0, def, Coord::new(1, 1), 100)
    }

    #[test]
    fn test_default_roster_is_complete() {
        let defs = default_characters();
        assert_eq!(defs.len(), CharacterId::ALL.len());
        for id in CharacterId::ALL {
            assert!(defs.iter().any(|d| d.id == id));
        }
    }

    #[test]
    fn test_every_ability_has_an_effect() {
        for def in default_characters() {
            assert!(board_effect(def.board_ability.kind).is_some());
            assert!(combat_effect(def.combat_ability.kind).is_some());
        }
    }

    #[test]
    fn test_ability_consume_is_monotonic() {
        let mut ability = Ability::new(BoardAbilityId::Stealth, "Stealth", "", 2);
        assert!(ability.consume());
        assert!(ability.consume());
        assert!(!ability.consume());
        assert_eq!(ability.uses, 0);
        assert_eq!(ability.max_uses, 2);
    }

    #[test]
    fn test_charge_adds_moves() {
        let config = GameConfig::default();
        let mut p = player(CharacterId::Warrior);
        let mut turn = TurnState::new(0);
        turn.moves_left = 1;
        let effect = board_effect(BoardAbilityId::Charge).unwrap();
        let line = effect(&mut BoardAbilityContext {
            player: &mut p,
            turn: &mut turn,
            monsters: &[],
            config: &config,
        });
        assert_eq!(turn.moves_left, 3);
        assert!(line.contains("Charge"));
    }

    #[test]
    fn test_divine_protection_clamps() {
        let config = GameConfig::default();
        let mut p = player(CharacterId::Paladin);
        p.health = 95;
        let mut turn = TurnState::new(0);
        let effect = board_effect(BoardAbilityId::DivineProtection).unwrap();
        let line = effect(&mut BoardAbilityContext {
            player: &mut p,
            turn: &mut turn,
            monsters: &[],
            config: &config,
        });
        assert_eq!(p.health, 100);
        assert!(line.contains("healed 5 HP"));
    }

    #[test]
    fn test_eagle_eye_lists_living_monsters() {
        let config = GameConfig::default();
        let mut p = player(CharacterId::Archer);
        let mut turn = TurnState::new(0);
        let mut dead = Monster::new(1, Coord::new(3, 3), "Ghost", 50);
        dead.defeat();
        let monsters = [Monster::new(0, Coord::new(5, 6), "Dragon", 50), dead];
        let effect = board_effect(BoardAbilityId::EagleEye).unwrap();
        let line = effect(&mut BoardAbilityContext {
            player: &mut p,
            turn: &mut turn,
            monsters: &monsters,
            config: &config,
        });
        assert!(line.contains("Dragon at (5, 6)"));
        assert!(!line.contains("Ghost"));
    }

    #[test]
    fn test_backstab_arms_initiative() {
        let config = GameConfig::default();
        let mut p = player(CharacterId::Rogue);
        let mut mods = RoundModifiers::default();
        let effect = combat_effect(CombatAbilityId::Backstab).unwrap();
        effect(&mut CombatAbilityContext {
            player: &mut p,
            modifiers: &mut mods,
            config: &config,
        });
        assert!(mods.strike_first);
        assert_eq!(mods.extra_damage, 3);
    }

    #[test]
    fn test_wild_shape_sets_counter() {
        let config = GameConfig::default();
        let mut p = player(CharacterId::Druid);
        let mut mods = RoundModifiers::default();
        let effect = combat_effect(CombatAbilityId::WildShape).unwrap();
        effect(&mut CombatAbilityContext {
            player: &mut p,
            modifiers: &mut mods,
            config: &config,
        });
        assert_eq!(p.wild_shape_rounds, config.wild_shape_rounds);
    }
}
