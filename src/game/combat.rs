//! Combat resolution.
//!
//! An encounter is a small state machine. The actor rolls two dice, then the
//! opponent rolls, then the round resolves. Each step is a separate call so
//! a front end can pace them however it likes, but the order is fixed: the
//! opponent never rolls before the actor's roll is final, and nothing
//! resolves before both rolls exist.
//!
//! Monster rounds always resolve player-first. PvP rounds resolve attacker
//! first unless the defender holds initiative (see [`defender_strikes_first`]).

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dice::{Dice, DIE_FACES};
use crate::error::{CommandResult, GameError};
use crate::game::{CombatBonuses, Item, Monster, MonsterId, Player, PlayerId};

/// Who the actor is fighting. Exactly one kind of opponent per encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum EncounterTarget {
    /// A monster on the board.
    Monster(MonsterId),
    /// Another player (PvP phase only).
    Player(PlayerId),
}

/// The opponent's stats, refreshed after every round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentView {
    /// Display name.
    pub name: String,
    /// Health after the last resolved round.
    pub health: u32,
    /// Health ceiling.
    pub max_health: u32,
    /// Bonuses. Always empty for monsters.
    pub bonuses: CombatBonuses,
}

impl OpponentView {
    /// View of a monster.
    #[must_use]
    pub fn of_monster(monster: &Monster) -> Self {
        Self {
            name: monster.kind.clone(),
            health: monster.health,
            max_health: monster.max_health,
            bonuses: CombatBonuses::NONE,
        }
    }

    /// View of a player. Bonuses must already be refreshed.
    #[must_use]
    pub fn of_player(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            health: player.health,
            max_health: player.max_health,
            bonuses: player.combat_bonuses,
        }
    }
}

/// Where the current round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollStage {
    /// Waiting for the actor's attack roll.
    AwaitingRoll,
    /// Actor rolled; the opponent rolls next.
    PlayerRolled,
    /// Both rolled; the round resolves next.
    OpponentRolled,
}

/// One side of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// The player who started the encounter.
    Actor,
    /// The monster or defending player.
    Opponent,
}

/// A finalized two-dice combat roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roll {
    /// Both die faces.
    pub dice: (u8, u8),
    /// Roll bonus added on top.
    pub bonus: u32,
    /// Dice plus bonus.
    pub total: u32,
}

impl Roll {
    /// Roll two dice and add `bonus`. With `max_roll` both dice show six.
    pub fn two_dice(dice: &mut impl Dice, bonus: u32, max_roll: bool) -> Self {
        let faces = if max_roll {
            (DIE_FACES, DIE_FACES)
        } else {
            dice.roll_two_dice()
        };
        Self {
            dice: faces,
            bonus,
            total: u32::from(faces.0) + u32::from(faces.1) + bonus,
        }
    }
}

/// Combat ability effects armed for the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundModifiers {
    /// Added to the actor's damage.
    pub extra_damage: u32,
    /// Replaces the actor's damage entirely.
    pub fixed_damage: Option<u32>,
    /// Actor's dice both show six.
    pub max_roll: bool,
    /// Actor strikes before a defender with initiative.
    pub strike_first: bool,
    /// Actor's damage equals their missing health.
    pub missing_health_damage: bool,
    /// A combat ability was activated this round.
    pub ability_armed: bool,
}

/// How a resolved round left the encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Both sides standing; another round follows.
    Continue,
    /// The monster fell.
    MonsterDefeated(MonsterId),
    /// A player fell. `winner` is the PvP victor, `None` against a monster.
    PlayerDefeated {
        /// The eliminated player.
        loser: PlayerId,
        /// The PvP victor.
        winner: Option<PlayerId>,
        /// Items moved from loser to winner.
        transferred: Vec<Item>,
    },
}

/// A running combat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    /// The player who started the fight.
    pub actor: PlayerId,
    /// The opponent.
    pub target: EncounterTarget,
    /// Opponent stats as of the last round.
    pub opponent: OpponentView,
    /// Latest actor roll.
    pub player_roll: Option<Roll>,
    /// Latest opponent roll.
    pub opponent_roll: Option<Roll>,
    /// Narrated events, append only.
    pub log: Vec<String>,
    /// Roll stage of the current round.
    pub stage: RollStage,
    /// The one reroll per encounter has been spent.
    pub reroll_used: bool,
    /// Rounds resolved so far.
    pub round: u32,
    /// Effects armed for the current round.
    pub modifiers: RoundModifiers,
}

impl Encounter {
    /// Open an encounter. Bonuses of both sides must already be refreshed.
    #[must_use]
    pub fn new(actor: &Player, target: EncounterTarget, opponent: OpponentView) -> Self {
        let opening = match target {
            EncounterTarget::Monster(_) => {
                format!("{} encounters a {}!", actor.name, opponent.name)
            }
            EncounterTarget::Player(_) => format!("{} attacks {}!", actor.name, opponent.name),
        };
        Self {
            actor: actor.id,
            target,
            opponent,
            player_roll: None,
            opponent_roll: None,
            log: vec![opening],
            stage: RollStage::AwaitingRoll,
            reroll_used: false,
            round: 0,
            modifiers: RoundModifiers::default(),
        }
    }

    /// Whether a round is underway.
    #[must_use]
    pub const fn is_rolling(&self) -> bool {
        !matches!(self.stage, RollStage::AwaitingRoll)
    }

    /// Side that rolls next.
    #[must_use]
    pub const fn to_roll(&self) -> Side {
        match self.stage {
            RollStage::AwaitingRoll | RollStage::OpponentRolled => Side::Actor,
            RollStage::PlayerRolled => Side::Opponent,
        }
    }

    /// Whether the encounter is a PvP fight.
    #[must_use]
    pub const fn is_pvp(&self) -> bool {
        matches!(self.target, EncounterTarget::Player(_))
    }

    /// Legality of the actor's attack roll.
    ///
    /// # Errors
    ///
    /// Rejects a roll already in progress, a decided fight or a fallen actor.
    pub fn check_attack(&self, actor: &Player) -> CommandResult<()> {
        if self.is_rolling() {
            return Err(GameError::RollInProgress);
        }
        if self.opponent.health == 0 {
            return Err(GameError::CombatDecided);
        }
        if !actor.is_alive() || actor.health == 0 {
            return Err(GameError::PlayerEliminated(actor.id));
        }
        Ok(())
    }

    /// Finalize the actor's roll.
    ///
    /// # Errors
    ///
    /// See [`Encounter::check_attack`].
    pub fn roll_attack(&mut self, dice: &mut impl Dice, actor: &Player) -> CommandResult<String> {
        self.check_attack(actor)?;
        let roll = Roll::two_dice(dice, actor.combat_bonuses.roll_bonus, self.modifiers.max_roll);
        debug!("{} rolled {:?} for {}", actor.name, roll.dice, roll.total);
        self.player_roll = Some(roll);
        self.stage = RollStage::PlayerRolled;
        Ok(self.push(format!("{} rolled {}!", actor.name, describe(&roll))))
    }

    /// Finalize the opponent's roll. Monsters get no roll bonus.
    ///
    /// # Errors
    ///
    /// Rejects the call unless the actor has just rolled.
    pub fn roll_opponent(&mut self, dice: &mut impl Dice) -> CommandResult<String> {
        match self.stage {
            RollStage::AwaitingRoll => return Err(GameError::NoRollYet),
            RollStage::OpponentRolled => return Err(GameError::RollInProgress),
            RollStage::PlayerRolled => {}
        }
        let roll = Roll::two_dice(dice, self.opponent.bonuses.roll_bonus, false);
        debug!("{} rolled {:?} for {}", self.opponent.name, roll.dice, roll.total);
        self.opponent_roll = Some(roll);
        self.stage = RollStage::OpponentRolled;
        Ok(self.push(format!("{} rolled {}!", self.opponent.name, describe(&roll))))
    }

    /// Legality of a reroll.
    ///
    /// # Errors
    ///
    /// Rejects a reroll before the attack roll, a second reroll, or one
    /// without a reroll item.
    pub fn check_reroll(&self, actor: &Player) -> CommandResult<()> {
        if !self.is_rolling() || self.player_roll.is_none() {
            return Err(GameError::NoRollYet);
        }
        if self.reroll_used {
            return Err(GameError::RerollUsed);
        }
        if !actor.combat_bonuses.can_reroll {
            return Err(GameError::NoReroll);
        }
        Ok(())
    }

    /// Replace the actor's roll. The opponent's roll, if any, stands.
    ///
    /// # Errors
    ///
    /// See [`Encounter::check_reroll`].
    pub fn reroll(&mut self, dice: &mut impl Dice, actor: &Player) -> CommandResult<String> {
        self.check_reroll(actor)?;
        let roll = Roll::two_dice(dice, actor.combat_bonuses.roll_bonus, self.modifiers.max_roll);
        self.player_roll = Some(roll);
        self.reroll_used = true;
        Ok(self.push(format!("{} rerolled {}!", actor.name, describe(&roll))))
    }

    /// Legality of arming a combat ability.
    ///
    /// # Errors
    ///
    /// Rejects arming mid-round, twice in a round, or with no uses left.
    pub fn check_ability(&self, actor: &Player) -> CommandResult<()> {
        if self.is_rolling() {
            return Err(GameError::RollInProgress);
        }
        if self.modifiers.ability_armed {
            return Err(GameError::AbilityAlreadyArmed);
        }
        if !actor.combat_ability.is_ready() {
            return Err(GameError::AbilityExhausted(actor.combat_ability.name.clone()));
        }
        Ok(())
    }

    fn push(&mut self, line: String) -> String {
        self.log.push(line.clone());
        line
    }

    fn rolls(&self) -> CommandResult<(Roll, Roll)> {
        match (self.stage, self.player_roll, self.opponent_roll) {
            (RollStage::OpponentRolled, Some(mine), Some(theirs)) => Ok((mine, theirs)),
            _ => Err(GameError::NoRollYet),
        }
    }

    fn finish_round(&mut self, opponent_health: u32) {
        self.opponent.health = opponent_health;
        self.stage = RollStage::AwaitingRoll;
        self.modifiers = RoundModifiers::default();
        self.round += 1;
    }
}

fn describe(roll: &Roll) -> String {
    if roll.bonus > 0 {
        format!(
            "{} + {} (+{} bonus) = {}",
            roll.dice.0, roll.dice.1, roll.bonus, roll.total
        )
    } else {
        format!("{} + {} = {}", roll.dice.0, roll.dice.1, roll.total)
    }
}

/// Damage left after defense. Never below one.
#[must_use]
pub const fn damage_after_defense(raw: u32, defense: u32) -> u32 {
    let reduced = raw.saturating_sub(defense);
    if reduced == 0 { 1 } else { reduced }
}

/// Incoming damage under Wild Shape: halved, rounded up, never below one.
#[must_use]
pub const fn wild_shape_damage(damage: u32) -> u32 {
    let halved = damage.div_ceil(2);
    if halved == 0 { 1 } else { halved }
}

/// Raw outgoing damage of the actor for this round, before defense.
#[must_use]
pub fn actor_damage(actor: &Player, roll: &Roll, modifiers: &RoundModifiers) -> u32 {
    if modifiers.missing_health_damage {
        return actor.missing_health().max(1);
    }
    if let Some(fixed) = modifiers.fixed_damage {
        return fixed;
    }
    roll.total + actor.combat_bonuses.attack_bonus + modifiers.extra_damage
}

/// Whether a PvP defender strikes before the attacker.
///
/// The defender needs initiative (Blade of Swiftness) and the attacker must
/// have neither initiative nor an armed Backstab.
#[must_use]
pub const fn defender_strikes_first(
    attacker: &CombatBonuses,
    defender: &CombatBonuses,
    modifiers: &RoundModifiers,
) -> bool {
    defender.attack_first && !attacker.attack_first && !modifiers.strike_first
}

/// Apply incoming damage, honouring Wild Shape. Returns the damage dealt.
fn hit(target: &mut Player, damage: u32) -> u32 {
    let dealt = if target.wild_shape_rounds > 0 {
        wild_shape_damage(damage)
    } else {
        damage
    };
    target.take_damage(dealt);
    dealt
}

fn tick_wild_shape(player: &mut Player) {
    player.wild_shape_rounds = player.wild_shape_rounds.saturating_sub(1);
}

/// Move the first half (rounded up) of the loser's inventory to the winner.
pub fn transfer_half_inventory(loser: &mut Player, winner: &mut Player) -> Vec<Item> {
    let taken = loser.drain_first_half();
    winner.inventory.extend(taken.iter().copied());
    taken
}

/// Two distinct players by seat, both mutable.
fn pair_mut(players: &mut [Player], a: usize, b: usize) -> Option<(&mut Player, &mut Player)> {
    if a == b || a >= players.len() || b >= players.len() {
        return None;
    }
    if a < b {
        let (left, right) = players.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = players.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    }
}

/// Resolve a round whose rolls are both final.
///
/// Mutates the participants, appends narration to the encounter log and
/// returns the lines produced together with the round outcome. The
/// encounter is ready for the next round afterwards.
///
/// # Errors
///
/// Rejects resolution before both rolls exist, or when a participant is
/// missing.
pub fn resolve_round(
    encounter: &mut Encounter,
    players: &mut [Player],
    monsters: &mut [Monster],
) -> CommandResult<(Vec<String>, RoundOutcome)> {
    let (mine, theirs) = encounter.rolls()?;
    let actor_seat = usize::from(encounter.actor);
    let mut lines = Vec::new();

    let outcome = match encounter.target {
        EncounterTarget::Monster(id) => {
            let monster = monsters
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or(GameError::UnknownMonster(id))?;
            let actor = players
                .get_mut(actor_seat)
                .ok_or(GameError::UnknownPlayer(encounter.actor))?;
            let outcome =
                monster_round(actor, monster, &mine, &theirs, &encounter.modifiers, &mut lines);
            encounter.finish_round(monster.health);
            outcome
        }
        EncounterTarget::Player(id) => {
            let (actor, defender) = pair_mut(players, actor_seat, usize::from(id))
                .ok_or(GameError::UnknownPlayer(id))?;
            let outcome =
                pvp_round(actor, defender, &mine, &theirs, &encounter.modifiers, &mut lines);
            encounter.finish_round(defender.health);
            outcome
        }
    };

    encounter.log.extend(lines.iter().cloned());
    Ok((lines, outcome))
}

fn monster_round(
    actor: &mut Player,
    monster: &mut Monster,
    mine: &Roll,
    theirs: &Roll,
    modifiers: &RoundModifiers,
    lines: &mut Vec<String>,
) -> RoundOutcome {
    let damage = actor_damage(actor, mine, modifiers);
    monster.take_damage(damage);
    lines.push(format!(
        "{} deals {damage} damage to the {}!",
        actor.name, monster.kind
    ));

    let outcome = if monster.health == 0 {
        monster.defeat();
        lines.push(format!("{} defeated the {}!", actor.name, monster.kind));
        RoundOutcome::MonsterDefeated(monster.id)
    } else {
        let counter = damage_after_defense(theirs.total, actor.combat_bonuses.defense_bonus);
        let dealt = hit(actor, counter);
        lines.push(format!(
            "The {} deals {dealt} damage to {}!",
            monster.kind, actor.name
        ));
        if actor.health == 0 {
            actor.eliminate();
            lines.push(format!("{} was defeated by the {}!", actor.name, monster.kind));
            RoundOutcome::PlayerDefeated {
                loser: actor.id,
                winner: None,
                transferred: Vec::new(),
            }
        } else {
            RoundOutcome::Continue
        }
    };
    tick_wild_shape(actor);
    outcome
}

fn pvp_round(
    actor: &mut Player,
    defender: &mut Player,
    mine: &Roll,
    theirs: &Roll,
    modifiers: &RoundModifiers,
    lines: &mut Vec<String>,
) -> RoundOutcome {
    let actor_hits = damage_after_defense(
        actor_damage(actor, mine, modifiers),
        defender.combat_bonuses.defense_bonus,
    );
    let defender_hits = damage_after_defense(
        theirs.total + defender.combat_bonuses.attack_bonus,
        actor.combat_bonuses.defense_bonus,
    );

    let defender_first =
        defender_strikes_first(&actor.combat_bonuses, &defender.combat_bonuses, modifiers);
    if defender_first {
        lines.push(format!("{} is quicker and strikes first!", defender.name));
        let dealt = hit(actor, defender_hits);
        lines.push(format!("{} deals {dealt} damage to {}!", defender.name, actor.name));
        if actor.health > 0 {
            let dealt = hit(defender, actor_hits);
            lines.push(format!("{} deals {dealt} damage to {}!", actor.name, defender.name));
        }
    } else {
        let dealt = hit(defender, actor_hits);
        lines.push(format!("{} deals {dealt} damage to {}!", actor.name, defender.name));
        if defender.health > 0 {
            let dealt = hit(actor, defender_hits);
            lines.push(format!("{} deals {dealt} damage to {}!", defender.name, actor.name));
        }
    }
    tick_wild_shape(actor);
    tick_wild_shape(defender);

    let (loser, winner) = if defender.health == 0 {
        (defender, actor)
    } else if actor.health == 0 {
        (actor, defender)
    } else {
        return RoundOutcome::Continue;
    };
    loser.eliminate();
    lines.push(format!("{} has been eliminated!", loser.name));
    let transferred = transfer_half_inventory(loser, winner);
    if !transferred.is_empty() {
        let names: Vec<&str> = transferred.iter().map(|item| item.name()).collect();
        lines.push(format!(
            "{} takes {} from {}!",
            winner.name,
            names.join(", "),
            loser.name
        ));
    }
    RoundOutcome::PlayerDefeated {
        loser: loser.id,
        winner: Some(winner.id),
        transferred,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{RngDice, ScriptedDice};
    use crate::game::{default_characters, CharacterId, Coord};

    fn player(id: PlayerId, character: CharacterId) -> Player {
        let defs = default_characters();
        let def = defs.iter().find(|d| d.id == character).unwrap();
        Player::new(id, def, Coord::new(1, 1), 100)
    }

    fn monster_fight() -> (Vec<Player>, Vec<Monster>, Encounter) {
        let players = vec![player(0, CharacterId::Warrior)];
        let monsters = vec![Monster::new(0, Coord::new(2, 2), "Ogre", 50)];
        let encounter = Encounter::new(
            &players[0],
            EncounterTarget::Monster(0),
            OpponentView::of_monster(&monsters[0]),
        );
        (players, monsters, encounter)
    }

    fn fight(
        encounter: &mut Encounter,
        dice: &mut ScriptedDice,
        players: &mut [Player],
        monsters: &mut [Monster],
    ) -> RoundOutcome {
        let actor = players[usize::from(encounter.actor)].clone();
        encounter.roll_attack(dice, &actor).unwrap();
        encounter.roll_opponent(dice).unwrap();
        resolve_round(encounter, players, monsters).unwrap().1
    }

    #[test]
    fn test_damage_floor() {
        assert_eq!(damage_after_defense(5, 10), 1);
        assert_eq!(damage_after_defense(5, 5), 1);
        assert_eq!(damage_after_defense(9, 2), 7);
    }

    #[test]
    fn test_wild_shape_halves_up() {
        assert_eq!(wild_shape_damage(7), 4);
        assert_eq!(wild_shape_damage(8), 4);
        assert_eq!(wild_shape_damage(1), 1);
        assert_eq!(wild_shape_damage(0), 1);
    }

    #[test]
    fn test_three_sevens_leave_monster_at_29() {
        let (mut players, mut monsters, mut encounter) = monster_fight();
        let mut dice = ScriptedDice::new([3, 4, 1, 1, 3, 4, 1, 1, 3, 4, 1, 1]);
        for _ in 0..3 {
            let outcome = fight(&mut encounter, &mut dice, &mut players, &mut monsters);
            assert_eq!(outcome, RoundOutcome::Continue);
        }
        assert_eq!(monsters[0].health, 29);
        assert!(monsters[0].is_alive());
        assert_eq!(encounter.opponent.health, 29);
        assert_eq!(encounter.round, 3);
        assert_eq!(encounter.stage, RollStage::AwaitingRoll);
        // Monster rolled 2 each time.
        assert_eq!(players[0].health, 94);
    }

    #[test]
    fn test_monster_counter_has_floor() {
        let (mut players, mut monsters, mut encounter) = monster_fight();
        players[0].inventory = vec![Item::ShieldOfProtection; 5];
        players[0].refresh_bonuses();
        let mut dice = ScriptedDice::new([1, 1, 2, 3]);
        fight(&mut encounter, &mut dice, &mut players, &mut monsters);
        assert_eq!(players[0].health, 99);
    }

    #[test]
    fn test_monster_defeat() {
        let (mut players, mut monsters, mut encounter) = monster_fight();
        monsters[0].health = 5;
        encounter.opponent.health = 5;
        let mut dice = ScriptedDice::new([6, 6, 6, 6]);
        let outcome = fight(&mut encounter, &mut dice, &mut players, &mut monsters);
        assert_eq!(outcome, RoundOutcome::MonsterDefeated(0));
        assert!(monsters[0].defeated);
        assert_eq!(players[0].health, 100, "dead monsters do not strike back");
    }

    #[test]
    fn test_player_falls_to_monster() {
        let (mut players, mut monsters, mut encounter) = monster_fight();
        players[0].health = 3;
        let mut dice = ScriptedDice::new([1, 1, 6, 6]);
        let outcome = fight(&mut encounter, &mut dice, &mut players, &mut monsters);
        assert!(matches!(
            outcome,
            RoundOutcome::PlayerDefeated { loser: 0, winner: None, .. }
        ));
        assert!(players[0].is_eliminated);
    }

    #[test]
    fn test_roll_order_enforced() {
        let (players, _, mut encounter) = monster_fight();
        let mut dice = RngDice::seeded(1);
        assert_eq!(encounter.roll_opponent(&mut dice), Err(GameError::NoRollYet));
        encounter.roll_attack(&mut dice, &players[0]).unwrap();
        assert!(encounter.is_rolling());
        assert_eq!(encounter.to_roll(), Side::Opponent);
        assert_eq!(
            encounter.roll_attack(&mut dice, &players[0]),
            Err(GameError::RollInProgress)
        );
    }

    #[test]
    fn test_resolve_needs_both_rolls() {
        let (mut players, mut monsters, mut encounter) = monster_fight();
        let mut dice = RngDice::seeded(1);
        let actor = players[0].clone();
        encounter.roll_attack(&mut dice, &actor).unwrap();
        let before = encounter.clone();
        assert_eq!(
            resolve_round(&mut encounter, &mut players, &mut monsters),
            Err(GameError::NoRollYet)
        );
        assert_eq!(encounter, before);
    }

    #[test]
    fn test_reroll_once() {
        let (mut players, _, mut encounter) = monster_fight();
        players[0].inventory = vec![Item::LuckyCharm];
        players[0].refresh_bonuses();
        let mut dice = ScriptedDice::new([1, 1, 5, 6]);
        assert_eq!(encounter.reroll(&mut dice, &players[0]), Err(GameError::NoRollYet));
        encounter.roll_attack(&mut dice, &players[0]).unwrap();
        encounter.reroll(&mut dice, &players[0]).unwrap();
        assert_eq!(encounter.player_roll.unwrap().total, 11);
        assert_eq!(encounter.stage, RollStage::PlayerRolled);
        assert_eq!(
            encounter.reroll(&mut dice, &players[0]),
            Err(GameError::RerollUsed)
        );
    }

    #[test]
    fn test_reroll_needs_charm() {
        let (players, _, mut encounter) = monster_fight();
        let mut dice = RngDice::seeded(1);
        encounter.roll_attack(&mut dice, &players[0]).unwrap();
        assert_eq!(encounter.reroll(&mut dice, &players[0]), Err(GameError::NoReroll));
    }

    #[test]
    fn test_crystal_adds_to_player_roll_only() {
        let (mut players, _, mut encounter) = monster_fight();
        players[0].inventory = vec![Item::CrystalOfPower];
        players[0].refresh_bonuses();
        let mut dice = ScriptedDice::new([2, 2, 2, 2]);
        encounter.roll_attack(&mut dice, &players[0]).unwrap();
        encounter.roll_opponent(&mut dice).unwrap();
        assert_eq!(encounter.player_roll.unwrap().total, 5);
        assert_eq!(encounter.opponent_roll.unwrap().total, 4);
    }

    #[test]
    fn test_modifiers_shape_damage() {
        let actor = player(0, CharacterId::Paladin);
        let roll = Roll { dice: (3, 3), bonus: 0, total: 6 };
        let mut mods = RoundModifiers::default();
        assert_eq!(actor_damage(&actor, &roll, &mods), 6);
        mods.extra_damage = 4;
        assert_eq!(actor_damage(&actor, &roll, &mods), 10);
        mods.fixed_damage = Some(8);
        assert_eq!(actor_damage(&actor, &roll, &mods), 8);
        mods.missing_health_damage = true;
        assert_eq!(actor_damage(&actor, &roll, &mods), 1);
    }

    fn pvp() -> (Vec<Player>, Encounter) {
        let mut players = vec![player(0, CharacterId::Warrior), player(1, CharacterId::Rogue)];
        for p in &mut players {
            p.refresh_bonuses();
        }
        let encounter = Encounter::new(
            &players[0],
            EncounterTarget::Player(1),
            OpponentView::of_player(&players[1]),
        );
        (players, encounter)
    }

    #[test]
    fn test_pvp_defense_floor() {
        let (mut players, mut encounter) = pvp();
        players[1].inventory = vec![Item::ShieldOfProtection; 5];
        players[1].refresh_bonuses();
        let mut dice = ScriptedDice::new([2, 3, 1, 1]);
        fight(&mut encounter, &mut dice, &mut players, &mut []);
        assert_eq!(players[1].health, 99);
        assert_eq!(players[0].health, 98);
    }

    #[test]
    fn test_pvp_elimination_transfers_half() {
        let (mut players, mut encounter) = pvp();
        players[1].health = 4;
        players[1].inventory = vec![
            Item::MagicSword,
            Item::HealthPotion,
            Item::LuckyCharm,
            Item::EnchantedBow,
            Item::CrystalOfPower,
        ];
        players[0].inventory = vec![Item::ShieldOfProtection];
        let mut dice = ScriptedDice::new([3, 3, 1, 1]);
        let outcome = fight(&mut encounter, &mut dice, &mut players, &mut []);
        assert_eq!(
            outcome,
            RoundOutcome::PlayerDefeated {
                loser: 1,
                winner: Some(0),
                transferred: vec![Item::MagicSword, Item::HealthPotion, Item::LuckyCharm],
            }
        );
        assert_eq!(players[1].inventory.len(), 2);
        assert_eq!(players[0].inventory.len(), 4);
        assert_eq!(players[0].health, 100, "eliminated defenders do not counter");
    }

    #[test]
    fn test_blade_gives_defender_initiative() {
        let (mut players, mut encounter) = pvp();
        players[1].inventory = vec![Item::BladeOfSwiftness];
        players[1].refresh_bonuses();
        encounter.opponent = OpponentView::of_player(&players[1]);
        players[0].health = 2;
        let mut dice = ScriptedDice::new([6, 6, 6, 6]);
        let outcome = fight(&mut encounter, &mut dice, &mut players, &mut []);
        assert!(matches!(
            outcome,
            RoundOutcome::PlayerDefeated { loser: 0, winner: Some(1), .. }
        ));
        assert_eq!(players[1].health, 100);
    }

    #[test]
    fn test_backstab_beats_blade() {
        let attacker = CombatBonuses::NONE;
        let defender = Item::BladeOfSwiftness.bonus();
        let mut mods = RoundModifiers::default();
        assert!(defender_strikes_first(&attacker, &defender, &mods));
        mods.strike_first = true;
        assert!(!defender_strikes_first(&attacker, &defender, &mods));
        assert!(!defender_strikes_first(&defender, &defender, &RoundModifiers::default()));
    }

    #[test]
    fn test_wild_shape_counts_down() {
        let (mut players, mut monsters, mut encounter) = monster_fight();
        players[0].wild_shape_rounds = 2;
        let mut dice = ScriptedDice::new([1, 1, 4, 5, 1, 1, 4, 5, 1, 1, 4, 5]);
        fight(&mut encounter, &mut dice, &mut players, &mut monsters);
        assert_eq!(players[0].health, 95);
        fight(&mut encounter, &mut dice, &mut players, &mut monsters);
        assert_eq!(players[0].health, 90);
        assert_eq!(players[0].wild_shape_rounds, 0);
        fight(&mut encounter, &mut dice, &mut players, &mut monsters);
        assert_eq!(players[0].health, 81);
    }

    #[test]
    fn test_pair_mut_rejects_same_seat() {
        let mut players = vec![player(0, CharacterId::Warrior), player(1, CharacterId::Mage)];
        assert!(pair_mut(&mut players, 0, 0).is_none());
        let (b, a) = pair_mut(&mut players, 1, 0).unwrap();
        assert_eq!((b.id, a.id), (1, 0));
    }
}
