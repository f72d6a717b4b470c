//! Property-based tests for game mechanics.
//!
//! These tests verify properties of dice, items, combat and the command API.
//! Run with: cargo test --release prop_game

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use monster_hunt::game::combat::{damage_after_defense, transfer_half_inventory, wild_shape_damage};
use monster_hunt::game::{
    calculate_combat_bonuses, check_invariants, default_characters, next_living_seat,
    CombatBonuses, Coord,
};
use monster_hunt::simulation::choose_command;
use monster_hunt::{
    CharacterId, Command, Dice, Game, GameConfig, GamePhase, Item, Player, RngDice,
};

fn item() -> impl Strategy<Value = Item> {
    prop::sample::select(Item::ALL.to_vec())
}

fn player_with(id: u8, inventory: Vec<Item>) -> Player {
    let defs = default_characters();
    let mut p = Player::new(id, &defs[usize::from(id) % defs.len()], Coord::new(1, 1), 100);
    p.inventory = inventory;
    p
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        (0usize..8).prop_map(|players| Command::StartCharacterSelect { players }),
        (0u8..6, prop::sample::select(CharacterId::ALL.to_vec()))
            .prop_map(|(player, character)| Command::SelectCharacter { player, character }),
        Just(Command::RollMovementDie),
        (0u16..16, 0u16..16).prop_map(|(x, y)| Command::MoveTo { x, y }),
        Just(Command::EndTurn),
        (0u8..6).prop_map(|monster| Command::StartCombatAgainstMonster { monster }),
        (0u8..5).prop_map(|opponent| Command::StartPvpCombat { opponent }),
        Just(Command::RollForAttack),
        Just(Command::RollOpponent),
        Just(Command::RerollDice),
        Just(Command::ResolveRound),
        Just(Command::FightRound),
        Just(Command::ActivateCombatAbility),
        (0u8..5, 0usize..4).prop_map(|(player, index)| Command::UseItem { player, index }),
        (0u8..5).prop_map(|player| Command::ActivateBoardAbility { player }),
    ]
}

/// A started game with `seats` players.
fn started(seed: u64, seats: usize) -> Game {
    let mut game = Game::seeded(GameConfig::default(), seed).unwrap();
    game.start_character_select(seats).unwrap();
    for seat in 0..seats {
        game.select_character(u8::try_from(seat).unwrap(), CharacterId::ALL[seat])
            .unwrap();
    }
    game
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Dice always stay on their faces.
    #[test]
    fn prop_dice_ranges(seed in any::<u64>(), len in 1usize..500) {
        let mut dice = RngDice::seeded(seed);
        for _ in 0..50 {
            let face = dice.roll_die();
            prop_assert!((1..=6).contains(&face));
            let sum = dice.roll_two_dice_sum();
            prop_assert!((2..=12).contains(&sum));
            prop_assert!(dice.below(len) < len);
        }
    }

    /// Bonuses depend only on the multiset of items, never on their order.
    #[test]
    fn prop_bonuses_order_independent(items in prop::collection::vec(item(), 0..12)) {
        let forward = calculate_combat_bonuses(&items);
        let mut reversed = items.clone();
        reversed.reverse();
        prop_assert_eq!(forward, calculate_combat_bonuses(&reversed));
        let folded = items
            .iter()
            .fold(CombatBonuses::NONE, |acc, item| acc.combine(item.bonus()));
        prop_assert_eq!(forward, folded);
    }

    /// Bonuses are pure: computing them twice gives the same answer.
    #[test]
    fn prop_bonuses_pure(items in prop::collection::vec(item(), 0..12)) {
        prop_assert_eq!(calculate_combat_bonuses(&items), calculate_combat_bonuses(&items));
    }

    /// Damage after defense is never below one.
    #[test]
    fn prop_damage_floor(raw in 0u32..200, defense in 0u32..200) {
        let dealt = damage_after_defense(raw, defense);
        prop_assert!(dealt >= 1);
        if raw > defense {
            prop_assert_eq!(dealt, raw - defense);
        }
        prop_assert!(wild_shape_damage(raw) >= 1);
        prop_assert!(wild_shape_damage(raw) <= raw.max(1));
    }

    /// Transferring half an inventory moves items without creating or losing any.
    #[test]
    fn prop_inventory_conserved(
        loser_items in prop::collection::vec(item(), 0..10),
        winner_items in prop::collection::vec(item(), 0..10),
    ) {
        let mut loser = player_with(0, loser_items.clone());
        let mut winner = player_with(1, winner_items.clone());
        let taken = transfer_half_inventory(&mut loser, &mut winner);
        prop_assert_eq!(taken.len(), loser_items.len().div_ceil(2));
        prop_assert_eq!(&taken[..], &loser_items[..taken.len()]);
        prop_assert_eq!(
            loser.inventory.len() + winner.inventory.len(),
            loser_items.len() + winner_items.len()
        );
        prop_assert_eq!(&winner.inventory[..winner_items.len()], &winner_items[..]);
    }

    /// Finding the next seat always terminates on a living seat, or stays put.
    #[test]
    fn prop_next_seat_terminates(alive in prop::collection::vec(any::<bool>(), 1..7), start in 0usize..7) {
        let current = start % alive.len();
        let players: Vec<Player> = alive
            .iter()
            .enumerate()
            .map(|(i, &living)| {
                let mut p = player_with(u8::try_from(i).unwrap(), Vec::new());
                if !living {
                    p.eliminate();
                }
                p
            })
            .collect();
        let next = next_living_seat(&players, current);
        prop_assert!(next < players.len());
        let others_alive = alive.iter().enumerate().any(|(i, &a)| a && i != current);
        if others_alive {
            prop_assert!(players[next].is_alive());
            prop_assert_ne!(next, current);
        } else {
            prop_assert_eq!(next, current);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Random command streams keep every invariant, never half-apply a
    /// rejected command, and never revive anyone.
    #[test]
    fn prop_random_commands_keep_invariants(
        seed in any::<u64>(),
        seats in 2usize..=4,
        script in prop::collection::vec(prop::option::weighted(0.5, command()), 1..300),
    ) {
        let mut game = started(seed, seats);
        prop_assert_eq!(game.phase(), GamePhase::Playing);

        for step in script {
            let command = step.unwrap_or_else(|| choose_command(&game));
            let before = game.snapshot();
            match game.apply(&command) {
                Ok(outcome) => {
                    prop_assert_eq!(&outcome.snapshot, &game.snapshot());
                }
                Err(_) => {
                    prop_assert_eq!(&game.snapshot(), &before, "rejected {:?} changed state", command);
                }
            }

            let violations = check_invariants(&game);
            prop_assert!(violations.is_empty(), "{:?} after {:?}", violations, command);

            for (old, new) in before.players.iter().zip(game.players()) {
                prop_assert!(!old.is_eliminated || new.is_eliminated, "player revived");
                prop_assert!(new.board_ability.uses <= old.board_ability.uses);
                prop_assert!(new.combat_ability.uses <= old.combat_ability.uses);
            }
            for (old, new) in before.monsters.iter().zip(game.monsters()) {
                prop_assert!(!old.defeated || new.defeated, "monster revived");
            }
            if before.phase == GamePhase::GameOver {
                prop_assert_eq!(game.phase(), GamePhase::GameOver);
            }
        }
    }

    /// Reset always lands in setup with an empty table.
    #[test]
    fn prop_reset_from_anywhere(seed in any::<u64>(), steps in 0usize..120) {
        let mut game = started(seed, 3);
        for _ in 0..steps {
            let command = choose_command(&game);
            let _ = game.apply(&command);
        }
        game.reset_game().unwrap();
        prop_assert_eq!(game.phase(), GamePhase::Setup);
        prop_assert!(game.players().is_empty());
        prop_assert!(game.monsters().is_empty());
        prop_assert!(game.encounter().is_none());
        prop_assert!(check_invariants(&game).is_empty());
    }
}
