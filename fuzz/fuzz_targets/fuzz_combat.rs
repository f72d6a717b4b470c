#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use monster_hunt::game::{check_invariants, default_characters, Board};
use monster_hunt::{CharacterId, Coord, Game, GameConfig, GamePhase, Item, Monster, Player, ScriptedDice};

/// A combat action from either side of the table.
#[derive(Arbitrary, Debug)]
enum Action {
    RollForAttack,
    RollOpponent,
    RerollDice,
    ResolveRound,
    FightRound,
    ActivateCombatAbility,
    UseItem(u8, u8),
}

/// Structured input for combat fuzzing.
#[derive(Arbitrary, Debug)]
struct CombatInput {
    /// Character of each seat.
    characters: (u8, u8),
    /// Starting health of each seat.
    health: (u8, u8),
    /// Monster health.
    monster_health: u8,
    /// Inventories, indexes into the item list.
    inventories: (Vec<u8>, Vec<u8>),
    /// Dice faces, clamped by the dice.
    faces: Vec<u8>,
    /// Fight the other player instead of the monster.
    pvp: bool,
    actions: Vec<Action>,
}

fn seat(id: u8, pick: u8, health: u8, items: &[u8], at: Coord) -> Player {
    let defs = default_characters();
    let character = CharacterId::ALL[usize::from(pick) % CharacterId::ALL.len()];
    let def = defs.iter().find(|d| d.id == character).unwrap_or(&defs[0]);
    let mut player = Player::new(id, def, at, 100);
    player.health = u32::from(health % 100) + 1;
    player.inventory = items
        .iter()
        .take(12)
        .map(|&i| Item::ALL[usize::from(i) % Item::ALL.len()])
        .collect();
    player
}

fuzz_target!(|input: CombatInput| {
    let players = vec![
        seat(0, input.characters.0, input.health.0, &input.inventories.0, Coord::new(5, 5)),
        seat(1, input.characters.1, input.health.1, &input.inventories.1, Coord::new(6, 5)),
    ];
    let monsters = if input.pvp {
        Vec::new()
    } else {
        vec![Monster::new(0, Coord::new(5, 6), "Ogre", u32::from(input.monster_health) + 1)]
    };
    let mut game = Game::from_parts(
        GameConfig::default(),
        ScriptedDice::new(input.faces.into_iter().take(512)),
        Board::bordered(15),
        players,
        monsters,
    );

    let started = if input.pvp {
        game.start_pvp_combat(1)
    } else {
        game.start_combat_against_monster(0)
    };
    if started.is_err() {
        return;
    }
    assert_eq!(game.phase(), GamePhase::Combat);

    for action in input.actions.into_iter().take(256) {
        let _ = match action {
            Action::RollForAttack => game.roll_for_attack(),
            Action::RollOpponent => game.roll_opponent(),
            Action::RerollDice => game.reroll_dice(),
            Action::ResolveRound => game.resolve_round(),
            Action::FightRound => game.fight_round(),
            Action::ActivateCombatAbility => game.activate_combat_ability(),
            Action::UseItem(player, index) => game.use_item(player % 2, usize::from(index % 12)),
        };
        let violations = check_invariants(&game);
        assert!(violations.is_empty(), "{violations:?}");
        if game.phase() != GamePhase::Combat {
            break;
        }
    }
});
