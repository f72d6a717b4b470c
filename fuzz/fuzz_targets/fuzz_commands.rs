#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use monster_hunt::game::check_invariants;
use monster_hunt::{CharacterId, Command, Game, GameConfig};

/// One fuzzed command. Targets are small so they often hit real entities.
#[derive(Arbitrary, Debug)]
enum FuzzCommand {
    StartCharacterSelect(u8),
    SelectCharacter(u8, u8),
    RollMovementDie,
    MoveTo(u8, u8),
    EndTurn,
    StartCombatAgainstMonster(u8),
    StartPvpCombat(u8),
    RollForAttack,
    RollOpponent,
    RerollDice,
    ResolveRound,
    FightRound,
    ActivateCombatAbility,
    UseItem(u8, u8),
    ActivateBoardAbility(u8),
    ResetGame,
}

impl FuzzCommand {
    fn into_command(self) -> Command {
        match self {
            Self::StartCharacterSelect(n) => Command::StartCharacterSelect {
                players: usize::from(n % 8),
            },
            Self::SelectCharacter(player, c) => Command::SelectCharacter {
                player: player % 8,
                character: CharacterId::ALL[usize::from(c) % CharacterId::ALL.len()],
            },
            Self::RollMovementDie => Command::RollMovementDie,
            Self::MoveTo(x, y) => Command::MoveTo {
                x: u16::from(x % 17),
                y: u16::from(y % 17),
            },
            Self::EndTurn => Command::EndTurn,
            Self::StartCombatAgainstMonster(m) => Command::StartCombatAgainstMonster { monster: m % 8 },
            Self::StartPvpCombat(p) => Command::StartPvpCombat { opponent: p % 8 },
            Self::RollForAttack => Command::RollForAttack,
            Self::RollOpponent => Command::RollOpponent,
            Self::RerollDice => Command::RerollDice,
            Self::ResolveRound => Command::ResolveRound,
            Self::FightRound => Command::FightRound,
            Self::ActivateCombatAbility => Command::ActivateCombatAbility,
            Self::UseItem(player, index) => Command::UseItem {
                player: player % 8,
                index: usize::from(index % 8),
            },
            Self::ActivateBoardAbility(p) => Command::ActivateBoardAbility { player: p % 8 },
            Self::ResetGame => Command::ResetGame,
        }
    }
}

#[derive(Arbitrary, Debug)]
struct CommandInput {
    seed: u64,
    commands: Vec<FuzzCommand>,
}

fuzz_target!(|input: CommandInput| {
    let Ok(mut game) = Game::seeded(GameConfig::default(), input.seed) else {
        return;
    };

    for fuzzed in input.commands.into_iter().take(2000) {
        let command = fuzzed.into_command();
        let before = game.snapshot();
        if game.apply(&command).is_err() {
            assert_eq!(game.snapshot(), before, "rejected {command:?} changed the game");
        }
        let violations = check_invariants(&game);
        assert!(violations.is_empty(), "after {command:?}: {violations:?}");
    }
});
