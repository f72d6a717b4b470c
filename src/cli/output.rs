//! Output formatting utilities for CLI.

use monster_hunt::simulation::GameResult;
use monster_hunt::CharacterId;
use serde::Serialize;
use std::fmt::Write as _;

fn character_index(id: CharacterId) -> usize {
    CharacterId::ALL.iter().position(|c| *c == id).unwrap_or(0)
}

/// Format a single game result as human-readable text.
pub(super) fn format_result_text(result: &GameResult) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Game Result (seed: {})", result.seed);
    match (result.winner, result.winning_character) {
        (Some(winner), Some(character)) => {
            let _ = writeln!(output, "  Winner: Player {} ({character})", u32::from(winner) + 1);
        }
        _ if result.timed_out => {
            let _ = writeln!(output, "  Winner: none (turn cap reached)");
        }
        _ => {
            let _ = writeln!(output, "  Winner: the monsters");
        }
    }
    let _ = writeln!(output, "  Turns: {}", result.turns);
    let _ = writeln!(output, "  Commands: {}", result.commands);
    let _ = writeln!(output, "  Monsters defeated: {}\n", result.monsters_defeated);

    for (seat, character) in result.characters.iter().enumerate() {
        let _ = write!(output, "  Player {}: {character}", seat + 1);
        if let Some(place) = result
            .elimination_order
            .iter()
            .position(|id| usize::from(*id) == seat)
        {
            let _ = write!(output, " [eliminated {}]", ordinal(place + 1));
        }
        output.push('\n');
    }

    output
}

fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Aggregated statistics over many simulated games.
#[derive(Debug, Default)]
pub(super) struct SimStats {
    /// Total games played.
    pub(super) games_played: u64,
    /// Games that failed to run.
    pub(super) errors: u64,
    /// Win count per seat.
    pub(super) wins: Vec<u64>,
    /// Games won by each character, in roster order.
    character_wins: [u64; 6],
    /// Games each character took part in, in roster order.
    character_games: [u64; 6],
    /// Games where every player fell.
    pub(super) wipes: u64,
    /// Games stopped at the turn cap.
    pub(super) timeouts: u64,
    /// Total turns across all games.
    total_turns: u64,
    /// Total monsters defeated across all games.
    total_monsters: u64,
}

impl SimStats {
    /// Create new stats for n seats.
    pub(super) fn new(num_players: usize) -> Self {
        Self {
            wins: vec![0; num_players],
            ..Self::default()
        }
    }

    /// Add a game result to the stats.
    pub(super) fn add_result(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.total_turns += u64::from(result.turns);
        self.total_monsters += result.monsters_defeated as u64;
        for character in &result.characters {
            self.character_games[character_index(*character)] += 1;
        }

        match (result.winner, result.winning_character) {
            (Some(winner), Some(character)) => {
                if let Some(count) = self.wins.get_mut(usize::from(winner)) {
                    *count += 1;
                }
                self.character_wins[character_index(character)] += 1;
            }
            _ if result.timed_out => self.timeouts += 1,
            _ => self.wipes += 1,
        }
    }

    /// Record a game that failed to run.
    pub(super) fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Merge another stats object into this one.
    pub(super) fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.errors += other.errors;
        for (a, b) in self.wins.iter_mut().zip(&other.wins) {
            *a += b;
        }
        for i in 0..CharacterId::ALL.len() {
            self.character_wins[i] += other.character_wins[i];
            self.character_games[i] += other.character_games[i];
        }
        self.wipes += other.wipes;
        self.timeouts += other.timeouts;
        self.total_turns += other.total_turns;
        self.total_monsters += other.total_monsters;
    }

    #[allow(clippy::cast_precision_loss)]
    fn ratio(part: u64, whole: u64) -> f64 {
        if whole == 0 {
            return 0.0;
        }
        part as f64 / whole as f64
    }

    /// Win rate for a seat (0.0-1.0).
    pub(super) fn win_rate(&self, seat: usize) -> f64 {
        Self::ratio(self.wins.get(seat).copied().unwrap_or(0), self.games_played)
    }

    /// Win rate for a character over the games it played (0.0-1.0).
    pub(super) fn character_win_rate(&self, id: CharacterId) -> f64 {
        let i = character_index(id);
        Self::ratio(self.character_wins[i], self.character_games[i])
    }

    /// Get average game length.
    pub(super) fn avg_turns(&self) -> f64 {
        Self::ratio(self.total_turns, self.games_played)
    }

    /// Get average monsters defeated per game.
    pub(super) fn avg_monsters(&self) -> f64 {
        Self::ratio(self.total_monsters, self.games_played)
    }
}

/// JSON-serializable simulation result.
#[derive(Debug, Serialize)]
pub(super) struct JsonSimResult {
    /// Total games played.
    games_played: u64,
    /// Games that failed to run.
    errors: u64,
    /// Per-seat statistics.
    seats: Vec<JsonSeat>,
    /// Per-character statistics.
    characters: Vec<JsonCharacter>,
    /// Games where every player fell.
    wipes: u64,
    /// Games stopped at the turn cap.
    timeouts: u64,
    /// Average game length in turns.
    avg_turns: f64,
    /// Average monsters defeated per game.
    avg_monsters_defeated: f64,
}

/// JSON-serializable per-seat stats.
#[derive(Debug, Serialize)]
struct JsonSeat {
    /// Seat (1-based).
    seat: usize,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
}

/// JSON-serializable per-character stats.
#[derive(Debug, Serialize)]
struct JsonCharacter {
    /// Character name.
    character: CharacterId,
    /// Games played.
    games: u64,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
}

impl JsonSimResult {
    /// Create from stats.
    pub(super) fn from_stats(stats: &SimStats) -> Self {
        let seats = (0..stats.wins.len())
            .map(|i| JsonSeat {
                seat: i + 1,
                wins: stats.wins[i],
                win_rate: stats.win_rate(i),
            })
            .collect();
        let characters = CharacterId::ALL
            .iter()
            .enumerate()
            .map(|(i, &id)| JsonCharacter {
                character: id,
                games: stats.character_games[i],
                wins: stats.character_wins[i],
                win_rate: stats.character_win_rate(id),
            })
            .collect();

        Self {
            games_played: stats.games_played,
            errors: stats.errors,
            seats,
            characters,
            wipes: stats.wipes,
            timeouts: stats.timeouts,
            avg_turns: stats.avg_turns(),
            avg_monsters_defeated: stats.avg_monsters(),
        }
    }
}

/// Format simulation stats as human-readable text.
pub(super) fn format_sim_text(stats: &SimStats) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Simulation Results ({} games)", stats.games_played);
    output.push_str("========================================\n\n");

    output.push_str("Win Rates by Seat:\n");
    for (i, wins) in stats.wins.iter().enumerate() {
        let _ = writeln!(
            output,
            "  Player {}: {:.1}% ({wins} wins)",
            i + 1,
            stats.win_rate(i) * 100.0
        );
    }

    output.push_str("\nWin Rates by Character:\n");
    for (i, id) in CharacterId::ALL.iter().enumerate() {
        if stats.character_games[i] == 0 {
            continue;
        }
        let _ = writeln!(
            output,
            "  {id:<8} {:.1}% ({} of {} games)",
            stats.character_win_rate(*id) * 100.0,
            stats.character_wins[i],
            stats.character_games[i]
        );
    }

    let _ = writeln!(
        output,
        "\nMonsters won: {} ({:.1}%)",
        stats.wipes,
        SimStats::ratio(stats.wipes, stats.games_played) * 100.0
    );
    let _ = writeln!(output, "Turn cap reached: {}", stats.timeouts);
    if stats.errors > 0 {
        let _ = writeln!(output, "Failed games: {}", stats.errors);
    }
    let _ = writeln!(output, "Average Game Length: {:.0} turns", stats.avg_turns());
    let _ = writeln!(output, "Average Monsters Defeated: {:.1}", stats.avg_monsters());

    output
}

/// Format simulation stats as CSV.
pub(super) fn format_sim_csv(stats: &SimStats) -> String {
    let mut output = String::from("kind,name,games,wins,win_rate\n");
    for (i, wins) in stats.wins.iter().enumerate() {
        let _ = writeln!(
            output,
            "seat,{},{},{wins},{:.4}",
            i + 1,
            stats.games_played,
            stats.win_rate(i)
        );
    }
    for (i, id) in CharacterId::ALL.iter().enumerate() {
        let _ = writeln!(
            output,
            "character,{id},{},{},{:.4}",
            stats.character_games[i],
            stats.character_wins[i],
            stats.character_win_rate(*id)
        );
    }
    let _ = writeln!(
        output,
        "outcome,monsters,{},{},{:.4}",
        stats.games_played,
        stats.wipes,
        SimStats::ratio(stats.wipes, stats.games_played)
    );
    output
}
