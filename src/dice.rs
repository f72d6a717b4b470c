//! Dice and randomness.
//!
//! Every random decision in a game goes through the [`Dice`] trait: movement
//! rolls, combat rolls, loot draws and board placement. The production
//! implementation is [`RngDice`], a seedable `ChaCha8` stream, so a game is
//! fully reproducible from its seed. [`ScriptedDice`] replays fixed die faces
//! for scenario tests and falls back to a seeded stream for everything else.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of faces on a die.
pub const DIE_FACES: u8 = 6;

/// Source of every random decision the engine makes.
pub trait Dice {
    /// Roll one six-sided die. Always in `1..=6`.
    fn roll_die(&mut self) -> u8;

    /// Uniform index in `0..len`. Returns 0 when `len` is 0.
    fn below(&mut self, len: usize) -> usize;

    /// Roll two dice and return both faces.
    fn roll_two_dice(&mut self) -> (u8, u8) {
        let first = self.roll_die();
        let second = self.roll_die();
        (first, second)
    }

    /// Sum of two dice. Always in `2..=12`.
    fn roll_two_dice_sum(&mut self) -> u32 {
        let (a, b) = self.roll_two_dice();
        u32::from(a) + u32::from(b)
    }
}

/// Seedable dice backed by `ChaCha8Rng`.
#[derive(Debug, Clone)]
pub struct RngDice {
    rng: ChaCha8Rng,
}

impl RngDice {
    /// Deterministic dice for the given seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Dice seeded from operating system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl Default for RngDice {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Dice for RngDice {
    fn roll_die(&mut self) -> u8 {
        self.rng.gen_range(1..=DIE_FACES)
    }

    fn below(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

/// Dice that return queued faces first, then fall back to a seeded stream.
///
/// Queued faces outside `1..=6` are clamped into range so a script can never
/// produce an impossible roll.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    faces: VecDeque<u8>,
    fallback: RngDice,
}

impl ScriptedDice {
    /// Script the given faces, in order.
    #[must_use]
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
            fallback: RngDice::seeded(0),
        }
    }

    /// Number of scripted faces not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl Dice for ScriptedDice {
    fn roll_die(&mut self) -> u8 {
        match self.faces.pop_front() {
            Some(face) => face.clamp(1, DIE_FACES),
            None => self.fallback.roll_die(),
        }
    }

    fn below(&mut self, len: usize) -> usize {
        self.fallback.below(len)
    }
}
