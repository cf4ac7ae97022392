//! Dice sources for the game session.

use rand::{Rng, SeedableRng};
use rand_pcg::Lcg64Xsh32;

use crate::error::NoFaces;
use crate::round::{DiceResult, MAX_FACE, MIN_FACE};

/// Produces one die face per call, uniform over `1..=100`.
pub trait DiceRoller: Send {
    fn generate(&mut self) -> DiceResult;

    /// Restart the sequence from `seed`.
    fn reseed(&mut self, seed: u64);
}

/// PCG-backed die. Seeded runs repeat exactly.
#[derive(Clone, Debug)]
pub struct PcgDice {
    rng: Lcg64Xsh32,
}

impl PcgDice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Lcg64Xsh32::from_seed(seed_bytes(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Lcg64Xsh32::from_entropy(),
        }
    }
}

// Two little-endian copies of the seed fill the 16-byte PCG state.
fn seed_bytes(seed: u64) -> [u8; 16] {
    let mut bytes = [0u8; 16];
    bytes[0..8].copy_from_slice(&seed.to_le_bytes());
    bytes[8..16].copy_from_slice(&seed.to_le_bytes());
    bytes
}

impl DiceRoller for PcgDice {
    fn generate(&mut self) -> DiceResult {
        DiceResult::from_roll(self.rng.gen_range(MIN_FACE..=MAX_FACE))
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = Lcg64Xsh32::from_seed(seed_bytes(seed));
    }
}

/// Replays a fixed list of faces, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct FixedDice {
    faces: Vec<DiceResult>,
    index: usize,
}

impl FixedDice {
    pub fn new(faces: Vec<DiceResult>) -> Result<Self, NoFaces> {
        if faces.is_empty() {
            return Err(NoFaces);
        }
        Ok(Self { faces, index: 0 })
    }
}

impl DiceRoller for FixedDice {
    fn generate(&mut self) -> DiceResult {
        let face = self.faces[self.index % self.faces.len()];
        self.index += 1;
        face
    }

    fn reseed(&mut self, _seed: u64) {
        self.index = 0;
    }
}
