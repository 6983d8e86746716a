use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;

/// Source of uniform randomness used by the trial loop.
///
/// Production code uses [`GameRng`]; tests can plug in a scripted source to
/// force specific shuffles.
pub trait RandomSource {
    /// Generate a random integer in range [0, max)
    fn random_range(&mut self, max: usize) -> usize;

    /// Fisher-Yates shuffle for a mutable slice
    fn shuffle<T>(&mut self, array: &mut [T]) {
        for i in (1..array.len()).rev() {
            let j = self.random_range(i + 1);
            array.swap(i, j);
        }
    }
}

/// Seeded random number generator for reproducible simulations
#[derive(Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new GameRng with an optional seed
    /// If seed is None, generates a random seed
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(random_seed);
        let rng = ChaCha8Rng::seed_from_u64(seed);
        GameRng { rng, seed }
    }

    /// Get the seed used for this RNG
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for GameRng {
    fn random_range(&mut self, max: usize) -> usize {
        self.rng.gen_range(0..max)
    }
}

/// Draw a fresh seed from the thread-local entropy source
pub fn random_seed() -> u64 {
    rand::thread_rng().gen()
}
