// strider_sim/src/prng.rs

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// The deterministic pseudo-random number generator for one scenario run.
pub struct SimulationRng(pub ChaCha8Rng);

impl SimulationRng {
    /// Seeded runs repeat exactly; unseeded runs draw entropy from the OS.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        SimulationRng(rng)
    }
}
