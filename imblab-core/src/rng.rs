//! Deterministic RNG hierarchy.
//!
//! A master seed generates deterministic sub-seeds for each `(dataset, stream)`
//! pair. Sub-seeds are derived via BLAKE3 hashing, so a dataset's draws do not
//! depend on which other datasets were processed before it, or in what order.

use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for a dataset and a named stream
    /// (e.g. `"synthetic"` or an undersampling factor).
    pub fn sub_seed(&self, dataset: &str, stream: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(dataset.as_bytes());
        // Separator so ("ab", "c") and ("a", "bc") differ.
        hasher.update(&[0u8]);
        hasher.update(stream.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Create a seeded StdRng for a dataset stream.
    pub fn rng_for(&self, dataset: &str, stream: &str) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(dataset, stream))
    }
}
