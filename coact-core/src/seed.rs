//! Deterministic seed spawning for reproducible resets
//!
//! A [`SeedSequence`] hands out independent child streams on demand. Two
//! sequences built from the same entropy that spawn in the same order
//! produce bit-identical generators, which is what makes whole trajectories
//! replayable from a single `u64` seed.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// A spawnable source of reproducible random streams
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSequence {
    entropy: u64,
    spawn_key: Vec<u64>,
    children_spawned: u64,
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl SeedSequence {
    /// Create a root sequence from user-supplied entropy
    #[must_use]
    pub fn new(entropy: u64) -> Self {
        Self {
            entropy,
            spawn_key: Vec::new(),
            children_spawned: 0,
        }
    }

    /// Spawn an independent child sequence
    ///
    /// Children are keyed by spawn order, so sibling streams never overlap
    /// and re-running the same spawn pattern reproduces the same children.
    pub fn spawn(&mut self) -> SeedSequence {
        let mut key = self.spawn_key.clone();
        key.push(self.children_spawned);
        self.children_spawned += 1;
        SeedSequence {
            entropy: self.entropy,
            spawn_key: key,
            children_spawned: 0,
        }
    }

    /// Expand this sequence into 32 bytes of generator state
    #[must_use]
    pub fn generate_state(&self) -> [u8; 32] {
        let mut mix = self.entropy ^ 0xD1B5_4A32_D192_ED03;
        for k in &self.spawn_key {
            let mut folded = mix ^ k.wrapping_mul(0x9E37_79B9_7F4A_7C15);
            mix = splitmix64(&mut folded);
        }
        let mut out = [0u8; 32];
        for chunk in out.chunks_exact_mut(8) {
            chunk.copy_from_slice(&splitmix64(&mut mix).to_le_bytes());
        }
        out
    }

    /// Build a generator seeded from this sequence
    #[must_use]
    pub fn rng(&self) -> StdRng {
        StdRng::from_seed(self.generate_state())
    }

    /// Spawn a child and build its generator in one call
    pub fn spawn_rng(&mut self) -> StdRng {
        self.spawn().rng()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_entropy_same_children() {
        let mut a = SeedSequence::new(42);
        let mut b = SeedSequence::new(42);
        for _ in 0..5 {
            assert_eq!(a.spawn(), b.spawn());
        }
    }

    #[test]
    fn siblings_diverge() {
        let mut root = SeedSequence::new(7);
        let c0 = root.spawn();
        let c1 = root.spawn();
        assert_ne!(c0.generate_state(), c1.generate_state());

        let mut r0 = c0.rng();
        let mut r1 = c1.rng();
        let draws0: Vec<u64> = (0..4).map(|_| r0.gen()).collect();
        let draws1: Vec<u64> = (0..4).map(|_| r1.gen()).collect();
        assert_ne!(draws0, draws1);
    }

    #[test]
    fn nested_spawns_reproducible() {
        let mut a = SeedSequence::new(123).spawn();
        let mut b = SeedSequence::new(123).spawn();
        assert_eq!(a.spawn().generate_state(), b.spawn().generate_state());
    }
}
