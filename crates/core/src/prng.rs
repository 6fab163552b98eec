//! Seedable random source for the noise phase table.
//!
//! Xorshift64 with the standard (13, 7, 17) shifts. Tests seed it for
//! reproducible pattern banks; the renderer seeds it from process entropy.

/// Xorshift64 deterministic PRNG. Same seed always produces the same sequence.
#[derive(Debug, Clone)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    /// Replaces a zero seed, which is a fixed point of xorshift.
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    /// Seeds from the operating system's random source, so every run
    /// gets a different phase table.
    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u64>())
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// A uniformly distributed byte taken from the high bits of the state.
    pub fn next_byte(&mut self) -> u8 {
        (self.next_u64() >> 56) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_u64_produces_known_golden_value_for_seed_42() {
        let mut rng = Xorshift64::new(42);
        assert_eq!(rng.next_u64(), 45_454_805_674);
    }

    #[test]
    fn seed_zero_does_not_stick_at_zero() {
        let mut rng = Xorshift64::new(0);
        assert_ne!(rng.next_u64(), 0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn same_seed_gives_same_bytes() {
        let mut a = Xorshift64::new(7);
        let mut b = Xorshift64::new(7);
        for i in 0..1000 {
            assert_eq!(a.next_byte(), b.next_byte(), "diverged at {i}");
        }
    }

    #[test]
    fn next_byte_covers_both_halves_of_range() {
        let mut rng = Xorshift64::new(123);
        let bytes: Vec<u8> = (0..4096).map(|_| rng.next_byte()).collect();
        assert!(bytes.iter().any(|&b| b < 127));
        assert!(bytes.iter().any(|&b| b >= 127));
    }

    #[test]
    fn entropy_seeded_generators_differ() {
        let mut a = Xorshift64::from_entropy();
        let mut b = Xorshift64::from_entropy();
        let sa: Vec<u64> = (0..4).map(|_| a.next_u64()).collect();
        let sb: Vec<u64> = (0..4).map(|_| b.next_u64()).collect();
        assert_ne!(sa, sb);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn byte_histogram_is_roughly_uniform(seed: u64) {
                let mut rng = Xorshift64::new(seed);
                let mut buckets = [0u32; 4];
                for _ in 0..8_000 {
                    buckets[usize::from(rng.next_byte() >> 6)] += 1;
                }
                for (i, &count) in buckets.iter().enumerate() {
                    prop_assert!(
                        count >= 1_000,
                        "bucket {i} has only {count} values for seed {seed}"
                    );
                }
            }
        }
    }
}
