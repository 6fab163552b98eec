//! Procedural noise patterns injected into the flow every frame.
//!
//! Every texel gets a random phase byte once. Pattern `k` of `K` thresholds
//! `(phase + k * 256 / K) mod 255` at 127, so cycling through the bank by
//! frame number makes each texel blink on and off with its own phase. The
//! result is hard black/white noise whose features decorrelate slowly over
//! time, which is what the advection needs to smear into streaks.

use crate::config::IbfvConfig;
use crate::error::IbfvError;
use crate::prng::Xorshift64;

/// Phase values below this map to black, the rest to white.
const THRESHOLD: usize = 127;

/// One square RGBA8 noise tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    size: usize,
    rgba: Vec<u8>,
}

impl Pattern {
    #[cfg(test)]
    pub(crate) fn from_rgba(size: usize, rgba: Vec<u8>) -> Self {
        assert_eq!(rgba.len(), size * size * 4);
        Self { size, rgba }
    }

    /// Side length in texels.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Row-major RGBA8 texel data, `size * size * 4` bytes.
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// RGBA of the texel at column `x`, row `y`.
    pub fn texel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.size + x) * 4;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }
}

/// The immutable set of noise patterns built once at startup.
#[derive(Debug, Clone)]
pub struct PatternBank {
    patterns: Vec<Pattern>,
}

impl PatternBank {
    /// Generates `num_patterns` tiles of `pattern_res × pattern_res` texels.
    ///
    /// The phase table is drawn from `rng`, so a seeded generator yields a
    /// reproducible bank. Every texel's alpha is `alpha_byte`.
    pub fn build(
        pattern_res: usize,
        num_patterns: usize,
        alpha_byte: u8,
        rng: &mut Xorshift64,
    ) -> Result<Self, IbfvError> {
        if pattern_res == 0 || num_patterns == 0 {
            return Err(IbfvError::InvalidDimensions);
        }
        let texels = pattern_res
            .checked_mul(pattern_res)
            .ok_or(IbfvError::InvalidDimensions)?;

        let lut: [u8; 256] = std::array::from_fn(|v| if v < THRESHOLD { 0 } else { 255 });
        let phase: Vec<usize> = (0..texels).map(|_| usize::from(rng.next_byte())).collect();

        let patterns = (0..num_patterns)
            .map(|k| {
                let t = k * 256 / num_patterns;
                let rgba = phase
                    .iter()
                    .flat_map(|&p| {
                        let v = lut[(t + p) % 255];
                        [v, v, v, alpha_byte]
                    })
                    .collect();
                Pattern {
                    size: pattern_res,
                    rgba,
                }
            })
            .collect();

        Ok(Self { patterns })
    }

    /// Builds the bank described by `config`.
    pub fn from_config(config: &IbfvConfig, rng: &mut Xorshift64) -> Result<Self, IbfvError> {
        Self::build(
            config.pattern_res,
            config.num_patterns,
            config.alpha_byte(),
            rng,
        )
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The pattern at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`. Indices come from [`pattern_index`],
    /// never from user input, so a bad one is a construction bug.
    pub fn get(&self, index: usize) -> &Pattern {
        assert!(
            index < self.patterns.len(),
            "pattern index {index} out of range for bank of {}",
            self.patterns.len()
        );
        &self.patterns[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }
}

/// Which pattern frame `frame` blends in: `frame mod num_patterns`.
pub fn pattern_index(frame: u64, num_patterns: usize) -> usize {
    (frame % num_patterns as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(res: usize, k: usize, seed: u64) -> PatternBank {
        PatternBank::build(res, k, 31, &mut Xorshift64::new(seed)).unwrap()
    }

    #[test]
    fn build_produces_k_patterns_of_r_by_r() {
        let b = bank(16, 8, 1);
        assert_eq!(b.len(), 8);
        for p in b.iter() {
            assert_eq!(p.size(), 16);
            assert_eq!(p.rgba().len(), 16 * 16 * 4);
        }
    }

    #[test]
    fn alpha_is_constant_and_color_is_binary_gray() {
        let b = bank(32, 4, 2);
        for p in b.iter() {
            for px in p.rgba().chunks_exact(4) {
                assert!(px[0] == 0 || px[0] == 255, "non-binary value {}", px[0]);
                assert_eq!(px[0], px[1]);
                assert_eq!(px[1], px[2]);
                assert_eq!(px[3], 31);
            }
        }
    }

    #[test]
    fn same_seed_gives_identical_bank() {
        let a = bank(8, 4, 99);
        let b = bank(8, 4, 99);
        for i in 0..4 {
            assert_eq!(a.get(i), b.get(i));
        }
    }

    #[test]
    fn patterns_share_one_phase_table() {
        // Pattern k thresholds (phase + t_k) mod 255 with t_k = 64k for K = 4.
        // Rebuilding the phase table from the same seed predicts every texel.
        let mut rng = Xorshift64::new(5);
        let phase: Vec<usize> = (0..64).map(|_| usize::from(rng.next_byte())).collect();
        let b = bank(8, 4, 5);
        for k in 0..4 {
            let p = b.get(k);
            for (i, &ph) in phase.iter().enumerate() {
                let expected = if (ph + 64 * k) % 255 < 127 { 0 } else { 255 };
                assert_eq!(p.texel(i % 8, i / 8)[0], expected, "pattern {k}, texel {i}");
            }
        }
    }

    #[test]
    fn successive_patterns_differ() {
        let b = bank(32, 32, 3);
        assert_ne!(b.get(0), b.get(1));
        assert_ne!(b.get(0), b.get(16));
    }

    #[test]
    fn noise_has_both_black_and_white_texels() {
        let b = bank(64, 1, 11);
        let values: Vec<u8> = b.get(0).rgba().chunks_exact(4).map(|px| px[0]).collect();
        assert!(values.contains(&0));
        assert!(values.contains(&255));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn get_out_of_range_panics() {
        let b = bank(4, 2, 1);
        let _ = b.get(2);
    }

    #[test]
    fn build_rejects_zero_sizes() {
        let mut rng = Xorshift64::new(1);
        assert!(PatternBank::build(0, 4, 31, &mut rng).is_err());
        assert!(PatternBank::build(4, 0, 31, &mut rng).is_err());
    }

    #[test]
    fn from_config_uses_rounded_alpha() {
        let config = IbfvConfig {
            pattern_res: 4,
            num_patterns: 2,
            ..IbfvConfig::default()
        };
        let b = PatternBank::from_config(&config, &mut Xorshift64::new(1)).unwrap();
        assert_eq!(b.get(1).texel(3, 3)[3], 31);
    }

    #[test]
    fn pattern_index_wraps_around_bank() {
        assert_eq!(pattern_index(0, 32), 0);
        assert_eq!(pattern_index(31, 32), 31);
        assert_eq!(pattern_index(32, 32), 0);
        assert_eq!(pattern_index(70, 32), 6);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn pattern_index_is_periodic(frame in 0_u64..1_000_000, k in 1_usize..64) {
                prop_assert_eq!(pattern_index(frame, k), pattern_index(frame + k as u64, k));
                prop_assert!(pattern_index(frame, k) < k);
            }

            #[test]
            fn periodic_selection_yields_same_image(frame in 0_u64..10_000, seed: u64) {
                let b = bank(4, 8, seed);
                let n = b.len();
                prop_assert_eq!(
                    b.get(pattern_index(frame, n)),
                    b.get(pattern_index(frame + n as u64, n))
                );
            }
        }
    }
}
