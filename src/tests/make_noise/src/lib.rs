//! Randomized typo generation for the engine's stress test.
//!
//! The original harness perturbed query strings with a custom biased PRNG
//! (`BiasedXORShift128`) chosen for raw throughput over a huge number of
//! trials; `rand`'s `SmallRng` gives the same property idiomatically, so
//! construction here is seeded for reproducible test runs rather than
//! reimplementing the bit-twiddling generator.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

#[derive(Clone, Copy, Debug)]
enum Typo {
    Substitute,
    Insert,
    Delete,
    Transpose,
}

const TYPOS: [Typo; 4] = [Typo::Substitute, Typo::Insert, Typo::Delete, Typo::Transpose];

/// Deterministic generator: same seed, same sequence of perturbed queries.
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    pub fn new(seed: u64) -> Self {
        NoiseGenerator {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Applies one random single-character edit to `word`. Words shorter
    /// than 2 bytes only ever get a substitution or insertion, since
    /// deletion/transposition need at least one existing byte to act on.
    pub fn perturb(&mut self, word: &str) -> String {
        let mut bytes: Vec<u8> = word.bytes().collect();
        if bytes.is_empty() {
            let c = ALPHABET[self.rng.gen_range(0..ALPHABET.len())];
            return String::from_utf8(vec![c]).unwrap();
        }

        let applicable: Vec<Typo> = TYPOS
            .iter()
            .copied()
            .filter(|t| !matches!(t, Typo::Delete | Typo::Transpose) || bytes.len() >= 2)
            .collect();
        let typo = *applicable.choose(&mut self.rng).unwrap();

        match typo {
            Typo::Substitute => {
                let i = self.rng.gen_range(0..bytes.len());
                bytes[i] = ALPHABET[self.rng.gen_range(0..ALPHABET.len())];
            }
            Typo::Insert => {
                let i = self.rng.gen_range(0..=bytes.len());
                bytes.insert(i, ALPHABET[self.rng.gen_range(0..ALPHABET.len())]);
            }
            Typo::Delete => {
                let i = self.rng.gen_range(0..bytes.len());
                bytes.remove(i);
            }
            Typo::Transpose => {
                let i = self.rng.gen_range(0..bytes.len() - 1);
                bytes.swap(i, i + 1);
            }
        }

        String::from_utf8(bytes).unwrap_or_else(|_| word.to_string())
    }

    /// Picks `count` random dictionary words and perturbs each once.
    pub fn sample_queries(&mut self, dictionary: &[String], count: usize) -> Vec<String> {
        (0..count)
            .map(|_| {
                let word = dictionary.choose(&mut self.rng).expect("dictionary is non-empty");
                self.perturb(word)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perturb_changes_single_character_words() {
        let mut gen = NoiseGenerator::new(42);
        let result = gen.perturb("cat");
        assert!(!result.is_empty());
    }

    #[test]
    fn same_seed_reproduces_same_sequence() {
        let mut a = NoiseGenerator::new(7);
        let mut b = NoiseGenerator::new(7);
        let dict = vec!["cat".to_string(), "dog".to_string(), "bird".to_string()];
        assert_eq!(a.sample_queries(&dict, 20), b.sample_queries(&dict, 20));
    }

    #[test]
    fn empty_word_still_produces_a_query() {
        let mut gen = NoiseGenerator::new(1);
        assert_eq!(gen.perturb("").len(), 1);
    }
}
