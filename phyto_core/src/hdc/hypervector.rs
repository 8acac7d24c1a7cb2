//! Packed binary hypervectors.
//!
//! Core operations:
//! - Bind (XOR): associate two vectors, self-inverse
//! - Permute: circular bit rotation for temporal position
//! - Hamming distance and bipolar similarity

use std::fmt;

use bitvec::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;

/// Dimensionality of every hypervector.
pub const HV_BITS: usize = 10_048;

/// Number of packed 64-bit words backing one hypervector.
pub const HV_WORDS: usize = HV_BITS / 64;

type Bits = BitArray<[u64; HV_WORDS], Lsb0>;

/// A 10,048-bit binary hypervector stored as 157 packed words.
#[derive(Clone, PartialEq, Eq)]
pub struct Hypervector {
    bits: Bits,
}

impl Hypervector {
    /// All-zero vector, the identity for [`Hypervector::bind`].
    pub fn zero() -> Self {
        Self {
            bits: Bits::new([0u64; HV_WORDS]),
        }
    }

    /// Uniformly random vector drawn from `rng`.
    pub fn random(rng: &mut StdRng) -> Self {
        let mut words = [0u64; HV_WORDS];
        for word in words.iter_mut() {
            *word = rng.gen();
        }
        Self {
            bits: Bits::new(words),
        }
    }

    /// XOR binding.
    #[must_use]
    pub fn bind(&self, other: &Hypervector) -> Hypervector {
        let mut out = self.clone();
        out.bind_assign(other);
        out
    }

    pub fn bind_assign(&mut self, other: &Hypervector) {
        for (dst, src) in self
            .bits
            .as_raw_mut_slice()
            .iter_mut()
            .zip(other.bits.as_raw_slice())
        {
            *dst ^= *src;
        }
    }

    /// Circular rotation by `shift` bit positions.
    #[must_use]
    pub fn permute(&self, shift: usize) -> Hypervector {
        let mut out = self.clone();
        let effective = shift % HV_BITS;
        if effective != 0 {
            out.bits.rotate_right(effective);
        }
        out
    }

    /// Number of differing bit positions.
    pub fn hamming(&self, other: &Hypervector) -> u32 {
        self.bits
            .as_raw_slice()
            .iter()
            .zip(other.bits.as_raw_slice())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    /// Bipolar cosine similarity in `[-1, 1]`; 1 = identical, 0 = orthogonal.
    pub fn similarity(&self, other: &Hypervector) -> f32 {
        1.0 - 2.0 * self.hamming(other) as f32 / HV_BITS as f32
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn bit(&self, index: usize) -> bool {
        self.bits.get(index).map(|b| *b).unwrap_or(false)
    }
}

impl Default for Hypervector {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for Hypervector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = self.bits.as_raw_slice()[0];
        f.debug_struct("Hypervector")
            .field("popcount", &self.count_ones())
            .field("head", &format_args!("{:#018x}", head))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn dimension_is_whole_words() {
        assert_eq!(HV_WORDS * 64, HV_BITS);
        assert_eq!(HV_WORDS, 157);
    }

    #[test]
    fn bind_is_self_inverse() {
        let mut rng = rng();
        let a = Hypervector::random(&mut rng);
        let b = Hypervector::random(&mut rng);
        assert_eq!(a.bind(&b).bind(&b), a);
        assert_eq!(a.bind(&a), Hypervector::zero());
    }

    #[test]
    fn random_vectors_are_near_orthogonal() {
        let mut rng = rng();
        let a = Hypervector::random(&mut rng);
        let b = Hypervector::random(&mut rng);
        assert!(a.similarity(&b).abs() < 0.1);
        assert_eq!(a.similarity(&a), 1.0);
    }

    #[test]
    fn complement_has_similarity_minus_one() {
        let mut rng = rng();
        let a = Hypervector::random(&mut rng);
        let mut ones = Hypervector::zero();
        ones.bits = Bits::new([u64::MAX; HV_WORDS]);
        assert_eq!(a.similarity(&a.bind(&ones)), -1.0);
    }

    #[test]
    fn permute_moves_bits_and_wraps() {
        let mut v = Hypervector::zero();
        v.bits.set(HV_BITS - 1, true);
        let shifted = v.permute(1);
        assert!(shifted.bit(0));
        assert_eq!(shifted.count_ones(), 1);
        assert_eq!(v.permute(HV_BITS), v);
    }

    #[test]
    fn permuted_vector_is_dissimilar() {
        let mut rng = rng();
        let a = Hypervector::random(&mut rng);
        assert!(a.similarity(&a.permute(1)).abs() < 0.1);
        assert_eq!(a.permute(3).hamming(&a.permute(1).permute(2)), 0);
    }
}
