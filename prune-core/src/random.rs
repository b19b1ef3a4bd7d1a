//! Deterministic pseudo-random stream used for tree generation.
//!
//! The tree shape is a pure function of this stream, so the output
//! sequence for a given seed must never change.

use crate::types::Seed;
use rand::RngCore;

/// Mulberry32: a 32-bit mix-and-shift generator.
///
/// Fast and non-cryptographic. Two instances built from the same seed
/// produce bit-identical sequences.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    /// Seeds the stream with `seed` wrapped to 32 bits.
    pub fn new(seed: Seed) -> Self {
        Self { state: seed as u32 }
    }

    /// Returns the next value in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }
}

impl RngCore for SeededRandom {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.next_u32() as u64;
        let hi = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn matches_reference_sequence() {
        let mut r = SeededRandom::new(0);
        assert_eq!(r.next_f64(), 0.26642920868471265);
        assert_eq!(r.next_f64(), 0.0003297457005828619);

        let mut r = SeededRandom::new(12345);
        assert_eq!(r.next_f64(), 0.9797282677609473);
        assert_eq!(r.next_f64(), 0.3067522644996643);
        assert_eq!(r.next_f64(), 0.484205421525985);
    }

    #[test]
    fn negative_seeds_wrap_to_32_bits() {
        let mut neg = SeededRandom::new(-5);
        let mut wrapped = SeededRandom::new(4_294_967_291);
        assert_eq!(neg.next_f64(), 0.48384718922898173);
        assert_eq!(wrapped.next_f64(), 0.48384718922898173);
        for _ in 0..100 {
            assert_eq!(neg.next_u32(), wrapped.next_u32());
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = SeededRandom::new(98765);
        let mut b = SeededRandom::new(98765);
        for _ in 0..1000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn values_stay_in_unit_interval() {
        let mut r = SeededRandom::new(u32::MAX.into());
        for _ in 0..10_000 {
            let v = r.next_f64();
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn drives_rand_consumers() {
        let mut r = SeededRandom::new(7);
        let x: f32 = r.random_range(-1.0..1.0);
        assert!((-1.0..1.0).contains(&x));

        let mut buf = [0u8; 7];
        r.fill_bytes(&mut buf);
        let mut again = SeededRandom::new(7);
        let _: f32 = again.random_range(-1.0..1.0);
        let mut buf2 = [0u8; 7];
        again.fill_bytes(&mut buf2);
        assert_eq!(buf, buf2);
    }
}
