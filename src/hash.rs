//! Lattice hashing.
//!
//! Every pseudo-random decision in the kernels comes from hashing the seed
//! with primed lattice coordinates. The constants must stay bit-for-bit
//! stable: changing any of them changes every generated value.

use crate::backend::SimdI32;

/// Axis primes. Lattice coordinates are multiplied by these before hashing.
pub mod primes {
    pub const X: i32 = 501_125_321;
    pub const Y: i32 = 1_136_930_381;
    pub const Z: i32 = 1_720_413_743;
    pub const W: i32 = 1_066_037_191;
}

const MULTIPLIER: i32 = 0x27d4_eb2d;

/// Mixes `seed` with the primed coordinates, without the final avalanche.
///
/// The high bits are well distributed; the low bits are weak. Cellular noise
/// uses this and slices its feature-point offsets out of the whole word.
#[inline(always)]
pub fn hash_primes_hb<I: SimdI32, const D: usize>(seed: I, coords: [I; D]) -> I {
    let combined = coords.into_iter().fold(I::splat(0), |acc, c| acc ^ c);
    (seed ^ combined) * I::splat(MULTIPLIER)
}

/// `hash = (seed ^ (c0 ^ c1 ^ ...)) * 0x27d4eb2d; hash ^ (hash >> 15)`.
///
/// The shift is arithmetic.
#[inline(always)]
pub fn hash_primes<I: SimdI32, const D: usize>(seed: I, coords: [I; D]) -> I {
    let hash = hash_primes_hb(seed, coords);
    hash ^ (hash >> 15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::portable::PI32;
    use crate::backend::scalar::ScalarI32;

    fn reference(seed: i32, coords: &[i32]) -> i32 {
        let mut hash = seed ^ coords.iter().fold(0, |acc, c| acc ^ c);
        hash = hash.wrapping_mul(0x27d4eb2d);
        hash ^ (hash >> 15)
    }

    #[test]
    fn zero_seed_and_origin_hash_to_zero() {
        let h = hash_primes(ScalarI32(0), [ScalarI32(0), ScalarI32(0)]);
        assert_eq!(h.0, 0);
    }

    #[test]
    fn matches_scalar_reference() {
        let x = 7i32.wrapping_mul(primes::X);
        let y = (-3i32).wrapping_mul(primes::Y);
        let z = 11i32.wrapping_mul(primes::Z);
        let h = hash_primes(ScalarI32(1337), [ScalarI32(x), ScalarI32(y), ScalarI32(z)]);
        assert_eq!(h.0, reference(1337, &[x, y, z]));
    }

    #[test]
    fn lanes_hash_independently() {
        let xs = PI32::<4>([0, primes::X, primes::X.wrapping_mul(2), -primes::X]);
        let ys = PI32::<4>::splat(primes::Y);
        let h = hash_primes(PI32::<4>::splat(42), [xs, ys]);
        for lane in 0..4 {
            assert_eq!(h.0[lane], reference(42, &[xs.0[lane], primes::Y]));
        }
    }

    #[test]
    fn high_bit_variant_skips_avalanche() {
        let hb = hash_primes_hb(ScalarI32(9), [ScalarI32(primes::X), ScalarI32(primes::Y)]);
        let expected = (9 ^ primes::X ^ primes::Y).wrapping_mul(0x27d4eb2d);
        assert_eq!(hb.0, expected);
    }
}
