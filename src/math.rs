//! Interpolation curves and polynomial approximations of transcendental
//! functions, written against [`SimdF32`] only.
//!
//! Accuracy of the approximations (f32, inputs in the stated ranges):
//!
//! | fn      | range          | max error      |
//! |---------|----------------|----------------|
//! | sin/cos | `|x| < 8192`   | ~2e-7 absolute |
//! | exp     | `[-87.3, 88.3]`| ~2 ulp         |
//! | ln      | `(0, ∞)`       | ~2 ulp         |

use crate::backend::{SimdF32, SimdI32};
use core::f32::consts::{FRAC_2_PI, LOG2_E, SQRT_2};

// ============================================================================
// Interpolation
// ============================================================================

/// `a + t * (b - a)`.
#[inline(always)]
pub fn lerp<F: SimdF32>(a: F, b: F, t: F) -> F {
    t.mul_add(b - a, a)
}

/// Identity curve, for symmetry with the smoothed variants.
#[inline(always)]
pub fn interp_linear<F: SimdF32>(t: F) -> F {
    t
}

/// `t²(3 - 2t)`.
#[inline(always)]
pub fn interp_hermite<F: SimdF32>(t: F) -> F {
    t * t * t.neg_mul_add(F::splat(2.0), F::splat(3.0))
}

/// `t³(t(6t - 15) + 10)`.
#[inline(always)]
pub fn interp_quintic<F: SimdF32>(t: F) -> F {
    let inner = t.mul_add(F::splat(6.0), F::splat(-15.0));
    t * t * t * t.mul_add(inner, F::splat(10.0))
}

// ============================================================================
// Trigonometry
// ============================================================================

// π/2 in three parts; the first two have short mantissas so `j·part` is exact.
const PIO2_1: f32 = 1.570_312_5;
const PIO2_2: f32 = 4.837_513e-4;
const PIO2_3: f32 = 7.549_79e-8;

/// `(sin x, cos x)` from one shared range reduction.
///
/// `x` is reduced to `r ∈ [-π/4, π/4]` with quadrant `j`; the two minimax
/// polynomials are then swapped and negated by the quadrant bits.
#[inline(always)]
pub fn sin_cos<F: SimdF32>(x: F) -> (F, F) {
    let j = (x * F::splat(FRAC_2_PI)).round();
    let r = j.neg_mul_add(F::splat(PIO2_1), x);
    let r = j.neg_mul_add(F::splat(PIO2_2), r);
    let r = j.neg_mul_add(F::splat(PIO2_3), r);
    let q = j.to_i32_round();

    let r2 = r * r;

    let s = r2.mul_add(F::splat(-1.951_529_6e-4), F::splat(8.332_161e-3));
    let s = r2.mul_add(s, F::splat(-1.666_665_5e-1));
    let s = (r2 * r).mul_add(s, r);

    let c = r2.mul_add(F::splat(2.443_315_7e-5), F::splat(-1.388_731_6e-3));
    let c = r2.mul_add(c, F::splat(4.166_664_6e-2));
    let c = (r2 * r2).mul_add(c, r2.neg_mul_add(F::splat(0.5), F::splat(1.0)));

    let one = F::I32::splat(1);
    let two = F::I32::splat(2);
    let swap = (q & one).cmp_eq(one);
    let sin = F::select(swap, c, s);
    let cos = F::select(swap, s, c);

    let sin_sign = (q & two) << 30;
    let cos_sign = ((q + one) & two) << 30;
    (sin ^ F::from_bits(sin_sign), cos ^ F::from_bits(cos_sign))
}

/// `sin x`.
#[inline(always)]
pub fn sin<F: SimdF32>(x: F) -> F {
    sin_cos(x).0
}

/// `cos x`.
#[inline(always)]
pub fn cos<F: SimdF32>(x: F) -> F {
    sin_cos(x).1
}

// ============================================================================
// Exp / Log
// ============================================================================

const LN2_HI: f32 = 0.693_359_4;
const LN2_LO: f32 = -2.121_944_4e-4;

/// `e^x` as `2^n · p(r)`, `r = x - n·ln 2`. Inputs are clamped to the range
/// where the result is a normal finite float.
#[inline(always)]
pub fn exp<F: SimdF32>(x: F) -> F {
    let x = x.max(F::splat(-87.336_54)).min(F::splat(88.376_2));
    let n = (x * F::splat(LOG2_E)).round();
    let r = n.neg_mul_add(F::splat(LN2_HI), x);
    let r = n.neg_mul_add(F::splat(LN2_LO), r);

    let p = r.mul_add(F::splat(1.987_569_1e-4), F::splat(1.398_199_9e-3));
    let p = r.mul_add(p, F::splat(8.333_452e-3));
    let p = r.mul_add(p, F::splat(4.166_579_6e-2));
    let p = r.mul_add(p, F::splat(1.666_666_5e-1));
    let p = r.mul_add(p, F::splat(5.000_000_1e-1));
    let y = (r * r).mul_add(p, r + F::splat(1.0));

    let pow2n = F::from_bits((n.to_i32_round() + F::I32::splat(127)) << 23);
    y * pow2n
}

/// Natural logarithm.
///
/// `ln 0 = -∞`, `ln ∞ = ∞`, negative inputs and NaN give NaN.
#[inline(always)]
pub fn ln<F: SimdF32>(x: F) -> F {
    let bits = x.to_bits();
    let exponent = bits.shr_logical(23) - F::I32::splat(127);
    let mantissa =
        F::from_bits((bits & F::I32::splat(0x007F_FFFF)) | F::I32::splat(0x3F80_0000));

    // Centre the mantissa on 1: m ∈ [√½, √2).
    let high = mantissa.cmp_ge(F::splat(SQRT_2));
    let mantissa = mantissa.masked_mul(F::splat(0.5), high);
    let e = F::from_i32(exponent.masked_increment(high));

    let f = mantissa - F::splat(1.0);
    let z = f * f;

    let p = f.mul_add(F::splat(7.037_683_6e-2), F::splat(-1.151_461_e-1));
    let p = f.mul_add(p, F::splat(1.167_699_9e-1));
    let p = f.mul_add(p, F::splat(-1.242_014_1e-1));
    let p = f.mul_add(p, F::splat(1.424_932_3e-1));
    let p = f.mul_add(p, F::splat(-1.666_805_8e-1));
    let p = f.mul_add(p, F::splat(2.000_071_5e-1));
    let p = f.mul_add(p, F::splat(-2.499_999_4e-1));
    let p = f.mul_add(p, F::splat(3.333_333_1e-1));

    let y = p * f * z;
    let y = e.mul_add(F::splat(LN2_LO), y);
    let y = z.neg_mul_add(F::splat(0.5), y);
    let result = e.mul_add(F::splat(LN2_HI), f + y);

    let zero = F::splat(0.0);
    let result = F::select(x.cmp_eq(zero), F::splat(f32::NEG_INFINITY), result);
    let result = F::select(x.cmp_eq(F::splat(f32::INFINITY)), x, result);
    // x < 0 or NaN
    F::select(x.cmp_ge(zero), result, F::splat(f32::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::portable::PF32;
    use crate::backend::scalar::ScalarF32;

    fn s(v: f32) -> ScalarF32 {
        ScalarF32(v)
    }

    #[test]
    fn interpolation_endpoints() {
        for f in [interp_hermite::<ScalarF32>, interp_quintic::<ScalarF32>] {
            assert_eq!(f(s(0.0)).0, 0.0);
            assert_eq!(f(s(1.0)).0, 1.0);
            assert!((f(s(0.5)).0 - 0.5).abs() < 1e-6);
        }
        assert_eq!(lerp(s(2.0), s(6.0), s(0.25)).0, 3.0);
        assert_eq!(interp_linear(s(0.3)).0, 0.3);
    }

    #[test]
    fn sin_cos_tracks_std() {
        let mut x = -50.0f32;
        while x < 50.0 {
            let (sv, cv) = sin_cos(s(x));
            assert!((sv.0 - x.sin()).abs() < 3e-6, "sin({}) = {} vs {}", x, sv.0, x.sin());
            assert!((cv.0 - x.cos()).abs() < 3e-6, "cos({}) = {} vs {}", x, cv.0, x.cos());
            x += 0.0137;
        }
    }

    #[test]
    fn sin_cos_is_lane_independent() {
        let xs = PF32::<8>([0.0, 0.5, 1.0, 1.6, 3.2, -2.0, 6.28, 100.0]);
        let (sv, cv) = sin_cos(xs);
        for lane in 0..8 {
            let (ss, cs) = sin_cos(s(xs.0[lane]));
            assert_eq!(sv.0[lane], ss.0);
            assert_eq!(cv.0[lane], cs.0);
        }
    }

    #[test]
    fn exp_tracks_std() {
        let mut x = -80.0f32;
        while x < 80.0 {
            let got = exp(s(x)).0;
            let want = x.exp();
            assert!(((got - want) / want).abs() < 1e-6, "exp({}) = {} vs {}", x, got, want);
            x += 0.173;
        }
        assert!(exp(s(1000.0)).0.is_finite());
        assert!(exp(s(-1000.0)).0 > 0.0);
    }

    #[test]
    fn ln_tracks_std() {
        let mut x = 1e-30f32;
        while x < 1e30 {
            let got = ln(s(x)).0;
            let want = x.ln();
            assert!((got - want).abs() <= 1e-6 * want.abs().max(1.0), "ln({}) = {} vs {}", x, got, want);
            x *= 1.37;
        }
    }

    #[test]
    fn ln_edge_cases() {
        assert_eq!(ln(s(1.0)).0, 0.0);
        assert_eq!(ln(s(0.0)).0, f32::NEG_INFINITY);
        assert_eq!(ln(s(f32::INFINITY)).0, f32::INFINITY);
        assert!(ln(s(-1.0)).0.is_nan());
        assert!(ln(s(f32::NAN)).0.is_nan());
    }
}
