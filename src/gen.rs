//! Batch drivers.
//!
//! Every driver walks its output in whole lane groups of `B::LANES` values.
//! The last group is always evaluated at full width even when fewer values
//! remain; only the valid lanes are written back and folded into the
//! returned [`OutputMinMax`].
//!
//! Arguments are validated up front. On error nothing is computed and the
//! destination is left untouched.

use crate::backend::{Backend, SimdF32, SimdI32, MAX_LANES};
use crate::error::GenError;
use crate::generators::{Gen2D, Gen3D, Gen4D};
use crate::math::sin_cos;
use core::f64::consts::TAU;
use log::{trace, warn};

const AXES: [char; 4] = ['x', 'y', 'z', 'w'];

// ============================================================================
// OutputMinMax
// ============================================================================

/// Smallest and largest value written by one batch call.
///
/// Starts at `(+∞, -∞)`, so a call that writes nothing returns the
/// sentinels unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputMinMax {
    pub min: f32,
    pub max: f32,
}

impl Default for OutputMinMax {
    fn default() -> Self {
        Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
        }
    }
}

impl OutputMinMax {
    /// Folds one value in.
    #[inline]
    pub fn add(&mut self, v: f32) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    /// Combined range of two results.
    pub fn merge(self, other: OutputMinMax) -> OutputMinMax {
        OutputMinMax {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Per-lane running min/max, reduced once at the end of a call.
struct LaneMinMax<F> {
    min: F,
    max: F,
}

impl<F: SimdF32> LaneMinMax<F> {
    fn new() -> Self {
        Self {
            min: F::splat(f32::INFINITY),
            max: F::splat(f32::NEG_INFINITY),
        }
    }

    #[inline(always)]
    fn push(&mut self, v: F) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    fn reduce(self) -> OutputMinMax {
        OutputMinMax {
            min: self.min.reduce_min(),
            max: self.max.reduce_max(),
        }
    }
}

/// Writes the final lane group: whole when it fits, otherwise through a
/// stack scratch so only `out.len() - index` lanes reach the destination.
#[inline(always)]
fn finish<F: SimdF32>(mut lanes: LaneMinMax<F>, last: F, out: &mut [f32], index: usize) -> OutputMinMax {
    let remaining = out.len() - index;
    if remaining == F::LANES {
        last.store_at(out, index);
        lanes.push(last);
        return lanes.reduce();
    }

    let mut scratch = [0.0f32; MAX_LANES];
    last.store(&mut scratch);
    let mut tail = OutputMinMax::default();
    for (dst, &v) in out[index..].iter_mut().zip(&scratch[..remaining]) {
        *dst = v;
        tail.add(v);
    }
    lanes.reduce().merge(tail)
}

// ============================================================================
// Validation
// ============================================================================

fn rejected(driver: &str, err: GenError) -> GenError {
    warn!("{} rejected: {}", driver, err);
    err
}

/// Number of grid points, checking every axis and that `start + size` stays
/// within `i32`. The walk counts `0..size` per axis plus up to one lane
/// group of overrun, so `size + MAX_LANES` must fit as well.
fn grid_len<const D: usize>(start: [i32; D], size: [i32; D]) -> Result<usize, GenError> {
    let mut total = 1usize;
    for axis in 0..D {
        if size[axis] < 0 {
            return Err(GenError::InvalidSize {
                axis: AXES[axis],
                size: size[axis],
            });
        }
        start[axis]
            .checked_add(size[axis])
            .ok_or(GenError::SizeOverflow)?;
        size[axis]
            .checked_add(MAX_LANES as i32)
            .ok_or(GenError::SizeOverflow)?;
        let n = usize::try_from(size[axis]).map_err(|_| GenError::SizeOverflow)?;
        total = total.checked_mul(n).ok_or(GenError::SizeOverflow)?;
    }
    Ok(total)
}

fn check_destination(expected: usize, actual: usize) -> Result<(), GenError> {
    if expected != actual {
        return Err(GenError::DestinationSize { expected, actual });
    }
    Ok(())
}

fn check_positions<const D: usize>(coords: &[&[f32]; D], out_len: usize) -> Result<(), GenError> {
    let expected = coords[0].len();
    for axis in 1..D {
        if coords[axis].len() != expected {
            return Err(GenError::PositionArrayLength {
                axis: AXES[axis],
                expected,
                actual: coords[axis].len(),
            });
        }
    }
    check_destination(expected, out_len)
}

// ============================================================================
// Grid walk
// ============================================================================

/// Carries lanes of `idx` that ran past `max` into the next axis. `stride` is
/// how many output values one step of the next axis spans.
#[inline(always)]
fn axis_carry<I: SimdI32>(
    lanes: usize,
    initial: bool,
    idx: &mut I,
    next: &mut I,
    max: I,
    size: I,
    stride: usize,
) {
    let mut covered = if initial { stride } else { 0 };
    while covered < lanes {
        let reset = idx.cmp_gt(max);
        *next = next.masked_increment(reset);
        *idx = idx.masked_sub(size, reset);
        covered += stride;
    }
}

/// Walks a `D`-dimensional integer grid in x-fastest order, handing each
/// lane group of grid indices to `eval`.
///
/// Lanes count from 0 on every axis and `start` is added only when handing
/// them out, so the carry compare never sees a wrapped index even when
/// `start + size` sits at `i32::MAX`.
///
/// `out.len()` is the product of `size` and non-zero; sizes are validated.
#[inline(always)]
fn walk_grid<B, E, const D: usize>(
    out: &mut [f32],
    start: [i32; D],
    size: [i32; D],
    eval: E,
) -> OutputMinMax
where
    B: Backend,
    E: Fn([B::I32; D]) -> B::F32,
{
    let lanes = B::LANES;
    let total = out.len();

    let mut idx = [B::I32::splat(0); D];
    idx[0] = B::I32::incremented();
    let max = size.map(|s| B::I32::splat(s - 1));
    let size_v = size.map(B::I32::splat);
    let start_v = start.map(B::I32::splat);
    // Overrun lanes past the end may wrap here; they are never written.
    let at = |idx: &[B::I32; D]| -> [B::I32; D] { core::array::from_fn(|a| idx[a] + start_v[a]) };

    // Output values spanned by one step of the axis above `a`.
    let mut strides = [1usize; D];
    let mut span = 1usize;
    for (stride, &s) in strides.iter_mut().zip(&size) {
        span *= s as usize;
        *stride = span;
    }

    let carry = |idx: &mut [B::I32; D], initial: bool| {
        for a in 0..D - 1 {
            let (lo, hi) = idx.split_at_mut(a + 1);
            axis_carry(lanes, initial, &mut lo[a], &mut hi[0], max[a], size_v[a], strides[a]);
        }
    };

    carry(&mut idx, true);

    let step = B::I32::splat(lanes as i32);
    let mut acc = LaneMinMax::new();
    let mut index = 0;
    while index + lanes < total {
        let v = eval(at(&idx));
        v.store_at(out, index);
        acc.push(v);

        index += lanes;
        idx[0] = idx[0] + step;
        carry(&mut idx, false);
    }

    finish(acc, eval(at(&idx)), out, index)
}

/// Loads a lane group of coordinates at `index`, zero padding past the end.
#[inline(always)]
fn load_padded<F: SimdF32>(src: &[f32], index: usize) -> F {
    if index + F::LANES <= src.len() {
        return F::load_at(src, index);
    }
    let mut scratch = [0.0f32; MAX_LANES];
    let tail = &src[index..];
    scratch[..tail.len()].copy_from_slice(tail);
    F::load(&scratch)
}

#[inline(always)]
fn walk_positions<B, E, const D: usize>(
    out: &mut [f32],
    coords: [&[f32]; D],
    offset: [f32; D],
    eval: E,
) -> OutputMinMax
where
    B: Backend,
    E: Fn([B::F32; D]) -> B::F32,
{
    let lanes = B::LANES;
    let total = out.len();
    let offset = offset.map(B::F32::splat);
    let load = |index: usize| {
        let mut pos = offset;
        for (p, src) in pos.iter_mut().zip(coords) {
            *p = *p + load_padded::<B::F32>(src, index);
        }
        pos
    };

    let mut acc = LaneMinMax::new();
    let mut index = 0;
    while index + lanes < total {
        let v = eval(load(index));
        v.store_at(out, index);
        acc.push(v);
        index += lanes;
    }

    finish(acc, eval(load(index)), out, index)
}

// ============================================================================
// Uniform grid
// ============================================================================

/// Fills `out` with `size[0] * size[1]` samples, x fastest, at
/// `(start + i) * frequency`.
pub fn gen_uniform_grid_2d<B: Backend, G: Gen2D>(
    gen: &G,
    out: &mut [f32],
    start: [i32; 2],
    size: [i32; 2],
    frequency: f32,
    seed: i32,
) -> Result<OutputMinMax, GenError> {
    const DRIVER: &str = "gen_uniform_grid_2d";
    let total = grid_len(start, size).map_err(|e| rejected(DRIVER, e))?;
    check_destination(total, out.len()).map_err(|e| rejected(DRIVER, e))?;
    trace!("{}<{}>: start {:?} size {:?} seed {}", DRIVER, B::NAME, start, size, seed);
    if total == 0 {
        return Ok(OutputMinMax::default());
    }

    let freq = B::F32::splat(frequency);
    let seed = B::I32::splat(seed);
    Ok(walk_grid::<B, _, 2>(out, start, size, |[x, y]| {
        gen.gen_2d(seed, B::F32::from_i32(x) * freq, B::F32::from_i32(y) * freq)
    }))
}

/// 3D uniform grid, x fastest then y.
pub fn gen_uniform_grid_3d<B: Backend, G: Gen3D>(
    gen: &G,
    out: &mut [f32],
    start: [i32; 3],
    size: [i32; 3],
    frequency: f32,
    seed: i32,
) -> Result<OutputMinMax, GenError> {
    const DRIVER: &str = "gen_uniform_grid_3d";
    let total = grid_len(start, size).map_err(|e| rejected(DRIVER, e))?;
    check_destination(total, out.len()).map_err(|e| rejected(DRIVER, e))?;
    trace!("{}<{}>: start {:?} size {:?} seed {}", DRIVER, B::NAME, start, size, seed);
    if total == 0 {
        return Ok(OutputMinMax::default());
    }

    let freq = B::F32::splat(frequency);
    let seed = B::I32::splat(seed);
    Ok(walk_grid::<B, _, 3>(out, start, size, |[x, y, z]| {
        gen.gen_3d(
            seed,
            B::F32::from_i32(x) * freq,
            B::F32::from_i32(y) * freq,
            B::F32::from_i32(z) * freq,
        )
    }))
}

/// 4D uniform grid, x fastest then y then z.
pub fn gen_uniform_grid_4d<B: Backend, G: Gen4D>(
    gen: &G,
    out: &mut [f32],
    start: [i32; 4],
    size: [i32; 4],
    frequency: f32,
    seed: i32,
) -> Result<OutputMinMax, GenError> {
    const DRIVER: &str = "gen_uniform_grid_4d";
    let total = grid_len(start, size).map_err(|e| rejected(DRIVER, e))?;
    check_destination(total, out.len()).map_err(|e| rejected(DRIVER, e))?;
    trace!("{}<{}>: start {:?} size {:?} seed {}", DRIVER, B::NAME, start, size, seed);
    if total == 0 {
        return Ok(OutputMinMax::default());
    }

    let freq = B::F32::splat(frequency);
    let seed = B::I32::splat(seed);
    Ok(walk_grid::<B, _, 4>(out, start, size, |[x, y, z, w]| {
        gen.gen_4d(
            seed,
            B::F32::from_i32(x) * freq,
            B::F32::from_i32(y) * freq,
            B::F32::from_i32(z) * freq,
            B::F32::from_i32(w) * freq,
        )
    }))
}

// ============================================================================
// Position arrays
// ============================================================================

/// Samples at `(xs[i] + offset[0], ys[i] + offset[1])`. No frequency is
/// applied.
pub fn gen_position_array_2d<B: Backend, G: Gen2D>(
    gen: &G,
    out: &mut [f32],
    xs: &[f32],
    ys: &[f32],
    offset: [f32; 2],
    seed: i32,
) -> Result<OutputMinMax, GenError> {
    const DRIVER: &str = "gen_position_array_2d";
    check_positions(&[xs, ys], out.len()).map_err(|e| rejected(DRIVER, e))?;
    trace!("{}<{}>: {} points seed {}", DRIVER, B::NAME, out.len(), seed);
    if out.is_empty() {
        return Ok(OutputMinMax::default());
    }

    let seed = B::I32::splat(seed);
    Ok(walk_positions::<B, _, 2>(out, [xs, ys], offset, |[x, y]| {
        gen.gen_2d(seed, x, y)
    }))
}

pub fn gen_position_array_3d<B: Backend, G: Gen3D>(
    gen: &G,
    out: &mut [f32],
    xs: &[f32],
    ys: &[f32],
    zs: &[f32],
    offset: [f32; 3],
    seed: i32,
) -> Result<OutputMinMax, GenError> {
    const DRIVER: &str = "gen_position_array_3d";
    check_positions(&[xs, ys, zs], out.len()).map_err(|e| rejected(DRIVER, e))?;
    trace!("{}<{}>: {} points seed {}", DRIVER, B::NAME, out.len(), seed);
    if out.is_empty() {
        return Ok(OutputMinMax::default());
    }

    let seed = B::I32::splat(seed);
    Ok(walk_positions::<B, _, 3>(out, [xs, ys, zs], offset, |[x, y, z]| {
        gen.gen_3d(seed, x, y, z)
    }))
}

#[allow(clippy::too_many_arguments)]
pub fn gen_position_array_4d<B: Backend, G: Gen4D>(
    gen: &G,
    out: &mut [f32],
    xs: &[f32],
    ys: &[f32],
    zs: &[f32],
    ws: &[f32],
    offset: [f32; 4],
    seed: i32,
) -> Result<OutputMinMax, GenError> {
    const DRIVER: &str = "gen_position_array_4d";
    check_positions(&[xs, ys, zs, ws], out.len()).map_err(|e| rejected(DRIVER, e))?;
    trace!("{}<{}>: {} points seed {}", DRIVER, B::NAME, out.len(), seed);
    if out.is_empty() {
        return Ok(OutputMinMax::default());
    }

    let seed = B::I32::splat(seed);
    Ok(walk_positions::<B, _, 4>(
        out,
        [xs, ys, zs, ws],
        offset,
        |[x, y, z, w]| gen.gen_4d(seed, x, y, z, w),
    ))
}

// ============================================================================
// Single point
// ============================================================================

/// 1D noise is the 2D kernel along `y = 0`.
#[inline]
pub fn gen_single_1d<B: Backend, G: Gen2D>(gen: &G, x: f32, seed: i32) -> f32 {
    gen_single_2d::<B, G>(gen, x, 0.0, seed)
}

#[inline]
pub fn gen_single_2d<B: Backend, G: Gen2D>(gen: &G, x: f32, y: f32, seed: i32) -> f32 {
    gen.gen_2d(B::I32::splat(seed), B::F32::splat(x), B::F32::splat(y))
        .extract0()
}

#[inline]
pub fn gen_single_3d<B: Backend, G: Gen3D>(gen: &G, x: f32, y: f32, z: f32, seed: i32) -> f32 {
    gen.gen_3d(
        B::I32::splat(seed),
        B::F32::splat(x),
        B::F32::splat(y),
        B::F32::splat(z),
    )
    .extract0()
}

#[inline]
pub fn gen_single_4d<B: Backend, G: Gen4D>(
    gen: &G,
    x: f32,
    y: f32,
    z: f32,
    w: f32,
    seed: i32,
) -> f32 {
    gen.gen_4d(
        B::I32::splat(seed),
        B::F32::splat(x),
        B::F32::splat(y),
        B::F32::splat(z),
        B::F32::splat(w),
    )
    .extract0()
}

// ============================================================================
// Tileable
// ============================================================================

/// Fills a `size[0] x size[1]` image that wraps seamlessly on both axes.
///
/// Each axis is mapped onto a circle of radius `frequency * size / 2π`
/// and the 4D kernel is sampled on the resulting torus, so neighbouring
/// samples are as far apart as in [`gen_uniform_grid_2d`] at the same
/// frequency.
pub fn gen_tileable_2d<B: Backend, G: Gen4D>(
    gen: &G,
    out: &mut [f32],
    size: [i32; 2],
    frequency: f32,
    seed: i32,
) -> Result<OutputMinMax, GenError> {
    const DRIVER: &str = "gen_tileable_2d";
    for (axis, &s) in size.iter().enumerate() {
        if s <= 0 {
            return Err(rejected(DRIVER, GenError::InvalidSize { axis: AXES[axis], size: s }));
        }
    }
    let total = grid_len([0, 0], size).map_err(|e| rejected(DRIVER, e))?;
    check_destination(total, out.len()).map_err(|e| rejected(DRIVER, e))?;
    trace!("{}<{}>: size {:?} seed {}", DRIVER, B::NAME, size, seed);

    // Derived in f64 and rounded once, so a full turn lands on the seam.
    let radius = |s: i32| (frequency as f64 * s as f64 / TAU) as f32;
    let step = |s: i32| (TAU / s as f64) as f32;
    let x_freq = B::F32::splat(radius(size[0]));
    let y_freq = B::F32::splat(radius(size[1]));
    let x_mul = B::F32::splat(step(size[0]));
    let y_mul = B::F32::splat(step(size[1]));
    let seed = B::I32::splat(seed);

    Ok(walk_grid::<B, _, 2>(out, [0, 0], size, |[x, y]| {
        let (x_sin, x_cos) = sin_cos(B::F32::from_i32(x) * x_mul);
        let (y_sin, y_cos) = sin_cos(B::F32::from_i32(y) * y_mul);
        gen.gen_4d(seed, x_cos * x_freq, y_cos * y_freq, x_sin * x_freq, y_sin * y_freq)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Portable4, Portable8, Scalar};
    use crate::generators::{Perlin, Simplex};

    /// Records the positions a grid walk visits.
    struct Probe;

    impl Gen2D for Probe {
        fn gen_2d<F: SimdF32>(&self, _seed: F::I32, x: F, y: F) -> F {
            y * F::splat(1000.0) + x
        }
    }

    impl Gen3D for Probe {
        fn gen_3d<F: SimdF32>(&self, _seed: F::I32, x: F, y: F, z: F) -> F {
            z * F::splat(10_000.0) + y * F::splat(100.0) + x
        }
    }

    #[test_log::test]
    fn grid_visits_x_fastest_with_carry() {
        let mut out = vec![0.0; 3 * 4];
        let range =
            gen_uniform_grid_2d::<Portable8, _>(&Probe, &mut out, [5, -2], [3, 4], 1.0, 0).unwrap();
        let expected: Vec<f32> = (0..4)
            .flat_map(|y| (0..3).map(move |x| (y - 2) as f32 * 1000.0 + (x + 5) as f32))
            .collect();
        assert_eq!(out, expected);
        assert_eq!(range.min, -1995.0);
        assert_eq!(range.max, 1007.0);
    }

    #[test_log::test]
    fn narrow_axes_carry_through_three_dimensions() {
        let mut out = vec![0.0; 2 * 3 * 2];
        gen_uniform_grid_3d::<Portable8, _>(&Probe, &mut out, [0, 0, 0], [2, 3, 2], 1.0, 0).unwrap();
        let mut i = 0;
        for z in 0..2 {
            for y in 0..3 {
                for x in 0..2 {
                    assert_eq!(out[i], (z * 10_000 + y * 100 + x) as f32, "index {}", i);
                    i += 1;
                }
            }
        }
    }

    #[test_log::test]
    fn frequency_scales_positions() {
        let mut out = vec![0.0; 4];
        gen_uniform_grid_2d::<Scalar, _>(&Probe, &mut out, [0, 0], [4, 1], 0.5, 0).unwrap();
        assert_eq!(out, vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test_log::test]
    fn empty_grid_returns_sentinels() {
        let mut out: Vec<f32> = Vec::new();
        let range = gen_uniform_grid_2d::<Portable4, _>(&Simplex, &mut out, [0, 0], [0, 9], 1.0, 0).unwrap();
        assert_eq!(range, OutputMinMax::default());
    }

    #[test_log::test]
    fn position_tail_matches_single() {
        let xs: Vec<f32> = (0..11).map(|i| i as f32 * 0.31).collect();
        let ys: Vec<f32> = (0..11).map(|i| 2.0 - i as f32 * 0.17).collect();
        let mut out = vec![0.0; 11];
        let range = gen_position_array_2d::<Portable4, _>(&Perlin, &mut out, &xs, &ys, [1.0, 0.0], 77).unwrap();
        for i in 0..11 {
            let want = gen_single_2d::<Portable4, _>(&Perlin, xs[i] + 1.0, ys[i], 77);
            assert_eq!(out[i], want);
            assert!(range.min <= want && want <= range.max);
        }
    }

    #[test_log::test]
    fn single_1d_is_2d_at_y_zero() {
        let a = gen_single_1d::<Scalar, _>(&Simplex, 3.7, 12);
        let b = gen_single_2d::<Scalar, _>(&Simplex, 3.7, 0.0, 12);
        assert_eq!(a, b);
    }

    #[test_log::test]
    fn rejects_before_writing() {
        let mut out = vec![-9.0; 5];
        let err = gen_uniform_grid_2d::<Scalar, _>(&Perlin, &mut out, [0, 0], [2, 3], 1.0, 0).unwrap_err();
        assert_eq!(err, GenError::DestinationSize { expected: 6, actual: 5 });
        assert!(out.iter().all(|&v| v == -9.0));

        let err = gen_uniform_grid_2d::<Scalar, _>(&Perlin, &mut out, [0, 0], [5, -1], 1.0, 0).unwrap_err();
        assert_eq!(err, GenError::InvalidSize { axis: 'y', size: -1 });

        let err = gen_uniform_grid_2d::<Scalar, _>(&Perlin, &mut out, [i32::MAX, 0], [5, 1], 1.0, 0)
            .unwrap_err();
        assert_eq!(err, GenError::SizeOverflow);

        let err = gen_tileable_2d::<Scalar, _>(&Simplex, &mut out, [5, 0], 1.0, 0).unwrap_err();
        assert_eq!(err, GenError::InvalidSize { axis: 'y', size: 0 });
    }
}
