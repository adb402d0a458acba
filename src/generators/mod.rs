//! Noise kernels.
//!
//! A kernel is a stateless value type evaluated per lane group: position
//! vectors plus a broadcast seed in, one float vector out. Kernels are
//! written against [`SimdF32`] alone, so the same code runs at every width.

use crate::backend::SimdF32;

mod cellular;
mod open_simplex2;
mod perlin;
mod simplex;

pub use cellular::{Cellular, CellularDistance, MAX_VALUE_INDEX};
pub use open_simplex2::OpenSimplex2;
pub use perlin::Perlin;
pub use simplex::Simplex;

/// A kernel with a 2D form.
pub trait Gen2D: Send + Sync {
    fn gen_2d<F: SimdF32>(&self, seed: F::I32, x: F, y: F) -> F;
}

/// A kernel with a 3D form.
pub trait Gen3D: Send + Sync {
    fn gen_3d<F: SimdF32>(&self, seed: F::I32, x: F, y: F, z: F) -> F;
}

/// A kernel with a 4D form.
pub trait Gen4D: Send + Sync {
    fn gen_4d<F: SimdF32>(&self, seed: F::I32, x: F, y: F, z: F, w: F) -> F;
}

/// Raises `max(t, 0)` to the fourth power.
#[inline(always)]
pub(crate) fn falloff<F: SimdF32>(t: F) -> F {
    let t = t.max(F::splat(0.0));
    let t = t * t;
    t * t
}
