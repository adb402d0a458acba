//! Cellular (Worley) noise.
//!
//! Each lattice cell owns one feature point, displaced from the cell corner
//! by a hash-derived direction scaled to a per-dimension jitter radius. A
//! sample walks the 3^D cells around it and keeps the four nearest feature
//! points in a per-lane sorted list.

use super::{Gen2D, Gen3D, Gen4D};
use crate::backend::{SimdF32, SimdI32};
use crate::distance::{Distance, Euclidean};
use crate::hash::{hash_primes_hb, primes};
use core::marker::PhantomData;

/// Highest selectable slot of the sorted nearest list.
pub const MAX_VALUE_INDEX: usize = 3;

const SLOTS: usize = MAX_VALUE_INDEX + 1;

const JITTER_2D: f32 = 0.437_5;
const JITTER_3D: f32 = 0.396_850_26;
const JITTER_4D: f32 = 0.366_025_4;

const VALUE_SCALE: f32 = 1.0 / i32::MAX as f32;

/// Feature-point bit-field layout per dimension: field width and centre.
const FIELD_2D: (i32, f32) = (0xffff, 32_767.5);
const FIELD_3D: (i32, f32) = (0x3ff, 511.5);
const FIELD_4D: (i32, f32) = (0xff, 127.5);

/// Sorted (distance, cell value) slots, nearest first.
struct Nearest<F> {
    distance: [F; SLOTS],
    value: [F; SLOTS],
}

impl<F: SimdF32> Nearest<F> {
    fn new() -> Self {
        Self {
            distance: [F::splat(f32::INFINITY); SLOTS],
            value: [F::splat(f32::INFINITY); SLOTS],
        }
    }

    /// Inserts one candidate, shifting displaced entries down. Slots past
    /// `last` are never read, so the chain stops there.
    #[inline(always)]
    fn insert(&mut self, mut distance: F, mut value: F, last: usize) {
        for i in 0..=last {
            let closer = distance.cmp_lt(self.distance[i]);
            let held_distance = self.distance[i];
            let held_value = self.value[i];
            self.distance[i] = F::select(closer, distance, held_distance);
            self.value[i] = F::select(closer, value, held_value);
            distance = F::select(closer, held_distance, distance);
            value = F::select(closer, held_value, value);
        }
    }
}

/// Parameters shared by both cellular outputs.
#[derive(Debug, Clone, Copy)]
struct Walk<D> {
    index: usize,
    jitter: f32,
    metric: PhantomData<D>,
}

impl<D: Distance> Walk<D> {
    fn new(index: usize) -> Self {
        Self {
            index: index.min(MAX_VALUE_INDEX),
            jitter: 1.0,
            metric: PhantomData,
        }
    }

    /// Nearest cell to `c` minus one, primed, plus `cell - c` as a float.
    #[inline(always)]
    fn start<F: SimdF32>(c: F, prime: i32) -> (F::I32, F) {
        let cell = c.to_i32_round() - F::I32::splat(1);
        let offset = F::from_i32(cell) - c;
        (cell * F::I32::splat(prime), offset)
    }

    /// Feature-point offset from the sample for one cell.
    #[inline(always)]
    fn feature<F: SimdF32, const N: usize>(
        hash: F::I32,
        cell_offset: [F; N],
        field: (i32, f32),
        jitter: F,
    ) -> [F; N] {
        let shift = 32 / N as u32;
        let mut dir = [F::splat(0.0); N];
        for (axis, d) in dir.iter_mut().enumerate() {
            let bits = (hash >> (shift * axis as u32)) & F::I32::splat(field.0);
            *d = F::from_i32(bits) - F::splat(field.1);
        }
        let sq = dir.iter().fold(F::splat(0.0), |acc, &v| v.mul_add(v, acc));
        let inv_mag = jitter * sq.rsqrt();
        let mut out = cell_offset;
        for (o, d) in out.iter_mut().zip(dir) {
            *o = d.mul_add(inv_mag, *o);
        }
        out
    }

    #[inline(always)]
    fn visit<F: SimdF32, const N: usize>(
        &self,
        nearest: &mut Nearest<F>,
        seed: F::I32,
        cell: [F::I32; N],
        cell_offset: [F; N],
        field: (i32, f32),
        jitter: F,
    ) {
        let hash = hash_primes_hb(seed, cell);
        let point = Self::feature(hash, cell_offset, field, jitter);
        let value = F::splat(VALUE_SCALE) * F::from_i32(hash);
        nearest.insert(D::calc(point), value, self.index);
    }

    fn walk_2d<F: SimdF32>(&self, seed: F::I32, x: F, y: F) -> Nearest<F> {
        let jitter = F::splat(JITTER_2D * self.jitter);
        let (xc0, xf0) = Self::start(x, primes::X);
        let (yc0, yf0) = Self::start(y, primes::Y);
        let (px, py) = (F::I32::splat(primes::X), F::I32::splat(primes::Y));
        let one = F::splat(1.0);

        let mut nearest = Nearest::new();
        let (mut xc, mut xf) = (xc0, xf0);
        for _ in 0..3 {
            let (mut yc, mut yf) = (yc0, yf0);
            for _ in 0..3 {
                self.visit(&mut nearest, seed, [xc, yc], [xf, yf], FIELD_2D, jitter);
                yc = yc + py;
                yf = yf + one;
            }
            xc = xc + px;
            xf = xf + one;
        }
        nearest
    }

    fn walk_3d<F: SimdF32>(&self, seed: F::I32, x: F, y: F, z: F) -> Nearest<F> {
        let jitter = F::splat(JITTER_3D * self.jitter);
        let (xc0, xf0) = Self::start(x, primes::X);
        let (yc0, yf0) = Self::start(y, primes::Y);
        let (zc0, zf0) = Self::start(z, primes::Z);
        let (px, py, pz) = (
            F::I32::splat(primes::X),
            F::I32::splat(primes::Y),
            F::I32::splat(primes::Z),
        );
        let one = F::splat(1.0);

        let mut nearest = Nearest::new();
        let (mut xc, mut xf) = (xc0, xf0);
        for _ in 0..3 {
            let (mut yc, mut yf) = (yc0, yf0);
            for _ in 0..3 {
                let (mut zc, mut zf) = (zc0, zf0);
                for _ in 0..3 {
                    self.visit(
                        &mut nearest,
                        seed,
                        [xc, yc, zc],
                        [xf, yf, zf],
                        FIELD_3D,
                        jitter,
                    );
                    zc = zc + pz;
                    zf = zf + one;
                }
                yc = yc + py;
                yf = yf + one;
            }
            xc = xc + px;
            xf = xf + one;
        }
        nearest
    }

    fn walk_4d<F: SimdF32>(&self, seed: F::I32, x: F, y: F, z: F, w: F) -> Nearest<F> {
        let jitter = F::splat(JITTER_4D * self.jitter);
        let starts = [
            Self::start(x, primes::X),
            Self::start(y, primes::Y),
            Self::start(z, primes::Z),
            Self::start(w, primes::W),
        ];
        let steps = [primes::X, primes::Y, primes::Z, primes::W].map(F::I32::splat);

        let mut nearest = Nearest::new();
        // 81 neighbours, odometer over the four axes
        for n in 0..81u32 {
            let mut cell = [F::I32::splat(0); 4];
            let mut offset = [F::splat(0.0); 4];
            let mut rest = n;
            for axis in 0..4 {
                let k = rest % 3;
                rest /= 3;
                let (c0, f0) = starts[axis];
                cell[axis] = c0 + steps[axis] * F::I32::splat(k as i32);
                offset[axis] = f0 + F::splat(k as f32);
            }
            self.visit(&mut nearest, seed, cell, offset, FIELD_4D, jitter);
        }
        nearest
    }
}

macro_rules! cellular_kind {
    ($(#[$meta:meta])* $name:ident, $slot:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<D: Distance = Euclidean> {
            walk: Walk<D>,
        }

        impl<D: Distance> $name<D> {
            /// `index` selects the n-th nearest cell (0 = nearest); values
            /// above [`MAX_VALUE_INDEX`] are clamped.
            pub fn new(index: usize) -> Self {
                Self { walk: Walk::new(index) }
            }

            /// Scales the feature-point displacement. `1.0` is the default
            /// radius; `0.0` puts every point on its lattice corner.
            pub fn with_jitter(mut self, jitter: f32) -> Self {
                self.walk.jitter = jitter;
                self
            }

            /// The clamped slot index.
            pub fn index(&self) -> usize {
                self.walk.index
            }

            pub fn jitter(&self) -> f32 {
                self.walk.jitter
            }
        }

        impl<D: Distance> Default for $name<D> {
            fn default() -> Self {
                Self::new(0)
            }
        }

        impl<D: Distance> Gen2D for $name<D> {
            #[inline(always)]
            fn gen_2d<F: SimdF32>(&self, seed: F::I32, x: F, y: F) -> F {
                self.walk.walk_2d(seed, x, y).$slot[self.walk.index]
            }
        }

        impl<D: Distance> Gen3D for $name<D> {
            #[inline(always)]
            fn gen_3d<F: SimdF32>(&self, seed: F::I32, x: F, y: F, z: F) -> F {
                self.walk.walk_3d(seed, x, y, z).$slot[self.walk.index]
            }
        }

        impl<D: Distance> Gen4D for $name<D> {
            #[inline(always)]
            fn gen_4d<F: SimdF32>(&self, seed: F::I32, x: F, y: F, z: F, w: F) -> F {
                self.walk.walk_4d(seed, x, y, z, w).$slot[self.walk.index]
            }
        }
    };
}

cellular_kind!(
    /// Cellular noise emitting the pseudo-random value (in `[-1, 1]`) of the
    /// n-th nearest cell.
    Cellular,
    value
);

cellular_kind!(
    /// Cellular noise emitting the raw distance to the n-th nearest feature
    /// point under metric `D`.
    CellularDistance,
    distance
);
