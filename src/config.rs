//! Configuration for building a noise generator at runtime.
//!
//! [`NoiseConfig`] deserializes from any serde format, with every field
//! optional. [`Noise::from_config`] turns it into a [`Noise`], which resolves
//! the kernel and distance metric to concrete types once per call and then
//! runs the statically dispatched driver from [`crate::gen`].

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::distance::{DistanceFunction, Euclidean, EuclideanSquared, Hybrid, Manhattan, MaxAxis};
use crate::error::GenError;
use crate::gen::{self, OutputMinMax};
use crate::generators::{Cellular, CellularDistance, OpenSimplex2, Perlin, Simplex, MAX_VALUE_INDEX};
use log::debug;

/// Which kernel a [`Noise`] evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseType {
    Perlin,
    #[default]
    Simplex,
    #[serde(rename = "open_simplex2")]
    OpenSimplex2,
    /// Value of the n-th nearest cell.
    Cellular,
    /// Distance to the n-th nearest feature point.
    CellularDistance,
}

/// Runtime description of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub noise_type: NoiseType,
    pub seed: i32,
    /// Multiplies grid indices into sample positions. Position-array calls
    /// ignore it.
    pub frequency: f32,
    /// Cellular metric.
    pub distance_function: DistanceFunction,
    /// Cellular n-th nearest slot, clamped to `0..=3`.
    pub value_index: usize,
    /// Cellular feature-point jitter modifier.
    pub jitter: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            noise_type: NoiseType::default(),
            seed: 1337,
            frequency: 0.01,
            distance_function: DistanceFunction::default(),
            value_index: 0,
            jitter: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CellParams {
    distance: DistanceFunction,
    index: usize,
    jitter: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kernel {
    Perlin,
    Simplex,
    OpenSimplex2,
    Cellular(CellParams),
    CellularDistance(CellParams),
}

// Binds `$g` to a reference to the concrete generator, then evaluates
// `$body` with it. Each arm monomorphizes `$body` separately.
macro_rules! with_cellular {
    ($params:expr, $ty:ident, $g:ident => $body:expr) => {{
        let p = $params;
        match p.distance {
            DistanceFunction::Euclidean => {
                let $g = &$ty::<Euclidean>::new(p.index).with_jitter(p.jitter);
                $body
            }
            DistanceFunction::EuclideanSquared => {
                let $g = &$ty::<EuclideanSquared>::new(p.index).with_jitter(p.jitter);
                $body
            }
            DistanceFunction::Manhattan => {
                let $g = &$ty::<Manhattan>::new(p.index).with_jitter(p.jitter);
                $body
            }
            DistanceFunction::Hybrid => {
                let $g = &$ty::<Hybrid>::new(p.index).with_jitter(p.jitter);
                $body
            }
            DistanceFunction::MaxAxis => {
                let $g = &$ty::<MaxAxis>::new(p.index).with_jitter(p.jitter);
                $body
            }
        }
    }};
}

macro_rules! with_kernel {
    ($kernel:expr, $g:ident => $body:expr) => {
        match $kernel {
            Kernel::Perlin => {
                let $g = &Perlin;
                $body
            }
            Kernel::Simplex => {
                let $g = &Simplex;
                $body
            }
            Kernel::OpenSimplex2 => {
                let $g = &OpenSimplex2;
                $body
            }
            Kernel::Cellular(params) => with_cellular!(params, Cellular, $g => $body),
            Kernel::CellularDistance(params) => {
                with_cellular!(params, CellularDistance, $g => $body)
            }
        }
    };
}

/// A generator chosen at runtime.
///
/// Every method picks the concrete kernel with one `match` and then runs
/// the same monomorphized driver a caller could invoke directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Noise {
    kernel: Kernel,
    seed: i32,
    frequency: f32,
}

impl Noise {
    pub fn from_config(config: &NoiseConfig) -> Self {
        let cell = CellParams {
            distance: config.distance_function,
            index: config.value_index.min(MAX_VALUE_INDEX),
            jitter: config.jitter,
        };
        let kernel = match config.noise_type {
            NoiseType::Perlin => Kernel::Perlin,
            NoiseType::Simplex => Kernel::Simplex,
            NoiseType::OpenSimplex2 => Kernel::OpenSimplex2,
            NoiseType::Cellular => Kernel::Cellular(cell),
            NoiseType::CellularDistance => Kernel::CellularDistance(cell),
        };
        debug!("noise from config: {:?}", kernel);
        Self {
            kernel,
            seed: config.seed,
            frequency: config.frequency,
        }
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn gen_uniform_grid_2d<B: Backend>(
        &self,
        out: &mut [f32],
        start: [i32; 2],
        size: [i32; 2],
    ) -> Result<OutputMinMax, GenError> {
        with_kernel!(self.kernel, g => gen::gen_uniform_grid_2d::<B, _>(
            g, out, start, size, self.frequency, self.seed
        ))
    }

    pub fn gen_uniform_grid_3d<B: Backend>(
        &self,
        out: &mut [f32],
        start: [i32; 3],
        size: [i32; 3],
    ) -> Result<OutputMinMax, GenError> {
        with_kernel!(self.kernel, g => gen::gen_uniform_grid_3d::<B, _>(
            g, out, start, size, self.frequency, self.seed
        ))
    }

    pub fn gen_uniform_grid_4d<B: Backend>(
        &self,
        out: &mut [f32],
        start: [i32; 4],
        size: [i32; 4],
    ) -> Result<OutputMinMax, GenError> {
        with_kernel!(self.kernel, g => gen::gen_uniform_grid_4d::<B, _>(
            g, out, start, size, self.frequency, self.seed
        ))
    }

    pub fn gen_position_array_2d<B: Backend>(
        &self,
        out: &mut [f32],
        xs: &[f32],
        ys: &[f32],
        offset: [f32; 2],
    ) -> Result<OutputMinMax, GenError> {
        with_kernel!(self.kernel, g => gen::gen_position_array_2d::<B, _>(
            g, out, xs, ys, offset, self.seed
        ))
    }

    pub fn gen_position_array_3d<B: Backend>(
        &self,
        out: &mut [f32],
        xs: &[f32],
        ys: &[f32],
        zs: &[f32],
        offset: [f32; 3],
    ) -> Result<OutputMinMax, GenError> {
        with_kernel!(self.kernel, g => gen::gen_position_array_3d::<B, _>(
            g, out, xs, ys, zs, offset, self.seed
        ))
    }

    pub fn gen_position_array_4d<B: Backend>(
        &self,
        out: &mut [f32],
        xs: &[f32],
        ys: &[f32],
        zs: &[f32],
        ws: &[f32],
        offset: [f32; 4],
    ) -> Result<OutputMinMax, GenError> {
        with_kernel!(self.kernel, g => gen::gen_position_array_4d::<B, _>(
            g, out, xs, ys, zs, ws, offset, self.seed
        ))
    }

    /// Sample at `x * frequency`; see [`gen::gen_single_1d`].
    pub fn gen_single_1d<B: Backend>(&self, x: f32) -> f32 {
        let x = x * self.frequency;
        with_kernel!(self.kernel, g => gen::gen_single_1d::<B, _>(g, x, self.seed))
    }

    pub fn gen_single_2d<B: Backend>(&self, x: f32, y: f32) -> f32 {
        let f = self.frequency;
        with_kernel!(self.kernel, g => gen::gen_single_2d::<B, _>(g, x * f, y * f, self.seed))
    }

    pub fn gen_single_3d<B: Backend>(&self, x: f32, y: f32, z: f32) -> f32 {
        let f = self.frequency;
        with_kernel!(self.kernel, g => gen::gen_single_3d::<B, _>(
            g, x * f, y * f, z * f, self.seed
        ))
    }

    pub fn gen_single_4d<B: Backend>(&self, x: f32, y: f32, z: f32, w: f32) -> f32 {
        let f = self.frequency;
        with_kernel!(self.kernel, g => gen::gen_single_4d::<B, _>(
            g, x * f, y * f, z * f, w * f, self.seed
        ))
    }

    pub fn gen_tileable_2d<B: Backend>(
        &self,
        out: &mut [f32],
        size: [i32; 2],
    ) -> Result<OutputMinMax, GenError> {
        with_kernel!(self.kernel, g => gen::gen_tileable_2d::<B, _>(
            g, out, size, self.frequency, self.seed
        ))
    }
}

impl From<&NoiseConfig> for Noise {
    fn from(config: &NoiseConfig) -> Self {
        Noise::from_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Portable4, Scalar};

    #[test_log::test]
    fn missing_fields_take_defaults() {
        let config: NoiseConfig = serde_json::from_str(r#"{"noise_type":"cellular","seed":5}"#).unwrap();
        assert_eq!(config.noise_type, NoiseType::Cellular);
        assert_eq!(config.seed, 5);
        assert_eq!(config.jitter, 1.0);
        assert_eq!(config.distance_function, DistanceFunction::Euclidean);
    }

    #[test_log::test]
    fn value_index_is_clamped() {
        let config = NoiseConfig {
            noise_type: NoiseType::CellularDistance,
            value_index: 9,
            ..NoiseConfig::default()
        };
        let noise = Noise::from_config(&config);
        let clamped = Noise::from_config(&NoiseConfig {
            value_index: MAX_VALUE_INDEX,
            ..config
        });
        assert_eq!(noise, clamped);
    }

    #[test_log::test]
    fn dispatch_matches_direct_call() {
        let config = NoiseConfig {
            noise_type: NoiseType::Cellular,
            distance_function: DistanceFunction::Manhattan,
            value_index: 2,
            frequency: 0.5,
            seed: 99,
            ..NoiseConfig::default()
        };
        let noise = Noise::from_config(&config);
        let direct = Cellular::<Manhattan>::new(2);

        let mut a = vec![0.0; 7 * 3];
        let mut b = vec![0.0; 7 * 3];
        let ra = noise.gen_uniform_grid_2d::<Portable4>(&mut a, [1, 2], [7, 3]).unwrap();
        let rb = gen::gen_uniform_grid_2d::<Portable4, _>(&direct, &mut b, [1, 2], [7, 3], 0.5, 99).unwrap();
        assert_eq!(a, b);
        assert_eq!(ra, rb);

        let single = noise.gen_single_2d::<Scalar>(3.0, 4.0);
        assert_eq!(single, gen::gen_single_2d::<Scalar, _>(&direct, 1.5, 2.0, 99));
    }
}
