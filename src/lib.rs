//! SIMD procedural noise.
//!
//! Noise kernels (Perlin, Simplex, OpenSimplex2, Cellular) are written once
//! against the vector-operation contract in [`backend`] and run at any lane
//! width: scalar, portable arrays of 4/8/16, SSE, AVX2, AVX-512 and NEON.
//! The batch drivers in [`gen`] fill caller-owned buffers from a uniform
//! grid, an array of positions, a tileable 2D grid, or evaluate a single
//! point.
//!
//! ```
//! use noiseflow::backend::NativeBackend;
//! use noiseflow::gen::gen_uniform_grid_2d;
//! use noiseflow::generators::Simplex;
//!
//! let mut out = vec![0.0; 64 * 64];
//! let range = gen_uniform_grid_2d::<NativeBackend, _>(
//!     &Simplex, &mut out, [0, 0], [64, 64], 0.02, 1337,
//! )
//! .unwrap();
//! assert!(range.min >= -1.05 && range.max <= 1.05);
//! ```
//!
//! Runtime selection goes through [`config::NoiseConfig`] and
//! [`config::Noise`].

pub mod backend;
pub mod config;
pub mod distance;
pub mod error;
pub mod gen;
pub mod generators;
pub mod gradient;
pub mod hash;
pub mod math;

pub use backend::{Backend, NativeBackend};
pub use config::{Noise, NoiseConfig, NoiseType};
pub use distance::DistanceFunction;
pub use error::GenError;
pub use gen::OutputMinMax;
