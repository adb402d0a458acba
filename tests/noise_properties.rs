use anyhow::Result;
use core::f64::consts::TAU;
use noiseflow::backend::scalar::{ScalarF32, ScalarI32};
use noiseflow::backend::{NativeBackend, Scalar};
use noiseflow::distance::{Distance, Euclidean, EuclideanSquared, Manhattan, MaxAxis};
use noiseflow::gen::{
    gen_single_2d, gen_single_4d, gen_tileable_2d, gen_uniform_grid_2d, gen_uniform_grid_3d,
    gen_uniform_grid_4d,
};
use noiseflow::generators::{
    CellularDistance, Gen2D, Gen3D, Gen4D, OpenSimplex2, Perlin, Simplex, MAX_VALUE_INDEX,
};
use noiseflow::hash::hash_primes;
use noiseflow::math::sin_cos;

const RANGE_LIMIT: f32 = 1.05;

fn check_range_2d<G: Gen2D>(name: &str, gen: &G) -> Result<()> {
    let mut out = vec![0.0; 1000 * 1000];
    let range =
        gen_uniform_grid_2d::<NativeBackend, _>(gen, &mut out, [-500, -500], [1000, 1000], 0.0731, 2)?;
    log::info!("{} 2d range [{}, {}]", name, range.min, range.max);
    assert!(range.min >= -RANGE_LIMIT && range.max <= RANGE_LIMIT, "{} {:?}", name, range);
    assert!(range.max - range.min > 1.0, "{} barely varies: {:?}", name, range);
    Ok(())
}

fn check_range_3d<G: Gen3D>(name: &str, gen: &G) -> Result<()> {
    let mut out = vec![0.0; 100 * 100 * 100];
    let range =
        gen_uniform_grid_3d::<NativeBackend, _>(gen, &mut out, [7, -50, 3], [100, 100, 100], 0.113, 77)?;
    log::info!("{} 3d range [{}, {}]", name, range.min, range.max);
    assert!(range.min >= -RANGE_LIMIT && range.max <= RANGE_LIMIT, "{} {:?}", name, range);
    Ok(())
}

fn check_range_4d<G: Gen4D>(name: &str, gen: &G) -> Result<()> {
    let mut out = vec![0.0; 32 * 32 * 32 * 32];
    let range = gen_uniform_grid_4d::<NativeBackend, _>(
        gen,
        &mut out,
        [-16, 5, 0, -3],
        [32, 32, 32, 32],
        0.137,
        31,
    )?;
    log::info!("{} 4d range [{}, {}]", name, range.min, range.max);
    assert!(range.min >= -RANGE_LIMIT && range.max <= RANGE_LIMIT, "{} {:?}", name, range);
    assert!(range.max - range.min > 1.0, "{} barely varies: {:?}", name, range);
    Ok(())
}

#[test_log::test]
fn coherent_noise_stays_in_range() -> Result<()> {
    check_range_2d("perlin", &Perlin)?;
    check_range_2d("simplex", &Simplex)?;
    check_range_2d("open_simplex2", &OpenSimplex2)?;
    check_range_3d("perlin", &Perlin)?;
    check_range_3d("simplex", &Simplex)?;
    check_range_3d("open_simplex2", &OpenSimplex2)?;
    check_range_4d("perlin", &Perlin)?;
    check_range_4d("simplex", &Simplex)?;
    Ok(())
}

#[test_log::test]
fn perlin_is_zero_on_lattice_points() {
    assert_eq!(gen_single_2d::<Scalar, _>(&Perlin, 3.0, 5.0, 1234), 0.0);
    assert_eq!(gen_single_2d::<NativeBackend, _>(&Perlin, 3.0, 5.0, 1234), 0.0);
    assert_eq!(gen_single_2d::<NativeBackend, _>(&Perlin, -17.0, 0.0, -9), 0.0);
}

#[test_log::test]
fn hash_of_origin_with_zero_seed_is_zero() {
    let h = hash_primes(ScalarI32(0), [ScalarI32(0), ScalarI32(0)]);
    assert_eq!(h.0, 0);
}

#[test_log::test]
fn generation_is_deterministic() -> Result<()> {
    let mut first = vec![0.0; 61 * 17];
    let mut second = vec![0.0; 61 * 17];
    let a = gen_uniform_grid_2d::<NativeBackend, _>(&OpenSimplex2, &mut first, [3, 3], [61, 17], 0.05, 555)?;
    let b = gen_uniform_grid_2d::<NativeBackend, _>(&OpenSimplex2, &mut second, [3, 3], [61, 17], 0.05, 555)?;
    assert_eq!(first, second);
    assert_eq!(a, b);

    let mut other_seed = vec![0.0; 61 * 17];
    gen_uniform_grid_2d::<NativeBackend, _>(&OpenSimplex2, &mut other_seed, [3, 3], [61, 17], 0.05, 556)?;
    assert_ne!(first, other_seed);
    Ok(())
}

/// Column 0 of a tileable image equals the sample one full turn later, and
/// the same for row 0.
#[test_log::test]
fn tileable_wraps_seamlessly() -> Result<()> {
    const SIZE: i32 = 64;
    const SEED: i32 = 99;
    let mut out = vec![0.0; (SIZE * SIZE) as usize];
    gen_tileable_2d::<Scalar, _>(&Simplex, &mut out, [SIZE, SIZE], 1.0, SEED)?;

    let radius = (SIZE as f64 / TAU) as f32;
    let step = (TAU / SIZE as f64) as f32;
    let circle = |index: i32| {
        let (s, c) = sin_cos(ScalarF32(index as f32 * step));
        (c.0 * radius, s.0 * radius)
    };

    for row in 0..SIZE {
        let (yc, ys) = circle(row);
        let (xc, xs) = circle(SIZE);
        let wrapped = gen_single_4d::<Scalar, _>(&Simplex, xc, yc, xs, ys, SEED);
        let first = out[(row * SIZE) as usize];
        assert!((first - wrapped).abs() < 1e-5, "row {}: {} vs {}", row, first, wrapped);
    }
    for col in 0..SIZE {
        let (xc, xs) = circle(col);
        let (yc, ys) = circle(SIZE);
        let wrapped = gen_single_4d::<Scalar, _>(&Simplex, xc, yc, xs, ys, SEED);
        let first = out[col as usize];
        assert!((first - wrapped).abs() < 1e-5, "col {}: {} vs {}", col, first, wrapped);
    }
    Ok(())
}

fn sorted_distances<D: Distance>(x: f32, y: f32, z: f32, seed: i32) -> Vec<f32> {
    (0..=MAX_VALUE_INDEX)
        .map(|i| {
            CellularDistance::<D>::new(i).gen_3d(
                ScalarI32(seed),
                ScalarF32(x),
                ScalarF32(y),
                ScalarF32(z),
            )
            .0
        })
        .collect()
}

#[test_log::test]
fn cellular_slots_are_ordered_by_distance() {
    for i in 0..200 {
        let t = i as f32 * 0.173;
        let (x, y, z) = (t * 1.3 - 5.0, t * 0.7, 11.0 - t);
        for d in [
            sorted_distances::<Euclidean>(x, y, z, i),
            sorted_distances::<EuclideanSquared>(x, y, z, i),
            sorted_distances::<Manhattan>(x, y, z, i),
            sorted_distances::<MaxAxis>(x, y, z, i),
        ] {
            assert!(d.windows(2).all(|w| w[0] <= w[1]), "point {}: {:?}", i, d);
        }
    }
}
