use anyhow::Result;
use noiseflow::backend::{NativeBackend, Portable8, Scalar};
use noiseflow::gen::gen_uniform_grid_3d;
use noiseflow::generators::Perlin;
use noiseflow::{DistanceFunction, GenError, Noise, NoiseConfig, NoiseType};

#[test_log::test]
fn config_round_trips_through_json() -> Result<()> {
    let config = NoiseConfig {
        noise_type: NoiseType::CellularDistance,
        seed: -77,
        frequency: 0.25,
        distance_function: DistanceFunction::Hybrid,
        value_index: 2,
        jitter: 0.75,
    };
    let json = serde_json::to_string_pretty(&config)?;
    let back: NoiseConfig = serde_json::from_str(&json)?;
    assert_eq!(back, config);
    assert!(json.contains("\"cellular_distance\""));
    assert!(json.contains("\"hybrid\""));
    Ok(())
}

#[test_log::test]
fn empty_json_is_the_default_config() -> Result<()> {
    let config: NoiseConfig = serde_json::from_str("{}")?;
    assert_eq!(config, NoiseConfig::default());
    assert_eq!(config.noise_type, NoiseType::Simplex);
    Ok(())
}

#[test_log::test]
fn unknown_noise_type_is_rejected() {
    let parsed: Result<NoiseConfig, _> = serde_json::from_str(r#"{"noise_type":"value"}"#);
    assert!(parsed.is_err());
}

#[test_log::test]
fn every_noise_type_generates() -> Result<()> {
    for noise_type in [
        NoiseType::Perlin,
        NoiseType::Simplex,
        NoiseType::OpenSimplex2,
        NoiseType::Cellular,
        NoiseType::CellularDistance,
    ] {
        for distance_function in [DistanceFunction::Euclidean, DistanceFunction::MaxAxis] {
            let noise = Noise::from_config(&NoiseConfig {
                noise_type,
                distance_function,
                frequency: 0.1,
                ..NoiseConfig::default()
            });

            let mut grid = vec![0.0; 9 * 5];
            let range = noise.gen_uniform_grid_2d::<NativeBackend>(&mut grid, [0, 0], [9, 5])?;
            assert!(range.min <= range.max, "{:?}", noise_type);
            assert!(grid.iter().all(|v| v.is_finite()));

            let mut cube = vec![0.0; 4 * 4 * 4];
            noise.gen_uniform_grid_3d::<NativeBackend>(&mut cube, [0, 0, 0], [4, 4, 4])?;
            let mut hyper = vec![0.0; 3 * 3 * 3 * 3];
            noise.gen_uniform_grid_4d::<NativeBackend>(&mut hyper, [0, 0, 0, 0], [3, 3, 3, 3])?;

            let mut tile = vec![0.0; 16 * 16];
            noise.gen_tileable_2d::<NativeBackend>(&mut tile, [16, 16])?;

            let xs = [0.5, 1.5, 2.5];
            let mut points = vec![0.0; 3];
            noise.gen_position_array_2d::<NativeBackend>(&mut points, &xs, &xs, [0.0; 2])?;
            noise.gen_position_array_3d::<NativeBackend>(&mut points, &xs, &xs, &xs, [0.0; 3])?;
            noise.gen_position_array_4d::<NativeBackend>(
                &mut points,
                &xs,
                &xs,
                &xs,
                &xs,
                [0.0; 4],
            )?;

            // grid index i samples at i * frequency
            let single = noise.gen_single_2d::<NativeBackend>(2.0, 3.0);
            assert_eq!(single, grid[3 * 9 + 2]);
            assert!(noise.gen_single_1d::<Scalar>(4.0).is_finite());
            assert!(noise.gen_single_3d::<Scalar>(1.0, 2.0, 3.0).is_finite());
            assert!(noise.gen_single_4d::<Scalar>(1.0, 2.0, 3.0, 4.0).is_finite());
        }
    }
    Ok(())
}

#[test_log::test]
fn noise_matches_the_static_driver() -> Result<()> {
    let noise = Noise::from(&NoiseConfig {
        noise_type: NoiseType::Perlin,
        seed: 8,
        frequency: 0.3,
        ..NoiseConfig::default()
    });
    let mut a = vec![0.0; 5 * 6 * 7];
    let mut b = vec![0.0; 5 * 6 * 7];
    noise.gen_uniform_grid_3d::<Portable8>(&mut a, [1, 2, 3], [5, 6, 7])?;
    gen_uniform_grid_3d::<Portable8, _>(&Perlin, &mut b, [1, 2, 3], [5, 6, 7], 0.3, 8)?;
    assert_eq!(a, b);
    Ok(())
}

#[test_log::test]
fn contract_violations_are_reported() {
    let noise = Noise::from_config(&NoiseConfig::default());
    let mut out = vec![0.0; 10];

    let err = noise
        .gen_uniform_grid_2d::<Scalar>(&mut out, [0, 0], [4, 4])
        .unwrap_err();
    assert_eq!(err, GenError::DestinationSize { expected: 16, actual: 10 });

    let err = noise
        .gen_position_array_2d::<Scalar>(&mut out, &[0.0; 10], &[0.0; 9], [0.0; 2])
        .unwrap_err();
    assert_eq!(
        err,
        GenError::PositionArrayLength {
            axis: 'y',
            expected: 10,
            actual: 9
        }
    );

    let err = noise
        .gen_uniform_grid_3d::<Scalar>(&mut out, [0, 0, 0], [i32::MAX, i32::MAX, i32::MAX])
        .unwrap_err();
    assert!(matches!(err, GenError::SizeOverflow | GenError::DestinationSize { .. }));

    let err = noise.gen_tileable_2d::<Scalar>(&mut out, [-2, 5]).unwrap_err();
    assert_eq!(err, GenError::InvalidSize { axis: 'x', size: -2 });
    assert!(out.iter().all(|&v| v == 0.0));
}
