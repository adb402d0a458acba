//! Every backend must satisfy the same vector-operation contract. The same
//! checks run against each width that is compiled into this binary.

use noiseflow::backend::{
    Backend, MaskOps, NativeBackend, Portable16, Portable4, Portable8, Scalar, SimdF32, SimdI32,
    MAX_LANES,
};

fn floats<B: Backend>(v: B::F32) -> Vec<f32> {
    let mut buf = [0.0f32; MAX_LANES];
    v.store(&mut buf);
    buf[..B::LANES].to_vec()
}

fn ints<B: Backend>(v: B::I32) -> Vec<i32> {
    let mut buf = [0i32; MAX_LANES];
    v.store(&mut buf);
    buf[..B::LANES].to_vec()
}

fn pattern<T: Copy>(values: &[T], lanes: usize) -> Vec<T> {
    values.iter().copied().cycle().take(lanes).collect()
}

fn check_load_store<B: Backend>() {
    let w = B::LANES;
    let src: Vec<f32> = (0..w).map(|i| i as f32 - 1.5).collect();
    assert_eq!(floats::<B>(B::F32::load(&src)), src);

    let padded: Vec<f32> = (0..w + 3).map(|i| i as f32).collect();
    assert_eq!(B::F32::load_at(&padded, 3).extract0(), 3.0);
    assert_eq!(B::F32::load(&src).extract(w - 1), src[w - 1]);

    let isrc: Vec<i32> = (0..w as i32).map(|i| i * 7 - 3).collect();
    assert_eq!(ints::<B>(B::I32::load(&isrc)), isrc);
    assert_eq!(ints::<B>(B::I32::incremented()), (0..w as i32).collect::<Vec<_>>());
}

fn check_compare_select<B: Backend>() {
    let w = B::LANES;
    let src: Vec<f32> = (0..w).map(|i| i as f32 - 1.5).collect();
    let v = B::F32::load(&src);
    let positive = v.cmp_gt(B::F32::splat(0.0));
    let picked = B::F32::select(positive, B::F32::splat(1.0), B::F32::splat(-1.0));
    let expected: Vec<f32> = src.iter().map(|&x| if x > 0.0 { 1.0 } else { -1.0 }).collect();
    assert_eq!(floats::<B>(picked), expected);

    assert!(v.cmp_lt(B::F32::splat(100.0)).all());
    assert!(!v.cmp_gt(B::F32::splat(100.0)).any());
    assert!((positive | !positive).all());
    assert!(!(positive & !positive).any());

    let nan = B::F32::splat(f32::NAN);
    assert!(!nan.cmp_eq(nan).any());
    assert!(nan.cmp_ne(nan).all());
}

fn check_masked_ops<B: Backend>() {
    let inc = B::I32::incremented();
    let one = B::I32::splat(1);
    let odd = (inc & one).cmp_eq(one);
    let lanes: Vec<i32> = (0..B::LANES as i32).collect();

    let bumped = inc.masked_increment(odd);
    let expected: Vec<i32> = lanes.iter().map(|&i| if i & 1 == 1 { i + 1 } else { i }).collect();
    assert_eq!(ints::<B>(bumped), expected);

    let bumped = inc.nmasked_increment(odd);
    let expected: Vec<i32> = lanes.iter().map(|&i| if i & 1 == 1 { i } else { i + 1 }).collect();
    assert_eq!(ints::<B>(bumped), expected);

    let f = B::F32::from_i32(inc);
    let added = f.masked_add(B::F32::splat(10.0), odd);
    let expected: Vec<f32> = lanes
        .iter()
        .map(|&i| if i & 1 == 1 { i as f32 + 10.0 } else { i as f32 })
        .collect();
    assert_eq!(floats::<B>(added), expected);

    let subbed = f.nmasked_sub(B::F32::splat(1.0), odd);
    let expected: Vec<f32> = lanes
        .iter()
        .map(|&i| if i & 1 == 1 { i as f32 } else { i as f32 - 1.0 })
        .collect();
    assert_eq!(floats::<B>(subbed), expected);

    let zeroed = f.mask_zero(odd) + f.nmask_zero(odd);
    assert_eq!(floats::<B>(zeroed), floats::<B>(f));

    let int_sum = inc.masked_add(B::I32::splat(100), odd) - inc;
    let expected: Vec<i32> = lanes.iter().map(|&i| if i & 1 == 1 { 100 } else { 0 }).collect();
    assert_eq!(ints::<B>(int_sum), expected);
}

fn check_rounding<B: Backend>() {
    let w = B::LANES;
    let src = pattern(&[-2.5f32, -1.5, -0.5, 0.5, 1.5, 2.5, -0.2, 3.7], w);
    let v = B::F32::load(&src);

    let map = |f: fn(f32) -> f32| src.iter().map(|&x| f(x)).collect::<Vec<f32>>();
    assert_eq!(floats::<B>(v.floor()), map(f32::floor));
    assert_eq!(floats::<B>(v.ceil()), map(f32::ceil));
    assert_eq!(floats::<B>(v.round()), map(f32::round_ties_even));

    let rounded: Vec<i32> = src.iter().map(|&x| x.round_ties_even() as i32).collect();
    assert_eq!(ints::<B>(v.to_i32_round()), rounded);
    let truncated: Vec<i32> = src.iter().map(|&x| x as i32).collect();
    assert_eq!(ints::<B>(v.to_i32_trunc()), truncated);
}

fn check_integer_ops<B: Backend>() {
    let v = B::I32::splat(-8);
    assert_eq!((v >> 1).extract0(), -4);
    assert_eq!(v.shr_logical(1).extract0(), (-8i32 as u32 >> 1) as i32);
    assert_eq!((v << 2).extract0(), -32);
    assert_eq!((B::I32::splat(i32::MAX) * B::I32::splat(2)).extract0(), -2);
    assert_eq!((B::I32::splat(i32::MAX) + B::I32::splat(1)).extract0(), i32::MIN);
    assert_eq!(B::I32::splat(3).min(B::I32::splat(-4)).extract0(), -4);
    assert_eq!(B::I32::splat(3).max(B::I32::splat(-4)).extract0(), 3);
    assert_eq!(B::I32::splat(0b1100).and_not(B::I32::splat(0b0100)).extract0(), 0b1000);
    assert!(B::I32::splat(2).cmp_ge(B::I32::splat(2)).all());
    assert!(!B::I32::splat(2).cmp_le(B::I32::splat(1)).any());
}

fn check_float_bits<B: Backend>() {
    let x = B::F32::splat(-3.25);
    assert_eq!(x.to_bits().extract0(), (-3.25f32).to_bits() as i32);
    assert_eq!(B::F32::from_bits(B::I32::splat(0x3F80_0000)).extract0(), 1.0);
    assert_eq!(x.abs().extract0(), 3.25);
    assert_eq!((-x).extract0(), 3.25);
    assert_eq!((x & B::F32::splat(-0.0)).extract0().to_bits(), (-0.0f32).to_bits());
    assert_eq!((x ^ B::F32::splat(-0.0)).extract0(), 3.25);
    assert_eq!(x.and_not(B::F32::splat(-0.0)).extract0(), 3.25);
    assert_eq!(B::F32::splat(2.0).mul_add(B::F32::splat(3.0), B::F32::splat(1.0)).extract0(), 7.0);
    assert_eq!(B::F32::splat(2.0).neg_mul_add(B::F32::splat(3.0), B::F32::splat(1.0)).extract0(), -5.0);
}

fn check_approximations<B: Backend>() {
    for x in [0.01f32, 0.5, 1.0, 2.0, 1234.5] {
        let v = B::F32::splat(x);
        let rel = |got: f32, want: f32| ((got - want) / want).abs();
        assert!(rel(v.sqrt().extract0(), x.sqrt()) < 1e-6);
        assert!(rel(v.rsqrt().extract0(), 1.0 / x.sqrt()) < 1e-5, "{} rsqrt({})", B::NAME, x);
        assert!(rel(v.recip().extract0(), 1.0 / x) < 1e-5, "{} recip({})", B::NAME, x);
    }
}

fn check_reductions<B: Backend>() {
    let w = B::LANES;
    let src: Vec<f32> = (0..w).map(|i| ((i * 5) % 7) as f32 - 3.0).collect();
    let v = B::F32::load(&src);
    let min = src.iter().copied().fold(f32::INFINITY, f32::min);
    let max = src.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    assert_eq!(v.reduce_min(), min);
    assert_eq!(v.reduce_max(), max);
    assert_eq!(v.min(B::F32::splat(0.0)).reduce_max(), max.min(0.0));
}

fn check_all<B: Backend>() {
    assert!(B::is_supported(), "{} compiled in but not supported", B::NAME);
    assert!(B::LANES >= 1 && B::LANES <= MAX_LANES);
    check_load_store::<B>();
    check_compare_select::<B>();
    check_masked_ops::<B>();
    check_rounding::<B>();
    check_integer_ops::<B>();
    check_float_bits::<B>();
    check_approximations::<B>();
    check_reductions::<B>();
}

#[test_log::test]
fn scalar_contract() {
    check_all::<Scalar>();
}

#[test_log::test]
fn portable4_contract() {
    check_all::<Portable4>();
}

#[test_log::test]
fn portable8_contract() {
    check_all::<Portable8>();
}

#[test_log::test]
fn portable16_contract() {
    check_all::<Portable16>();
}

#[test_log::test]
fn native_contract() {
    log::info!("native backend: {} x{}", NativeBackend::NAME, NativeBackend::LANES);
    check_all::<NativeBackend>();
}

#[cfg(target_arch = "x86_64")]
#[test_log::test]
fn sse_contract() {
    check_all::<noiseflow::backend::Sse>();
}
