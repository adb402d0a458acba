//! Runtime CPU capability probe.
//!
//! Backends are selected at compile time, but a binary built for AVX2 can still
//! land on a CPU without it. [`CpuFeatures::detect`] reports what the running
//! CPU actually has so callers can pick a backend whose
//! [`Backend::REQUIRED`](super::Backend::REQUIRED) set is covered.

use bitflags::bitflags;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Instruction-set extensions relevant to the SIMD backends.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CpuFeatures: u32 {
        const SSE2 = 1 << 0;
        const SSE41 = 1 << 1;
        const FMA = 1 << 2;
        const AVX2 = 1 << 3;
        const AVX512F = 1 << 4;
        const NEON = 1 << 5;
    }
}

static DETECTED: Lazy<CpuFeatures> = Lazy::new(|| {
    let features = probe();
    log::debug!("detected cpu features: {:?}", features);
    features
});

impl CpuFeatures {
    /// Features of the running CPU. Probed once, then cached.
    #[inline]
    pub fn detect() -> CpuFeatures {
        *DETECTED
    }

    /// Features the compiler was allowed to assume for this binary.
    pub const fn compiled() -> CpuFeatures {
        let mut bits = 0;
        if cfg!(target_feature = "sse2") {
            bits |= CpuFeatures::SSE2.bits();
        }
        if cfg!(target_feature = "sse4.1") {
            bits |= CpuFeatures::SSE41.bits();
        }
        if cfg!(target_feature = "fma") {
            bits |= CpuFeatures::FMA.bits();
        }
        if cfg!(target_feature = "avx2") {
            bits |= CpuFeatures::AVX2.bits();
        }
        if cfg!(target_feature = "avx512f") {
            bits |= CpuFeatures::AVX512F.bits();
        }
        if cfg!(target_feature = "neon") {
            bits |= CpuFeatures::NEON.bits();
        }
        CpuFeatures::from_bits_truncate(bits)
    }
}

#[cfg(target_arch = "x86_64")]
fn probe() -> CpuFeatures {
    let mut features = CpuFeatures::empty();
    if std::arch::is_x86_feature_detected!("sse2") {
        features |= CpuFeatures::SSE2;
    }
    if std::arch::is_x86_feature_detected!("sse4.1") {
        features |= CpuFeatures::SSE41;
    }
    if std::arch::is_x86_feature_detected!("fma") {
        features |= CpuFeatures::FMA;
    }
    if std::arch::is_x86_feature_detected!("avx2") {
        features |= CpuFeatures::AVX2;
    }
    if std::arch::is_x86_feature_detected!("avx512f") {
        features |= CpuFeatures::AVX512F;
    }
    features
}

#[cfg(target_arch = "aarch64")]
fn probe() -> CpuFeatures {
    let mut features = CpuFeatures::empty();
    if std::arch::is_aarch64_feature_detected!("neon") {
        features |= CpuFeatures::NEON;
    }
    features
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn probe() -> CpuFeatures {
    CpuFeatures::empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_is_stable() {
        assert_eq!(CpuFeatures::detect(), CpuFeatures::detect());
    }

    #[test]
    fn running_cpu_covers_compiled_features() {
        // The binary could not have started otherwise.
        let compiled = CpuFeatures::compiled();
        assert!(CpuFeatures::detect().contains(compiled));
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn x86_64_always_has_sse2() {
        assert!(CpuFeatures::detect().contains(CpuFeatures::SSE2));
    }
}
