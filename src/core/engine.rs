//! Outcome Engine: samples correlated detector outcomes
//!
//! The two detectors measure a qubit pair prepared in
//! `|Φ⁻⟩ = (|00⟩ − |11⟩)/√2` (X and H on qubit 1, then CNOT 1→2). Qubit 1 is
//! rotated about X by `θ = π·s1/3`, qubit 2 by `φ = π·s2/3`, and both are
//! measured in the computational basis. The joint law is
//!
//! ```text
//! P(00) = P(11) = cos²((θ−φ)/2) / 2
//! P(01) = P(10) = sin²((θ−φ)/2) / 2
//! ```
//!
//! Both marginals are uniform, so sampling needs only two draws: an unbiased
//! coin for detector 1 and a biased agreement test for detector 2.

use log::debug;
use rand::TryRngCore;
use serde::Serialize;
use crate::error::{MerminError, Result};
use crate::types::{DetectorSetting, Outcome, OutcomePair};

/// 2^-53, scales the top 53 bits of a u64 into [0, 1)
const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Exact probabilities of the four outcome pairs for one setting pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JointDistribution {
    pub p00: f64,
    pub p01: f64,
    pub p10: f64,
    pub p11: f64,
}

impl JointDistribution {
    /// P(A = B)
    pub fn agreement(&self) -> f64 {
        self.p00 + self.p11
    }

    /// P(A = 1), detector 1's marginal
    pub fn first_positive(&self) -> f64 {
        self.p10 + self.p11
    }
}

/// Stateless sampler for the device's detector pair
///
/// Safe to share between threads; every call brings its own random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutcomeEngine;

impl OutcomeEngine {
    /// Create new engine
    pub fn new() -> Self {
        Self
    }

    /// Half the angle between the two detectors: `δ = (θ − φ)/2 = π·(s1 − s2)/6`
    pub fn half_angle(setting1: DetectorSetting, setting2: DetectorSetting) -> f64 {
        let theta = setting1.angle_fraction().radians();
        let phi = setting2.angle_fraction().radians();
        (theta - phi) / 2.0
    }

    /// P(A = B) = cos²(δ)
    pub fn agreement_probability(setting1: DetectorSetting, setting2: DetectorSetting) -> f64 {
        let c = Self::half_angle(setting1, setting2).cos();
        c * c
    }

    /// Closed-form joint distribution for a setting pair
    pub fn joint_distribution(setting1: DetectorSetting, setting2: DetectorSetting) -> JointDistribution {
        let agree = Self::agreement_probability(setting1, setting2);
        let differ = 1.0 - agree;
        JointDistribution {
            p00: agree / 2.0,
            p01: differ / 2.0,
            p10: differ / 2.0,
            p11: agree / 2.0,
        }
    }

    /// Run the device once and sample both outcomes
    ///
    /// Draws exactly two `u64`s from `rng`. A failing source aborts the run
    /// with `RandomSource`.
    pub fn run<R: TryRngCore>(
        &self,
        setting1: DetectorSetting,
        setting2: DetectorSetting,
        rng: &mut R,
    ) -> Result<OutcomePair> {
        let coin = draw(rng)?;
        let first = Outcome::from_bit(coin >> 63 == 1);

        let u = (draw(rng)? >> 11) as f64 * UNIT_SCALE;
        let p_agree = Self::agreement_probability(setting1, setting2);
        let second = if u < p_agree { first } else { first.flip() };

        debug!(
            "run settings=({}, {}) angles=({}π, {}π) p_agree={:.4} outcomes=({}, {})",
            setting1, setting2, setting1.angle_fraction(), setting2.angle_fraction(), p_agree, first, second
        );

        Ok(OutcomePair::new(first, second))
    }

    /// Same as `run`, validating raw settings first (no entropy is consumed on rejection)
    pub fn run_raw<R: TryRngCore>(&self, setting1: i64, setting2: i64, rng: &mut R) -> Result<OutcomePair> {
        let s1 = DetectorSetting::new(setting1)?;
        let s2 = DetectorSetting::new(setting2)?;
        self.run(s1, s2, rng)
    }
}

fn draw<R: TryRngCore>(rng: &mut R) -> Result<u64> {
    rng.try_next_u64()
        .map_err(|e| MerminError::RandomSource(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
