//! Correlation statistics over a run history
//!
//! Identical settings always flash the same color. Over uniformly chosen
//! setting pairs this device's rotations (0, π/3, 2π/3) predict agreement
//! (3·1 + 4·3/4 + 2·1/4)/9 = 13/18, which sits above the 5/9 floor every
//! local-hidden-variable model obeys. Mermin's violation needs detectors 120°
//! apart, where the average drops to 1/2.

use serde::Serialize;
use crate::core::{OutcomeEngine, RunHistoryLog};
use crate::types::{DetectorSetting, Outcome, RunRecord};
use crate::SETTING_COUNT;

/// Lower bound on overall agreement for any local-hidden-variable model
pub const LHV_MIN_AGREEMENT: f64 = 5.0 / 9.0;

/// Counts for one (setting1, setting2) pair
#[derive(Debug, Clone, Serialize)]
pub struct PairTally {
    pub setting1: DetectorSetting,
    pub setting2: DetectorSetting,
    pub runs: u64,
    pub agreements: u64,
    /// Runs where detector 1 flashed green
    pub first_positive: u64,
}

impl PairTally {
    fn new(setting1: DetectorSetting, setting2: DetectorSetting) -> Self {
        Self { setting1, setting2, runs: 0, agreements: 0, first_positive: 0 }
    }

    /// Observed P(A = B), if any runs were made
    pub fn observed_agreement(&self) -> Option<f64> {
        (self.runs > 0).then(|| self.agreements as f64 / self.runs as f64)
    }

    /// Predicted P(A = B) = cos²(δ)
    pub fn expected_agreement(&self) -> f64 {
        OutcomeEngine::joint_distribution(self.setting1, self.setting2).agreement()
    }

    /// |observed − expected|
    pub fn error(&self) -> Option<f64> {
        self.observed_agreement()
            .map(|observed| (observed - self.expected_agreement()).abs())
    }

    /// Observed P(A = 1)
    pub fn first_marginal(&self) -> Option<f64> {
        (self.runs > 0).then(|| self.first_positive as f64 / self.runs as f64)
    }

    /// |observed − predicted| for detector 1's marginal
    pub fn marginal_error(&self) -> Option<f64> {
        let expected = OutcomeEngine::joint_distribution(self.setting1, self.setting2).first_positive();
        self.first_marginal().map(|observed| (observed - expected).abs())
    }
}

/// Per-setting-pair tallies, indexed `s1 * 3 + s2`
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationStats {
    pairs: Vec<PairTally>,
}

impl Default for CorrelationStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationStats {
    /// Empty tally for all nine setting pairs
    pub fn new() -> Self {
        let pairs = DetectorSetting::all()
            .flat_map(|a| DetectorSetting::all().map(move |b| PairTally::new(a, b)))
            .collect();
        Self { pairs }
    }

    /// Tally a whole history
    pub fn from_history(history: &RunHistoryLog) -> Self {
        let mut stats = Self::new();
        for record in history {
            stats.record(record);
        }
        stats
    }

    /// Add one run
    pub fn record(&mut self, record: &RunRecord) {
        let outcomes = record.outcomes();
        let tally = &mut self.pairs[index(record.setting1(), record.setting2())];
        tally.runs += 1;
        if outcomes.agree() {
            tally.agreements += 1;
        }
        if outcomes.first == Outcome::One {
            tally.first_positive += 1;
        }
    }

    /// Tally for one setting pair
    pub fn pair(&self, setting1: DetectorSetting, setting2: DetectorSetting) -> &PairTally {
        &self.pairs[index(setting1, setting2)]
    }

    /// All nine tallies, row-major by setting1
    pub fn iter(&self) -> impl Iterator<Item = &PairTally> {
        self.pairs.iter()
    }

    pub fn total_runs(&self) -> u64 {
        self.pairs.iter().map(|p| p.runs).sum()
    }

    /// Observed agreement across every run
    pub fn overall_agreement(&self) -> Option<f64> {
        let runs = self.total_runs();
        let agreements: u64 = self.pairs.iter().map(|p| p.agreements).sum();
        (runs > 0).then(|| agreements as f64 / runs as f64)
    }

    /// Predicted overall agreement, weighting each pair by its run count
    pub fn expected_overall_agreement(&self) -> Option<f64> {
        let runs = self.total_runs();
        let weighted: f64 = self.pairs
            .iter()
            .map(|p| p.runs as f64 * p.expected_agreement())
            .sum();
        (runs > 0).then(|| weighted / runs as f64)
    }

    /// Do all sampled pairs sit within `tolerance` of their prediction,
    /// for both agreement and detector 1's marginal?
    pub fn within_tolerance(&self, tolerance: f64) -> bool {
        self.pairs
            .iter()
            .flat_map(|p| [p.error(), p.marginal_error()])
            .flatten()
            .all(|err| err <= tolerance)
    }

    /// Is the overall agreement below what local hidden variables allow?
    pub fn violates_lhv_bound(&self) -> bool {
        self.overall_agreement()
            .is_some_and(|agreement| agreement < LHV_MIN_AGREEMENT)
    }
}

fn index(setting1: DetectorSetting, setting2: DetectorSetting) -> usize {
    setting1.value() as usize * SETTING_COUNT as usize + setting2.value() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Device;
    use crate::types::OutcomePair;

    fn s(v: i64) -> DetectorSetting {
        DetectorSetting::new(v).unwrap()
    }

    #[test]
    fn test_empty_stats() {
        let stats = CorrelationStats::new();
        assert_eq!(stats.iter().count(), 9);
        assert_eq!(stats.total_runs(), 0);
        assert_eq!(stats.overall_agreement(), None);
        assert!(stats.within_tolerance(0.0));
        assert!(!stats.violates_lhv_bound());
    }

    #[test]
    fn test_pair_lookup() {
        let stats = CorrelationStats::new();
        let tally = stats.pair(s(2), s(0));
        assert_eq!(tally.setting1, s(2));
        assert_eq!(tally.setting2, s(0));
        assert!((tally.expected_agreement() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_settings_stay_above_lhv_bound() {
        let mut device = Device::seeded(2024);
        for _ in 0..2000 {
            for a in DetectorSetting::all() {
                for b in DetectorSetting::all() {
                    device.run(a, b).unwrap();
                }
            }
        }
        let stats = device.stats();
        assert_eq!(stats.total_runs(), 18_000);
        assert!(stats.within_tolerance(0.05));

        let expected = stats.expected_overall_agreement().unwrap();
        assert!((expected - 13.0 / 18.0).abs() < 1e-12);
        let overall = stats.overall_agreement().unwrap();
        assert!((overall - 13.0 / 18.0).abs() < 0.02, "overall agreement {}", overall);
        assert!(!stats.violates_lhv_bound());

        for a in DetectorSetting::all() {
            assert_eq!(stats.pair(a, a).observed_agreement(), Some(1.0));
        }
    }

    #[test]
    fn test_agreement_below_bound_is_flagged() {
        let mut stats = CorrelationStats::new();
        let pair = |first, second| RunRecord::new(s(0), s(2), OutcomePair::new(first, second));
        // 1 agreement out of 4 runs
        for record in [
            pair(Outcome::Zero, Outcome::Zero),
            pair(Outcome::Zero, Outcome::One),
            pair(Outcome::One, Outcome::Zero),
            pair(Outcome::One, Outcome::Zero),
        ] {
            stats.record(&record);
        }
        assert_eq!(stats.overall_agreement(), Some(0.25));
        assert!(stats.violates_lhv_bound());

        let tally = stats.pair(s(0), s(2));
        assert_eq!(tally.first_marginal(), Some(0.5));
        assert_eq!(tally.marginal_error(), Some(0.0));
        assert_eq!(stats.expected_overall_agreement(), Some(tally.expected_agreement()));
    }
}
