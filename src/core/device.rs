//! Device session: engine + history + random source
//!
//! Run flow: settings → OutcomeEngine → colors → RunHistoryLog

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{SeedableRng, TryRngCore};
use crate::core::{CorrelationStats, OutcomeEngine, RunHistoryLog};
use crate::error::{MerminError, Result};
use crate::types::{DetectorSetting, RunRecord};

/// One Mermin device session
///
/// Owns its history; callers get read access through `history()`.
#[derive(Debug)]
pub struct Device<R> {
    engine: OutcomeEngine,
    history: RunHistoryLog,
    rng: R,
}

impl Device<StdRng> {
    /// Reproducible session for tests and demos
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Session seeded from the operating system
    pub fn from_os_rng() -> Result<Self> {
        StdRng::try_from_os_rng()
            .map(Self::new)
            .map_err(|e| MerminError::RandomSource(e.to_string()))
    }
}

impl<R: TryRngCore> Device<R> {
    /// Create a session around a random source
    pub fn new(rng: R) -> Self {
        Self {
            engine: OutcomeEngine::new(),
            history: RunHistoryLog::new(),
            rng,
        }
    }

    /// Run once and record the result
    ///
    /// Nothing is appended if the run fails.
    pub fn run(&mut self, setting1: DetectorSetting, setting2: DetectorSetting) -> Result<RunRecord> {
        let outcomes = self.engine.run(setting1, setting2, &mut self.rng)?;
        let record = RunRecord::new(setting1, setting2, outcomes);
        let index = self.history.append(record);
        debug!("recorded run #{}: {}", index, record);
        Ok(record)
    }

    /// Run with raw settings, rejecting anything outside {0, 1, 2}
    pub fn run_raw(&mut self, setting1: i64, setting2: i64) -> Result<RunRecord> {
        let settings = DetectorSetting::new(setting1).and_then(|s1| {
            DetectorSetting::new(setting2).map(|s2| (s1, s2))
        });
        match settings {
            Ok((s1, s2)) => self.run(s1, s2),
            Err(e) => {
                warn!("rejected run: {}", e);
                Err(e)
            }
        }
    }

    /// Read-only view of the history
    pub fn history(&self) -> &RunHistoryLog {
        &self.history
    }

    /// Tally the history by setting pair
    pub fn stats(&self) -> CorrelationStats {
        CorrelationStats::from_history(&self.history)
    }

    /// End the session, keeping its history
    pub fn into_history(self) -> RunHistoryLog {
        self.history
    }
}
