//! Run records - one per press of "Run"

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::types::{Color, DetectorSetting, OutcomePair};

/// Immutable result of one run: both settings and both outcomes
///
/// Serializes as the 4-element array `[setting1, setting2, color1, color2]`
/// used by the JSON history export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRecord {
    setting1: DetectorSetting,
    setting2: DetectorSetting,
    outcomes: OutcomePair,
}

impl RunRecord {
    pub fn new(setting1: DetectorSetting, setting2: DetectorSetting, outcomes: OutcomePair) -> Self {
        Self { setting1, setting2, outcomes }
    }

    pub fn setting1(&self) -> DetectorSetting {
        self.setting1
    }

    pub fn setting2(&self) -> DetectorSetting {
        self.setting2
    }

    pub fn outcomes(&self) -> OutcomePair {
        self.outcomes
    }

    /// Indicator colors of detector 1 and detector 2
    pub fn colors(&self) -> (Color, Color) {
        (self.outcomes.first.color(), self.outcomes.second.color())
    }

    /// Did both detectors flash the same color?
    pub fn agrees(&self) -> bool {
        self.outcomes.agree()
    }
}

/// Plain-text history line: `(0, 2, 'red', 'green')`
impl std::fmt::Display for RunRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (c1, c2) = self.colors();
        write!(f, "({}, {}, '{}', '{}')", self.setting1, self.setting2, c1, c2)
    }
}

impl Serialize for RunRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let (c1, c2) = self.colors();
        (self.setting1, self.setting2, c1, c2).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RunRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (setting1, setting2, c1, c2) =
            <(DetectorSetting, DetectorSetting, Color, Color)>::deserialize(deserializer)?;
        Ok(Self::new(setting1, setting2, OutcomePair::new(c1.outcome(), c2.outcome())))
    }
}
