//! Detector outcomes and their display colors

use serde::{Deserialize, Serialize};

/// Binary result of one detector on one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Outcome {
    /// Detector fired negative (measured |0⟩)
    Zero,
    /// Detector fired positive (measured |1⟩)
    One,
}

impl Outcome {
    /// Build from a measured bit
    pub fn from_bit(bit: bool) -> Self {
        if bit { Outcome::One } else { Outcome::Zero }
    }

    /// Outcome as 0 or 1
    pub fn bit(&self) -> u8 {
        match self {
            Outcome::Zero => 0,
            Outcome::One => 1,
        }
    }

    /// The opposite outcome
    pub fn flip(&self) -> Self {
        match self {
            Outcome::Zero => Outcome::One,
            Outcome::One => Outcome::Zero,
        }
    }

    /// Indicator color for this outcome
    pub fn color(&self) -> Color {
        Color::from(*self)
    }
}

impl From<Outcome> for u8 {
    fn from(outcome: Outcome) -> u8 {
        outcome.bit()
    }
}

impl TryFrom<u8> for Outcome {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Outcome::Zero),
            1 => Ok(Outcome::One),
            other => Err(format!("outcome must be 0 or 1, got {}", other)),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bit())
    }
}

/// Outcomes of both detectors from a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomePair {
    /// Detector 1
    pub first: Outcome,
    /// Detector 2
    pub second: Outcome,
}

impl OutcomePair {
    pub fn new(first: Outcome, second: Outcome) -> Self {
        Self { first, second }
    }

    /// Did both detectors flash the same color?
    pub fn agree(&self) -> bool {
        self.first == self.second
    }
}

/// Indicator lamp color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
}

impl Color {
    /// Name as written in exported history
    pub fn name(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
        }
    }

    /// Parse an exported color name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            _ => None,
        }
    }

    /// The outcome this color stands for
    pub fn outcome(&self) -> Outcome {
        match self {
            Color::Red => Outcome::Zero,
            Color::Green => Outcome::One,
        }
    }
}

impl From<Outcome> for Color {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Zero => Color::Red,
            Outcome::One => Color::Green,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Map an outcome to its indicator color (0 → red, 1 → green)
pub fn map_to_color(outcome: Outcome) -> Color {
    Color::from(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mapping() {
        assert_eq!(map_to_color(Outcome::Zero), Color::Red);
        assert_eq!(map_to_color(Outcome::One), Color::Green);
    }

    #[test]
    fn test_color_mapping_is_bijective() {
        for outcome in [Outcome::Zero, Outcome::One] {
            assert_eq!(outcome.color().outcome(), outcome);
        }
        for color in [Color::Red, Color::Green] {
            assert_eq!(Color::from_name(color.name()), Some(color));
        }
        assert_eq!(Color::from_name("blue"), None);
    }

    #[test]
    fn test_flip_and_bits() {
        assert_eq!(Outcome::Zero.flip(), Outcome::One);
        assert_eq!(Outcome::One.flip().bit(), 0);
        assert_eq!(Outcome::from_bit(true), Outcome::One);
    }

    #[test]
    fn test_pair_agreement() {
        assert!(OutcomePair::new(Outcome::One, Outcome::One).agree());
        assert!(!OutcomePair::new(Outcome::Zero, Outcome::One).agree());
    }

    #[test]
    fn test_serde_forms() {
        assert_eq!(serde_json::to_string(&Color::Green).unwrap(), "\"green\"");
        assert_eq!(serde_json::to_string(&Outcome::One).unwrap(), "1");
        assert!(serde_json::from_str::<Outcome>("2").is_err());
    }
}
