//! Mermin's device: two detectors, three settings each, one entangled pair
//!
//! Each run picks a setting per detector, samples a correlated pair of
//! red/green flashes from the quantum prediction, and appends it to the
//! session history.
//!
//! Flow: settings → OutcomeEngine → Color → RunHistoryLog → export

pub mod core;
pub mod error;
pub mod types;

pub use error::{MerminError, Result};

// =============================================================================
// DEVICE
// =============================================================================

/// Number of positions on each detector's switch
pub const SETTING_COUNT: u8 = 3;

// =============================================================================
// STATISTICS
// =============================================================================

/// Trials per setting pair in stats mode
pub const DEFAULT_TRIALS: usize = 10_000;

/// Acceptable |observed - expected| agreement for DEFAULT_TRIALS runs
pub const STATISTICAL_TOLERANCE: f64 = 0.02;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
