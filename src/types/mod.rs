//! Core types for the Mermin device

mod setting;
mod outcome;
mod record;
mod format;

pub use setting::{DetectorSetting, AngleFraction, to_angle_fraction};
pub use outcome::{Outcome, OutcomePair, Color, map_to_color};
pub use record::RunRecord;
pub use format::ExportFormat;
