//! Core modules for the Mermin device

pub mod engine;
pub mod history;
pub mod device;
pub mod stats;
pub mod command;
pub mod api;

pub use engine::{OutcomeEngine, JointDistribution};
pub use history::RunHistoryLog;
pub use device::Device;
pub use stats::{CorrelationStats, PairTally, LHV_MIN_AGREEMENT};
pub use command::{Command, parse_command};
pub use api::{create_router, run_server};
