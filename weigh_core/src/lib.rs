#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Weigh-station engine (hardware-agnostic).
//!
//! All hardware access goes through the `weigh_traits` seams, so the whole
//! station runs on a host against the simulated devices or the mocks below.
//!
//! ## Tasks
//!
//! - **Distance sampler** (`sampler`): one range read per 100 ms while armed,
//!   publishes the sample and the speed estimate.
//! - **Advisory** (`advisory`): maps the estimate onto three indicator LEDs.
//! - **Tick source** (`ticker`): 5 ms deadline timer feeding a bounded(1) channel.
//! - **Weighing** (`weighing`): waits for a tick, advances the
//!   Idle -> Sampling -> Reporting state machine, averages two load cells.
//! - **Reporter** (`report`): writes the two result lines to the serial link.
//! - **Command channel** (`command`): runs in the serial driver's byte
//!   callback and applies each operator byte to the system flags and the
//!   barrier output. It has no thread of its own.
//!
//! ## Shared state
//!
//! Cross-task values live in `shared::Shared` as single-word atomics with one
//! writer each; readers always get a consistent snapshot without locking.

pub mod advisory;
pub mod calibration;
pub mod command;
pub mod config;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod report;
pub mod sample;
pub mod sampler;
pub mod shared;
pub mod speed;
pub mod state;
pub mod station;
pub mod status;
pub mod ticker;
pub mod timing;
pub mod weighing;

pub use advisory::{AdvisoryController, AdvisoryLevel};
pub use calibration::LoadCellCalibration;
pub use command::{Command, CommandChannel};
pub use config::StationCfg;
pub use error::{InitError, SensorError, StationError};
pub use report::format_report;
pub use sample::DistanceSample;
pub use speed::{SpeedEstimator, estimate_mps};
pub use state::StateSnapshot;
pub use station::{Station, StationBuilder, StationHandle};
pub use status::{StationStatus, WeighEvent};
pub use ticker::TickStatsSnapshot;
pub use weighing::{WeighPhase, WeighResult, WeighingController, WeightAccumulator};
