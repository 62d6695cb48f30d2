//! Running a batch of file moves on a worker pool.
//!
//! - `governor` decides how many workers a run gets
//! - `telemetry` samples the host for the governor
//! - `scheduler` splits the files and drives the workers
//! - `mover` performs collision-safe moves

pub mod governor;
pub mod mover;
pub mod scheduler;
pub mod telemetry;

pub use governor::{optimal_workers, HostTier, WorkerPlan};
pub use mover::{move_into, relocate};
pub use scheduler::{partition, SchedulerReport};
pub use telemetry::{SysinfoProbe, SystemTelemetry, TelemetryProbe};
