//! Workshop Core
//!
//! A concurrent simulation of a vehicle repair workshop. Vehicles arrive
//! with an incident, are prioritised by the incident category and flow
//! through four stages (waiting for a slot, repair, cleaning, delivery).
//!
//! # Schedulers
//!
//! - **Continuous**: each stage has its own workers; a vehicle moves on as
//!   soon as it finishes a stage, so stages overlap like a pipeline.
//! - **Batched**: the whole fleet finishes a stage before any vehicle starts
//!   the next one; within a stage vehicles are served in priority-ordered
//!   blocks no larger than the stage capacity.
//!
//! # Layout
//!
//! - [`model`]: incidents, vehicles, stages and the facility
//! - [`scheduler`]: priority queues and the two scheduling strategies
//! - [`timing`]: service-time clocks with seeded jitter
//! - [`simulation`]: scenario runner and timing reports
//! - [`telemetry`]: logging, stage events and metrics
//! - [`config`]: environment and TOML configuration

pub mod cli;
pub mod config;
pub mod model;
pub mod scheduler;
pub mod simulation;
pub mod telemetry;
pub mod timing;

pub use config::WorkshopConfig;
pub use model::{Category, Facility, Fleet, Incident, Priority, StageKind, Vehicle};
pub use scheduler::{RunContext, RunOutcome, ScheduleError, Scheduler, SchedulerKind};
pub use simulation::{run_scenario, RunReport, Scenario, SimulationError};
