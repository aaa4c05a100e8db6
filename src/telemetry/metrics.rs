//! Metrics recorded through the `metrics` facade.
//!
//! No exporter is installed by this crate; without a recorder every call is
//! a no-op.

use std::time::Duration;

use super::events::StageState;
use crate::model::StageKind;

pub const STAGE_EVENTS_TOTAL: &str = "workshop_stage_events_total";
pub const SERVICE_SECONDS: &str = "workshop_service_seconds";
pub const VEHICLES_COMPLETED_TOTAL: &str = "workshop_vehicles_completed_total";
pub const RUN_SECONDS: &str = "workshop_run_seconds";

pub fn record_stage_event(stage: StageKind, state: StageState) {
    ::metrics::counter!(STAGE_EVENTS_TOTAL, "stage" => stage.name(), "state" => state.as_str())
        .increment(1);
}

pub fn record_service(stage: StageKind, service: Duration) {
    ::metrics::histogram!(SERVICE_SECONDS, "stage" => stage.name()).record(service.as_secs_f64());
}

pub fn record_run(scheduler: &'static str, completed: usize, elapsed: Duration) {
    ::metrics::counter!(VEHICLES_COMPLETED_TOTAL, "scheduler" => scheduler)
        .increment(completed as u64);
    ::metrics::histogram!(RUN_SECONDS, "scheduler" => scheduler).record(elapsed.as_secs_f64());
}
