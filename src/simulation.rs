//! Scenario runner: build a facility and a fleet, run one scheduler, report.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::model::{Facility, FacilityError, Fleet};
use crate::scheduler::{scheduler_for, RunContext, ScheduleError, SchedulerKind};

/// Scenario parameters supplied by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scenario {
    pub vehicles: usize,
    pub slots: usize,
    pub servers: usize,
}

impl Scenario {
    /// The three reference scenarios.
    pub const CANONICAL: [Scenario; 3] = [
        Scenario::new(10, 10, 10),
        Scenario::new(20, 5, 5),
        Scenario::new(5, 5, 20),
    ];

    pub const fn new(vehicles: usize, slots: usize, servers: usize) -> Self {
        Self { vehicles, slots, servers }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vehicles={} slots={} servers={}",
            self.vehicles, self.slots, self.servers
        )
    }
}

/// Errors from a scenario run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid facility: {0}")]
    Facility(#[from] FacilityError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Timing summary of one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub scheduler: SchedulerKind,
    pub scenario: Scenario,
    pub completed: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub throughput: f64,
}

impl RunReport {
    pub fn new(scheduler: SchedulerKind, scenario: Scenario, completed: usize, elapsed: Duration) -> Self {
        Self {
            scheduler,
            scenario,
            completed,
            elapsed,
            throughput: throughput(completed, elapsed),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<10} {}  total {:.3}s  throughput {:.2} vehicles/s",
            self.scheduler,
            self.scenario,
            self.elapsed.as_secs_f64(),
            self.throughput
        )
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Vehicles per second; zero when no time elapsed.
pub fn throughput(completed: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        completed as f64 / secs
    } else {
        0.0
    }
}

/// Run `scenario` once with the given scheduler over an alternating fleet.
pub async fn run_scenario(
    kind: SchedulerKind,
    scenario: Scenario,
    context: RunContext,
) -> Result<RunReport, SimulationError> {
    let facility = Arc::new(Facility::build(scenario.vehicles, scenario.slots, scenario.servers)?);
    let fleet = Fleet::alternating(scenario.vehicles);

    info!(scheduler = %kind, %scenario, "scenario started");
    let outcome = scheduler_for(kind, context).run(facility, fleet).await?;

    let report = RunReport::new(kind, scenario, outcome.vehicles.len(), outcome.elapsed);
    info!(
        scheduler = %kind,
        elapsed_s = report.elapsed.as_secs_f64(),
        throughput = report.throughput,
        "scenario finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::FixedClock;

    #[test]
    fn throughput_handles_zero_elapsed() {
        assert_eq!(throughput(10, Duration::ZERO), 0.0);
        assert!((throughput(10, Duration::from_secs(4)) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn report_serializes_seconds() {
        let report = RunReport::new(
            SchedulerKind::Batched,
            Scenario::new(4, 2, 2),
            4,
            Duration::from_millis(1500),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scheduler"], "batched");
        assert_eq!(json["elapsed"], 1.5);
        assert_eq!(json["scenario"]["servers"], 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn zero_servers_is_rejected() {
        let context = RunContext::new(Arc::new(FixedClock::new(Duration::from_millis(1))));
        let err = run_scenario(SchedulerKind::Continuous, Scenario::new(3, 3, 0), context)
            .await
            .unwrap_err();
        assert!(matches!(err, SimulationError::Facility(FacilityError::ZeroServers)));
    }
}
