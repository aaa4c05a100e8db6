//! Vehicle scheduling for the workshop.
//!
//! Two interchangeable strategies drive a fleet through the four stages:
//! a continuous worker-pool pipeline where stages overlap, and a batched
//! scheduler with a barrier between stages.

mod batch;
mod continuous;
mod error;
mod latch;
mod priority;
mod queue;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::model::{Facility, Vehicle};
use crate::telemetry::{EventSink, NullSink};
use crate::timing::ServiceClock;

pub use batch::BatchedScheduler;
pub use continuous::ContinuousScheduler;
pub use error::ScheduleError;
pub use latch::CompletionLatch;
pub use priority::{PrioritizedItem, PriorityQueue};
pub use queue::StageQueue;

/// Default idle wait of a continuous worker before it rechecks its queue.
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// Which scheduling strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    Continuous,
    Batched,
}

impl SchedulerKind {
    pub const ALL: [SchedulerKind; 2] = [Self::Continuous, Self::Batched];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Batched => "batched",
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" | "pipeline" => Ok(Self::Continuous),
            "batched" | "batch" => Ok(Self::Batched),
            other => Err(format!("unknown scheduler: {other}")),
        }
    }
}

/// Tuning shared by both schedulers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Longest an idle continuous worker waits before rechecking its queue.
    pub idle_backoff: Duration,
    /// Optional limit on the whole run.
    pub deadline: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { idle_backoff: DEFAULT_IDLE_BACKOFF, deadline: None }
    }
}

/// Collaborators a scheduler needs for a run.
#[derive(Clone)]
pub struct RunContext {
    pub clock: Arc<dyn ServiceClock>,
    pub sink: Arc<dyn EventSink>,
    pub config: SchedulerConfig,
    /// External shutdown; cancelling it aborts any run in progress.
    pub shutdown: CancellationToken,
}

impl RunContext {
    pub fn new(clock: Arc<dyn ServiceClock>) -> Self {
        Self {
            clock,
            sink: Arc::new(NullSink),
            config: SchedulerConfig::default(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("unit", &self.clock.unit())
            .field("config", &self.config)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish()
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Every submitted vehicle, each at the terminal stage.
    pub vehicles: Vec<Vehicle>,
    pub elapsed: Duration,
}

/// Common contract of the two scheduling strategies.
#[async_trait]
pub trait Scheduler: Send + Sync {
    fn kind(&self) -> SchedulerKind;

    /// Drive every vehicle from the first stage through the terminal stage.
    /// Returns once all of them have completed, or on deadline/cancellation.
    async fn run(
        &self,
        facility: Arc<Facility>,
        vehicles: Vec<Vehicle>,
    ) -> Result<RunOutcome, ScheduleError>;
}

/// Build the scheduler for `kind` over the given collaborators.
pub fn scheduler_for(kind: SchedulerKind, context: RunContext) -> Box<dyn Scheduler> {
    match kind {
        SchedulerKind::Continuous => Box::new(ContinuousScheduler::new(context)),
        SchedulerKind::Batched => Box::new(BatchedScheduler::new(context)),
    }
}

/// Instant at which a run started now must stop. A deadline too far out to
/// represent is treated as no deadline.
fn deadline_from_now(deadline: Option<Duration>) -> Option<tokio::time::Instant> {
    deadline.and_then(|d| tokio::time::Instant::now().checked_add(d))
}

/// Resolves when `deadline` passes; never resolves without one.
async fn deadline_elapsed(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => futures::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_kind_parses_aliases() {
        assert_eq!("Continuous".parse::<SchedulerKind>(), Ok(SchedulerKind::Continuous));
        assert_eq!("batch".parse::<SchedulerKind>(), Ok(SchedulerKind::Batched));
        assert!("round-robin".parse::<SchedulerKind>().is_err());
    }

    #[tokio::test]
    async fn unrepresentable_deadline_means_none() {
        assert!(deadline_from_now(Some(Duration::from_secs(u64::MAX))).is_none());
        assert!(deadline_from_now(None).is_none());
        assert!(deadline_from_now(Some(Duration::from_secs(5))).is_some());
    }

    #[test]
    fn scheduler_for_matches_kind() {
        let clock = Arc::new(crate::timing::FixedClock::new(Duration::from_millis(1)));
        for kind in SchedulerKind::ALL {
            let scheduler = scheduler_for(kind, RunContext::new(clock.clone()));
            assert_eq!(scheduler.kind(), kind);
        }
    }
}
