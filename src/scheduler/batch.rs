//! Batched phase scheduler with a barrier between stages.
//!
//! Before each stage the whole cohort is stable-sorted by priority and cut
//! into blocks of the stage's capacity. Blocks run one after another, each
//! vehicle of a block in its own task. No vehicle starts stage N+1 until the
//! entire cohort has finished stage N.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::try_join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    deadline_elapsed, deadline_from_now, RunContext, RunOutcome, ScheduleError, Scheduler,
    SchedulerKind,
};
use crate::model::{Facility, StageKind, Vehicle};
use crate::telemetry::{metrics, EventEmitter};

/// Barrier-synchronized scheduler.
#[derive(Debug, Clone)]
pub struct BatchedScheduler {
    context: RunContext,
}

/// Contiguous blocks of at most `capacity` vehicles, in cohort order.
pub(crate) fn into_blocks(cohort: Vec<Vehicle>, capacity: usize) -> Vec<Vec<Vehicle>> {
    let capacity = capacity.max(1);
    let mut blocks = Vec::with_capacity(cohort.len().div_ceil(capacity));
    let mut iter = cohort.into_iter().peekable();
    while iter.peek().is_some() {
        blocks.push(iter.by_ref().take(capacity).collect());
    }
    blocks
}

impl BatchedScheduler {
    pub fn new(context: RunContext) -> Self {
        Self { context }
    }

    fn serve(&self, emitter: &EventEmitter, mut vehicle: Vehicle, stage: StageKind) -> JoinHandle<Vehicle> {
        let emitter = emitter.clone();
        let clock = self.context.clock.clone();
        tokio::spawn(async move {
            emitter.enter(&vehicle, stage);
            let service = clock.service_time(vehicle.base_service_units());
            tokio::time::sleep(service).await;
            metrics::record_service(stage, service);
            vehicle.current_stage = stage;
            emitter.exit(&vehicle, stage);
            vehicle
        })
    }
}

#[async_trait]
impl Scheduler for BatchedScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Batched
    }

    async fn run(
        &self,
        facility: Arc<Facility>,
        vehicles: Vec<Vehicle>,
    ) -> Result<RunOutcome, ScheduleError> {
        let started = Instant::now();
        let total = vehicles.len();
        let deadline = self.context.config.deadline;
        let deadline_at = deadline_from_now(deadline);
        let emitter = EventEmitter::new(self.context.sink.clone());
        info!(scheduler = "batched", vehicles = total, "run started");

        let mut cohort = vehicles;
        for stage in StageKind::ALL {
            let capacity = facility.stage(stage).capacity();
            // Stable: equal priorities keep their order from the previous stage.
            cohort.sort_by_key(Vehicle::priority);

            let blocks = into_blocks(cohort, capacity);
            debug!(stage = %stage, capacity, blocks = blocks.len(), "stage started");

            let mut finished = Vec::with_capacity(total);
            for block in blocks {
                let mut handles: Vec<_> = block
                    .into_iter()
                    .map(|vehicle| self.serve(&emitter, vehicle, stage))
                    .collect();

                let unfinished = if stage.is_terminal() { total - finished.len() } else { total };
                let joined = tokio::select! {
                    biased;
                    () = self.context.shutdown.cancelled() => {
                        Err(ScheduleError::Cancelled { remaining: unfinished })
                    }
                    () = deadline_elapsed(deadline_at) => {
                        Err(ScheduleError::DeadlineExceeded {
                            remaining: unfinished,
                            deadline: deadline.unwrap_or_default(),
                        })
                    }
                    joined = try_join_all(handles.iter_mut()) => {
                        joined.map_err(|e| ScheduleError::WorkerPanicked(e.to_string()))
                    }
                };

                match joined {
                    Ok(served) => finished.extend(served),
                    Err(e) => {
                        handles.iter().for_each(JoinHandle::abort);
                        warn!(scheduler = "batched", stage = %stage, error = %e, "run aborted");
                        return Err(e);
                    }
                }
            }
            cohort = finished;
        }

        let elapsed = started.elapsed();
        metrics::record_run(SchedulerKind::Batched.as_str(), cohort.len(), elapsed);
        info!(
            scheduler = "batched",
            vehicles = cohort.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "run complete"
        );
        Ok(RunOutcome { vehicles: cohort, elapsed })
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
