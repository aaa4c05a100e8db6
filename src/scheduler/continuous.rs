//! Continuous pipeline: persistent per-stage workers with overlapping stages.
//!
//! Every stage gets `capacity` workers. A worker pops the head of its stage
//! queue, serves the vehicle, then pushes it into the next stage's queue.
//! Stages run concurrently, so a fast vehicle can reach delivery while slow
//! ones are still in repair.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::latch::CompletionLatch;
use super::{
    deadline_elapsed, deadline_from_now, RunContext, RunOutcome, ScheduleError, Scheduler,
    SchedulerKind,
};
use crate::model::{Facility, StageKind, Vehicle};
use crate::telemetry::{metrics, EventEmitter};

/// Worker-pool scheduler where stages overlap in time.
#[derive(Debug, Clone)]
pub struct ContinuousScheduler {
    context: RunContext,
}

/// State shared by every worker of one run.
struct RunShared {
    facility: Arc<Facility>,
    context: RunContext,
    emitter: EventEmitter,
    latch: CompletionLatch,
    completed: Mutex<Vec<Vehicle>>,
    /// Cancelled once the latch is released or the run is aborted.
    stop: CancellationToken,
}

impl ContinuousScheduler {
    pub fn new(context: RunContext) -> Self {
        Self { context }
    }

    fn spawn_workers(shared: &Arc<RunShared>) -> JoinSet<()> {
        let mut workers = JoinSet::new();
        for stage in shared.facility.stages() {
            for worker in 0..stage.capacity() {
                workers.spawn(worker_loop(shared.clone(), stage.kind(), worker));
            }
        }
        workers
    }
}

#[async_trait]
impl Scheduler for ContinuousScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Continuous
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

        let shared = Arc::new(RunShared {
            facility: facility.clone(),
            context: self.context.clone(),
            emitter: EventEmitter::new(self.context.sink.clone()),
            latch: CompletionLatch::new(total),
            completed: Mutex::new(Vec::with_capacity(total)),
            stop: self.context.shutdown.child_token(),
        });

        facility
            .stage(StageKind::WaitingForSlot)
            .queue()
            .enqueue_all(vehicles.into_iter().map(|mut v| {
                v.current_stage = StageKind::WaitingForSlot;
                v
            }));
        info!(scheduler = "continuous", vehicles = total, "run started");

        let mut workers = Self::spawn_workers(&shared);

        let result = loop {
            tokio::select! {
                biased;
                () = shared.latch.wait() => break Ok(()),
                () = self.context.shutdown.cancelled() => {
                    break Err(ScheduleError::Cancelled { remaining: shared.latch.remaining() });
                }
                () = deadline_elapsed(deadline_at), if deadline_at.is_some() => {
                    break Err(ScheduleError::DeadlineExceeded {
                        remaining: shared.latch.remaining(),
                        deadline: deadline.unwrap_or_default(),
                    });
                }
                Some(joined) = workers.join_next() => {
                    // Workers only exit early when they fail.
                    if let Err(e) = joined {
                        break Err(ScheduleError::WorkerPanicked(e.to_string()));
                    }
                }
            }
        };

        shared.stop.cancel();
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "worker failed during shutdown");
            }
        }

        let elapsed = started.elapsed();
        match result {
            Ok(()) => {
                let vehicles = std::mem::take(&mut *shared.completed.lock());
                metrics::record_run(SchedulerKind::Continuous.as_str(), vehicles.len(), elapsed);
                info!(
                    scheduler = "continuous",
                    vehicles = vehicles.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "run complete"
                );
                Ok(RunOutcome { vehicles, elapsed })
            }
            Err(e) => {
                // Leave the facility reusable after an aborted run.
                let abandoned: usize = facility.stages().iter().map(|s| s.queue().drain().len()).sum();
                warn!(scheduler = "continuous", error = %e, abandoned, "run aborted");
                Err(e)
            }
        }
    }
}

async fn worker_loop(shared: Arc<RunShared>, stage: StageKind, worker: usize) {
    let queue = shared.facility.stage(stage).queue();
    let backoff = shared.context.config.idle_backoff;

    loop {
        if shared.stop.is_cancelled() {
            break;
        }

        let notified = queue.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        // Lock is held only for the pop.
        let Some(mut vehicle) = queue.dequeue() else {
            tokio::select! {
                biased;
                () = shared.stop.cancelled() => break,
                () = notified.as_mut() => {}
                () = tokio::time::sleep(backoff) => {}
            }
            continue;
        };

        shared.emitter.enter(&vehicle, stage);
        let service = shared.context.clock.service_time(vehicle.base_service_units());
        tokio::select! {
            biased;
            () = shared.stop.cancelled() => break,
            () = tokio::time::sleep(service) => {}
        }
        metrics::record_service(stage, service);
        shared.emitter.exit(&vehicle, stage);

        match stage.next() {
            Some(next) => {
                vehicle.current_stage = next;
                shared.facility.stage(next).queue().enqueue(vehicle);
            }
            None => {
                shared.completed.lock().push(vehicle);
                let remaining = shared.latch.count_down();
                if remaining == 0 {
                    shared.stop.cancel();
                }
            }
        }
    }

    debug!(stage = %stage, worker, "worker stopped");
}

#[cfg(test)]
#[path = "continuous_tests.rs"]
mod tests;
