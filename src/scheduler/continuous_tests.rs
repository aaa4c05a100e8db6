//! Tests for the continuous pipeline scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::ContinuousScheduler;
use crate::config::WorkshopConfig;
use crate::model::{Facility, Fleet, StageKind};
use crate::scheduler::{RunContext, ScheduleError, Scheduler, SchedulerConfig};
use crate::telemetry::RecordingSink;
use crate::timing::{FixedClock, JitterClock};

const UNIT: Duration = Duration::from_millis(2);

fn context(sink: Arc<RecordingSink>) -> RunContext {
    RunContext::new(Arc::new(FixedClock::new(UNIT))).with_sink(sink)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_vehicle_reaches_delivery() {
    let sink = Arc::new(RecordingSink::new());
    let scheduler = ContinuousScheduler::new(context(sink.clone()));
    let facility = Arc::new(Facility::build(9, 3, 3).unwrap());

    let outcome = scheduler.run(facility.clone(), Fleet::alternating(9)).await.unwrap();

    assert_eq!(outcome.vehicles.len(), 9);
    assert!(outcome.vehicles.iter().all(|v| v.current_stage == StageKind::Delivery));
    assert_eq!(sink.completions(), 9);
    assert_eq!(facility.queued(), 0);

    let mut plates: Vec<_> = outcome.vehicles.iter().map(|v| v.plate.clone()).collect();
    plates.sort();
    plates.dedup();
    assert_eq!(plates.len(), 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stage_concurrency_never_exceeds_capacity() {
    let sink = Arc::new(RecordingSink::new());
    let scheduler = ContinuousScheduler::new(context(sink.clone()));
    let facility = Arc::new(Facility::build(12, 4, 2).unwrap());

    scheduler.run(facility, Fleet::alternating(12)).await.unwrap();

    assert!(sink.max_in_service(StageKind::WaitingForSlot) <= 4);
    for stage in [StageKind::Repair, StageKind::Cleaning, StageKind::Delivery] {
        let peak = sink.max_in_service(stage);
        assert!((1..=2).contains(&peak), "{stage} peaked at {peak}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn single_worker_serves_in_priority_order() {
    let sink = Arc::new(RecordingSink::new());
    let scheduler = ContinuousScheduler::new(context(sink.clone()));
    let facility = Arc::new(Facility::build(6, 1, 1).unwrap());

    // Submitted as bodywork, mechanical, electrical.
    let mut fleet = Fleet::by_category(2, 2, 2);
    fleet.rotate_left(4);

    scheduler.run(facility, fleet).await.unwrap();

    // All six are seeded before the lone slot worker starts popping.
    assert_eq!(
        sink.entry_order(StageKind::WaitingForSlot),
        vec!["CAR001", "CAR002", "CAR003", "CAR004", "CAR005", "CAR006"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stages_overlap_in_time() {
    let sink = Arc::new(RecordingSink::new());
    let clock = Arc::new(FixedClock::new(Duration::from_millis(5)));
    let scheduler = ContinuousScheduler::new(RunContext::new(clock).with_sink(sink.clone()));
    let facility = Arc::new(Facility::build(6, 6, 6).unwrap());

    scheduler.run(facility, Fleet::alternating(6)).await.unwrap();

    // Bodywork cars leave slot-wait and start repair while mechanical
    // cars are still being served in slot-wait.
    assert!(!sink.stages_are_barriered());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn empty_fleet_returns_immediately() {
    let scheduler = ContinuousScheduler::new(context(Arc::new(RecordingSink::new())));
    let facility = Arc::new(Facility::build(0, 2, 2).unwrap());

    let outcome = tokio::time::timeout(Duration::from_secs(1), scheduler.run(facility, Vec::new()))
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.vehicles.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deadline_aborts_run() {
    let clock = Arc::new(FixedClock::new(Duration::from_millis(50)));
    let config = SchedulerConfig { deadline: Some(Duration::from_millis(30)), ..Default::default() };
    let scheduler = ContinuousScheduler::new(RunContext::new(clock).with_config(config));
    let facility = Arc::new(Facility::build(3, 1, 1).unwrap());

    let err = scheduler.run(facility.clone(), Fleet::alternating(3)).await.unwrap_err();
    assert!(matches!(err, ScheduleError::DeadlineExceeded { remaining: 3, .. }), "{err}");
    assert_eq!(facility.queued(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn far_future_deadline_from_config_runs_to_completion() {
    let config = WorkshopConfig::from_toml_str(
        "time_unit_ms = 1\njitter = false\ndeadline_secs = 9223372036854775807",
    )
    .unwrap();
    let context = RunContext::new(config.build_clock()).with_config(config.scheduler_config());
    let scheduler = ContinuousScheduler::new(context);
    let facility = Arc::new(Facility::build(3, 3, 3).unwrap());

    let outcome = scheduler.run(facility, Fleet::alternating(3)).await.unwrap();
    assert_eq!(outcome.vehicles.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn external_shutdown_cancels_run() {
    let shutdown = CancellationToken::new();
    let clock = Arc::new(FixedClock::new(Duration::from_millis(50)));
    let scheduler =
        ContinuousScheduler::new(RunContext::new(clock).with_shutdown(shutdown.clone()));
    let facility = Arc::new(Facility::build(4, 2, 2).unwrap());

    let trigger = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(2),
        scheduler.run(facility, Fleet::alternating(4)),
    )
    .await
    .unwrap()
    .unwrap_err();
    assert_eq!(err, ScheduleError::Cancelled { remaining: 4 });
    trigger.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn jittered_run_converges() {
    let sink = Arc::new(RecordingSink::new());
    let clock = Arc::new(JitterClock::seeded(Duration::from_millis(1), 99));
    let scheduler = ContinuousScheduler::new(RunContext::new(clock).with_sink(sink.clone()));
    let facility = Arc::new(Facility::build(20, 5, 5).unwrap());

    let outcome = scheduler.run(facility, Fleet::alternating(20)).await.unwrap();
    assert_eq!(outcome.vehicles.len(), 20);
    assert_eq!(sink.len(), 20 * 4 * 2);
}
