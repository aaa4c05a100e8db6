//! Stage entry/exit events and the sinks that consume them.
//!
//! Events are purely observational; no scheduling decision reads them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use super::metrics;
use crate::model::{Category, StageKind, Vehicle, NUM_STAGES};

/// Whether a vehicle is entering or leaving service in a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageState {
    Enter,
    Exit,
}

impl StageState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "ENTER",
            Self::Exit => "EXIT",
        }
    }
}

/// One vehicle entering or leaving service in one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageEvent {
    /// Time since the run started.
    pub elapsed: Duration,
    pub vehicle: String,
    pub category: Category,
    pub stage: StageKind,
    pub state: StageState,
}

/// Receiver of stage events.
pub trait EventSink: Send + Sync {
    fn record(&self, event: StageEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: StageEvent) {}
}

/// Emits one `tracing` line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: StageEvent) {
        tracing::info!(
            time = format_args!("{:.3}", event.elapsed.as_secs_f64()),
            vehicle = %event.vehicle,
            incident = %event.category,
            stage = %event.stage,
            state = event.state.as_str(),
            "stage event"
        );
    }
}

/// Keeps every event in arrival order.
///
/// Events are appended under a lock, so the stored order is a consistent
/// linearization of what the schedulers did.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StageEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StageEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Highest number of vehicles simultaneously in service in `stage`.
    pub fn max_in_service(&self, stage: StageKind) -> usize {
        let events = self.events.lock();
        let mut current = 0usize;
        let mut peak = 0usize;
        for event in events.iter().filter(|e| e.stage == stage) {
            match event.state {
                StageState::Enter => {
                    current += 1;
                    peak = peak.max(current);
                }
                StageState::Exit => current = current.saturating_sub(1),
            }
        }
        peak
    }

    /// True when every exit from a stage precedes every entry into the next.
    pub fn stages_are_barriered(&self) -> bool {
        let events = self.events.lock();
        let mut last_exit = [None::<usize>; NUM_STAGES];
        let mut first_enter = [None::<usize>; NUM_STAGES];
        for (seq, event) in events.iter().enumerate() {
            let idx = event.stage.index();
            match event.state {
                StageState::Enter => {
                    first_enter[idx].get_or_insert(seq);
                }
                StageState::Exit => last_exit[idx] = Some(seq),
            }
        }
        (0..NUM_STAGES - 1).all(|i| match (last_exit[i], first_enter[i + 1]) {
            (Some(exit), Some(enter)) => exit < enter,
            _ => true,
        })
    }

    /// Number of vehicles that left the terminal stage.
    pub fn completions(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.stage.is_terminal() && e.state == StageState::Exit)
            .count()
    }

    /// Plates in the order they entered `stage`.
    pub fn entry_order(&self, stage: StageKind) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.stage == stage && e.state == StageState::Enter)
            .map(|e| e.vehicle.clone())
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: StageEvent) {
        self.events.lock().push(event);
    }
}

/// Stamps events with run-relative time and forwards them to a sink.
#[derive(Clone)]
pub struct EventEmitter {
    sink: Arc<dyn EventSink>,
    started: Instant,
}

impl EventEmitter {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink, started: Instant::now() }
    }

    pub fn enter(&self, vehicle: &Vehicle, stage: StageKind) {
        self.emit(vehicle, stage, StageState::Enter);
    }

    pub fn exit(&self, vehicle: &Vehicle, stage: StageKind) {
        self.emit(vehicle, stage, StageState::Exit);
    }

    fn emit(&self, vehicle: &Vehicle, stage: StageKind, state: StageState) {
        metrics::record_stage_event(stage, state);
        self.sink.record(StageEvent {
            elapsed: self.started.elapsed(),
            vehicle: vehicle.plate.clone(),
            category: vehicle.category(),
            stage,
            state,
        });
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter").field("started", &self.started).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fleet, StageKind};

    #[test]
    fn recording_sink_tracks_peak_concurrency() {
        let sink = Arc::new(RecordingSink::new());
        let emitter = EventEmitter::new(sink.clone());
        let fleet = Fleet::alternating(3);

        emitter.enter(&fleet[0], StageKind::Repair);
        emitter.enter(&fleet[1], StageKind::Repair);
        emitter.exit(&fleet[0], StageKind::Repair);
        emitter.enter(&fleet[2], StageKind::Repair);
        emitter.exit(&fleet[1], StageKind::Repair);
        emitter.exit(&fleet[2], StageKind::Repair);

        assert_eq!(sink.max_in_service(StageKind::Repair), 2);
        assert_eq!(sink.max_in_service(StageKind::Cleaning), 0);
        assert_eq!(sink.entry_order(StageKind::Repair), vec!["CAR001", "CAR002", "CAR003"]);
    }

    #[test]
    fn barrier_check_detects_overlap() {
        let sink = Arc::new(RecordingSink::new());
        let emitter = EventEmitter::new(sink.clone());
        let fleet = Fleet::alternating(2);

        emitter.enter(&fleet[0], StageKind::WaitingForSlot);
        emitter.enter(&fleet[1], StageKind::WaitingForSlot);
        emitter.exit(&fleet[0], StageKind::WaitingForSlot);
        assert!(sink.stages_are_barriered());

        emitter.enter(&fleet[0], StageKind::Repair);
        emitter.exit(&fleet[1], StageKind::WaitingForSlot);
        assert!(!sink.stages_are_barriered());
    }

    #[test]
    fn completions_count_terminal_exits() {
        let sink = Arc::new(RecordingSink::new());
        let emitter = EventEmitter::new(sink.clone());
        let fleet = Fleet::alternating(2);
        emitter.enter(&fleet[0], StageKind::Delivery);
        emitter.exit(&fleet[0], StageKind::Delivery);
        emitter.exit(&fleet[1], StageKind::Cleaning);
        assert_eq!(sink.completions(), 1);
        assert_eq!(sink.len(), 3);
    }
}
