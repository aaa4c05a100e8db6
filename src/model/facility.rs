//! The four workshop stages and the facility that wires them together.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::FacilityError;
use crate::scheduler::StageQueue;

/// Number of stages every vehicle passes through.
pub const NUM_STAGES: usize = 4;

/// One of the four sequential workshop stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StageKind {
    /// Waiting for a parking slot and paperwork.
    WaitingForSlot = 0,
    /// Waiting for a mechanic and being repaired.
    Repair = 1,
    Cleaning = 2,
    /// Final review and hand-over.
    Delivery = 3,
}

impl StageKind {
    pub const ALL: [StageKind; NUM_STAGES] =
        [Self::WaitingForSlot, Self::Repair, Self::Cleaning, Self::Delivery];

    pub const TERMINAL: StageKind = Self::Delivery;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The stage a vehicle moves to after this one, if any.
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::TERMINAL
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::WaitingForSlot => "WaitingForSlot",
            Self::Repair => "Repair",
            Self::Cleaning => "Cleaning",
            Self::Delivery => "Delivery",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stage with its service capacity and its waiting queue.
#[derive(Debug)]
pub struct Stage {
    kind: StageKind,
    capacity: usize,
    queue: StageQueue,
}

impl Stage {
    fn new(kind: StageKind, capacity: usize) -> Self {
        Self { kind, capacity, queue: StageQueue::new() }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Maximum number of vehicles served concurrently.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn queue(&self) -> &StageQueue {
        &self.queue
    }
}

/// The whole workshop: four stages plus the scenario parameters.
///
/// Stage 0 is bounded by the slot count. Repair, cleaning and delivery are
/// all bounded by the server count; servers are a counted resource and no
/// server identity is bound to a vehicle.
#[derive(Debug)]
pub struct Facility {
    stages: [Stage; NUM_STAGES],
    vehicle_count: usize,
    slot_count: usize,
    server_count: usize,
}

impl Facility {
    /// Build a facility with four empty stage queues.
    pub fn build(
        vehicle_count: usize,
        slot_count: usize,
        server_count: usize,
    ) -> Result<Self, FacilityError> {
        if slot_count == 0 {
            return Err(FacilityError::ZeroSlots);
        }
        if server_count == 0 {
            return Err(FacilityError::ZeroServers);
        }

        let stages = StageKind::ALL.map(|kind| {
            let capacity = match kind {
                StageKind::WaitingForSlot => slot_count,
                _ => server_count,
            };
            Stage::new(kind, capacity)
        });

        Ok(Self { stages, vehicle_count, slot_count, server_count })
    }

    pub fn stage(&self, kind: StageKind) -> &Stage {
        &self.stages[kind.index()]
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicle_count
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn server_count(&self) -> usize {
        self.server_count
    }

    /// Vehicles currently queued in the slot-wait stage.
    pub fn occupied_slots(&self) -> usize {
        self.stage(StageKind::WaitingForSlot).queue().len()
    }

    pub fn free_slots(&self) -> usize {
        self.slot_count.saturating_sub(self.occupied_slots())
    }

    /// Total vehicles sitting in any stage queue.
    pub fn queued(&self) -> usize {
        self.stages.iter().map(|s| s.queue().len()).sum()
    }
}
