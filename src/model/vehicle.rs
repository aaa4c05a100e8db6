//! Vehicles: the work items moved through the workshop.

use serde::{Deserialize, Serialize};

use super::facility::StageKind;
use super::incident::{Category, Incident, Priority};

/// A vehicle waiting for, or undergoing, service.
///
/// Ownership carries the "one place at a time" rule: a vehicle value lives
/// either in exactly one stage queue or in exactly one serving task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub plate: String,
    pub incident: Incident,
    pub current_stage: StageKind,
}

impl Vehicle {
    /// Create a vehicle; every vehicle starts in the slot-wait stage.
    pub fn new(plate: impl Into<String>, incident: Incident) -> Self {
        Self {
            plate: plate.into(),
            incident,
            current_stage: StageKind::WaitingForSlot,
        }
    }

    pub fn priority(&self) -> Priority {
        self.incident.priority
    }

    pub fn category(&self) -> Category {
        self.incident.category
    }

    pub fn base_service_units(&self) -> u32 {
        self.incident.base_service_units
    }

    pub fn is_done(&self) -> bool {
        self.current_stage == StageKind::TERMINAL
    }
}

/// Plate numbering used by generated fleets: `CAR001`, `CAR002`, ...
pub fn plate_for(n: usize) -> String {
    format!("CAR{n:03}")
}
