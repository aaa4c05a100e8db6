//! Incident categories and the priority/service time they imply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Priority class of a vehicle. Lower numeric value = more urgent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    High = 0,
    Medium = 1,
    #[default]
    Low = 2,
}

impl Priority {
    /// Numeric rank used for queue ordering.
    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::High,
            1 => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// Kind of fault reported for a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Mechanical,
    Electrical,
    Bodywork,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::Mechanical, Self::Electrical, Self::Bodywork];

    pub fn priority(self) -> Priority {
        match self {
            Self::Mechanical => Priority::High,
            Self::Electrical => Priority::Medium,
            Self::Bodywork => Priority::Low,
        }
    }

    /// Base service time per stage, in time units.
    pub fn base_service_units(self) -> u32 {
        match self {
            Self::Mechanical => 5,
            Self::Electrical => 3,
            Self::Bodywork => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mechanical => "Mechanical",
            Self::Electrical => "Electrical",
            Self::Bodywork => "Bodywork",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    /// Unrecognized names fall back to `Bodywork`, the lowest-priority class.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "mechanical" => Self::Mechanical,
            "electrical" => Self::Electrical,
            _ => Self::Bodywork,
        })
    }
}

/// Immutable fault record attached to a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: u32,
    pub category: Category,
    pub priority: Priority,
    pub base_service_units: u32,
    pub description: String,
}

impl Incident {
    /// Create an incident; priority and service time follow from the category.
    pub fn new(id: u32, category: Category, description: impl Into<String>) -> Self {
        Self {
            id,
            category,
            priority: category.priority(),
            base_service_units: category.base_service_units(),
            description: description.into(),
        }
    }

    /// Create an incident from a free-form category name.
    pub fn from_name(id: u32, category: &str, description: impl Into<String>) -> Self {
        let category = category.parse().unwrap_or(Category::Bodywork);
        Self::new(id, category, description)
    }
}
