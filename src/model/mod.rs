//! Workshop data model: incidents, vehicles, stages and the facility.

mod error;
mod facility;
mod fleet;
mod incident;
mod vehicle;

pub use error::FacilityError;
pub use facility::{Facility, Stage, StageKind, NUM_STAGES};
pub use fleet::Fleet;
pub use incident::{Category, Incident, Priority};
pub use vehicle::{plate_for, Vehicle};
