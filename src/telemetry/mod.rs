//! Telemetry for the workshop simulator.
//!
//! Provides structured logging, stage event sinks, and metrics recording.

mod events;
mod logging;
pub mod metrics;

pub use self::events::{
    EventEmitter, EventSink, NullSink, RecordingSink, StageEvent, StageState, TracingSink,
};
pub use self::logging::{init_logging, LogConfig, LogError, LogFormat};
