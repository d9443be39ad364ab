//! Status tracking and alerting: per-partition transition/health history via
//! a fixed-capacity ring buffer, staleness detection, and threshold-based
//! alert evaluation (§6 "Status Tracker / Monitor").

pub mod monitor;
pub mod ring;

pub use monitor::{AggregateHealth, AlertEvent, AlertKind, HealthSnapshot, StatusMonitor};
pub use ring::RingBuffer;
