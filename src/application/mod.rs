//! Application Layer - The monitoring engine's core logic
//!
//! - `gate`: pass/fail safety decision for candidates
//! - `dispatcher`: capped trade execution
//! - `monitor`: the lifecycle state machine and its sweeps
//! - `scheduler`: named periodic task loops

pub mod dispatcher;
pub mod gate;
pub mod monitor;
pub mod scheduler;

pub use dispatcher::{DispatchError, DispatchOutcome, TradeDispatcher};
pub use gate::{GateDecision, SafetyGate};
pub use monitor::{LifecycleMonitor, MonitorError};
pub use scheduler::spawn_periodic;
