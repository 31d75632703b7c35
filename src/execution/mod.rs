//! Execution status overlay.
//!
//! Live run state of a workflow comes from an external service. It is joined
//! with a graph snapshot by node id for display and never written back into
//! the graph.

mod channel;
mod merge;
mod monitor;
mod source;
mod status;
mod subscription;

pub use channel::{StatusChannel, StatusEvent, StatusHandle, StatusListener, StatusMessage};
pub use merge::{DisplayNode, merge_last_known, merge_status};
pub use monitor::StatusMonitor;
pub use source::{HttpStatusSource, HttpStatusStream, StatusFrames, StatusSource, StatusStream};
pub use status::{ExecutionState, ExecutionStatus, NodeRunStatus};
pub use subscription::Subscription;
