mod badge;
mod edge;
mod node;
mod workflow;

pub use badge::{BadgeTone, StatusBadge};
pub use edge::{EdgeId, EdgeModel};
pub use node::{NodeDraft, NodeId, NodeModel};
pub use workflow::{GraphSnapshot, WorkflowModel, WorkflowStatus};
