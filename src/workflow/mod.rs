mod connector;
mod graph;
#[allow(clippy::module_inception)]
mod workflow;

pub use connector::Connector;
pub use graph::WorkflowGraph;
pub use workflow::Workflow;
