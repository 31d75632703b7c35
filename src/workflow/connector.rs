use crate::{
    AgentflowError, Result,
    model::{EdgeModel, NodeId},
    workflow::WorkflowGraph,
};

/// Two-click connect gesture: the first click picks the source node, the
/// second click picks the target and creates the edge.
#[derive(Debug, Default)]
pub struct Connector {
    source: Option<NodeId>,
}

impl Connector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node waiting for its target, if any.
    pub fn pending(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Feed a click on `nid`.
    ///
    /// Returns `Ok(None)` after the first click and the new edge after the
    /// second. The selection is cleared after every second click, whether
    /// or not the edge could be created.
    pub fn click(
        &mut self,
        graph: &WorkflowGraph,
        nid: &str,
    ) -> Result<Option<EdgeModel>> {
        match self.source.take() {
            None => {
                if graph.node(nid).is_none() {
                    return Err(AgentflowError::node_not_found(nid));
                }
                self.source = Some(nid.to_string());
                Ok(None)
            }
            Some(source) => graph.add_edge(&source, nid).map(Some),
        }
    }

    pub fn cancel(&mut self) {
        self.source = None;
    }
}
