use serde::{Deserialize, Serialize};

use crate::model::NodeId;

/// Unique identifier for an edge within a workflow.
pub type EdgeId = String;

/// Directed connection between two nodes expressing flow order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeModel {
    pub id: EdgeId,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
}

impl EdgeModel {
    /// Whether the edge touches the given node on either end.
    pub fn touches(
        &self,
        nid: &str,
    ) -> bool {
        self.source_node_id == nid || self.target_node_id == nid
    }

    pub fn connects(
        &self,
        source: &str,
        target: &str,
    ) -> bool {
        self.source_node_id == source && self.target_node_id == target
    }
}
