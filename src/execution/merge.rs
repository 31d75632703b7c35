//! Join of the canonical graph with a live execution status.

use serde::Serialize;

use crate::{
    execution::{ExecutionState, ExecutionStatus},
    model::{BadgeTone, GraphSnapshot, NodeId, StatusBadge},
};

/// Per-node record rendered by the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNode {
    pub node_id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub x: f64,
    pub y: f64,
    pub status: ExecutionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl StatusBadge for DisplayNode {
    fn label(&self) -> &str {
        self.status.label()
    }

    fn tone(&self) -> BadgeTone {
        self.status.tone()
    }
}

/// One display record per snapshot node, in snapshot order. Nodes the status
/// does not mention are `Pending`.
pub fn merge_status(
    snapshot: &GraphSnapshot,
    status: &ExecutionStatus,
) -> Vec<DisplayNode> {
    merge_last_known(snapshot, Some(status))
}

/// Same as [`merge_status`] for a view that may not have received any status yet.
pub fn merge_last_known(
    snapshot: &GraphSnapshot,
    status: Option<&ExecutionStatus>,
) -> Vec<DisplayNode> {
    snapshot
        .nodes
        .iter()
        .map(|node| {
            let run = status.and_then(|s| s.node_statuses.get(&node.id));
            DisplayNode {
                node_id: node.id.clone(),
                name: node.name.clone(),
                node_type: node.node_type.clone(),
                x: node.x,
                y: node.y,
                status: run.map(|r| r.status).unwrap_or_default(),
                started_at: run.and_then(|r| r.started_at),
                completed_at: run.and_then(|r| r.completed_at),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        execution::NodeRunStatus,
        model::NodeDraft,
        workflow::WorkflowGraph,
    };

    fn sample() -> (WorkflowGraph, Vec<NodeId>) {
        let graph = WorkflowGraph::new();
        let ids = ["Fetch", "Rank", "Report"].iter().map(|name| graph.add_node(NodeDraft::new(*name, "agent")).id).collect();
        (graph, ids)
    }

    #[test]
    fn test_empty_status_is_all_pending() {
        let (graph, _) = sample();
        let status = ExecutionStatus::new("exec", ExecutionState::Running);

        let display = merge_status(&graph.to_snapshot(), &status);
        assert_eq!(display.len(), 3);
        assert!(display.iter().all(|d| d.status == ExecutionState::Pending));
    }

    #[test]
    fn test_merge_joins_by_node_id_in_snapshot_order() {
        let (graph, ids) = sample();
        let status = ExecutionStatus::new("exec", ExecutionState::Running)
            .with_node(
                ids[2].clone(),
                NodeRunStatus {
                    status: ExecutionState::Failed,
                    started_at: Some(5),
                    completed_at: Some(9),
                },
            )
            .with_node(
                ids[0].clone(),
                NodeRunStatus {
                    status: ExecutionState::Completed,
                    started_at: Some(1),
                    completed_at: Some(4),
                },
            )
            .with_node("not-in-graph", NodeRunStatus::default());

        let display = merge_status(&graph.to_snapshot(), &status);
        assert_eq!(display.iter().map(|d| d.node_id.clone()).collect::<Vec<_>>(), ids);
        assert_eq!(display[0].status, ExecutionState::Completed);
        assert_eq!(display[1].status, ExecutionState::Pending);
        assert_eq!(display[2].status, ExecutionState::Failed);
        assert_eq!(display[2].completed_at, Some(9));
        assert_eq!(display[2].label(), "Failed");
    }

    #[test]
    fn test_merge_does_not_touch_graph() {
        let (graph, ids) = sample();
        let before = graph.to_snapshot();
        let status = ExecutionStatus::new("exec", ExecutionState::Completed).with_node(ids[1].clone(), NodeRunStatus::default());

        let _ = merge_status(&before, &status);
        assert_eq!(graph.to_snapshot(), before);
    }

    #[test]
    fn test_no_status_yet() {
        let (graph, _) = sample();
        let display = merge_last_known(&graph.to_snapshot(), None);
        assert!(display.iter().all(|d| d.status == ExecutionState::Pending && d.started_at.is_none()));
    }
}
