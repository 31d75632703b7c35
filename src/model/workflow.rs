use serde::{Deserialize, Serialize};

use crate::{
    AgentflowError, Result,
    model::{EdgeModel, NodeModel},
};

/// Lifecycle state of a workflow definition.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Paused,
}

/// Nodes and edges in draw order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeModel>,
    pub edges: Vec<EdgeModel>,
}

/// Serializable form of a whole workflow, as persisted by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowModel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<NodeModel>,
    #[serde(default)]
    pub edges: Vec<EdgeModel>,
    #[serde(default)]
    pub status: WorkflowStatus,
    /// epoch millis of the last run
    #[serde(default)]
    pub last_run: Option<i64>,
}

impl WorkflowModel {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str::<WorkflowModel>(s).map_err(|e| AgentflowError::Convert(format!("invalid workflow: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_workflow_model_from_camel_case_json() {
        let text = json!({
            "id": "wf-1",
            "name": "Triage",
            "description": "route tickets",
            "nodes": [
                {"id": "a", "name": "Reader", "type": "reader", "x": 10.0, "y": 20.0, "config": {"model": "small"}},
                {"id": "b", "name": "Writer", "type": "writer", "x": 200.0, "y": 20.0}
            ],
            "edges": [{"id": "e1", "sourceNodeId": "a", "targetNodeId": "b"}],
            "status": "active",
            "lastRun": 1700000000000i64
        })
        .to_string();

        let model = WorkflowModel::from_json(&text).unwrap();
        assert_eq!(model.status, WorkflowStatus::Active);
        assert_eq!(model.last_run, Some(1700000000000));
        assert_eq!(model.nodes[0].node_type, "reader");
        assert_eq!(model.nodes[0].config["model"], "small");
        assert!(model.nodes[1].config.is_empty());
        assert_eq!(model.edges[0].source_node_id, "a");

        let back: serde_json::Value = serde_json::from_str(&model.to_json().unwrap()).unwrap();
        assert_eq!(back["edges"][0]["targetNodeId"], "b");
        assert_eq!(back["nodes"][1]["type"], "writer");
    }

    #[test]
    fn test_workflow_model_invalid_json() {
        let err = WorkflowModel::from_json("{\"name\": 1}").unwrap_err();
        assert!(matches!(err, AgentflowError::Convert(_)));
    }

    #[test]
    fn test_workflow_status_parse() {
        assert_eq!("Paused".parse::<WorkflowStatus>().unwrap(), WorkflowStatus::Paused);
        assert_eq!(WorkflowStatus::Draft.as_ref(), "draft");
    }
}
