use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// node id
pub type NodeId = String;

/// An agent placed on the workflow canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeModel {
    pub id: NodeId,
    pub name: String,
    /// agent type tag
    #[serde(rename = "type")]
    pub node_type: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// Node contents supplied by the caller; the id is assigned by the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl NodeDraft {
    pub fn new(
        name: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            ..Default::default()
        }
    }

    pub fn at(
        mut self,
        x: f64,
        y: f64,
    ) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_config(
        mut self,
        config: Map<String, Value>,
    ) -> Self {
        self.config = config;
        self
    }

    pub(crate) fn into_node(
        self,
        id: NodeId,
    ) -> NodeModel {
        NodeModel {
            id,
            name: self.name,
            node_type: self.node_type,
            x: self.x,
            y: self.y,
            config: self.config,
        }
    }
}
