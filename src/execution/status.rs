//! Execution status as reported by the external status service.
//!
//! Parsing is lenient: unknown or missing node states
//! become `Pending` and unreadable timestamps are dropped, so one odd field
//! never discards a whole status message.

use std::collections::HashMap;

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::{BadgeTone, NodeId, StatusBadge};

/// Run state of an execution or of a single node in it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ExecutionState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionState::Completed | ExecutionState::Failed)
    }
}

impl StatusBadge for ExecutionState {
    fn label(&self) -> &str {
        match self {
            ExecutionState::Pending => "Pending",
            ExecutionState::Running => "Running",
            ExecutionState::Completed => "Completed",
            ExecutionState::Failed => "Failed",
        }
    }

    fn tone(&self) -> BadgeTone {
        match self {
            ExecutionState::Pending => BadgeTone::Neutral,
            ExecutionState::Running => BadgeTone::Info,
            ExecutionState::Completed => BadgeTone::Success,
            ExecutionState::Failed => BadgeTone::Danger,
        }
    }
}

/// Run state of one node.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeRunStatus {
    #[serde(default, deserialize_with = "lenient_state")]
    pub status: ExecutionState,
    /// epoch millis
    #[serde(default, deserialize_with = "lenient_time", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    /// epoch millis
    #[serde(default, deserialize_with = "lenient_time", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

/// One full status message. Each message replaces the previous one.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStatus {
    #[serde(default, deserialize_with = "lenient_id")]
    pub execution_id: String,
    #[serde(default, deserialize_with = "lenient_state")]
    pub status: ExecutionState,
    #[serde(default, deserialize_with = "lenient_nodes")]
    pub node_statuses: HashMap<NodeId, NodeRunStatus>,
}

impl ExecutionStatus {
    pub fn new(
        execution_id: impl Into<String>,
        status: ExecutionState,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            status,
            node_statuses: HashMap::new(),
        }
    }

    pub fn with_node(
        mut self,
        nid: impl Into<NodeId>,
        status: NodeRunStatus,
    ) -> Self {
        self.node_statuses.insert(nid.into(), status);
        self
    }

    pub fn from_json(s: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// `null` or a non-object map yields no entries; an unreadable entry is `Pending`.
fn lenient_nodes<'de, D>(deserializer: D) -> Result<HashMap<NodeId, NodeRunStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(entries)) = value else {
        return Ok(HashMap::new());
    };
    Ok(entries.into_iter().map(|(nid, entry)| (nid, serde_json::from_value::<NodeRunStatus>(entry).unwrap_or_default())).collect())
}

fn lenient_state<'de, D>(deserializer: D) -> Result<ExecutionState, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(|s| s.parse().ok()).unwrap_or_default())
}

fn lenient_time<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s).ok().map(|t| t.timestamp_millis()),
        _ => None,
    })
}
