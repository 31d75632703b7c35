use serde::{Deserialize, Serialize};

/// Stored row of one workflow. `data` holds the JSON of the whole
/// [`WorkflowModel`](crate::model::WorkflowModel); the other columns are
/// copies used for listing and filtering.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct WorkflowRecord {
    pub id: String,
    pub name: String,
    pub desc: String,
    pub status: String,
    pub data: String,
    pub last_run: Option<i64>,
    pub create_time: i64,
    pub update_time: i64,
}
