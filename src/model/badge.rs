use serde::{Deserialize, Serialize};

use crate::model::WorkflowStatus;

/// Visual tone of a status badge.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BadgeTone {
    Neutral,
    Info,
    Success,
    Warning,
    Danger,
}

/// Anything the dashboard renders as a status badge.
pub trait StatusBadge {
    /// Human readable label.
    fn label(&self) -> &str;

    fn tone(&self) -> BadgeTone;
}

impl StatusBadge for WorkflowStatus {
    fn label(&self) -> &str {
        match self {
            WorkflowStatus::Draft => "Draft",
            WorkflowStatus::Active => "Active",
            WorkflowStatus::Paused => "Paused",
        }
    }

    fn tone(&self) -> BadgeTone {
        match self {
            WorkflowStatus::Draft => BadgeTone::Neutral,
            WorkflowStatus::Active => BadgeTone::Success,
            WorkflowStatus::Paused => BadgeTone::Warning,
        }
    }
}
