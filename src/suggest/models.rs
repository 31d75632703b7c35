use serde::{Deserialize, Serialize};

/// What the user asked for on the "suggest workflow" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionInput {
    pub goal_text: String,
    #[serde(default)]
    pub project_context: String,
    #[serde(default)]
    pub existing_agent_types: Vec<String>,
}

impl SuggestionInput {
    pub fn new(goal_text: impl Into<String>) -> Self {
        Self {
            goal_text: goal_text.into(),
            ..Default::default()
        }
    }

    pub fn with_context(
        mut self,
        project_context: impl Into<String>,
    ) -> Self {
        self.project_context = project_context.into();
        self
    }

    pub fn with_agent_types<I, S>(
        mut self,
        types: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.existing_agent_types = types.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

/// Candidate workflow skeleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub suggested_name: String,
    pub suggested_description: String,
    pub suggested_nodes: Vec<SuggestedNode>,
    pub reasoning: String,
}
