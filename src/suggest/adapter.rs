//! Goal text -> workflow skeleton.
//!
//! The adapter never fails: provider errors, documents that do not match the
//! suggestion schema and empty node lists are all replaced by a
//! deterministic single-node fallback.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    AgentflowError, Result, SuggestionConfig,
    model::NodeDraft,
    suggest::{SuggestedNode, Suggestion, SuggestionInput, SuggestionProvider},
    workflow::Workflow,
};

pub const MAX_SUGGESTED_NODES: usize = 5;

/// Reasoning text of every fallback suggestion.
pub const FALLBACK_REASONING: &str = "Fallback suggestion: the AI service did not return a usable workflow, so a single agent was proposed from the goal text.";

const FALLBACK_NODE_NAME: &str = "New Agent";

/// Canvas layout of seeded nodes.
const SEED_ORIGIN_X: f64 = 100.0;
const SEED_ORIGIN_Y: f64 = 150.0;
const SEED_SPACING_X: f64 = 250.0;

impl Suggestion {
    pub fn is_fallback(&self) -> bool {
        self.reasoning == FALLBACK_REASONING
    }
}

pub struct SuggestionAdapter {
    provider: Arc<dyn SuggestionProvider>,
    fallback_agent_type: String,
    fallback_name_len: usize,
}

impl SuggestionAdapter {
    pub fn new(
        provider: Arc<dyn SuggestionProvider>,
        config: &SuggestionConfig,
    ) -> Self {
        Self {
            provider,
            fallback_agent_type: config.fallback_agent_type.clone(),
            fallback_name_len: config.fallback_name_len.max(1),
        }
    }

    /// Ask the provider for a skeleton. Always returns a valid suggestion.
    pub async fn suggest(
        &self,
        input: &SuggestionInput,
    ) -> Suggestion {
        let accepted = match self.provider.generate(input).await {
            Ok(value) => Self::accept(value),
            Err(err) => Err(err),
        };

        match accepted {
            Ok(suggestion) => {
                debug!("suggest::accepted({}, {} nodes)", suggestion.suggested_name, suggestion.suggested_nodes.len());
                suggestion
            }
            Err(err) => {
                warn!("suggest::fallback: {}", err);
                self.fallback(input)
            }
        }
    }

    /// Validate a raw provider document.
    pub fn accept(value: Value) -> Result<Suggestion> {
        jsonschema::validate(&Self::schema(), &value)?;
        let suggestion = serde_json::from_value::<Suggestion>(value)?;

        if suggestion.suggested_name.trim().is_empty() {
            return Err(AgentflowError::Suggestion("suggestion has a blank name".to_string()));
        }
        if suggestion.suggested_nodes.iter().any(|n| n.name.trim().is_empty() || n.node_type.trim().is_empty()) {
            return Err(AgentflowError::Suggestion("suggested node without name or type".to_string()));
        }
        Ok(suggestion)
    }

    pub fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "required": ["suggestedName", "suggestedDescription", "suggestedNodes", "reasoning"],
            "properties": {
                "suggestedName": { "type": "string", "minLength": 1 },
                "suggestedDescription": { "type": "string" },
                "suggestedNodes": {
                    "type": "array",
                    "minItems": 1,
                    "maxItems": MAX_SUGGESTED_NODES,
                    "items": {
                        "type": "object",
                        "required": ["name", "type"],
                        "properties": {
                            "name": { "type": "string", "minLength": 1 },
                            "type": { "type": "string", "minLength": 1 }
                        }
                    }
                },
                "reasoning": { "type": "string" }
            }
        })
    }

    /// Deterministic single node suggestion derived from the goal text.
    pub fn fallback(
        &self,
        input: &SuggestionInput,
    ) -> Suggestion {
        let goal = input.goal_text.trim();
        let mut name: String = goal.chars().take(self.fallback_name_len).collect();
        if name.is_empty() {
            name = FALLBACK_NODE_NAME.to_string();
        } else if goal.chars().count() > self.fallback_name_len {
            name = format!("{}...", name.trim_end());
        }

        let node_type = input.existing_agent_types.iter().map(|t| t.trim()).find(|t| !t.is_empty()).unwrap_or(self.fallback_agent_type.as_str()).to_string();

        Suggestion {
            suggested_name: format!("Workflow: {}", name),
            suggested_description: goal.to_string(),
            suggested_nodes: vec![SuggestedNode {
                name,
                node_type,
            }],
            reasoning: FALLBACK_REASONING.to_string(),
        }
    }

    /// New draft workflow holding the suggested nodes, laid out left to right.
    pub fn seed(suggestion: &Suggestion) -> Workflow {
        let workflow = Workflow::new(suggestion.suggested_name.clone(), suggestion.suggested_description.clone());
        for (i, node) in suggestion.suggested_nodes.iter().enumerate() {
            workflow.graph().add_node(NodeDraft::new(node.name.clone(), node.node_type.clone()).at(SEED_ORIGIN_X + SEED_SPACING_X * i as f64, SEED_ORIGIN_Y));
        }
        workflow
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::model::WorkflowStatus;

    enum Reply {
        Value(Value),
        Fail,
    }

    struct StubProvider(Reply);

    #[async_trait]
    impl SuggestionProvider for StubProvider {
        async fn generate(
            &self,
            _input: &SuggestionInput,
        ) -> Result<Value> {
            match &self.0 {
                Reply::Value(v) => Ok(v.clone()),
                Reply::Fail => Err(AgentflowError::Suggestion("provider down".to_string())),
            }
        }
    }

    fn adapter(reply: Reply) -> SuggestionAdapter {
        SuggestionAdapter::new(Arc::new(StubProvider(reply)), &SuggestionConfig::default())
    }

    fn valid_document(nodes: usize) -> Value {
        let nodes: Vec<Value> = (0..nodes).map(|i| json!({"name": format!("Step {}", i), "type": "worker"})).collect();
        json!({
            "suggestedName": "Ticket triage",
            "suggestedDescription": "Classify then answer",
            "suggestedNodes": nodes,
            "reasoning": "two steps cover it"
        })
    }

    #[tokio::test]
    async fn test_accepts_valid_suggestion() {
        let input = SuggestionInput::new("Triage tickets");
        let suggestion = adapter(Reply::Value(valid_document(2))).suggest(&input).await;

        assert_eq!(suggestion.suggested_name, "Ticket triage");
        assert_eq!(suggestion.suggested_nodes.len(), 2);
        assert!(!suggestion.is_fallback());
    }

    #[tokio::test]
    async fn test_provider_failure_without_agent_types() {
        let input = SuggestionInput::new("Summarize weekly agent logs");
        let suggestion = adapter(Reply::Fail).suggest(&input).await;

        assert!(suggestion.is_fallback());
        assert_eq!(suggestion.suggested_nodes.len(), 1);
        assert_eq!(suggestion.suggested_nodes[0].node_type, "generic-agent");
        assert_eq!(suggestion.suggested_nodes[0].name, "Summarize weekly agent logs");
    }

    #[tokio::test]
    async fn test_fallback_uses_first_agent_type() {
        let input = SuggestionInput::new("Plan sprint").with_agent_types(["planner", "writer"]);
        let suggestion = adapter(Reply::Fail).suggest(&input).await;
        assert_eq!(suggestion.suggested_nodes[0].node_type, "planner");
    }

    #[tokio::test]
    async fn test_unusable_documents_fall_back() {
        let input = SuggestionInput::new("Draft release notes").with_agent_types(["writer"]);
        let mut missing_reasoning = valid_document(1);
        missing_reasoning.as_object_mut().unwrap().remove("reasoning");

        let cases = vec![
            Value::Null,
            json!({"suggestedName": "x"}),
            valid_document(0),
            valid_document(6),
            missing_reasoning,
            json!({"suggestedName": "  ", "suggestedDescription": "", "suggestedNodes": [{"name": "a", "type": "b"}], "reasoning": ""}),
            json!({"suggestedName": "ok", "suggestedDescription": "", "suggestedNodes": [{"name": "a", "type": " "}], "reasoning": ""}),
        ];

        for case in cases {
            let suggestion = adapter(Reply::Value(case.clone())).suggest(&input).await;
            assert!(suggestion.is_fallback(), "expected fallback for {}", case);
            assert_eq!(suggestion.suggested_nodes.len(), 1);
            assert_eq!(suggestion.suggested_nodes[0].node_type, "writer");
        }
    }

    #[test]
    fn test_fallback_truncates_goal() {
        let adapter = adapter(Reply::Fail);
        let goal = "Collect every customer complaint from the last quarter";
        let suggestion = adapter.fallback(&SuggestionInput::new(goal));

        let name = &suggestion.suggested_nodes[0].name;
        assert!(name.ends_with("..."));
        assert!(goal.starts_with(name.trim_end_matches("...")));
        assert!(name.chars().count() <= 33);
        assert_eq!(suggestion.suggested_description, goal);

        // deterministic
        assert_eq!(adapter.fallback(&SuggestionInput::new(goal)), suggestion);
    }

    #[test]
    fn test_fallback_blank_goal() {
        let suggestion = adapter(Reply::Fail).fallback(&SuggestionInput::new("   "));
        assert_eq!(suggestion.suggested_nodes[0].name, "New Agent");
    }

    #[test]
    fn test_seed_workflow() {
        let suggestion = SuggestionAdapter::accept(valid_document(3)).unwrap();
        let workflow = SuggestionAdapter::seed(&suggestion);

        assert_eq!(workflow.name, "Ticket triage");
        assert_eq!(workflow.status(), WorkflowStatus::Draft);
        let snapshot = workflow.graph().to_snapshot();
        assert_eq!(snapshot.nodes.len(), 3);
        assert!(snapshot.edges.is_empty());
        assert_eq!(snapshot.nodes[1].name, "Step 1");
        assert_eq!(snapshot.nodes[1].x, 350.0);
        assert_eq!(snapshot.nodes[2].y, 150.0);
    }
}
