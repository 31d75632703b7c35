use std::collections::HashMap;

use regex::Regex;

use crate::{AgentflowError, Result, suggest::SuggestionInput};

/// Format: `{{name}}`, whitespace inside the braces is ignored.
const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}";

pub const SYSTEM_PROMPT: &str = "You design workflows of cooperating AI agents for a project dashboard. \
Answer with a single JSON object with the keys suggestedName, suggestedDescription, suggestedNodes and reasoning. \
suggestedNodes holds between 1 and 5 objects with the keys name and type.";

pub const USER_PROMPT: &str = "Goal: {{goal}}

Project context: {{context}}

Available agent types: {{agent_types}}

Prefer the available agent types for the node types.";

/// Replace every `{{name}}` in `template` with its value.
/// Returns error if any placeholder has no value.
pub fn render(
    template: &str,
    vars: &HashMap<&str, String>,
) -> Result<String> {
    let re = Regex::new(PLACEHOLDER_PATTERN).map_err(|e| AgentflowError::Config(e.to_string()))?;

    let mut missing: Vec<String> = Vec::new();
    let rendered = re.replace_all(template, |caps: &regex::Captures| match vars.get(&caps[1]) {
        Some(value) => value.clone(),
        None => {
            missing.push(format!("placeholder '{}' not found", &caps[1]));
            caps[0].to_string()
        }
    });

    if !missing.is_empty() {
        return Err(AgentflowError::Suggestion(missing.join(", ")));
    }

    Ok(rendered.into_owned())
}

/// System and user message for a suggestion request.
pub fn build_messages(input: &SuggestionInput) -> Result<(String, String)> {
    let agent_types = if input.existing_agent_types.is_empty() {
        "none, invent suitable ones".to_string()
    } else {
        input.existing_agent_types.join(", ")
    };
    let context = if input.project_context.trim().is_empty() {
        "not provided".to_string()
    } else {
        input.project_context.trim().to_string()
    };

    let vars = HashMap::from([("goal", input.goal_text.trim().to_string()), ("context", context), ("agent_types", agent_types)]);
    Ok((SYSTEM_PROMPT.to_string(), render(USER_PROMPT, &vars)?))
}
