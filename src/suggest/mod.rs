//! AI workflow suggestions.
//!
//! A [`SuggestionProvider`] turns goal text into a raw document, the
//! [`SuggestionAdapter`] validates it or substitutes a fallback, and a
//! [`SuggestionForm`] guards one in-flight request per form.

mod adapter;
mod form;
mod models;
mod prompt;
mod provider;

pub use adapter::{FALLBACK_REASONING, MAX_SUGGESTED_NODES, SuggestionAdapter};
pub use form::SuggestionForm;
pub use models::{SuggestedNode, Suggestion, SuggestionInput};
pub use provider::{HttpSuggestionProvider, SuggestionProvider};
