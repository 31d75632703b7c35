//! Studio - the entry point for Agentflow.
//!
//! The studio ties the pieces of the editor together:
//! - Creating, loading and saving workflows
//! - Opening execution status views
//! - Suggesting workflow skeletons from goal text

use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::info;

use crate::{
    Config, Result,
    execution::{StatusMonitor, StatusSource, StatusStream},
    store::{PageData, Query, Store, WorkflowRecord},
    suggest::{Suggestion, SuggestionAdapter, SuggestionForm},
    workflow::Workflow,
};

/// The workflow studio.
///
/// Each workflow is loaded into its own [`Workflow`] value, so graphs of
/// different workflows never share state.
///
/// # Example
///
/// ```rust,ignore
/// let studio = StudioBuilder::new().config(Config::create("agentflow.toml")?).build()?;
///
/// let workflow = studio.create_workflow("Support triage", "route tickets");
/// workflow.graph().add_node(NodeDraft::new("Reader", "reader"));
/// studio.save(&workflow)?;
///
/// let monitor = studio.status_monitor();
/// let sub = monitor.watch("exec-42");
/// ```
pub struct Studio {
    config: Config,
    store: Store,
    source: Arc<dyn StatusSource>,
    stream: Arc<dyn StatusStream>,
    adapter: Arc<SuggestionAdapter>,

    runtime: Arc<Runtime>,
}

impl Studio {
    pub(crate) fn new(
        config: Config,
        store: Store,
        source: Arc<dyn StatusSource>,
        stream: Arc<dyn StatusStream>,
        adapter: Arc<SuggestionAdapter>,
        runtime: Arc<Runtime>,
    ) -> Self {
        info!("studio::new(store: {:?}, status: {:?})", config.store.store_type, config.status.channel);
        Self {
            config,
            store,
            source,
            stream,
            adapter,
            runtime,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runtime(&self) -> Arc<Runtime> {
        self.runtime.clone()
    }

    /// A new, empty draft. Not persisted until [`Studio::save`].
    pub fn create_workflow(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Workflow {
        Workflow::new(name, description)
    }

    /// Load a stored workflow.
    pub fn open(
        &self,
        id: &str,
    ) -> Result<Workflow> {
        self.store.load(id)
    }

    pub fn save(
        &self,
        workflow: &Workflow,
    ) -> Result<bool> {
        self.store.save(workflow)
    }

    pub fn remove(
        &self,
        id: &str,
    ) -> Result<bool> {
        self.store.remove(id)
    }

    pub fn list(
        &self,
        q: &Query,
    ) -> Result<PageData<WorkflowRecord>> {
        self.store.list(q)
    }

    /// Status subscriptions for one view. Dropping the monitor closes them.
    pub fn status_monitor(&self) -> StatusMonitor {
        StatusMonitor::new(self.config.status.clone(), self.source.clone(), self.stream.clone(), self.runtime.handle().clone())
    }

    /// A fresh "suggest workflow" form.
    pub fn suggestion_form(&self) -> SuggestionForm {
        SuggestionForm::new(self.adapter.clone())
    }

    pub fn suggester(&self) -> Arc<SuggestionAdapter> {
        self.adapter.clone()
    }

    /// Create and persist a draft workflow holding the suggested nodes.
    pub fn seed(
        &self,
        suggestion: &Suggestion,
    ) -> Result<Workflow> {
        let workflow = SuggestionAdapter::seed(suggestion);
        self.store.save(&workflow)?;
        Ok(workflow)
    }
}
