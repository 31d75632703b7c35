//! A workflow: metadata plus exactly one graph it owns.

use tracing::debug;

use crate::{
    AgentflowError, Result,
    model::{GraphSnapshot, WorkflowModel, WorkflowStatus},
    utils,
    workflow::WorkflowGraph,
};

#[derive(Debug)]
pub struct Workflow {
    id: String,
    pub name: String,
    pub description: String,
    status: WorkflowStatus,
    last_run: Option<i64>,
    graph: WorkflowGraph,
}

impl Workflow {
    /// create an empty draft workflow with a fresh id
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: utils::longid(),
            name: name.into(),
            description: description.into(),
            status: WorkflowStatus::Draft,
            last_run: None,
            graph: WorkflowGraph::new(),
        }
    }

    /// Rebuild a workflow from its persisted form, validating the graph.
    pub fn from_model(model: WorkflowModel) -> Result<Self> {
        if model.id.is_empty() {
            return Err(AgentflowError::Convert("missing id in workflow".to_string()));
        }
        let graph = WorkflowGraph::from_snapshot(GraphSnapshot {
            nodes: model.nodes,
            edges: model.edges,
        })?;

        Ok(Self {
            id: model.id,
            name: model.name,
            description: model.description,
            status: model.status,
            last_run: model.last_run,
            graph,
        })
    }

    pub fn to_model(&self) -> WorkflowModel {
        let snapshot = self.graph.to_snapshot();
        WorkflowModel {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            nodes: snapshot.nodes,
            edges: snapshot.edges,
            status: self.status,
            last_run: self.last_run,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn last_run(&self) -> Option<i64> {
        self.last_run
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// Draft or Paused -> Active.
    pub fn activate(&mut self) -> Result<()> {
        match self.status {
            WorkflowStatus::Draft | WorkflowStatus::Paused => self.transition(WorkflowStatus::Active),
            WorkflowStatus::Active => Err(AgentflowError::InvalidState(format!("workflow {} is already active", self.id))),
        }
    }

    /// Active -> Paused.
    pub fn pause(&mut self) -> Result<()> {
        match self.status {
            WorkflowStatus::Active => self.transition(WorkflowStatus::Paused),
            status => Err(AgentflowError::InvalidState(format!("cannot pause workflow {} in state {}", self.id, status))),
        }
    }

    pub fn revert_to_draft(&mut self) -> Result<()> {
        self.transition(WorkflowStatus::Draft)
    }

    /// Stamp the start of a run. Only active workflows run.
    pub fn record_run(
        &mut self,
        timestamp: i64,
    ) -> Result<()> {
        if self.status != WorkflowStatus::Active {
            return Err(AgentflowError::InvalidState(format!("cannot run workflow {} in state {}", self.id, self.status)));
        }
        self.last_run = Some(timestamp);
        Ok(())
    }

    fn transition(
        &mut self,
        to: WorkflowStatus,
    ) -> Result<()> {
        debug!("workflow::transition({}: {} -> {})", self.id, self.status, to);
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeDraft;

    #[test]
    fn test_new_workflow_is_empty_draft() {
        let workflow = Workflow::new("Support", "answers tickets");
        assert_eq!(workflow.status(), WorkflowStatus::Draft);
        assert!(workflow.last_run().is_none());
        assert!(workflow.graph().is_empty());
        assert_eq!(workflow.id().len(), 32);
    }

    #[test]
    fn test_status_transitions() {
        let mut workflow = Workflow::new("w", "");

        assert!(matches!(workflow.pause(), Err(AgentflowError::InvalidState(_))));
        assert!(matches!(workflow.record_run(1), Err(AgentflowError::InvalidState(_))));

        workflow.activate().unwrap();
        assert_eq!(workflow.status(), WorkflowStatus::Active);
        assert!(matches!(workflow.activate(), Err(AgentflowError::InvalidState(_))));

        workflow.record_run(1_700_000_000_000).unwrap();
        assert_eq!(workflow.last_run(), Some(1_700_000_000_000));

        workflow.pause().unwrap();
        assert_eq!(workflow.status(), WorkflowStatus::Paused);
        assert!(matches!(workflow.record_run(2), Err(AgentflowError::InvalidState(_))));

        workflow.activate().unwrap();
        workflow.revert_to_draft().unwrap();
        assert_eq!(workflow.status(), WorkflowStatus::Draft);
        assert_eq!(workflow.last_run(), Some(1_700_000_000_000));
    }

    #[test]
    fn test_model_round_trip() {
        let mut workflow = Workflow::new("Pipeline", "daily digest");
        let a = workflow.graph().add_node(NodeDraft::new("Fetch", "crawler").at(10.0, 10.0));
        let b = workflow.graph().add_node(NodeDraft::new("Summarize", "writer").at(220.0, 10.0));
        workflow.graph().add_edge(&a.id, &b.id).unwrap();
        workflow.activate().unwrap();

        let model = workflow.to_model();
        let text = model.to_json().unwrap();
        let restored = Workflow::from_model(WorkflowModel::from_json(&text).unwrap()).unwrap();

        assert_eq!(restored.to_model(), model);
        assert_eq!(restored.status(), WorkflowStatus::Active);
        assert!(matches!(restored.graph().add_edge(&a.id, &b.id), Err(AgentflowError::InvalidEdge(_))));
    }

    #[test]
    fn test_from_model_requires_id() {
        let model = WorkflowModel::default();
        assert!(matches!(Workflow::from_model(model), Err(AgentflowError::Convert(_))));
    }
}
