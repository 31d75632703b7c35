use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use agentflow::{
    Config, NodeDraft, StatusBadge, StudioBuilder, Workflow,
    execution::{ExecutionState, ExecutionStatus, NodeRunStatus, StatusSource},
    suggest::SuggestionInput,
};
use async_trait::async_trait;

/// Walks every node from running to completed, one node per poll.
struct DemoSource {
    nodes: Vec<String>,
    polls: AtomicUsize,
}

#[async_trait]
impl StatusSource for DemoSource {
    async fn fetch(
        &self,
        execution_id: &str,
    ) -> agentflow::Result<ExecutionStatus> {
        let done = self.polls.fetch_add(1, Ordering::SeqCst);
        let state = if done >= self.nodes.len() { ExecutionState::Completed } else { ExecutionState::Running };

        let mut status = ExecutionStatus::new(execution_id, state);
        for (i, nid) in self.nodes.iter().enumerate() {
            let node_state = match i.cmp(&done) {
                std::cmp::Ordering::Less => ExecutionState::Completed,
                std::cmp::Ordering::Equal => ExecutionState::Running,
                std::cmp::Ordering::Greater => ExecutionState::Pending,
            };
            status = status.with_node(
                nid.clone(),
                NodeRunStatus {
                    status: node_state,
                    ..Default::default()
                },
            );
        }
        Ok(status)
    }
}

fn main() {
    let mut config = Config::default();
    config.status.poll_interval_ms = 200;
    config.suggestion.timeout_ms = 2000;

    let workflow = Workflow::new("Support triage", "classify and answer tickets");
    let reader = workflow.graph().add_node(NodeDraft::new("Reader", "reader"));
    let classifier = workflow.graph().add_node(NodeDraft::new("Classifier", "classifier").at(350.0, 150.0));
    let writer = workflow.graph().add_node(NodeDraft::new("Writer", "writer").at(600.0, 150.0));
    workflow.graph().add_edge(&reader.id, &classifier.id).unwrap();
    workflow.graph().add_edge(&classifier.id, &writer.id).unwrap();
    println!("Topological order: {:?}", workflow.graph().topological_order());

    let source = Arc::new(DemoSource {
        nodes: vec![reader.id.clone(), classifier.id.clone(), writer.id.clone()],
        polls: AtomicUsize::new(0),
    });
    let studio = StudioBuilder::new().config(config).status_source(source).build().unwrap();
    studio.save(&workflow).unwrap();
    let stored = studio.open(workflow.id()).unwrap();
    println!("Saved workflow {} with {} nodes", stored.id(), stored.graph().node_count());

    let monitor = studio.status_monitor();
    let listener = monitor.listener("exec-*").unwrap();
    listener.on_update(|status| {
        println!("Execution {} is {}", status.execution_id, status.status.label());
    });
    listener.on_closed(|id| {
        println!("Subscription closed, execution: {}", id);
    });

    let sub = monitor.watch("exec-demo");
    loop {
        if !sub.is_active() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    for node in sub.display(&workflow.graph().to_snapshot()) {
        println!("{:<12} {}", node.name, node.label());
    }

    // no ai service configured here, so the form answers with the fallback suggestion
    let form = studio.suggestion_form();
    let input = SuggestionInput::new("Summarize weekly agent logs").with_agent_types(["reader", "writer"]);
    let suggestion = studio.runtime().block_on(form.submit(&input)).unwrap();
    println!("Suggestion: {:#?}", suggestion);

    let seeded = studio.seed(&suggestion).unwrap();
    println!("Seeded draft {} with {} nodes", seeded.id(), seeded.graph().node_count());
}
