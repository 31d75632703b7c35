use std::sync::Arc;

use tracing::trace;

use crate::{
    Result,
    model::WorkflowModel,
    utils,
    workflow::Workflow,
};

use super::{DbCollection, DbStore, PageData, Query, WorkflowRecord};

/// Workflow persistence on top of a [`DbStore`] backend.
#[derive(Clone)]
pub struct Store {
    workflows: Arc<dyn DbCollection<Item = WorkflowRecord>>,
}

impl Store {
    /// Initialize `db` and open a store over it.
    pub fn open(db: &dyn DbStore) -> Result<Self> {
        db.init()?;
        Ok(Self {
            workflows: db.workflows(),
        })
    }

    pub fn workflows(&self) -> Arc<dyn DbCollection<Item = WorkflowRecord>> {
        self.workflows.clone()
    }

    /// Insert or replace a workflow, keeping the original create time.
    pub fn save(
        &self,
        workflow: &Workflow,
    ) -> Result<bool> {
        trace!("store::save({})", workflow.id());
        let model = workflow.to_model();
        let now = utils::time::time_millis();

        let mut record = WorkflowRecord {
            id: model.id.clone(),
            name: model.name.clone(),
            desc: model.description.clone(),
            status: model.status.to_string(),
            data: model.to_json()?,
            last_run: model.last_run,
            create_time: now,
            update_time: now,
        };

        if self.workflows.exists(&record.id)? {
            let stored = self.workflows.find(&record.id)?;
            record.create_time = stored.create_time;
            self.workflows.update(&record)
        } else {
            self.workflows.create(&record)
        }
    }

    /// Load and validate a stored workflow.
    pub fn load(
        &self,
        id: &str,
    ) -> Result<Workflow> {
        trace!("store::load({})", id);
        let record = self.workflows.find(id)?;
        Workflow::from_model(WorkflowModel::from_json(&record.data)?)
    }

    pub fn list(
        &self,
        q: &Query,
    ) -> Result<PageData<WorkflowRecord>> {
        self.workflows.query(q)
    }

    pub fn remove(
        &self,
        id: &str,
    ) -> Result<bool> {
        trace!("store::remove({})", id);
        self.workflows.delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AgentflowError,
        model::{NodeDraft, WorkflowStatus},
        store::{MemStore, OrderField},
    };

    fn store() -> Store {
        Store::open(&MemStore::new()).unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let store = store();
        let mut workflow = Workflow::new("Support triage", "route tickets");
        let a = workflow.graph().add_node(NodeDraft::new("Reader", "reader").at(10.0, 20.0));
        let b = workflow.graph().add_node(NodeDraft::new("Writer", "writer"));
        workflow.graph().add_edge(&a.id, &b.id).unwrap();
        workflow.activate().unwrap();
        workflow.record_run(42).unwrap();

        assert!(store.save(&workflow).unwrap());
        let loaded = store.load(workflow.id()).unwrap();

        assert_eq!(loaded.to_model(), workflow.to_model());
        assert_eq!(loaded.status(), WorkflowStatus::Active);
        assert_eq!(loaded.last_run(), Some(42));
    }

    #[test]
    fn test_save_updates_existing() {
        let store = store();
        let mut workflow = Workflow::new("First", "");
        store.save(&workflow).unwrap();
        let created = store.workflows().find(workflow.id()).unwrap().create_time;

        workflow.name = "Renamed".to_string();
        workflow.graph().add_node(NodeDraft::new("A", "agent"));
        assert!(store.save(&workflow).unwrap());

        let record = store.workflows().find(workflow.id()).unwrap();
        assert_eq!(record.name, "Renamed");
        assert_eq!(record.create_time, created);
        assert_eq!(store.load(workflow.id()).unwrap().graph().node_count(), 1);
        assert_eq!(store.list(&Query::new()).unwrap().count, 1);
    }

    #[test]
    fn test_load_missing() {
        let store = store();
        assert!(matches!(store.load("nope").err(), Some(AgentflowError::NotFound(_))));
        assert!(!store.remove("nope").unwrap());
    }

    #[test]
    fn test_load_rejects_corrupt_graph() {
        let store = store();
        let record = WorkflowRecord {
            id: "wf-bad".to_string(),
            name: "bad".to_string(),
            desc: String::new(),
            status: "draft".to_string(),
            data: r#"{"id":"wf-bad","name":"bad","nodes":[{"id":"a","name":"A","type":"t","x":0,"y":0}],"edges":[{"id":"e","sourceNodeId":"a","targetNodeId":"a"}]}"#.to_string(),
            last_run: None,
            create_time: 0,
            update_time: 0,
        };
        store.workflows().create(&record).unwrap();
        assert!(matches!(store.load("wf-bad").err(), Some(AgentflowError::InvalidEdge(_))));
    }

    #[test]
    fn test_list_filters_and_pages() {
        let store = store();
        for (i, name) in ["Ticket triage", "Weekly report", "Triage escalations", "Digest"].iter().enumerate() {
            let mut workflow = Workflow::new(*name, "");
            if i % 2 == 0 {
                workflow.activate().unwrap();
            }
            store.save(&workflow).unwrap();
        }

        let triage = store.list(&Query::new().filter_name("TRIAGE").order(OrderField::Name, false)).unwrap();
        assert_eq!(triage.count, 2);
        assert_eq!(triage.rows[0].name, "Ticket triage");
        assert_eq!(triage.rows[1].name, "Triage escalations");

        let active = store.list(&Query::new().filter_status(WorkflowStatus::Active)).unwrap();
        assert_eq!(active.count, 2);
        assert!(active.rows.iter().all(|r| r.status == "active"));

        let page = store.list(&Query::new().set_limit(3).set_offset(3).order(OrderField::Name, true)).unwrap();
        assert_eq!(page.count, 4);
        assert_eq!(page.page_count, 2);
        assert_eq!(page.page_num, 2);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].name, "Digest");
    }

    #[test]
    fn test_remove() {
        let store = store();
        let workflow = Workflow::new("Gone", "");
        store.save(&workflow).unwrap();

        assert!(store.remove(workflow.id()).unwrap());
        assert!(!store.workflows().exists(workflow.id()).unwrap());
    }
}
