mod collect;
mod document;

use std::sync::Arc;

use crate::{
    Result,
    store::{DbCollection, DbStore, WorkflowRecord},
};
use collect::Collect;

#[derive(Debug, Clone)]
pub struct MemStore {
    workflows: Arc<Collect<WorkflowRecord>>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DbStore for MemStore {
    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn workflows(&self) -> Arc<dyn DbCollection<Item = WorkflowRecord>> {
        self.workflows.clone()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            workflows: Arc::new(Collect::new("workflows")),
        }
    }
}
