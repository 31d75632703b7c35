use std::sync::Arc;

use tokio::runtime::Runtime;

use crate::{
    Result,
    store::{DbCollection, DbStore, WorkflowRecord},
};

use super::{DbInit, collection::*, synclient::SynClient};

pub struct PostgresStore {
    workflows: Arc<WorkflowCollection>,
}

impl DbStore for PostgresStore {
    fn init(&self) -> Result<()> {
        self.workflows.init()
    }

    fn workflows(&self) -> Arc<dyn DbCollection<Item = WorkflowRecord>> {
        self.workflows.clone()
    }
}

impl PostgresStore {
    pub fn new(
        db_url: &str,
        runtime: Arc<Runtime>,
    ) -> Result<Self> {
        let conn = Arc::new(SynClient::connect(db_url, runtime)?);
        let workflows = WorkflowCollection::new(&conn);

        Ok(Self {
            workflows: Arc::new(workflows),
        })
    }
}
