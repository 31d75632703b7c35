//! Storage layer for persisting workflow definitions.
//!
//! Provides an abstraction over different storage backends:
//! - `MemStore`: In-memory storage for tests and single-session use
//! - `PostgresStore`: PostgreSQL for persistence across sessions

mod data;
mod db;
mod query;
mod store;

use std::{error::Error, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{AgentflowError, Result};

pub use data::WorkflowRecord;
pub use db::{MemStore, PostgresStore};
pub use query::{OrderField, Query};
pub use store::Store;

/// Maps database errors to AgentflowError.
pub(crate) fn map_db_err(err: impl Error) -> AgentflowError {
    AgentflowError::Store(err.to_string())
}

/// Paginated query result.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PageData<T> {
    /// Total number of matching records.
    pub count: usize,
    /// Current page number (1-based).
    pub page_num: usize,
    /// Total number of pages.
    pub page_count: usize,
    /// Number of records per page.
    pub page_size: usize,
    /// Records in the current page.
    pub rows: Vec<T>,
}

impl<T> PageData<T> {
    pub(crate) fn new(
        q: &Query,
        count: usize,
        rows: Vec<T>,
    ) -> Self {
        Self {
            count,
            page_num: q.offset() / q.limit() + 1,
            page_count: count.div_ceil(q.limit()),
            page_size: q.limit(),
            rows,
        }
    }
}

/// Trait for database collection operations.
pub trait DbCollection: Send + Sync {
    /// The type of items stored in this collection.
    type Item;

    /// Checks if a record with the given ID exists.
    fn exists(
        &self,
        id: &str,
    ) -> Result<bool>;

    /// Finds a record by ID.
    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item>;

    /// Queries records with pagination and filtering.
    fn query(
        &self,
        query: &Query,
    ) -> Result<PageData<Self::Item>>;

    /// Creates a new record.
    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool>;

    /// Updates an existing record.
    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool>;

    /// Deletes a record by ID.
    fn delete(
        &self,
        id: &str,
    ) -> Result<bool>;
}

/// A storage backend.
pub trait DbStore: Send + Sync {
    /// Prepares the backend, e.g. creates missing tables.
    fn init(&self) -> Result<()>;

    fn workflows(&self) -> Arc<dyn DbCollection<Item = WorkflowRecord>>;
}
