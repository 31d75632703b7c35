use std::cmp::Ordering;

use crate::store::{OrderField, Query, WorkflowRecord};

/// Record kept in a [`Collect`](super::collect::Collect).
pub(super) trait DbDocument: Clone + Send + Sync {
    fn id(&self) -> &str;

    /// Whether the record passes the filters of `q`.
    fn matches(
        &self,
        q: &Query,
    ) -> bool;

    fn compare(
        &self,
        other: &Self,
        field: OrderField,
    ) -> Ordering;
}

impl DbDocument for WorkflowRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches(
        &self,
        q: &Query,
    ) -> bool {
        if let Some(name) = q.name() {
            if !self.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(status) = q.status() {
            if self.status != status.as_ref() {
                return false;
            }
        }
        true
    }

    fn compare(
        &self,
        other: &Self,
        field: OrderField,
    ) -> Ordering {
        match field {
            OrderField::Name => self.name.cmp(&other.name),
            OrderField::CreateTime => self.create_time.cmp(&other.create_time),
            OrderField::UpdateTime => self.update_time.cmp(&other.update_time),
            OrderField::LastRun => self.last_run.cmp(&other.last_run),
        }
    }
}
