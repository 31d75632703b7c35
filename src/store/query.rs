use crate::model::WorkflowStatus;

const DEFAULT_LIMIT: usize = 100;

/// Sortable columns of a workflow listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum OrderField {
    Name,
    CreateTime,
    UpdateTime,
    LastRun,
}

/// Pagination, filtering and ordering of a listing.
///
/// ```rust,ignore
/// let q = Query::new().set_limit(20).filter_name("triage").order(OrderField::UpdateTime, true);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    limit: usize,
    offset: usize,
    name: Option<String>,
    status: Option<WorkflowStatus>,
    order_by: Vec<(OrderField, bool)>,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            name: None,
            status: None,
            order_by: Vec::new(),
        }
    }

    pub fn set_limit(
        mut self,
        limit: usize,
    ) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn set_offset(
        mut self,
        offset: usize,
    ) -> Self {
        self.offset = offset;
        self
    }

    /// Case insensitive substring match on the workflow name.
    pub fn filter_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn filter_status(
        mut self,
        status: WorkflowStatus,
    ) -> Self {
        self.status = Some(status);
        self
    }

    /// Append an ordering; `rev` sorts descending.
    pub fn order(
        mut self,
        field: OrderField,
        rev: bool,
    ) -> Self {
        self.order_by.push((field, rev));
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn status(&self) -> Option<WorkflowStatus> {
        self.status
    }

    pub fn order_by(&self) -> &[(OrderField, bool)] {
        &self.order_by
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let q = Query::new().set_limit(0).set_offset(20).filter_name("tri").filter_status(WorkflowStatus::Active).order(OrderField::UpdateTime, true);

        assert_eq!(q.limit(), 1);
        assert_eq!(q.offset(), 20);
        assert_eq!(q.name(), Some("tri"));
        assert_eq!(q.status(), Some(WorkflowStatus::Active));
        assert_eq!(q.order_by(), &[(OrderField::UpdateTime, true)]);
        assert_eq!(OrderField::LastRun.as_ref(), "last_run");
    }
}
