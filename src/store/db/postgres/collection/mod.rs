mod workflow;

use std::sync::Arc;

use sea_query::{Cond, Condition, Expr as SeaExpr, Func as SeaFunc};

use crate::store::Query;

use super::synclient::SynClient;

pub use workflow::WorkflowCollection;

pub type DbConnection = Arc<SynClient>;

/// Filters of `q` as a sea-query condition.
pub fn into_query(q: &Query) -> Condition {
    let mut cond = Cond::all();
    if let Some(name) = q.name() {
        let pattern = format!("%{}%", name.to_lowercase());
        cond = cond.add(SeaExpr::expr(SeaFunc::lower(SeaExpr::col(workflow::CollectionIden::Name))).like(pattern));
    }
    if let Some(status) = q.status() {
        cond = cond.add(SeaExpr::col(workflow::CollectionIden::Status).eq(status.as_ref()));
    }
    cond
}
