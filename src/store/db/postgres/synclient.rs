use std::{future::Future, sync::Arc, time::Duration};

use sqlx::{
    Database, Error, IntoArguments, PgPool, Postgres,
    postgres::{PgPoolOptions, PgRow},
};
use tokio::{
    runtime::{Handle, Runtime},
    task::block_in_place,
};
use tracing::info;

use crate::{AgentflowError, Result};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CONNECTIONS: u32 = 16;

/// Blocking facade over a sqlx pool, driven by the studio runtime.
#[derive(Debug, Clone)]
pub struct SynClient {
    pool: PgPool,

    runtime: Arc<Runtime>,
}

/// Run `fut` to completion, also from inside a runtime worker.
fn block_on<F: Future>(
    runtime: &Runtime,
    fut: F,
) -> F::Output {
    if Handle::try_current().is_ok() { block_in_place(|| runtime.block_on(fut)) } else { runtime.block_on(fut) }
}

impl SynClient {
    pub fn connect(
        db_url: &str,
        runtime: Arc<Runtime>,
    ) -> Result<Self> {
        let pool = block_on(&runtime, async move { PgPoolOptions::new().acquire_timeout(ACQUIRE_TIMEOUT).max_connections(MAX_CONNECTIONS).connect(db_url).await })
            .map_err(|e| AgentflowError::Store(format!("failed to connect to DB: {}", e)))?;
        info!("store::postgres connected");

        Ok(Self {
            pool,
            runtime,
        })
    }

    pub fn query_one<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> std::result::Result<PgRow, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        block_on(&self.runtime, async move {
            let mut conn = self.pool.acquire().await?;

            sqlx::query_with(sql, params).fetch_one(&mut *conn).await
        })
    }

    pub fn query_optional<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> std::result::Result<Option<PgRow>, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        block_on(&self.runtime, async move {
            let mut conn = self.pool.acquire().await?;

            sqlx::query_with(sql, params).fetch_optional(&mut *conn).await
        })
    }

    pub fn query<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> std::result::Result<Vec<PgRow>, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        block_on(&self.runtime, async move {
            let mut conn = self.pool.acquire().await?;

            sqlx::query_with(sql, params).fetch_all(&mut *conn).await
        })
    }

    pub fn execute<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> std::result::Result<<Postgres as Database>::QueryResult, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        block_on(&self.runtime, async move {
            let mut conn = self.pool.acquire().await?;

            sqlx::query_with(sql, params).execute(&mut *conn).await
        })
    }

    pub fn batch_execute(
        &self,
        sqls: &[String],
    ) -> std::result::Result<(), Error> {
        block_on(&self.runtime, async move {
            let mut tx = self.pool.begin().await?;

            for sql in sqls {
                sqlx::query(sql).execute(&mut *tx).await?;
            }
            tx.commit().await
        })
    }
}
