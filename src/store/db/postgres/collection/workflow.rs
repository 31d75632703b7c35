use sea_query::{ColumnDef, Expr as SeaExpr, Func as SeaFunc, Iden, Index, Order as SeaOrder, PostgresQueryBuilder, Query as SeaQuery, Table};
use sea_query_binder::SqlxBinder;
use sqlx::{Error as DbError, Row, postgres::PgRow};

use crate::{
    AgentflowError, Result,
    store::{
        DbCollection, OrderField, PageData, Query, WorkflowRecord,
        db::postgres::{DbInit, DbRow},
        map_db_err,
    },
};

use super::{DbConnection, into_query};

#[derive(Debug)]
pub struct WorkflowCollection {
    conn: DbConnection,
}

#[derive(Iden, Clone, Copy)]
#[iden = "workflows"]
pub(super) enum CollectionIden {
    Table,

    Id,
    Name,
    Desc,
    Status,
    Data,
    LastRun,
    CreateTime,
    UpdateTime,
}

const COLUMNS: [CollectionIden; 8] = [
    CollectionIden::Id,
    CollectionIden::Name,
    CollectionIden::Desc,
    CollectionIden::Status,
    CollectionIden::Data,
    CollectionIden::LastRun,
    CollectionIden::CreateTime,
    CollectionIden::UpdateTime,
];

fn order_column(field: OrderField) -> CollectionIden {
    match field {
        OrderField::Name => CollectionIden::Name,
        OrderField::CreateTime => CollectionIden::CreateTime,
        OrderField::UpdateTime => CollectionIden::UpdateTime,
        OrderField::LastRun => CollectionIden::LastRun,
    }
}

impl DbCollection for WorkflowCollection {
    type Item = WorkflowRecord;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        let (sql, values) = SeaQuery::select()
            .from(CollectionIden::Table)
            .expr(SeaFunc::count(SeaExpr::col(CollectionIden::Id)))
            .and_where(SeaExpr::col(CollectionIden::Id).eq(id))
            .build_sqlx(PostgresQueryBuilder);

        let count = self.conn.query_one(sql.as_str(), values).map(|row| row.get::<i64, usize>(0)).map_err(map_db_err)?;

        Ok(count > 0)
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        let (sql, values) = SeaQuery::select().from(CollectionIden::Table).columns(COLUMNS).and_where(SeaExpr::col(CollectionIden::Id).eq(id)).build_sqlx(PostgresQueryBuilder);

        match self.conn.query_optional(&sql, values).map_err(map_db_err)? {
            Some(row) => Self::Item::from_row(&row).map_err(map_db_err),
            None => Err(AgentflowError::NotFound(format!("workflows '{}' not found", id))),
        }
    }

    fn query(
        &self,
        q: &Query,
    ) -> Result<PageData<Self::Item>> {
        let filter = into_query(q);

        let mut count_query = SeaQuery::select();
        count_query.from(CollectionIden::Table).expr(SeaFunc::count(SeaExpr::col(CollectionIden::Id)));

        let mut query = SeaQuery::select();
        query.columns(COLUMNS).from(CollectionIden::Table);

        if !filter.is_empty() {
            count_query.cond_where(filter.clone());
            query.cond_where(filter);
        }

        for (field, rev) in q.order_by().iter() {
            query.order_by(
                order_column(*field),
                if *rev {
                    SeaOrder::Desc
                } else {
                    SeaOrder::Asc
                },
            );
        }
        // stable paging
        query.order_by(CollectionIden::Id, SeaOrder::Asc);
        let (sql, values) = query.limit(q.limit() as u64).offset(q.offset() as u64).build_sqlx(PostgresQueryBuilder);

        let (count_sql, count_values) = count_query.build_sqlx(PostgresQueryBuilder);
        let count = self.conn.query_one(count_sql.as_str(), count_values).map_err(map_db_err)?.get::<i64, usize>(0) as usize;
        let rows = self
            .conn
            .query(&sql, values)
            .map_err(map_db_err)?
            .iter()
            .map(|row| Self::Item::from_row(row).map_err(map_db_err))
            .collect::<Result<Vec<_>>>()?;

        Ok(PageData::new(q, count, rows))
    }

    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        let data = data.clone();
        let (sql, sql_values) = SeaQuery::insert()
            .into_table(CollectionIden::Table)
            .columns(COLUMNS)
            .values([
                data.id.into(),
                data.name.into(),
                data.desc.into(),
                data.status.into(),
                data.data.into(),
                data.last_run.into(),
                data.create_time.into(),
                data.update_time.into(),
            ])
            .map_err(map_db_err)?
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        let model = data.clone();
        let (sql, sql_values) = SeaQuery::update()
            .table(CollectionIden::Table)
            .values([
                (CollectionIden::Name, model.name.into()),
                (CollectionIden::Desc, model.desc.into()),
                (CollectionIden::Status, model.status.into()),
                (CollectionIden::Data, model.data.into()),
                (CollectionIden::LastRun, model.last_run.into()),
                (CollectionIden::CreateTime, model.create_time.into()),
                (CollectionIden::UpdateTime, model.update_time.into()),
            ])
            .and_where(SeaExpr::col(CollectionIden::Id).eq(data.id()))
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        let (sql, values) =
            SeaQuery::delete().from_table(CollectionIden::Table).and_where(SeaExpr::col(CollectionIden::Id).eq(id)).build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

impl DbRow for WorkflowRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &PgRow) -> std::result::Result<Self, DbError>
    where
        Self: Sized,
    {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            desc: row.try_get("desc")?,
            status: row.try_get("status")?,
            data: row.try_get("data")?,
            last_run: row.try_get("last_run")?,
            create_time: row.try_get("create_time")?,
            update_time: row.try_get("update_time")?,
        })
    }
}

impl DbInit for WorkflowCollection {
    fn init(&self) -> Result<()> {
        let sql = [
            Table::create()
                .table(CollectionIden::Table)
                .if_not_exists()
                .col(ColumnDef::new(CollectionIden::Id).string().not_null().primary_key())
                .col(ColumnDef::new(CollectionIden::Name).string())
                .col(ColumnDef::new(CollectionIden::Desc).text())
                .col(ColumnDef::new(CollectionIden::Status).string().not_null())
                .col(ColumnDef::new(CollectionIden::Data).text().not_null())
                .col(ColumnDef::new(CollectionIden::LastRun).big_integer().null())
                .col(ColumnDef::new(CollectionIden::CreateTime).big_integer().default(0))
                .col(ColumnDef::new(CollectionIden::UpdateTime).big_integer().default(0))
                .build(PostgresQueryBuilder),
            Index::create().name("idx_workflows_name").if_not_exists().table(CollectionIden::Table).col(CollectionIden::Name).build(PostgresQueryBuilder),
            Index::create().name("idx_workflows_status").if_not_exists().table(CollectionIden::Table).col(CollectionIden::Status).build(PostgresQueryBuilder),
        ];

        self.conn.batch_execute(&sql).map_err(map_db_err)
    }
}

impl WorkflowCollection {
    pub fn new(conn: &DbConnection) -> Self {
        Self {
            conn: conn.clone(),
        }
    }
}
