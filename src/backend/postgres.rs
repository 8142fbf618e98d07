//! PostgreSQL backend: parameterized statements from `sql`, rows decoded to JSON.

use super::{Backend, Filter, Query, Row};
use crate::error::AppError;
use crate::schema::{self, TableDef};
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
    schema: String,
}

impl PgBackend {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgBackend {
            pool,
            schema: schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_all(&self, q: QueryBuf) -> Result<Vec<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?sql::describe_params(&q.params), "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = p.bind(query);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn table_def(name: &str) -> Result<&'static TableDef, AppError> {
    schema::table(name).ok_or_else(|| AppError::BadRequest(format!("unknown table: {}", name)))
}

#[async_trait]
impl Backend for PgBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, AppError> {
        let def = table_def(&query.table)?;
        self.fetch_all(sql::select(&self.schema, def, query)?).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, AppError> {
        let def = table_def(table)?;
        let rows = self.fetch_all(sql::insert(&self.schema, def, &row)?).await?;
        rows.into_iter().next().ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Row) -> Result<Vec<Row>, AppError> {
        let def = table_def(table)?;
        self.fetch_all(sql::update(&self.schema, def, filters, &patch)?).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, AppError> {
        let def = table_def(table)?;
        self.fetch_all(sql::delete(&self.schema, def, filters)?).await
    }
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339_opts(chrono::SecondsFormat::Micros, true));
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}
