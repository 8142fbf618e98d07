//! Backend client: a row store addressed by table name and column filters.
//!
//! `PgBackend` runs against PostgreSQL; `MemoryBackend` keeps rows in process and is used
//! for local runs and tests. Both give the same filter, ordering and timestamp semantics.

mod memory;
mod postgres;

pub use memory::MemoryBackend;
pub use postgres::PgBackend;

use crate::error::AppError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// One table row as column name -> JSON value.
pub type Row = Map<String, Value>;

/// Column predicate. Values compare as JSON (strings lexicographically, so ISO dates order correctly).
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
    Gte(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _)
            | Filter::Neq(c, _)
            | Filter::Gte(c, _)
            | Filter::Lte(c, _)
            | Filter::In(c, _)
            | Filter::IsNull(c) => c,
        }
    }

    /// Evaluate against a row. A missing column reads as null; null never satisfies a comparison.
    pub fn matches(&self, row: &Row) -> bool {
        let cell = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Filter::Eq(_, v) => !cell.is_null() && compare_values(cell, v) == Ordering::Equal,
            Filter::Neq(_, v) => !cell.is_null() && compare_values(cell, v) != Ordering::Equal,
            Filter::Gte(_, v) => !cell.is_null() && compare_values(cell, v) != Ordering::Less,
            Filter::Lte(_, v) => !cell.is_null() && compare_values(cell, v) != Ordering::Greater,
            Filter::In(_, vs) => !cell.is_null() && vs.iter().any(|v| compare_values(cell, v) == Ordering::Equal),
            Filter::IsNull(_) => cell.is_null(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// SELECT description built fluently: `Query::table("children").eq("classroom_id", id).order("first_name", true)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn table(table: &str) -> Self {
        Query {
            table: table.to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.into()));
        self
    }

    /// Adds an equality filter only when the value is present.
    pub fn eq_opt<V: Into<Value>>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    pub fn neq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Neq(column.into(), value.into()));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(column.into(), value.into()));
        self
    }

    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lte(column.into(), value.into()));
        self
    }

    pub fn is_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In(column.into(), values));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push(Filter::IsNull(column.into()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Compare two rows by this query's ordering. Nulls sort last in both directions.
    pub fn compare_rows(&self, a: &Row, b: &Row) -> Ordering {
        for o in &self.order {
            let x = a.get(&o.column).unwrap_or(&Value::Null);
            let y = b.get(&o.column).unwrap_or(&Value::Null);
            let ord = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let ord = compare_values(x, y);
                    if o.ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Order two JSON scalars. Mixed kinds fall back to comparing their text form.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Row store behind every resource service. Errors are returned as-is; callers do not retry.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Rows matching every filter, in query order, truncated to the limit.
    async fn select(&self, query: &Query) -> Result<Vec<Row>, AppError>;

    /// Insert one row. `id`, `created_at` and `updated_at` are generated when absent. Returns the stored row.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, AppError>;

    /// Apply `patch` to every matching row and bump `updated_at`. Returns the updated rows.
    async fn update(&self, table: &str, filters: &[Filter], patch: Row) -> Result<Vec<Row>, AppError>;

    /// Remove every matching row. Returns the removed rows.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, AppError>;
}

/// Build a `Row` from a serializable value (must serialize to a JSON object).
pub fn to_row<T: serde::Serialize>(value: &T) -> Result<Row, AppError> {
    match serde_json::to_value(value)? {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("row must be a JSON object".into())),
    }
}

/// Decode a row into a model.
pub fn from_row<T: serde::de::DeserializeOwned>(row: Row) -> Result<T, AppError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

pub fn from_rows<T: serde::de::DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, AppError> {
    rows.into_iter().map(from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn filters_treat_missing_as_null() {
        let r = row(json!({"classroom_id": "a", "is_active": true}));
        assert!(Filter::Eq("classroom_id".into(), json!("a")).matches(&r));
        assert!(!Filter::Eq("classroom_id".into(), json!("b")).matches(&r));
        assert!(!Filter::Neq("missing".into(), json!("b")).matches(&r));
        assert!(Filter::IsNull("missing".into()).matches(&r));
        assert!(Filter::In("classroom_id".into(), vec![json!("x"), json!("a")]).matches(&r));
    }

    #[test]
    fn date_ranges_compare_as_strings() {
        let r = row(json!({"date": "2026-03-05"}));
        assert!(Filter::Gte("date".into(), json!("2026-03-01")).matches(&r));
        assert!(Filter::Lte("date".into(), json!("2026-03-05")).matches(&r));
        assert!(!Filter::Lte("date".into(), json!("2026-03-04")).matches(&r));
    }

    #[test]
    fn ordering_puts_nulls_last() {
        let q = Query::table("documents").order("due_date", true);
        let mut rows = vec![
            row(json!({"due_date": null, "n": 1})),
            row(json!({"due_date": "2026-02-01", "n": 2})),
            row(json!({"due_date": "2026-01-01", "n": 3})),
        ];
        rows.sort_by(|a, b| q.compare_rows(a, b));
        let ns: Vec<_> = rows.iter().map(|r| r["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![3, 2, 1]);
    }

    #[test]
    fn multi_column_order() {
        let q = Query::table("announcements").order("is_pinned", false).order("created_at", false);
        let mut rows = vec![
            row(json!({"is_pinned": false, "created_at": "2026-01-03"})),
            row(json!({"is_pinned": true, "created_at": "2026-01-01"})),
            row(json!({"is_pinned": false, "created_at": "2026-01-05"})),
        ];
        rows.sort_by(|a, b| q.compare_rows(a, b));
        assert_eq!(rows[0]["created_at"], "2026-01-01");
        assert_eq!(rows[1]["created_at"], "2026-01-05");
        assert_eq!(rows[2]["created_at"], "2026-01-03");
    }
}
