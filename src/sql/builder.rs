//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a table definition and a `Query`.
//! Identifiers only ever come from `schema`; values are always bound parameters.

use super::params::PgBindValue;
use crate::backend::{Filter, Query, Row};
use crate::error::AppError;
use crate::schema::TableDef;
use serde_json::Value;

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> u32 {
        self.params.push(v);
        self.params.len() as u32
    }
}

fn pg_type<'a>(def: &'a TableDef, column: &str) -> Result<&'a str, AppError> {
    def.column(column)
        .map(|c| c.pg_type)
        .ok_or_else(|| AppError::BadRequest(format!("unknown column {}.{}", def.name, column)))
}

/// SELECT list: time columns as text so they decode as "HH:MM:SS" strings.
fn select_column_list(def: &TableDef) -> String {
    def.columns
        .iter()
        .map(|c| {
            let q = quoted(c.name);
            if c.pg_type == "time" {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(def: &TableDef, filters: &[Filter], q: &mut QueryBuf) -> Result<String, AppError> {
    let mut parts = Vec::with_capacity(filters.len());
    for f in filters {
        let col = f.column();
        let typ = pg_type(def, col)?;
        let c = quoted(col);
        let part = match f {
            Filter::Eq(_, v) => format!("{} = ${}::{}", c, q.push_param(PgBindValue::from_json(v)), typ),
            Filter::Neq(_, v) => format!("{} <> ${}::{}", c, q.push_param(PgBindValue::from_json(v)), typ),
            Filter::Gte(_, v) => format!("{} >= ${}::{}", c, q.push_param(PgBindValue::from_json(v)), typ),
            Filter::Lte(_, v) => format!("{} <= ${}::{}", c, q.push_param(PgBindValue::from_json(v)), typ),
            Filter::In(_, vs) if vs.is_empty() => "FALSE".to_string(),
            Filter::In(_, vs) => format!(
                "{} = ANY(${}::{}[])",
                c,
                q.push_param(PgBindValue::array_from_json(vs)),
                typ
            ),
            Filter::IsNull(_) => format!("{} IS NULL", c),
        };
        parts.push(part);
    }
    Ok(if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    })
}

/// SELECT with filters, ORDER BY (nulls last) and LIMIT.
pub fn select(schema: &str, def: &TableDef, query: &Query) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(def, &query.filters, &mut q)?;
    let mut order_parts = Vec::with_capacity(query.order.len());
    for o in &query.order {
        pg_type(def, &o.column)?;
        order_parts.push(format!(
            "{} {} NULLS LAST",
            quoted(&o.column),
            if o.ascending { "ASC" } else { "DESC" }
        ));
    }
    q.sql = format!(
        "SELECT {} FROM {}{}",
        select_column_list(def),
        qualified_table(schema, def.name),
        where_sql
    );
    if !order_parts.is_empty() {
        q.sql.push_str(" ORDER BY ");
        q.sql.push_str(&order_parts.join(", "));
    }
    if let Some(limit) = query.limit {
        q.sql.push_str(&format!(" LIMIT {}", limit));
    }
    Ok(q)
}

/// INSERT one row. Null values are omitted so column defaults apply.
pub fn insert(schema: &str, def: &TableDef, row: &Row) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (col, val) in row {
        if val.is_null() {
            continue;
        }
        let typ = pg_type(def, col)?;
        let n = q.push_param(PgBindValue::from_json(val));
        cols.push(quoted(col));
        placeholders.push(format!("${}::{}", n, typ));
    }
    let table = qualified_table(schema, def.name);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, select_column_list(def))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            select_column_list(def)
        )
    };
    Ok(q)
}

/// UPDATE matching rows. `updated_at` is set to NOW() unless the patch carries it.
pub fn update(schema: &str, def: &TableDef, filters: &[Filter], patch: &Row) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (col, val) in patch {
        let typ = pg_type(def, col)?;
        let n = q.push_param(PgBindValue::from_json(val));
        sets.push(format!("{} = ${}::{}", quoted(col), n, typ));
    }
    if !patch.contains_key("updated_at") {
        sets.push(format!("{} = NOW()", quoted("updated_at")));
    }
    let where_sql = where_clause(def, filters, &mut q)?;
    q.sql = format!(
        "UPDATE {} SET {}{} RETURNING {}",
        qualified_table(schema, def.name),
        sets.join(", "),
        where_sql,
        select_column_list(def)
    );
    Ok(q)
}

/// DELETE matching rows, returning them.
pub fn delete(schema: &str, def: &TableDef, filters: &[Filter]) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(def, filters, &mut q)?;
    q.sql = format!(
        "DELETE FROM {}{} RETURNING {}",
        qualified_table(schema, def.name),
        where_sql,
        select_column_list(def)
    );
    Ok(q)
}

/// Values that bind as a single text param (used by tests and debug logging).
pub fn describe_params(params: &[PgBindValue]) -> Vec<Value> {
    params
        .iter()
        .map(|p| match p {
            PgBindValue::Text(Some(s)) => Value::String(s.clone()),
            PgBindValue::Text(None) => Value::Null,
            PgBindValue::TextArray(v) => Value::Array(v.iter().cloned().map(Value::String).collect()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use serde_json::json;

    fn children() -> &'static TableDef {
        schema::table(schema::CHILDREN).unwrap()
    }

    #[test]
    fn select_with_filters_order_and_limit() {
        let query = Query::table("children")
            .eq("classroom_id", "c1")
            .eq("is_active", true)
            .order("first_name", true)
            .limit(5);
        let q = select("public", children(), &query).unwrap();
        assert!(q.sql.starts_with("SELECT \"id\", \"first_name\""));
        assert!(q.sql.contains("FROM \"public\".\"children\""));
        assert!(q
            .sql
            .contains("WHERE \"classroom_id\" = $1::uuid AND \"is_active\" = $2::boolean"));
        assert!(q.sql.ends_with("ORDER BY \"first_name\" ASC NULLS LAST LIMIT 5"));
        assert_eq!(describe_params(&q.params), vec![json!("c1"), json!("true")]);
    }

    #[test]
    fn in_filter_uses_any_and_empty_in_is_false() {
        let q = select(
            "public",
            children(),
            &Query::table("children").is_in("id", vec![json!("a"), json!("b")]),
        )
        .unwrap();
        assert!(q.sql.contains("\"id\" = ANY($1::uuid[])"));
        let q = select("public", children(), &Query::table("children").is_in("id", vec![])).unwrap();
        assert!(q.sql.contains("WHERE FALSE"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn unknown_column_is_rejected() {
        let err = select("public", children(), &Query::table("children").eq("nope", 1)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn insert_skips_nulls_and_casts() {
        let row = json!({"first_name": "Ada", "last_name": "L", "classroom_id": null})
            .as_object()
            .cloned()
            .unwrap();
        let q = insert("public", children(), &row).unwrap();
        assert!(q.sql.starts_with(
            "INSERT INTO \"public\".\"children\" (\"first_name\", \"last_name\") VALUES ($1::text, $2::text) RETURNING"
        ));
        assert_eq!(q.params.len(), 2);
    }

    #[test]
    fn update_bumps_updated_at_and_numbers_params_after_sets() {
        let patch = json!({"is_active": false}).as_object().cloned().unwrap();
        let q = update("public", children(), &[Filter::Eq("id".into(), json!("x"))], &patch).unwrap();
        assert!(q
            .sql
            .contains("SET \"is_active\" = $1::boolean, \"updated_at\" = NOW() WHERE \"id\" = $2::uuid"));
    }

    #[test]
    fn time_columns_select_as_text() {
        let def = schema::table(schema::ACTIVITY_LOGS).unwrap();
        let q = delete("s", def, &[]).unwrap();
        assert!(q.sql.contains("\"arrival_time\"::text AS \"arrival_time\""));
        assert!(!q.sql.contains("WHERE"));
    }
}
