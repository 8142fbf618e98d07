//! In-process backend: rows per table behind a lock, same semantics as `PgBackend`.

use super::{Backend, Filter, Query, Row};
use crate::error::AppError;
use crate::realtime::{key_columns, ChangeEvent, ChangeKind, Realtime};
use crate::schema::{self, TableDef};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Row>>,
    last_ts: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing timestamps so insertion order survives `created_at` sorting.
    fn next_timestamp(&mut self) -> String {
        let mut now = Utc::now();
        if let Some(last) = self.last_ts {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_ts = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
    realtime: Option<Realtime>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish row changes on realtime-enabled tables to `hub`.
    pub fn with_realtime(hub: Realtime) -> Self {
        MemoryBackend {
            tables: RwLock::new(Tables::default()),
            realtime: Some(hub),
        }
    }

    fn publish(&self, def: &TableDef, kind: ChangeKind, record: Option<Row>, old_record: Option<Row>) {
        if !def.realtime {
            return;
        }
        if let Some(hub) = &self.realtime {
            hub.publish(ChangeEvent {
                table: def.name.to_string(),
                kind,
                record: record.as_ref().map(key_columns),
                old_record: old_record.as_ref().map(key_columns),
            });
        }
    }
}

fn table_def(name: &str) -> Result<&'static TableDef, AppError> {
    schema::table(name).ok_or_else(|| AppError::BadRequest(format!("unknown table: {}", name)))
}

fn lock_poisoned() -> AppError {
    AppError::Conflict("memory backend lock poisoned".into())
}

/// Column sets that must be unique, from column DDL (`UNIQUE`, `PRIMARY KEY`) and table constraints.
fn unique_sets(def: &TableDef) -> Vec<Vec<&'static str>> {
    let mut sets: Vec<Vec<&'static str>> = def
        .columns
        .iter()
        .filter(|c| c.ddl.contains("UNIQUE") || c.ddl.contains("PRIMARY KEY"))
        .map(|c| vec![c.name])
        .collect();
    for constraint in def.constraints {
        if let Some(inner) = constraint
            .strip_prefix("UNIQUE (")
            .and_then(|s| s.strip_suffix(')'))
        {
            sets.push(inner.split(',').map(|s| s.trim()).collect());
        }
    }
    sets
}

fn check_unique(def: &TableDef, rows: &[Row], candidate: &Row) -> Result<(), AppError> {
    for set in unique_sets(def) {
        let key: Vec<&Value> = set.iter().map(|c| candidate.get(*c).unwrap_or(&Value::Null)).collect();
        if key.iter().any(|v| v.is_null()) {
            continue;
        }
        let clash = rows
            .iter()
            .any(|r| set.iter().zip(&key).all(|(c, v)| r.get(*c) == Some(*v)));
        if clash {
            return Err(AppError::Conflict(format!(
                "duplicate value for {}({})",
                def.name,
                set.join(", ")
            )));
        }
    }
    Ok(())
}

/// Literal `DEFAULT` from column DDL. Expression defaults (`NOW()`, `gen_random_uuid()`) are generated elsewhere.
fn column_default(ddl: &str) -> Value {
    let Some(rest) = ddl.split("DEFAULT ").nth(1) else {
        return Value::Null;
    };
    match rest.split_whitespace().next().unwrap_or_default() {
        "TRUE" => Value::Bool(true),
        "FALSE" => Value::Bool(false),
        "'[]'::jsonb" => Value::Array(Vec::new()),
        lit if lit.len() >= 2 && lit.starts_with('\'') && lit.ends_with('\'') => {
            Value::String(lit[1..lit.len() - 1].to_string())
        }
        _ => Value::Null,
    }
}

/// Give absent columns their declared default (or null) so reads see every column.
fn fill_columns(def: &TableDef, row: &mut Row) {
    for c in def.columns {
        if !row.contains_key(c.name) {
            row.insert(c.name.to_string(), column_default(c.ddl));
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, AppError> {
        table_def(&query.table)?;
        let tables = self.tables.read().map_err(|_| lock_poisoned())?;
        let mut out: Vec<Row> = tables
            .rows
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| query.filters.iter().all(|f| f.matches(r)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        out.sort_by(|a, b| query.compare_rows(a, b));
        if let Some(limit) = query.limit {
            out.truncate(limit as usize);
        }
        Ok(out)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, AppError> {
        let def = table_def(table)?;
        for key in row.keys() {
            if def.column(key).is_none() {
                return Err(AppError::BadRequest(format!("unknown column {}.{}", table, key)));
            }
        }
        let stored = {
            let mut tables = self.tables.write().map_err(|_| lock_poisoned())?;
            let ts = tables.next_timestamp();
            if row.get("id").map(Value::is_null).unwrap_or(true) {
                row.insert("id".into(), Value::String(uuid::Uuid::new_v4().to_string()));
            }
            for col in ["created_at", "updated_at"] {
                if row.get(col).map(Value::is_null).unwrap_or(true) {
                    row.insert(col.into(), Value::String(ts.clone()));
                }
            }
            fill_columns(def, &mut row);
            let rows = tables.rows.entry(table.to_string()).or_default();
            check_unique(def, rows, &row)?;
            rows.push(row.clone());
            row
        };
        tracing::debug!(table = %table, "memory insert");
        self.publish(def, ChangeKind::Insert, Some(stored.clone()), None);
        Ok(stored)
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Row) -> Result<Vec<Row>, AppError> {
        let def = table_def(table)?;
        for key in patch.keys() {
            if def.column(key).is_none() {
                return Err(AppError::BadRequest(format!("unknown column {}.{}", table, key)));
            }
        }
        let changed = {
            let mut tables = self.tables.write().map_err(|_| lock_poisoned())?;
            let ts = tables.next_timestamp();
            let rows = tables.rows.entry(table.to_string()).or_default();
            let targets: Vec<usize> = rows
                .iter()
                .enumerate()
                .filter(|(_, r)| filters.iter().all(|f| f.matches(r)))
                .map(|(i, _)| i)
                .collect();
            let mut next_rows: Vec<Row> = Vec::with_capacity(targets.len());
            for &i in &targets {
                let mut next = rows[i].clone();
                for (k, v) in &patch {
                    next.insert(k.clone(), v.clone());
                }
                if !patch.contains_key("updated_at") {
                    next.insert("updated_at".into(), Value::String(ts.clone()));
                }
                next_rows.push(next);
            }
            // All rows are checked against the post-update table before any is written.
            let after: Vec<Row> = rows
                .iter()
                .enumerate()
                .filter(|(j, _)| !targets.contains(j))
                .map(|(_, r)| r.clone())
                .chain(next_rows.iter().cloned())
                .collect();
            let untouched = after.len() - next_rows.len();
            for (n, next) in next_rows.iter().enumerate() {
                let others: Vec<Row> = after
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != untouched + n)
                    .map(|(_, r)| r.clone())
                    .collect();
                check_unique(def, &others, next)?;
            }
            let mut changed = Vec::with_capacity(targets.len());
            for (i, next) in targets.into_iter().zip(next_rows) {
                let old = std::mem::replace(&mut rows[i], next.clone());
                changed.push((old, next));
            }
            changed
        };
        tracing::debug!(table = %table, count = changed.len(), "memory update");
        let mut out = Vec::with_capacity(changed.len());
        for (old, new) in changed {
            self.publish(def, ChangeKind::Update, Some(new.clone()), Some(old));
            out.push(new);
        }
        Ok(out)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, AppError> {
        let def = table_def(table)?;
        let removed = {
            let mut tables = self.tables.write().map_err(|_| lock_poisoned())?;
            let rows = tables.rows.entry(table.to_string()).or_default();
            let (gone, kept): (Vec<Row>, Vec<Row>) = rows
                .drain(..)
                .partition(|r| filters.iter().all(|f| f.matches(r)));
            *rows = kept;
            gone
        };
        tracing::debug!(table = %table, count = removed.len(), "memory delete");
        for old in &removed {
            self.publish(def, ChangeKind::Delete, None, Some(old.clone()));
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_generates_id_and_timestamps() {
        let db = MemoryBackend::new();
        let r = db
            .insert("classrooms", row(json!({"name": "Sunflowers", "is_active": true})))
            .await
            .unwrap();
        assert!(uuid::Uuid::parse_str(r["id"].as_str().unwrap()).is_ok());
        assert!(r["created_at"].is_string());
        assert_eq!(r["teacher_id"], Value::Null);
    }

    #[tokio::test]
    async fn literal_defaults_are_applied() {
        let db = MemoryBackend::new();
        let r = db.insert("classrooms", row(json!({"name": "Daisies"}))).await.unwrap();
        assert_eq!(r["is_active"], true);
        let s = db.insert("school_settings", row(json!({"school_name": "Acorn"}))).await.unwrap();
        assert_eq!(s["timezone"], "UTC");
    }

    #[tokio::test]
    async fn unknown_column_is_rejected() {
        let db = MemoryBackend::new();
        let err = db.insert("classrooms", row(json!({"colour": "red"}))).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn unique_constraints_are_enforced() {
        let db = MemoryBackend::new();
        let a = json!({"email": "a@x.org", "full_name": "A", "role": "parent", "is_active": true});
        db.insert("users", row(a.clone())).await.unwrap();
        let err = db.insert("users", row(a)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_touches_only_matching_rows() {
        let db = MemoryBackend::new();
        let a = db.insert("classrooms", row(json!({"name": "A"}))).await.unwrap();
        db.insert("classrooms", row(json!({"name": "B"}))).await.unwrap();
        let updated = db
            .update(
                "classrooms",
                &[Filter::Eq("id".into(), a["id"].clone())],
                row(json!({"capacity": 12})),
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        let all = db.select(&Query::table("classrooms").order("name", true)).await.unwrap();
        assert_eq!(all[0]["capacity"], 12);
        assert_eq!(all[1]["capacity"], Value::Null);
        assert!(all[0]["updated_at"].as_str() > all[0]["created_at"].as_str());
    }

    #[tokio::test]
    async fn conflicting_update_changes_no_rows() {
        let db = MemoryBackend::new();
        for email in ["a@x.org", "b@x.org"] {
            db.insert("users", row(json!({"email": email, "full_name": "U", "role": "parent"})))
                .await
                .unwrap();
        }
        let err = db
            .update("users", &[], row(json!({"email": "same@x.org"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let mut emails: Vec<String> = db
            .select(&Query::table("users"))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r["email"].as_str().unwrap().to_string())
            .collect();
        emails.sort();
        assert_eq!(emails, vec!["a@x.org", "b@x.org"]);
    }

    #[tokio::test]
    async fn realtime_tables_publish_changes() {
        let hub = Realtime::new();
        let mut rx = hub.raw_receiver();
        let db = MemoryBackend::with_realtime(hub);
        db.insert("classrooms", row(json!({"name": "quiet"}))).await.unwrap();
        let user = db
            .insert("users", row(json!({"email": "t@x.org", "full_name": "T", "role": "teacher"})))
            .await
            .unwrap();
        db.insert(
            "notifications",
            row(json!({"user_id": user["id"], "notification_type": "system", "title": "t", "message": "m"})),
        )
        .await
        .unwrap();
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.table, "notifications");
        assert_eq!(ev.kind, ChangeKind::Insert);
    }
}
