//! DDL for the application tables and the realtime trigger, plus database bootstrap.

use crate::error::AppError;
use crate::realtime::{PG_CHANNEL, REALTIME_KEYS};
use crate::schema::{TableDef, TABLES};
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// CREATE TABLE IF NOT EXISTS for one table. References resolve within `schema` via search_path.
pub fn table_ddl(schema: &str, def: &TableDef) -> String {
    let mut parts: Vec<String> = def
        .columns
        .iter()
        .map(|c| {
            let ddl = c.ddl.replace(
                "REFERENCES ",
                &format!("REFERENCES {}.", quote_ident(schema)),
            );
            format!("{} {} {}", quote_ident(c.name), c.pg_type.to_uppercase(), ddl)
                .trim_end()
                .to_string()
        })
        .collect();
    parts.extend(def.constraints.iter().map(|c| c.to_string()));
    format!(
        "CREATE TABLE IF NOT EXISTS {}.{} (\n    {}\n)",
        quote_ident(schema),
        quote_ident(def.name),
        parts.join(",\n    ")
    )
}

/// Indexes on every foreign-key column (lists are filtered by them).
pub fn index_ddl(schema: &str, def: &TableDef) -> Vec<String> {
    def.columns
        .iter()
        .filter(|c| c.ddl.contains("REFERENCES") && !c.ddl.contains("UNIQUE"))
        .map(|c| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {}.{} ({})",
                quote_ident(&format!("idx_{}_{}", def.name, c.name)),
                quote_ident(schema),
                quote_ident(def.name),
                quote_ident(c.name)
            )
        })
        .collect()
}

/// Trigger function that NOTIFYs row changes as `{"table", "type", "record", "old_record"}`.
/// Records carry only the `REALTIME_KEYS` columns present on the row, keeping payloads far
/// below the NOTIFY size limit whatever the size of the row.
pub fn notify_function_ddl(schema: &str) -> String {
    let keys = REALTIME_KEYS
        .iter()
        .map(|k| format!("'{}'", k))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"
        CREATE OR REPLACE FUNCTION {schema}.daycare_row_change() RETURNS trigger AS $$
        BEGIN
            PERFORM pg_notify('{channel}', json_build_object(
                'table', TG_TABLE_NAME,
                'type', TG_OP,
                'record', CASE WHEN TG_OP = 'DELETE' THEN NULL ELSE
                    (SELECT jsonb_object_agg(key, value) FROM jsonb_each(to_jsonb(NEW)) WHERE key IN ({keys})) END,
                'old_record', CASE WHEN TG_OP = 'INSERT' THEN NULL ELSE
                    (SELECT jsonb_object_agg(key, value) FROM jsonb_each(to_jsonb(OLD)) WHERE key IN ({keys})) END
            )::text);
            RETURN NULL;
        END;
        $$ LANGUAGE plpgsql
        "#,
        schema = quote_ident(schema),
        channel = PG_CHANNEL,
        keys = keys
    )
}

/// Create `schema`, every application table with its indexes, and realtime triggers. Idempotent.
pub async fn ensure_tables(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))
        .execute(pool)
        .await?;

    for def in TABLES {
        sqlx::query(&table_ddl(schema, def)).execute(pool).await?;
        for ddl in index_ddl(schema, def) {
            sqlx::query(&ddl).execute(pool).await?;
        }
    }

    sqlx::query(&notify_function_ddl(schema)).execute(pool).await?;
    for def in TABLES.iter().filter(|t| t.realtime) {
        let trigger = quote_ident(&format!("{}_realtime", def.name));
        let table = format!("{}.{}", quote_ident(schema), quote_ident(def.name));
        sqlx::query(&format!("DROP TRIGGER IF EXISTS {} ON {}", trigger, table))
            .execute(pool)
            .await?;
        sqlx::query(&format!(
            "CREATE TRIGGER {} AFTER INSERT OR UPDATE OR DELETE ON {} FOR EACH ROW EXECUTE FUNCTION {}.daycare_row_change()",
            trigger,
            table,
            quote_ident(schema)
        ))
        .execute(pool)
        .await?;
    }
    tracing::info!(schema = %schema, tables = TABLES.len(), "tables ensured");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "database created");
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url.rfind('/').ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))? + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres", base);
    Ok((admin_url, db_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn table_ddl_qualifies_references() {
        let ddl = table_ddl("care", schema::table(schema::CHILDREN).unwrap());
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"care\".\"children\""));
        assert!(ddl.contains("\"classroom_id\" UUID REFERENCES \"care\".classrooms(id) ON DELETE SET NULL"));
        assert!(ddl.contains("\"is_active\" BOOLEAN NOT NULL DEFAULT TRUE"));
    }

    #[test]
    fn table_constraints_are_appended() {
        let ddl = table_ddl("public", schema::table(schema::CHILD_PARENTS).unwrap());
        assert!(ddl.contains("UNIQUE (child_id, parent_id)"));
    }

    #[test]
    fn indexes_cover_foreign_keys() {
        let idx = index_ddl("public", schema::table(schema::MEAL_LOGS).unwrap());
        assert!(idx.iter().any(|s| s.contains("idx_meal_logs_child_id")));
        assert!(idx.iter().any(|s| s.contains("idx_meal_logs_logged_by")));
    }

    #[test]
    fn change_payload_carries_key_columns_only() {
        let ddl = notify_function_ddl("care");
        assert!(!ddl.contains("row_to_json"));
        assert!(ddl.contains("to_jsonb(NEW)"));
        assert!(ddl.contains("'recipient_id'"));
        assert!(ddl.contains("'user_id'"));
    }

    #[test]
    fn admin_url_points_at_postgres() {
        let (admin, db) = parse_db_name_from_url("postgres://u:p@h:5432/daycare?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@h:5432/postgres");
        assert_eq!(db, "daycare");
    }
}
