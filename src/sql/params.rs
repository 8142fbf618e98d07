//! Convert serde_json::Value to values sqlx can bind.
//!
//! Every scalar goes over the wire as text and the statement casts it to the column type
//! (`$1::uuid`, `$2::boolean`, ...), so one bind shape covers every column.

use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Text(Option<String>),
    TextArray(Vec<String>),
}

impl PgBindValue {
    pub fn from_json(v: &Value) -> Self {
        PgBindValue::Text(json_to_text(v))
    }

    pub fn array_from_json(vs: &[Value]) -> Self {
        PgBindValue::TextArray(vs.iter().filter_map(json_to_text).collect())
    }

    pub fn bind<'q>(self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        match self {
            PgBindValue::Text(s) => query.bind(s),
            PgBindValue::TextArray(v) => query.bind(v),
        }
    }
}

fn json_to_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_become_text() {
        assert_eq!(PgBindValue::from_json(&json!(true)), PgBindValue::Text(Some("true".into())));
        assert_eq!(PgBindValue::from_json(&json!(12)), PgBindValue::Text(Some("12".into())));
        assert_eq!(PgBindValue::from_json(&Value::Null), PgBindValue::Text(None));
        assert_eq!(
            PgBindValue::from_json(&json!(["rice", "peas"])),
            PgBindValue::Text(Some(r#"["rice","peas"]"#.into()))
        );
    }

    #[test]
    fn arrays_drop_nulls() {
        assert_eq!(
            PgBindValue::array_from_json(&[json!("a"), Value::Null, json!("b")]),
            PgBindValue::TextArray(vec!["a".into(), "b".into()])
        );
    }
}
