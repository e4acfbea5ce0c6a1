use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dbadmin_core::{DbAdminError, Result, Row};
use serde_json::{Number, Value};
use sqlx::mysql::{MySql, MySqlRow};
use sqlx::{Column, Decode, Row as _, TypeInfo, ValueRef};

/// Convert a text-protocol row into a JSON object keyed by column name.
pub fn row_to_json(row: &MySqlRow) -> Result<Row> {
    let mut out = Row::new();
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row
            .try_get_raw(i)
            .map_err(|e| DbAdminError::Query(e.to_string()))?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let bytes = <&[u8] as Decode<'_, MySql>>::decode(raw)
                .map_err(|e| DbAdminError::Query(format!("column {}: {e}", column.name())))?;
            column_to_json(column.type_info().name(), bytes)
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

/// Interpret the textual encoding of a non-NULL value of the given MySQL type.
pub(crate) fn column_to_json(type_name: &str, bytes: &[u8]) -> Value {
    let base = type_name.trim_end_matches(" UNSIGNED");
    if is_binary(base) {
        return Value::String(BASE64.encode(bytes));
    }

    let text = String::from_utf8_lossy(bytes);
    match base {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            integer(&text).unwrap_or_else(|| Value::String(text.into_owned()))
        }
        "FLOAT" | "DOUBLE" => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.into_owned())),
        "JSON" => serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.into_owned())),
        // DECIMAL stays textual to keep its exact digits
        _ => Value::String(text.into_owned()),
    }
}

fn integer(text: &str) -> Option<Value> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::from(n));
    }
    text.parse::<u64>().ok().map(Value::from)
}

fn is_binary(type_name: &str) -> bool {
    matches!(
        type_name,
        "BINARY"
            | "VARBINARY"
            | "TINYBLOB"
            | "BLOB"
            | "MEDIUMBLOB"
            | "LONGBLOB"
            | "BIT"
            | "GEOMETRY"
    )
}
