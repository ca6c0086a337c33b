//! Table Writer - replaces a SQLite table with the contents of a DataFrame

use crate::db::connection::Database;
use crate::error::{Result, WriteError};
use crate::ingestion::TableSink;
use polars::prelude::*;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, TransactionBehavior};
use tracing::debug;

/// Quote an identifier for use in SQLite DDL/DML.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Declared SQLite column type for a DataFrame dtype.
pub fn sql_type(dtype: &DataType) -> &'static str {
    if dtype.is_integer() || matches!(dtype, DataType::Boolean) {
        "INTEGER"
    } else if dtype.is_float() {
        "REAL"
    } else {
        "TEXT"
    }
}

fn to_sql_value(value: AnyValue<'_>) -> SqlValue {
    match value {
        AnyValue::Null => SqlValue::Null,
        AnyValue::Boolean(b) => SqlValue::Integer(b as i64),
        AnyValue::Int8(v) => SqlValue::Integer(v as i64),
        AnyValue::Int16(v) => SqlValue::Integer(v as i64),
        AnyValue::Int32(v) => SqlValue::Integer(v as i64),
        AnyValue::Int64(v) => SqlValue::Integer(v),
        AnyValue::UInt8(v) => SqlValue::Integer(v as i64),
        AnyValue::UInt16(v) => SqlValue::Integer(v as i64),
        AnyValue::UInt32(v) => SqlValue::Integer(v as i64),
        // u64 beyond i64::MAX does not fit an INTEGER column
        AnyValue::UInt64(v) => match i64::try_from(v) {
            Ok(v) => SqlValue::Integer(v),
            Err(_) => SqlValue::Text(v.to_string()),
        },
        AnyValue::Float32(v) => SqlValue::Real(v as f64),
        AnyValue::Float64(v) => SqlValue::Real(v),
        AnyValue::String(s) => SqlValue::Text(s.to_string()),
        AnyValue::StringOwned(s) => SqlValue::Text(s.to_string()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn create_table_sql(table_name: &str, batch: &DataFrame) -> String {
    let columns = batch
        .get_columns()
        .iter()
        .map(|s| format!("{} {}", quote_ident(s.name()), sql_type(s.dtype())))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", quote_ident(table_name), columns)
}

fn insert_sql(table_name: &str, batch: &DataFrame) -> String {
    let columns = batch
        .get_columns()
        .iter()
        .map(|s| quote_ident(s.name()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=batch.width())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table_name),
        columns,
        placeholders
    )
}

impl TableSink for Database {
    /// Drop and recreate `table_name`, then insert every row of `batch`, all in
    /// one immediate transaction. The connection goes back to the pool on every
    /// exit path; an uncommitted transaction rolls back when dropped.
    fn replace_table(
        &self,
        table_name: &str,
        batch: &DataFrame,
    ) -> std::result::Result<usize, WriteError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(table_name)))?;
        tx.execute_batch(&create_table_sql(table_name, batch))?;

        let columns = batch.get_columns();
        {
            let mut stmt = tx.prepare(&insert_sql(table_name, batch))?;
            let mut row = Vec::with_capacity(columns.len());
            for idx in 0..batch.height() {
                row.clear();
                for series in columns {
                    let value = series.get(idx).map_err(|e| {
                        WriteError::Failed(rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
                    })?;
                    row.push(to_sql_value(value));
                }
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }

        tx.commit()?;
        debug!("Wrote {} rows to {}", batch.height(), table_name);
        Ok(batch.height())
    }
}

impl Database {
    /// Column names of `table_name` in declaration order.
    pub fn table_columns(&self, table_name: &str) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table_name)))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    pub fn row_count(&self, table_name: &str) -> Result<i64> {
        let conn = self.connect()?;
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table_name)),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Names of all user tables, sorted.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ConnectionSettings;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_db(dir: &TempDir) -> Database {
        Database::new(dir.path().join("test.db"), ConnectionSettings::default())
    }

    #[test]
    fn test_replace_table_creates_columns_in_order() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        let batch = df!(
            "sku" => ["A-1", "B-2"],
            "qty" => [3i64, 7],
            "price" => [1.25, 9.5]
        )
        .unwrap();

        let rows = db.replace_table("products", &batch).unwrap();

        assert_eq!(rows, 2);
        assert_eq!(db.table_columns("products").unwrap(), vec!["sku", "qty", "price"]);
        assert_eq!(db.row_count("products").unwrap(), 2);

        let conn = db.connect().unwrap();
        let (sku, qty, price): (String, i64, f64) = conn
            .query_row("SELECT sku, qty, price FROM products WHERE qty = 7", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .unwrap();
        assert_eq!(sku, "B-2");
        assert_eq!(qty, 7);
        assert_eq!(price, 9.5);
    }

    #[test]
    fn test_replace_table_drops_previous_schema() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        let old = df!("a" => [1i64, 2, 3], "b" => ["x", "y", "z"]).unwrap();
        db.replace_table("t", &old).unwrap();

        let new = df!("c" => [10.0]).unwrap();
        db.replace_table("t", &new).unwrap();

        assert_eq!(db.table_columns("t").unwrap(), vec!["c"]);
        assert_eq!(db.row_count("t").unwrap(), 1);
    }

    #[test]
    fn test_nulls_are_written_as_null() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        let batch = df!("v" => [Some(1i64), None]).unwrap();

        db.replace_table("n", &batch).unwrap();

        let conn = db.connect().unwrap();
        let nulls: i64 = conn
            .query_row("SELECT COUNT(*) FROM n WHERE v IS NULL", [], |row| row.get(0))
            .unwrap();
        assert_eq!(nulls, 1);
    }

    #[test]
    fn test_held_lock_is_classified_as_locked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let settings = ConnectionSettings {
            busy_timeout: Duration::from_millis(50),
            ..ConnectionSettings::default()
        };
        let db = Database::new(&path, settings);

        let holder = rusqlite::Connection::open(&path).unwrap();
        holder.execute_batch("BEGIN EXCLUSIVE").unwrap();

        let batch = df!("a" => [1i64]).unwrap();
        let err = db.replace_table("t", &batch).unwrap_err();
        assert!(err.is_locked(), "expected lock error, got {err:?}");

        holder.execute_batch("ROLLBACK").unwrap();
        assert_eq!(db.replace_table("t", &batch).unwrap(), 1);
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_sql_type_mapping() {
        assert_eq!(sql_type(&DataType::Int64), "INTEGER");
        assert_eq!(sql_type(&DataType::Boolean), "INTEGER");
        assert_eq!(sql_type(&DataType::Float64), "REAL");
        assert_eq!(sql_type(&DataType::String), "TEXT");
    }
}
