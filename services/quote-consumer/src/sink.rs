//! Storage Sink: append-only writer into the `cryptoprices` table.
//!
//! The table starts from the standard quote layout and auto-extends:
//! before each write, columns the table has not seen yet are added with
//! an explicit schema-diff step (`ALTER TABLE .. ADD COLUMN IF NOT
//! EXISTS`). Columns are nullable and only ever added, never changed.
//!
//! Writes are at-least-once; a redelivered event appends a duplicate
//! row sharing coin + timestamp. That duplication is accepted instead
//! of building dedup infrastructure for this ingestion volume.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};
use types::row::{ColumnValue, QuoteRow};

/// Sink errors. Startup (connect/schema) errors are fatal for the
/// process; a per-record write error is fatal only for that record.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Destination for flattened rows.
#[async_trait]
pub trait RecordSink: Send {
    async fn write(&mut self, row: &QuoteRow) -> Result<(), SinkError>;
}

/// Columns every row produced by the flattening transform carries.
const BASE_COLUMNS: &[(&str, &str)] = &[
    ("coin", "TEXT"),
    ("price_usd", "DOUBLE PRECISION"),
    ("volume_24", "DOUBLE PRECISION"),
    ("market_cap", "DOUBLE PRECISION"),
    ("percent_change_24h", "DOUBLE PRECISION"),
    ("updated", "TEXT"),
    ("price_sek", "DOUBLE PRECISION"),
    ("price_nok", "DOUBLE PRECISION"),
    ("price_dkk", "DOUBLE PRECISION"),
    ("price_eur", "DOUBLE PRECISION"),
    ("timestamp", "TIMESTAMPTZ"),
];

/// CREATE TABLE for the base layout; all columns nullable.
fn create_table_sql(table: &str) -> String {
    let columns: Vec<String> = BASE_COLUMNS
        .iter()
        .map(|(name, ty)| format!("\"{name}\" {ty}"))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" ({})",
        columns.join(", ")
    )
}

/// Schema-diff step: one ALTER per unseen, non-null column.
///
/// Null-valued unseen columns are deferred until a value arrives, so
/// the column is created with the type of its data rather than a
/// guess.
fn alter_statements(table: &str, row: &QuoteRow, known: &HashSet<String>) -> Vec<String> {
    row.iter()
        .filter(|(name, value)| !value.is_null() && !known.contains(*name))
        .map(|(name, value)| {
            format!(
                "ALTER TABLE \"{table}\" ADD COLUMN IF NOT EXISTS \"{name}\" {}",
                value.sql_type()
            )
        })
        .collect()
}

/// INSERT listing exactly the row's non-null columns, with the values
/// to bind in placeholder order. Omitted columns default to NULL.
fn insert_statement(table: &str, row: &QuoteRow) -> (String, Vec<ColumnValue>) {
    let mut names = Vec::new();
    let mut values = Vec::new();
    for (name, value) in row.iter() {
        if !value.is_null() {
            names.push(format!("\"{name}\""));
            values.push(value.clone());
        }
    }

    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("${i}")).collect();
    let sql = format!(
        "INSERT INTO \"{table}\" ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    );
    (sql, values)
}

/// Postgres-backed [`RecordSink`].
pub struct PostgresSink {
    pool: PgPool,
    table: String,
    known_columns: HashSet<String>,
}

impl PostgresSink {
    /// Connect, create the base table if absent, and load the current
    /// column set. Failure here is a fatal startup error.
    pub async fn connect(database_url: &str, table: &str) -> Result<Self, SinkError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::query(&create_table_sql(table)).execute(&pool).await?;

        let columns: Vec<(String,)> = sqlx::query_as(
            "SELECT column_name FROM information_schema.columns WHERE table_name = $1",
        )
        .bind(table)
        .fetch_all(&pool)
        .await?;
        let known_columns: HashSet<String> = columns.into_iter().map(|(name,)| name).collect();

        info!(table, columns = known_columns.len(), "postgres sink ready");
        Ok(Self {
            pool,
            table: table.to_string(),
            known_columns,
        })
    }

    /// Add any columns this row carries that the table lacks.
    async fn ensure_columns(&mut self, row: &QuoteRow) -> Result<(), SinkError> {
        for statement in alter_statements(&self.table, row, &self.known_columns) {
            debug!(%statement, "extending sink schema");
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        for (name, value) in row.iter() {
            if !value.is_null() {
                self.known_columns.insert(name.to_string());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSink for PostgresSink {
    async fn write(&mut self, row: &QuoteRow) -> Result<(), SinkError> {
        self.ensure_columns(row).await?;

        let (sql, values) = insert_statement(&self.table, row);
        let mut query = sqlx::query(&sql);
        for value in values {
            query = match value {
                ColumnValue::Text(text) => query.bind(text),
                ColumnValue::Double(double) => query.bind(double),
                ColumnValue::Timestamp(ts) => query.bind(ts),
                ColumnValue::Null => query.bind(Option::<String>::None),
            };
        }
        query.execute(&self.pool).await?;
        Ok(())
    }
}

/// In-memory [`RecordSink`] collecting rows, for tests and dry runs.
///
/// Cloning yields a handle over the same row store, so a test can keep
/// one handle while the subscriber owns the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    rows: std::sync::Arc<std::sync::Mutex<Vec<QuoteRow>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the rows written so far.
    pub fn rows(&self) -> Vec<QuoteRow> {
        self.rows.lock().expect("sink poisoned").clone()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write(&mut self, row: &QuoteRow) -> Result<(), SinkError> {
        self.rows.lock().expect("sink poisoned").push(row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_row() -> QuoteRow {
        let mut row = QuoteRow::new();
        row.set("coin", ColumnValue::Text("DOGE".to_string()));
        row.set("price_usd", ColumnValue::Double(0.5));
        row.set("market_cap", ColumnValue::Null);
        row.set("timestamp", ColumnValue::Timestamp(Utc::now()));
        row
    }

    #[test]
    fn create_table_covers_every_base_column() {
        let sql = create_table_sql("cryptoprices");
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"cryptoprices\""));
        for (name, _) in BASE_COLUMNS {
            assert!(sql.contains(&format!("\"{name}\"")), "{name} missing");
        }
    }

    #[test]
    fn alters_only_unseen_non_null_columns() {
        let known: HashSet<String> = ["coin", "timestamp"]
            .into_iter()
            .map(String::from)
            .collect();

        let statements = alter_statements("cryptoprices", &sample_row(), &known);

        // price_usd is unseen and non-null; market_cap is null, coin and
        // timestamp are known.
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0],
            "ALTER TABLE \"cryptoprices\" ADD COLUMN IF NOT EXISTS \"price_usd\" DOUBLE PRECISION"
        );
    }

    #[test]
    fn no_alters_when_all_columns_known() {
        let known: HashSet<String> = sample_row()
            .column_names()
            .map(String::from)
            .collect();
        assert!(alter_statements("cryptoprices", &sample_row(), &known).is_empty());
    }

    #[test]
    fn insert_lists_exactly_the_non_null_columns() {
        let (sql, values) = insert_statement("cryptoprices", &sample_row());

        assert_eq!(
            sql,
            "INSERT INTO \"cryptoprices\" (\"coin\", \"price_usd\", \"timestamp\") \
             VALUES ($1, $2, $3)"
        );
        assert_eq!(values.len(), 3);
        assert!(!sql.contains("market_cap"));
    }

    #[tokio::test]
    async fn memory_sink_collects_rows() {
        let mut sink = MemorySink::new();
        sink.write(&sample_row()).await.unwrap();
        sink.write(&sample_row()).await.unwrap();
        assert_eq!(sink.rows().len(), 2);
    }
}
