//! Database schema management for `iot-sensor-api`.
//!
//! Ensures every sensor table and its token index exist before serving
//! requests. Applied once on startup from `main.rs`.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::sensors::{FieldKind, SensorSchema, SENSORS};

// ---

/// `CREATE TABLE` statement for one sensor descriptor.
pub fn create_table_sql(schema: &SensorSchema) -> String {
    // ---
    let mut columns = vec![
        "id           BIGSERIAL PRIMARY KEY".to_string(),
        "device_token TEXT NOT NULL".to_string(),
    ];
    columns.extend(schema.fields.iter().map(|f| {
        let sql_type = match f.kind {
            FieldKind::Decimal => "TEXT",
            FieldKind::Integer => "INTEGER",
        };
        format!("{} {} NOT NULL", f.column, sql_type)
    }));
    if schema.tracks_created_at {
        columns.push("created_at   TIMESTAMPTZ NOT NULL DEFAULT now()".to_string());
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        schema.table,
        columns.join(",\n    ")
    )
}

/// Index backing the by-token and latest-by-token lookups.
pub fn create_index_sql(schema: &SensorSchema) -> String {
    // ---
    format!(
        "CREATE INDEX IF NOT EXISTS idx_{table}_device_token ON {table} (device_token)",
        table = schema.table
    )
}

/// Create the sensor tables (idempotent).
///
/// Safe to call on every startup; no-op if objects already exist. Runs in a
/// single transaction so a failure leaves no partial schema behind.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    for schema in SENSORS {
        sqlx::query(&create_table_sql(schema))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("creating table {}", schema.table))?;

        sqlx::query(&create_index_sql(schema))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("creating token index on {}", schema.table))?;

        tracing::debug!("Schema ready for sensor {}", schema.name);
    }

    tx.commit().await?;
    Ok(())
}
