//! Generic CRUD over sensor tables.
//!
//! Queries are assembled from the static [`SensorSchema`] descriptors; table
//! and column names never come from request input.

use std::future::Future;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::{FieldValue, Measurements, NewReading, Reading};
use crate::sensors::{FieldKind, SensorSchema};

// ---

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage operations shared by every sensor vertical.
pub trait ReadingRepository: Clone + Send + Sync + 'static {
    // ---
    /// Insert a reading and return it with its generated id.
    fn create(
        &self,
        schema: &'static SensorSchema,
        reading: &NewReading,
    ) -> impl Future<Output = Result<Reading, RepositoryError>> + Send;

    /// Overwrite every measurement of reading `id`; the device token is kept.
    fn update(
        &self,
        schema: &'static SensorSchema,
        id: i64,
        measurements: &Measurements,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn delete(
        &self,
        schema: &'static SensorSchema,
        id: i64,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn find_by_id(
        &self,
        schema: &'static SensorSchema,
        id: i64,
    ) -> impl Future<Output = Result<Reading, RepositoryError>> + Send;

    /// All readings whose token matches exactly, oldest first.
    fn find_by_token(
        &self,
        schema: &'static SensorSchema,
        device_token: &str,
    ) -> impl Future<Output = Result<Vec<Reading>, RepositoryError>> + Send;

    fn find_all(
        &self,
        schema: &'static SensorSchema,
    ) -> impl Future<Output = Result<Vec<Reading>, RepositoryError>> + Send;

    /// Most recently created reading for a token.
    ///
    /// Only meaningful for schemas with `tracks_created_at`.
    fn find_latest_by_token(
        &self,
        schema: &'static SensorSchema,
        device_token: &str,
    ) -> impl Future<Output = Result<Reading, RepositoryError>> + Send;
}

/// PostgreSQL-backed repository.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn select_columns(schema: &SensorSchema) -> String {
    // ---
    let created_at = if schema.tracks_created_at {
        ", created_at"
    } else {
        ""
    };
    format!("id, device_token, {}{}", schema.column_list(), created_at)
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    value: &FieldValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    // ---
    match value {
        FieldValue::Text(s) => query.bind(s.clone()),
        FieldValue::Integer(i) => query.bind(*i),
    }
}

fn reading_from_row(schema: &'static SensorSchema, row: &PgRow) -> Result<Reading, sqlx::Error> {
    // ---
    let measurements = schema
        .fields
        .iter()
        .map(|spec| match spec.kind {
            FieldKind::Decimal => row.try_get::<String, _>(spec.column).map(FieldValue::Text),
            FieldKind::Integer => row.try_get::<i32, _>(spec.column).map(FieldValue::Integer),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let created_at = if schema.tracks_created_at {
        Some(row.try_get("created_at")?)
    } else {
        None
    };

    Ok(Reading {
        schema,
        id: row.try_get("id")?,
        device_token: row.try_get("device_token")?,
        measurements,
        created_at,
    })
}

impl ReadingRepository for PgRepository {
    // ---
    async fn create(
        &self,
        schema: &'static SensorSchema,
        reading: &NewReading,
    ) -> Result<Reading, RepositoryError> {
        // ---
        let placeholders = (1..=schema.fields.len() + 1)
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} (device_token, {}) VALUES ({}) RETURNING {}",
            schema.table,
            schema.column_list(),
            placeholders,
            select_columns(schema)
        );

        let mut query = sqlx::query(&sql).bind(reading.device_token.clone());
        for value in &reading.measurements {
            query = bind_value(query, value);
        }

        let row = query.fetch_one(&self.pool).await?;
        Ok(reading_from_row(schema, &row)?)
    }

    async fn update(
        &self,
        schema: &'static SensorSchema,
        id: i64,
        measurements: &Measurements,
    ) -> Result<(), RepositoryError> {
        // ---
        let assignments = schema
            .fields
            .iter()
            .enumerate()
            .map(|(i, spec)| format!("{} = ${}", spec.column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ${}",
            schema.table,
            assignments,
            schema.fields.len() + 1
        );

        let mut query = sqlx::query(&sql);
        for value in measurements {
            query = bind_value(query, value);
        }

        let result = query.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, schema: &'static SensorSchema, id: i64) -> Result<(), RepositoryError> {
        // ---
        let sql = format!("DELETE FROM {} WHERE id = $1", schema.table);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        schema: &'static SensorSchema,
        id: i64,
    ) -> Result<Reading, RepositoryError> {
        // ---
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            select_columns(schema),
            schema.table
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(reading_from_row(schema, &row)?)
    }

    async fn find_by_token(
        &self,
        schema: &'static SensorSchema,
        device_token: &str,
    ) -> Result<Vec<Reading>, RepositoryError> {
        // ---
        let sql = format!(
            "SELECT {} FROM {} WHERE device_token = $1 ORDER BY id",
            select_columns(schema),
            schema.table
        );
        let rows = sqlx::query(&sql)
            .bind(device_token)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| reading_from_row(schema, row).map_err(RepositoryError::from))
            .collect()
    }

    async fn find_all(
        &self,
        schema: &'static SensorSchema,
    ) -> Result<Vec<Reading>, RepositoryError> {
        // ---
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id",
            select_columns(schema),
            schema.table
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| reading_from_row(schema, row).map_err(RepositoryError::from))
            .collect()
    }

    async fn find_latest_by_token(
        &self,
        schema: &'static SensorSchema,
        device_token: &str,
    ) -> Result<Reading, RepositoryError> {
        // ---
        let sql = format!(
            "SELECT {} FROM {} WHERE device_token = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
            select_columns(schema),
            schema.table
        );
        let row = sqlx::query(&sql)
            .bind(device_token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(reading_from_row(schema, &row)?)
    }
}
