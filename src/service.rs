//! Per-request orchestration of repository calls.
//!
//! Maps every repository outcome onto one of success, not-found or
//! internal-error envelopes. Storage errors are logged here and never
//! echoed to the client.

use axum::http::StatusCode;
use tracing::{error, info};

use crate::models::{Measurements, NewReading, Reading};
use crate::repository::{ReadingRepository, RepositoryError};
use crate::response::ApiResponse;
use crate::sensors::SensorSchema;

// ---

/// Service bound to one sensor schema for the duration of a request.
pub struct ReadingService<'a, R> {
    repo: &'a R,
    schema: &'static SensorSchema,
}

fn id_not_found<T>(id: i64) -> ApiResponse<T> {
    ApiResponse::not_found(format!("Tidak menemukan data sensor dengan id : {id}"))
}

fn token_not_found<T>(device_token: &str) -> ApiResponse<T> {
    ApiResponse::not_found(format!(
        "Tidak menemukan data sensor dengan token : {device_token}"
    ))
}

impl<'a, R: ReadingRepository> ReadingService<'a, R> {
    // ---
    pub fn new(repo: &'a R, schema: &'static SensorSchema) -> Self {
        Self { repo, schema }
    }

    /// Persist unconditionally; the stored record is returned as-is.
    pub async fn create(&self, reading: NewReading) -> ApiResponse<Reading> {
        // ---
        match self.repo.create(self.schema, &reading).await {
            Ok(stored) => {
                info!(
                    "{}: created reading {} for device {}",
                    self.schema.name, stored.id, stored.device_token
                );
                ApiResponse::created("Berhasil membuat data sensor baru", stored)
            }
            Err(e) => {
                error!("{}: failed to create reading: {}", self.schema.name, e);
                ApiResponse::internal_error("Gagal membuat data sensor baru")
            }
        }
    }

    /// Overwrite measurements of an existing reading.
    pub async fn update(&self, id: i64, measurements: Measurements) -> ApiResponse<()> {
        // ---
        if let Some(rejection) = self.ensure_exists(id).await {
            return rejection;
        }

        match self.repo.update(self.schema, id, &measurements).await {
            Ok(()) => {
                info!("{}: updated reading {}", self.schema.name, id);
                ApiResponse::empty(StatusCode::OK, "Berhasil mengubah data sensor")
            }
            Err(RepositoryError::NotFound) => {
                info!("{}: reading {} vanished before update", self.schema.name, id);
                id_not_found(id)
            }
            Err(e) => {
                error!("{}: failed to update reading {}: {}", self.schema.name, id, e);
                ApiResponse::internal_error(format!("Gagal mengubah data sensor dengan id : {id}"))
            }
        }
    }

    pub async fn delete(&self, id: i64) -> ApiResponse<()> {
        // ---
        if let Some(rejection) = self.ensure_exists(id).await {
            return rejection;
        }

        match self.repo.delete(self.schema, id).await {
            Ok(()) => {
                info!("{}: deleted reading {}", self.schema.name, id);
                ApiResponse::empty(StatusCode::OK, "Data sensor berhasil dihapus")
            }
            Err(RepositoryError::NotFound) => {
                info!("{}: reading {} vanished before delete", self.schema.name, id);
                id_not_found(id)
            }
            Err(e) => {
                error!("{}: failed to delete reading {}: {}", self.schema.name, id, e);
                ApiResponse::internal_error(format!(
                    "Gagal menghapus data sensor dengan id : {id}"
                ))
            }
        }
    }

    pub async fn get_all(&self) -> ApiResponse<Vec<Reading>> {
        // ---
        match self.repo.find_all(self.schema).await {
            Ok(rows) => {
                info!("{}: fetched {} readings", self.schema.name, rows.len());
                let rows = rows.into_iter().map(Reading::formatted).collect();
                ApiResponse::ok("Berhasil mengambil semua data sensor", rows)
            }
            Err(e) => {
                error!("{}: failed to fetch all readings: {}", self.schema.name, e);
                ApiResponse::internal_error("Gagal mengambil seluruh data sensor")
            }
        }
    }

    pub async fn get_by_id(&self, id: i64) -> ApiResponse<Reading> {
        // ---
        match self.repo.find_by_id(self.schema, id).await {
            Ok(row) => {
                info!("{}: fetched reading {}", self.schema.name, id);
                ApiResponse::ok(
                    format!("Berhasil mengambil data sensor dengan id : {id}"),
                    row.formatted(),
                )
            }
            Err(RepositoryError::NotFound) => {
                info!("{}: no reading with id {}", self.schema.name, id);
                id_not_found(id)
            }
            Err(e) => {
                error!("{}: failed to fetch reading {}: {}", self.schema.name, id, e);
                ApiResponse::internal_error(format!(
                    "Gagal mengambil data sensor dengan id : {id}"
                ))
            }
        }
    }

    pub async fn get_by_token(&self, device_token: &str) -> ApiResponse<Vec<Reading>> {
        // ---
        match self.repo.find_by_token(self.schema, device_token).await {
            Ok(rows) if rows.is_empty() => {
                info!("{}: no readings for token {}", self.schema.name, device_token);
                token_not_found(device_token)
            }
            Ok(rows) => {
                info!(
                    "{}: fetched {} readings for token {}",
                    self.schema.name,
                    rows.len(),
                    device_token
                );
                let rows = rows.into_iter().map(Reading::formatted).collect();
                ApiResponse::ok(
                    format!("Berhasil mengambil data sensor dengan token : {device_token}"),
                    rows,
                )
            }
            Err(e) => {
                error!(
                    "{}: failed to fetch readings for token {}: {}",
                    self.schema.name, device_token, e
                );
                ApiResponse::internal_error(format!(
                    "Gagal mengambil data sensor dengan token : {device_token}"
                ))
            }
        }
    }

    /// Most recent reading for a token.
    pub async fn get_latest_by_token(&self, device_token: &str) -> ApiResponse<Reading> {
        // ---
        match self.repo.find_latest_by_token(self.schema, device_token).await {
            Ok(row) => {
                info!(
                    "{}: fetched latest reading {} for token {}",
                    self.schema.name, row.id, device_token
                );
                ApiResponse::ok(
                    format!("Berhasil mengambil data sensor dengan token : {device_token}"),
                    row.formatted(),
                )
            }
            Err(RepositoryError::NotFound) => {
                info!("{}: no readings for token {}", self.schema.name, device_token);
                token_not_found(device_token)
            }
            Err(e) => {
                error!(
                    "{}: failed to fetch latest reading for token {}: {}",
                    self.schema.name, device_token, e
                );
                ApiResponse::internal_error(format!(
                    "Gagal mengambil data sensor dengan token : {device_token}"
                ))
            }
        }
    }

    /// `None` when reading `id` exists, otherwise the response to return.
    async fn ensure_exists(&self, id: i64) -> Option<ApiResponse<()>> {
        // ---
        match self.repo.find_by_id(self.schema, id).await {
            Ok(_) => None,
            Err(RepositoryError::NotFound) => {
                info!("{}: no reading with id {}", self.schema.name, id);
                Some(id_not_found(id))
            }
            Err(e) => {
                error!("{}: failed to look up reading {}: {}", self.schema.name, id, e);
                Some(ApiResponse::internal_error(format!(
                    "Gagal mengambil data sensor dengan id : {id}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::FieldValue;
    use crate::repository::testing::{FailingRepository, MemoryRepository};
    use crate::sensors::{BEITIAN, BMP};

    fn bmp_reading(token: &str, tekanan: &str) -> NewReading {
        // ---
        NewReading {
            device_token: token.to_string(),
            measurements: vec![
                FieldValue::Text(tekanan.to_string()),
                FieldValue::Text("2".into()),
                FieldValue::Text("3.9".into()),
            ],
        }
    }

    #[tokio::test]
    async fn test_create_then_get_formats_on_read() {
        // ---
        let repo = MemoryRepository::default();
        let service = ReadingService::new(&repo, &BMP);

        let created = service.create(bmp_reading("dev1", "12.3")).await;
        assert_eq!(created.status, StatusCode::CREATED);
        let stored = created.data.unwrap();
        assert_eq!(stored.get("tekanan_udara"), Some(&FieldValue::Text("12.3".into())));

        let fetched = service.get_by_id(stored.id).await;
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(
            fetched.data.unwrap().get("tekanan_udara"),
            Some(&FieldValue::Text("12.30".into()))
        );
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_id() {
        // ---
        let repo = MemoryRepository::default();
        let service = ReadingService::new(&repo, &BMP);
        service.create(bmp_reading("dev1", "1")).await;

        let updated = service.update(99, bmp_reading("x", "5").measurements).await;
        assert_eq!(updated.status, StatusCode::NOT_FOUND);
        assert_eq!(updated.message, "Tidak menemukan data sensor dengan id : 99");

        let deleted = service.delete(99).await;
        assert_eq!(deleted.status, StatusCode::NOT_FOUND);

        // the existing record is untouched
        let row = service.get_by_id(1).await.data.unwrap();
        assert_eq!(row.get("tekanan_udara"), Some(&FieldValue::Text("1.00".into())));
    }

    #[tokio::test]
    async fn test_update_keeps_token() {
        // ---
        let repo = MemoryRepository::default();
        let service = ReadingService::new(&repo, &BMP);
        service.create(bmp_reading("dev1", "1")).await;

        let updated = service.update(1, bmp_reading("ignored", "7.5").measurements).await;
        assert_eq!(updated.status, StatusCode::OK);
        assert!(updated.data.is_none());

        let row = service.get_by_id(1).await.data.unwrap();
        assert_eq!(row.device_token, "dev1");
        assert_eq!(row.get("tekanan_udara"), Some(&FieldValue::Text("7.50".into())));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        // ---
        let repo = MemoryRepository::default();
        let service = ReadingService::new(&repo, &BMP);
        service.create(bmp_reading("dev1", "1")).await;

        assert_eq!(service.delete(1).await.status, StatusCode::OK);
        assert_eq!(service.delete(1).await.status, StatusCode::NOT_FOUND);
        assert_eq!(service.get_by_id(1).await.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_by_token_exact_match() {
        // ---
        let repo = MemoryRepository::default();
        let service = ReadingService::new(&repo, &BMP);
        service.create(bmp_reading("dev1", "1")).await;
        service.create(bmp_reading("dev2", "2")).await;
        service.create(bmp_reading("dev1", "3")).await;
        service.create(bmp_reading("DEV1", "4")).await;

        let found = service.get_by_token("dev1").await;
        assert_eq!(found.status, StatusCode::OK);
        let rows = found.data.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.device_token == "dev1"));

        let missing = service.get_by_token("nobody").await;
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert!(missing.data.is_none());
    }

    #[tokio::test]
    async fn test_get_latest_by_token() {
        // ---
        let repo = MemoryRepository::default();
        let service = ReadingService::new(&repo, &BEITIAN);
        for lat in ["-7.1", "-7.2", "-7.3"] {
            let reading = NewReading {
                device_token: "gps".into(),
                measurements: vec![
                    FieldValue::Text(lat.into()),
                    FieldValue::Text("112.7".into()),
                    FieldValue::Text("4".into()),
                ],
            };
            service.create(reading).await;
        }

        let latest = service.get_latest_by_token("gps").await;
        assert_eq!(latest.status, StatusCode::OK);
        let row = latest.data.unwrap();
        assert_eq!(row.id, 3);
        assert_eq!(row.get("latitude"), Some(&FieldValue::Text("-7.30".into())));

        assert_eq!(
            service.get_latest_by_token("other").await.status,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_storage_errors_map_to_500() {
        // ---
        let repo = FailingRepository;
        let service = ReadingService::new(&repo, &BMP);

        let created = service.create(bmp_reading("dev1", "1")).await;
        assert_eq!(created.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(created.message, "Gagal membuat data sensor baru");

        // lookup failure on update/delete is an internal error, not a 404
        assert_eq!(
            service.update(1, vec![]).await.status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(service.delete(1).await.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(service.get_all().await.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(service.get_by_id(1).await.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            service.get_by_token("dev1").await.status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_unparseable_stored_value_returned_verbatim() {
        // ---
        let repo = MemoryRepository::default();
        let service = ReadingService::new(&repo, &BMP);
        service.create(bmp_reading("dev1", "1")).await;
        repo.corrupt(&BMP, 1, 0, "error");

        let row = service.get_by_id(1).await.data.unwrap();
        assert_eq!(row.get("tekanan_udara"), Some(&FieldValue::Text("error".into())));
        assert_eq!(row.get("battery"), Some(&FieldValue::Text("3.90".into())));
    }
}
