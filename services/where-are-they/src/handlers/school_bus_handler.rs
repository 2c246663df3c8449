use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::domain::SchoolBus;
use crate::errors::ApiError;
use crate::handlers::extract::{ApiPath, ValidatedJson};
use crate::middleware::Inject;
use crate::services::SchoolBusService;

/// Bus ids are chosen by the client, so `id` is required on create. On
/// update the path carries the id and a body id, if present, must match it.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SchoolBusRequest {
    #[validate(length(min = 1, max = 64))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub license_plate: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    #[validate(length(min = 1, max = 100))]
    pub brand: String,
    #[validate(length(min = 1, max = 100))]
    pub license: String,
    #[validate(range(min = 1))]
    pub observed_user_id: i64,
}

impl SchoolBusRequest {
    fn into_school_bus(self, id: String) -> SchoolBus {
        SchoolBus {
            id,
            license_plate: self.license_plate,
            model: self.model,
            brand: self.brand,
            license: self.license,
            observed_user_id: self.observed_user_id,
        }
    }
}

pub async fn get_school_bus(
    Inject(buses): Inject<SchoolBusService>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<SchoolBus>, ApiError> {
    Ok(Json(buses.get(&id).await?))
}

pub async fn create_school_bus(
    Inject(buses): Inject<SchoolBusService>,
    ValidatedJson(mut request): ValidatedJson<SchoolBusRequest>,
) -> Result<Json<SchoolBus>, ApiError> {
    let id = request
        .id
        .take()
        .ok_or_else(|| ApiError::bad_request("id is required when creating a school bus"))?;

    Ok(Json(buses.save(request.into_school_bus(id)).await?))
}

pub async fn update_school_bus(
    Inject(buses): Inject<SchoolBusService>,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(mut request): ValidatedJson<SchoolBusRequest>,
) -> Result<Json<SchoolBus>, ApiError> {
    if let Some(body_id) = request.id.take() {
        if body_id != id {
            return Err(ApiError::bad_request(format!(
                "body id {} does not match path id {}",
                body_id, id
            )));
        }
    }

    Ok(Json(buses.update(request.into_school_bus(id)).await?))
}

pub async fn delete_school_bus(
    Inject(buses): Inject<SchoolBusService>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>, ApiError> {
    buses.delete(&id).await?;
    Ok(Json(json!({ "ok": true, "id": id })))
}
