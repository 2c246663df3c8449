use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::domain::Address;
use crate::errors::ApiError;
use crate::handlers::extract::{ApiPath, ValidatedJson};
use crate::middleware::Inject;
use crate::services::AddressService;

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AddressRequest {
    pub id: Option<i64>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub street: String,
    #[validate(length(min = 1, max = 20))]
    pub number: String,
    #[validate(length(max = 20))]
    pub floor: Option<String>,
    #[validate(length(max = 20))]
    pub apartment: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub province: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[validate(length(min = 1, max = 32))]
    pub latitude: String,
    #[validate(length(min = 1, max = 32))]
    pub longitude: String,
    #[validate(range(min = 1))]
    pub observer_user_id: i64,
}

impl AddressRequest {
    fn into_address(self, id: i64) -> Result<Address, ApiError> {
        check_coordinate("latitude", &self.latitude, 90.0)?;
        check_coordinate("longitude", &self.longitude, 180.0)?;

        Ok(Address {
            id,
            name: self.name,
            street: self.street,
            number: self.number,
            floor: self.floor,
            apartment: self.apartment,
            postal_code: self.postal_code,
            city: self.city,
            province: self.province,
            country: self.country,
            latitude: self.latitude,
            longitude: self.longitude,
            observer_user_id: self.observer_user_id,
        })
    }
}

/// Coordinates travel as decimal strings; they must still be numbers in range.
fn check_coordinate(field: &str, value: &str, limit: f64) -> Result<(), ApiError> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() <= limit => Ok(()),
        _ => Err(ApiError::bad_request(format!(
            "{} must be a decimal number between -{} and {}",
            field, limit, limit
        ))),
    }
}

/// Get an address by id
pub async fn get_address(
    Inject(addresses): Inject<AddressService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Address>, ApiError> {
    Ok(Json(addresses.get(id).await?))
}

/// Create an address. The id is assigned by the store.
pub async fn create_address(
    Inject(addresses): Inject<AddressService>,
    ValidatedJson(request): ValidatedJson<AddressRequest>,
) -> Result<Json<Address>, ApiError> {
    if request.id.is_some() {
        return Err(ApiError::bad_request("id must not be set when creating an address"));
    }

    let address = request.into_address(0)?;
    Ok(Json(addresses.save(address).await?))
}

/// Update an address identified by the id in the body
pub async fn update_address(
    Inject(addresses): Inject<AddressService>,
    ValidatedJson(request): ValidatedJson<AddressRequest>,
) -> Result<Json<Address>, ApiError> {
    let id = request
        .id
        .ok_or_else(|| ApiError::bad_request("id is required when updating an address"))?;

    let address = request.into_address(id)?;
    Ok(Json(addresses.update(address).await?))
}

pub async fn delete_address(
    Inject(addresses): Inject<AddressService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    addresses.delete(id).await?;
    Ok(Json(json!({ "ok": true, "id": id })))
}
