use axum::Json;
use chrono::NaiveTime;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::domain::Child;
use crate::errors::ApiError;
use crate::handlers::extract::{ApiPath, ValidatedJson};
use crate::middleware::Inject;
use crate::services::ChildService;

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ChildRequest {
    pub id: Option<i64>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 200))]
    pub school_name: String,
    pub school_start_time: NaiveTime,
    pub school_end_time: NaiveTime,
    #[validate(range(min = 1))]
    pub observer_user_id: i64,
}

impl ChildRequest {
    fn into_child(self, id: i64) -> Result<Child, ApiError> {
        if self.school_start_time >= self.school_end_time {
            return Err(ApiError::bad_request(
                "school_start_time must be earlier than school_end_time",
            ));
        }

        Ok(Child {
            id,
            name: self.name,
            last_name: self.last_name,
            school_name: self.school_name,
            school_start_time: self.school_start_time,
            school_end_time: self.school_end_time,
            observer_user_id: self.observer_user_id,
        })
    }
}

pub async fn get_child(
    Inject(children): Inject<ChildService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Child>, ApiError> {
    Ok(Json(children.get(id).await?))
}

pub async fn create_child(
    Inject(children): Inject<ChildService>,
    ValidatedJson(request): ValidatedJson<ChildRequest>,
) -> Result<Json<Child>, ApiError> {
    if request.id.is_some() {
        return Err(ApiError::bad_request("id must not be set when creating a child"));
    }

    let child = request.into_child(0)?;
    Ok(Json(children.save(child).await?))
}

pub async fn update_child(
    Inject(children): Inject<ChildService>,
    ValidatedJson(request): ValidatedJson<ChildRequest>,
) -> Result<Json<Child>, ApiError> {
    let id = request
        .id
        .ok_or_else(|| ApiError::bad_request("id is required when updating a child"))?;

    let child = request.into_child(id)?;
    Ok(Json(children.update(child).await?))
}

pub async fn delete_child(
    Inject(children): Inject<ChildService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    children.delete(id).await?;
    Ok(Json(json!({ "ok": true, "id": id })))
}
