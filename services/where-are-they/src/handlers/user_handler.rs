use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::domain::{Credentials, ObserverUser, UserAccount, UserRegistration};
use crate::errors::ApiError;
use crate::handlers::extract::{ApiPath, ValidatedJson};
use crate::middleware::Inject;
use crate::services::UserService;

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(length(min = 1, max = 200))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ObserverUserRequest {
    pub id: Option<i64>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 20))]
    pub id_number: String,
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 8, max = 200))]
    pub password: String,
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ObservedUserRequest {
    pub id: Option<i64>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 20))]
    pub id_number: String,
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 8, max = 200))]
    pub password: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 100))]
    pub privacy_key: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub company_name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AddObservedUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub privacy_key: String,
}

fn reject_client_id(id: Option<i64>) -> Result<(), ApiError> {
    match id {
        Some(_) => Err(ApiError::bad_request("id must not be set when creating a user")),
        None => Ok(()),
    }
}

pub async fn get_user(
    Inject(users): Inject<UserService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UserAccount>, ApiError> {
    Ok(Json(users.get(id).await?))
}

pub async fn login(
    Inject(users): Inject<UserService>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<UserAccount>, ApiError> {
    let account = users
        .login(Credentials {
            username: request.username,
            password: request.password,
        })
        .await?;
    Ok(Json(account))
}

pub async fn create_observer_user(
    Inject(users): Inject<UserService>,
    ValidatedJson(request): ValidatedJson<ObserverUserRequest>,
) -> Result<Json<UserAccount>, ApiError> {
    reject_client_id(request.id)?;

    let identity = UserRegistration {
        name: request.name,
        last_name: request.last_name,
        id_number: request.id_number,
        username: request.username,
        password: request.password,
        email: request.email,
    };
    Ok(Json(users.save_observer(identity).await?))
}

pub async fn create_observed_user(
    Inject(users): Inject<UserService>,
    ValidatedJson(request): ValidatedJson<ObservedUserRequest>,
) -> Result<Json<UserAccount>, ApiError> {
    reject_client_id(request.id)?;

    let identity = UserRegistration {
        name: request.name,
        last_name: request.last_name,
        id_number: request.id_number,
        username: request.username,
        password: request.password,
        email: request.email,
    };
    let account = users
        .save_observed(identity, request.privacy_key, request.company_name)
        .await?;
    Ok(Json(account))
}

/// Observer `id` starts watching the observed user holding the privacy key
pub async fn add_observed_user(
    Inject(users): Inject<UserService>,
    ApiPath(observer_user_id): ApiPath<i64>,
    ValidatedJson(request): ValidatedJson<AddObservedUserRequest>,
) -> Result<Json<ObserverUser>, ApiError> {
    let observer = users
        .add_observed_user_in_observer_user(&request.privacy_key, observer_user_id)
        .await?;
    Ok(Json(observer))
}
