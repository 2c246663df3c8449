//! Storage contracts consumed by the use-cases.
//!
//! Every `get` distinguishes absence (`Ok(None)`) from failure (`Err`).
//! Implementations live in `crate::repo`.

use async_trait::async_trait;

use crate::domain::{Address, Child, NewUserAccount, ObservedUser, SchoolBus, UserAccount};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("duplicate value violates unique constraint '{constraint}'")]
    Duplicate { constraint: String },

    #[error("referenced row does not exist ('{constraint}')")]
    MissingReference { constraint: String },

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            if db_err.is_unique_violation() {
                return RepoError::Duplicate { constraint };
            }
            if db_err.is_foreign_key_violation() {
                return RepoError::MissingReference { constraint };
            }
        }
        RepoError::Database(err)
    }
}

#[async_trait]
pub trait AddressGateway: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Address>, RepoError>;
    async fn save(&self, address: &Address) -> Result<Address, RepoError>;
    async fn update(&self, address: &Address) -> Result<Address, RepoError>;
    async fn delete(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait ChildGateway: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Child>, RepoError>;
    async fn save(&self, child: &Child) -> Result<Child, RepoError>;
    async fn update(&self, child: &Child) -> Result<Child, RepoError>;
    async fn delete(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SchoolBusGateway: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<SchoolBus>, RepoError>;
    async fn save(&self, bus: &SchoolBus) -> Result<SchoolBus, RepoError>;
    async fn update(&self, bus: &SchoolBus) -> Result<SchoolBus, RepoError>;
    async fn delete(&self, id: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UserGateway: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<UserAccount>, RepoError>;
    async fn get_by_username(&self, username: &str) -> Result<Option<UserAccount>, RepoError>;
    async fn get_observed_by_privacy_key(
        &self,
        privacy_key: &str,
    ) -> Result<Option<ObservedUser>, RepoError>;
    async fn save(&self, account: &NewUserAccount) -> Result<UserAccount, RepoError>;
    async fn observation_exists(
        &self,
        observed_user_id: i64,
        observer_user_id: i64,
    ) -> Result<bool, RepoError>;
    async fn add_observation(
        &self,
        observed_user_id: i64,
        observer_user_id: i64,
    ) -> Result<(), RepoError>;
}
