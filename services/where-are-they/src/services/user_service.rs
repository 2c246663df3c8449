use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::domain::{Credentials, NewUserAccount, ObserverUser, UserAccount, UserRegistration};
use crate::errors::DomainError;
use crate::gateways::UserGateway;

/// User, login and observation use-cases.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserGateway>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserGateway>) -> Self {
        Self { users }
    }

    pub async fn get(&self, id: i64) -> Result<UserAccount, DomainError> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", id))
    }

    /// Registers an observed user. A privacy key is generated when the
    /// caller does not bring one.
    pub async fn save_observed(
        &self,
        identity: UserRegistration,
        privacy_key: Option<String>,
        company_name: String,
    ) -> Result<UserAccount, DomainError> {
        let account = NewUserAccount::Observed {
            identity: with_hashed_password(identity)?,
            privacy_key: privacy_key.unwrap_or_else(|| Uuid::new_v4().to_string()),
            company_name,
        };
        self.save(account).await
    }

    pub async fn save_observer(
        &self,
        identity: UserRegistration,
    ) -> Result<UserAccount, DomainError> {
        let account = NewUserAccount::Observer {
            identity: with_hashed_password(identity)?,
        };
        self.save(account).await
    }

    /// Returns the specialized account on success. Unknown usernames and
    /// wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, credentials: Credentials) -> Result<UserAccount, DomainError> {
        let Some(account) = self.users.get_by_username(&credentials.username).await? else {
            warn!("Login attempt for unknown username {}", credentials.username);
            return Err(DomainError::IncorrectUserOrPassword);
        };

        let matches = verify_password(&credentials.password, &account.user().password)
            .map_err(|e| {
                error!("Cannot verify password of user {}: {}", account.id(), e);
                DomainError::Internal
            })?;
        if !matches {
            warn!("Wrong password for username {}", credentials.username);
            return Err(DomainError::IncorrectUserOrPassword);
        }

        info!("User {} logged in as {}", account.id(), account.kind());
        Ok(account)
    }

    /// Lets an observer start watching the observed user holding
    /// `privacy_key`.
    pub async fn add_observed_user_in_observer_user(
        &self,
        privacy_key: &str,
        observer_user_id: i64,
    ) -> Result<ObserverUser, DomainError> {
        let observed = self
            .users
            .get_observed_by_privacy_key(privacy_key)
            .await?
            .ok_or_else(|| DomainError::NotFound("no observed user holds that privacy key".to_string()))?;

        let observer = self
            .users
            .get(observer_user_id)
            .await?
            .and_then(UserAccount::into_observer)
            .ok_or_else(|| DomainError::not_found("observer user", observer_user_id))?;

        if self
            .users
            .observation_exists(observed.user.id, observer.user.id)
            .await?
        {
            return Err(DomainError::Conflict(format!(
                "observer user {} already observes user {}",
                observer.user.id, observed.user.id
            )));
        }

        self.users
            .add_observation(observed.user.id, observer.user.id)
            .await?;
        info!(
            "Observer user {} now observes user {}",
            observer.user.id, observed.user.id
        );

        self.users
            .get(observer_user_id)
            .await?
            .and_then(UserAccount::into_observer)
            .ok_or_else(|| DomainError::not_found("observer user", observer_user_id))
    }

    async fn save(&self, account: NewUserAccount) -> Result<UserAccount, DomainError> {
        let saved = self.users.save(&account).await?;
        info!("Saved {} user {} ({})", saved.kind(), saved.id(), saved.user().username);
        Ok(saved)
    }
}

fn with_hashed_password(identity: UserRegistration) -> Result<UserRegistration, DomainError> {
    let password = hash_password(&identity.password).map_err(|e| {
        error!("{}", e);
        DomainError::Internal
    })?;
    Ok(UserRegistration {
        password,
        ..identity
    })
}
