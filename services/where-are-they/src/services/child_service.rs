use std::sync::Arc;

use tracing::info;

use crate::domain::Child;
use crate::errors::DomainError;
use crate::gateways::{ChildGateway, UserGateway};
use crate::services::address_service::ensure_observer;

/// Child use-cases.
#[derive(Clone)]
pub struct ChildService {
    children: Arc<dyn ChildGateway>,
    users: Arc<dyn UserGateway>,
}

impl ChildService {
    pub fn new(children: Arc<dyn ChildGateway>, users: Arc<dyn UserGateway>) -> Self {
        Self { children, users }
    }

    pub async fn get(&self, id: i64) -> Result<Child, DomainError> {
        self.children
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("child", id))
    }

    pub async fn save(&self, child: Child) -> Result<Child, DomainError> {
        ensure_observer(self.users.as_ref(), child.observer_user_id).await?;

        let saved = self.children.save(&child).await?;
        info!("Saved child {} for observer user {}", saved.id, saved.observer_user_id);
        Ok(saved)
    }

    pub async fn update(&self, child: Child) -> Result<Child, DomainError> {
        self.get(child.id).await?;
        ensure_observer(self.users.as_ref(), child.observer_user_id).await?;

        let updated = self.children.update(&child).await?;
        info!("Updated child {}", updated.id);
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        self.get(id).await?;
        self.children.delete(id).await?;
        info!("Deleted child {}", id);
        Ok(())
    }
}
