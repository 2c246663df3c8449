use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{SchoolBus, UserAccount};
use crate::errors::DomainError;
use crate::gateways::{SchoolBusGateway, UserGateway};

/// School bus use-cases. Bus ids come from the client, so `save` checks for
/// an existing id before inserting.
#[derive(Clone)]
pub struct SchoolBusService {
    buses: Arc<dyn SchoolBusGateway>,
    users: Arc<dyn UserGateway>,
}

impl SchoolBusService {
    pub fn new(buses: Arc<dyn SchoolBusGateway>, users: Arc<dyn UserGateway>) -> Self {
        Self { buses, users }
    }

    pub async fn get(&self, id: &str) -> Result<SchoolBus, DomainError> {
        self.buses
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("school bus", id))
    }

    pub async fn save(&self, bus: SchoolBus) -> Result<SchoolBus, DomainError> {
        if self.buses.get(&bus.id).await?.is_some() {
            warn!("School bus {} already exists", bus.id);
            return Err(DomainError::Conflict(format!("school bus {} already exists", bus.id)));
        }
        self.ensure_observed(bus.observed_user_id).await?;

        let saved = self.buses.save(&bus).await?;
        info!("Saved school bus {} for observed user {}", saved.id, saved.observed_user_id);
        Ok(saved)
    }

    pub async fn update(&self, bus: SchoolBus) -> Result<SchoolBus, DomainError> {
        self.get(&bus.id).await?;
        self.ensure_observed(bus.observed_user_id).await?;

        let updated = self.buses.update(&bus).await?;
        info!("Updated school bus {}", updated.id);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.get(id).await?;
        self.buses.delete(id).await?;
        info!("Deleted school bus {}", id);
        Ok(())
    }

    async fn ensure_observed(&self, observed_user_id: i64) -> Result<(), DomainError> {
        match self.users.get(observed_user_id).await? {
            Some(UserAccount::Observed(_)) => Ok(()),
            _ => Err(DomainError::not_found("observed user", observed_user_id)),
        }
    }
}
