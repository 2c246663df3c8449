use std::sync::Arc;

use tracing::info;

use crate::domain::{Address, UserAccount};
use crate::errors::DomainError;
use crate::gateways::{AddressGateway, UserGateway};

/// Address use-cases.
#[derive(Clone)]
pub struct AddressService {
    addresses: Arc<dyn AddressGateway>,
    users: Arc<dyn UserGateway>,
}

impl AddressService {
    pub fn new(addresses: Arc<dyn AddressGateway>, users: Arc<dyn UserGateway>) -> Self {
        Self { addresses, users }
    }

    pub async fn get(&self, id: i64) -> Result<Address, DomainError> {
        self.addresses
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("address", id))
    }

    pub async fn save(&self, address: Address) -> Result<Address, DomainError> {
        ensure_observer(self.users.as_ref(), address.observer_user_id).await?;

        let saved = self.addresses.save(&address).await?;
        info!("Saved address {} for observer user {}", saved.id, saved.observer_user_id);
        Ok(saved)
    }

    pub async fn update(&self, address: Address) -> Result<Address, DomainError> {
        self.get(address.id).await?;
        ensure_observer(self.users.as_ref(), address.observer_user_id).await?;

        let updated = self.addresses.update(&address).await?;
        info!("Updated address {}", updated.id);
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        self.get(id).await?;
        self.addresses.delete(id).await?;
        info!("Deleted address {}", id);
        Ok(())
    }
}

/// Children and addresses may only hang off an existing observer user.
pub(crate) async fn ensure_observer(
    users: &dyn UserGateway,
    observer_user_id: i64,
) -> Result<(), DomainError> {
    match users.get(observer_user_id).await? {
        Some(UserAccount::Observer(_)) => Ok(()),
        _ => Err(DomainError::not_found("observer user", observer_user_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewUserAccount, UserRegistration};
    use crate::repo::MemoryStore;

    fn address(observer_user_id: i64) -> Address {
        Address {
            id: 0,
            name: "Casa".to_string(),
            street: "25 de Mayo".to_string(),
            number: "1010".to_string(),
            floor: None,
            apartment: None,
            postal_code: "5000".to_string(),
            city: "Cordoba".to_string(),
            province: "Cordoba".to_string(),
            country: "Argentina".to_string(),
            latitude: "-31.4135".to_string(),
            longitude: "-64.18105".to_string(),
            observer_user_id,
        }
    }

    async fn observer(store: &MemoryStore) -> i64 {
        let account = NewUserAccount::Observer {
            identity: UserRegistration {
                name: "Ana".to_string(),
                last_name: "Gomez".to_string(),
                id_number: "28999111".to_string(),
                username: "agomez".to_string(),
                password: "hash".to_string(),
                email: "agomez@example.com".to_string(),
            },
        };
        UserGateway::save(store, &account).await.unwrap().id()
    }

    fn service(store: &MemoryStore) -> AddressService {
        AddressService::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn save_then_get_returns_the_same_address() {
        let store = MemoryStore::new();
        let observer_id = observer(&store).await;
        let service = service(&store);

        let saved = service.save(address(observer_id)).await.unwrap();
        assert!(saved.id > 0);

        let loaded = service.get(saved.id).await.unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(Address { id: 0, ..loaded }, address(observer_id));
    }

    #[tokio::test]
    async fn save_requires_an_existing_observer() {
        let store = MemoryStore::new();
        let service = service(&store);

        let err = service.save(address(42)).await.unwrap_err();
        assert_eq!(err, DomainError::not_found("observer user", 42));
        assert_eq!(store.mutations(), 0);
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_address_do_not_touch_storage() {
        let store = MemoryStore::new();
        let observer_id = observer(&store).await;
        let service = service(&store);
        let before = store.mutations();

        let mut missing = address(observer_id);
        missing.id = 99;
        assert!(matches!(service.update(missing).await, Err(DomainError::NotFound(_))));
        assert!(matches!(service.delete(99).await, Err(DomainError::NotFound(_))));
        assert_eq!(store.mutations(), before);
    }

    #[tokio::test]
    async fn delete_removes_the_address() {
        let store = MemoryStore::new();
        let observer_id = observer(&store).await;
        let service = service(&store);

        let saved = service.save(address(observer_id)).await.unwrap();
        service.delete(saved.id).await.unwrap();

        assert!(matches!(service.get(saved.id).await, Err(DomainError::NotFound(_))));
    }
}
