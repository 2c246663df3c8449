//! In-memory gateways used by the test suites.
//!
//! One [`MemoryStore`] implements every gateway over shared tables so that,
//! like the Postgres schema, a user lookup sees the children and buses saved
//! through the other gateways. Unique and foreign-key constraints report the
//! same constraint names as the SQL schema.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::{
    Address, Child, NewUserAccount, ObservedUser, ObserverUser, SchoolBus, User, UserAccount,
};
use crate::gateways::{AddressGateway, ChildGateway, RepoError, SchoolBusGateway, UserGateway};

#[derive(Debug, Clone)]
enum Role {
    Observed {
        privacy_key: String,
        company_name: String,
    },
    Observer,
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    role: Role,
}

#[derive(Debug, Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<i64, StoredUser>,
    /// (observed_user_id, observer_user_id) -> created_at
    observations: BTreeMap<(i64, i64), DateTime<Utc>>,
    children: BTreeMap<i64, Child>,
    addresses: BTreeMap<i64, Address>,
    school_buses: BTreeMap<String, SchoolBus>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn is_observer(&self, id: i64) -> bool {
        matches!(
            self.users.get(&id),
            Some(StoredUser {
                role: Role::Observer,
                ..
            })
        )
    }

    fn observed_user(&self, stored: &StoredUser) -> Option<ObservedUser> {
        let Role::Observed {
            privacy_key,
            company_name,
        } = &stored.role
        else {
            return None;
        };
        Some(ObservedUser {
            user: stored.user.clone(),
            privacy_key: privacy_key.clone(),
            company_name: company_name.clone(),
            school_bus: self
                .school_buses
                .values()
                .find(|bus| bus.observed_user_id == stored.user.id)
                .cloned(),
        })
    }

    /// Observed users watched by `observer_id`, oldest pairing first, the
    /// same order `user_repo` reads them in.
    fn observed_by(&self, observer_id: i64) -> Vec<ObservedUser> {
        let mut pairings: Vec<_> = self
            .observations
            .iter()
            .filter(|((_, observer), _)| *observer == observer_id)
            .map(|((observed, _), created_at)| (*created_at, *observed))
            .collect();
        pairings.sort_unstable();

        pairings
            .into_iter()
            .filter_map(|(_, observed)| self.users.get(&observed))
            .filter_map(|stored| self.observed_user(stored))
            .collect()
    }

    fn account(&self, id: i64) -> Option<UserAccount> {
        let stored = self.users.get(&id)?;
        match stored.role {
            Role::Observed { .. } => self.observed_user(stored).map(UserAccount::Observed),
            Role::Observer => Some(UserAccount::Observer(ObserverUser {
                user: stored.user.clone(),
                children: self
                    .children
                    .values()
                    .filter(|child| child.observer_user_id == id)
                    .cloned()
                    .collect(),
                observed_users: self.observed_by(id),
            })),
        }
    }

    fn check_unique_user(&self, account: &NewUserAccount) -> Result<(), RepoError> {
        let identity = account.identity();
        for stored in self.users.values() {
            if stored.user.username == identity.username {
                return Err(duplicate("users_username_key"));
            }
            if stored.user.email == identity.email {
                return Err(duplicate("users_email_key"));
            }
            if let (
                Role::Observed { privacy_key, .. },
                NewUserAccount::Observed {
                    privacy_key: wanted,
                    ..
                },
            ) = (&stored.role, account)
            {
                if privacy_key == wanted {
                    return Err(duplicate("users_privacy_key_key"));
                }
            }
        }
        Ok(())
    }
}

fn duplicate(constraint: &str) -> RepoError {
    RepoError::Duplicate {
        constraint: constraint.to_string(),
    }
}

fn missing(constraint: &str) -> RepoError {
    RepoError::MissingReference {
        constraint: constraint.to_string(),
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    mutations: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of save/update/delete calls that reached the store.
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Inserts an observer user directly, bypassing password hashing and
    /// the mutation counter.
    pub async fn seed_observer(&self, username: &str) -> i64 {
        self.seed(username, Role::Observer).await
    }

    pub async fn seed_observed(&self, username: &str, privacy_key: &str) -> i64 {
        self.seed(
            username,
            Role::Observed {
                privacy_key: privacy_key.to_string(),
                company_name: format!("{} transportes", username),
            },
        )
        .await
    }

    async fn seed(&self, username: &str, role: Role) -> i64 {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let user = User {
            id,
            name: username.to_string(),
            last_name: username.to_string(),
            id_number: format!("{:08}", id),
            username: username.to_string(),
            password: String::new(),
            email: format!("{}@example.com", username),
        };
        tables.users.insert(id, StoredUser { user, role });
        id
    }

    fn record_mutation(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AddressGateway for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<Address>, RepoError> {
        Ok(self.tables.read().await.addresses.get(&id).cloned())
    }

    async fn save(&self, address: &Address) -> Result<Address, RepoError> {
        self.record_mutation();
        let mut tables = self.tables.write().await;
        if !tables.is_observer(address.observer_user_id) {
            return Err(missing("addresses_observer_user_id_fkey"));
        }
        let saved = Address {
            id: tables.next_id(),
            ..address.clone()
        };
        tables.addresses.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn update(&self, address: &Address) -> Result<Address, RepoError> {
        self.record_mutation();
        let mut tables = self.tables.write().await;
        if !tables.is_observer(address.observer_user_id) {
            return Err(missing("addresses_observer_user_id_fkey"));
        }
        match tables.addresses.get_mut(&address.id) {
            Some(stored) => {
                *stored = address.clone();
                Ok(address.clone())
            }
            None => Err(RepoError::Database(sqlx::Error::RowNotFound)),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.record_mutation();
        self.tables.write().await.addresses.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ChildGateway for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<Child>, RepoError> {
        Ok(self.tables.read().await.children.get(&id).cloned())
    }

    async fn save(&self, child: &Child) -> Result<Child, RepoError> {
        self.record_mutation();
        let mut tables = self.tables.write().await;
        if !tables.is_observer(child.observer_user_id) {
            return Err(missing("children_observer_user_id_fkey"));
        }
        let saved = Child {
            id: tables.next_id(),
            ..child.clone()
        };
        tables.children.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn update(&self, child: &Child) -> Result<Child, RepoError> {
        self.record_mutation();
        let mut tables = self.tables.write().await;
        if !tables.is_observer(child.observer_user_id) {
            return Err(missing("children_observer_user_id_fkey"));
        }
        match tables.children.get_mut(&child.id) {
            Some(stored) => {
                *stored = child.clone();
                Ok(child.clone())
            }
            None => Err(RepoError::Database(sqlx::Error::RowNotFound)),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.record_mutation();
        self.tables.write().await.children.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl SchoolBusGateway for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<SchoolBus>, RepoError> {
        Ok(self.tables.read().await.school_buses.get(id).cloned())
    }

    async fn save(&self, bus: &SchoolBus) -> Result<SchoolBus, RepoError> {
        self.record_mutation();
        let mut tables = self.tables.write().await;
        if tables.school_buses.contains_key(&bus.id) {
            return Err(duplicate("school_buses_pkey"));
        }
        if tables
            .school_buses
            .values()
            .any(|other| other.observed_user_id == bus.observed_user_id)
        {
            return Err(duplicate("school_buses_observed_user_id_key"));
        }
        if !tables.users.contains_key(&bus.observed_user_id) {
            return Err(missing("school_buses_observed_user_id_fkey"));
        }
        tables.school_buses.insert(bus.id.clone(), bus.clone());
        Ok(bus.clone())
    }

    async fn update(&self, bus: &SchoolBus) -> Result<SchoolBus, RepoError> {
        self.record_mutation();
        let mut tables = self.tables.write().await;
        if tables
            .school_buses
            .values()
            .any(|other| other.id != bus.id && other.observed_user_id == bus.observed_user_id)
        {
            return Err(duplicate("school_buses_observed_user_id_key"));
        }
        match tables.school_buses.get_mut(&bus.id) {
            Some(stored) => {
                *stored = bus.clone();
                Ok(bus.clone())
            }
            None => Err(RepoError::Database(sqlx::Error::RowNotFound)),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), RepoError> {
        self.record_mutation();
        self.tables.write().await.school_buses.remove(id);
        Ok(())
    }
}

#[async_trait]
impl UserGateway for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<UserAccount>, RepoError> {
        Ok(self.tables.read().await.account(id))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserAccount>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|stored| stored.user.username == username)
            .and_then(|stored| tables.account(stored.user.id)))
    }

    async fn get_observed_by_privacy_key(
        &self,
        privacy_key: &str,
    ) -> Result<Option<ObservedUser>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|stored| {
                matches!(&stored.role, Role::Observed { privacy_key: key, .. } if key == privacy_key)
            })
            .and_then(|stored| tables.observed_user(stored)))
    }

    async fn save(&self, account: &NewUserAccount) -> Result<UserAccount, RepoError> {
        self.record_mutation();
        let mut tables = self.tables.write().await;
        tables.check_unique_user(account)?;

        let identity = account.identity().clone();
        let id = tables.next_id();
        let role = match account {
            NewUserAccount::Observed {
                privacy_key,
                company_name,
                ..
            } => Role::Observed {
                privacy_key: privacy_key.clone(),
                company_name: company_name.clone(),
            },
            NewUserAccount::Observer { .. } => Role::Observer,
        };
        let user = User {
            id,
            name: identity.name,
            last_name: identity.last_name,
            id_number: identity.id_number,
            username: identity.username,
            password: identity.password,
            email: identity.email,
        };
        tables.users.insert(id, StoredUser { user, role });

        tables
            .account(id)
            .ok_or(RepoError::Database(sqlx::Error::RowNotFound))
    }

    async fn observation_exists(
        &self,
        observed_user_id: i64,
        observer_user_id: i64,
    ) -> Result<bool, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .observations
            .contains_key(&(observed_user_id, observer_user_id)))
    }

    async fn add_observation(
        &self,
        observed_user_id: i64,
        observer_user_id: i64,
    ) -> Result<(), RepoError> {
        self.record_mutation();
        let mut tables = self.tables.write().await;
        let key = (observed_user_id, observer_user_id);
        if tables.observations.contains_key(&key) {
            return Err(duplicate("observed_user_observer_user_pkey"));
        }
        if !tables.users.contains_key(&observed_user_id) || !tables.users.contains_key(&observer_user_id) {
            return Err(missing("observed_user_observer_user_user_fkey"));
        }
        tables.observations.insert(key, Utc::now());
        Ok(())
    }
}
