use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::gateways::{AddressGateway, ChildGateway, SchoolBusGateway, UserGateway};
use crate::ioc::Injector;
use crate::repo::{AddressRepo, ChildRepo, MemoryStore, SchoolBusRepo, UserRepo};
use crate::services::{AddressService, ChildService, SchoolBusService, UserService};

/// Process-wide storage handles. Shared by every request.
#[derive(Clone)]
pub struct Gateways {
    pub addresses: Arc<dyn AddressGateway>,
    pub children: Arc<dyn ChildGateway>,
    pub school_buses: Arc<dyn SchoolBusGateway>,
    pub users: Arc<dyn UserGateway>,
}

impl Gateways {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            addresses: Arc::new(AddressRepo::new(pool.clone())),
            children: Arc::new(ChildRepo::new(pool.clone())),
            school_buses: Arc::new(SchoolBusRepo::new(pool.clone())),
            users: Arc::new(UserRepo::new(pool)),
        }
    }

    pub fn in_memory(store: MemoryStore) -> Self {
        Self {
            addresses: Arc::new(store.clone()),
            children: Arc::new(store.clone()),
            school_buses: Arc::new(store.clone()),
            users: Arc::new(store),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub gateways: Gateways,
    pub config: Config,
}

impl AppState {
    pub fn new(gateways: Gateways, config: Config) -> Self {
        Self { gateways, config }
    }

    /// Builds the injector handed to a single request: gateways as shared
    /// instances, use-cases as providers that pull their gateways back out
    /// of the same injector.
    pub fn request_injector(&self) -> Injector {
        let mut injector = Injector::new();
        let gateways = &self.gateways;

        injector
            .bind::<Arc<dyn AddressGateway>>()
            .to_instance(gateways.addresses.clone());
        injector
            .bind::<Arc<dyn ChildGateway>>()
            .to_instance(gateways.children.clone());
        injector
            .bind::<Arc<dyn SchoolBusGateway>>()
            .to_instance(gateways.school_buses.clone());
        injector
            .bind::<Arc<dyn UserGateway>>()
            .to_instance(gateways.users.clone());

        injector.bind::<AddressService>().to_provider(|inj| {
            Ok(AddressService::new(inj.get_instance()?, inj.get_instance()?))
        });
        injector.bind::<ChildService>().to_provider(|inj| {
            Ok(ChildService::new(inj.get_instance()?, inj.get_instance()?))
        });
        injector.bind::<SchoolBusService>().to_provider(|inj| {
            Ok(SchoolBusService::new(inj.get_instance()?, inj.get_instance()?))
        });
        injector
            .bind::<UserService>()
            .to_provider(|inj| Ok(UserService::new(inj.get_instance()?)));

        injector
    }
}
