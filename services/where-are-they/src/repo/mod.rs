pub mod address_repo;
pub mod child_repo;
pub mod memory;
pub mod school_bus_repo;
pub mod user_repo;

pub use address_repo::AddressRepo;
pub use child_repo::ChildRepo;
pub use memory::MemoryStore;
pub use school_bus_repo::SchoolBusRepo;
pub use user_repo::UserRepo;

use sqlx::PgPool;
use tracing::info;

/// Create every table. Users go first: the rest reference them.
pub async fn init_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Initializing database tables");

    UserRepo::new(pool.clone()).init_tables().await?;
    info!("User tables initialized");

    SchoolBusRepo::new(pool.clone()).init_tables().await?;
    ChildRepo::new(pool.clone()).init_tables().await?;
    AddressRepo::new(pool.clone()).init_tables().await?;

    info!("All database tables initialized successfully");
    Ok(())
}
