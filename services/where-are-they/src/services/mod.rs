pub mod address_service;
pub mod child_service;
pub mod school_bus_service;
pub mod user_service;

pub use address_service::AddressService;
pub use child_service::ChildService;
pub use school_bus_service::SchoolBusService;
pub use user_service::UserService;
