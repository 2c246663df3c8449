pub mod address_handler;
pub mod child_handler;
pub mod extract;
pub mod health;
pub mod school_bus_handler;
pub mod user_handler;

pub use address_handler::*;
pub use child_handler::*;
pub use health::*;
pub use school_bus_handler::*;
pub use user_handler::*;
