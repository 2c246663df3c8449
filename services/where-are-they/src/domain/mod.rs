pub mod address;
pub mod child;
pub mod school_bus;
pub mod user;

pub use address::*;
pub use child::*;
pub use school_bus::*;
pub use user::*;
