pub mod gateway;
pub mod proxy;
pub mod traits;
