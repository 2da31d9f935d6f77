pub mod history_service;
pub mod market_clock;
pub mod portfolio_service;
pub mod scheduler;
pub mod view_service;
