pub mod config;
pub mod holding;
pub mod news;
pub mod portfolio;
pub mod snapshot;
pub mod valuation;
pub mod view;
