pub mod local;
pub mod remote;
pub mod traits;

/// Fixed key under which the serialized history series is stored locally.
pub const HISTORY_KEY: &str = "portfolioHistory";
