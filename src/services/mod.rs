//! Core services for DeskScout

pub mod focus_coordinator;
pub mod rate_limiter;
pub mod search_engine;
pub mod window_cache;
pub mod window_manager;

pub use focus_coordinator::*;
pub use rate_limiter::*;
pub use search_engine::*;
pub use window_cache::*;
pub use window_manager::*;
