//! Data models for DeskScout

pub mod filter_result;
pub mod focus;
pub mod search_query;
pub mod window;
pub mod workspace;

pub use filter_result::*;
pub use focus::*;
pub use search_query::*;
pub use window::*;
pub use workspace::*;
