//! Platform enumerator boundary
//!
//! Native backends implement [`WindowEnumerator`]; the engine only ever sees the trait
//! object injected at construction time.

pub mod enumerator;
pub mod snapshot;

pub use enumerator::*;
pub use snapshot::*;
