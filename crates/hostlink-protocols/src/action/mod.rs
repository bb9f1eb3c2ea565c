//! Action protocol definitions.
//!
//! Actions are the named units of behavior a client can invoke.

mod definition;
mod traits;

pub use definition::*;
pub use traits::*;
