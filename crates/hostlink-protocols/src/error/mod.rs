//! Error types shared across the hostlink crates.

mod delivery;
mod handler;
mod parse;

pub use delivery::*;
pub use handler::*;
pub use parse::*;
