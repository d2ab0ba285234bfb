//! Core types for medmem.

mod context;
mod extracted;
mod identity;
mod message;
mod records;

pub use context::*;
pub use extracted::*;
pub use identity::*;
pub use message::*;
pub use records::*;
