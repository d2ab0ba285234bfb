//! Collaborator traits the orchestration core depends on.

mod llm;
mod stores;

pub use llm::*;
pub use stores::*;
