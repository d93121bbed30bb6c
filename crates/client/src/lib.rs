// ragdesk-client: orchestration engine between a front end and the RAG API.

pub mod chat;
pub mod config;
pub mod documents;
pub mod engine;
pub mod gateway;
pub mod security;
pub mod session;
pub mod stats;
pub mod workspaces;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{Engine, EngineError, WorkspaceView};
