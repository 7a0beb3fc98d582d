pub mod assistant;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod intent;
pub mod llm;
pub mod models;
pub mod reference;
pub mod service;
pub mod session;
pub mod tasks;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use assistant::{DocumentUpload, LegalAssistant};
pub use config::AppConfig;
pub use models::*;
pub use service::{AppState, build_router, create_app};
pub use workflow::{LegalWorkflow, build_legal_workflow};
