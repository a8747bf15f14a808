pub mod config;
pub mod models;
pub mod service;
pub mod summarizer;
pub mod tasks;
pub mod workflow;

pub use config::ServiceConfig;
pub use service::{AppState, build_router, create_app};
pub use summarizer::build_summarizer;
pub use workflow::{build_report_pipeline, create_flow_runner, create_report_session};
pub use models::*;
