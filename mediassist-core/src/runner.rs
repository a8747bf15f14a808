//! FlowRunner – loads a report session, runs the pipeline from the session's current step, and
//! persists the updated session back to storage.
//!
//! ## When should you use `FlowRunner`?
//! * **Request handlers**: each user action (upload, summary request) is one `run` call; the
//!   session is saved afterwards so the next request starts where this one stopped.
//! * **Command-line tools**: keeps the load-execute-save boilerplate out of `main`.
//!
//! ## When should you use `Pipeline::execute_session` directly?
//! * When the session never needs to be stored, e.g. a one-shot analysis of a local file.
//! * When you want to inspect the intermediate `ReportSession` before saving it.
//!
//! A failed run leaves the stored session untouched. A session deleted while a run is in
//! flight stays deleted; the run then fails with `SessionNotFound`.

use std::sync::Arc;

use crate::{
    error::{AssistError, Result},
    pipeline::{ExecutionResult, Pipeline},
    storage::SessionStorage,
};

/// High-level helper that orchestrates the common _load → execute → save_ pattern.
#[derive(Clone)]
pub struct FlowRunner {
    pipeline: Arc<Pipeline>,
    storage: Arc<dyn SessionStorage>,
}

impl FlowRunner {
    /// Create a new `FlowRunner` from an `Arc<Pipeline>` and any `SessionStorage` implementation.
    pub fn new(pipeline: Arc<Pipeline>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { pipeline, storage }
    }

    /// Run the pipeline for `session_id` until it waits or completes, then persist the session.
    pub async fn run(&self, session_id: &str) -> Result<ExecutionResult> {
        // 1. Load session
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| AssistError::SessionNotFound(session_id.to_string()))?;

        // 2. Execute from the current step
        let result = self.pipeline.execute_session(&mut session).await?;

        // 3. Persist new state so the next call starts where we left off
        if !self.storage.update(session).await? {
            return Err(AssistError::SessionNotFound(session_id.to_string()));
        }

        Ok(result)
    }
}
