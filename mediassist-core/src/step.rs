use async_trait::async_trait;

use crate::{error::Result, storage::ReportSession};

/// Result of a step execution
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Response to send to the user
    pub response: Option<String>,
    /// Next action to take
    pub next_action: NextAction,
    /// Progress note stored on the session
    pub status_message: Option<String>,
    /// Filled in by the pipeline with the id of the step that produced this result
    pub step_id: String,
}

impl StepResult {
    pub fn new(response: Option<String>, next_action: NextAction) -> Self {
        Self {
            response,
            next_action,
            status_message: None,
            step_id: String::new(),
        }
    }

    pub fn new_with_status(
        response: Option<String>,
        next_action: NextAction,
        status_message: Option<String>,
    ) -> Self {
        Self {
            response,
            next_action,
            status_message,
            step_id: String::new(),
        }
    }
}

/// Defines what should happen after a step completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// Move to the next step and run it immediately
    ContinueAndExecute,
    /// Stay on this step until the user acts
    WaitForInput,
    /// The analysis is finished
    End,
}

/// One unit of report analysis.
#[async_trait]
pub trait Step: Send + Sync {
    /// Unique identifier for this step
    fn id(&self) -> &str;

    /// Execute the step against the session's state
    async fn run(&self, session: &mut ReportSession) -> Result<StepResult>;
}
