use std::sync::Arc;
use tracing::debug;

use crate::{
    error::{AssistError, Result},
    step::{NextAction, Step, StepResult},
    storage::ReportSession,
};

/// Ordered sequence of analysis steps. A step's successor is the step added
/// right after it.
pub struct Pipeline {
    pub id: String,
    steps: Vec<Arc<dyn Step>>,
}

impl Pipeline {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step to the pipeline
    pub fn add_step(&mut self, step: Arc<dyn Step>) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// Run the session from its current step until a step waits for input,
    /// ends the analysis, or has no successor.
    pub async fn execute_session(&self, session: &mut ReportSession) -> Result<ExecutionResult> {
        loop {
            let step_id = session.current_step_id.clone();
            let result = self.execute_single_step(&step_id, session).await?;

            if result.status_message.is_some() {
                session.status_message = result.status_message.clone();
            }

            match result.next_action {
                NextAction::ContinueAndExecute => match self.next_step_id(&result.step_id) {
                    Some(next_step_id) => {
                        debug!(from = %result.step_id, to = %next_step_id, "Advancing pipeline");
                        session.current_step_id = next_step_id;
                    }
                    None => {
                        return Ok(ExecutionResult {
                            response: result.response,
                            status: ExecutionStatus::WaitingForInput,
                        });
                    }
                },
                NextAction::WaitForInput => {
                    return Ok(ExecutionResult {
                        response: result.response,
                        status: ExecutionStatus::WaitingForInput,
                    });
                }
                NextAction::End => {
                    return Ok(ExecutionResult {
                        response: result.response,
                        status: ExecutionStatus::Completed,
                    });
                }
            }
        }
    }

    async fn execute_single_step(
        &self,
        step_id: &str,
        session: &mut ReportSession,
    ) -> Result<StepResult> {
        let step = self
            .get_step(step_id)
            .ok_or_else(|| AssistError::StepNotFound(step_id.to_string()))?;

        let mut result = step.run(session).await?;

        // Set the step_id in the result to track which step generated it
        result.step_id = step_id.to_string();

        Ok(result)
    }

    /// Id of the step that follows `current_step_id`
    pub fn next_step_id(&self, current_step_id: &str) -> Option<String> {
        let position = self
            .steps
            .iter()
            .position(|step| step.id() == current_step_id)?;
        self.steps.get(position + 1).map(|step| step.id().to_string())
    }

    /// Get the start step ID
    pub fn start_step_id(&self) -> Option<String> {
        self.steps.first().map(|step| step.id().to_string())
    }

    /// Get a step by ID
    pub fn get_step(&self, step_id: &str) -> Option<Arc<dyn Step>> {
        self.steps.iter().find(|step| step.id() == step_id).cloned()
    }
}

/// Builder for creating pipelines
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            pipeline: Pipeline::new(id),
        }
    }

    pub fn add_step(mut self, step: Arc<dyn Step>) -> Self {
        self.pipeline.add_step(step);
        self
    }

    pub fn build(self) -> Pipeline {
        self.pipeline
    }
}

/// Status of pipeline execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub response: Option<String>,
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Waiting for the user before continuing
    WaitingForInput,
    /// Analysis completed
    Completed,
}
