use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("Document could not be read: {0}")]
    Document(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Step not found: {0}")]
    StepNotFound(String),

    #[error("Session state error: {0}")]
    Context(String),
}

pub type Result<T> = std::result::Result<T, AssistError>;
