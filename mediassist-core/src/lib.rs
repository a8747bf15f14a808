pub mod document;
pub mod error;
pub mod pipeline;
pub mod runner;
pub mod severity;
pub mod step;
pub mod storage;
pub mod summarizer;
pub mod vitals;

// Re-export commonly used types
pub use document::{PdfTextExtractor, TextExtractor};
pub use error::{AssistError, Result};
pub use pipeline::{ExecutionResult, ExecutionStatus, Pipeline, PipelineBuilder};
pub use runner::FlowRunner;
pub use severity::{Alert, AlertList, classify};
pub use step::{NextAction, Step, StepResult};
pub use storage::{InMemorySessionStorage, ReportSession, SessionStorage};
pub use summarizer::{
    MAX_SUMMARY_INPUT_CHARS, SummaryOptions, Summarizer, prepare_summary_input, summarize_report,
};
pub use vitals::{VITAL_PATTERNS, VitalPattern, VitalSign, VitalsReading, extract_vitals};
