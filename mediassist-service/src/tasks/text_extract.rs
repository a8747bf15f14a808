use async_trait::async_trait;
use mediassist_core::{
    AssistError, NextAction, ReportSession, Result, Step, StepResult, TextExtractor,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Turns the uploaded document into report text.
pub struct TextExtractionTask {
    extractor: Arc<dyn TextExtractor>,
}

impl TextExtractionTask {
    pub fn new(extractor: Arc<dyn TextExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Step for TextExtractionTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, session: &mut ReportSession) -> Result<StepResult> {
        info!(session_id = %session.id, "Starting report text extraction");

        let bytes = session
            .document
            .take()
            .ok_or_else(|| AssistError::Context("Document not found in session".to_string()))?;

        info!(
            session_id = %session.id,
            file_name = session.file_name.as_deref().unwrap_or("<unnamed>"),
            bytes = bytes.len(),
            "Extracting text from document"
        );

        // PDF parsing is CPU bound and may panic on hostile input
        let extractor = self.extractor.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract_text(&bytes))
            .await
            .map_err(|e| AssistError::Document(format!("Document parser crashed: {}", e)))??;

        if text.trim().is_empty() {
            warn!(session_id = %session.id, "No text layer found in document");
        }

        info!(
            session_id = %session.id,
            characters = text.chars().count(),
            "Report text extracted"
        );

        session.text = Some(text);

        Ok(StepResult::new_with_status(
            None,
            NextAction::ContinueAndExecute,
            Some("Report text extracted".to_string()),
        ))
    }
}
