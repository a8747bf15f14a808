use async_trait::async_trait;
use mediassist_core::{
    AssistError, NextAction, ReportSession, Result, Step, StepResult, Summarizer,
    summarize_report,
};
use std::sync::Arc;
use tracing::info;

/// Produces the AI summary once the user asks for it.
pub struct SummaryTask {
    summarizer: Arc<dyn Summarizer>,
}

impl SummaryTask {
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self { summarizer }
    }

    pub fn step_id() -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[async_trait]
impl Step for SummaryTask {
    fn id(&self) -> &str {
        Self::step_id()
    }

    async fn run(&self, session: &mut ReportSession) -> Result<StepResult> {
        // A summary already produced for this report is returned as-is
        if let Some(summary) = &session.summary {
            return Ok(StepResult::new(Some(summary.clone()), NextAction::End));
        }

        if !session.summary_requested {
            info!(session_id = %session.id, "Waiting for summary request");
            return Ok(StepResult::new_with_status(
                None,
                NextAction::WaitForInput,
                Some("Report analyzed, AI summary available on request".to_string()),
            ));
        }

        let text = session
            .text
            .as_deref()
            .ok_or_else(|| AssistError::Context("Report text not found in session".to_string()))?;

        info!(
            session_id = %session.id,
            backend = self.summarizer.name(),
            "Summarizing report"
        );

        let summary = summarize_report(self.summarizer.as_ref(), text).await?;
        session.summary = Some(summary.clone());

        info!(session_id = %session.id, "Summary generated");
        Ok(StepResult::new_with_status(
            Some(summary),
            NextAction::End,
            Some("AI summary generated".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::test_support::{FailingSummarizer, RecordingSummarizer};
    use mediassist_core::MAX_SUMMARY_INPUT_CHARS;

    fn analyzed_session(task: &SummaryTask, text: &str) -> ReportSession {
        let mut session = ReportSession::new(task.id());
        session.text = Some(text.to_string());
        session
    }

    #[tokio::test]
    async fn waits_until_requested() {
        let summarizer = Arc::new(RecordingSummarizer::default());
        let task = SummaryTask::new(summarizer.clone());
        let mut session = analyzed_session(&task, "BP: 150/95");

        let result = task.run(&mut session).await.unwrap();

        assert_eq!(result.next_action, NextAction::WaitForInput);
        assert!(session.summary.is_none());
        assert!(summarizer.calls().is_empty());
    }

    #[tokio::test]
    async fn summarizes_only_the_first_1024_characters() {
        let summarizer = Arc::new(RecordingSummarizer::default());
        let task = SummaryTask::new(summarizer.clone());
        let text = format!("{}\n{}", "x".repeat(MAX_SUMMARY_INPUT_CHARS), "never seen");
        let mut session = analyzed_session(&task, &text);
        session.summary_requested = true;

        let result = task.run(&mut session).await.unwrap();

        assert_eq!(result.next_action, NextAction::End);
        let calls = summarizer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].chars().count(), MAX_SUMMARY_INPUT_CHARS);
        assert!(!calls[0].contains("never seen"));
        assert_eq!(
            session.summary.as_deref(),
            Some("Patient has elevated blood pressure.")
        );
    }

    #[tokio::test]
    async fn existing_summary_is_not_regenerated() {
        let summarizer = Arc::new(RecordingSummarizer::default());
        let task = SummaryTask::new(summarizer.clone());
        let mut session = analyzed_session(&task, "BP: 150/95");
        session.summary_requested = true;

        task.run(&mut session).await.unwrap();
        let again = task.run(&mut session).await.unwrap();

        assert_eq!(summarizer.calls().len(), 1);
        assert_eq!(again.response, session.summary);
    }

    #[tokio::test]
    async fn empty_report_is_rejected() {
        let summarizer = Arc::new(RecordingSummarizer::default());
        let task = SummaryTask::new(summarizer.clone());
        let mut session = analyzed_session(&task, " \n ");
        session.summary_requested = true;

        assert!(matches!(
            task.run(&mut session).await,
            Err(AssistError::Summarization(_))
        ));
        assert!(summarizer.calls().is_empty());
    }

    #[tokio::test]
    async fn summarizer_failure_propagates() {
        let task = SummaryTask::new(Arc::new(FailingSummarizer));
        let mut session = analyzed_session(&task, "Heart Rate 55");
        session.summary_requested = true;

        assert!(matches!(
            task.run(&mut session).await,
            Err(AssistError::Summarization(_))
        ));
        assert!(session.summary.is_none());
    }
}
