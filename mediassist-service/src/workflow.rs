use crate::tasks::*;
use mediassist_core::{
    FlowRunner, Pipeline, PipelineBuilder, ReportSession, SessionStorage, Summarizer,
    TextExtractor,
};
use std::sync::Arc;

pub fn build_report_pipeline(
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<dyn Summarizer>,
) -> Pipeline {
    PipelineBuilder::new("report_analysis")
        .add_step(Arc::new(TextExtractionTask::new(extractor)))
        .add_step(Arc::new(VitalsScanTask))
        .add_step(Arc::new(SeverityCheckTask))
        .add_step(Arc::new(SummaryTask::new(summarizer)))
        .build()
}

/// New session positioned at text extraction, holding the uploaded document.
pub fn create_report_session(file_name: Option<String>, bytes: Vec<u8>) -> ReportSession {
    let start_step_id = std::any::type_name::<TextExtractionTask>();
    ReportSession::new(start_step_id).with_document(file_name, bytes)
}

pub fn create_flow_runner(
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<dyn Summarizer>,
    session_storage: Arc<dyn SessionStorage>,
) -> FlowRunner {
    let pipeline = Arc::new(build_report_pipeline(extractor, summarizer));
    FlowRunner::new(pipeline, session_storage)
}

/// Whether the session is parked on the summary step.
pub fn is_summary_step(step_id: &str) -> bool {
    step_id == SummaryTask::step_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::test_support::{PlainTextExtractor, RecordingSummarizer};
    use mediassist_core::{Alert, ExecutionStatus, InMemorySessionStorage, VitalSign};

    #[test]
    fn pipeline_starts_with_text_extraction() {
        let pipeline = build_report_pipeline(
            Arc::new(PlainTextExtractor),
            Arc::new(RecordingSummarizer::default()),
        );
        let session = create_report_session(None, Vec::new());
        assert_eq!(pipeline.start_step_id(), Some(session.current_step_id));
    }

    #[tokio::test]
    async fn upload_then_summary_request() {
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        let summarizer = Arc::new(RecordingSummarizer::default());
        let runner = create_flow_runner(
            Arc::new(PlainTextExtractor),
            summarizer.clone(),
            storage.clone(),
        );

        let session = create_report_session(
            Some("report.pdf".to_string()),
            b"Blood Pressure: 150/95\nPulse: 72\nTemp 98.6".to_vec(),
        );
        let session_id = session.id.clone();
        storage.save(session).await.unwrap();

        let result = runner.run(&session_id).await.unwrap();
        assert_eq!(result.status, ExecutionStatus::WaitingForInput);

        let analyzed = storage.get(&session_id).await.unwrap().unwrap();
        assert!(is_summary_step(&analyzed.current_step_id));
        assert_eq!(
            analyzed.vitals.as_ref().unwrap().get(VitalSign::BloodPressure),
            Some("150/95")
        );
        assert_eq!(analyzed.alerts, Some(vec![Alert::HighBloodPressure]));
        assert!(analyzed.summary.is_none());
        assert!(summarizer.calls().is_empty());

        let mut requested = analyzed;
        requested.summary_requested = true;
        storage.save(requested).await.unwrap();

        let result = runner.run(&session_id).await.unwrap();
        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(
            result.response.as_deref(),
            Some("Patient has elevated blood pressure.")
        );
        assert_eq!(
            summarizer.calls(),
            vec!["Blood Pressure: 150/95 Pulse: 72 Temp 98.6".to_string()]
        );
    }
}
