pub mod severity_check;
pub mod summary;
pub mod text_extract;
pub mod vitals_scan;

pub use severity_check::SeverityCheckTask;
pub use summary::SummaryTask;
pub use text_extract::TextExtractionTask;
pub use vitals_scan::VitalsScanTask;

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use mediassist_core::{AssistError, Result, Summarizer, TextExtractor};
    use std::{sync::Mutex, time::Duration};

    /// Treats the upload as UTF-8 text; `%FAIL` uploads are rejected like a corrupt PDF.
    pub struct PlainTextExtractor;

    impl TextExtractor for PlainTextExtractor {
        fn extract_text(&self, bytes: &[u8]) -> Result<String> {
            if bytes.starts_with(b"%FAIL") {
                return Err(AssistError::Document("trailer not found".to_string()));
            }
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    /// Records every input and answers with a fixed summary, optionally after a delay.
    #[derive(Default)]
    pub struct RecordingSummarizer {
        pub inputs: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl RecordingSummarizer {
        pub fn with_delay(delay: Duration) -> Self {
            Self {
                inputs: Mutex::default(),
                delay: Some(delay),
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.inputs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        fn name(&self) -> &str {
            "recording"
        }

        async fn summarize(&self, text: &str) -> Result<String> {
            self.inputs.lock().unwrap().push(text.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok("Patient has elevated blood pressure.".to_string())
        }
    }

    pub struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        fn name(&self) -> &str {
            "failing"
        }

        async fn summarize(&self, _text: &str) -> Result<String> {
            Err(AssistError::Summarization("model unavailable".to_string()))
        }
    }
}
