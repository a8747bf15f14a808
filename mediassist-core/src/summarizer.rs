use async_trait::async_trait;
use tracing::debug;

use crate::error::{AssistError, Result};

/// Maximum number of characters of report text handed to a summarizer.
pub const MAX_SUMMARY_INPUT_CHARS: usize = 1024;

/// Decoding bounds used for every summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    pub min_length: u32,
    pub max_length: u32,
    pub do_sample: bool,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            min_length: 60,
            max_length: 180,
            do_sample: false,
        }
    }
}

/// Abstractive summarization backend.
///
/// Implementations are built once at startup and shared behind an `Arc`;
/// model loading or client setup belongs in the constructor, not in
/// [`Summarizer::summarize`].
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Summarize already-prepared input (see [`prepare_summary_input`]).
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Flatten line breaks and keep only the first [`MAX_SUMMARY_INPUT_CHARS`]
/// characters. Longer documents are not chunked.
pub fn prepare_summary_input(text: &str) -> String {
    text.replace('\n', " ")
        .chars()
        .take(MAX_SUMMARY_INPUT_CHARS)
        .collect()
}

/// Prepare `text` and hand it to `summarizer`. Text with nothing to summarize is rejected
/// without calling the backend.
pub async fn summarize_report(summarizer: &dyn Summarizer, text: &str) -> Result<String> {
    let input = prepare_summary_input(text);
    if input.trim().is_empty() {
        return Err(AssistError::Summarization(
            "Report contains no text to summarize".to_string(),
        ));
    }

    debug!(
        backend = summarizer.name(),
        characters = input.chars().count(),
        "Sending report to summarizer"
    );
    summarizer.summarize(&input).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoSummarizer {
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        fn name(&self) -> &str {
            "echo"
        }

        async fn summarize(&self, text: &str) -> Result<String> {
            self.inputs.lock().unwrap().push(text.to_string());
            Ok(format!("summary of {} chars", text.chars().count()))
        }
    }

    #[test]
    fn short_text_is_only_flattened() {
        assert_eq!(
            prepare_summary_input("Line one\nLine two"),
            "Line one Line two"
        );
    }

    #[test]
    fn long_text_keeps_first_1024_characters() {
        let text = format!("{}{}", "a".repeat(MAX_SUMMARY_INPUT_CHARS), "TAIL");
        let prepared = prepare_summary_input(&text);
        assert_eq!(prepared.chars().count(), MAX_SUMMARY_INPUT_CHARS);
        assert!(!prepared.contains("TAIL"));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "°".repeat(MAX_SUMMARY_INPUT_CHARS + 10);
        let prepared = prepare_summary_input(&text);
        assert_eq!(prepared.chars().count(), MAX_SUMMARY_INPUT_CHARS);
        assert_eq!(prepared.len(), MAX_SUMMARY_INPUT_CHARS * '°'.len_utf8());
    }

    #[test]
    fn default_options_are_deterministic() {
        let options = SummaryOptions::default();
        assert_eq!((options.min_length, options.max_length), (60, 180));
        assert!(!options.do_sample);
    }

    #[tokio::test]
    async fn blank_report_never_reaches_the_model() {
        let summarizer = EchoSummarizer::default();

        let result = summarize_report(&summarizer, "\n  \n").await;

        assert!(matches!(result, Err(AssistError::Summarization(_))));
        assert!(summarizer.inputs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn report_is_prepared_before_summarizing() {
        let summarizer = EchoSummarizer::default();
        let text = format!("BP: 150/95\n{}", "x".repeat(2000));

        let summary = summarize_report(&summarizer, &text).await.unwrap();

        assert_eq!(summary, "summary of 1024 chars");
        let inputs = summarizer.inputs.lock().unwrap();
        assert!(inputs[0].starts_with("BP: 150/95 x"));
    }
}
