use anyhow::{Context, Result};
use clap::Parser;
use mediassist_core::{
    PdfTextExtractor, Summarizer, TextExtractor, classify, extract_vitals, summarize_report,
};
use mediassist_service::{ServiceConfig, build_summarizer};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "analyze_report",
    about = "Extract key vitals, severity flags and an optional AI summary from a PDF report"
)]
struct Cli {
    /// PDF report to analyze
    path: PathBuf,
    /// Also summarize the report with the configured backend
    #[arg(long)]
    summarize: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt().with_env_filter("warn").init();

    println!("MediAssist report analysis");
    println!("==========================");
    println!("Processing PDF: {}", cli.path.display());
    println!();

    let bytes = tokio::fs::read(&cli.path)
        .await
        .with_context(|| format!("Failed to read {}", cli.path.display()))?;

    let text = match PdfTextExtractor.extract_text(&bytes) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Failed to extract text: {}", e);
            eprintln!();
            eprintln!("Troubleshooting:");
            eprintln!("   - Check the file is a PDF and is readable");
            eprintln!("   - Scanned PDFs without a text layer yield no text");
            std::process::exit(1);
        }
    };

    println!("Extracted Report Text (first 500 chars):");
    println!("────────────────────────────────────────");
    let preview = if text.chars().count() > 500 {
        let truncated: String = text.chars().take(500).collect();
        format!("{}...", truncated)
    } else {
        text.clone()
    };
    println!("{}", preview);
    println!();

    let vitals = extract_vitals(&text);
    println!("Key Vitals Extracted:");
    println!("─────────────────────");
    if vitals.is_empty() {
        println!("No key vitals detected in this report.");
    } else {
        for (sign, value) in vitals.iter() {
            println!("   {}: {}", sign, value);
        }
    }
    println!();

    let alerts = classify(&vitals);
    println!("Severity Analysis:");
    println!("──────────────────");
    if alerts.is_empty() {
        println!("All vitals appear within normal range.");
    } else {
        for alert in &alerts {
            println!("   ! {}", alert);
        }
    }
    println!();

    if cli.summarize {
        let config = ServiceConfig::from_env()?;
        let summarizer = build_summarizer(&config.summarizer)?;

        if let Err(e) = print_summary(summarizer.as_ref(), &text).await {
            eprintln!("Failed to generate summary: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn print_summary(summarizer: &dyn Summarizer, text: &str) -> Result<()> {
    println!("Summarizing report with {}...", summarizer.name());
    let summary = summarize_report(summarizer, text).await?;

    println!("Summary:");
    println!("────────");
    println!("{}", summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSummarizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Summarizer for CountingSummarizer {
        fn name(&self) -> &str {
            "counting"
        }

        async fn summarize(&self, _text: &str) -> mediassist_core::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("Report summary.".to_string())
        }
    }

    #[test]
    fn parses_path_and_summarize_flag() {
        let cli = Cli::try_parse_from(["analyze_report", "report.pdf", "--summarize"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("report.pdf"));
        assert!(cli.summarize);

        let cli = Cli::try_parse_from(["analyze_report", "report.pdf"]).unwrap();
        assert!(!cli.summarize);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["analyze_report", "report.pdf", "--summary"]).is_err());
        assert!(Cli::try_parse_from(["analyze_report"]).is_err());
    }

    #[tokio::test]
    async fn textless_report_is_not_sent_to_the_model() {
        let summarizer = CountingSummarizer::default();

        assert!(print_summary(&summarizer, "").await.is_err());
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);

        print_summary(&summarizer, "Heart Rate 55").await.unwrap();
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
    }
}
