use anyhow::{Context, anyhow, bail};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_TTL_SECS: u32 = 3600;
pub const DEFAULT_HF_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";
pub const DEFAULT_HF_MODEL: &str = "facebook/bart-large-cnn";
pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o-mini";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarizerBackend {
    HuggingFace,
    OpenRouter,
}

impl std::str::FromStr for SummarizerBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hf" => Ok(SummarizerBackend::HuggingFace),
            "openrouter" => Ok(SummarizerBackend::OpenRouter),
            other => Err(anyhow!("Unknown summarizer backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub backend: SummarizerBackend,
    pub model: String,
    pub inference_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    /// `None` leaves uploads unbounded.
    pub max_upload_bytes: Option<usize>,
    /// How long an uploaded report is kept before it is evicted.
    pub session_ttl_secs: u32,
    pub summarizer: SummarizerConfig,
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let max_upload_bytes = lookup("MAX_UPLOAD_BYTES")
            .map(|v| {
                v.parse::<usize>()
                    .with_context(|| format!("MAX_UPLOAD_BYTES is not a byte count: {}", v))
            })
            .transpose()?;

        let session_ttl_secs = lookup("SESSION_TTL_SECS")
            .map(|v| {
                v.parse::<u32>()
                    .with_context(|| format!("SESSION_TTL_SECS is not a number of seconds: {}", v))
            })
            .transpose()?
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);

        let backend = lookup("SUMMARIZER_BACKEND")
            .map(|b| b.parse::<SummarizerBackend>())
            .transpose()?
            .unwrap_or(SummarizerBackend::HuggingFace);

        let summarizer = match backend {
            SummarizerBackend::HuggingFace => SummarizerConfig {
                backend,
                model: lookup("SUMMARIZER_MODEL").unwrap_or_else(|| DEFAULT_HF_MODEL.to_string()),
                inference_url: lookup("HF_INFERENCE_URL")
                    .unwrap_or_else(|| DEFAULT_HF_INFERENCE_URL.to_string()),
                api_key: lookup("HF_API_TOKEN").filter(|t| !t.trim().is_empty()),
            },
            SummarizerBackend::OpenRouter => {
                let api_key = lookup("OPENROUTER_API_KEY").filter(|k| !k.trim().is_empty());
                if api_key.is_none() {
                    bail!("OPENROUTER_API_KEY environment variable is required for the openrouter backend");
                }
                SummarizerConfig {
                    backend,
                    model: lookup("SUMMARIZER_MODEL")
                        .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
                    inference_url: String::new(),
                    api_key,
                }
            }
        };

        Ok(Self {
            port,
            max_upload_bytes,
            session_ttl_secs,
            summarizer,
        })
    }
}
