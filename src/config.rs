use anyhow::{bail, Result};

use crate::answer::{ChunkLimits, CitationMode};
use crate::llm::ProviderKind;

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    /// Overrides the provider's default API base URL.
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: Option<String>,
    /// Register commands in this guild only (instant) instead of globally.
    pub guild_id: Option<u64>,
    pub command_prefix: String,
    pub llm: LlmSettings,
    pub limits: ChunkLimits,
    pub citation_mode: CitationMode,
}

impl Settings {
    /// Load `.env` if present, then read settings from the environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider = match var("AI_PROVIDER") {
            Some(name) => match ProviderKind::parse(&name) {
                Some(kind) => kind,
                None => bail!("AI_PROVIDER must be 'perplexity' or 'openai', got '{}'", name),
            },
            None => ProviderKind::default(),
        };
        let api_key = match provider {
            ProviderKind::Perplexity => var("PERPLEXITY_API_KEY"),
            ProviderKind::OpenAi => var("OPENAI_API_KEY"),
        };

        let citation_mode = match var("CITATION_MODE") {
            Some(name) => match CitationMode::parse(&name) {
                Some(mode) => mode,
                None => bail!("CITATION_MODE must be 'domain' or 'strict', got '{}'", name),
            },
            None => CitationMode::default(),
        };

        let defaults = ChunkLimits::default();
        let limits = ChunkLimits {
            first: var("FIRST_CHUNK_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.first),
            subsequent: var("CHUNK_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.subsequent),
        };
        if limits.first == 0 || limits.subsequent == 0 {
            bail!("chunk limits must be positive");
        }
        if limits.first > 2000 || limits.subsequent > 2000 {
            bail!("chunk limits cannot exceed Discord's 2000 character message limit");
        }

        Ok(Self {
            discord_token: var("DISCORD_TOKEN"),
            guild_id: var("DISCORD_GUILD_ID").and_then(|s| s.parse().ok()),
            command_prefix: var("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string()),
            llm: LlmSettings {
                provider,
                api_key,
                base_url: var("LLM_BASE_URL"),
                model: var("LLM_MODEL"),
                timeout_secs: var("LLM_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(120),
            },
            limits,
            citation_mode,
        })
    }
}
