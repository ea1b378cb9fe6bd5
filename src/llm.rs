use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::answer::Answer;
use crate::config::LlmSettings;

const PERPLEXITY_URL: &str = "https://api.perplexity.ai";
const OPENAI_URL: &str = "https://api.openai.com/v1";

const PERPLEXITY_PROMPT: &str = "You are a helpful and empathetic college application counselor. \
Be data-driven and reference sources with numbers [1], [2], etc. \
Focus on strategic approaches and insider tips for college applications. \
Keep responses structured and concise. \
Use bullet points for clarity. \
Give the answer directly, without any preamble or introduction.";

const OPENAI_PROMPT: &str = "You are a helpful and empathetic college application counselor. \
Follow these guidelines when answering student questions:\n\
Do your research, be data driven, cite sources and include hyperlinks to your claims if you can.\n\
• Be strategic – focus on the best approach for success in college applications. \
Think of college hacks or tips that upperclassmen would give.\n\
• Be informative – provide clear, concise, and useful insights.\n\
• Answer in bullet points – keep responses short and easy to read.\n\
• Be succinct but complete – give direct answers without unnecessary details";

const EMPTY_ANSWER: &str = "The AI provider returned an empty response. Please try rephrasing your question.";

/// Which upstream chat-completions API answers questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    Perplexity,
    OpenAi,
}

impl ProviderKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "perplexity" => Some(Self::Perplexity),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Self::Perplexity => PERPLEXITY_URL,
            Self::OpenAi => OPENAI_URL,
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Self::Perplexity => "sonar",
            Self::OpenAi => "gpt-4o",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Perplexity => f.write_str("Perplexity"),
            Self::OpenAi => f.write_str("OpenAI"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: String,
    content: String,
}

impl Message {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_citations: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    citations: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the answer text and citations out of a chat-completions body.
fn parse_response(text: &str) -> Result<Answer> {
    let response: ChatResponse =
        serde_json::from_str(text).context("Failed to parse LLM JSON")?;
    let body = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow!("response has no choices[0].message.content"))?;
    Ok(Answer {
        body,
        citations: response.citations.unwrap_or_default(),
    })
}

/// The configured AI provider. Built once at startup and shared by handlers.
pub struct Provider {
    kind: ProviderKind,
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl Provider {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        let kind = settings.provider;
        Ok(Self {
            kind,
            client,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| kind.default_base_url().to_string()),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| kind.default_model().to_string()),
            api_key: settings.api_key.clone(),
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        }
    }

    fn request<'a>(&'a self, question: &str) -> ChatRequest<'a> {
        match self.kind {
            ProviderKind::Perplexity => ChatRequest {
                model: &self.model,
                messages: vec![
                    Message::new("system", PERPLEXITY_PROMPT),
                    Message::new("user", question),
                ],
                temperature: Some(0.2),
                top_p: Some(0.9),
                max_tokens: Some(1000),
                return_citations: Some(true),
            },
            ProviderKind::OpenAi => ChatRequest {
                model: &self.model,
                messages: vec![
                    Message::new("system", OPENAI_PROMPT),
                    Message::new("user", question),
                ],
                temperature: None,
                top_p: None,
                max_tokens: None,
                return_citations: None,
            },
        }
    }

    async fn try_ask(&self, question: &str) -> Result<Answer> {
        let mut req = self.client.post(self.endpoint()).json(&self.request(question));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.context("LLM request failed")?;
        let resp = resp.error_for_status()?;
        let text = resp.text().await.context("Failed to read LLM response")?;
        let mut answer = parse_response(&text)?;
        if self.kind == ProviderKind::OpenAi {
            answer.citations.clear();
        }
        Ok(answer)
    }

    /// Ask one question. Never fails: upstream errors come back as answer
    /// text so they are delivered like any other answer.
    pub async fn ask(&self, question: &str) -> Answer {
        match self.try_ask(question).await {
            Ok(answer) if answer.body.trim().is_empty() => {
                warn!(provider = %self.kind, "Empty answer from provider");
                Answer::text(EMPTY_ANSWER)
            }
            Ok(answer) => {
                info!(
                    provider = %self.kind,
                    answer_len = answer.body.len(),
                    citations = answer.citations.len(),
                    "Provider answered"
                );
                answer
            }
            Err(e) => {
                warn!(provider = %self.kind, error = %format!("{:#}", e), "Provider call failed");
                failure_answer(self.kind, &e)
            }
        }
    }
}

fn failure_answer(kind: ProviderKind, e: &anyhow::Error) -> Answer {
    Answer::text(format!("Failed to get response from {}: {:#}", kind, e))
}
