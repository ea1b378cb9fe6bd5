use crate::answer::Answer;
use crate::config::Settings;
use crate::llm::Provider;

/// Everything a handler needs, injected as poise framework data.
pub struct AppState {
    pub provider: Provider,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let provider = Provider::new(&settings.llm)?;
        Ok(Self { provider, settings })
    }

    /// Format and split an answer with the configured mode and limits.
    pub fn compose(&self, mention: &str, question: &str, answer: &Answer) -> Vec<String> {
        crate::answer::compose(
            mention,
            question,
            answer,
            self.settings.citation_mode,
            self.settings.limits,
        )
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
