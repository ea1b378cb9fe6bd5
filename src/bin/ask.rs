use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use counselor_bot::answer::ChunkLimits;
use counselor_bot::{AppState, Settings};

#[derive(Parser, Debug)]
#[command(name = "ask")]
#[command(about = "Ask the configured AI provider a question and print the Discord chunks")]
struct Cli {
    /// Question to ask; omit with --interactive
    question: Option<String>,
    /// Keep asking questions until `quit` or `exit`
    #[arg(long, short)]
    interactive: bool,
    /// Only check that the environment is configured
    #[arg(long)]
    check: bool,
    #[arg(long)]
    first_limit: Option<usize>,
    #[arg(long)]
    chunk_limit: Option<usize>,
}

fn masked(secret: Option<&str>) -> String {
    match secret {
        Some(s) => format!("{}...", s.chars().take(5).collect::<String>()),
        None => "<not set>".to_string(),
    }
}

fn check(settings: &Settings) -> Result<()> {
    println!("DISCORD_TOKEN: {}", masked(settings.discord_token.as_deref()));
    println!("AI provider:   {}", settings.llm.provider);
    println!("API key:       {}", masked(settings.llm.api_key.as_deref()));
    println!(
        "Chunk limits:  first {} / then {}",
        settings.limits.first, settings.limits.subsequent
    );
    if settings.discord_token.is_none() || settings.llm.api_key.is_none() {
        bail!("environment is incomplete");
    }
    Ok(())
}

async fn ask_and_print(state: &AppState, question: &str) {
    let answer = state.provider.ask(question).await;
    let chunks = state.compose("@you", question, &answer);
    for (i, chunk) in chunks.iter().enumerate() {
        println!(
            "\n--- chunk {}/{} ({} chars) ---",
            i + 1,
            chunks.len(),
            chunk.chars().count()
        );
        println!("{}", chunk);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;
    settings.limits = ChunkLimits {
        first: cli.first_limit.unwrap_or(settings.limits.first).max(1),
        subsequent: cli.chunk_limit.unwrap_or(settings.limits.subsequent).max(1),
    };

    if cli.check {
        return check(&settings);
    }

    let state = AppState::new(settings)?;

    if let Some(question) = cli.question.as_deref().filter(|q| !q.trim().is_empty()) {
        ask_and_print(&state, question.trim()).await;
        if !cli.interactive {
            return Ok(());
        }
    } else if !cli.interactive {
        bail!("provide a QUESTION or use --interactive");
    }

    println!(
        "\nInteractive mode with {}. Type 'quit' or 'exit' to end.",
        state.provider.kind()
    );
    let stdin = io::stdin();
    loop {
        print!("\nYour question: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.eq_ignore_ascii_case("quit") || question.eq_ignore_ascii_case("exit") {
            println!("Ending conversation. Goodbye!");
            break;
        }
        if question.is_empty() {
            continue;
        }
        ask_and_print(&state, question).await;
    }

    Ok(())
}
