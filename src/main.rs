use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions, PrefixFrameworkOptions};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use counselor_bot::{commands, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::from_env()?;
    let token = settings
        .discord_token
        .clone()
        .context("DISCORD_TOKEN required")?;
    let guild_id = settings.guild_id.map(serenity::GuildId::new);
    let prefix = settings.command_prefix.clone();

    let app_state = AppState::new(settings)?;
    info!(
        provider = %app_state.provider.kind(),
        first_limit = app_state.settings.limits.first,
        chunk_limit = app_state.settings.limits.subsequent,
        citation_mode = ?app_state.settings.citation_mode,
        "AI provider initialized"
    );
    if app_state.settings.llm.api_key.is_none() {
        info!("No API key configured for the provider, requests will be unauthenticated");
    }

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::counselor()],
            prefix_options: PrefixFrameworkOptions {
                prefix: Some(prefix),
                // mentions are handled as questions by the event handler
                mention_as_prefix: false,
                ..Default::default()
            },
            on_error: |err| Box::pin(commands::on_error(err)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(commands::handle_event(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                info!("Registering {} command(s)", commands.len());
                for cmd in commands {
                    info!("  /{}", cmd.name);
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(ctx, commands, gid).await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(ctx, commands).await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Starting counselor Discord bot...");

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
