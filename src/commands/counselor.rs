use tracing::{error, info, warn};

use super::{answer_question, failure_notice};
use crate::delivery::discord::{delivery_context, ChannelSink, ReplySink};
use crate::state::Context;

/// Ask a question to the academic counselor
#[poise::command(slash_command, prefix_command)]
pub async fn counselor(
    ctx: Context<'_>,
    #[description = "Your question"]
    #[rest]
    question: String,
) -> Result<(), anyhow::Error> {
    let question = question.trim();
    if question.is_empty() {
        ctx.say("Please include a question, e.g. `/counselor question: How do I pick a major?`")
            .await?;
        return Ok(());
    }

    // The AI call can take longer than the 3s interaction window.
    let interaction_live = match ctx.defer().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Could not acknowledge command, answering in channel instead");
            false
        }
    };

    info!(
        user = ctx.author().name,
        question,
        guild = ?ctx.guild_id(),
        "Counselor question received"
    );

    let mention = format!("<@{}>", ctx.author().id);
    let delivery_ctx =
        delivery_context(ctx.serenity_context(), ctx.channel_id(), ctx.guild_id()).await;
    let state = ctx.data();

    let result = if interaction_live {
        answer_question(state, &ReplySink::new(ctx), delivery_ctx, &mention, question).await
    } else {
        let sink = ChannelSink::new(ctx.serenity_context().http.clone(), ctx.channel_id());
        answer_question(state, &sink, delivery_ctx, &mention, question).await
    };

    if let Err(e) = result {
        error!(error = %e, "Failed to send answer");
        if interaction_live {
            let reply = poise::CreateReply::default()
                .content(failure_notice(&e))
                .ephemeral(true);
            if let Err(notice_err) = ctx.send(reply).await {
                error!(error = %notice_err, "Failed to send failure notice");
            }
        }
    }

    Ok(())
}
