use poise::serenity_prelude as serenity;
use tracing::{debug, error, info};

use super::{answer_question, failure_notice};
use crate::delivery::discord::{delivery_context, ChannelSink};
use crate::state::AppState;

/// Why a plain message is treated as a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The bot was mentioned and the message ends with `?`.
    Mention,
    /// Any message in a one-to-one channel.
    DirectMessage,
}

const COMMAND_NAME: &str = "counselor";

fn strip_mentions(content: &str, bot_id: u64) -> String {
    content
        .replace(&format!("<@!{}>", bot_id), "")
        .replace(&format!("<@{}>", bot_id), "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `@bot counselor <question>` reads as the command; drop the command name.
fn strip_command_name(question: String) -> String {
    match question.split_once(' ') {
        Some((head, rest)) if head.eq_ignore_ascii_case(COMMAND_NAME) => rest.to_string(),
        _ if question.eq_ignore_ascii_case(COMMAND_NAME) => String::new(),
        _ => question,
    }
}

/// Decide whether a message should be answered, and with what question.
pub fn classify(
    content: &str,
    bot_id: u64,
    mentions_bot: bool,
    is_dm: bool,
    prefix: &str,
) -> Option<(Trigger, String)> {
    let trimmed = content.trim();
    if trimmed.is_empty() || trimmed.starts_with(&format!("{}{}", prefix, COMMAND_NAME)) {
        return None;
    }

    let trigger = if mentions_bot && trimmed.ends_with('?') {
        Trigger::Mention
    } else if is_dm {
        Trigger::DirectMessage
    } else {
        return None;
    };

    let question = strip_command_name(strip_mentions(trimmed, bot_id));
    if question.is_empty() {
        None
    } else {
        Some((trigger, question))
    }
}

pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, AppState, anyhow::Error>,
    data: &AppState,
) -> Result<(), anyhow::Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        if new_message.author.bot {
            return Ok(());
        }
        let bot_id = framework.bot_id;
        let Some((trigger, question)) = classify(
            &new_message.content,
            bot_id.get(),
            new_message.mentions_user_id(bot_id),
            new_message.guild_id.is_none(),
            &data.settings.command_prefix,
        ) else {
            return Ok(());
        };
        handle_question(ctx, new_message, trigger, &question, data).await;
    }
    Ok(())
}

async fn handle_question(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    trigger: Trigger,
    question: &str,
    data: &AppState,
) {
    info!(
        user = msg.author.name,
        ?trigger,
        question,
        "Message question received"
    );

    let typing = msg.channel_id.start_typing(&ctx.http);
    let delivery_ctx = delivery_context(ctx, msg.channel_id, msg.guild_id).await;
    let sink = ChannelSink::new(ctx.http.clone(), msg.channel_id);
    let mention = format!("<@{}>", msg.author.id);
    let result = answer_question(data, &sink, delivery_ctx, &mention, question).await;
    typing.stop();

    if let Err(e) = result {
        error!(error = %e, "Failed to send answer");
        if let Err(notice_err) = msg.channel_id.say(&ctx.http, failure_notice(&e)).await {
            debug!(error = %notice_err, "Failed to send failure notice");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: u64 = 777;

    #[test]
    fn test_mention_with_question_mark() {
        let got = classify("<@777> when are EA deadlines?", BOT, true, false, "!");
        assert_eq!(
            got,
            Some((Trigger::Mention, "when are EA deadlines?".to_string()))
        );
    }

    #[test]
    fn test_nickname_mention_stripped() {
        let got = classify("hey <@!777>   what is FAFSA? ", BOT, true, false, "!");
        assert_eq!(got, Some((Trigger::Mention, "hey what is FAFSA?".to_string())));
    }

    #[test]
    fn test_mention_without_question_ignored() {
        assert_eq!(classify("<@777> thanks!", BOT, true, false, "!"), None);
    }

    #[test]
    fn test_plain_guild_message_ignored() {
        assert_eq!(classify("anyone know the deadline?", BOT, false, false, "!"), None);
    }

    #[test]
    fn test_dm_always_answered() {
        let got = classify("tell me about essays", BOT, false, true, "!");
        assert_eq!(
            got,
            Some((Trigger::DirectMessage, "tell me about essays".to_string()))
        );
    }

    #[test]
    fn test_empty_and_prefix_ignored() {
        assert_eq!(classify("   ", BOT, false, true, "!"), None);
        assert_eq!(classify("<@777> ?", BOT, true, false, "!"), Some((Trigger::Mention, "?".to_string())));
        assert_eq!(classify("<@777>", BOT, true, true, "!"), None);
        assert_eq!(classify("!counselor what now?", BOT, false, true, "!"), None);
        assert_eq!(classify("?counselor what now?", BOT, true, true, "?"), None);
    }

    #[test]
    fn test_mention_with_command_name_answered_once() {
        let got = classify("<@777> counselor what is FAFSA?", BOT, true, false, "!");
        assert_eq!(got, Some((Trigger::Mention, "what is FAFSA?".to_string())));
        assert_eq!(classify("<@777> Counselor", BOT, true, true, "!"), None);
        let got = classify("<@777> counselors help?", BOT, true, false, "!");
        assert_eq!(got, Some((Trigger::Mention, "counselors help?".to_string())));
    }
}
