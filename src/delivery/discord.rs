use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tracing::debug;

use super::{DeliveryContext, DeliveryError, DeliverySink, ThreadCreationError};
use crate::state::Context;

/// Map a serenity error onto the two cases routing cares about.
pub fn classify_error(e: serenity::Error) -> DeliveryError {
    if let serenity::Error::Http(http) = &e {
        if http.status_code().map(|s| s.as_u16()) == Some(403) {
            return DeliveryError::Permission(e.to_string());
        }
    }
    DeliveryError::Api(e.to_string())
}

pub fn is_thread_kind(kind: serenity::ChannelType) -> bool {
    matches!(
        kind,
        serenity::ChannelType::PublicThread
            | serenity::ChannelType::PrivateThread
            | serenity::ChannelType::NewsThread
    )
}

/// Channels that accept "start thread from message".
fn supports_threads(kind: serenity::ChannelType) -> bool {
    matches!(
        kind,
        serenity::ChannelType::Text | serenity::ChannelType::News
    )
}

/// Inspect the channel a question arrived in.
pub async fn delivery_context(
    ctx: &serenity::Context,
    channel_id: serenity::ChannelId,
    guild_id: Option<serenity::GuildId>,
) -> DeliveryContext {
    if guild_id.is_none() {
        return DeliveryContext::default();
    }

    let kind = match channel_id.to_channel(ctx).await {
        Ok(serenity::Channel::Guild(channel)) => Some(channel.kind),
        Ok(_) => None,
        Err(e) => {
            debug!(%channel_id, error = %e, "Could not fetch channel, assuming plain channel");
            None
        }
    };

    DeliveryContext {
        is_already_in_thread: kind.is_some_and(is_thread_kind),
        has_parent_guild: true,
        can_create_thread: kind.is_some_and(supports_threads),
    }
}

async fn thread_from_message(
    http: &serenity::Http,
    from: &serenity::Message,
    title: &str,
) -> Result<serenity::GuildChannel, ThreadCreationError> {
    from.channel_id
        .create_thread_from_message(http, from.id, serenity::CreateThread::new(title))
        .await
        .map_err(|e| ThreadCreationError(classify_error(e)))
}

/// Plain channel sends, used for message-triggered questions and for slash
/// commands whose interaction already expired.
pub struct ChannelSink {
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
}

impl ChannelSink {
    pub fn new(http: Arc<serenity::Http>, channel_id: serenity::ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl DeliverySink for ChannelSink {
    type Message = serenity::Message;
    type Thread = serenity::GuildChannel;

    async fn send_to_channel(&self, text: &str) -> Result<serenity::Message, DeliveryError> {
        self.channel_id
            .say(self.http.as_ref(), text)
            .await
            .map_err(classify_error)
    }

    async fn create_thread(
        &self,
        from: &serenity::Message,
        title: &str,
    ) -> Result<serenity::GuildChannel, ThreadCreationError> {
        thread_from_message(&self.http, from, title).await
    }

    async fn send_to_thread(
        &self,
        thread: &serenity::GuildChannel,
        text: &str,
    ) -> Result<(), DeliveryError> {
        thread
            .id
            .say(self.http.as_ref(), text)
            .await
            .map(|_| ())
            .map_err(classify_error)
    }
}

/// Sends through the command reply, so channel messages go out as
/// interaction follow-ups (no Send Messages permission needed).
pub struct ReplySink<'a> {
    ctx: Context<'a>,
}

impl<'a> ReplySink<'a> {
    pub fn new(ctx: Context<'a>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl DeliverySink for ReplySink<'_> {
    type Message = serenity::Message;
    type Thread = serenity::GuildChannel;

    async fn send_to_channel(&self, text: &str) -> Result<serenity::Message, DeliveryError> {
        let handle = self.ctx.say(text).await.map_err(classify_error)?;
        handle.into_message().await.map_err(classify_error)
    }

    async fn create_thread(
        &self,
        from: &serenity::Message,
        title: &str,
    ) -> Result<serenity::GuildChannel, ThreadCreationError> {
        thread_from_message(self.ctx.http(), from, title).await
    }

    async fn send_to_thread(
        &self,
        thread: &serenity::GuildChannel,
        text: &str,
    ) -> Result<(), DeliveryError> {
        thread
            .id
            .say(self.ctx.http(), text)
            .await
            .map(|_| ())
            .map_err(classify_error)
    }
}
