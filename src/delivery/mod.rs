pub mod discord;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure of a single send.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("missing permission: {0}")]
    Permission(String),
    #[error("platform error: {0}")]
    Api(String),
}

/// Thread could not be created from the first message.
#[derive(Debug, Error)]
#[error("thread creation failed: {0}")]
pub struct ThreadCreationError(#[from] pub DeliveryError);

/// Where the question was asked, as far as routing cares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryContext {
    pub is_already_in_thread: bool,
    pub has_parent_guild: bool,
    pub can_create_thread: bool,
}

/// Where the follow-up chunks ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Everything fit in the first message.
    Single,
    /// Already inside a thread; follow-ups continue there.
    ExistingThread,
    /// A thread was created from the first message.
    NewThread,
    /// Thread creation failed; follow-ups went to the channel.
    ThreadFallback,
    /// No thread possible (DM, or not allowed); follow-ups went to the channel.
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub route: Route,
    pub sent: usize,
    pub failed: usize,
}

/// The platform operations the router needs.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    type Message: Send + Sync;
    type Thread: Send + Sync;

    async fn send_to_channel(&self, text: &str) -> Result<Self::Message, DeliveryError>;

    async fn create_thread(
        &self,
        from: &Self::Message,
        title: &str,
    ) -> Result<Self::Thread, ThreadCreationError>;

    async fn send_to_thread(&self, thread: &Self::Thread, text: &str) -> Result<(), DeliveryError>;
}

const TITLE_MAX_CHARS: usize = 50;

/// Thread name for an answer: `Answer: <question>`, question cut at 50 chars.
pub fn thread_title(question: &str) -> String {
    let question = question.trim();
    let mut title: String = question.chars().take(TITLE_MAX_CHARS).collect();
    if question.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    format!("Answer: {}", title)
}

enum Target<'a, T> {
    Channel,
    Thread(&'a T),
}

async fn send_rest<S: DeliverySink>(
    sink: &S,
    target: Target<'_, S::Thread>,
    rest: &[String],
    delivery: &mut Delivery,
) {
    for (i, chunk) in rest.iter().enumerate() {
        let result = match target {
            Target::Channel => sink.send_to_channel(chunk).await.map(|_| ()),
            Target::Thread(thread) => sink.send_to_thread(thread, chunk).await,
        };
        match result {
            Ok(()) => delivery.sent += 1,
            Err(e) => {
                warn!(chunk = i + 2, error = %e, "Failed to send answer chunk");
                delivery.failed += 1;
            }
        }
    }
}

/// Send `chunks` in order. The first chunk always goes to the channel and its
/// failure is the only error returned; follow-up sends are best effort.
pub async fn deliver<S: DeliverySink>(
    chunks: &[String],
    ctx: DeliveryContext,
    title: &str,
    sink: &S,
) -> Result<Delivery, DeliveryError> {
    let Some((first, rest)) = chunks.split_first() else {
        return Ok(Delivery {
            route: Route::Single,
            sent: 0,
            failed: 0,
        });
    };

    let first_message = sink.send_to_channel(first).await?;
    let mut delivery = Delivery {
        route: Route::Single,
        sent: 1,
        failed: 0,
    };
    if rest.is_empty() {
        return Ok(delivery);
    }

    if ctx.is_already_in_thread {
        delivery.route = Route::ExistingThread;
        send_rest(sink, Target::Channel, rest, &mut delivery).await;
    } else if ctx.has_parent_guild && ctx.can_create_thread {
        match sink.create_thread(&first_message, title).await {
            Ok(thread) => {
                debug!(title, "Created answer thread");
                delivery.route = Route::NewThread;
                send_rest(sink, Target::Thread(&thread), rest, &mut delivery).await;
            }
            Err(e) => {
                warn!(error = %e, "Thread creation failed, sending to channel");
                delivery.route = Route::ThreadFallback;
                send_rest(sink, Target::Channel, rest, &mut delivery).await;
            }
        }
    } else {
        delivery.route = Route::Direct;
        send_rest(sink, Target::Channel, rest, &mut delivery).await;
    }

    info!(
        route = ?delivery.route,
        sent = delivery.sent,
        failed = delivery.failed,
        "Answer delivered"
    );
    Ok(delivery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Sent {
        Channel(String),
        Thread(String, String),
        Created(String),
    }

    #[derive(Default)]
    struct RecordingSink {
        log: Mutex<Vec<Sent>>,
        fail_thread_creation: bool,
        fail_first_send: bool,
        fail_channel_text: Option<String>,
    }

    impl RecordingSink {
        fn log(&self) -> Vec<Sent> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        type Message = String;
        type Thread = String;

        async fn send_to_channel(&self, text: &str) -> Result<String, DeliveryError> {
            let mut log = self.log.lock().unwrap();
            if self.fail_first_send && log.is_empty() {
                return Err(DeliveryError::Permission("Send Messages".to_string()));
            }
            if self.fail_channel_text.as_deref() == Some(text) {
                return Err(DeliveryError::Api("500".to_string()));
            }
            log.push(Sent::Channel(text.to_string()));
            Ok(text.to_string())
        }

        async fn create_thread(
            &self,
            from: &String,
            title: &str,
        ) -> Result<String, ThreadCreationError> {
            if self.fail_thread_creation {
                return Err(DeliveryError::Permission("Create Public Threads".to_string()).into());
            }
            self.log.lock().unwrap().push(Sent::Created(title.to_string()));
            Ok(format!("thread-of-{}", from))
        }

        async fn send_to_thread(&self, thread: &String, text: &str) -> Result<(), DeliveryError> {
            self.log
                .lock()
                .unwrap()
                .push(Sent::Thread(thread.clone(), text.to_string()));
            Ok(())
        }
    }

    fn chunks(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("chunk{}", i)).collect()
    }

    fn guild_ctx() -> DeliveryContext {
        DeliveryContext {
            is_already_in_thread: false,
            has_parent_guild: true,
            can_create_thread: true,
        }
    }

    #[tokio::test]
    async fn test_single_chunk_goes_to_channel() {
        let sink = RecordingSink::default();
        let result = deliver(&chunks(1), guild_ctx(), "Answer: q", &sink).await.unwrap();
        assert_eq!(result.route, Route::Single);
        assert_eq!(sink.log(), vec![Sent::Channel("chunk0".into())]);
    }

    #[tokio::test]
    async fn test_guild_creates_thread_for_rest() {
        let sink = RecordingSink::default();
        let result = deliver(&chunks(3), guild_ctx(), "Answer: q", &sink).await.unwrap();
        assert_eq!(result.route, Route::NewThread);
        assert_eq!(result.sent, 3);
        assert_eq!(
            sink.log(),
            vec![
                Sent::Channel("chunk0".into()),
                Sent::Created("Answer: q".into()),
                Sent::Thread("thread-of-chunk0".into(), "chunk1".into()),
                Sent::Thread("thread-of-chunk0".into(), "chunk2".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_thread_failure_falls_back_to_channel() {
        let sink = RecordingSink {
            fail_thread_creation: true,
            ..Default::default()
        };
        let result = deliver(&chunks(3), guild_ctx(), "Answer: q", &sink).await.unwrap();
        assert_eq!(result.route, Route::ThreadFallback);
        assert_eq!(
            sink.log(),
            vec![
                Sent::Channel("chunk0".into()),
                Sent::Channel("chunk1".into()),
                Sent::Channel("chunk2".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_dm_sends_directly() {
        let sink = RecordingSink::default();
        let ctx = DeliveryContext {
            is_already_in_thread: false,
            has_parent_guild: false,
            can_create_thread: true,
        };
        let result = deliver(&chunks(2), ctx, "Answer: q", &sink).await.unwrap();
        assert_eq!(result.route, Route::Direct);
        assert_eq!(
            sink.log(),
            vec![Sent::Channel("chunk0".into()), Sent::Channel("chunk1".into())]
        );
    }

    #[tokio::test]
    async fn test_guild_without_thread_permission_sends_directly() {
        let sink = RecordingSink::default();
        let ctx = DeliveryContext {
            can_create_thread: false,
            ..guild_ctx()
        };
        let result = deliver(&chunks(2), ctx, "Answer: q", &sink).await.unwrap();
        assert_eq!(result.route, Route::Direct);
        assert!(!sink.log().iter().any(|s| matches!(s, Sent::Created(_))));
    }

    #[tokio::test]
    async fn test_existing_thread_continues_in_place() {
        let sink = RecordingSink::default();
        let ctx = DeliveryContext {
            is_already_in_thread: true,
            ..guild_ctx()
        };
        let result = deliver(&chunks(3), ctx, "Answer: q", &sink).await.unwrap();
        assert_eq!(result.route, Route::ExistingThread);
        assert_eq!(sink.log().len(), 3);
        assert!(sink.log().iter().all(|s| matches!(s, Sent::Channel(_))));
    }

    #[tokio::test]
    async fn test_follow_up_failure_is_best_effort() {
        let sink = RecordingSink {
            fail_channel_text: Some("chunk1".to_string()),
            ..Default::default()
        };
        let ctx = DeliveryContext {
            is_already_in_thread: true,
            ..guild_ctx()
        };
        let result = deliver(&chunks(3), ctx, "Answer: q", &sink).await.unwrap();
        assert_eq!(result.sent, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(
            sink.log(),
            vec![Sent::Channel("chunk0".into()), Sent::Channel("chunk2".into())]
        );
    }

    #[tokio::test]
    async fn test_first_send_failure_is_fatal() {
        let sink = RecordingSink {
            fail_first_send: true,
            ..Default::default()
        };
        let err = deliver(&chunks(3), guild_ctx(), "Answer: q", &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Permission(_)));
        assert!(sink.log().is_empty());
    }

    #[test]
    fn test_thread_title() {
        assert_eq!(thread_title("How do I pick?"), "Answer: How do I pick?");
        let long = "x".repeat(60);
        assert_eq!(thread_title(&long), format!("Answer: {}...", "x".repeat(50)));
        assert_eq!(thread_title(&"y".repeat(50)), format!("Answer: {}", "y".repeat(50)));
    }
}
