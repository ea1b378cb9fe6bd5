mod counselor;
mod events;

pub use counselor::counselor;
pub use events::{classify, handle_event, Trigger};

use tracing::{debug, error};

use crate::delivery::{self, thread_title, Delivery, DeliveryContext, DeliveryError, DeliverySink};
use crate::state::AppState;

const PERMISSION_NOTICE: &str =
    "Sorry, I don't have permission to do that. Please check my permissions.";
const GENERIC_NOTICE: &str = "Sorry, I encountered an error. Please try again.";

/// Ask the provider, format and split the answer, and deliver it.
pub async fn answer_question<S: DeliverySink>(
    state: &AppState,
    sink: &S,
    ctx: DeliveryContext,
    mention: &str,
    question: &str,
) -> Result<Delivery, DeliveryError> {
    let answer = state.provider.ask(question).await;
    let chunks = state.compose(mention, question, &answer);
    debug!(chunks = chunks.len(), ?ctx, "Answer split");
    delivery::deliver(&chunks, ctx, &thread_title(question), sink).await
}

/// User-facing text for a failed first send.
pub fn failure_notice(e: &DeliveryError) -> &'static str {
    match e {
        DeliveryError::Permission(_) => PERMISSION_NOTICE,
        DeliveryError::Api(_) => GENERIC_NOTICE,
    }
}

pub async fn on_error(err: poise::FrameworkError<'_, AppState, anyhow::Error>) {
    match err {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(
                command = %ctx.command().name,
                error = %format!("{:#}", error),
                "Command failed"
            );
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}
