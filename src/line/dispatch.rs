use crate::line::client::Replier;
use crate::line::types::WebhookEvent;
use crate::reply::ReplySelector;
use futures::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

const CONCURRENCY_LIMIT: usize = 10;

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub received: usize,
    pub replied: usize,
}

/// Routes decoded webhook events, answering text messages through the selector.
#[derive(Clone)]
pub struct EventDispatcher {
    selector: ReplySelector,
    replier: Arc<dyn Replier>,
}
impl EventDispatcher {
    pub fn new(selector: ReplySelector, replier: Arc<dyn Replier>) -> Self {
        Self { selector, replier }
    }

    /// Handles a batch concurrently. Undecodable events are skipped; reply
    /// failures are logged and never escalated.
    pub async fn dispatch(&self, events: Vec<serde_json::Value>) -> DispatchSummary {
        let received = events.len();
        let replied = stream::iter(events.into_iter().enumerate())
            .map(|(idx, raw)| async move {
                match serde_json::from_value::<WebhookEvent>(raw) {
                    Ok(event) => self.handle_event(event).await,
                    Err(e) => {
                        warn!("Skipping undecodable webhook event #{idx}: {e}");
                        false
                    }
                }
            })
            .buffer_unordered(CONCURRENCY_LIMIT)
            .filter(|replied| futures::future::ready(*replied))
            .count()
            .await;

        DispatchSummary { received, replied }
    }

    /// Returns true only if a reply was sent.
    async fn handle_event(&self, event: WebhookEvent) -> bool {
        let inbound = match event {
            WebhookEvent::Message { .. } => match event.into_inbound() {
                Some(inbound) => inbound,
                None => {
                    debug!("Ignoring non-text message event");
                    return false;
                }
            },
            WebhookEvent::Follow => {
                debug!("Ignoring follow event");
                return false;
            }
            WebhookEvent::Unfollow => {
                debug!("Ignoring unfollow event");
                return false;
            }
            WebhookEvent::Postback { postback } => {
                debug!("Ignoring postback event: {}", postback.data);
                return false;
            }
            WebhookEvent::Unsupported => {
                debug!("Ignoring unsupported webhook event type");
                return false;
            }
        };

        let reply = self.selector.select(&inbound.text).await;
        match self.replier.reply(&inbound.reply_token, &reply).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send {} reply: {e:?}", reply.kind());
                false
            }
        }
    }
}
