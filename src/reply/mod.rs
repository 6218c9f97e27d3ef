mod templates;
pub mod types;

use crate::generation::{GenerationError, TextGenerator};
use crate::reply::types::OutboundMessage;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// LINE rejects text messages longer than this many characters.
pub const MAX_TEXT_LENGTH: usize = 5000;

/// What to answer when the input matches none of the fixed commands.
#[derive(Clone)]
pub enum FallbackPolicy {
    /// Always answer with the same static text.
    Static,

    /// Use the raw input as a prompt, bounded by `timeout`.
    Generate {
        generator: Arc<dyn TextGenerator>,
        timeout: Duration,
    },
}
impl std::fmt::Debug for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackPolicy::Static => f.write_str("Static"),
            FallbackPolicy::Generate { timeout, .. } => f
                .debug_struct("Generate")
                .field("timeout", timeout)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReplySelector {
    fallback: FallbackPolicy,
}
impl ReplySelector {
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self { fallback }
    }

    /// Picks the one reply for an inbound text. Never fails: backend errors
    /// are turned into a plain text reply describing them.
    pub async fn select(&self, text: &str) -> OutboundMessage {
        let command = text.trim().to_lowercase();
        let reply = match command.as_str() {
            "" | "start" => templates::welcome(),
            "confirm" => templates::confirmation(),
            "carousel" => templates::carousel(),
            _ => self.fallback(text).await,
        };

        debug!("Selected {} reply for {:?}", reply.kind(), command);
        reply
    }

    async fn fallback(&self, text: &str) -> OutboundMessage {
        let (generator, timeout) = match &self.fallback {
            FallbackPolicy::Static => return templates::static_fallback(),
            FallbackPolicy::Generate { generator, timeout } => (generator, *timeout),
        };

        let result = match tokio::time::timeout(timeout, generator.generate(text)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(timeout)),
        };

        match result {
            Ok(generated) => OutboundMessage::text(truncate_chars(generated, MAX_TEXT_LENGTH)),
            Err(e) => {
                warn!("Text generation failed: {e}");
                OutboundMessage::text(truncate_chars(e.to_string(), MAX_TEXT_LENGTH))
            }
        }
    }
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text,
    }
}
