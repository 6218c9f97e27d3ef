/// A single inbound text, as handed to the selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub text: String,
    pub reply_token: String,
}

/// Exactly one of these is produced for every inbound text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    PlainText {
        text: String,
    },
    ConfirmationPrompt {
        alt_text: String,
        question: String,
        options: [ConfirmOption; 2],
    },
    Carousel {
        alt_text: String,
        items: Vec<CarouselItem>,
    },
}
impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::PlainText { text: text.into() }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::PlainText { .. } => "text",
            OutboundMessage::ConfirmationPrompt { .. } => "confirm",
            OutboundMessage::Carousel { .. } => "carousel",
        }
    }
}

/// Tapping `label` sends `text` back as the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmOption {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselItem {
    pub image_url: String,
    pub title: String,
    pub body: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenLink { label: String, url: String },
    SendText { label: String, text: String },
}
