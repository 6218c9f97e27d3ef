use crate::reply::types::{Action, CarouselItem, InboundMessage, OutboundMessage};
use serde::{Deserialize, Serialize};

/// Top level webhook body. Events are kept raw so one bad event can't sink the batch.
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: Option<String>,
    pub events: Vec<serde_json::Value>,
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WebhookEvent {
    #[serde(rename_all = "camelCase")]
    Message {
        reply_token: String,
        message: MessageContent,
    },

    Follow,

    Unfollow,

    Postback {
        postback: PostbackContent,
    },

    #[serde(other)]
    Unsupported,
}
impl WebhookEvent {
    /// Only text messages are answered.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        match self {
            WebhookEvent::Message {
                reply_token,
                message: MessageContent::Text { text },
            } => Some(InboundMessage { text, reply_token }),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageContent {
    Text {
        text: String,
    },

    #[serde(other)]
    Unsupported,
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
pub struct PostbackContent {
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest<'a> {
    pub reply_token: &'a str,
    pub messages: Vec<LineMessage>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LineMessage {
    Text {
        text: String,
    },

    #[serde(rename_all = "camelCase")]
    Template {
        alt_text: String,
        template: LineTemplate,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LineTemplate {
    Confirm {
        text: String,
        actions: Vec<LineAction>,
    },
    Carousel {
        columns: Vec<CarouselColumn>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselColumn {
    pub thumbnail_image_url: String,
    pub title: String,
    pub text: String,
    pub actions: Vec<LineAction>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LineAction {
    Uri { label: String, uri: String },
    Message { label: String, text: String },
}

impl From<&OutboundMessage> for LineMessage {
    fn from(message: &OutboundMessage) -> Self {
        match message {
            OutboundMessage::PlainText { text } => LineMessage::Text { text: text.clone() },
            OutboundMessage::ConfirmationPrompt {
                alt_text,
                question,
                options,
            } => LineMessage::Template {
                alt_text: alt_text.clone(),
                template: LineTemplate::Confirm {
                    text: question.clone(),
                    actions: options
                        .iter()
                        .map(|option| LineAction::Message {
                            label: option.label.clone(),
                            text: option.text.clone(),
                        })
                        .collect(),
                },
            },
            OutboundMessage::Carousel { alt_text, items } => LineMessage::Template {
                alt_text: alt_text.clone(),
                template: LineTemplate::Carousel {
                    columns: items.iter().map(CarouselColumn::from).collect(),
                },
            },
        }
    }
}

impl From<&CarouselItem> for CarouselColumn {
    fn from(item: &CarouselItem) -> Self {
        Self {
            thumbnail_image_url: item.image_url.clone(),
            title: item.title.clone(),
            text: item.body.clone(),
            actions: item.actions.iter().map(LineAction::from).collect(),
        }
    }
}

impl From<&Action> for LineAction {
    fn from(action: &Action) -> Self {
        match action {
            Action::OpenLink { label, url } => LineAction::Uri {
                label: label.clone(),
                uri: url.clone(),
            },
            Action::SendText { label, text } => LineAction::Message {
                label: label.clone(),
                text: text.clone(),
            },
        }
    }
}
