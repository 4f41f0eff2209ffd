use crate::viewstate::ControlSet;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One heading/body pair of a rendered message, displayed top-to-bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub body: String,
}

/// A platform-neutral message ready for a channel to format and send.
///
/// Invariant: when `is_error` is true there is exactly one section.
/// Section order is insertion order; channels must not re-sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPayload {
    pub title: String,
    pub sections: Vec<Section>,
    /// PNG attachment (QR codes).
    pub image: Option<Vec<u8>>,
    pub is_error: bool,
}

impl RenderPayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Append a section, preserving order.
    #[must_use]
    pub fn section(mut self, heading: impl Into<String>, body: impl Into<String>) -> Self {
        self.sections.push(Section {
            heading: heading.into(),
            body: body.into(),
        });
        self
    }

    #[must_use]
    pub fn with_image(mut self, png: Vec<u8>) -> Self {
        self.image = Some(png);
        self
    }

    /// An error payload: single section, `is_error` set.
    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: vec![Section {
                heading: "Error".to_string(),
                body: body.into(),
            }],
            image: None,
            is_error: true,
        }
    }
}

/// Points at a concrete message on the platform, for in-place edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    /// Platform chat/channel id.
    pub chat_id: String,
    pub message_id: i64,
}

/// An inbound event from a channel.
#[derive(Debug, Clone)]
pub enum IncomingEvent {
    /// A user message (command or free text).
    Message(IncomingMessage),
    /// A control (button) activation on an existing bot message.
    Control(ControlActivation),
}

/// An incoming text message.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name (e.g. "telegram").
    pub channel: String,
    /// Platform-specific user id.
    pub sender_id: String,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Message text, with any bot mention already stripped.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Platform-specific target for the response (e.g. Telegram chat id).
    pub reply_target: String,
    /// Whether the message addresses the bot (private chat, mention,
    /// or slash command). Undirected group chatter is ignored upstream.
    pub directed: bool,
}

/// A control activation (Telegram callback query).
///
/// Together with the hosting message this is the complete view state:
/// nothing is looked up from server-side sessions.
#[derive(Debug, Clone)]
pub struct ControlActivation {
    /// Platform ack id (Telegram callback query id).
    pub id: String,
    pub channel: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    /// Raw token data carried by the control.
    pub data: String,
    /// The message hosting the control.
    pub host: MessageRef,
    /// Text or caption of the hosting message, if any.
    pub host_text: Option<String>,
}

/// An outbound message: payload plus the controls bound to its view state.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Platform-specific target (e.g. Telegram chat id).
    pub target: String,
    pub payload: RenderPayload,
    pub controls: Option<ControlSet>,
}
