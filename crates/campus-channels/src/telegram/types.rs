//! Telegram Bot API wire types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct TgResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgUpdate {
    pub update_id: i64,
    pub message: Option<TgMessage>,
    pub callback_query: Option<TgCallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgMessage {
    pub message_id: i64,
    pub from: Option<TgUser>,
    pub chat: TgChat,
    pub text: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgChat {
    pub id: i64,
    /// Chat type: "private", "group", "supergroup", or "channel".
    #[serde(default, rename = "type")]
    pub chat_type: String,
}

/// A button press on an inline keyboard.
#[derive(Debug, Deserialize)]
pub(crate) struct TgCallbackQuery {
    pub id: String,
    pub from: TgUser,
    /// The message hosting the pressed button.
    pub message: Option<TgMessage>,
    pub data: Option<String>,
}

/// Subset of ChatMember used for the write-permission probe.
#[derive(Debug, Deserialize)]
pub(crate) struct TgChatMember {
    pub status: String,
    pub can_send_messages: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TgBotCommand {
    pub command: &'static str,
    pub description: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_message_update() {
        let json = r#"{
            "update_id": 42,
            "message": {
                "message_id": 7,
                "from": {"id": 1001, "first_name": "Ada", "username": "ada"},
                "chat": {"id": 1001, "type": "private"},
                "text": "/timetable 1A"
            }
        }"#;
        let update: TgUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.update_id, 42);
        let msg = update.message.unwrap();
        assert_eq!(msg.text.as_deref(), Some("/timetable 1A"));
        assert_eq!(msg.chat.chat_type, "private");
        assert!(update.callback_query.is_none());
    }

    #[test]
    fn test_deserialize_callback_query_update() {
        let json = r#"{
            "update_id": 43,
            "callback_query": {
                "id": "cb-1",
                "from": {"id": 1001, "first_name": "Ada"},
                "message": {
                    "message_id": 7,
                    "chat": {"id": -5001, "type": "supergroup"},
                    "caption": "URL: https://example.com"
                },
                "data": "qs|r"
            }
        }"#;
        let update: TgUpdate = serde_json::from_str(json).unwrap();
        let cq = update.callback_query.unwrap();
        assert_eq!(cq.id, "cb-1");
        assert_eq!(cq.data.as_deref(), Some("qs|r"));
        let host = cq.message.unwrap();
        assert_eq!(host.chat.id, -5001);
        assert_eq!(host.caption.as_deref(), Some("URL: https://example.com"));
    }

    #[test]
    fn test_deserialize_restricted_chat_member() {
        let json = r#"{"status": "restricted", "can_send_messages": false, "user": {"id": 1}}"#;
        let member: TgChatMember = serde_json::from_str(json).unwrap();
        assert_eq!(member.status, "restricted");
        assert_eq!(member.can_send_messages, Some(false));
    }
}
