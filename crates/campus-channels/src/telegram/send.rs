//! Outbound Telegram API calls and payload formatting.

use super::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, TgBotCommand, TgChatMember, TgMessage, TgResponse,
    TgUser,
};
use super::{BotIdentity, TelegramChannel};
use campus_core::{
    error::CampusError,
    message::RenderPayload,
    viewstate::ControlSet,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Commands registered with Telegram so clients show a command menu.
const BOT_COMMANDS: &[TgBotCommand] = &[
    TgBotCommand {
        command: "timetable",
        description: "Show the timetable for a class",
    },
    TgBotCommand {
        command: "activities",
        description: "Show school activities for a date",
    },
    TgBotCommand {
        command: "qrcode",
        description: "Generate a styled QR code for a link",
    },
    TgBotCommand {
        command: "weather",
        description: "Show the local weather forecast",
    },
    TgBotCommand {
        command: "ask",
        description: "Ask the AI assistant",
    },
    TgBotCommand {
        command: "suggest",
        description: "Send a suggestion to the developer",
    },
    TgBotCommand {
        command: "help",
        description: "Show available commands",
    },
];

/// Escape text for Telegram HTML parse mode.
pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Format a payload as Telegram HTML: bold title, bold section
/// headings, plain bodies, in insertion order.
pub(crate) fn format_payload(payload: &RenderPayload) -> String {
    let mut out = String::new();
    if !payload.title.is_empty() {
        out.push_str(&format!("<b>{}</b>", escape_html(&payload.title)));
    }
    for section in &payload.sections {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        if !section.heading.is_empty() {
            out.push_str(&format!("<b>{}</b>\n", escape_html(&section.heading)));
        }
        out.push_str(&escape_html(&section.body));
    }
    out
}

/// Map a control set onto a Telegram inline keyboard, row for row.
pub(crate) fn build_markup(controls: &ControlSet) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: controls
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| InlineKeyboardButton {
                        text: c.label.clone(),
                        callback_data: c.data.clone(),
                    })
                    .collect()
            })
            .collect(),
    }
}

impl TelegramChannel {
    /// POST a JSON body to a Bot API method and unwrap the envelope.
    async fn api_post<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
    ) -> Result<T, CampusError> {
        let url = format!("{}/{method}", self.base_url);
        let resp: TgResponse<T> = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| CampusError::Channel(format!("telegram {method} failed: {e}")))?
            .json()
            .await
            .map_err(|e| CampusError::Channel(format!("telegram {method} parse failed: {e}")))?;

        if !resp.ok {
            return Err(CampusError::Channel(format!(
                "telegram {method} rejected: {}",
                resp.description.unwrap_or_default()
            )));
        }
        resp.result
            .ok_or_else(|| CampusError::Channel(format!("telegram {method} returned no result")))
    }

    /// Fetch the bot's own identity, caching it for mention matching.
    pub(crate) async fn identity(&self) -> Result<BotIdentity, CampusError> {
        if let Some(id) = self.identity.get() {
            return Ok(id.clone());
        }
        let me: TgUser = self.api_post("getMe", &json!({})).await?;
        let identity = BotIdentity {
            id: me.id,
            username: me.username.unwrap_or_default(),
        };
        let _ = self.identity.set(identity.clone());
        Ok(identity)
    }

    /// Register the command menu. Failure is non-fatal.
    pub(crate) async fn register_commands(&self) {
        let body = json!({ "commands": BOT_COMMANDS });
        match self.api_post::<bool>("setMyCommands", &body).await {
            Ok(_) => debug!("telegram commands registered"),
            Err(e) => warn!("telegram setMyCommands failed: {e}"),
        }
    }

    pub(crate) async fn send_text(
        &self,
        chat_id: i64,
        html: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), CampusError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": html,
            "parse_mode": "HTML",
        });
        if let Some(m) = markup {
            body["reply_markup"] = serde_json::to_value(m)
                .map_err(|e| CampusError::Channel(format!("telegram markup encode: {e}")))?;
        }
        self.api_post::<TgMessage>("sendMessage", &body).await?;
        Ok(())
    }

    /// Send a PNG with an HTML caption via multipart upload.
    pub(crate) async fn send_photo(
        &self,
        chat_id: i64,
        png: &[u8],
        caption: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), CampusError> {
        let url = format!("{}/sendPhoto", self.base_url);
        let part = reqwest::multipart::Part::bytes(png.to_vec())
            .file_name("qr.png")
            .mime_str("image/png")
            .map_err(|e| CampusError::Channel(format!("telegram photo part: {e}")))?;
        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .text("parse_mode", "HTML")
            .part("photo", part);
        if let Some(m) = markup {
            let encoded = serde_json::to_string(m)
                .map_err(|e| CampusError::Channel(format!("telegram markup encode: {e}")))?;
            form = form.text("reply_markup", encoded);
        }

        let resp: TgResponse<TgMessage> = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CampusError::Channel(format!("telegram sendPhoto failed: {e}")))?
            .json()
            .await
            .map_err(|e| CampusError::Channel(format!("telegram sendPhoto parse failed: {e}")))?;

        if !resp.ok {
            return Err(CampusError::Channel(format!(
                "telegram sendPhoto rejected: {}",
                resp.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    pub(crate) async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        html: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), CampusError> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": html,
            "parse_mode": "HTML",
        });
        if let Some(m) = markup {
            body["reply_markup"] = serde_json::to_value(m)
                .map_err(|e| CampusError::Channel(format!("telegram markup encode: {e}")))?;
        }
        self.api_post::<TgMessage>("editMessageText", &body).await?;
        Ok(())
    }

    /// Replace the photo, caption, and keyboard of an existing message
    /// in place via `editMessageMedia` with an `attach://` upload.
    pub(crate) async fn edit_photo(
        &self,
        chat_id: i64,
        message_id: i64,
        png: &[u8],
        caption: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), CampusError> {
        let url = format!("{}/editMessageMedia", self.base_url);
        let media = json!({
            "type": "photo",
            "media": "attach://qr",
            "caption": caption,
            "parse_mode": "HTML",
        });
        let media_encoded = serde_json::to_string(&media)
            .map_err(|e| CampusError::Channel(format!("telegram media encode: {e}")))?;

        let part = reqwest::multipart::Part::bytes(png.to_vec())
            .file_name("qr.png")
            .mime_str("image/png")
            .map_err(|e| CampusError::Channel(format!("telegram photo part: {e}")))?;
        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("message_id", message_id.to_string())
            .text("media", media_encoded)
            .part("qr", part);
        if let Some(m) = markup {
            let encoded = serde_json::to_string(m)
                .map_err(|e| CampusError::Channel(format!("telegram markup encode: {e}")))?;
            form = form.text("reply_markup", encoded);
        }

        let resp: TgResponse<TgMessage> = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CampusError::Channel(format!("telegram editMessageMedia failed: {e}")))?
            .json()
            .await
            .map_err(|e| {
                CampusError::Channel(format!("telegram editMessageMedia parse failed: {e}"))
            })?;

        if !resp.ok {
            return Err(CampusError::Channel(format!(
                "telegram editMessageMedia rejected: {}",
                resp.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Answer a callback query. With `notice` set, Telegram shows an
    /// alert visible only to the pressing user.
    pub(crate) async fn answer_callback(
        &self,
        callback_id: &str,
        notice: Option<&str>,
    ) -> Result<(), CampusError> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = notice {
            body["text"] = json!(text);
            body["show_alert"] = json!(true);
        }
        self.api_post::<bool>("answerCallbackQuery", &body).await?;
        Ok(())
    }

    pub(crate) async fn chat_member(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<TgChatMember, CampusError> {
        let body = json!({ "chat_id": chat_id, "user_id": user_id });
        self.api_post("getChatMember", &body).await
    }

    pub(crate) async fn send_chat_action(
        &self,
        chat_id: i64,
        action: &str,
    ) -> Result<(), CampusError> {
        let body = json!({ "chat_id": chat_id, "action": action });
        self.api_post::<bool>("sendChatAction", &body).await?;
        Ok(())
    }
}
