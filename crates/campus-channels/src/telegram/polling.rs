//! Long-polling update loop and Channel trait implementation.

use super::send::{build_markup, format_payload};
use super::types::{TgMessage, TgResponse, TgUpdate};
use super::TelegramChannel;
use async_trait::async_trait;
use campus_core::{
    error::CampusError,
    message::{ControlActivation, IncomingEvent, IncomingMessage, MessageRef, OutgoingMessage},
    traits::Channel,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

fn parse_chat_id(target: &str) -> Result<i64, CampusError> {
    target
        .parse()
        .map_err(|e| CampusError::Channel(format!("invalid telegram chat_id '{target}': {e}")))
}

fn sender_name(user: &super::types::TgUser) -> String {
    if let Some(ref un) = user.username {
        format!("@{un}")
    } else if let Some(ref ln) = user.last_name {
        format!("{} {ln}", user.first_name)
    } else {
        user.first_name.clone()
    }
}

/// Decide whether a message addresses the bot and strip the mention.
///
/// Private chats are always directed. In groups only slash commands
/// and texts mentioning @{username} are; everything else is chatter
/// the bot must stay silent on.
fn direct_text(text: &str, chat_type: &str, bot_username: &str) -> Option<String> {
    let is_group = matches!(chat_type, "group" | "supergroup");
    if !is_group {
        return Some(text.to_string());
    }
    if text.starts_with('/') {
        return Some(text.to_string());
    }
    let mention = format!("@{bot_username}");
    if !bot_username.is_empty() && text.contains(&mention) {
        let stripped = text.replace(&mention, " ");
        let stripped = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
        return Some(stripped);
    }
    None
}

fn incoming_from_message(msg: TgMessage, bot_username: &str) -> Option<IncomingEvent> {
    let text = msg.text?;
    let user = msg.from?;
    let text = direct_text(&text, &msg.chat.chat_type, bot_username)?;

    Some(IncomingEvent::Message(IncomingMessage {
        id: Uuid::new_v4(),
        channel: "telegram".to_string(),
        sender_id: user.id.to_string(),
        sender_name: Some(sender_name(&user)),
        text,
        timestamp: chrono::Utc::now(),
        reply_target: msg.chat.id.to_string(),
        directed: true,
    }))
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingEvent>, CampusError> {
        let identity = self.identity().await?;
        self.register_commands().await;

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let last_update_id = self.last_update_id.clone();
        let bot_username = identity.username.clone();

        info!("Telegram channel starting long polling as @{bot_username}...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let last = last_update_id.lock().await;
                let offset = last.map(|id| id + 1);
                drop(last);

                let mut url = format!("{base_url}/getUpdates?timeout=30");
                if let Some(off) = offset {
                    url.push_str(&format!("&offset={off}"));
                }

                let resp = match client
                    .get(&url)
                    .timeout(std::time::Duration::from_secs(35))
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!("telegram poll error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                let body: TgResponse<Vec<TgUpdate>> = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        error!("telegram parse error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                if !body.ok {
                    error!(
                        "telegram API error (retry in {backoff_secs}s): {}",
                        body.description.unwrap_or_default()
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(60);
                    continue;
                }

                // Successful poll -- reset backoff.
                backoff_secs = 1;

                let updates = body.result.unwrap_or_default();

                if let Some(last_update) = updates.last() {
                    *last_update_id.lock().await = Some(last_update.update_id);
                }

                for update in updates {
                    let event = if let Some(cq) = update.callback_query {
                        let host = match cq.message {
                            Some(ref m) => MessageRef {
                                chat_id: m.chat.id.to_string(),
                                message_id: m.message_id,
                            },
                            // Button on a message too old for Telegram to
                            // include; nothing to re-render.
                            None => {
                                debug!("telegram: callback {} without host message", cq.id);
                                continue;
                            }
                        };
                        let data = match cq.data {
                            Some(d) => d,
                            None => continue,
                        };
                        let host_text = cq
                            .message
                            .as_ref()
                            .and_then(|m| m.caption.clone().or_else(|| m.text.clone()));

                        Some(IncomingEvent::Control(ControlActivation {
                            id: cq.id,
                            channel: "telegram".to_string(),
                            sender_id: cq.from.id.to_string(),
                            sender_name: Some(sender_name(&cq.from)),
                            data,
                            host,
                            host_text,
                        }))
                    } else if let Some(msg) = update.message {
                        incoming_from_message(msg, &bot_username)
                    } else {
                        None
                    };

                    let Some(event) = event else { continue };

                    if tx.send(event).await.is_err() {
                        info!("telegram channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    /// Probe whether the bot may post in a chat. Private chats always
    /// allow posting; groups are decided by the bot's member status.
    async fn can_post(&self, target: &str) -> Result<bool, CampusError> {
        let chat_id = parse_chat_id(target)?;
        if chat_id > 0 {
            return Ok(true);
        }

        let identity = self.identity().await?;
        let member = self.chat_member(chat_id, identity.id).await?;
        let allowed = match member.status.as_str() {
            "creator" | "administrator" | "member" => true,
            "restricted" => member.can_send_messages.unwrap_or(false),
            _ => false,
        };
        Ok(allowed)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), CampusError> {
        let chat_id = parse_chat_id(&message.target)?;
        let html = format_payload(&message.payload);
        let markup = message.controls.as_ref().map(build_markup);

        match message.payload.image {
            Some(ref png) => self.send_photo(chat_id, png, &html, markup.as_ref()).await,
            None => self.send_text(chat_id, &html, markup.as_ref()).await,
        }
    }

    async fn edit(&self, host: &MessageRef, message: OutgoingMessage) -> Result<(), CampusError> {
        let chat_id = parse_chat_id(&host.chat_id)?;
        let html = format_payload(&message.payload);
        let markup = message.controls.as_ref().map(build_markup);

        match message.payload.image {
            Some(ref png) => {
                self.edit_photo(chat_id, host.message_id, png, &html, markup.as_ref())
                    .await
            }
            None => {
                self.edit_text(chat_id, host.message_id, &html, markup.as_ref())
                    .await
            }
        }
    }

    async fn ack_control(
        &self,
        control_id: &str,
        notice: Option<&str>,
    ) -> Result<(), CampusError> {
        self.answer_callback(control_id, notice).await
    }

    async fn send_typing(&self, target: &str) -> Result<(), CampusError> {
        let chat_id = parse_chat_id(target)?;
        self.send_chat_action(chat_id, "typing").await
    }

    async fn stop(&self) -> Result<(), CampusError> {
        info!("Telegram channel stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_text_always_directed() {
        assert_eq!(
            direct_text("hello there", "private", "campusbot").as_deref(),
            Some("hello there")
        );
    }

    #[test]
    fn test_group_chatter_ignored() {
        assert!(direct_text("hello there", "supergroup", "campusbot").is_none());
    }

    #[test]
    fn test_group_command_directed() {
        assert_eq!(
            direct_text("/timetable 1A", "group", "campusbot").as_deref(),
            Some("/timetable 1A")
        );
    }

    #[test]
    fn test_group_mention_stripped() {
        assert_eq!(
            direct_text("@campusbot what is the weather", "supergroup", "campusbot").as_deref(),
            Some("what is the weather")
        );
        assert_eq!(
            direct_text("what is @campusbot saying", "supergroup", "campusbot").as_deref(),
            Some("what is saying")
        );
    }

    #[test]
    fn test_other_mention_not_directed() {
        assert!(direct_text("@otherbot hi", "group", "campusbot").is_none());
    }

    #[test]
    fn test_parse_chat_id_rejects_garbage() {
        assert!(parse_chat_id("not-a-number").is_err());
        assert_eq!(parse_chat_id("-5001").unwrap(), -5001);
    }
}
