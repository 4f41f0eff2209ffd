//! Event handlers: slash commands, AI queries, and control activations.

use super::navigate::Action;
use super::{render, Gateway};
use crate::commands::{self, Command};
use campus_core::{
    dates::DayDate,
    error::CampusError,
    message::{ControlActivation, IncomingMessage, OutgoingMessage, RenderPayload},
    traits::Channel,
    viewstate::{ControlSet, ControlToken, QrStyle},
};
use std::sync::Arc;
use tracing::{debug, warn};

const NO_POST_NOTICE: &str = "I don't have permission to post in this chat.";

impl Gateway {
    /// Handle an inbound text message. The permission probe runs before
    /// anything else; a denied chat costs no collaborator call.
    pub(super) async fn handle_message(&self, incoming: IncomingMessage) {
        let Some(channel) = self.channels.get(&incoming.channel).cloned() else {
            warn!("message from unknown channel {}", incoming.channel);
            return;
        };
        let target = incoming.reply_target.clone();

        if !matches!(channel.can_post(&target).await, Ok(true)) {
            // Best-effort notice straight to the sender; private chats
            // are always writable.
            debug!("cannot post in {target}, notifying sender");
            let notice = OutgoingMessage {
                target: incoming.sender_id.clone(),
                payload: RenderPayload::error("Campus", NO_POST_NOTICE),
                controls: None,
            };
            if let Err(e) = channel.send(notice).await {
                debug!("permission notice delivery failed: {e}");
            }
            return;
        }

        match Command::parse(&incoming.text) {
            Some(Command::Timetable) => self.cmd_timetable(&channel, &target, &incoming.text).await,
            Some(Command::Activities) => {
                self.cmd_activities(&channel, &target, &incoming.text).await
            }
            Some(Command::Qrcode) => self.cmd_qrcode(&channel, &target, &incoming.text).await,
            Some(Command::Ask) => self.cmd_ask(&channel, &target, &incoming.text).await,
            Some(Command::Weather) => self.cmd_weather(&channel, &target).await,
            Some(Command::Suggest) => self.cmd_suggest(&channel, &incoming).await,
            Some(Command::Dev) => self.cmd_dev(&channel, &incoming).await,
            Some(Command::Pm) => self.cmd_pm(&channel, &incoming).await,
            Some(Command::Help) => {
                self.post(&channel, &target, RenderPayload::new("Campus Bot").section("Commands", commands::help_text()), None)
                    .await;
            }
            None => {
                // Directed non-command text goes to the AI.
                self.ai_query(&channel, &target, &incoming.text, None).await;
            }
        }
    }

    /// Handle a control activation: permission probe, token decode,
    /// transition, ack. Failures surface as ephemeral alerts.
    pub(super) async fn handle_control(&self, act: ControlActivation) {
        let Some(channel) = self.channels.get(&act.channel).cloned() else {
            warn!("control from unknown channel {}", act.channel);
            return;
        };

        if !matches!(channel.can_post(&act.host.chat_id).await, Ok(true)) {
            if let Err(e) = channel.ack_control(&act.id, Some(NO_POST_NOTICE)).await {
                debug!("control ack failed: {e}");
            }
            return;
        }

        let token = match ControlToken::parse(&act.data) {
            Ok(t) => t,
            Err(e) => {
                debug!("undecodable control data '{}': {e}", act.data);
                let _ = channel
                    .ack_control(&act.id, Some("This button is no longer valid."))
                    .await;
                return;
            }
        };

        let outcome = self
            .navigator
            .activate(&act.host.chat_id, &token, act.host_text.as_deref())
            .await;

        match outcome {
            Ok(Action::Edit(msg)) => {
                if let Err(e) = channel.edit(&act.host, msg).await {
                    warn!("in-place edit failed: {e}");
                    let _ = channel
                        .ack_control(&act.id, Some("Could not update this message."))
                        .await;
                    return;
                }
                let _ = channel.ack_control(&act.id, None).await;
            }
            Ok(Action::Post(msg)) => {
                if let Err(e) = channel.send(msg).await {
                    warn!("control post failed: {e}");
                    let _ = channel
                        .ack_control(&act.id, Some("Could not post the new view."))
                        .await;
                    return;
                }
                let _ = channel.ack_control(&act.id, None).await;
            }
            Err(e) => {
                let body = render::describe_error(&e).sections[0].body.clone();
                let _ = channel.ack_control(&act.id, Some(&body)).await;
            }
        }
    }

    async fn cmd_timetable(&self, channel: &Arc<dyn Channel>, target: &str, text: &str) {
        let args = commands::args(text);
        let Some(class) = args.first() else {
            self.post(
                channel,
                target,
                RenderPayload::error("Timetable", "Usage: /timetable <class> [DD/MM/YYYY]"),
                None,
            )
            .await;
            return;
        };
        let date = match args.get(1) {
            Some(raw) => match DayDate::parse(raw) {
                Ok(d) => d,
                Err(e) => {
                    self.send_error(channel, target, &e).await;
                    return;
                }
            },
            None => DayDate::today(),
        };
        let msg = self.navigator.open_timetable(target, class, date).await;
        self.send_outgoing(channel, msg).await;
    }

    async fn cmd_activities(&self, channel: &Arc<dyn Channel>, target: &str, text: &str) {
        let date = match commands::args(text).first() {
            Some(raw) => match DayDate::parse(raw) {
                Ok(d) => d,
                Err(e) => {
                    self.send_error(channel, target, &e).await;
                    return;
                }
            },
            None => DayDate::today(),
        };
        let _ = channel.send_typing(target).await;
        let msg = self.navigator.open_activities(target, date).await;
        self.send_outgoing(channel, msg).await;
    }

    async fn cmd_qrcode(&self, channel: &Arc<dyn Channel>, target: &str, text: &str) {
        let args = commands::args(text);
        let Some(url) = args.first() else {
            self.post(
                channel,
                target,
                RenderPayload::error("QR Code", "Usage: /qrcode <url> [colour]"),
                None,
            )
            .await;
            return;
        };
        let color = args.get(1).copied();
        match self.navigator.open_qr(target, url, QrStyle::Solid, color) {
            Ok(msg) => self.send_outgoing(channel, msg).await,
            Err(e) => self.send_error(channel, target, &e).await,
        }
    }

    async fn cmd_ask(&self, channel: &Arc<dyn Channel>, target: &str, text: &str) {
        let args = commands::args(text);
        // An optional first argument selects one of the configured models.
        let (model, query) = match args.split_first() {
            Some((first, rest)) if self.models.iter().any(|m| m == first) => {
                (Some(first.to_string()), rest.join(" "))
            }
            _ => (None, args.join(" ")),
        };
        self.ai_query(channel, target, &query, model.as_deref()).await;
    }

    async fn cmd_weather(&self, channel: &Arc<dyn Channel>, target: &str) {
        let _ = channel.send_typing(target).await;
        match self.weather.forecast().await {
            Ok(lines) => {
                self.post(channel, target, render::render_weather(&lines), None)
                    .await;
            }
            Err(e) => self.send_error(channel, target, &e).await,
        }
    }

    async fn cmd_suggest(&self, channel: &Arc<dyn Channel>, incoming: &IncomingMessage) {
        let suggestion = commands::rest(&incoming.text);
        if suggestion.is_empty() {
            self.post(
                channel,
                &incoming.reply_target,
                RenderPayload::error("Suggestion", "Usage: /suggest <your idea>"),
                None,
            )
            .await;
            return;
        }
        if self.auth.dev_user.is_empty() {
            self.post(
                channel,
                &incoming.reply_target,
                RenderPayload::error("Suggestion", "Suggestions are not set up on this bot."),
                None,
            )
            .await;
            return;
        }

        let from = incoming
            .sender_name
            .clone()
            .unwrap_or_else(|| incoming.sender_id.clone());
        let forward = RenderPayload::new("Suggestion")
            .section(format!("From {from} ({})", incoming.sender_id), suggestion);
        self.post(channel, &self.auth.dev_user, forward, None).await;
        self.post(
            channel,
            &incoming.reply_target,
            RenderPayload::new("Suggestion").section("", "Thanks! Your suggestion was passed on."),
            None,
        )
        .await;
    }

    async fn cmd_dev(&self, channel: &Arc<dyn Channel>, incoming: &IncomingMessage) {
        if incoming.sender_id != self.auth.dev_user || self.auth.dev_user.is_empty() {
            self.post(
                channel,
                &incoming.reply_target,
                RenderPayload::error("Campus", "This command is for the bot developer."),
                None,
            )
            .await;
            return;
        }

        let uptime = self.uptime.elapsed().as_secs();
        let provider_ok = self.provider.is_available().await;
        let body = format!(
            "Uptime: {}h {}m\nProvider: {} ({})\nChannels: {}",
            uptime / 3600,
            (uptime % 3600) / 60,
            self.provider.name(),
            if provider_ok { "available" } else { "unavailable" },
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
        );
        self.post(
            channel,
            &incoming.reply_target,
            RenderPayload::new("Developer Status").section("", body),
            None,
        )
        .await;
    }

    async fn cmd_pm(&self, channel: &Arc<dyn Channel>, incoming: &IncomingMessage) {
        if incoming.sender_id != self.auth.dev_user || self.auth.dev_user.is_empty() {
            self.post(
                channel,
                &incoming.reply_target,
                RenderPayload::error("Campus", "This command is for the bot developer."),
                None,
            )
            .await;
            return;
        }

        let args = commands::args(&incoming.text);
        let Some(chat_id) = args.first() else {
            self.post(
                channel,
                &incoming.reply_target,
                RenderPayload::error("Campus", "Usage: /pm <chat_id> <text>"),
                None,
            )
            .await;
            return;
        };
        let body = args[1..].join(" ");
        if body.is_empty() {
            self.post(
                channel,
                &incoming.reply_target,
                RenderPayload::error("Campus", "Usage: /pm <chat_id> <text>"),
                None,
            )
            .await;
            return;
        }

        let pm = RenderPayload::new("").section("", body);
        match channel
            .send(OutgoingMessage {
                target: chat_id.to_string(),
                payload: pm,
                controls: None,
            })
            .await
        {
            Ok(()) => {
                self.post(
                    channel,
                    &incoming.reply_target,
                    RenderPayload::new("").section("", format!("Delivered to {chat_id}.")),
                    None,
                )
                .await;
            }
            Err(e) => self.send_error(channel, &incoming.reply_target, &e).await,
        }
    }

    /// Run a query through the AI provider. Empty queries get a
    /// prompt-for-input reply instead of a provider call.
    async fn ai_query(
        &self,
        channel: &Arc<dyn Channel>,
        target: &str,
        query: &str,
        model: Option<&str>,
    ) {
        if query.trim().is_empty() {
            self.post(
                channel,
                target,
                RenderPayload::new("").section("", "What would you like to ask?"),
                None,
            )
            .await;
            return;
        }

        let _ = channel.send_typing(target).await;
        match self.provider.complete(query, model).await {
            Ok(answer) => {
                self.post(channel, target, render::render_ai(&answer), None)
                    .await;
            }
            Err(e) => self.send_error(channel, target, &e).await,
        }
    }

    async fn send_error(&self, channel: &Arc<dyn Channel>, target: &str, err: &CampusError) {
        self.post(channel, target, render::describe_error(err), None)
            .await;
    }

    async fn post(
        &self,
        channel: &Arc<dyn Channel>,
        target: &str,
        payload: RenderPayload,
        controls: Option<ControlSet>,
    ) {
        let msg = OutgoingMessage {
            target: target.to_string(),
            payload,
            controls,
        };
        self.send_outgoing(channel, msg).await;
    }

    async fn send_outgoing(&self, channel: &Arc<dyn Channel>, msg: OutgoingMessage) {
        if let Err(e) = channel.send(msg).await {
            warn!("failed to send message: {e}");
        }
    }
}
