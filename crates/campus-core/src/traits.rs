use crate::{
    dates::DayDate,
    domain::{ActivitySet, TimetableDay},
    error::CampusError,
    message::{IncomingEvent, MessageRef, OutgoingMessage},
    viewstate::QrStyle,
};
use async_trait::async_trait;

/// AI completion provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider requires an API key to function.
    fn requires_api_key(&self) -> bool;

    /// Complete a single prompt. `model` overrides the configured default.
    async fn complete(&self, prompt: &str, model: Option<&str>) -> Result<String, CampusError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}

/// Messaging channel: receives events, sends and edits styled messages.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening. Returns a receiver that yields incoming events.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingEvent>, CampusError>;

    /// Whether the bot may post in the given chat. Runs before any
    /// data fetch so a denied chat never costs a collaborator call.
    async fn can_post(&self, target: &str) -> Result<bool, CampusError>;

    /// Send a new message.
    async fn send(&self, message: OutgoingMessage) -> Result<(), CampusError>;

    /// Edit an existing message in place, replacing text, attachment,
    /// and controls. Last write wins on concurrent edits.
    async fn edit(&self, host: &MessageRef, message: OutgoingMessage) -> Result<(), CampusError>;

    /// Acknowledge a control activation. `notice` surfaces an
    /// ephemeral alert to the activating user only.
    async fn ack_control(&self, control_id: &str, notice: Option<&str>)
        -> Result<(), CampusError>;

    /// Typing indicator while a slow fetch runs.
    async fn send_typing(&self, _target: &str) -> Result<(), CampusError> {
        Ok(())
    }

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), CampusError>;
}

/// Read-only timetable dataset.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Known class names for the class-switch control (at most 25).
    fn classes(&self) -> Vec<String>;

    /// Lessons for a class on a date, or the no-school outcome.
    async fn timetable(&self, class: &str, date: DayDate) -> Result<TimetableDay, CampusError>;
}

/// Remote activities feed.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Activities for a date, substituting the nearest available date
    /// (with a note) when the exact date is absent from the feed.
    async fn activities(&self, date: DayDate) -> Result<ActivitySet, CampusError>;
}

/// Local QR image synthesis. Pure: identical inputs produce
/// byte-identical PNGs.
pub trait QrRenderer: Send + Sync {
    fn render(
        &self,
        url: &str,
        style: QrStyle,
        color: Option<&str>,
    ) -> Result<Vec<u8>, CampusError>;
}
