use thiserror::Error;

/// Top-level error type for the campus bot.
///
/// A non-school day is deliberately NOT an error — see
/// [`crate::domain::TimetableDay::NoSchool`].
#[derive(Debug, Error)]
pub enum CampusError {
    /// Malformed user input (date, URL, colour). Surfaced immediately,
    /// no collaborator call is attempted.
    #[error("{0}")]
    Format(String),

    /// Valid input, absent data (unknown class, unmapped date).
    #[error("{0}")]
    NotFound(String),

    /// Remote feed failure: timeout, connection, bad status, malformed body.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The AI endpoint rejected our credentials.
    #[error("auth error: {0}")]
    Auth(String),

    /// The AI endpoint is rate limiting us.
    #[error("rate limit: {0}")]
    RateLimit(String),

    /// Any other AI provider failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// The bot lacks write/attach capability in the hosting chat.
    #[error("permission error: {0}")]
    Permission(String),

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
