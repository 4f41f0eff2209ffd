//! Bot command parsing — the slash-command surface of the bot.

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Timetable,
    Activities,
    Qrcode,
    Ask,
    Weather,
    Suggest,
    Dev,
    Pm,
    Help,
}

impl Command {
    /// Parse a command from message text. Returns `None` for non-command
    /// text and unknown `/` prefixes (which go to the AI provider).
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        if !first.starts_with('/') {
            return None;
        }
        // Strip @botname suffix (e.g. "/help@campus_bot" → "/help").
        let cmd = first.split('@').next().unwrap_or(first);
        match cmd {
            "/timetable" | "/tt" => Some(Self::Timetable),
            "/activities" | "/act" => Some(Self::Activities),
            "/qrcode" | "/qr" => Some(Self::Qrcode),
            "/ask" => Some(Self::Ask),
            "/weather" => Some(Self::Weather),
            "/suggest" => Some(Self::Suggest),
            "/dev" => Some(Self::Dev),
            "/pm" => Some(Self::Pm),
            "/help" | "/start" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Arguments after the command word.
pub fn args(text: &str) -> Vec<&str> {
    text.split_whitespace().skip(1).collect()
}

/// Everything after the command word, whitespace-normalized.
pub fn rest(text: &str) -> String {
    text.split_whitespace().skip(1).collect::<Vec<_>>().join(" ")
}

pub fn help_text() -> String {
    [
        "/timetable <class> [DD/MM/YYYY] - lessons for a class",
        "/activities [DD/MM/YYYY] - school activities for a date",
        "/qrcode <url> [colour] - styled QR code for a link",
        "/weather - 9-day weather forecast",
        "/ask [model] <question> - ask the AI assistant",
        "/suggest <text> - send a suggestion to the developer",
        "/help - this message",
        "",
        "Dates default to today. You can also just mention me in a group,",
        "or message me directly, to ask the AI.",
    ]
    .join("\n")
}
