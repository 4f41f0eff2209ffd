//! View state and the compact tokens embedded in interactive controls.
//!
//! Every interactive control carries a [`ControlToken`] in its callback
//! data. A callback handler rebuilds the whole view from that token and
//! the fixed transition table — never from captured state — so controls
//! stay valid for the lifetime of their message and multiple live
//! instances of a view cannot interfere.

use crate::dates::DayDate;
use crate::error::CampusError;
use std::fmt;

/// QR code colouring style. Closed set; unknown wire codes decode to
/// [`QrStyle::Solid`] (flat colouring) instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrStyle {
    Solid,
    HGradient,
    VGradient,
    Radial,
}

impl QrStyle {
    pub const ALL: [QrStyle; 4] = [
        QrStyle::Solid,
        QrStyle::HGradient,
        QrStyle::VGradient,
        QrStyle::Radial,
    ];

    /// One-byte wire code for callback data.
    pub fn code(self) -> &'static str {
        match self {
            Self::Solid => "s",
            Self::HGradient => "h",
            Self::VGradient => "v",
            Self::Radial => "r",
        }
    }

    /// Decode a wire code; anything unrecognized falls back to flat.
    pub fn from_code(code: &str) -> Self {
        match code {
            "h" => Self::HGradient,
            "v" => Self::VGradient,
            "r" => Self::Radial,
            _ => Self::Solid,
        }
    }

    /// Display name used in captions and pickers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Solid => "Solid",
            Self::HGradient => "Horizontal Gradient",
            Self::VGradient => "Vertical Gradient",
            Self::Radial => "Radial Gradient",
        }
    }

    /// Inverse of [`QrStyle::label`], used when re-reading a caption.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Horizontal Gradient" => Self::HGradient,
            "Vertical Gradient" => Self::VGradient,
            "Radial Gradient" => Self::Radial,
            _ => Self::Solid,
        }
    }
}

impl fmt::Display for QrStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The state a view needs to regenerate its content and controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Timetable {
        class: String,
        date: DayDate,
    },
    Activities {
        date: DayDate,
    },
    Qr {
        url: String,
        style: QrStyle,
        color: Option<String>,
    },
}

/// A control activation decoded from callback data.
///
/// Telegram caps callback data at 64 bytes, so tokens are hand-packed
/// `|`-separated strings. The QR token carries only the style; the URL
/// and colour are recovered from the hosting message caption, which the
/// renderer writes in a fixed format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlToken {
    /// Shift a timetable view by ±1 day.
    TimetableShift {
        class: String,
        date: DayDate,
        delta: i64,
    },
    /// Switch a timetable view to another class, same date.
    TimetableClass { class: String, date: DayDate },
    /// Open the activities view for the timetable's date (new message).
    TimetableActivities { date: DayDate },
    /// Shift an activities view by ±1 day.
    ActivitiesShift { date: DayDate, delta: i64 },
    /// Re-render the hosting QR message with another style.
    QrStyle { style: QrStyle },
}

impl ControlToken {
    /// Pack into callback data. Class names and dates are short, so
    /// every token fits the 64-byte budget.
    pub fn encode(&self) -> String {
        match self {
            Self::TimetableShift { class, date, delta } => {
                let dir = if *delta < 0 { "p" } else { "n" };
                format!("ts|{dir}|{class}|{date}")
            }
            Self::TimetableClass { class, date } => format!("tc|{class}|{date}"),
            Self::TimetableActivities { date } => format!("ta|{date}"),
            Self::ActivitiesShift { date, delta } => {
                let dir = if *delta < 0 { "p" } else { "n" };
                format!("as|{dir}|{date}")
            }
            Self::QrStyle { style } => format!("qs|{}", style.code()),
        }
    }

    /// Decode callback data. Malformed data is a [`CampusError::Format`];
    /// it is surfaced to the user, never a crash.
    pub fn parse(data: &str) -> Result<Self, CampusError> {
        let mut parts = data.split('|');
        let kind = parts.next().unwrap_or_default();
        let bad = || CampusError::Format(format!("unrecognized control data '{data}'"));

        match kind {
            "ts" => {
                let dir = parts.next().ok_or_else(bad)?;
                let class = parts.next().ok_or_else(bad)?.to_string();
                let date = DayDate::parse(parts.next().ok_or_else(bad)?)?;
                let delta = if dir == "p" { -1 } else { 1 };
                Ok(Self::TimetableShift { class, date, delta })
            }
            "tc" => {
                let class = parts.next().ok_or_else(bad)?.to_string();
                let date = DayDate::parse(parts.next().ok_or_else(bad)?)?;
                Ok(Self::TimetableClass { class, date })
            }
            "ta" => {
                let date = DayDate::parse(parts.next().ok_or_else(bad)?)?;
                Ok(Self::TimetableActivities { date })
            }
            "as" => {
                let dir = parts.next().ok_or_else(bad)?;
                let date = DayDate::parse(parts.next().ok_or_else(bad)?)?;
                let delta = if dir == "p" { -1 } else { 1 };
                Ok(Self::ActivitiesShift { date, delta })
            }
            "qs" => {
                let code = parts.next().ok_or_else(bad)?;
                Ok(Self::QrStyle {
                    style: QrStyle::from_code(code),
                })
            }
            _ => Err(bad()),
        }
    }
}

/// A single labelled control bound to a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub data: String,
}

impl Control {
    pub fn new(label: impl Into<String>, token: &ControlToken) -> Self {
        Self {
            label: label.into(),
            data: token.encode(),
        }
    }
}

/// Ordered rows of controls; the channel maps this onto an inline keyboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlSet {
    pub rows: Vec<Vec<Control>>,
}

impl ControlSet {
    pub fn row(mut self, row: Vec<Control>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
