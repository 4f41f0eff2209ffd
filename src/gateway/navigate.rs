//! View construction and the control transition table.
//!
//! Every view is built fresh from a [`ViewState`]-equivalent set of
//! arguments; the controls bound to it carry everything needed to build
//! the next view. Nothing is remembered between activations, so stale
//! controls on old messages keep working and multiple live copies of a
//! view never interfere.

use super::render;
use campus_core::{
    dates::DayDate,
    error::CampusError,
    message::OutgoingMessage,
    traits::{ActivitySource, QrRenderer, ScheduleSource},
    viewstate::{Control, ControlSet, ControlToken, QrStyle},
};
use std::sync::Arc;

/// Class buttons per keyboard row.
const CLASS_ROW_WIDTH: usize = 5;

/// What the dispatcher should do with a freshly built view.
pub enum Action {
    /// Post as a new message.
    Post(OutgoingMessage),
    /// Replace the hosting message in place.
    Edit(OutgoingMessage),
}

/// Builds views and resolves control activations.
pub struct Navigator {
    schedule: Arc<dyn ScheduleSource>,
    activities: Arc<dyn ActivitySource>,
    qr: Arc<dyn QrRenderer>,
}

impl Navigator {
    pub fn new(
        schedule: Arc<dyn ScheduleSource>,
        activities: Arc<dyn ActivitySource>,
        qr: Arc<dyn QrRenderer>,
    ) -> Self {
        Self {
            schedule,
            activities,
            qr,
        }
    }

    fn timetable_controls(&self, class: &str, date: DayDate) -> ControlSet {
        let mut set = ControlSet::default().row(vec![
            Control::new(
                "⬅️ Previous day",
                &ControlToken::TimetableShift {
                    class: class.to_string(),
                    date,
                    delta: -1,
                },
            ),
            Control::new(
                "Next day ➡️",
                &ControlToken::TimetableShift {
                    class: class.to_string(),
                    date,
                    delta: 1,
                },
            ),
        ]);

        for chunk in self.schedule.classes().chunks(CLASS_ROW_WIDTH) {
            let row = chunk
                .iter()
                .map(|c| {
                    Control::new(
                        c.clone(),
                        &ControlToken::TimetableClass {
                            class: c.clone(),
                            date,
                        },
                    )
                })
                .collect();
            set = set.row(row);
        }

        set.row(vec![Control::new(
            "📅 Activities on this day",
            &ControlToken::TimetableActivities { date },
        )])
    }

    fn activities_controls(date: DayDate) -> ControlSet {
        ControlSet::default().row(vec![
            Control::new(
                "⬅️ Previous day",
                &ControlToken::ActivitiesShift { date, delta: -1 },
            ),
            Control::new(
                "Next day ➡️",
                &ControlToken::ActivitiesShift { date, delta: 1 },
            ),
        ])
    }

    fn qr_controls() -> ControlSet {
        ControlSet::default().row(
            QrStyle::ALL
                .iter()
                .map(|s| Control::new(s.label(), &ControlToken::QrStyle { style: *s }))
                .collect(),
        )
    }

    /// Build the timetable view for a class and date. Collaborator
    /// failures render as error payloads with the navigation controls
    /// still attached, so the user can steer away from a bad date.
    pub async fn open_timetable(&self, target: &str, class: &str, date: DayDate) -> OutgoingMessage {
        let payload = match self.schedule.timetable(class, date).await {
            Ok(day) => render::render_timetable(class, date, &day),
            Err(e) => render::describe_error(&e),
        };
        OutgoingMessage {
            target: target.to_string(),
            payload,
            controls: Some(self.timetable_controls(class, date)),
        }
    }

    /// Build the activities view for a date.
    pub async fn open_activities(&self, target: &str, date: DayDate) -> OutgoingMessage {
        let payload = match self.activities.activities(date).await {
            Ok(set) => render::render_activities(date, &set),
            Err(e) => render::describe_error(&e),
        };
        OutgoingMessage {
            target: target.to_string(),
            payload,
            controls: Some(Self::activities_controls(date)),
        }
    }

    /// Build the QR view. A bad URL or colour fails before any image
    /// work, with nothing to attach controls to.
    pub fn open_qr(
        &self,
        target: &str,
        url: &str,
        style: QrStyle,
        color: Option<&str>,
    ) -> Result<OutgoingMessage, CampusError> {
        let png = self.qr.render(url, style, color)?;
        Ok(OutgoingMessage {
            target: target.to_string(),
            payload: render::render_qr(url, style, color, png),
            controls: Some(Self::qr_controls()),
        })
    }

    /// Resolve a control activation into its next view.
    ///
    /// `host_text` is the hosting message's text or caption; only the
    /// QR style switch needs it (the URL and colour live there, since
    /// callback data is too small to carry them).
    pub async fn activate(
        &self,
        target: &str,
        token: &ControlToken,
        host_text: Option<&str>,
    ) -> Result<Action, CampusError> {
        match token {
            ControlToken::TimetableShift { class, date, delta } => Ok(Action::Edit(
                self.open_timetable(target, class, date.shift(*delta)).await,
            )),
            ControlToken::TimetableClass { class, date } => {
                Ok(Action::Edit(self.open_timetable(target, class, *date).await))
            }
            ControlToken::TimetableActivities { date } => {
                Ok(Action::Post(self.open_activities(target, *date).await))
            }
            ControlToken::ActivitiesShift { date, delta } => Ok(Action::Edit(
                self.open_activities(target, date.shift(*delta)).await,
            )),
            ControlToken::QrStyle { style } => {
                let caption = host_text.ok_or_else(|| {
                    CampusError::Format("This QR code has lost its caption.".to_string())
                })?;
                let (url, color) = render::parse_qr_caption(caption).ok_or_else(|| {
                    CampusError::Format("This QR code has lost its caption.".to_string())
                })?;
                let msg = self.open_qr(target, &url, *style, color.as_deref())?;
                Ok(Action::Edit(msg))
            }
        }
    }
}
