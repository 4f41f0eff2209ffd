//! Pure mapping from domain results to render payloads. No I/O.

use campus_core::{
    dates::DayDate,
    domain::{ActivitySet, TimetableDay},
    error::CampusError,
    message::RenderPayload,
    viewstate::QrStyle,
};

pub fn render_timetable(class: &str, date: DayDate, day: &TimetableDay) -> RenderPayload {
    let payload = RenderPayload::new(format!("Timetable for {class} — {date}"));
    match day {
        TimetableDay::Lessons(lessons) => payload.section("Lessons", lessons.join("\n")),
        TimetableDay::NoSchool => payload.section(
            "Lessons",
            "No school on this day. Enjoy the holiday!".to_string(),
        ),
    }
}

pub fn render_activities(date: DayDate, set: &ActivitySet) -> RenderPayload {
    let mut payload = RenderPayload::new(format!("School Activities — {date}"));
    if set.slots.is_empty() {
        payload = payload.section(
            "Activities",
            format!("No activities scheduled on {date}."),
        );
    }
    for (slot, lines) in &set.slots {
        payload = payload.section(slot.clone(), lines.join("\n"));
    }
    if let Some(ref remark) = set.remark {
        payload = payload.section("Remarks", remark.clone());
    }
    if let Some(ref note) = set.note {
        payload = payload.section("Note", note.clone());
    }
    payload
}

/// Caption for a QR message. The style-switch control re-parses this
/// with [`parse_qr_caption`], so the `URL:`/`Colour:` lines are a wire
/// format, not just display text.
pub fn render_qr(url: &str, style: QrStyle, color: Option<&str>, png: Vec<u8>) -> RenderPayload {
    RenderPayload::new("QR Code")
        .section(
            "",
            format!(
                "URL: {url}\nStyle: {}\nColour: {}",
                style.label(),
                color.unwrap_or("default")
            ),
        )
        .with_image(png)
}

/// Recover the URL and colour from a QR message caption.
pub fn parse_qr_caption(caption: &str) -> Option<(String, Option<String>)> {
    let mut url = None;
    let mut color = None;
    for line in caption.lines() {
        if let Some(v) = line.strip_prefix("URL: ") {
            url = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("Colour: ") {
            let v = v.trim();
            color = (v != "default").then(|| v.to_string());
        }
    }
    Some((url?, color))
}

pub fn render_ai(answer: &str) -> RenderPayload {
    RenderPayload::new("").section("", answer.to_string())
}

pub fn render_weather(lines: &[String]) -> RenderPayload {
    RenderPayload::new("9-Day Weather Forecast").section("", lines.join("\n"))
}

/// Map an error to user-facing wording. Remote failures get a generic
/// try-again-later line; auth and rate-limit failures from the AI
/// endpoint are worded distinctly.
pub fn describe_error(err: &CampusError) -> RenderPayload {
    let (title, body) = match err {
        CampusError::Format(msg) | CampusError::NotFound(msg) => ("Campus", msg.clone()),
        CampusError::Fetch(_) => (
            "Campus",
            "The data service is not responding. Please try again later.".to_string(),
        ),
        CampusError::Auth(_) => (
            "AI",
            "The AI service rejected the configured credentials. \
             Please contact the bot developer."
                .to_string(),
        ),
        CampusError::RateLimit(_) => (
            "AI",
            "The AI service is handling too many requests right now. \
             Please try again in a moment."
                .to_string(),
        ),
        CampusError::Provider(_) => (
            "AI",
            "The AI service ran into a problem. Please try again later.".to_string(),
        ),
        CampusError::Permission(msg) => ("Campus", msg.clone()),
        _ => (
            "Campus",
            "Something went wrong. Please try again later.".to_string(),
        ),
    };
    RenderPayload::error(title, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn date(s: &str) -> DayDate {
        DayDate::parse(s).unwrap()
    }

    #[test]
    fn test_render_timetable_lessons() {
        let day = TimetableDay::Lessons(vec![
            "Lesson 1: Math".into(),
            "Lesson 2: None".into(),
        ]);
        let p = render_timetable("1A", date("03/09/2024"), &day);
        assert_eq!(p.title, "Timetable for 1A — 03/09/2024");
        assert_eq!(p.sections.len(), 1);
        assert!(p.sections[0].body.contains("Lesson 2: None"));
        assert!(!p.is_error);
    }

    #[test]
    fn test_render_timetable_no_school_is_not_error() {
        let p = render_timetable("1A", date("04/09/2024"), &TimetableDay::NoSchool);
        assert!(!p.is_error);
        assert!(p.sections[0].body.contains("No school"));
    }

    #[test]
    fn test_render_activities_preserves_slot_order() {
        let mut slots = IndexMap::new();
        slots.insert("PM".to_string(), vec!["S1: Swimming Gala".to_string()]);
        slots.insert("AM".to_string(), vec!["S6: Mock Exam".to_string()]);
        let set = ActivitySet {
            slots,
            remark: Some("Half day".to_string()),
            note: None,
        };
        let p = render_activities(date("03/09/2024"), &set);
        let headings: Vec<&str> = p.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, ["PM", "AM", "Remarks"]);
    }

    #[test]
    fn test_render_activities_empty() {
        let p = render_activities(date("03/09/2024"), &ActivitySet::default());
        assert_eq!(p.sections.len(), 1);
        assert!(p.sections[0]
            .body
            .contains("No activities scheduled on 03/09/2024"));
    }

    #[test]
    fn test_qr_caption_round_trips() {
        let p = render_qr(
            "https://example.com/x",
            QrStyle::Radial,
            Some("#1e90ff"),
            vec![1, 2, 3],
        );
        let body = &p.sections[0].body;
        let (url, color) = parse_qr_caption(body).unwrap();
        assert_eq!(url, "https://example.com/x");
        assert_eq!(color.as_deref(), Some("#1e90ff"));

        let p = render_qr("https://example.com", QrStyle::Solid, None, vec![]);
        let (url, color) = parse_qr_caption(&p.sections[0].body).unwrap();
        assert_eq!(url, "https://example.com");
        assert!(color.is_none());
    }

    #[test]
    fn test_parse_qr_caption_rejects_unrelated_text() {
        assert!(parse_qr_caption("Timetable for 1A").is_none());
        assert!(parse_qr_caption("").is_none());
    }

    #[test]
    fn test_describe_error_wording() {
        let p = describe_error(&CampusError::NotFound("Class 9Z not found.".into()));
        assert!(p.is_error);
        assert_eq!(p.sections[0].body, "Class 9Z not found.");

        let p = describe_error(&CampusError::Fetch("connection refused".into()));
        assert!(p.sections[0].body.contains("try again later"));
        assert!(!p.sections[0].body.contains("connection refused"));

        let auth = describe_error(&CampusError::Auth("401".into()));
        let rate = describe_error(&CampusError::RateLimit("429".into()));
        assert_ne!(auth.sections[0].body, rate.sections[0].body);
    }
}
