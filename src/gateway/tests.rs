use super::navigate::{Action, Navigator};
use super::Gateway;
use async_trait::async_trait;
use campus_core::{
    config::{AuthConfig, WeatherConfig},
    dates::DayDate,
    domain::ActivitySet,
    error::CampusError,
    message::{
        ControlActivation, IncomingEvent, IncomingMessage, MessageRef, OutgoingMessage,
    },
    traits::{ActivitySource, Channel, Provider, QrRenderer, ScheduleSource},
};
use campus_data::{qr::StyledQr, schedule::ScheduleStore, weather::WeatherClient};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const TIMETABLE: &str = r#"{
    "1A": {"A": ["English"], "B": ["Math", "Science"]},
    "1B": {"A": [], "B": ["Art"]}
}"#;

const CYCLES: &str = r#"{
    "02/09/2024": "A",
    "03/09/2024": "B",
    "04/09/2024": "/"
}"#;

struct CountingSchedule {
    inner: ScheduleStore,
    calls: AtomicUsize,
}

impl CountingSchedule {
    fn new() -> Self {
        Self {
            inner: ScheduleStore::from_json(TIMETABLE, CYCLES).unwrap(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ScheduleSource for CountingSchedule {
    fn classes(&self) -> Vec<String> {
        self.inner.classes()
    }

    async fn timetable(
        &self,
        class: &str,
        date: DayDate,
    ) -> Result<campus_core::domain::TimetableDay, CampusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.timetable(class, date).await
    }
}

struct FakeActivities {
    calls: AtomicUsize,
}

#[async_trait]
impl ActivitySource for FakeActivities {
    async fn activities(&self, _date: DayDate) -> Result<ActivitySet, CampusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut set = ActivitySet::default();
        set.slots
            .insert("PM".to_string(), vec!["S1: Swimming Gala".to_string()]);
        Ok(set)
    }
}

struct FakeProvider {
    calls: AtomicUsize,
    last_model: Mutex<Option<String>>,
}

#[async_trait]
impl Provider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    async fn complete(&self, prompt: &str, model: Option<&str>) -> Result<String, CampusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_model.lock().unwrap() = model.map(String::from);
        Ok(format!("echo: {prompt}"))
    }

    async fn is_available(&self) -> bool {
        true
    }
}

struct FakeChannel {
    can_post: bool,
    sent: Mutex<Vec<OutgoingMessage>>,
    edits: Mutex<Vec<(MessageRef, OutgoingMessage)>>,
    acks: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeChannel {
    fn new(can_post: bool) -> Self {
        Self {
            can_post,
            sent: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            acks: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Channel for FakeChannel {
    fn name(&self) -> &str {
        "fake"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingEvent>, CampusError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn can_post(&self, _target: &str) -> Result<bool, CampusError> {
        Ok(self.can_post)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), CampusError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn edit(&self, host: &MessageRef, message: OutgoingMessage) -> Result<(), CampusError> {
        self.edits.lock().unwrap().push((host.clone(), message));
        Ok(())
    }

    async fn ack_control(
        &self,
        control_id: &str,
        notice: Option<&str>,
    ) -> Result<(), CampusError> {
        self.acks
            .lock()
            .unwrap()
            .push((control_id.to_string(), notice.map(String::from)));
        Ok(())
    }

    async fn stop(&self) -> Result<(), CampusError> {
        Ok(())
    }
}

struct Harness {
    gateway: Gateway,
    channel: Arc<FakeChannel>,
    schedule: Arc<CountingSchedule>,
    activities: Arc<FakeActivities>,
    provider: Arc<FakeProvider>,
}

fn harness(can_post: bool) -> Harness {
    let channel = Arc::new(FakeChannel::new(can_post));
    let schedule = Arc::new(CountingSchedule::new());
    let activities = Arc::new(FakeActivities {
        calls: AtomicUsize::new(0),
    });
    let provider = Arc::new(FakeProvider {
        calls: AtomicUsize::new(0),
        last_model: Mutex::new(None),
    });

    let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
    channels.insert("fake".to_string(), channel.clone());

    let gateway = Gateway::new(
        provider.clone(),
        channels,
        schedule.clone(),
        activities.clone(),
        Arc::new(StyledQr),
        Arc::new(WeatherClient::new(&WeatherConfig::default())),
        AuthConfig {
            dev_user: "900".to_string(),
        },
        vec!["gpt-4o-mini".to_string(), "deepseek-v3".to_string()],
    );

    Harness {
        gateway,
        channel,
        schedule,
        activities,
        provider,
    }
}

fn message(text: &str) -> IncomingMessage {
    IncomingMessage {
        id: uuid::Uuid::new_v4(),
        channel: "fake".to_string(),
        sender_id: "100".to_string(),
        sender_name: Some("Ada".to_string()),
        text: text.to_string(),
        timestamp: chrono::Utc::now(),
        reply_target: "-5001".to_string(),
        directed: true,
    }
}

fn activation(data: &str, host_text: Option<&str>) -> ControlActivation {
    ControlActivation {
        id: "cb-1".to_string(),
        channel: "fake".to_string(),
        sender_id: "100".to_string(),
        sender_name: Some("Ada".to_string()),
        data: data.to_string(),
        host: MessageRef {
            chat_id: "-5001".to_string(),
            message_id: 7,
        },
        host_text: host_text.map(String::from),
    }
}

#[tokio::test]
async fn test_permission_short_circuit_one_notice_zero_collaborator_calls() {
    let h = harness(false);
    h.gateway
        .handle_message(message("/timetable 1A 03/09/2024"))
        .await;

    assert_eq!(h.schedule.calls.load(Ordering::SeqCst), 0);
    let sent = h.channel.sent.lock().unwrap();
    assert_eq!(sent.len(), 1, "exactly one permission notice");
    assert!(sent[0].payload.is_error);
    assert_eq!(sent[0].target, "100", "notice goes to the sender, not the chat");
}

#[tokio::test]
async fn test_control_permission_denied_alerts_without_fetching() {
    let h = harness(false);
    h.gateway
        .handle_control(activation("as|n|03/09/2024", None))
        .await;

    assert_eq!(h.activities.calls.load(Ordering::SeqCst), 0);
    assert!(h.channel.edits.lock().unwrap().is_empty());
    assert!(h.channel.sent.lock().unwrap().is_empty());
    let acks = h.channel.acks.lock().unwrap();
    assert_eq!(acks.len(), 1);
    assert!(acks[0].1.is_some(), "denial carries an alert text");
}

#[tokio::test]
async fn test_timetable_command_sends_view_with_controls() {
    let h = harness(true);
    h.gateway
        .handle_message(message("/timetable 1A 03/09/2024"))
        .await;

    assert_eq!(h.schedule.calls.load(Ordering::SeqCst), 1);
    let sent = h.channel.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let msg = &sent[0];
    assert!(msg.payload.title.contains("1A"));
    assert!(msg.payload.sections[0].body.contains("Lesson 1: Math"));
    assert!(msg.payload.sections[0].body.contains("Lesson 6: None"));

    let controls = msg.controls.as_ref().unwrap();
    assert!(!controls.is_empty());
    for row in &controls.rows {
        for control in row {
            campus_core::viewstate::ControlToken::parse(&control.data)
                .expect("every control carries a decodable token");
        }
    }
}

#[tokio::test]
async fn test_advance_then_retreat_reproduces_render() {
    let h = harness(true);
    let navigator = Navigator::new(
        h.schedule.clone(),
        h.activities.clone(),
        Arc::new(StyledQr),
    );
    let date = DayDate::parse("03/09/2024").unwrap();
    let base = navigator.open_timetable("-5001", "1A", date).await;

    let forward = navigator
        .activate(
            "-5001",
            &campus_core::viewstate::ControlToken::TimetableShift {
                class: "1A".to_string(),
                date,
                delta: 1,
            },
            None,
        )
        .await
        .unwrap();
    let Action::Edit(_) = &forward else {
        panic!("day shift must edit in place");
    };

    let back = navigator
        .activate(
            "-5001",
            &campus_core::viewstate::ControlToken::TimetableShift {
                class: "1A".to_string(),
                date: date.shift(1),
                delta: -1,
            },
            None,
        )
        .await
        .unwrap();

    let Action::Edit(restored) = back else {
        panic!("day shift must edit in place");
    };
    assert_eq!(restored.payload, base.payload);
    assert_eq!(restored.controls, base.controls);
}

#[tokio::test]
async fn test_activities_shift_edits_in_place() {
    let h = harness(true);
    h.gateway
        .handle_control(activation("as|n|02/09/2024", None))
        .await;

    assert_eq!(h.activities.calls.load(Ordering::SeqCst), 1);
    assert!(h.channel.sent.lock().unwrap().is_empty());
    let edits = h.channel.edits.lock().unwrap();
    assert_eq!(edits.len(), 1);
    assert!(edits[0].1.payload.title.contains("03/09/2024"));

    let acks = h.channel.acks.lock().unwrap();
    assert_eq!(acks.len(), 1);
    assert!(acks[0].1.is_none(), "successful activation acks silently");
}

#[tokio::test]
async fn test_open_activities_control_posts_new_message() {
    let h = harness(true);
    h.gateway
        .handle_control(activation("ta|03/09/2024", None))
        .await;

    assert!(h.channel.edits.lock().unwrap().is_empty());
    let sent = h.channel.sent.lock().unwrap();
    assert_eq!(sent.len(), 1, "activities opens as a fresh message");
    assert!(sent[0].payload.title.contains("School Activities"));
}

#[tokio::test]
async fn test_qr_style_switch_rereads_hosting_caption() {
    let h = harness(true);
    let caption = "QR Code\n\nURL: https://example.com\nStyle: Solid\nColour: default";
    h.gateway
        .handle_control(activation("qs|r", Some(caption)))
        .await;

    let edits = h.channel.edits.lock().unwrap();
    assert_eq!(edits.len(), 1);
    let msg = &edits[0].1;
    assert!(msg.payload.image.is_some());
    assert!(msg.payload.sections[0].body.contains("Radial Gradient"));
    assert!(msg.payload.sections[0].body.contains("URL: https://example.com"));
}

#[tokio::test]
async fn test_qr_style_switch_without_caption_alerts() {
    let h = harness(true);
    h.gateway.handle_control(activation("qs|r", None)).await;

    assert!(h.channel.edits.lock().unwrap().is_empty());
    let acks = h.channel.acks.lock().unwrap();
    assert_eq!(acks.len(), 1);
    assert!(acks[0].1.is_some());
}

#[tokio::test]
async fn test_undecodable_control_data_alerts() {
    let h = harness(true);
    h.gateway
        .handle_control(activation("zz|bogus", None))
        .await;

    let acks = h.channel.acks.lock().unwrap();
    assert_eq!(acks.len(), 1);
    assert!(acks[0].1.is_some());
}

#[tokio::test]
async fn test_directed_text_goes_to_provider() {
    let h = harness(true);
    h.gateway.handle_message(message("what is rust")).await;

    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
    let sent = h.channel.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].payload.sections[0].body.contains("echo: what is rust"));
}

#[tokio::test]
async fn test_ask_model_argument_selects_model() {
    let h = harness(true);
    h.gateway
        .handle_message(message("/ask deepseek-v3 hello there"))
        .await;

    assert_eq!(
        h.provider.last_model.lock().unwrap().as_deref(),
        Some("deepseek-v3")
    );
    let sent = h.channel.sent.lock().unwrap();
    assert!(sent[0].payload.sections[0].body.contains("echo: hello there"));
}

#[tokio::test]
async fn test_ask_without_model_uses_default() {
    let h = harness(true);
    h.gateway.handle_message(message("/ask hello there")).await;

    assert!(h.provider.last_model.lock().unwrap().is_none());
    let sent = h.channel.sent.lock().unwrap();
    assert!(sent[0].payload.sections[0].body.contains("echo: hello there"));
}

#[tokio::test]
async fn test_empty_ask_prompts_without_provider_call() {
    let h = harness(true);
    h.gateway.handle_message(message("/ask")).await;

    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    let sent = h.channel.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
}

#[tokio::test]
async fn test_malformed_date_rejected_before_fetch() {
    let h = harness(true);
    h.gateway
        .handle_message(message("/activities 99/99/2024"))
        .await;

    assert_eq!(h.activities.calls.load(Ordering::SeqCst), 0);
    let sent = h.channel.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].payload.is_error);
}

#[tokio::test]
async fn test_unmapped_date_error_keeps_controls_attached() {
    let h = harness(true);
    h.gateway
        .handle_message(message("/timetable 1A 25/12/2030"))
        .await;

    let sent = h.channel.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].payload.is_error);
    assert!(
        sent[0].controls.is_some(),
        "error views stay navigable"
    );
}

#[tokio::test]
async fn test_no_school_day_renders_as_information() {
    let h = harness(true);
    h.gateway
        .handle_message(message("/timetable 1A 04/09/2024"))
        .await;

    let sent = h.channel.sent.lock().unwrap();
    assert!(!sent[0].payload.is_error);
    assert!(sent[0].payload.sections[0].body.contains("No school"));
}

#[tokio::test]
async fn test_dev_command_gated_on_privileged_user() {
    let h = harness(true);
    h.gateway.handle_message(message("/dev")).await;

    let sent = h.channel.sent.lock().unwrap();
    assert!(sent[0].payload.is_error, "sender 100 is not the developer");
    drop(sent);

    let mut msg = message("/dev");
    msg.sender_id = "900".to_string();
    h.gateway.handle_message(msg).await;

    let sent = h.channel.sent.lock().unwrap();
    assert!(!sent[1].payload.is_error);
    assert!(sent[1].payload.sections[0].body.contains("Uptime"));
}

#[tokio::test]
async fn test_pm_command_delivers_to_named_chat() {
    let h = harness(true);
    let mut msg = message("/pm 4242 exam hall changed");
    msg.sender_id = "900".to_string();
    h.gateway.handle_message(msg).await;

    let sent = h.channel.sent.lock().unwrap();
    assert_eq!(sent.len(), 2, "the PM plus the delivery confirmation");
    assert_eq!(sent[0].target, "4242");
    assert!(sent[0].payload.sections[0].body.contains("exam hall changed"));
}

#[tokio::test]
async fn test_suggest_forwards_to_developer_chat() {
    let h = harness(true);
    h.gateway
        .handle_message(message("/suggest longer lunch breaks"))
        .await;

    let sent = h.channel.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].target, "900");
    assert!(sent[0].payload.sections[0].body.contains("longer lunch breaks"));
    assert!(sent[0].payload.sections[0].heading.contains("100"));
}

#[tokio::test]
async fn test_reselecting_qr_style_is_byte_identical() {
    let h = harness(true);
    let caption = "QR Code\n\nURL: https://example.com\nStyle: Radial Gradient\nColour: default";
    h.gateway
        .handle_control(activation("qs|r", Some(caption)))
        .await;
    h.gateway
        .handle_control(activation("qs|r", Some(caption)))
        .await;

    let edits = h.channel.edits.lock().unwrap();
    assert_eq!(edits.len(), 2);
    assert_eq!(
        edits[0].1.payload.image, edits[1].1.payload.image,
        "same style and caption re-render identical bytes"
    );
}
