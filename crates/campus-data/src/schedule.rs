//! Local timetable dataset keyed by class name and cycle day.
//!
//! Two JSON files back the store: the timetable (class → cycle day →
//! lesson entries) and the cycle calendar (date → cycle-day label,
//! where `/` marks a non-school day).

use async_trait::async_trait;
use campus_core::{
    config::ScheduleConfig,
    dates::DayDate,
    domain::{TimetableDay, LESSON_SLOTS},
    error::CampusError,
    traits::ScheduleSource,
};
use serde::Deserialize;
use std::collections::HashMap;

/// Telegram keyboards get cramped past this; the original bot used the
/// same cap for its dropdown.
const MAX_CLASSES: usize = 25;

/// A lesson entry as it appears in the dataset: either a bare subject
/// string or an object with a `subject` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LessonEntry {
    Rich { subject: String },
    Text(String),
}

impl LessonEntry {
    fn subject(&self) -> &str {
        match self {
            Self::Rich { subject } => subject,
            Self::Text(text) => text,
        }
    }
}

/// In-memory schedule datasets, loaded once at startup and treated as
/// immutable for the lifetime of the process.
pub struct ScheduleStore {
    timetable: HashMap<String, HashMap<String, Vec<LessonEntry>>>,
    cycles: HashMap<String, String>,
}

impl ScheduleStore {
    /// Load both datasets from disk.
    pub fn load(config: &ScheduleConfig) -> Result<Self, CampusError> {
        let timetable = std::fs::read_to_string(&config.timetable_path).map_err(|e| {
            CampusError::Config(format!(
                "failed to read timetable dataset {}: {e}",
                config.timetable_path
            ))
        })?;
        let cycles = std::fs::read_to_string(&config.cycles_path).map_err(|e| {
            CampusError::Config(format!(
                "failed to read cycle calendar {}: {e}",
                config.cycles_path
            ))
        })?;
        Self::from_json(&timetable, &cycles)
    }

    /// Build from raw JSON. Separated from [`ScheduleStore::load`] so the
    /// dataset semantics are testable without touching the filesystem.
    pub fn from_json(timetable: &str, cycles: &str) -> Result<Self, CampusError> {
        let timetable: HashMap<String, HashMap<String, Vec<LessonEntry>>> =
            serde_json::from_str(timetable)
                .map_err(|e| CampusError::Config(format!("invalid timetable dataset: {e}")))?;
        let cycles: HashMap<String, String> = serde_json::from_str(cycles)
            .map_err(|e| CampusError::Config(format!("invalid cycle calendar: {e}")))?;
        Ok(Self { timetable, cycles })
    }
}

/// Normalize dataset entries to exactly [`LESSON_SLOTS`] display lines.
/// Overlong days truncate; sparse days pad with "None".
fn normalize(entries: &[LessonEntry]) -> Vec<String> {
    let mut lessons: Vec<String> = entries
        .iter()
        .take(LESSON_SLOTS)
        .enumerate()
        .map(|(i, entry)| format!("Lesson {}: {}", i + 1, entry.subject()))
        .collect();
    while lessons.len() < LESSON_SLOTS {
        lessons.push(format!("Lesson {}: None", lessons.len() + 1));
    }
    lessons
}

#[async_trait]
impl ScheduleSource for ScheduleStore {
    fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = self.timetable.keys().cloned().collect();
        classes.sort();
        classes.truncate(MAX_CLASSES);
        classes
    }

    async fn timetable(&self, class: &str, date: DayDate) -> Result<TimetableDay, CampusError> {
        let cycle = self.cycles.get(&date.to_string()).ok_or_else(|| {
            CampusError::NotFound(format!("No cycle day recorded for {date}."))
        })?;

        if cycle == "/" {
            return Ok(TimetableDay::NoSchool);
        }

        let class_days = self
            .timetable
            .get(class)
            .ok_or_else(|| CampusError::NotFound(format!("Class {class} not found.")))?;

        let entries = class_days.get(cycle).ok_or_else(|| {
            CampusError::NotFound(format!("Cycle day {cycle} not found for class {class}."))
        })?;

        Ok(TimetableDay::Lessons(normalize(entries)))
    }
}
