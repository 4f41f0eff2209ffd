//! Remote activities feed client and the nearest-date lookup policy.
//!
//! Fetching and lookup are separated: [`lookup`] is a pure function
//! over a parsed [`Feed`], so the substitution policy is testable
//! without a network.

use async_trait::async_trait;
use campus_core::{
    config::ActivitiesConfig, dates::DayDate, domain::ActivitySet, error::CampusError,
    traits::ActivitySource,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const GRADES: [&str; 6] = ["S1", "S2", "S3", "S4", "S5", "S6"];

/// The feed document: rows keyed by unpadded `D/M/YYYY` dates.
#[derive(Debug, Deserialize)]
pub struct Feed {
    pub rows: IndexMap<String, FeedRow>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedRow {
    #[serde(default)]
    pub slots: IndexMap<String, FeedSlot>,
    #[serde(default)]
    pub remark: String,
}

/// One slot ("AM", "PM", ...): per-grade activity lists plus a
/// whole-school bucket.
#[derive(Debug, Default, Deserialize)]
pub struct FeedSlot {
    #[serde(default, rename = "S1")]
    pub s1: Vec<String>,
    #[serde(default, rename = "S2")]
    pub s2: Vec<String>,
    #[serde(default, rename = "S3")]
    pub s3: Vec<String>,
    #[serde(default, rename = "S4")]
    pub s4: Vec<String>,
    #[serde(default, rename = "S5")]
    pub s5: Vec<String>,
    #[serde(default, rename = "S6")]
    pub s6: Vec<String>,
    #[serde(default, rename = "otherActivities")]
    pub other_activities: Vec<String>,
}

impl FeedSlot {
    fn grade(&self, name: &str) -> &[String] {
        match name {
            "S1" => &self.s1,
            "S2" => &self.s2,
            "S3" => &self.s3,
            "S4" => &self.s4,
            "S5" => &self.s5,
            _ => &self.s6,
        }
    }
}

/// Flatten a row's slots to display lines, keeping the feed's slot
/// order and dropping slots with nothing scheduled.
fn flatten_slots(row: &FeedRow) -> IndexMap<String, Vec<String>> {
    let mut slots = IndexMap::new();
    for (slot_name, slot) in &row.slots {
        let mut lines = Vec::new();
        for grade in GRADES {
            for activity in slot.grade(grade) {
                lines.push(format!("{grade}: {activity}"));
            }
        }
        lines.extend(slot.other_activities.iter().cloned());
        if !lines.is_empty() {
            slots.insert(slot_name.clone(), lines);
        }
    }
    slots
}

/// Look up activities for a date, substituting the nearest available
/// date when the exact one is absent.
///
/// Ties in day distance break toward the earlier calendar date — a
/// fixed rule in place of the original's unordered key scan.
pub fn lookup(feed: &Feed, date: DayDate) -> Result<ActivitySet, CampusError> {
    if feed.rows.is_empty() {
        return Err(CampusError::Fetch(
            "activities feed contains no dates".to_string(),
        ));
    }

    if let Some(row) = feed.rows.get(&date.feed_key()) {
        return Ok(ActivitySet {
            slots: flatten_slots(row),
            remark: non_empty(&row.remark),
            note: None,
        });
    }

    let mut nearest: Option<(i64, DayDate, &FeedRow)> = None;
    for (key, row) in &feed.rows {
        let candidate = match DayDate::parse(key) {
            Ok(d) => d,
            Err(_) => {
                warn!("skipping unparseable feed date key '{key}'");
                continue;
            }
        };
        let diff = candidate.days_from(date);
        let better = match nearest {
            None => true,
            Some((best_diff, best_date, _)) => (diff, candidate) < (best_diff, best_date),
        };
        if better {
            nearest = Some((diff, candidate, row));
        }
    }

    let (_, closest, row) = nearest.ok_or_else(|| {
        CampusError::Fetch("activities feed contains no valid dates".to_string())
    })?;

    debug!("substituting {closest} for requested {date}");
    Ok(ActivitySet {
        slots: flatten_slots(row),
        remark: non_empty(&row.remark),
        note: Some(format!(
            "No activities found for {date}. Showing activities for closest date: {closest}"
        )),
    })
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// HTTP client for the activities feed. Fetched fresh per query,
/// never cached.
pub struct ActivitiesClient {
    client: reqwest::Client,
    feed_url: String,
    timeout: Duration,
}

impl ActivitiesClient {
    pub fn new(config: &ActivitiesConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            feed_url: config.feed_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl ActivitySource for ActivitiesClient {
    async fn activities(&self, date: DayDate) -> Result<ActivitySet, CampusError> {
        let resp = self
            .client
            .get(&self.feed_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CampusError::Fetch("activities feed request timed out".to_string())
                } else {
                    CampusError::Fetch(format!("activities feed request failed: {e}"))
                }
            })?;

        if !resp.status().is_success() {
            return Err(CampusError::Fetch(format!(
                "activities feed returned HTTP {}",
                resp.status()
            )));
        }

        let feed: Feed = resp
            .json()
            .await
            .map_err(|e| CampusError::Fetch(format!("invalid activities feed JSON: {e}")))?;

        lookup(&feed, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> DayDate {
        DayDate::parse(s).unwrap()
    }

    fn feed(json: &str) -> Feed {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_exact_date_hit_with_remark() {
        let f = feed(
            r#"{"rows": {"3/9/2024": {
                "slots": {"AM": {"S1": ["Assembly"], "otherActivities": ["Fire drill"]}},
                "remark": "Bring raincoats"
            }}}"#,
        );
        let set = lookup(&f, date("03/09/2024")).unwrap();
        assert!(set.note.is_none());
        assert_eq!(set.remark.as_deref(), Some("Bring raincoats"));
        assert_eq!(
            set.slots.get("AM").unwrap(),
            &vec!["S1: Assembly".to_string(), "Fire drill".to_string()]
        );
    }

    #[test]
    fn test_slot_order_is_feed_order() {
        let f = feed(
            r#"{"rows": {"3/9/2024": {"slots": {
                "PM": {"S2": ["Choir"]},
                "AM": {"S1": ["Assembly"]},
                "AM_L": {"S3": ["Club fair"]}
            }}}}"#,
        );
        let set = lookup(&f, date("03/09/2024")).unwrap();
        let order: Vec<&String> = set.slots.keys().collect();
        assert_eq!(order, ["PM", "AM", "AM_L"]);
    }

    #[test]
    fn test_missing_date_substitutes_nearest_with_note() {
        let f = feed(
            r#"{"rows": {
                "1/9/2024": {"slots": {"AM": {"S1": ["Far"]}}},
                "5/9/2024": {"slots": {"AM": {"S1": ["Near"]}}}
            }}"#,
        );
        let set = lookup(&f, date("04/09/2024")).unwrap();
        assert_eq!(
            set.note.as_deref(),
            Some("No activities found for 04/09/2024. Showing activities for closest date: 05/09/2024")
        );
        assert_eq!(set.slots.get("AM").unwrap(), &vec!["S1: Near".to_string()]);
    }

    #[test]
    fn test_equidistant_tie_prefers_earlier_date() {
        // 02/09 and 06/09 are both two days from 04/09; the earlier wins
        // regardless of feed key order.
        let f = feed(
            r#"{"rows": {
                "6/9/2024": {"slots": {"AM": {"S1": ["Later"]}}},
                "2/9/2024": {"slots": {"AM": {"S1": ["Earlier"]}}}
            }}"#,
        );
        let set = lookup(&f, date("04/09/2024")).unwrap();
        assert_eq!(
            set.slots.get("AM").unwrap(),
            &vec!["S1: Earlier".to_string()]
        );
        assert!(set.note.as_deref().unwrap().contains("02/09/2024"));
    }

    #[test]
    fn test_empty_slots_yield_empty_set_not_error() {
        let f = feed(r#"{"rows": {"3/9/2024": {"slots": {"AM": {}}}}}"#);
        let set = lookup(&f, date("03/09/2024")).unwrap();
        assert!(set.slots.is_empty());
        assert!(set.remark.is_none());
    }

    #[test]
    fn test_empty_feed_is_a_fetch_error() {
        let f = feed(r#"{"rows": {}}"#);
        assert!(matches!(
            lookup(&f, date("03/09/2024")),
            Err(CampusError::Fetch(_))
        ));
    }

    #[test]
    fn test_unparseable_keys_are_skipped() {
        let f = feed(
            r#"{"rows": {
                "someday": {"slots": {"AM": {"S1": ["Bogus"]}}},
                "5/9/2024": {"slots": {"AM": {"S1": ["Real"]}}}
            }}"#,
        );
        let set = lookup(&f, date("04/09/2024")).unwrap();
        assert_eq!(set.slots.get("AM").unwrap(), &vec!["S1: Real".to_string()]);
    }
}
