//! Temporal cue parsing: textual markers resolved into an event time (when
//! possible), a granularity, and a coarse temporal classification.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Exact,
    Day,
    Week,
    Month,
    Year,
    Approximate,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalType {
    Past,
    Present,
    Future,
    Habitual,
    Specific,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalInfo {
    pub event_time: Option<DateTime<Utc>>,
    pub granularity: Granularity,
    pub is_ongoing: bool,
    pub temporal_type: TemporalType,
    pub temporal_markers: Vec<String>,
}

impl TemporalInfo {
    pub fn effective_time(&self, storage_time: DateTime<Utc>) -> DateTime<Utc> {
        self.event_time.unwrap_or(storage_time)
    }
}

const HABITUAL_MARKERS: &[&str] = &["usually", "always", "often", "every day", "every week", "regularly"];

/// `now` is the storage-time reference point; markers like "yesterday" are
/// resolved relative to it rather than the wall clock, so extraction stays
/// a pure function of its inputs.
pub fn extract_temporal(text: &str, now: DateTime<Utc>) -> TemporalInfo {
    let lower = text.to_lowercase();
    let mut markers = Vec::new();

    for marker in HABITUAL_MARKERS {
        if lower.contains(marker) {
            markers.push((*marker).to_string());
        }
    }
    if !markers.is_empty() {
        return TemporalInfo {
            event_time: None,
            granularity: Granularity::Unknown,
            is_ongoing: true,
            temporal_type: TemporalType::Habitual,
            temporal_markers: markers,
        };
    }

    if lower.contains("yesterday") {
        return TemporalInfo {
            event_time: Some(now - Duration::days(1)),
            granularity: Granularity::Day,
            is_ongoing: false,
            temporal_type: TemporalType::Past,
            temporal_markers: vec!["yesterday".to_string()],
        };
    }
    if lower.contains("last week") {
        return TemporalInfo {
            event_time: Some(now - Duration::weeks(1)),
            granularity: Granularity::Week,
            is_ongoing: false,
            temporal_type: TemporalType::Past,
            temporal_markers: vec!["last week".to_string()],
        };
    }
    if lower.contains("last month") {
        return TemporalInfo {
            event_time: Some(now - Duration::days(30)),
            granularity: Granularity::Month,
            is_ongoing: false,
            temporal_type: TemporalType::Past,
            temporal_markers: vec!["last month".to_string()],
        };
    }
    if lower.contains("tomorrow") {
        return TemporalInfo {
            event_time: Some(now + Duration::days(1)),
            granularity: Granularity::Day,
            is_ongoing: false,
            temporal_type: TemporalType::Future,
            temporal_markers: vec!["tomorrow".to_string()],
        };
    }
    if lower.contains("today") || lower.contains("right now") {
        return TemporalInfo {
            event_time: Some(now),
            granularity: Granularity::Day,
            is_ongoing: lower.contains("right now"),
            temporal_type: TemporalType::Present,
            temporal_markers: vec!["today".to_string()],
        };
    }

    TemporalInfo {
        event_time: None,
        granularity: Granularity::Unknown,
        is_ongoing: false,
        temporal_type: TemporalType::Specific,
        temporal_markers: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yesterday_resolves_to_one_day_before_now() {
        let now = Utc::now();
        let info = extract_temporal("I went running yesterday.", now);
        assert_eq!(info.temporal_type, TemporalType::Past);
        assert_eq!(info.granularity, Granularity::Day);
        assert_eq!(info.event_time, Some(now - Duration::days(1)));
    }

    #[test]
    fn habitual_marker_takes_precedence() {
        let now = Utc::now();
        let info = extract_temporal("I usually run in the morning.", now);
        assert_eq!(info.temporal_type, TemporalType::Habitual);
        assert!(info.is_ongoing);
    }

    #[test]
    fn effective_time_falls_back_to_storage_time() {
        let now = Utc::now();
        let info = extract_temporal("Nothing temporal here.", now);
        assert_eq!(info.effective_time(now), now);
    }
}
