// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity listing.
//!
//! Walks an account's entry feed backward in time:
//! 1. Request a page before the `until` cursor (newest page first)
//! 2. Decode and convert each entry, recording exclusions for unsupported or
//!    malformed ones
//! 3. Move the cursor to the oldest completion time seen on the page,
//!    stepping one second further when it would not move at all
//!
//! Entries are deduplicated by id, so pages overlapping on the boundary
//! second are harmless.

use crate::error::Result;
use crate::models::activity::SERVICE_ACTIVITY_ID;
use crate::models::{Activity, ExclusionKind, ExclusionRecord, Lap, RemoteCredential};
use crate::services::dailymile::DailymileEntry;
use crate::services::mapping::{to_neutral_distance, to_neutral_type};
use crate::services::sync::DailymileService;
use crate::time_utils::parse_dailymile_time;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

/// Result of one listing call.
#[derive(Debug, Default)]
pub struct ActivityListing {
    pub activities: Vec<Activity>,
    pub exclusions: Vec<ExclusionRecord>,
}

/// What one remote entry turned into.
#[derive(Debug)]
pub enum EntryConversion {
    /// Media-only post; neither an activity nor an exclusion.
    NoWorkout,
    Converted(Activity),
    Excluded {
        /// Completion time, when it could be parsed
        end_time: Option<DateTime<Utc>>,
        exclusion: ExclusionRecord,
    },
}

impl EntryConversion {
    /// Completion time that counts toward the page cursor.
    fn end_time(&self) -> Option<DateTime<Utc>> {
        match self {
            EntryConversion::NoWorkout => None,
            EntryConversion::Converted(activity) => Some(activity.end_time.with_timezone(&Utc)),
            EntryConversion::Excluded { end_time, .. } => *end_time,
        }
    }
}

/// Convert one Dailymile entry into a neutral activity.
pub fn convert_entry(entry: &DailymileEntry) -> EntryConversion {
    let Some(workout) = entry.workout.as_ref() else {
        return EntryConversion::NoWorkout;
    };

    // Dailymile reports everything in UTC.
    let end_time = match parse_dailymile_time(&entry.at) {
        Ok(t) => t,
        Err(e) => {
            return EntryConversion::Excluded {
                end_time: None,
                exclusion: ExclusionRecord::new(
                    format!("Unparsable entry time {}: {}", entry.at, e),
                    entry.id,
                    ExclusionKind::Other,
                ),
            };
        }
    };

    let excluded = |message: String, kind: ExclusionKind| EntryConversion::Excluded {
        end_time: Some(end_time),
        exclusion: ExclusionRecord::new(message, entry.id, kind),
    };

    let remote_type = workout.activity_type.as_deref().unwrap_or_default();
    let Some(activity_type) = to_neutral_type(remote_type) else {
        tracing::debug!(entry_id = entry.id, remote_type, "Unknown activity type");
        return excluded(
            format!("Unsupported activity type {}", remote_type),
            ExclusionKind::UnsupportedType,
        );
    };

    let duration_secs = workout
        .duration
        .map(|d| d.max(0.0).round() as i64)
        .unwrap_or(0);
    let Some(start_time) = chrono::Duration::try_seconds(duration_secs)
        .and_then(|duration| end_time.checked_sub_signed(duration))
    else {
        tracing::debug!(entry_id = entry.id, duration_secs, "Duration out of range");
        return excluded(
            format!("Unusable workout duration {}", duration_secs),
            ExclusionKind::Other,
        );
    };

    let mut activity = Activity::new(activity_type, start_time, end_time);
    activity
        .service_data
        .insert(SERVICE_ACTIVITY_ID.to_string(), serde_json::json!(entry.id));

    if let Some(distance) = &workout.distance {
        if let Some(value) = distance.value {
            let units = distance.units.as_deref().unwrap_or_default();
            match to_neutral_distance(value, units) {
                Some(stat) => activity.stats.distance = stat,
                None => {
                    tracing::debug!(entry_id = entry.id, units, "Unknown measurement unit");
                    return excluded(
                        format!("Unsupported distance unit {}", units),
                        ExclusionKind::UnsupportedUnit,
                    );
                }
            }
        }
    }

    let name = non_empty(workout.title.as_deref())
        .or_else(|| non_empty(entry.message.as_deref()))
        .unwrap_or(activity_type.as_str());
    activity.name = Some(name.to_string());

    activity.adjust_tz();
    activity.calculate_uid();
    EntryConversion::Converted(activity)
}

/// Decode and convert one raw feed entry, returning it with its id.
///
/// An entry that does not match the expected shape becomes an `Other`
/// exclusion. `None` when not even the id is readable.
pub fn convert_raw_entry(raw: &Value) -> Option<(u64, EntryConversion)> {
    let error = match DailymileEntry::deserialize(raw) {
        Ok(entry) => return Some((entry.id, convert_entry(&entry))),
        Err(e) => e,
    };

    let Some(id) = raw.get("id").and_then(Value::as_u64) else {
        tracing::warn!(error = %error, "Skipping entry without a readable id");
        return None;
    };

    if raw.get("workout").map_or(true, Value::is_null) {
        return Some((id, EntryConversion::NoWorkout));
    }

    tracing::debug!(entry_id = id, error = %error, "Malformed entry");
    let end_time = raw
        .get("at")
        .and_then(Value::as_str)
        .and_then(|at| parse_dailymile_time(at).ok());
    Some((
        id,
        EntryConversion::Excluded {
            end_time,
            exclusion: ExclusionRecord::new(
                format!("Malformed entry: {}", error),
                id,
                ExclusionKind::Other,
            ),
        },
    ))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Cursor for the next page given the oldest second on this one.
///
/// When the oldest second equals the cursor that produced the page, step
/// back one more second so the next request differs.
pub(crate) fn next_cursor(before: Option<i64>, candidate: i64) -> i64 {
    if before == Some(candidate) {
        candidate - 1
    } else {
        candidate
    }
}

impl DailymileService {
    /// List activities for an account, most recent page only unless
    /// `exhaustive`.
    pub async fn download_activity_list(
        &self,
        credential: &RemoteCredential,
        exhaustive: bool,
    ) -> Result<ActivityListing> {
        let mut listing = ActivityListing::default();
        let mut seen: HashSet<u64> = HashSet::new();
        let mut before: Option<i64> = None;

        loop {
            // Entries that "happened" before the epoch are not worth chasing.
            if before.is_some_and(|b| b < 0) {
                break;
            }

            tracing::debug!(
                username = %credential.username,
                before = ?before,
                "Requesting entries page"
            );
            let entries = self
                .client
                .list_entries(&credential.access_token, &credential.username, before)
                .await?;

            if entries.is_empty() {
                break;
            }

            let mut earliest_date: Option<DateTime<Utc>> = None;

            for raw in &entries {
                let Some((entry_id, conversion)) = convert_raw_entry(raw) else {
                    continue;
                };
                if let Some(end_time) = conversion.end_time() {
                    if earliest_date.map_or(true, |earliest| end_time < earliest) {
                        earliest_date = Some(end_time);
                    }
                }

                if matches!(conversion, EntryConversion::NoWorkout) {
                    continue;
                }
                if !seen.insert(entry_id) {
                    tracing::debug!(entry_id, "Entry already listed");
                    continue;
                }

                match conversion {
                    EntryConversion::Converted(activity) => listing.activities.push(activity),
                    EntryConversion::Excluded { exclusion, .. } => {
                        listing.exclusions.push(exclusion)
                    }
                    EntryConversion::NoWorkout => {}
                }
            }

            let Some(earliest) = earliest_date else {
                break;
            };

            let candidate = earliest.timestamp();
            if let Some(prev) = before {
                if candidate > prev {
                    tracing::warn!(
                        username = %credential.username,
                        before = prev,
                        candidate,
                        "Dailymile returned entries newer than the cursor, stopping"
                    );
                    break;
                }
            }
            before = Some(next_cursor(before, candidate));

            if !exhaustive {
                break;
            }
        }

        tracing::info!(
            username = %credential.username,
            activities = listing.activities.len(),
            exclusions = listing.exclusions.len(),
            exhaustive,
            "Activity list downloaded"
        );

        Ok(listing)
    }

    /// Dailymile exposes nothing beyond the summary, so the only detail to
    /// add is a single lap carrying the activity totals.
    pub fn download_activity(&self, mut activity: Activity) -> Activity {
        activity.laps = vec![Lap {
            start_time: activity.start_time,
            end_time: activity.end_time,
            stats: activity.stats,
            waypoints: Vec::new(),
        }];
        activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityStatisticUnit, ActivityType};

    fn entry(json: &str) -> DailymileEntry {
        serde_json::from_str(json).unwrap()
    }

    fn converted(json: &str) -> Activity {
        match convert_entry(&entry(json)) {
            EntryConversion::Converted(activity) => activity,
            other => panic!("expected activity, got {:?}", other),
        }
    }

    #[test]
    fn test_media_post_is_skipped() {
        let conversion = convert_entry(&entry(r#"{"id":1,"at":"2013-06-01T14:30:05Z"}"#));
        assert!(matches!(conversion, EntryConversion::NoWorkout));
        assert_eq!(conversion.end_time(), None);
    }

    #[test]
    fn test_full_entry() {
        let activity = converted(
            r#"{"id":9,"at":"2013-06-01T14:30:00Z","message":"felt good",
                "workout":{"title":"Morning run","activity_type":"Running","duration":1800,
                           "distance":{"value":5,"units":"kilometers"}}}"#,
        );
        assert_eq!(activity.activity_type, ActivityType::Running);
        assert_eq!(activity.name.as_deref(), Some("Morning run"));
        assert_eq!(activity.end_time.timestamp() - activity.start_time.timestamp(), 1800);
        assert_eq!(activity.stats.distance.unit, ActivityStatisticUnit::Kilometers);
        assert_eq!(activity.stats.distance.value, Some(5.0));
        assert_eq!(activity.service_activity_id(), Some(9));
        assert_eq!(activity.start_time.offset().local_minus_utc(), 0);
        assert_eq!(activity.uid.len(), 64);
    }

    #[test]
    fn test_missing_duration_is_zero_length() {
        let activity = converted(
            r#"{"id":2,"at":"2013-06-01T14:30:00Z","workout":{"activity_type":"Walking"}}"#,
        );
        assert_eq!(activity.start_time, activity.end_time);
        assert_eq!(activity.stats.distance.value, None);
    }

    #[test]
    fn test_name_fallbacks() {
        let from_message = converted(
            r#"{"id":3,"at":"2013-06-01T14:30:00Z","message":"lunch laps",
                "workout":{"title":"","activity_type":"Swimming"}}"#,
        );
        assert_eq!(from_message.name.as_deref(), Some("lunch laps"));

        let from_type = converted(
            r#"{"id":4,"at":"2013-06-01T14:30:00Z","workout":{"activity_type":"Fitness"}}"#,
        );
        assert_eq!(from_type.name.as_deref(), Some("Gym"));
    }

    #[test]
    fn test_unsupported_type_is_excluded() {
        let conversion = convert_entry(&entry(
            r#"{"id":5,"at":"2013-06-01T14:30:00Z","workout":{"activity_type":"Yoga"}}"#,
        ));
        let EntryConversion::Excluded { end_time, exclusion } = conversion else {
            panic!("expected exclusion");
        };
        assert_eq!(exclusion.kind, ExclusionKind::UnsupportedType);
        assert_eq!(exclusion.activity_id, 5);
        assert!(exclusion.message.contains("Yoga"));
        assert!(end_time.is_some());
    }

    #[test]
    fn test_unsupported_unit_is_excluded() {
        let conversion = convert_entry(&entry(
            r#"{"id":6,"at":"2013-06-01T14:30:00Z",
                "workout":{"activity_type":"Running","distance":{"value":3,"units":"leagues"}}}"#,
        ));
        let EntryConversion::Excluded { exclusion, .. } = conversion else {
            panic!("expected exclusion");
        };
        assert_eq!(exclusion.kind, ExclusionKind::UnsupportedUnit);
        assert!(exclusion.message.contains("leagues"));
    }

    #[test]
    fn test_yard_swim_becomes_miles() {
        let activity = converted(
            r#"{"id":7,"at":"2013-06-01T14:30:00Z",
                "workout":{"activity_type":"Swimming","distance":{"value":1760,"units":"yards"}}}"#,
        );
        assert_eq!(activity.stats.distance.unit, ActivityStatisticUnit::Miles);
        assert_eq!(activity.stats.distance.value, Some(1.0));
    }

    #[test]
    fn test_bad_timestamp_is_excluded() {
        let conversion = convert_entry(&entry(
            r#"{"id":8,"at":"last tuesday","workout":{"activity_type":"Running"}}"#,
        ));
        let EntryConversion::Excluded { end_time, exclusion } = conversion else {
            panic!("expected exclusion");
        };
        assert_eq!(end_time, None);
        assert_eq!(exclusion.kind, ExclusionKind::Other);
    }

    #[test]
    fn test_uid_is_stable_across_downloads() {
        let json = r#"{"id":9,"at":"2013-06-01T14:30:00Z",
                       "workout":{"activity_type":"Cycling","duration":3600,
                                  "distance":{"value":20,"units":"miles"}}}"#;
        assert_eq!(converted(json).uid, converted(json).uid);
    }

    #[test]
    fn test_next_cursor() {
        assert_eq!(next_cursor(None, 1000), 1000);
        assert_eq!(next_cursor(Some(2000), 1000), 1000);
        assert_eq!(next_cursor(Some(1000), 1000), 999);
    }

    #[test]
    fn test_huge_duration_is_excluded() {
        let conversion = convert_entry(&entry(
            r#"{"id":1,"at":"2013-06-01T10:00:00Z",
                "workout":{"activity_type":"Running","duration":1e13}}"#,
        ));
        let EntryConversion::Excluded { end_time, exclusion } = conversion else {
            panic!("expected exclusion");
        };
        assert_eq!(exclusion.kind, ExclusionKind::Other);
        assert_eq!(exclusion.activity_id, 1);
        assert!(end_time.is_some());

        // Saturates to i64::MAX seconds
        let conversion = convert_entry(&entry(
            r#"{"id":2,"at":"2013-06-01T10:00:00Z",
                "workout":{"activity_type":"Running","duration":1e300}}"#,
        ));
        assert!(matches!(conversion, EntryConversion::Excluded { .. }));
    }

    #[test]
    fn test_raw_entry_well_formed() {
        let raw = serde_json::json!({
            "id": 11, "at": "2013-06-01T14:30:00Z",
            "workout": {"activity_type": "Running", "duration": 600}
        });
        let (id, conversion) = convert_raw_entry(&raw).unwrap();
        assert_eq!(id, 11);
        assert!(matches!(conversion, EntryConversion::Converted(_)));
    }

    #[test]
    fn test_raw_entry_with_bad_field_is_excluded() {
        let raw = serde_json::json!({
            "id": 12, "at": "2013-06-01T14:30:00Z",
            "workout": {"activity_type": "Running", "duration": "1800"}
        });
        let (id, conversion) = convert_raw_entry(&raw).unwrap();
        assert_eq!(id, 12);
        let EntryConversion::Excluded { end_time, exclusion } = conversion else {
            panic!("expected exclusion");
        };
        assert_eq!(exclusion.kind, ExclusionKind::Other);
        assert_eq!(exclusion.activity_id, 12);
        assert_eq!(end_time.map(|t| t.timestamp()), Some(1370097000));
    }

    #[test]
    fn test_raw_media_post_with_bad_field_is_skipped() {
        let raw = serde_json::json!({"id": 13, "at": "2013-06-01T14:30:00Z", "message": 42});
        let (id, conversion) = convert_raw_entry(&raw).unwrap();
        assert_eq!(id, 13);
        assert!(matches!(conversion, EntryConversion::NoWorkout));
    }

    #[test]
    fn test_raw_entry_without_id_is_dropped() {
        let raw = serde_json::json!({
            "at": "2013-06-01T14:30:00Z",
            "workout": {"activity_type": "Running"}
        });
        assert!(convert_raw_entry(&raw).is_none());

        let raw = serde_json::json!({"id": "twelve", "workout": {}});
        assert!(convert_raw_entry(&raw).is_none());
    }
}
