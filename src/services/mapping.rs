// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity type and distance unit vocabulary shared with Dailymile.
//!
//! Dailymile only knows five workout categories, so the forward table folds
//! several neutral types onto one remote type. The reverse table is not its
//! inverse: `Fitness` always comes back as `Gym`.

use crate::models::{Activity, ActivityStatistic, ActivityStatisticUnit, ActivityType};
use serde::Serialize;

/// Neutral type → Dailymile type. Also defines the supported set.
pub const ACTIVITY_TYPE_MAPPINGS: &[(ActivityType, &str)] = &[
    (ActivityType::Cycling, "Cycling"),
    (ActivityType::MountainBiking, "Cycling"),
    (ActivityType::Hiking, "Walking"),
    (ActivityType::Running, "Running"),
    (ActivityType::Walking, "Walking"),
    (ActivityType::Snowboarding, "Fitness"),
    (ActivityType::Skating, "Fitness"),
    (ActivityType::CrossCountrySkiing, "Fitness"),
    (ActivityType::DownhillSkiing, "Fitness"),
    (ActivityType::Swimming, "Swimming"),
    (ActivityType::Gym, "Fitness"),
    (ActivityType::Rowing, "Fitness"),
    (ActivityType::Elliptical, "Fitness"),
];

/// Dailymile type → neutral type. The API documents lowercase names but
/// responds in title case.
pub const REVERSE_ACTIVITY_TYPE_MAPPINGS: &[(&str, ActivityType)] = &[
    ("Cycling", ActivityType::Cycling),
    ("Running", ActivityType::Running),
    ("Walking", ActivityType::Walking),
    ("Swimming", ActivityType::Swimming),
    ("Fitness", ActivityType::Gym),
];

const YARDS_PER_MILE: f64 = 1760.0;

/// Activity types this adapter can upload.
pub fn supported_activities() -> Vec<ActivityType> {
    ACTIVITY_TYPE_MAPPINGS.iter().map(|(t, _)| *t).collect()
}

pub fn to_remote_type(activity_type: ActivityType) -> Option<&'static str> {
    ACTIVITY_TYPE_MAPPINGS
        .iter()
        .find(|(t, _)| *t == activity_type)
        .map(|(_, remote)| *remote)
}

pub fn to_neutral_type(remote: &str) -> Option<ActivityType> {
    REVERSE_ACTIVITY_TYPE_MAPPINGS
        .iter()
        .find(|(r, _)| *r == remote)
        .map(|(_, t)| *t)
}

/// Convert a distance as the user entered it on Dailymile.
///
/// Yards become miles (value / 1760), not meters. Returns `None` for units
/// Dailymile is not known to produce.
pub fn to_neutral_distance(value: f64, units: &str) -> Option<ActivityStatistic> {
    let stat = match units {
        "miles" => ActivityStatistic::new(ActivityStatisticUnit::Miles, value),
        "yards" => ActivityStatistic::new(ActivityStatisticUnit::Miles, value / YARDS_PER_MILE),
        "meters" => ActivityStatistic::new(ActivityStatisticUnit::Meters, value),
        "kilometers" => ActivityStatistic::new(ActivityStatisticUnit::Kilometers, value),
        _ => return None,
    };
    Some(stat)
}

/// `distance` object of an outgoing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteDistance {
    pub value: f64,
    pub units: &'static str,
}

/// Distance for an upload: meters for swims (Dailymile rejects kilometers
/// there), kilometers for everything else.
pub fn remote_distance_for_upload(activity: &Activity) -> Option<RemoteDistance> {
    let (unit, units) = match activity.activity_type {
        ActivityType::Swimming => (ActivityStatisticUnit::Meters, "meters"),
        _ => (ActivityStatisticUnit::Kilometers, "kilometers"),
    };
    activity
        .stats
        .distance
        .as_units(unit)
        .value
        .map(|value| RemoteDistance { value, units })
}
