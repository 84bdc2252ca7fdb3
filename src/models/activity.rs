// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Platform-neutral activity model.
//!
//! The sync platform owns these records; the Dailymile adapter only fills
//! them in (listing) or reads them (upload).

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

/// Key under which the Dailymile entry id is kept in `service_data`.
pub const SERVICE_ACTIVITY_ID: &str = "activity_id";

const METERS_PER_MILE: f64 = 1609.344;

/// Closed set of activity kinds understood by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Running,
    Cycling,
    MountainBiking,
    Walking,
    Hiking,
    DownhillSkiing,
    CrossCountrySkiing,
    Snowboarding,
    Skating,
    Swimming,
    Wheelchair,
    Rowing,
    Elliptical,
    Gym,
    Climbing,
    Other,
}

impl ActivityType {
    pub const ALL: [ActivityType; 16] = [
        ActivityType::Running,
        ActivityType::Cycling,
        ActivityType::MountainBiking,
        ActivityType::Walking,
        ActivityType::Hiking,
        ActivityType::DownhillSkiing,
        ActivityType::CrossCountrySkiing,
        ActivityType::Snowboarding,
        ActivityType::Skating,
        ActivityType::Swimming,
        ActivityType::Wheelchair,
        ActivityType::Rowing,
        ActivityType::Elliptical,
        ActivityType::Gym,
        ActivityType::Climbing,
        ActivityType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Running => "Running",
            ActivityType::Cycling => "Cycling",
            ActivityType::MountainBiking => "MountainBiking",
            ActivityType::Walking => "Walking",
            ActivityType::Hiking => "Hiking",
            ActivityType::DownhillSkiing => "DownhillSkiing",
            ActivityType::CrossCountrySkiing => "CrossCountrySkiing",
            ActivityType::Snowboarding => "Snowboarding",
            ActivityType::Skating => "Skating",
            ActivityType::Swimming => "Swimming",
            ActivityType::Wheelchair => "Wheelchair",
            ActivityType::Rowing => "Rowing",
            ActivityType::Elliptical => "Elliptical",
            ActivityType::Gym => "Gym",
            ActivityType::Climbing => "Climbing",
            ActivityType::Other => "Other",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distance units carried by neutral statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatisticUnit {
    Meters,
    Kilometers,
    Miles,
}

impl ActivityStatisticUnit {
    fn meters_per_unit(self) -> f64 {
        match self {
            ActivityStatisticUnit::Meters => 1.0,
            ActivityStatisticUnit::Kilometers => 1000.0,
            ActivityStatisticUnit::Miles => METERS_PER_MILE,
        }
    }
}

/// A unit-tagged value. `value` is `None` when the statistic is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityStatistic {
    pub unit: ActivityStatisticUnit,
    pub value: Option<f64>,
}

impl ActivityStatistic {
    pub fn new(unit: ActivityStatisticUnit, value: f64) -> Self {
        Self {
            unit,
            value: Some(value),
        }
    }

    pub fn empty(unit: ActivityStatisticUnit) -> Self {
        Self { unit, value: None }
    }

    /// Same quantity expressed in `unit`.
    pub fn as_units(&self, unit: ActivityStatisticUnit) -> ActivityStatistic {
        if unit == self.unit {
            return *self;
        }
        let value = self
            .value
            .map(|v| v * self.unit.meters_per_unit() / unit.meters_per_unit());
        ActivityStatistic { unit, value }
    }
}

/// Aggregate statistics for an activity or lap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityStatistics {
    pub distance: ActivityStatistic,
}

impl Default for ActivityStatistics {
    fn default() -> Self {
        Self {
            distance: ActivityStatistic::empty(ActivityStatisticUnit::Meters),
        }
    }
}

/// One recorded trajectory point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lap {
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub stats: ActivityStatistics,
    pub waypoints: Vec<Waypoint>,
}

/// A single workout in the platform-neutral representation.
#[derive(Debug, Clone)]
pub struct Activity {
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    /// Display time zone; times are moved into it by [`Activity::adjust_tz`].
    pub tz: FixedOffset,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub activity_type: ActivityType,
    pub stats: ActivityStatistics,
    pub laps: Vec<Lap>,
    /// Content-derived id, see [`Activity::calculate_uid`].
    pub uid: String,
    /// Opaque per-service data (Dailymile: the entry id).
    pub service_data: HashMap<String, serde_json::Value>,
    /// Track files already rendered upstream, keyed by format name (`"gpx"`).
    pub prerendered_formats: HashMap<String, Vec<u8>>,
    pub gps: bool,
    pub private: bool,
}

impl Activity {
    /// New activity in UTC with empty stats and no laps.
    pub fn new(
        activity_type: ActivityType,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let utc = Utc.fix();
        Self {
            start_time: start_time.with_timezone(&utc),
            end_time: end_time.with_timezone(&utc),
            tz: utc,
            name: None,
            notes: None,
            activity_type,
            stats: ActivityStatistics::default(),
            laps: Vec::new(),
            uid: String::new(),
            service_data: HashMap::new(),
            prerendered_formats: HashMap::new(),
            gps: false,
            private: false,
        }
    }

    /// Re-express every timestamp in the activity's own time zone.
    pub fn adjust_tz(&mut self) {
        let tz = self.tz;
        self.start_time = self.start_time.with_timezone(&tz);
        self.end_time = self.end_time.with_timezone(&tz);
        for lap in &mut self.laps {
            lap.start_time = lap.start_time.with_timezone(&tz);
            lap.end_time = lap.end_time.with_timezone(&tz);
        }
    }

    /// Derive `uid` from type, start, end and distance.
    ///
    /// Time zone and unit of the inputs do not affect the result.
    pub fn calculate_uid(&mut self) {
        let distance = self
            .stats
            .distance
            .as_units(ActivityStatisticUnit::Meters)
            .value
            .map(|m| format!("{:.1}", m))
            .unwrap_or_default();
        let material = format!(
            "{}|{}|{}|{}",
            self.activity_type,
            self.start_time.timestamp(),
            self.end_time.timestamp(),
            distance
        );
        self.uid = hex::encode(Sha256::digest(material.as_bytes()));
    }

    pub fn count_total_waypoints(&self) -> usize {
        self.laps.iter().map(|lap| lap.waypoints.len()).sum()
    }

    /// Elapsed time between start and end.
    pub fn duration(&self) -> chrono::Duration {
        self.end_time.signed_duration_since(self.start_time)
    }

    /// Dailymile entry id recorded during listing or upload.
    pub fn service_activity_id(&self) -> Option<u64> {
        self.service_data
            .get(SERVICE_ACTIVITY_ID)
            .and_then(|v| v.as_u64())
    }
}
