// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models shared with the sync platform.

pub mod activity;
pub mod credential;
pub mod exclusion;

pub use activity::{
    Activity, ActivityStatistic, ActivityStatisticUnit, ActivityStatistics, ActivityType, Lap,
    Waypoint,
};
pub use credential::RemoteCredential;
pub use exclusion::{ExclusionKind, ExclusionRecord};
