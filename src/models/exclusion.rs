// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Remote entries deliberately left out of a listing.

use serde::Serialize;

/// Why an entry was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionKind {
    UnsupportedType,
    UnsupportedUnit,
    Other,
}

/// An entry the driver should report but not sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExclusionRecord {
    /// Human-readable reason
    pub message: String,
    /// Dailymile entry id
    pub activity_id: u64,
    pub kind: ExclusionKind,
}

impl ExclusionRecord {
    pub fn new(message: impl Into<String>, activity_id: u64, kind: ExclusionKind) -> Self {
        Self {
            message: message.into(),
            activity_id,
            kind,
        }
    }
}
