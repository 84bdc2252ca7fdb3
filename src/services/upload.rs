// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity upload.
//!
//! Handles the two-step Dailymile protocol:
//! 1. Wait out the per-instance inter-upload cooldown
//! 2. POST the entry (duplicates short-circuit as success)
//! 3. PUT the GPX track onto the new entry when the activity has waypoints
//!    (a duplicate track also short-circuits as success)
//!
//! Nothing spans the two requests: an interrupted upload leaves an entry
//! without a track, and the retry is absorbed by duplicate detection.

use crate::error::{AppError, Result};
use crate::models::{Activity, RemoteCredential};
use crate::services::dailymile::{CreatedEntry, NewEntry, NewWorkout, RawResponse};
use crate::services::mapping::{remote_distance_for_upload, to_remote_type};
use crate::services::sync::DailymileService;
use crate::services::track::GPX_FORMAT;
use crate::time_utils::format_dailymile_time;
use std::time::Duration;
use tokio::time::Instant;

/// Text Dailymile puts in the body when an entry already exists.
pub const DUPLICATE_MARKER: &str = "duplicate of activity";

/// Upper bound for the track attach backoff.
const TRACK_BACKOFF_CAP: Duration = Duration::from_secs(30);

/// How a write request ended, when it did not fail.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ResponseOutcome {
    /// 201 with its body
    Accepted(String),
    /// Dailymile already has this entry
    Duplicate,
}

/// Classify an entry or track response.
pub(crate) fn interpret_upload_response(uid: &str, response: RawResponse) -> Result<ResponseOutcome> {
    let RawResponse { status, body } = response;

    if status == 201 {
        return Ok(ResponseOutcome::Accepted(body));
    }
    if status == 401 {
        return Err(AppError::AuthorizationRequired(format!(
            "No authorization to upload activity {} response {} status {}",
            uid, body, status
        )));
    }
    if body.contains(DUPLICATE_MARKER) {
        return Ok(ResponseOutcome::Duplicate);
    }

    Err(AppError::UploadFailed {
        uid: uid.to_string(),
        status,
        body,
    })
}

/// Build the `POST /entries.json` body for an activity.
pub fn build_entry(activity: &Activity) -> Result<NewEntry> {
    let activity_type = to_remote_type(activity.activity_type).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "Activity type {} is not supported by Dailymile",
            activity.activity_type
        ))
    })?;

    let title = activity
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(activity.activity_type.as_str())
        .to_string();

    let duration = (activity.duration().num_milliseconds() as f64 / 1000.0).round() as i64;

    Ok(NewEntry {
        message: activity.notes.clone().filter(|n| !n.is_empty()),
        workout: NewWorkout {
            title,
            activity_type,
            duration,
            completed_at: format_dailymile_time(&activity.end_time),
            distance: remote_distance_for_upload(activity),
        },
    })
}

/// Remaining cooldown given the last upload instant.
pub(crate) fn cooldown_remaining(
    last_upload: Option<Instant>,
    now: Instant,
    cooldown: Duration,
) -> Duration {
    match last_upload {
        Some(last) => cooldown.saturating_sub(now.saturating_duration_since(last)),
        None => Duration::ZERO,
    }
}

/// Doubling wait before a track attach attempt.
///
/// Only one attempt is made per upload today; the schedule is kept so a
/// retry loop can reuse it.
#[derive(Debug, Clone)]
pub struct TrackUploadBackoff {
    next: Duration,
    cap: Duration,
}

impl TrackUploadBackoff {
    pub fn new(initial: Duration, cap: Duration) -> Self {
        Self {
            next: initial.min(cap),
            cap,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.cap);
        delay
    }
}

impl DailymileService {
    /// Time left before this instance may upload again.
    pub async fn cooldown_remaining(&self) -> Duration {
        let last_upload = *self.last_upload.lock().await;
        cooldown_remaining(last_upload, Instant::now(), self.upload_cooldown)
    }

    async fn mark_uploaded(&self) {
        *self.last_upload.lock().await = Some(Instant::now());
    }

    /// Upload an activity; returns the new entry id, or `None` when
    /// Dailymile reports the entry or its track as a duplicate.
    pub async fn upload_activity(
        &self,
        credential: &RemoteCredential,
        activity: &Activity,
    ) -> Result<Option<u64>> {
        tracing::info!(
            uid = %activity.uid,
            tz = %activity.tz,
            start = %activity.start_time,
            "Uploading activity"
        );

        let wait = self.cooldown_remaining().await;
        if !wait.is_zero() {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "Inter-upload cooldown");
            tokio::time::sleep(wait).await;
        }

        let result = self.upload_entry_and_track(credential, activity).await;
        self.mark_uploaded().await;
        result
    }

    async fn upload_entry_and_track(
        &self,
        credential: &RemoteCredential,
        activity: &Activity,
    ) -> Result<Option<u64>> {
        let entry = build_entry(activity)?;
        let response = self
            .client
            .create_entry(&credential.access_token, &entry)
            .await?;

        let body = match interpret_upload_response(&activity.uid, response)? {
            ResponseOutcome::Accepted(body) => body,
            ResponseOutcome::Duplicate => {
                tracing::info!(uid = %activity.uid, "Duplicate entry, skipping upload");
                return Ok(None);
            }
        };

        let created: CreatedEntry =
            serde_json::from_str(&body).map_err(|e| AppError::UploadFailed {
                uid: activity.uid.clone(),
                status: 201,
                body: format!("unparsable response ({}): {}", e, body),
            })?;

        if activity.count_total_waypoints() > 0 {
            let outcome = self.attach_track(credential, activity, created.id).await?;
            if outcome == ResponseOutcome::Duplicate {
                return Ok(None);
            }
        }

        tracing::info!(uid = %activity.uid, entry_id = created.id, "Activity uploaded");
        Ok(Some(created.id))
    }

    /// PUT the track onto a created entry. A duplicate track ends the upload
    /// as a no-op, the same as a duplicate entry.
    async fn attach_track(
        &self,
        credential: &RemoteCredential,
        activity: &Activity,
        entry_id: u64,
    ) -> Result<ResponseOutcome> {
        let gpx = match activity.prerendered_formats.get(GPX_FORMAT) {
            Some(bytes) => {
                tracing::debug!(uid = %activity.uid, "Using prerendered GPX");
                bytes.clone()
            }
            None => self.renderer.render(activity)?,
        };

        let mut backoff =
            TrackUploadBackoff::new(self.track_upload_initial_backoff, TRACK_BACKOFF_CAP);
        tokio::time::sleep(backoff.next_delay()).await;

        let response = self
            .client
            .attach_track(&credential.access_token, entry_id, gpx)
            .await?;

        let outcome = interpret_upload_response(&activity.uid, response)?;
        match &outcome {
            ResponseOutcome::Accepted(_) => {
                tracing::debug!(uid = %activity.uid, entry_id, "Track attached")
            }
            ResponseOutcome::Duplicate => {
                tracing::info!(uid = %activity.uid, entry_id, "Duplicate track, skipping")
            }
        }
        Ok(outcome)
    }
}
