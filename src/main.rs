// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dailymile-Sync driver
//!
//! Lists one account's Dailymile activities and completes each one, the way
//! the platform's sync worker drives the adapter.
//!
//! Usage: `dailymile-sync [--exhaustive]` with `DAILYMILE_ACCESS_TOKEN` and
//! `DAILYMILE_USERNAME` set.

use dailymile_sync::{
    config::Config,
    db::FirestoreCacheStore,
    models::RemoteCredential,
    services::{
        CacheStore, DailymileService, GpxRenderer, InMemoryCacheStore, SyncService,
        WindowedRateLimiter,
    },
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    let config = Config::from_env()?;
    let exhaustive = std::env::args().any(|arg| arg == "--exhaustive");

    let credential = RemoteCredential::new(
        std::env::var("DAILYMILE_ACCESS_TOKEN")?,
        std::env::var("DAILYMILE_USERNAME")?,
    );

    let cache: Arc<dyn CacheStore> = match &config.gcp_project_id {
        Some(project_id) => Arc::new(FirestoreCacheStore::new(project_id).await?),
        None => Arc::new(InMemoryCacheStore::new()),
    };

    // One limiter for every account handled by this process
    let rate_gate = Arc::new(WindowedRateLimiter::new(config.rate_limits.clone()));

    let service: Box<dyn SyncService> = Box::new(DailymileService::new(
        &config,
        rate_gate,
        cache,
        Arc::new(GpxRenderer),
    ));

    tracing::info!(
        service = service.id(),
        username = %credential.username,
        exhaustive,
        "Starting activity listing"
    );

    let listing = match service.download_activity_list(&credential, exhaustive).await {
        Ok(listing) => listing,
        Err(e) if e.requires_user_intervention() => {
            tracing::error!(error = %e, "Re-authorization required");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    for exclusion in &listing.exclusions {
        tracing::info!(
            entry_id = exclusion.activity_id,
            kind = ?exclusion.kind,
            reason = %exclusion.message,
            "Excluded entry"
        );
    }

    for activity in listing.activities {
        let activity = service.download_activity(&credential, activity).await?;
        tracing::info!(
            uid = %activity.uid,
            activity_type = %activity.activity_type,
            name = activity.name.as_deref().unwrap_or_default(),
            start = %activity.start_time,
            laps = activity.laps.len(),
            "Activity ready"
        );
    }

    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dailymile_sync=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
