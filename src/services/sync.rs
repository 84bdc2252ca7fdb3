// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote-service interface used by the sync driver, and the Dailymile
//! implementation of it.

use crate::config::Config;
use crate::error::Result;
use crate::models::{Activity, ActivityType, RemoteCredential};
use crate::services::cache::CacheStore;
use crate::services::dailymile::DailymileClient;
use crate::services::listing::ActivityListing;
use crate::services::mapping;
use crate::services::rate_limit::RateGate;
use crate::services::track::TrackRenderer;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// What the sync driver needs from every remote fitness service.
#[async_trait]
pub trait SyncService: Send + Sync {
    /// Stable service id (`"dailymile"`).
    fn id(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// Activity types the service accepts on upload.
    fn supported_activities(&self) -> Vec<ActivityType>;

    /// Browser URL that starts authorization.
    fn authorization_url(&self) -> String;

    /// Turn an OAuth authorization code into a credential.
    async fn retrieve_authorization(&self, code: &str) -> Result<RemoteCredential>;

    async fn revoke_authorization(&self, credential: &RemoteCredential) -> Result<()>;

    async fn download_activity_list(
        &self,
        credential: &RemoteCredential,
        exhaustive: bool,
    ) -> Result<ActivityListing>;

    async fn download_activity(
        &self,
        credential: &RemoteCredential,
        activity: Activity,
    ) -> Result<Activity>;

    /// Returns the remote id of the created record, `None` when the service
    /// already had it.
    async fn upload_activity(
        &self,
        credential: &RemoteCredential,
        activity: &Activity,
    ) -> Result<Option<String>>;

    async fn delete_cached_data(&self, credential: &RemoteCredential) -> Result<()>;
}

/// Dailymile adapter.
///
/// Each instance keeps its own upload cooldown; the rate gate passed in is
/// the only state shared between instances.
pub struct DailymileService {
    pub(crate) client: DailymileClient,
    pub(crate) cache: Arc<dyn CacheStore>,
    pub(crate) renderer: Arc<dyn TrackRenderer>,
    redirect_uri: String,
    pub(crate) upload_cooldown: Duration,
    pub(crate) track_upload_initial_backoff: Duration,
    /// When this instance last finished an upload.
    pub(crate) last_upload: Mutex<Option<Instant>>,
}

impl DailymileService {
    pub const ID: &'static str = "dailymile";
    pub const DISPLAY_NAME: &'static str = "Dailymile";
    pub const DISPLAY_ABBREVIATION: &'static str = "DMI";

    pub fn new(
        config: &Config,
        rate_gate: Arc<dyn RateGate>,
        cache: Arc<dyn CacheStore>,
        renderer: Arc<dyn TrackRenderer>,
    ) -> Self {
        Self {
            client: DailymileClient::new(
                config.api_base_url.clone(),
                config.client_id.clone(),
                config.client_secret.clone(),
                rate_gate,
            ),
            cache,
            renderer,
            redirect_uri: config.redirect_uri(),
            upload_cooldown: config.upload_cooldown,
            track_upload_initial_backoff: config.track_upload_initial_backoff,
            last_upload: Mutex::new(None),
        }
    }

    /// Public profile page for a Dailymile user.
    pub fn user_profile_url(username: &str) -> String {
        format!(
            "http://www.dailymile.com/people/{}",
            urlencoding::encode(username)
        )
    }

    /// Exchange an authorization code, then look up whose token it is.
    pub async fn retrieve_authorization(&self, code: &str) -> Result<RemoteCredential> {
        let token = self.client.exchange_code(code, &self.redirect_uri).await?;
        let person = self.client.get_me(&token.access_token).await?;

        tracing::info!(username = %person.username, "Dailymile authorization retrieved");
        Ok(RemoteCredential::new(token.access_token, person.username))
    }
}

#[async_trait]
impl SyncService for DailymileService {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn display_name(&self) -> &'static str {
        Self::DISPLAY_NAME
    }

    fn supported_activities(&self) -> Vec<ActivityType> {
        mapping::supported_activities()
    }

    fn authorization_url(&self) -> String {
        self.client.authorization_url(&self.redirect_uri)
    }

    async fn retrieve_authorization(&self, code: &str) -> Result<RemoteCredential> {
        DailymileService::retrieve_authorization(self, code).await
    }

    async fn revoke_authorization(&self, credential: &RemoteCredential) -> Result<()> {
        // Dailymile tokens cannot be revoked.
        tracing::debug!(username = %credential.username, "Nothing to revoke on Dailymile");
        Ok(())
    }

    async fn download_activity_list(
        &self,
        credential: &RemoteCredential,
        exhaustive: bool,
    ) -> Result<ActivityListing> {
        DailymileService::download_activity_list(self, credential, exhaustive).await
    }

    async fn download_activity(
        &self,
        _credential: &RemoteCredential,
        activity: Activity,
    ) -> Result<Activity> {
        Ok(DailymileService::download_activity(self, activity))
    }

    async fn upload_activity(
        &self,
        credential: &RemoteCredential,
        activity: &Activity,
    ) -> Result<Option<String>> {
        let entry_id = DailymileService::upload_activity(self, credential, activity).await?;
        Ok(entry_id.map(|id| id.to_string()))
    }

    async fn delete_cached_data(&self, credential: &RemoteCredential) -> Result<()> {
        DailymileService::delete_cached_data(self, credential).await
    }
}
