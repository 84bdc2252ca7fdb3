// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - the Dailymile adapter and its collaborators.

pub mod cache;
pub mod dailymile;
pub mod listing;
pub mod mapping;
pub mod rate_limit;
pub mod sync;
pub mod track;
pub mod upload;

pub use cache::{CacheCategory, CacheStore, CachedRecord, InMemoryCacheStore};
pub use dailymile::DailymileClient;
pub use listing::{convert_entry, convert_raw_entry, ActivityListing, EntryConversion};
pub use rate_limit::{RateGate, RateLimit, Unlimited, WindowedRateLimiter};
pub use sync::{DailymileService, SyncService};
pub use track::{GpxRenderer, TrackRenderer};
pub use upload::{build_entry, TrackUploadBackoff, DUPLICATE_MARKER};
