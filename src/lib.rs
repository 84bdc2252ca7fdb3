// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Dailymile-Sync: Dailymile adapter for the activity sync platform
//!
//! This crate lists an account's Dailymile entries as platform-neutral
//! activities and uploads neutral activities back to Dailymile.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;
