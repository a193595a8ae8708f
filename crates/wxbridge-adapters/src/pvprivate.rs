// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of wxbridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz
//! Private PV telemetry endpoint: already aggregated production per archive interval.

use crate::http;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use wxbridge_core::conversions::normalized_output;
use wxbridge_core::{
    ArchiveContext, ArchiveRecord, HandlerOutcome, HookError, HookResult, RecordHandler,
    Timestamp,
};

/// Settings for the private PV handler
#[derive(Debug, Clone)]
pub struct PvPrivateConfig {
    /// Base URL, the record timestamp is appended directly (e.g. `.../api/getSumProduced/`)
    pub api_url: String,
    /// Installed peak power in watts
    pub installed_wp: f64,
    pub archive_column: String,
    /// Optional device suffix, requested as `{api_url}{timestamp}/{device_id}`
    pub device_id: Option<String>,
    pub timeout: Duration,
}

impl PvPrivateConfig {
    pub fn new(api_url: impl Into<String>, installed_wp: f64) -> Self {
        Self {
            api_url: api_url.into(),
            installed_wp,
            archive_column: "radiation".to_owned(),
            device_id: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProducedResponse {
    produced: f64,
}

/// Writes the private PV plant's normalized output into the record
#[derive(Debug)]
pub struct PvPrivateHandler {
    config: PvPrivateConfig,
    client: Client,
}

impl PvPrivateHandler {
    pub const NAME: &'static str = "pvprivate";

    pub fn new(config: PvPrivateConfig) -> HookResult<Self> {
        if config.installed_wp <= 0.0 {
            return Err(HookError::Config(format!(
                "installed_wp must be positive, got {}",
                config.installed_wp
            )));
        }
        let client = http::build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    pub fn request_url(&self, timestamp: Timestamp) -> String {
        match &self.config.device_id {
            Some(device_id) => format!("{}{}/{}", self.config.api_url, timestamp, device_id),
            None => format!("{}{}", self.config.api_url, timestamp),
        }
    }

    /// Production for the record's interval.
    ///
    /// An empty body means the endpoint has not aggregated the interval yet; the
    /// previous interval is requested once instead.
    pub fn fetch_produced(&self, record: &ArchiveRecord, ctx: &ArchiveContext) -> HookResult<f64> {
        let url = self.request_url(record.date_time);
        info!("🔌 [PVPRIVATE] {}", url);
        let mut body = http::get_text(&self.client, &url)?;

        if body.trim().is_empty() {
            let fallback = self.request_url(ctx.previous_interval(record.date_time));
            info!("   Empty response, falling back to {}", fallback);
            body = http::get_text(&self.client, &fallback)?;

            if body.trim().is_empty() {
                return Err(HookError::EmptyResponse(fallback));
            }
        }

        let data: ProducedResponse = serde_json::from_str(&body)?;
        Ok(data.produced)
    }
}

impl RecordHandler for PvPrivateHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(
        &self,
        record: &mut ArchiveRecord,
        ctx: &ArchiveContext,
    ) -> HookResult<HandlerOutcome> {
        let produced = self.fetch_produced(record, ctx)?;
        info!("   Avg Power: {} at {}", produced, record.date_time);

        let value = normalized_output(produced, self.config.installed_wp);
        debug!("   Normalized Output: {} at {}", value, record.date_time);
        record.set(&self.config.archive_column, value);

        Ok(HandlerOutcome::FieldWritten {
            field: self.config.archive_column.clone(),
            value,
        })
    }
}
