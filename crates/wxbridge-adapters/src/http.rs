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
//! Blocking HTTP helpers shared by the handlers.

use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, warn};
use wxbridge_core::{HookError, HookResult};

/// Build a blocking client with an explicit request timeout
pub fn build_client(timeout: Duration) -> HookResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| HookError::Config(format!("Failed to build HTTP client: {e}")))
}

/// GET `url` and return the body; any non-success status is an error
pub fn get_text(client: &Client, url: &str) -> HookResult<String> {
    let response = client.get(url).send()?;
    let status = response.status();

    if !status.is_success() {
        let message = response.text().unwrap_or_default();
        warn!("⚠️ [HTTP] {} returned status {}", url, status);
        return Err(HookError::UpstreamStatus {
            status: status.as_u16(),
            message,
        });
    }

    let body = response.text()?;
    debug!("   RAW: {}", body);
    Ok(body)
}
