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

use thiserror::Error;

/// Failures a record handler can report back to the chain
#[derive(Error, Debug)]
pub enum HookError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned error status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Record field missing: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HookError {
    /// Whether the failure happened talking to a remote service
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::UpstreamStatus { .. }
                | Self::Json(_)
                | Self::MalformedResponse(_)
                | Self::EmptyResponse(_)
        )
    }
}

pub type HookResult<T> = Result<T, HookError>;
