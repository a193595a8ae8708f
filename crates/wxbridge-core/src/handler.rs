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
//! Record handler capability.

use crate::errors::HookResult;
use std::fmt;
use wxbridge_types::{ArchiveRecord, Timestamp};

/// Read-only host state handed to every handler together with the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveContext {
    /// Width of one archive bucket in seconds
    pub archive_interval_secs: i64,
    /// Wall clock at dispatch time (epoch seconds)
    pub now: Timestamp,
}

impl ArchiveContext {
    pub fn new(archive_interval_secs: i64, now: Timestamp) -> Self {
        Self {
            archive_interval_secs,
            now,
        }
    }

    /// End of the interval that starts at `start`
    pub fn interval_end(&self, start: Timestamp) -> Timestamp {
        start + self.archive_interval_secs
    }

    /// Start of the interval preceding the one that starts at `start`
    pub fn previous_interval(&self, start: Timestamp) -> Timestamp {
        start - self.archive_interval_secs
    }

    /// A record is live when it is younger than one archive interval
    pub fn is_live(&self, record: &ArchiveRecord) -> bool {
        self.now - record.date_time < self.archive_interval_secs
    }
}

/// What a handler did with the record
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// A derived value was written into `field`
    FieldWritten { field: String, value: f64 },
    /// Primary fields overwritten with their fallback values
    Substituted { fields: Vec<String> },
    /// Record uploaded to a remote service
    Uploaded { status: u16 },
    /// Nothing to do for this record
    Skipped { reason: String },
}

impl fmt::Display for HandlerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldWritten { field, value } => write!(f, "{field} = {value}"),
            Self::Substituted { fields } if fields.is_empty() => write!(f, "no substitution"),
            Self::Substituted { fields } => write!(f, "substituted {}", fields.join(", ")),
            Self::Uploaded { status } => write!(f, "uploaded (status {status})"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// Trait for archive record handlers
///
/// Handlers run synchronously on the host's dispatch thread, once per new archive
/// record. They may mutate the record in place or perform an external side effect.
/// Errors are returned to the [`HandlerChain`](crate::HandlerChain), which logs and
/// discards them so the host never sees a failure.
pub trait RecordHandler: Send + Sync {
    /// Unique handler name, used in logs and in the configured order
    fn name(&self) -> &str;

    /// Check if the handler is enabled
    fn is_enabled(&self) -> bool {
        true
    }

    /// Process one archive record
    fn handle(
        &self,
        record: &mut ArchiveRecord,
        ctx: &ArchiveContext,
    ) -> HookResult<HandlerOutcome>;
}
