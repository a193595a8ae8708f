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
//! Ordered handler chain invoked for every new archive record.

use crate::handler::{ArchiveContext, HandlerOutcome, RecordHandler};
use std::sync::Arc;
use tracing::{debug, error, info};
use wxbridge_types::ArchiveRecord;

/// Result of one handler within a dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerStatus {
    Done(HandlerOutcome),
    Failed(String),
    Disabled,
}

/// Per-handler results of a single dispatch, in invocation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub entries: Vec<(String, HandlerStatus)>,
}

impl DispatchReport {
    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, status)| matches!(status, HandlerStatus::Failed(_)))
            .count()
    }

    pub fn status_of(&self, name: &str) -> Option<&HandlerStatus> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, status)| status)
    }
}

/// Runs registered handlers sequentially, in registration order
#[derive(Default)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn RecordHandler>>,
}

impl std::fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerChain")
            .field("handlers", &self.names())
            .finish()
    }
}

impl HandlerChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to the end of the chain
    pub fn register(&mut self, handler: Arc<dyn RecordHandler>) {
        debug!("Registering record handler: {}", handler.name());
        self.handlers.push(handler);
    }

    #[must_use]
    pub fn with(mut self, handler: Arc<dyn RecordHandler>) -> Self {
        self.register(handler);
        self
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every enabled handler against the record.
    ///
    /// Handler errors are logged and swallowed; later handlers still run and the
    /// record keeps whatever earlier handlers wrote.
    pub fn dispatch(&self, record: &mut ArchiveRecord, ctx: &ArchiveContext) -> DispatchReport {
        let mut report = DispatchReport::default();

        for handler in &self.handlers {
            let name = handler.name().to_owned();
            if !handler.is_enabled() {
                debug!("Handler {} disabled, skipping", name);
                report.entries.push((name, HandlerStatus::Disabled));
                continue;
            }

            match handler.handle(record, ctx) {
                Ok(outcome) => {
                    debug!("Handler {} at {}: {}", name, record.date_time, outcome);
                    report.entries.push((name, HandlerStatus::Done(outcome)));
                }
                Err(e) => {
                    let kind = if e.is_upstream() { "upstream" } else { "record" };
                    error!(
                        "Handler {} failed ({} error) for record {}: {}",
                        name, kind, record.date_time, e
                    );
                    report.entries.push((name, HandlerStatus::Failed(e.to_string())));
                }
            }
        }

        if report.failures() > 0 {
            info!(
                "Record {} processed with {}/{} handler failures",
                record.date_time,
                report.failures(),
                report.entries.len()
            );
        }
        report
    }
}
