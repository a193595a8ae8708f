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
//! Line-oriented archive host.
//!
//! Reads one JSON archive record per line, runs the handler chain on it and writes the
//! resulting record back out as one JSON line.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use tracing::{debug, warn};
use wxbridge_core::{ArchiveContext, ArchiveRecord, HandlerChain, Timestamp};

/// Counters for one host run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HostStats {
    pub records: usize,
    pub skipped_lines: usize,
    pub handler_failures: usize,
}

/// Feed every record from `input` through `chain`, writing results to `output`.
///
/// `clock` supplies the wall clock used for the live-record check of each dispatch.
pub fn run<R, W, C>(
    chain: &HandlerChain,
    archive_interval_secs: i64,
    input: R,
    mut output: W,
    mut clock: C,
) -> Result<HostStats>
where
    R: BufRead,
    W: Write,
    C: FnMut() -> Timestamp,
{
    let mut stats = HostStats::default();

    for (index, line) in input.lines().enumerate() {
        let line = line.context("Failed to read archive input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut record: ArchiveRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                warn!("📥 Skipping malformed record on line {}: {}", index + 1, e);
                stats.skipped_lines += 1;
                continue;
            }
        };

        let ctx = ArchiveContext::new(archive_interval_secs, clock());
        let report = chain.dispatch(&mut record, &ctx);
        stats.records += 1;
        stats.handler_failures += report.failures();
        debug!(
            "📥 Record {} dispatched to {} handlers",
            record.date_time,
            report.entries.len()
        );

        serde_json::to_writer(&mut output, &record).context("Failed to encode record")?;
        writeln!(output).context("Failed to write record")?;
        output.flush().context("Failed to flush output")?;
    }

    Ok(stats)
}
