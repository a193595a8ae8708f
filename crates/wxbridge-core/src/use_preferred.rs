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
//! Preferred value substitution: overwrite a reading with a better source when one exists.

use crate::errors::HookResult;
use crate::handler::{ArchiveContext, HandlerOutcome, RecordHandler};
use std::collections::BTreeMap;
use tracing::debug;
use wxbridge_types::ArchiveRecord;

/// Replaces each primary field with its preferred fallback field when both are present.
///
/// Fallback values are read from the record as it was before the pass, so pairs
/// never chain into each other.
#[derive(Debug, Clone, Default)]
pub struct UsePreferredHandler {
    /// primary field -> preferred field
    pairs: BTreeMap<String, String>,
}

impl UsePreferredHandler {
    pub const NAME: &'static str = "use_preferred";

    pub fn new(pairs: BTreeMap<String, String>) -> Self {
        Self { pairs }
    }
}

impl RecordHandler for UsePreferredHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(
        &self,
        record: &mut ArchiveRecord,
        _ctx: &ArchiveContext,
    ) -> HookResult<HandlerOutcome> {
        let replacements: Vec<_> = self
            .pairs
            .iter()
            .filter(|(primary, _)| record.contains(primary))
            .filter_map(|(primary, preferred)| {
                let value = record.get(preferred)?.clone();
                debug!(
                    "Replacing {}({:?}) with {}({})",
                    primary,
                    record.get(primary),
                    preferred,
                    value
                );
                Some((primary.clone(), value))
            })
            .collect();

        let mut fields = Vec::with_capacity(replacements.len());
        for (primary, value) in replacements {
            record.set(&primary, value);
            fields.push(primary);
        }

        Ok(HandlerOutcome::Substituted { fields })
    }
}
