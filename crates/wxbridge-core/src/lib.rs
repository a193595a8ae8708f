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
//! wxbridge core
//!
//! Archive record handlers for weather-station hosts.
//!
//! ## Architecture
//!
//! - **RecordHandler**: one derivation or upload step, invoked once per new archive record
//! - **HandlerChain**: explicit ordered list of handlers built by the integration layer
//! - **HookError**: typed handler failures, logged and discarded by the chain
//!
//! Network-bound handlers live in `wxbridge-adapters`; this crate only carries the
//! record-local `UsePreferredHandler`.

pub mod chain;
pub mod conversions;
pub mod errors;
pub mod handler;
pub mod timezone;
pub mod use_preferred;

pub use chain::{DispatchReport, HandlerChain, HandlerStatus};
pub use errors::{HookError, HookResult};
pub use handler::{ArchiveContext, HandlerOutcome, RecordHandler};
pub use timezone::DeviceTimeZone;
pub use use_preferred::UsePreferredHandler;
pub use wxbridge_types::{ArchiveRecord, ObservationValue, Timestamp, UnitSystem};
