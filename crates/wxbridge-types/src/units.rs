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

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit systems a host archive record can be expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitSystem {
    /// mph, inHg, °F, inch
    Us,
    /// km/h, mbar, °C, cm
    Metric,
    /// m/s, mbar, °C, mm
    MetricWx,
}

impl UnitSystem {
    pub const US_CODE: i64 = 0x01;
    pub const METRIC_CODE: i64 = 0x10;
    pub const METRICWX_CODE: i64 = 0x11;

    /// Map a host `usUnits` code to a unit system
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            Self::US_CODE => Some(Self::Us),
            Self::METRIC_CODE => Some(Self::Metric),
            Self::METRICWX_CODE => Some(Self::MetricWx),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Us => Self::US_CODE,
            Self::Metric => Self::METRIC_CODE,
            Self::MetricWx => Self::METRICWX_CODE,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::Metric => "METRIC",
            Self::MetricWx => "METRICWX",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
