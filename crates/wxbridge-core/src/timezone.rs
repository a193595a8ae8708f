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
//! Time-zone suffix used when talking to devices that expect local ISO-8601 dates.

use crate::errors::{HookError, HookResult};
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;
use wxbridge_types::Timestamp;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Device time zone: UTC (`Z`), a fixed offset (`+01:00`) or an IANA zone name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceTimeZone {
    #[default]
    Utc,
    Fixed(FixedOffset),
    Named(Tz),
}

impl DeviceTimeZone {
    /// Render a timestamp as the UTC wall clock `YYYY-MM-DDTHH:MM:SS` followed by the
    /// zone suffix.
    ///
    /// The wall-clock part is never shifted into the zone. A named zone contributes its
    /// UTC offset at that instant.
    pub fn format(&self, timestamp: Timestamp) -> HookResult<String> {
        let utc = DateTime::<Utc>::from_timestamp(timestamp, 0).ok_or_else(|| {
            HookError::InvalidValue {
                field: "dateTime".to_owned(),
                reason: format!("timestamp {timestamp} out of range"),
            }
        })?;

        Ok(format!("{}{}", utc.format(ISO_FORMAT), self.suffix(&utc)))
    }

    fn suffix(&self, at: &DateTime<Utc>) -> String {
        match self {
            Self::Utc => "Z".to_owned(),
            Self::Fixed(offset) => at.with_timezone(offset).format("%:z").to_string(),
            Self::Named(tz) => at.with_timezone(tz).format("%:z").to_string(),
        }
    }
}

impl FromStr for DeviceTimeZone {
    type Err = HookError;

    fn from_str(s: &str) -> HookResult<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
            return Ok(Self::Utc);
        }

        if s.starts_with('+') || s.starts_with('-') {
            return parse_offset(s).map(Self::Fixed);
        }

        s.parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| HookError::Config(format!("Unknown time zone: '{s}'")))
    }
}

impl fmt::Display for DeviceTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utc => write!(f, "Z"),
            Self::Fixed(offset) => write!(f, "{offset}"),
            Self::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

/// Parse `+HH:MM`, `+HHMM` or `+HH`
fn parse_offset(s: &str) -> HookResult<FixedOffset> {
    let invalid = || HookError::Config(format!("Invalid UTC offset: '{s}'"));

    let (sign, digits) = match s.split_at(1) {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return Err(invalid()),
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().map_err(|_| invalid())?, 0),
        4 => {
            let (h, m) = digits.split_at(2);
            (
                h.parse::<i32>().map_err(|_| invalid())?,
                m.parse::<i32>().map_err(|_| invalid())?,
            )
        }
        _ => return Err(invalid()),
    };
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
