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
//! Windguru custom station upload.

use crate::http;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use wxbridge_core::conversions::{
    pressure_to_mbar, rain_to_mm, temperature_to_celsius, wind_to_knots,
};
use wxbridge_core::{
    ArchiveContext, ArchiveRecord, HandlerOutcome, HookError, HookResult, ObservationValue,
    RecordHandler, UnitSystem,
};

/// Settings for the Windguru uploader
#[derive(Debug, Clone)]
pub struct WindguruConfig {
    /// Upload endpoint, e.g. `http://www.windguru.cz/upload/upload_custom.php`
    pub url: String,
    /// Station UID registered at Windguru
    pub uid: String,
    /// Record field used as sea-level pressure when present (`barometer`, `altimeter`, ...)
    pub barometer: String,
    pub timeout: Duration,
}

impl WindguruConfig {
    pub fn new(url: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            uid: uid.into(),
            barometer: "pressure".to_owned(),
            timeout: Duration::from_secs(1),
        }
    }
}

/// The readings Windguru accepts, in record units until converted
#[derive(Debug, Clone, PartialEq)]
pub struct WindguruReading {
    pub wind_avg: f64,
    pub wind_max: f64,
    /// Sent as recorded; the host stores null for calm wind
    pub wind_direction: ObservationValue,
    pub temperature: f64,
    /// Sent as recorded
    pub rh: ObservationValue,
    pub mslp: f64,
    pub precip: f64,
}

impl WindguruReading {
    /// Pull the readings out of a record; `barometer` replaces `pressure` when present
    pub fn from_record(record: &ArchiveRecord, barometer: &str) -> HookResult<Self> {
        let mslp = if record.contains(barometer) {
            required(record, barometer)?
        } else {
            required(record, "pressure")?
        };

        Ok(Self {
            wind_avg: required(record, "windSpeed")?,
            wind_max: required(record, "windGust")?,
            wind_direction: present(record, "windDir")?,
            temperature: required(record, "outTemp")?,
            rh: present(record, "outHumidity")?,
            mslp,
            precip: required(record, "rain")?,
        })
    }

    /// Convert to knots, °C, mbar and mm
    #[must_use]
    pub fn to_windguru_units(self, units: UnitSystem) -> Self {
        Self {
            wind_avg: wind_to_knots(self.wind_avg, units),
            wind_max: wind_to_knots(self.wind_max, units),
            temperature: temperature_to_celsius(self.temperature, units),
            mslp: pressure_to_mbar(self.mslp, units),
            precip: rain_to_mm(self.precip, units),
            ..self
        }
    }

    /// Query parameters of the upload request
    pub fn query(&self, uid: &str) -> Vec<(&'static str, String)> {
        vec![
            ("uid", uid.to_owned()),
            ("wind_avg", self.wind_avg.to_string()),
            ("wind_max", self.wind_max.to_string()),
            ("wind_direction", self.wind_direction.to_string()),
            ("temperature", self.temperature.to_string()),
            ("rh", self.rh.to_string()),
            ("mslp", self.mslp.to_string()),
            ("precip", self.precip.to_string()),
        ]
    }
}

fn present(record: &ArchiveRecord, field: &str) -> HookResult<ObservationValue> {
    record
        .get(field)
        .cloned()
        .ok_or_else(|| HookError::MissingField(field.to_owned()))
}

fn required(record: &ArchiveRecord, field: &str) -> HookResult<f64> {
    let value = present(record, field)?;

    value.as_f64().ok_or_else(|| HookError::InvalidValue {
        field: field.to_owned(),
        reason: format!("not a number: {value}"),
    })
}

/// Uploads live archive records to Windguru. Never mutates the record.
#[derive(Debug)]
pub struct WindguruHandler {
    config: WindguruConfig,
    client: Client,
}

impl WindguruHandler {
    pub const NAME: &'static str = "windguru";

    pub fn new(config: WindguruConfig) -> HookResult<Self> {
        if config.uid.is_empty() {
            return Err(HookError::Config("Windguru uid cannot be empty".to_owned()));
        }
        let client = http::build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    /// Readings converted according to the record's unit system.
    ///
    /// Unknown unit codes are passed through unconverted.
    pub fn prepare(&self, record: &ArchiveRecord) -> HookResult<WindguruReading> {
        let code = record
            .us_units
            .ok_or_else(|| HookError::MissingField("usUnits".to_owned()))?;
        let reading = WindguruReading::from_record(record, &self.config.barometer)?;

        match UnitSystem::from_code(code) {
            Some(units) => Ok(reading.to_windguru_units(units)),
            None => {
                warn!(
                    "⚠️ [WINDGURU] Unknown unit system {}, uploading raw values",
                    code
                );
                Ok(reading)
            }
        }
    }

    /// Send one reading to Windguru
    pub fn upload(&self, reading: &WindguruReading) -> HookResult<u16> {
        let query = reading.query(&self.config.uid);
        info!("🌬️ [WINDGURU] Uploading data: {:?}", query);

        let response = self.client.get(&self.config.url).query(&query).send()?;
        let status = response.status();

        if status.is_success() {
            debug!("   Windguru answer: {}", status);
            Ok(status.as_u16())
        } else {
            Err(HookError::UpstreamStatus {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            })
        }
    }
}

impl RecordHandler for WindguruHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(
        &self,
        record: &mut ArchiveRecord,
        ctx: &ArchiveContext,
    ) -> HookResult<HandlerOutcome> {
        // Windguru only takes current values, backfilled records are not uploaded
        if !ctx.is_live(record) {
            debug!(
                "   Record {} is older than one archive interval, not uploading",
                record.date_time
            );
            return Ok(HandlerOutcome::Skipped {
                reason: format!("record {} is not live", record.date_time),
            });
        }

        let reading = self.prepare(record)?;
        let status = self.upload(&reading)?;
        Ok(HandlerOutcome::Uploaded { status })
    }
}
