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
//! Fronius Solar API: normalized PV output for the closed archive interval.

use crate::http;
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use wxbridge_core::conversions::{average_power_w, normalized_output};
use wxbridge_core::{
    ArchiveContext, ArchiveRecord, DeviceTimeZone, HandlerOutcome, HookError, HookResult,
    RecordHandler, Timestamp,
};

const ENERGY_CHANNEL: &str = "EnergyReal_WAC_Sum_Produced";
const TIME_SPAN_CHANNEL: &str = "TimeSpanInSec";
/// `Body.Data["inverter/1"].Data` as a JSON pointer
const INVERTER_DATA_POINTER: &str = "/Body/Data/inverter~11/Data";

/// Settings for the Fronius archive-data handler
#[derive(Debug, Clone)]
pub struct FroniusConfig {
    /// `.../solar_api/v1/GetArchiveData.cgi?`, query parameters are appended verbatim
    pub api_url: String,
    pub time_zone: DeviceTimeZone,
    /// Installed peak power in watts
    pub installed_wp: f64,
    /// Record field receiving the normalized output
    pub archive_column: String,
    pub timeout: Duration,
}

impl FroniusConfig {
    pub fn new(api_url: impl Into<String>, installed_wp: f64) -> Self {
        Self {
            api_url: api_url.into(),
            time_zone: DeviceTimeZone::Utc,
            installed_wp,
            archive_column: "radiation".to_owned(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Energy and time span read from one archive-data response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchiveSample {
    pub energy_wh: f64,
    pub time_span_secs: f64,
}

impl ArchiveSample {
    /// Extract both channels from a GetArchiveData response
    pub fn from_response(body: &Value) -> HookResult<Self> {
        let data = body.pointer(INVERTER_DATA_POINTER).ok_or_else(|| {
            HookError::MalformedResponse("missing Body.Data[\"inverter/1\"].Data".to_owned())
        })?;

        Ok(Self {
            energy_wh: read_channel(data, ENERGY_CHANNEL)?,
            time_span_secs: read_channel(data, TIME_SPAN_CHANNEL)?,
        })
    }

    pub fn average_power_w(&self) -> HookResult<f64> {
        if self.time_span_secs <= 0.0 {
            return Err(HookError::InvalidValue {
                field: TIME_SPAN_CHANNEL.to_owned(),
                reason: format!("time span must be positive, got {}", self.time_span_secs),
            });
        }
        Ok(average_power_w(self.energy_wh, self.time_span_secs))
    }
}

fn read_channel(data: &Value, channel: &str) -> HookResult<f64> {
    let value = data
        .get(channel)
        .and_then(|c| c.get("Values"))
        .and_then(|v| v.get("0"))
        .ok_or_else(|| HookError::MalformedResponse(format!("missing {channel}.Values[\"0\"]")))?;

    value.as_f64().ok_or_else(|| {
        HookError::MalformedResponse(format!("{channel}.Values[\"0\"] is not a number: {value}"))
    })
}

/// Writes the inverter's normalized output for the archive interval into the record
#[derive(Debug)]
pub struct FroniusHandler {
    config: FroniusConfig,
    client: Client,
}

impl FroniusHandler {
    pub const NAME: &'static str = "fronius";

    pub fn new(config: FroniusConfig) -> HookResult<Self> {
        if config.installed_wp <= 0.0 {
            return Err(HookError::Config(format!(
                "installed_wp must be positive, got {}",
                config.installed_wp
            )));
        }
        let client = http::build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    /// Archive-data query for `[start, end)`
    pub fn archive_url(&self, start: Timestamp, end: Timestamp) -> HookResult<String> {
        let start_date = self.config.time_zone.format(start)?;
        let end_date = self.config.time_zone.format(end)?;

        Ok(format!(
            "{}Scope=System&StartDate={}&EndDate={}&Channel={}&Channel={}",
            self.config.api_url,
            urlencoding::encode(&start_date),
            urlencoding::encode(&end_date),
            ENERGY_CHANNEL,
            TIME_SPAN_CHANNEL
        ))
    }

    /// Fetch the interval's archive data and compute the normalized output
    pub fn fetch_normalized_output(
        &self,
        record: &ArchiveRecord,
        ctx: &ArchiveContext,
    ) -> HookResult<f64> {
        let start = record.date_time;
        let url = self.archive_url(start, ctx.interval_end(start))?;
        info!("☀️ [FRONIUS] {}", url);

        let body: Value = serde_json::from_str(&http::get_text(&self.client, &url)?)?;
        let sample = ArchiveSample::from_response(&body)?;
        debug!(
            "   Energy: {} Wh over {} s",
            sample.energy_wh, sample.time_span_secs
        );

        let average_power = sample.average_power_w()?;
        info!("   Avg Power: {} W at {}", average_power, start);

        let normalized = normalized_output(average_power, self.config.installed_wp);
        debug!("   Normalized Output: {} at {}", normalized, start);
        Ok(normalized)
    }
}

impl RecordHandler for FroniusHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(
        &self,
        record: &mut ArchiveRecord,
        ctx: &ArchiveContext,
    ) -> HookResult<HandlerOutcome> {
        let value = self.fetch_normalized_output(record, ctx)?;
        record.set(&self.config.archive_column, value);

        Ok(HandlerOutcome::FieldWritten {
            field: self.config.archive_column.clone(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const T: Timestamp = 1_700_000_000;
    const PATH: &str = "/solar_api/v1/GetArchiveData.cgi";

    fn archive_body(energy: f64, span: f64) -> String {
        json!({
            "Body": {
                "Data": {
                    "inverter/1": {
                        "Data": {
                            "EnergyReal_WAC_Sum_Produced": { "Unit": "Wh", "Values": { "0": energy } },
                            "TimeSpanInSec": { "Unit": "sec", "Values": { "0": span } }
                        }
                    }
                }
            },
            "Head": { "Status": { "Code": 0 } }
        })
        .to_string()
    }

    fn handler(server: &Server) -> FroniusHandler {
        let config = FroniusConfig::new(format!("{}{}?", server.url(), PATH), 3000.0);
        FroniusHandler::new(config).unwrap()
    }

    fn ctx() -> ArchiveContext {
        ArchiveContext::new(300, T)
    }

    #[test]
    fn test_writes_normalized_output() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("Scope".into(), "System".into()),
                Matcher::UrlEncoded("StartDate".into(), "2023-11-14T22:13:20Z".into()),
                Matcher::UrlEncoded("EndDate".into(), "2023-11-14T22:18:20Z".into()),
                Matcher::Regex(
                    "Channel=EnergyReal_WAC_Sum_Produced&Channel=TimeSpanInSec".into(),
                ),
            ]))
            .with_status(200)
            .with_body(archive_body(125.0, 300.0))
            .create();

        let mut record = ArchiveRecord::new(T);
        let outcome = handler(&server).handle(&mut record, &ctx()).unwrap();

        // 125 Wh in 300 s = 1500 W, half of 3000 Wp
        assert_eq!(record.get_f64("radiation"), Some(0.5));
        assert_eq!(
            outcome,
            HandlerOutcome::FieldWritten {
                field: "radiation".to_owned(),
                value: 0.5
            }
        );
        mock.assert();
    }

    #[test]
    fn test_custom_column_and_time_zone() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("StartDate".into(), "2023-11-14T22:13:20+01:00".into()),
                Matcher::UrlEncoded("EndDate".into(), "2023-11-14T22:18:20+01:00".into()),
            ]))
            .with_status(200)
            .with_body(archive_body(300.0, 300.0))
            .create();

        let mut config = FroniusConfig::new(format!("{}{}?", server.url(), PATH), 3000.0);
        config.archive_column = "signal1".to_owned();
        config.time_zone = "+01:00".parse().unwrap();
        let handler = FroniusHandler::new(config).unwrap();

        let mut record = ArchiveRecord::new(T);
        handler.handle(&mut record, &ctx()).unwrap();

        // 300 Wh in 300 s = 3600 W, above the rated peak
        assert_eq!(record.get_f64("signal1"), Some(1.2));
        assert!(!record.contains("radiation"));
        mock.assert();
    }

    #[test]
    fn test_missing_channel_leaves_record_untouched() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"Body": {"Data": {"inverter/1": {"Data": {}}}}}).to_string())
            .create();

        let mut record = ArchiveRecord::new(T);
        let result = handler(&server).handle(&mut record, &ctx());

        assert!(matches!(result, Err(HookError::MalformedResponse(msg)) if msg.contains("EnergyReal")));
        assert!(!record.contains("radiation"));
    }

    #[test]
    fn test_server_error_is_reported() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", PATH)
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("inverter busy")
            .create();

        let mut record = ArchiveRecord::new(T);
        let result = handler(&server).handle(&mut record, &ctx());

        assert!(matches!(
            result,
            Err(HookError::UpstreamStatus { status: 500, ref message }) if message == "inverter busy"
        ));
        assert!(!record.contains("radiation"));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>login</html>")
            .create();

        let mut record = ArchiveRecord::new(T);
        let result = handler(&server).handle(&mut record, &ctx());

        assert!(matches!(result, Err(HookError::Json(_))));
    }

    #[test]
    fn test_zero_time_span_is_rejected() {
        let sample = ArchiveSample::from_response(
            &serde_json::from_str(&archive_body(10.0, 0.0)).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            sample.average_power_w(),
            Err(HookError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_non_positive_capacity_is_rejected() {
        let result = FroniusHandler::new(FroniusConfig::new("http://inverter/?", 0.0));
        assert!(matches!(result, Err(HookError::Config(_))));
    }

    #[test]
    fn test_archive_url_layout() {
        let handler =
            FroniusHandler::new(FroniusConfig::new("http://inverter/GetArchiveData.cgi?", 3000.0))
                .unwrap();

        let url = handler.archive_url(T, T + 300).unwrap();

        assert_eq!(
            url,
            "http://inverter/GetArchiveData.cgi?Scope=System\
             &StartDate=2023-11-14T22%3A13%3A20Z&EndDate=2023-11-14T22%3A18%3A20Z\
             &Channel=EnergyReal_WAC_Sum_Produced&Channel=TimeSpanInSec"
        );
    }
}
