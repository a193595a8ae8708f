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

//! Archive record as handed over by the weather-station host.

use crate::units::UnitSystem;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unix timestamp (epoch seconds)
pub type Timestamp = i64;

/// A single observation value. `Null` still counts as a present field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservationValue {
    Integer(i64),
    Float(f64),
    String(String),
    Null,
}

impl ObservationValue {
    /// Numeric view of the value; strings are parsed the way the host stores them
    #[expect(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            Self::String(s) => s.trim().parse::<f64>().ok(),
            Self::Null => None,
        }
    }
}

impl fmt::Display for ObservationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<f64> for ObservationValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for ObservationValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for ObservationValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ObservationValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Aggregated sensor readings for one archive interval.
///
/// `dateTime` and `usUnits` are kept as typed fields; every other reading lives in
/// `observations` and is looked up by its host field name (`outTemp`, `windSpeed`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// Start of the archive interval
    #[serde(rename = "dateTime", deserialize_with = "deserialize_whole")]
    pub date_time: Timestamp,

    /// Raw unit system code (1 = US, 16 = METRIC, 17 = METRICWX)
    #[serde(
        rename = "usUnits",
        default,
        deserialize_with = "deserialize_optional_whole",
        skip_serializing_if = "Option::is_none"
    )]
    pub us_units: Option<i64>,

    /// Observations keyed by field name
    #[serde(flatten)]
    pub observations: BTreeMap<String, ObservationValue>,
}

/// Integer header field that some hosts emit as a float (`1700000000.0`)
#[derive(Deserialize)]
#[serde(untagged)]
enum WholeNumber {
    Integer(i64),
    Float(f64),
}

impl WholeNumber {
    #[expect(clippy::cast_possible_truncation)]
    fn into_i64<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            Self::Integer(v) => Ok(v),
            Self::Float(v) if v.is_finite() => Ok(v.trunc() as i64),
            Self::Float(v) => Err(E::custom(format!("not a finite number: {v}"))),
        }
    }
}

fn deserialize_whole<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    WholeNumber::deserialize(deserializer)?.into_i64()
}

fn deserialize_optional_whole<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Option::<WholeNumber>::deserialize(deserializer)?
        .map(WholeNumber::into_i64)
        .transpose()
}

impl ArchiveRecord {
    pub fn new(date_time: Timestamp) -> Self {
        Self {
            date_time,
            us_units: None,
            observations: BTreeMap::new(),
        }
    }

    /// Builder: set the unit system
    #[must_use]
    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.us_units = Some(units.code());
        self
    }

    /// Builder: add an observation
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<ObservationValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn contains(&self, field: &str) -> bool {
        self.observations.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&ObservationValue> {
        self.observations.get(field)
    }

    /// Numeric value of a field, `None` when absent, null or not a number
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(ObservationValue::as_f64)
    }

    /// Write or overwrite a field, returning the previous value
    pub fn set(
        &mut self,
        field: &str,
        value: impl Into<ObservationValue>,
    ) -> Option<ObservationValue> {
        self.observations.insert(field.to_owned(), value.into())
    }

    /// Known unit system of the record, `None` when absent or an unknown code
    pub fn unit_system(&self) -> Option<UnitSystem> {
        self.us_units.and_then(UnitSystem::from_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_host_record() {
        let json = r#"{
            "dateTime": 1700000000,
            "usUnits": 17,
            "outTemp": 20.5,
            "outHumidity": 60,
            "windDir": null,
            "stationName": "roof"
        }"#;

        let record: ArchiveRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.date_time, 1_700_000_000);
        assert_eq!(record.unit_system(), Some(UnitSystem::MetricWx));
        assert_eq!(record.get_f64("outTemp"), Some(20.5));
        assert_eq!(record.get("outHumidity"), Some(&ObservationValue::Integer(60)));
        assert!(record.contains("windDir"));
        assert_eq!(record.get("windDir"), Some(&ObservationValue::Null));
        assert_eq!(record.get_f64("windDir"), None);
        assert_eq!(record.get_f64("stationName"), None);
        assert!(!record.contains("dateTime"));
    }

    #[test]
    fn test_serialize_keeps_host_names() {
        let record = ArchiveRecord::new(1_700_000_000)
            .with_units(UnitSystem::Us)
            .with("radiation", 0.42);

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["dateTime"], 1_700_000_000);
        assert_eq!(value["usUnits"], 1);
        assert_eq!(value["radiation"], 0.42);
    }

    #[test]
    fn test_missing_units_is_omitted() {
        let record = ArchiveRecord::new(10);
        let json = serde_json::to_string(&record).unwrap();

        assert_eq!(json, r#"{"dateTime":10}"#);
        assert_eq!(record.unit_system(), None);
    }

    #[test]
    fn test_unknown_unit_code_is_kept() {
        let record: ArchiveRecord = serde_json::from_str(r#"{"dateTime": 1, "usUnits": 5}"#).unwrap();

        assert_eq!(record.us_units, Some(5));
        assert_eq!(record.unit_system(), None);
    }

    #[test]
    fn test_float_header_fields() {
        let record: ArchiveRecord =
            serde_json::from_str(r#"{"dateTime": 1700000000.0, "usUnits": 16.0, "rain": 0.0}"#)
                .unwrap();

        assert_eq!(record.date_time, 1_700_000_000);
        assert_eq!(record.unit_system(), Some(UnitSystem::Metric));
        assert_eq!(record.get("rain"), Some(&ObservationValue::Float(0.0)));
    }

    #[test]
    fn test_null_units_deserialize_as_missing() {
        let record: ArchiveRecord =
            serde_json::from_str(r#"{"dateTime": 5, "usUnits": null}"#).unwrap();

        assert_eq!(record.us_units, None);
    }

    #[test]
    fn test_non_numeric_date_time_is_rejected() {
        let result = serde_json::from_str::<ArchiveRecord>(r#"{"dateTime": "yesterday"}"#);

        assert!(result.is_err());
    }

    #[test]
    fn test_set_returns_previous_value() {
        let mut record = ArchiveRecord::new(0).with("rain", 0.2);

        let previous = record.set("rain", 0.4);

        assert_eq!(previous, Some(ObservationValue::Float(0.2)));
        assert_eq!(record.get_f64("rain"), Some(0.4));
    }

    #[test]
    fn test_numeric_strings_parse() {
        assert_eq!(ObservationValue::from(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(ObservationValue::from("n/a").as_f64(), None);
        assert_eq!(ObservationValue::Integer(3).as_f64(), Some(3.0));
    }
}
