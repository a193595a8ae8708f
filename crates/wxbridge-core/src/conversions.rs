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
//! Unit conversion factors and the normalized-output formula.

use wxbridge_types::UnitSystem;

// ============= Conversion factors =============

pub const MPH_TO_KNOTS: f64 = 0.868976558176657;
pub const KMH_TO_KNOTS: f64 = 0.539957;
pub const MPS_TO_KNOTS: f64 = 1.94384;
pub const INHG_TO_MBAR: f64 = 33.8638;
pub const INCH_TO_MM: f64 = 25.4;
pub const CM_TO_MM: f64 = 10.0;

const SECONDS_PER_HOUR: f64 = 3600.0;

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Wind speed in knots
pub fn wind_to_knots(speed: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Us => speed * MPH_TO_KNOTS,
        UnitSystem::Metric => speed * KMH_TO_KNOTS,
        UnitSystem::MetricWx => speed * MPS_TO_KNOTS,
    }
}

/// Precipitation in millimetres
pub fn rain_to_mm(rain: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Us => rain * INCH_TO_MM,
        UnitSystem::Metric => rain * CM_TO_MM,
        UnitSystem::MetricWx => rain,
    }
}

/// Temperature in °C
pub fn temperature_to_celsius(temperature: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Us => fahrenheit_to_celsius(temperature),
        UnitSystem::Metric | UnitSystem::MetricWx => temperature,
    }
}

/// Pressure in mbar
pub fn pressure_to_mbar(pressure: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Us => pressure * INHG_TO_MBAR,
        UnitSystem::Metric | UnitSystem::MetricWx => pressure,
    }
}

// ============= Solar output =============

/// Average power (W) from energy (Wh) produced over `time_span_secs`
pub fn average_power_w(energy_wh: f64, time_span_secs: f64) -> f64 {
    energy_wh / (time_span_secs / SECONDS_PER_HOUR)
}

/// Power divided by installed peak capacity. Not clamped: spikes above 1.0 are kept.
pub fn normalized_output(power_w: f64, installed_wp: f64) -> f64 {
    power_w / installed_wp
}
