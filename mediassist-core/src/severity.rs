use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use tracing::warn;

use crate::vitals::{VitalSign, VitalsReading};

/// Out-of-range finding for a single vital sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    HighBloodPressure,
    LowBloodPressure,
    HighBloodSugar,
    LowBloodSugar,
    HighHeartRate,
    LowHeartRate,
    Fever,
    LowBodyTemperature,
}

pub type AlertList = Vec<Alert>;

impl Alert {
    pub fn message(&self) -> &'static str {
        match self {
            Alert::HighBloodPressure => "High Blood Pressure detected.",
            Alert::LowBloodPressure => "Low Blood Pressure detected.",
            Alert::HighBloodSugar => "High Blood Sugar detected.",
            Alert::LowBloodSugar => "Low Blood Sugar detected.",
            Alert::HighHeartRate => "High Heart Rate detected.",
            Alert::LowHeartRate => "Low Heart Rate detected.",
            Alert::Fever => "Fever detected.",
            Alert::LowBodyTemperature => "Low Body Temperature detected.",
        }
    }

    pub fn vital(&self) -> VitalSign {
        match self {
            Alert::HighBloodPressure | Alert::LowBloodPressure => VitalSign::BloodPressure,
            Alert::HighBloodSugar | Alert::LowBloodSugar => VitalSign::BloodGlucose,
            Alert::HighHeartRate | Alert::LowHeartRate => VitalSign::HeartRate,
            Alert::Fever | Alert::LowBodyTemperature => VitalSign::Temperature,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for Alert {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("Invalid regex"));

/// First number appearing in a formatted vital value such as `"101.2 °F"`.
fn leading_number(value: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(value)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn parse_blood_pressure(value: &str) -> Option<(u32, u32)> {
    let (systolic, diastolic) = value.split_once('/')?;
    let systolic = systolic.trim().parse::<u32>().ok()?;
    let diastolic = diastolic.trim().parse::<u32>().ok()?;
    Some((systolic, diastolic))
}

/// Apply the fixed threshold rules to `vitals`.
///
/// Alerts come out in check order: blood pressure, glucose, heart rate,
/// temperature. Each vital raises at most one alert and absent vitals raise
/// none. Oxygen saturation and hemoglobin have no rules.
pub fn classify(vitals: &VitalsReading) -> AlertList {
    let mut alerts = Vec::new();

    if let Some(bp) = vitals.get(VitalSign::BloodPressure) {
        match parse_blood_pressure(bp) {
            Some((systolic, diastolic)) => {
                if systolic > 140 || diastolic > 90 {
                    alerts.push(Alert::HighBloodPressure);
                } else if systolic < 90 || diastolic < 60 {
                    alerts.push(Alert::LowBloodPressure);
                }
            }
            None => warn!(value = %bp, "Skipping blood pressure that is not systolic/diastolic"),
        }
    }

    if let Some(value) = vitals.get(VitalSign::BloodGlucose).and_then(leading_number) {
        if value > 140.0 {
            alerts.push(Alert::HighBloodSugar);
        } else if value < 70.0 {
            alerts.push(Alert::LowBloodSugar);
        }
    }

    if let Some(value) = vitals.get(VitalSign::HeartRate).and_then(leading_number) {
        if value > 100.0 {
            alerts.push(Alert::HighHeartRate);
        } else if value < 60.0 {
            alerts.push(Alert::LowHeartRate);
        }
    }

    if let Some(value) = vitals.get(VitalSign::Temperature).and_then(leading_number) {
        if value > 100.4 {
            alerts.push(Alert::Fever);
        } else if value < 95.0 {
            alerts.push(Alert::LowBodyTemperature);
        }
    }

    alerts
}
