use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Vital signs recognised in report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VitalSign {
    BloodPressure,
    HeartRate,
    BloodGlucose,
    Temperature,
    OxygenSaturation,
    Hemoglobin,
}

impl VitalSign {
    pub fn label(&self) -> &'static str {
        match self {
            VitalSign::BloodPressure => "Blood Pressure",
            VitalSign::HeartRate => "Heart Rate",
            VitalSign::BloodGlucose => "Blood Glucose",
            VitalSign::Temperature => "Temperature",
            VitalSign::OxygenSaturation => "Oxygen Saturation",
            VitalSign::Hemoglobin => "Hemoglobin",
        }
    }
}

impl fmt::Display for VitalSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How one vital sign is located in free text: any of `labels`, then
/// `separator`, then a value of shape `value`. The captured value is stored
/// with `unit` appended.
#[derive(Debug, Clone, Copy)]
pub struct VitalPattern {
    pub sign: VitalSign,
    pub labels: &'static [&'static str],
    pub separator: &'static str,
    pub value: &'static str,
    pub unit: Option<&'static str>,
}

const SEPARATOR: &str = r"[:\- ]*\s*";

pub const VITAL_PATTERNS: &[VitalPattern] = &[
    VitalPattern {
        sign: VitalSign::BloodPressure,
        labels: &["Blood Pressure", "BP"],
        separator: SEPARATOR,
        value: r"[0-9]{2,3}/[0-9]{2,3}",
        unit: None,
    },
    VitalPattern {
        sign: VitalSign::HeartRate,
        labels: &["Heart Rate", "Pulse"],
        separator: SEPARATOR,
        value: r"[0-9]{2,3}",
        unit: Some("bpm"),
    },
    VitalPattern {
        sign: VitalSign::BloodGlucose,
        labels: &["Glucose", "Blood Glucose", "Sugar", "Fasting Glucose"],
        // a bare parenthesised word such as "(fasting)" may sit between label and value
        separator: r"[:\-\s]*\(?[A-Za-z]*\)?[:\-\s]*",
        value: r"[0-9]{2,3}",
        unit: Some("mg/dL"),
    },
    VitalPattern {
        sign: VitalSign::Temperature,
        labels: &["Temp", "Temperature"],
        separator: SEPARATOR,
        value: r"[0-9]{2,3}\.?[0-9]*",
        unit: Some("°F"),
    },
    VitalPattern {
        sign: VitalSign::OxygenSaturation,
        labels: &["SpO2", "Oxygen"],
        separator: SEPARATOR,
        value: r"[0-9]{2,3}",
        unit: Some("%"),
    },
    VitalPattern {
        sign: VitalSign::Hemoglobin,
        labels: &["Hb", "Hemoglobin"],
        separator: SEPARATOR,
        value: r"[0-9]{1,2}\.?[0-9]*",
        unit: Some("g/dL"),
    },
];

impl VitalPattern {
    /// Case-insensitive regex with the value in capture group 1.
    pub fn regex_source(&self) -> String {
        let labels = self
            .labels
            .iter()
            .map(|label| regex::escape(label))
            .collect::<Vec<_>>()
            .join("|");
        format!("(?i)(?:{}){}({})", labels, self.separator, self.value)
    }

    fn format_value(&self, raw: &str) -> String {
        match self.unit {
            Some(unit) => format!("{} {}", raw, unit),
            None => raw.to_string(),
        }
    }
}

static COMPILED_PATTERNS: LazyLock<Vec<(VitalPattern, Regex)>> = LazyLock::new(|| {
    VITAL_PATTERNS
        .iter()
        .map(|pattern| {
            let regex = Regex::new(&pattern.regex_source()).expect("Invalid vital pattern");
            (*pattern, regex)
        })
        .collect()
});

/// Vital signs found in one report, in the order they were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VitalsReading {
    entries: Vec<(VitalSign, String)>,
}

impl VitalsReading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value for `sign`. A replaced value keeps its position.
    pub fn insert(&mut self, sign: VitalSign, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(s, _)| *s == sign) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((sign, value)),
        }
    }

    pub fn get(&self, sign: VitalSign) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| *s == sign)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, sign: VitalSign) -> bool {
        self.get(sign).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VitalSign, &str)> {
        self.entries.iter().map(|(s, v)| (*s, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for VitalsReading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (sign, value) in &self.entries {
            map.serialize_entry(sign.label(), value)?;
        }
        map.end()
    }
}

/// Scan `text` for every vital in [`VITAL_PATTERNS`]. Only the first match of
/// each vital is kept; vitals that do not appear are absent from the result.
pub fn extract_vitals(text: &str) -> VitalsReading {
    let mut reading = VitalsReading::new();

    for (pattern, regex) in COMPILED_PATTERNS.iter() {
        if let Some(value) = regex.captures(text).and_then(|caps| caps.get(1)) {
            reading.insert(pattern.sign, pattern.format_value(value.as_str()));
        }
    }

    reading
}
