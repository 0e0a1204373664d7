//! Sensor reading records shared by every vertical.

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::sensors::{FieldKind, SensorSchema};

// ---

/// A single measurement value as stored in the sensor table.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    // ---
    Text(String),
    Integer(i32),
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Integer(i) => serializer.serialize_i32(*i),
        }
    }
}

/// Validated measurement values, in descriptor field order.
pub type Measurements = Vec<FieldValue>;

/// Payload for inserting a new reading.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub device_token: String,
    pub measurements: Measurements,
}

/// A stored sensor reading.
///
/// Serializes as a flat JSON object: `id`, `device_token`, each measurement
/// keyed by its field name, then `created_at` when the sensor tracks it.
#[derive(Debug, Clone)]
pub struct Reading {
    // ---
    pub schema: &'static SensorSchema,
    pub id: i64,
    pub device_token: String,
    pub measurements: Measurements,
    pub created_at: Option<DateTime<Utc>>,
}

impl Reading {
    // ---
    /// Look up a measurement by its JSON field name.
    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.schema
            .fields
            .iter()
            .position(|f| f.name == name)
            .and_then(|i| self.measurements.get(i))
    }

    /// Rewrite every decimal measurement with exactly two fractional digits.
    ///
    /// Values that do not parse as a finite number are kept verbatim.
    pub fn formatted(mut self) -> Self {
        // ---
        for (spec, value) in self.schema.fields.iter().zip(self.measurements.iter_mut()) {
            if spec.kind != FieldKind::Decimal {
                continue;
            }
            if let FieldValue::Text(raw) = value {
                match format_two_decimals(raw) {
                    Some(formatted) => *raw = formatted,
                    None => tracing::warn!(
                        "{}#{}: {} value {:?} is not a number, returned unformatted",
                        self.schema.name,
                        self.id,
                        spec.name,
                        raw
                    ),
                }
            }
        }
        self
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // ---
        let len = 2 + self.measurements.len() + usize::from(self.created_at.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("device_token", &self.device_token)?;
        for (spec, value) in self.schema.fields.iter().zip(&self.measurements) {
            map.serialize_entry(spec.name, value)?;
        }
        if let Some(created_at) = &self.created_at {
            map.serialize_entry("created_at", created_at)?;
        }
        map.end()
    }
}

/// Parse `raw` as a float and print it with two decimals.
///
/// Returns `None` for anything that is not a finite number.
pub fn format_two_decimals(raw: &str) -> Option<String> {
    // ---
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then(|| format!("{:.2}", value))
}
