//! Request payload validation.
//!
//! Every failing field is reported (no fail-fast); each field gets the
//! message of the first rule it breaks, checked in the order
//! required → type → numeric.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{FieldValue, Measurements, NewReading};
use crate::sensors::{FieldKind, FieldSpec, SensorSchema};

// ---

/// Payload shape being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `device_token` plus every measurement field.
    Create,
    /// Every measurement field; the token cannot change after creation.
    Update,
}

/// A validation rule a field can break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Type,
    Numeric,
}

impl Rule {
    pub fn message(self, field: &str) -> String {
        // ---
        match self {
            Rule::Required => format!("Field {field} tidak boleh kosong"),
            Rule::Type => format!("Field {field} tidak valid"),
            Rule::Numeric => format!("Field {field} tidak boleh huruf"),
        }
    }
}

/// Field name → error message, serialized as a JSON object.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    // ---
    pub fn single(field: &str, rule: Rule) -> Self {
        let mut errors = Self::default();
        errors.add(field, rule);
        errors
    }

    pub fn add(&mut self, field: &str, rule: Rule) {
        self.0.entry(field.to_string()).or_insert_with(|| rule.message(field));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

/// Validate a create payload into a storable reading.
pub fn validate_create(
    schema: &SensorSchema,
    payload: &Map<String, Value>,
) -> Result<NewReading, ValidationErrors> {
    // ---
    let mut errors = ValidationErrors::default();

    let device_token = match payload.get("device_token") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            errors.add("device_token", Rule::Required);
            None
        }
        Some(_) => {
            errors.add("device_token", Rule::Type);
            None
        }
    };

    let measurements = collect_measurements(schema, payload, &mut errors);

    match (device_token, errors.is_empty()) {
        (Some(device_token), true) => Ok(NewReading {
            device_token,
            measurements,
        }),
        _ => Err(errors),
    }
}

/// Validate an update payload into the replacement measurement values.
pub fn validate_update(
    schema: &SensorSchema,
    payload: &Map<String, Value>,
) -> Result<Measurements, ValidationErrors> {
    // ---
    let mut errors = ValidationErrors::default();
    let measurements = collect_measurements(schema, payload, &mut errors);
    if errors.is_empty() {
        Ok(measurements)
    } else {
        Err(errors)
    }
}

/// JSON fields a payload must carry for `op`, in descriptor order.
pub fn required_fields(schema: &SensorSchema, op: Operation) -> Vec<&'static str> {
    // ---
    let token = match op {
        Operation::Create => Some("device_token"),
        Operation::Update => None,
    };
    token
        .into_iter()
        .chain(schema.fields.iter().map(|f| f.name))
        .collect()
}

fn collect_measurements(
    schema: &SensorSchema,
    payload: &Map<String, Value>,
    errors: &mut ValidationErrors,
) -> Measurements {
    // ---
    schema
        .fields
        .iter()
        .filter_map(|spec| match check_field(spec, payload.get(spec.name)) {
            Ok(value) => Some(value),
            Err(rule) => {
                errors.add(spec.name, rule);
                None
            }
        })
        .collect()
}

fn check_field(spec: &FieldSpec, value: Option<&Value>) -> Result<FieldValue, Rule> {
    // ---
    let value = match value {
        None | Some(Value::Null) => return Err(Rule::Required),
        Some(v) => v,
    };

    match spec.kind {
        FieldKind::Decimal => {
            let text = match value {
                Value::String(s) if s.is_empty() => return Err(Rule::Required),
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return Err(Rule::Type),
            };
            if spec.numeric && !is_numeric(&text) {
                return Err(Rule::Numeric);
            }
            Ok(FieldValue::Text(text))
        }
        FieldKind::Integer => match value {
            Value::String(s) if s.is_empty() => Err(Rule::Required),
            Value::Number(n) => n
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(FieldValue::Integer)
                .ok_or(Rule::Type),
            _ => Err(Rule::Type),
        },
    }
}

/// Plain decimal number: optional sign, digits, optional fraction.
pub fn is_numeric(s: &str) -> bool {
    // ---
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());

    all_digits(int_part) && frac_part.map_or(true, all_digits)
}

/// Parse a record identifier taken from the path or query string.
pub fn parse_id(raw: Option<&str>) -> Result<i64, ValidationErrors> {
    // ---
    match raw {
        None | Some("") => Err(ValidationErrors::single("id", Rule::Required)),
        Some(s) => s
            .parse::<i64>()
            .map_err(|_| ValidationErrors::single("id", Rule::Type)),
    }
}

/// Require a non-empty `device_token` query parameter.
pub fn require_token(raw: Option<&str>) -> Result<&str, ValidationErrors> {
    // ---
    match raw {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(ValidationErrors::single("device_token", Rule::Required)),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::sensors::{BEITIAN, BMP, THIGROW};
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_valid_create() {
        // ---
        let payload = object(json!({
            "device_token": "dev1",
            "tekanan_udara": "1.5",
            "tinggi_permukaan": "2",
            "battery": "3.9",
        }));
        let reading = validate_create(&BMP, &payload).unwrap();
        assert_eq!(reading.device_token, "dev1");
        assert_eq!(
            reading.measurements,
            vec![
                FieldValue::Text("1.5".into()),
                FieldValue::Text("2".into()),
                FieldValue::Text("3.9".into()),
            ]
        );
    }

    #[test]
    fn test_create_reports_exactly_missing_fields() {
        // ---
        let payload = object(json!({ "tekanan_udara": "1.5", "battery": "" }));
        let errors = validate_create(&BMP, &payload).unwrap_err();

        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, vec!["battery", "device_token", "tinggi_permukaan"]);
        assert_eq!(errors.get("battery"), Some("Field battery tidak boleh kosong"));
        assert_eq!(
            errors.get("device_token"),
            Some("Field device_token tidak boleh kosong")
        );
    }

    #[test]
    fn test_update_does_not_require_token() {
        // ---
        let payload = object(json!({
            "tekanan_udara": "1.5",
            "tinggi_permukaan": "2",
            "battery": "3.9",
        }));
        assert!(validate_update(&BMP, &payload).is_ok());

        let errors = validate_update(&BMP, &object(json!({}))).unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, vec!["battery", "tekanan_udara", "tinggi_permukaan"]);
    }

    #[test]
    fn test_null_counts_as_missing() {
        // ---
        let payload = object(json!({
            "device_token": null,
            "tekanan_udara": null,
            "tinggi_permukaan": "2",
            "battery": "3.9",
        }));
        let errors = validate_create(&BMP, &payload).unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, vec!["device_token", "tekanan_udara"]);
    }

    #[test]
    fn test_json_numbers_accepted_for_decimal_fields() {
        // ---
        let payload = object(json!({
            "device_token": "dev1",
            "tekanan_udara": 1.5,
            "tinggi_permukaan": 2,
            "battery": "3.9",
        }));
        let reading = validate_create(&BMP, &payload).unwrap();
        assert_eq!(reading.measurements[0], FieldValue::Text("1.5".into()));
        assert_eq!(reading.measurements[1], FieldValue::Text("2".into()));
    }

    #[test]
    fn test_wrong_types_rejected() {
        // ---
        let payload = object(json!({
            "device_token": 42,
            "tekanan_udara": true,
            "tinggi_permukaan": ["2"],
            "battery": "3.9",
        }));
        let errors = validate_create(&BMP, &payload).unwrap_err();
        assert_eq!(errors.get("device_token"), Some("Field device_token tidak valid"));
        assert_eq!(errors.get("tekanan_udara"), Some("Field tekanan_udara tidak valid"));
        assert_eq!(
            errors.get("tinggi_permukaan"),
            Some("Field tinggi_permukaan tidak valid")
        );
        assert_eq!(errors.get("battery"), None);
    }

    #[test]
    fn test_numeric_rule_for_gps_fields() {
        // ---
        let payload = object(json!({
            "device_token": "gps-1",
            "latitude": "-7.2575",
            "longitude": "abc",
            "battery": "",
        }));
        let errors = validate_create(&BEITIAN, &payload).unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, vec!["battery", "longitude"]);
        assert_eq!(errors.get("longitude"), Some("Field longitude tidak boleh huruf"));
        assert_eq!(errors.get("battery"), Some("Field battery tidak boleh kosong"));
    }

    #[test]
    fn test_integer_fields() {
        // ---
        let mut payload = object(json!({
            "device_token": "probe",
            "kelembaban_tanah_th": 40,
            "kelembaban_tanah_sm": 0,
            "kelembaban_udara": 71,
            "intensitas_cahaya": "300",
            "battery": "3.7",
            "temperature": "28",
            "kadar_garam": "0.5",
        }));
        let reading = validate_create(&THIGROW, &payload).unwrap();
        assert_eq!(reading.measurements[1], FieldValue::Integer(0));

        payload.insert("kelembaban_udara".into(), json!("71"));
        payload.insert("kelembaban_tanah_th".into(), json!(4_000_000_000u64));
        payload.insert("kelembaban_tanah_sm".into(), json!(1.5));
        let errors = validate_create(&THIGROW, &payload).unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["kelembaban_tanah_sm", "kelembaban_tanah_th", "kelembaban_udara"]
        );
    }

    #[test]
    fn test_rule_messages() {
        // ---
        assert_eq!(Rule::Required.message("arus"), "Field arus tidak boleh kosong");
        assert_eq!(Rule::Type.message("id"), "Field id tidak valid");
        assert_eq!(Rule::Numeric.message("latitude"), "Field latitude tidak boleh huruf");
    }

    #[test]
    fn test_is_numeric() {
        // ---
        for ok in ["1", "1.5", "-7.2575", "+112.75", "007"] {
            assert!(is_numeric(ok), "{ok}");
        }
        for bad in ["", "-", "1.", ".5", "1.2.3", "1e3", "abc", " 1", "1,5"] {
            assert!(!is_numeric(bad), "{bad}");
        }
    }

    #[test]
    fn test_parse_id() {
        // ---
        assert_eq!(parse_id(Some("12")), Ok(12));
        assert_eq!(
            parse_id(None).unwrap_err().get("id"),
            Some("Field id tidak boleh kosong")
        );
        assert_eq!(
            parse_id(Some("abc")).unwrap_err().get("id"),
            Some("Field id tidak valid")
        );
    }

    #[test]
    fn test_required_fields() {
        // ---
        assert_eq!(
            required_fields(&BMP, Operation::Create),
            vec!["device_token", "tekanan_udara", "tinggi_permukaan", "battery"]
        );
        assert_eq!(
            required_fields(&BMP, Operation::Update),
            vec!["tekanan_udara", "tinggi_permukaan", "battery"]
        );
    }
}
