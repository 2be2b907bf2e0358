use std::fmt;

use crate::error::PipelineError;
use crate::models::reading::SensorReading;

const ACIDITY_RANGE: (f64, f64) = (0.0, 14.0);
const MOISTURE_RANGE: (f64, f64) = (0.0, 100.0);
const TEMPERATURE_RANGE: (f64, f64) = (-50.0, 100.0);
const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);
const GAS_RANGE: (f64, f64) = (0.0, 10.0);

/// One violated field constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Every constraint the payload violated, not just the first.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub violations: Vec<FieldViolation>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for violation in &self.violations {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}", violation.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Decode and validate an inbound telemetry payload.
///
/// Structural failures (not decodable as the expected shape) come back as
/// `MalformedPayload` before any field-level checks run; decodable payloads
/// with out-of-contract values come back as `Validation` carrying the full
/// violation list. Total and side-effect-free.
pub fn validate_payload(payload: &[u8]) -> Result<SensorReading, PipelineError> {
    let reading: SensorReading = serde_json::from_slice(payload)
        .map_err(|err| PipelineError::MalformedPayload(err.to_string()))?;

    validate_reading(&reading)?;
    Ok(reading)
}

/// Field-level range checks on an already-decoded reading.
pub fn validate_reading(reading: &SensorReading) -> Result<(), ValidationFailure> {
    let mut violations = Vec::new();

    if reading.section_id.is_empty() {
        violations.push(FieldViolation {
            field: "sectionId",
            message: "sectionId must not be empty".into(),
        });
    }

    if reading.timestamp < 0 {
        violations.push(FieldViolation {
            field: "timestamp",
            message: format!("timestamp must be >= 0, got {}", reading.timestamp),
        });
    }

    check_range(&mut violations, "acidity", reading.acidity, ACIDITY_RANGE);
    check_range(
        &mut violations,
        "soilMoisture",
        reading.soil_moisture,
        MOISTURE_RANGE,
    );
    check_range(
        &mut violations,
        "temperature",
        reading.temperature,
        TEMPERATURE_RANGE,
    );
    check_range(&mut violations, "humidity", reading.humidity, HUMIDITY_RANGE);
    check_range(
        &mut violations,
        "gasConcentration",
        reading.gas_concentration,
        GAS_RANGE,
    );

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure { violations })
    }
}

fn check_range(
    violations: &mut Vec<FieldViolation>,
    field: &'static str,
    value: f64,
    (min, max): (f64, f64),
) {
    // NaN fails both comparisons and lands here too.
    if !(value >= min && value <= max) {
        violations.push(FieldViolation {
            field,
            message: format!("{field} must be between {min} and {max}, got {value}"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "sectionId": "s1",
            "timestamp": 1000,
            "acidity": 6.5,
            "soilMoisture": 50,
            "temperature": 22,
            "humidity": 60,
            "gasConcentration": 0.2
        })
    }

    #[test]
    fn accepts_well_formed_reading() {
        let payload = serde_json::to_vec(&sample_json()).unwrap();
        let reading = validate_payload(&payload).unwrap();
        assert_eq!(reading.section_id, "s1");
        assert_eq!(reading.timestamp, 1000);
        assert_eq!(reading.acidity, 6.5);
        assert_eq!(reading.soil_moisture, 50.0);
    }

    #[test]
    fn rejects_out_of_range_acidity_with_field_message() {
        let mut json = sample_json();
        json["acidity"] = serde_json::json!(15);
        let payload = serde_json::to_vec(&json).unwrap();

        match validate_payload(&payload) {
            Err(PipelineError::Validation(failure)) => {
                assert_eq!(failure.violations.len(), 1);
                assert_eq!(failure.violations[0].field, "acidity");
                assert!(failure.violations[0].message.contains("between 0 and 14"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_moisture_with_field_message() {
        let mut json = sample_json();
        json["soilMoisture"] = serde_json::json!(-5);
        let payload = serde_json::to_vec(&json).unwrap();

        match validate_payload(&payload) {
            Err(PipelineError::Validation(failure)) => {
                assert_eq!(failure.violations[0].field, "soilMoisture");
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn collects_every_violation_not_just_the_first() {
        let mut json = sample_json();
        json["sectionId"] = serde_json::json!("");
        json["acidity"] = serde_json::json!(15);
        json["humidity"] = serde_json::json!(120);
        let payload = serde_json::to_vec(&json).unwrap();

        match validate_payload(&payload) {
            Err(PipelineError::Validation(failure)) => {
                let fields: Vec<&str> =
                    failure.violations.iter().map(|v| v.field).collect();
                assert_eq!(fields, vec!["sectionId", "acidity", "humidity"]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn undecodable_payload_is_malformed_not_validation() {
        let result = validate_payload(b"not json at all");
        assert!(matches!(result, Err(PipelineError::MalformedPayload(_))));

        // Decodable JSON of the wrong shape is still malformed.
        let result = validate_payload(br#"{"sectionId": "s1"}"#);
        assert!(matches!(result, Err(PipelineError::MalformedPayload(_))));
    }

    #[test]
    fn negative_timestamp_is_a_field_violation() {
        let mut json = sample_json();
        json["timestamp"] = serde_json::json!(-1);
        let payload = serde_json::to_vec(&json).unwrap();

        match validate_payload(&payload) {
            Err(PipelineError::Validation(failure)) => {
                assert_eq!(failure.violations[0].field, "timestamp");
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn boundary_values_are_accepted() {
        let mut json = sample_json();
        json["acidity"] = serde_json::json!(0);
        json["soilMoisture"] = serde_json::json!(100);
        json["temperature"] = serde_json::json!(-50);
        json["humidity"] = serde_json::json!(0);
        json["gasConcentration"] = serde_json::json!(10);
        let payload = serde_json::to_vec(&json).unwrap();
        assert!(validate_payload(&payload).is_ok());
    }
}
