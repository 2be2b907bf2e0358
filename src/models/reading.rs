use serde::{Deserialize, Serialize};

/// A validated environmental telemetry sample for one field section.
///
/// Construction goes through `validation::validate_payload`; once built the
/// reading is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub section_id: String,
    /// Unix epoch milliseconds as reported by the sensor node.
    pub timestamp: i64,
    pub acidity: f64,
    pub soil_moisture: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub gas_concentration: f64,
}

/// Echo of the conditions a recommendation was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorConditions {
    pub acidity: f64,
    pub soil_moisture: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub gas_concentration: f64,
}

impl From<&SensorReading> for SensorConditions {
    fn from(reading: &SensorReading) -> Self {
        Self {
            acidity: reading.acidity,
            soil_moisture: reading.soil_moisture,
            temperature: reading.temperature,
            humidity: reading.humidity,
            gas_concentration: reading.gas_concentration,
        }
    }
}
