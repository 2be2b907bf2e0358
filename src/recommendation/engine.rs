use chrono::Utc;
use log::info;
use serde_json::json;

use crate::catalog::PlantCatalog;
use crate::models::reading::SensorReading;
use crate::models::recommendation::{
    ActionCommand, ActionPriority, CompatibilityScore, IrrigationAdvice, Recommendation,
    RecommendationMetadata, Suitability,
};
use crate::recommendation::config::RecommendationConfig;
use crate::recommendation::scoring::compatibility_score;

const ALGORITHM_TAG: &str = "multi-factor-compatibility-v1.0";

/// Score a reading against the whole catalog and build the recommendation:
/// ranked top-N plants, overall health score, critical issues and the
/// actions they demand.
pub fn evaluate(
    reading: &SensorReading,
    catalog: &PlantCatalog,
    config: &RecommendationConfig,
) -> Recommendation {
    let generated_at = Utc::now();

    let mut scored: Vec<CompatibilityScore> = catalog
        .profiles()
        .iter()
        .map(|profile| {
            let score = compatibility_score(reading, profile, config);
            CompatibilityScore {
                name: profile.name.clone(),
                score,
                category: profile.category,
                suitability: Suitability::from_score(score),
            }
        })
        .collect();

    // Stable sort: equal scores keep catalog insertion order.
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(config.top_n);

    let health_score = if scored.is_empty() {
        0
    } else {
        let sum: u32 = scored.iter().map(|p| p.score).sum();
        (sum as f64 / scored.len() as f64).round() as u32
    };

    let (issues, actions) = detect_critical_conditions(reading, config);
    let requires_action = !actions.is_empty();

    let processing_time_ms = processing_latency_ms(generated_at.timestamp_millis(), reading);

    info!(
        "evaluated section {}: {} plants scored, health {}, {} issue(s)",
        reading.section_id,
        catalog.len(),
        health_score,
        issues.len()
    );

    Recommendation {
        section_id: reading.section_id.clone(),
        generated_at,
        health_score,
        recommendations: scored,
        sensor_conditions: reading.into(),
        issues,
        requires_action,
        actions,
        metadata: RecommendationMetadata {
            algorithm: ALGORITHM_TAG.to_string(),
            plants_evaluated: catalog.len(),
            processing_time_ms,
        },
    }
}

/// Check the raw reading for conditions needing immediate actuation,
/// independent of plant scoring.
fn detect_critical_conditions(
    reading: &SensorReading,
    config: &RecommendationConfig,
) -> (Vec<String>, Vec<ActionCommand>) {
    let mut issues = Vec::new();
    let mut actions = Vec::new();

    if reading.soil_moisture < config.low_moisture_threshold {
        issues.push("Low soil moisture detected".to_string());
        actions.push(ActionCommand {
            command: "irrigate_now".into(),
            parameters: json!({
                "sectionId": reading.section_id,
                "duration": config.irrigation_duration_secs,
                "priority": ActionPriority::High.as_str(),
            }),
            priority: ActionPriority::High,
        });
    }

    if reading.acidity < config.acidity_alert_min || reading.acidity > config.acidity_alert_max {
        issues.push("pH level outside acceptable range".to_string());
        actions.push(ActionCommand {
            command: "soil_treatment_required".into(),
            parameters: json!({
                "sectionId": reading.section_id,
                "currentAcidity": reading.acidity,
                "priority": ActionPriority::Medium.as_str(),
            }),
            priority: ActionPriority::Medium,
        });
    }

    if reading.gas_concentration > config.gas_alert_threshold {
        issues.push("High gas concentration detected".to_string());
        actions.push(ActionCommand {
            command: "ventilation_required".into(),
            parameters: json!({
                "sectionId": reading.section_id,
                "gasLevel": reading.gas_concentration,
                "priority": ActionPriority::High.as_str(),
            }),
            priority: ActionPriority::High,
        });
    }

    (issues, actions)
}

/// Latency between the reading's own timestamp and processing. A missing,
/// negative, or future timestamp yields 0 instead of an invalid value.
fn processing_latency_ms(now_ms: i64, reading: &SensorReading) -> i64 {
    if reading.timestamp <= 0 {
        return 0;
    }
    now_ms.checked_sub(reading.timestamp).unwrap_or(0).max(0)
}

/// Watering advisory from moisture, temperature and humidity alone.
///
/// Duration stretches 20% in hot weather (>30) and shrinks 20% under high
/// humidity (>80).
pub fn irrigation_advice(reading: &SensorReading) -> IrrigationAdvice {
    let moisture = reading.soil_moisture;
    let temperature = reading.temperature;
    let humidity = reading.humidity;

    let (recommended, base_duration, urgency) = if moisture < 25.0 {
        (true, 600.0, Some(ActionPriority::High))
    } else if moisture < 35.0 {
        (true, 300.0, Some(ActionPriority::Medium))
    } else if moisture < 45.0 && temperature > 28.0 {
        (true, 180.0, Some(ActionPriority::Low))
    } else {
        (false, 0.0, None)
    };

    let mut duration: f32 = base_duration;
    if recommended {
        if temperature > 30.0 {
            duration *= 1.2;
        }
        if humidity > 80.0 {
            duration *= 0.8;
        }
    }

    IrrigationAdvice {
        recommended,
        duration: duration.round() as u32,
        urgency,
        reason: format!(
            "Soil moisture: {moisture}%, Temperature: {temperature}°C, Humidity: {humidity}%"
        ),
    }
}
