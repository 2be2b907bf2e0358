use crate::models::plant::{ParameterRange, PlantProfile};
use crate::models::reading::SensorReading;
use crate::recommendation::config::RecommendationConfig;

/// Score a single parameter against its acceptable range.
///
/// In-range values land between 60 and 100, falling linearly with distance
/// from optimal; out-of-range values decay 10 points per unit of distance
/// from the nearest bound, floored at 0.
pub fn parameter_score(value: f64, range: &ParameterRange) -> f64 {
    if !range.contains(value) {
        let distance = range.distance_from_bounds(value);
        return (100.0 - distance * 10.0).max(0.0);
    }

    let half_range = (range.max - range.min) / 2.0;
    if half_range <= 0.0 {
        return 100.0;
    }

    let normalized = (value - range.optimal).abs() / half_range;
    (100.0 - normalized * 40.0).max(60.0)
}

/// Gas tolerance is pass/fail: 100 at or below the ceiling, 0 above it.
pub fn gas_score(value: f64, ceiling: f64) -> f64 {
    if value <= ceiling {
        100.0
    } else {
        0.0
    }
}

/// Weighted multi-factor compatibility of a reading with one profile,
/// rounded and clamped to [0, 100].
pub fn compatibility_score(
    reading: &SensorReading,
    profile: &PlantProfile,
    config: &RecommendationConfig,
) -> u32 {
    let weighted = parameter_score(reading.acidity, &profile.acidity) * config.weight_acidity
        + parameter_score(reading.soil_moisture, &profile.moisture) * config.weight_moisture
        + parameter_score(reading.temperature, &profile.temperature)
            * config.weight_temperature
        + parameter_score(reading.humidity, &profile.humidity) * config.weight_humidity
        + gas_score(reading.gas_concentration, profile.gas_ceiling) * config.weight_gas;

    weighted.round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PlantCatalog;

    fn reading(acidity: f64, moisture: f64, temp: f64, humidity: f64, gas: f64) -> SensorReading {
        SensorReading {
            section_id: "s1".into(),
            timestamp: 1_000,
            acidity,
            soil_moisture: moisture,
            temperature: temp,
            humidity,
            gas_concentration: gas,
        }
    }

    #[test]
    fn optimal_conditions_score_exactly_100() {
        let catalog = PlantCatalog::builtin();
        let config = RecommendationConfig::default();
        for profile in catalog.profiles() {
            let r = reading(
                profile.acidity.optimal,
                profile.moisture.optimal,
                profile.temperature.optimal,
                profile.humidity.optimal,
                0.0,
            );
            assert_eq!(
                compatibility_score(&r, profile, &config),
                100,
                "{} should score 100 at its optimum",
                profile.name
            );
        }
    }

    #[test]
    fn in_range_parameter_never_scores_below_60() {
        let range = ParameterRange::new(6.0, 7.0, 6.5);
        for value in [6.0, 6.1, 6.5, 6.9, 7.0] {
            assert!(parameter_score(value, &range) >= 60.0, "value {value}");
        }
    }

    #[test]
    fn out_of_range_decays_linearly_from_nearest_bound() {
        let range = ParameterRange::new(40.0, 70.0, 55.0);
        // 2 units below min: 100 - 20 = 80.
        assert_eq!(parameter_score(38.0, &range), 80.0);
        // 5 units above max: 100 - 50 = 50.
        assert_eq!(parameter_score(75.0, &range), 50.0);
        // Far out: floored at zero, never negative.
        assert_eq!(parameter_score(200.0, &range), 0.0);
    }

    #[test]
    fn gas_score_is_binary_at_the_ceiling() {
        assert_eq!(gas_score(0.3, 0.3), 100.0);
        assert_eq!(gas_score(0.31, 0.3), 0.0);
    }

    #[test]
    fn degenerate_range_scores_100_at_its_only_value() {
        let range = ParameterRange::new(5.0, 5.0, 5.0);
        assert_eq!(parameter_score(5.0, &range), 100.0);
    }

    #[test]
    fn score_is_clamped_for_wildly_invalid_input() {
        let catalog = PlantCatalog::builtin();
        let config = RecommendationConfig::default();
        let profile = &catalog.profiles()[0];

        let r = reading(f64::NAN, -1000.0, 1000.0, f64::INFINITY, 99.0);
        let score = compatibility_score(&r, profile, &config);
        assert!(score <= 100, "score {score} escaped the clamp");
    }
}
