/// Tunables for compatibility scoring and critical-condition detection.
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    /// Per-factor weights; must sum to 1.0.
    pub weight_acidity: f64,
    pub weight_moisture: f64,
    pub weight_temperature: f64,
    pub weight_humidity: f64,
    pub weight_gas: f64,

    /// How many ranked plants a recommendation carries.
    pub top_n: usize,

    /// Soil moisture below this triggers immediate irrigation.
    pub low_moisture_threshold: f64,
    /// Acidity outside [min, max] triggers soil treatment.
    pub acidity_alert_min: f64,
    pub acidity_alert_max: f64,
    /// Gas concentration above this triggers ventilation.
    pub gas_alert_threshold: f64,
    /// Seconds of watering requested by the irrigation action.
    pub irrigation_duration_secs: u32,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            weight_acidity: 0.25,
            weight_moisture: 0.25,
            weight_temperature: 0.25,
            weight_humidity: 0.15,
            weight_gas: 0.10,
            top_n: 3,
            low_moisture_threshold: 30.0,
            acidity_alert_min: 5.5,
            acidity_alert_max: 8.0,
            gas_alert_threshold: 0.5,
            irrigation_duration_secs: 300,
        }
    }
}
