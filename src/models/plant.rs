use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        }
    }

    /// Map a calendar month (1-12) to its growing season.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PlantCategory {
    Fruit,
    Leafy,
    Herbs,
    Root,
    Bulb,
    Legume,
    Grain,
}

impl PlantCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlantCategory::Fruit => "fruit",
            PlantCategory::Leafy => "leafy",
            PlantCategory::Herbs => "herbs",
            PlantCategory::Root => "root",
            PlantCategory::Bulb => "bulb",
            PlantCategory::Legume => "legume",
            PlantCategory::Grain => "grain",
        }
    }
}

/// Acceptable band for one environmental parameter, with the value the plant
/// does best at. Invariant: `min <= optimal <= max`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub optimal: f64,
}

impl ParameterRange {
    pub const fn new(min: f64, max: f64, optimal: f64) -> Self {
        Self { min, max, optimal }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Distance from `value` to the nearest bound, in the parameter's own
    /// unit. Zero for in-range values.
    pub fn distance_from_bounds(&self, value: f64) -> f64 {
        if self.contains(value) {
            0.0
        } else {
            (value - self.min).abs().min((value - self.max).abs())
        }
    }
}

/// Growing requirements for one plant. The catalog is static; profiles are
/// built once at startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantProfile {
    pub name: String,
    pub category: PlantCategory,
    pub growing_seasons: Vec<Season>,
    pub acidity: ParameterRange,
    pub moisture: ParameterRange,
    pub temperature: ParameterRange,
    pub humidity: ParameterRange,
    /// Upper bound on tolerable gas concentration; above it the gas factor
    /// scores zero.
    pub gas_ceiling: f64,
}

impl PlantProfile {
    pub fn grows_in(&self, season: Season) -> bool {
        self.growing_seasons.contains(&season)
    }
}
