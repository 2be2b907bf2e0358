use chrono::{Datelike, Utc};

use crate::models::plant::{ParameterRange, PlantCategory, PlantProfile, Season};

/// Read-only catalog of plant growing profiles, loaded once at startup.
///
/// Insertion order is significant: the ranking stage uses a stable sort, so
/// two plants with equal scores keep their catalog order.
#[derive(Debug, Clone)]
pub struct PlantCatalog {
    profiles: Vec<PlantProfile>,
}

impl PlantCatalog {
    pub fn new(profiles: Vec<PlantProfile>) -> Self {
        Self { profiles }
    }

    /// The builtin 12-profile catalog.
    pub fn builtin() -> Self {
        Self::new(builtin_profiles())
    }

    pub fn profiles(&self) -> &[PlantProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PlantProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Profiles that grow in the given season, in catalog order.
    pub fn in_season(&self, season: Season) -> Vec<&PlantProfile> {
        self.profiles.iter().filter(|p| p.grows_in(season)).collect()
    }
}

/// Growing season for the current calendar month.
pub fn current_season() -> Season {
    Season::from_month(Utc::now().month())
}

fn profile(
    name: &str,
    category: PlantCategory,
    growing_seasons: &[Season],
    acidity: ParameterRange,
    moisture: ParameterRange,
    temperature: ParameterRange,
    humidity: ParameterRange,
    gas_ceiling: f64,
) -> PlantProfile {
    PlantProfile {
        name: name.to_string(),
        category,
        growing_seasons: growing_seasons.to_vec(),
        acidity,
        moisture,
        temperature,
        humidity,
        gas_ceiling,
    }
}

fn builtin_profiles() -> Vec<PlantProfile> {
    use PlantCategory::*;
    use Season::*;

    let r = ParameterRange::new;

    vec![
        profile(
            "Tomatoes",
            Fruit,
            &[Spring, Summer],
            r(6.0, 6.8, 6.4),
            r(40.0, 70.0, 55.0),
            r(18.0, 30.0, 24.0),
            r(50.0, 80.0, 65.0),
            0.3,
        ),
        profile(
            "Peppers",
            Fruit,
            &[Spring, Summer],
            r(6.0, 7.0, 6.5),
            r(35.0, 65.0, 50.0),
            r(20.0, 32.0, 26.0),
            r(45.0, 75.0, 60.0),
            0.35,
        ),
        profile(
            "Cucumbers",
            Fruit,
            &[Spring, Summer],
            r(6.0, 7.0, 6.5),
            r(50.0, 80.0, 65.0),
            r(18.0, 28.0, 23.0),
            r(60.0, 90.0, 75.0),
            0.25,
        ),
        profile(
            "Lettuce",
            Leafy,
            &[Spring, Fall, Winter],
            r(6.0, 7.5, 6.8),
            r(45.0, 75.0, 60.0),
            r(12.0, 24.0, 18.0),
            r(50.0, 85.0, 70.0),
            0.2,
        ),
        profile(
            "Spinach",
            Leafy,
            &[Spring, Fall, Winter],
            r(6.0, 7.5, 6.8),
            r(40.0, 70.0, 55.0),
            r(10.0, 20.0, 15.0),
            r(45.0, 80.0, 65.0),
            0.25,
        ),
        profile(
            "Herbs",
            Herbs,
            &[Spring, Summer, Fall],
            r(6.0, 7.5, 6.8),
            r(30.0, 60.0, 45.0),
            r(15.0, 28.0, 22.0),
            r(40.0, 70.0, 55.0),
            0.3,
        ),
        profile(
            "Carrots",
            Root,
            &[Spring, Fall],
            r(6.0, 7.0, 6.5),
            r(35.0, 65.0, 50.0),
            r(12.0, 25.0, 18.0),
            r(45.0, 75.0, 60.0),
            0.4,
        ),
        profile(
            "Radishes",
            Root,
            &[Spring, Fall],
            r(6.0, 7.0, 6.5),
            r(40.0, 70.0, 55.0),
            r(10.0, 22.0, 16.0),
            r(50.0, 80.0, 65.0),
            0.35,
        ),
        profile(
            "Onions",
            Bulb,
            &[Spring, Summer, Fall],
            r(6.0, 7.5, 6.8),
            r(25.0, 55.0, 40.0),
            r(12.0, 28.0, 20.0),
            r(40.0, 70.0, 55.0),
            0.45,
        ),
        profile(
            "Beans",
            Legume,
            &[Spring, Summer],
            r(6.0, 7.5, 6.8),
            r(35.0, 65.0, 50.0),
            r(18.0, 30.0, 24.0),
            r(50.0, 80.0, 65.0),
            0.3,
        ),
        profile(
            "Peas",
            Legume,
            &[Spring, Fall],
            r(6.0, 7.5, 6.8),
            r(40.0, 70.0, 55.0),
            r(10.0, 22.0, 16.0),
            r(50.0, 85.0, 70.0),
            0.25,
        ),
        profile(
            "Corn",
            Grain,
            &[Spring, Summer],
            r(6.0, 7.0, 6.5),
            r(45.0, 75.0, 60.0),
            r(18.0, 35.0, 27.0),
            r(55.0, 85.0, 70.0),
            0.4,
        ),
    ]
}
