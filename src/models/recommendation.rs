use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plant::PlantCategory;
use super::reading::SensorConditions;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Suitability {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Suitability {
    /// Tier boundaries: >=80 excellent, >=60 good, >=40 fair, else poor.
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Suitability::Excellent,
            60..=79 => Suitability::Good,
            40..=59 => Suitability::Fair,
            _ => Suitability::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Suitability::Excellent => "excellent",
            Suitability::Good => "good",
            Suitability::Fair => "fair",
            Suitability::Poor => "poor",
        }
    }
}

/// How well one section's current conditions match one plant profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityScore {
    pub name: String,
    /// Rounded 0-100, clamped regardless of input range violations.
    pub score: u32,
    pub category: PlantCategory,
    pub suitability: Suitability,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActionPriority {
    High,
    Medium,
    Low,
}

impl ActionPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionPriority::High => "high",
            ActionPriority::Medium => "medium",
            ActionPriority::Low => "low",
        }
    }
}

/// An actuation request produced by critical-condition detection. The
/// dispatcher wraps it into the outbound command envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCommand {
    pub command: String,
    pub parameters: serde_json::Value,
    pub priority: ActionPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationMetadata {
    pub algorithm: String,
    pub plants_evaluated: usize,
    /// Wall-clock delta between the reading's own timestamp and processing.
    /// Zero when the reading timestamp is unusable.
    pub processing_time_ms: i64,
}

/// One recommendation per processed reading; the next reading for the same
/// section supersedes it (last-write-wins at the external store).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub section_id: String,
    pub generated_at: DateTime<Utc>,
    pub health_score: u32,
    pub recommendations: Vec<CompatibilityScore>,
    pub sensor_conditions: SensorConditions,
    pub issues: Vec<String>,
    pub requires_action: bool,
    pub actions: Vec<ActionCommand>,
    pub metadata: RecommendationMetadata,
}

/// Advisory produced from moisture/temperature/humidity alone; consumed by
/// the external control surface, not by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationAdvice {
    pub recommended: bool,
    /// Seconds of watering, already adjusted for weather.
    pub duration: u32,
    /// Absent when no watering is recommended.
    pub urgency: Option<ActionPriority>,
    pub reason: String,
}
