pub mod config;
pub mod engine;
pub mod scoring;

pub use config::RecommendationConfig;
pub use engine::{evaluate, irrigation_advice};
