pub mod broker;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod pipeline;
pub mod recommendation;
pub mod utils;
pub mod validation;

pub use broker::{ActionDispatcher, ConnectionManager, ConnectionState, TelemetryMessage};
pub use catalog::PlantCatalog;
pub use config::Config;
pub use error::PipelineError;
pub use gateway::{InMemoryGateway, PersistenceGateway};
pub use models::{Recommendation, SensorReading};
pub use recommendation::RecommendationConfig;
