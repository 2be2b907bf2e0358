use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::reading::SensorReading;
use crate::models::recommendation::Recommendation;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// Port to the external key-path store. The real service lives outside this
/// process; the core only ever calls these three operations and treats
/// failures as logged, non-fatal events.
pub trait PersistenceGateway: Send + Sync {
    /// Persist a validated reading; returns the stored reading's id.
    fn store_reading(
        &self,
        reading: &SensorReading,
    ) -> impl Future<Output = Result<String, GatewayError>> + Send;

    /// Persist a recommendation; the previous one for the same section is
    /// superseded (last-write-wins at the store).
    fn store_recommendation(
        &self,
        section_id: &str,
        recommendation: &Recommendation,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Most recent reading for a section, if any.
    fn latest_reading(
        &self,
        section_id: &str,
    ) -> impl Future<Output = Result<Option<SensorReading>, GatewayError>> + Send;
}

#[derive(Debug, Default)]
struct SectionRecord {
    readings: Vec<(String, SensorReading)>,
    recommendation: Option<Recommendation>,
}

/// In-process stand-in for the external store; backs the binary when no
/// store is wired up, and the tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    sections: Arc<RwLock<HashMap<String, SectionRecord>>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reading_count(&self, section_id: &str) -> usize {
        self.sections
            .read()
            .await
            .get(section_id)
            .map(|record| record.readings.len())
            .unwrap_or(0)
    }

    pub async fn latest_recommendation(&self, section_id: &str) -> Option<Recommendation> {
        self.sections
            .read()
            .await
            .get(section_id)
            .and_then(|record| record.recommendation.clone())
    }
}

impl PersistenceGateway for InMemoryGateway {
    async fn store_reading(&self, reading: &SensorReading) -> Result<String, GatewayError> {
        let id = format!("reading_{}", Uuid::new_v4());
        let mut sections = self.sections.write().await;
        let record = sections.entry(reading.section_id.clone()).or_default();
        record.readings.push((id.clone(), reading.clone()));
        Ok(id)
    }

    async fn store_recommendation(
        &self,
        section_id: &str,
        recommendation: &Recommendation,
    ) -> Result<(), GatewayError> {
        let mut sections = self.sections.write().await;
        let record = sections.entry(section_id.to_string()).or_default();
        record.recommendation = Some(recommendation.clone());
        Ok(())
    }

    async fn latest_reading(
        &self,
        section_id: &str,
    ) -> Result<Option<SensorReading>, GatewayError> {
        Ok(self
            .sections
            .read()
            .await
            .get(section_id)
            .and_then(|record| record.readings.last())
            .map(|(_, reading)| reading.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(section: &str, moisture: f64) -> SensorReading {
        SensorReading {
            section_id: section.into(),
            timestamp: 1_000,
            acidity: 6.5,
            soil_moisture: moisture,
            temperature: 22.0,
            humidity: 60.0,
            gas_concentration: 0.2,
        }
    }

    #[tokio::test]
    async fn latest_reading_tracks_the_newest_write() {
        let gateway = InMemoryGateway::new();
        assert_eq!(gateway.latest_reading("s1").await.unwrap(), None);

        gateway.store_reading(&reading("s1", 40.0)).await.unwrap();
        gateway.store_reading(&reading("s1", 55.0)).await.unwrap();

        let latest = gateway.latest_reading("s1").await.unwrap().unwrap();
        assert_eq!(latest.soil_moisture, 55.0);
        assert_eq!(gateway.reading_count("s1").await, 2);
    }

    #[tokio::test]
    async fn stored_ids_are_unique() {
        let gateway = InMemoryGateway::new();
        let a = gateway.store_reading(&reading("s1", 40.0)).await.unwrap();
        let b = gateway.store_reading(&reading("s1", 41.0)).await.unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("reading_"));
    }

    #[tokio::test]
    async fn sections_are_isolated() {
        let gateway = InMemoryGateway::new();
        gateway.store_reading(&reading("s1", 40.0)).await.unwrap();

        assert_eq!(gateway.latest_reading("s2").await.unwrap(), None);
        assert_eq!(gateway.reading_count("s2").await, 0);
    }
}
