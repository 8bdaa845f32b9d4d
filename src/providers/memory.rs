//! In-process provider over already built tables

use std::collections::HashMap;
use tracing::{debug, trace};

use crate::provider::SessionProvider;
use crate::types::{Corner, LapTable, SessionKey, TelemetrySeries};
use crate::{AnalysisError, Result};

#[derive(Debug, Clone, Default)]
struct StoredSession {
    laps: LapTable,
    corners: Vec<Corner>,
    telemetry: HashMap<(String, u32), TelemetrySeries>,
}

/// Provider serving sessions held in memory.
///
/// Sessions are inserted up front; once the provider is handed to an
/// engine it is only read.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    sessions: HashMap<SessionKey, StoredSession>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a session's laps.
    pub fn insert_session(&mut self, key: SessionKey, laps: LapTable) -> &mut Self {
        debug!(session = %key, laps = laps.len(), "Stored session");
        self.sessions.entry(key).or_default().laps = laps;
        self
    }

    /// Attach telemetry to one lap of a stored session.
    pub fn insert_telemetry(
        &mut self,
        key: &SessionKey,
        driver: impl Into<String>,
        lap: u32,
        series: TelemetrySeries,
    ) -> Result<&mut Self> {
        let session = self.session_mut(key)?;
        session.telemetry.insert((driver.into(), lap), series);
        Ok(self)
    }

    /// Set the circuit corners of a stored session.
    pub fn insert_corners(&mut self, key: &SessionKey, corners: Vec<Corner>) -> Result<&mut Self> {
        self.session_mut(key)?.corners = corners;
        Ok(self)
    }

    /// Keys of every stored session.
    pub fn sessions(&self) -> impl Iterator<Item = &SessionKey> {
        self.sessions.keys()
    }

    fn session(&self, key: &SessionKey) -> Result<&StoredSession> {
        self.sessions.get(key).ok_or_else(|| unavailable(key))
    }

    fn session_mut(&mut self, key: &SessionKey) -> Result<&mut StoredSession> {
        self.sessions.get_mut(key).ok_or_else(|| unavailable(key))
    }
}

fn unavailable(key: &SessionKey) -> AnalysisError {
    AnalysisError::upstream_failed(format!("session {key} is not available"))
}

#[async_trait::async_trait]
impl SessionProvider for MemoryProvider {
    async fn load(&self, key: &SessionKey) -> Result<LapTable> {
        let session = self.session(key)?;
        debug!(session = %key, laps = session.laps.len(), "Loaded session from memory");
        Ok(session.laps.clone())
    }

    async fn telemetry(
        &self,
        key: &SessionKey,
        driver: &str,
        lap: u32,
    ) -> Result<Option<TelemetrySeries>> {
        let session = self.session(key)?;
        if session.laps.lap(driver, lap).is_none() {
            return Err(AnalysisError::LapNotFound { driver: driver.to_string(), lap });
        }
        let series = session.telemetry.get(&(driver.to_string(), lap)).cloned();
        let samples = series.as_ref().map_or(0, TelemetrySeries::len);
        trace!(driver, lap, samples, "Served telemetry");
        Ok(series)
    }

    async fn circuit_corners(&self, key: &SessionKey) -> Result<Vec<Corner>> {
        Ok(self.session(key)?.corners.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{constant_speed_trace, race_table};

    fn key() -> SessionKey {
        SessionKey::new(2024, "Monza", "R")
    }

    #[tokio::test]
    async fn serves_inserted_data() {
        let mut provider = MemoryProvider::new();
        provider.insert_session(key(), race_table(&[("LEC", [85.0, 170.5])]));
        let trace = constant_speed_trace(5793.0, 10.0, 70.0);
        provider.insert_telemetry(&key(), "LEC", 2, trace).unwrap();
        provider.insert_corners(&key(), vec![Corner { number: 1, distance: 720.0 }]).unwrap();

        let table = provider.load(&key()).await.unwrap();
        assert_eq!(table.len(), 2);
        assert!(provider.telemetry(&key(), "LEC", 2).await.unwrap().is_some());
        assert!(provider.telemetry(&key(), "LEC", 1).await.unwrap().is_none());
        assert_eq!(provider.circuit_corners(&key()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_an_upstream_failure() {
        let provider = MemoryProvider::new();
        let err = provider.load(&key()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Upstream { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn unknown_lap_is_not_fatal() {
        let mut provider = MemoryProvider::new();
        provider.insert_session(key(), race_table(&[("LEC", [85.0])]));
        let err = provider.telemetry(&key(), "LEC", 9).await.unwrap_err();
        assert!(matches!(err, AnalysisError::LapNotFound { lap: 9, .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn telemetry_needs_a_stored_session() {
        let mut provider = MemoryProvider::new();
        let result = provider.insert_telemetry(&key(), "LEC", 1, TelemetrySeries::default());
        assert!(result.is_err());
    }
}
