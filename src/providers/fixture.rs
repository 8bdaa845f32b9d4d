//! File-backed provider reading YAML session documents
//!
//! A session document carries everything one session needs:
//!
//! ```yaml
//! session: { year: 2024, event: Monza, sessionType: R }
//! corners:
//!   - { number: 1, distance: 720.0 }
//! laps:
//!   - { Driver: LEC, LapNumber: 1, LapTime: 85.2, Position: 1, Time: 85.2 }
//! telemetry:
//!   - driver: LEC
//!     lap: 1
//!     samples:
//!       - { Time: 0.0, Distance: 0.0, Speed: 290 }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::MemoryProvider;
use crate::provider::SessionProvider;
use crate::types::{Corner, LapRecord, LapTable, SessionKey, TelemetrySeries};
use crate::{AnalysisError, Result};

#[derive(Debug, Deserialize)]
struct SessionDocument {
    session: SessionKey,
    #[serde(default)]
    corners: Vec<Corner>,
    #[serde(default)]
    laps: Vec<LapRecord>,
    #[serde(default)]
    telemetry: Vec<LapTelemetry>,
}

#[derive(Debug, Deserialize)]
struct LapTelemetry {
    driver: String,
    lap: u32,
    samples: TelemetrySeries,
}

/// Provider serving sessions from YAML documents.
#[derive(Debug, Clone, Default)]
pub struct FixtureProvider {
    inner: MemoryProvider,
    sources: Vec<PathBuf>,
}

impl FixtureProvider {
    /// Open a single session document.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut provider = Self::default();
        provider.add_file(path)?;
        Ok(provider)
    }

    /// Parse a single session document from a string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut provider = Self::default();
        provider.add_document(yaml)?;
        Ok(provider)
    }

    /// Add another session document from disk.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<SessionKey> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::file_error(path.to_path_buf(), e))?;
        let key = self.add_document(&yaml).map_err(|e| match e {
            AnalysisError::Parse { details, .. } => {
                AnalysisError::Parse { context: path.display().to_string(), details }
            }
            other => other,
        })?;
        self.sources.push(path.to_path_buf());
        info!(path = %path.display(), session = %key, "Opened session document");
        Ok(key)
    }

    /// Add another session document from a string.
    pub fn add_document(&mut self, yaml: &str) -> Result<SessionKey> {
        let document: SessionDocument = serde_yaml_ng::from_str(yaml)?;
        let key = document.session;

        self.inner.insert_session(key.clone(), LapTable::new(document.laps));
        self.inner.insert_corners(&key, document.corners)?;
        let laps_with_telemetry = document.telemetry.len();
        for entry in document.telemetry {
            self.inner.insert_telemetry(&key, entry.driver, entry.lap, entry.samples)?;
        }

        debug!(session = %key, laps_with_telemetry, "Parsed session document");
        Ok(key)
    }

    /// Files the sessions were read from.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

#[async_trait::async_trait]
impl SessionProvider for FixtureProvider {
    async fn load(&self, key: &SessionKey) -> Result<LapTable> {
        self.inner.load(key).await
    }

    async fn telemetry(
        &self,
        key: &SessionKey,
        driver: &str,
        lap: u32,
    ) -> Result<Option<TelemetrySeries>> {
        self.inner.telemetry(key, driver, lap).await
    }

    async fn circuit_corners(&self, key: &SessionKey) -> Result<Vec<Corner>> {
        self.inner.circuit_corners(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"
session: { year: 2023, event: Suzuka, sessionType: Q }
corners:
  - { number: 1, distance: 410.0 }
  - { number: 2, distance: 640.0 }
laps:
  - { Driver: VER, LapNumber: 1, LapTime: 89.1, Compound: SOFT, IsAccurate: true, TrackStatus: "1" }
  - { Driver: VER, LapNumber: 2, LapTime: 88.9, Compound: SOFT, IsAccurate: true, TrackStatus: "1" }
telemetry:
  - driver: VER
    lap: 2
    samples:
      - { Time: 0.0, Distance: 0.0, Speed: 280, Throttle: 100, Brake: false }
      - { Time: 1.0, Distance: 78.0, Speed: 282, Throttle: 100, Brake: false }
"#;

    #[tokio::test]
    async fn parses_a_session_document() {
        let provider = FixtureProvider::from_yaml_str(DOCUMENT).unwrap();
        let key = SessionKey::new(2023, "Suzuka", "Q");

        let table = provider.load(&key).await.unwrap();
        assert_eq!(table.drivers(), ["VER".to_string()]);
        assert_eq!(table.fastest_lap("VER").map(|l| l.lap_number), Some(2));

        let series = provider.telemetry(&key, "VER", 2).await.unwrap().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.max_distance(), Some(78.0));
        assert!(provider.telemetry(&key, "VER", 1).await.unwrap().is_none());
        assert_eq!(provider.circuit_corners(&key).await.unwrap().len(), 2);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = FixtureProvider::from_yaml_str("session: [not, a, key]").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { .. }));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = FixtureProvider::open("/nonexistent/session.yaml").unwrap_err();
        assert!(
            matches!(err, AnalysisError::File { ref path, .. } if path.ends_with("session.yaml"))
        );
    }
}
