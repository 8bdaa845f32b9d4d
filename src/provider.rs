//! Provider trait for session data sources

use crate::Result;
use crate::types::{Corner, LapTable, SessionKey, TelemetrySeries};

/// Source of session data for the analysis engine.
///
/// Providers own all I/O and caching; the analyses only ever see the
/// immutable tables they return. Three methods cover what the engine needs.
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync + 'static {
    /// Load every lap of a session.
    ///
    /// Returns:
    /// - `Ok(table)` - Session loaded (the table may be empty)
    /// - `Err(e)` - Session unavailable; usually
    ///   [`AnalysisError::Upstream`](crate::AnalysisError::Upstream)
    async fn load(&self, key: &SessionKey) -> Result<LapTable>;

    /// Telemetry of one lap.
    ///
    /// Returns:
    /// - `Ok(Some(series))` - Telemetry available
    /// - `Ok(None)` - The lap exists but telemetry was never captured
    /// - `Err(e)` - Unknown lap, or the provider failed
    async fn telemetry(
        &self,
        key: &SessionKey,
        driver: &str,
        lap: u32,
    ) -> Result<Option<TelemetrySeries>>;

    /// Corner markers of the session's circuit, for presentation overlays.
    async fn circuit_corners(&self, key: &SessionKey) -> Result<Vec<Corner>>;
}
