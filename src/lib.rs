//! Race analysis engine for Formula 1 timing and telemetry data.
//!
//! Overcut turns a session's lap table and per-lap telemetry into the
//! numbers a strategist looks at: gaps to the leader, fuel-corrected pace,
//! tyre degradation per compound, ghost deltas, theoretical best laps,
//! braking zones and stint summaries.
//!
//! # Features
//!
//! - **Pure analyses**: every algorithm in [`analysis`] is a synchronous
//!   function over explicitly passed data
//! - **Concurrent engine**: [`AnalysisEngine`] fans work out per driver and
//!   merges results deterministically
//! - **Partial results**: skipped laps, drivers and compounds are reported,
//!   never silently dropped
//! - **Pluggable data**: anything implementing [`SessionProvider`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use overcut::{Overcut, SessionKey};
//!
//! #[tokio::main]
//! async fn main() -> overcut::Result<()> {
//!     let engine = Overcut::open("monza-2024-race.yaml")?;
//!     let session = engine.load(&SessionKey::new(2024, "Monza", "R")).await?;
//!
//!     let gaps = engine.race_gaps(&session, &["LEC", "PIA", "NOR"]).await?;
//!     for driver in gaps.result.drivers() {
//!         println!("{driver}: {} laps", gaps.result.get(driver).map_or(0, |g| g.len()));
//!     }
//!     for skipped in gaps.skipped.entries() {
//!         println!("skipped {}: {}", skipped.unit, skipped.reason);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Algorithms
pub mod analysis;
pub mod stats;

// Data sources and orchestration
pub mod engine;
pub mod provider;
pub mod providers;

// Core exports
pub use config::{
    AnalysisConfig, BrakingConfig, DegradationConfig, FuelModel, MAX_MICRO_SECTORS,
    MIN_RESOLUTION_M,
};
pub use error::*;
pub use types::*;

// Main API exports
pub use analysis::{Analysis, SkipReport, Skipped};
pub use engine::AnalysisEngine;
pub use provider::SessionProvider;
pub use providers::{FixtureProvider, MemoryProvider};

use std::path::Path;

/// Entry point for building analysis engines.
///
/// # Examples
///
/// ## Session documents on disk
/// ```rust,no_run
/// use overcut::Overcut;
///
/// # fn main() -> overcut::Result<()> {
/// let engine = Overcut::open("session.yaml")?;
/// # Ok(())
/// # }
/// ```
///
/// ## Custom provider
/// ```rust
/// use overcut::{AnalysisConfig, MemoryProvider, Overcut};
///
/// # fn main() -> overcut::Result<()> {
/// let engine = Overcut::with_provider(MemoryProvider::new(), AnalysisConfig::default())?;
/// assert_eq!(engine.config().micro_sectors, 25);
/// # Ok(())
/// # }
/// ```
pub struct Overcut;

impl Overcut {
    /// Engine over a single session document, with default settings.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<AnalysisEngine<FixtureProvider>> {
        AnalysisEngine::new(FixtureProvider::open(path)?, AnalysisConfig::default())
    }

    /// Engine over session documents, with settings read from a YAML file.
    pub fn open_with_config<P, C>(
        documents: &[P],
        config: C,
    ) -> Result<AnalysisEngine<FixtureProvider>>
    where
        P: AsRef<Path>,
        C: AsRef<Path>,
    {
        let config = AnalysisConfig::from_file(config)?;
        let mut provider = FixtureProvider::default();
        for document in documents {
            provider.add_file(document)?;
        }
        AnalysisEngine::new(provider, config)
    }

    /// Engine over any provider.
    pub fn with_provider<P: SessionProvider>(
        provider: P,
        config: AnalysisConfig,
    ) -> Result<AnalysisEngine<P>> {
        AnalysisEngine::new(provider, config)
    }
}
