//! Engine running analyses over provider sessions
//!
//! The engine owns a provider and a configuration, and nothing else: every
//! request works on an immutable [`Session`] snapshot passed in explicitly,
//! so any number of sessions can be analysed at once. CPU-bound work runs on
//! the blocking pool, one task per driver, and results are merged in a fixed
//! order so they never depend on which task finished first.
//!
//! Every request is bounded by the configured budget and aborted when the
//! engine shuts down.

use futures::future::{join_all, try_join_all};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analysis::{
    self, Analysis, BrakingZone, ClassifiedLap, DegradationReport, FieldCorrection,
    FuelCorrectedLap, GapChart, GhostDelta, LeaderTimes, SkipReport, SpeedComparison,
    TheoreticalBest,
};
use crate::config::AnalysisConfig;
use crate::provider::SessionProvider;
use crate::types::{LapRecord, Session, SessionKey, TelemetrySeries};
use crate::{AnalysisError, Result};

/// Runs analyses for sessions served by a provider.
pub struct AnalysisEngine<P> {
    provider: Arc<P>,
    config: Arc<AnalysisConfig>,
    cancel: CancellationToken,
}

impl<P> AnalysisEngine<P>
where
    P: SessionProvider,
{
    /// Create an engine; the configuration is validated first.
    pub fn new(provider: P, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            provider: Arc::new(provider),
            config: Arc::new(config),
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Token cancelled when the engine shuts down.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Abort every in-flight request; later requests fail with `Cancelled`.
    pub fn shutdown(&self) {
        info!("Shutting down analysis engine");
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Load a session snapshot.
    ///
    /// Corner markers are presentation data; failing to fetch them leaves
    /// the snapshot without corners rather than failing the load.
    pub async fn load(&self, key: &SessionKey) -> Result<Arc<Session>> {
        self.guarded("load", async {
            let laps = self.provider.load(key).await?;
            let corners = match self.provider.circuit_corners(key).await {
                Ok(corners) => corners,
                Err(e) => {
                    warn!(session = %key, error = %e, "Circuit corners unavailable");
                    Vec::new()
                }
            };
            info!(
                session = %key,
                laps = laps.len(),
                drivers = laps.drivers().len(),
                "Session loaded"
            );
            Ok(Arc::new(Session::new(key.clone(), laps).with_corners(corners)))
        })
        .await
    }

    /// Push, slow, in and out laps of one driver at the configured threshold.
    pub fn classify_laps(&self, session: &Session, driver: &str) -> Vec<ClassifiedLap> {
        analysis::classify_laps(&session.laps, driver, self.config.push_lap_threshold)
    }

    /// Gap to leader for the requested drivers, in request order.
    pub async fn race_gaps<S: AsRef<str>>(
        &self,
        session: &Arc<Session>,
        drivers: &[S],
    ) -> Result<Analysis<GapChart>> {
        let requested = unique_drivers(drivers);
        let session = Arc::clone(session);

        self.guarded("race_gaps", async move {
            let leaders = {
                let session = Arc::clone(&session);
                Arc::new(blocking(move || LeaderTimes::from_table(&session.laps)).await?)
            };

            let tasks = requested.iter().map(|driver| {
                let (session, leaders) = (Arc::clone(&session), Arc::clone(&leaders));
                let driver = driver.clone();
                blocking(move || analysis::driver_gaps(&session.laps, &leaders, &driver))
            });
            let results = try_join_all(tasks).await?;

            let mut chart = GapChart::default();
            let mut skipped = SkipReport::new();
            for (driver, gaps) in requested.into_iter().zip(results) {
                match gaps {
                    Some(gaps) => chart.push(driver, gaps),
                    None => skipped.note(driver, "driver not in session"),
                }
            }
            debug!(drivers = chart.len(), leader_laps = leaders.len(), "Race gaps ready");
            Ok(Analysis::new(chart, skipped))
        })
        .await
    }

    /// Fuel-corrected lap times of one driver.
    pub async fn fuel_correction(
        &self,
        session: &Arc<Session>,
        driver: &str,
    ) -> Result<Analysis<Vec<FuelCorrectedLap>>> {
        let (session, driver, model) = (Arc::clone(session), driver.to_string(), self.config.fuel);
        self.guarded("fuel_correction", async move {
            blocking(move || {
                let laps = session.laps.driver_laps(&driver);
                let mut result = analysis::fuel_corrected_laps(laps, &model);
                if !session.laps.contains_driver(&driver) {
                    result.skipped.note(driver, "driver not in session");
                }
                result
            })
            .await
        })
        .await
    }

    /// Tyre degradation of the whole field.
    pub async fn tyre_degradation(
        &self,
        session: &Arc<Session>,
    ) -> Result<Analysis<DegradationReport>> {
        let session = Arc::clone(session);
        let config = self.config.degradation;
        self.guarded("tyre_degradation", async move {
            let correction = {
                let session = Arc::clone(&session);
                blocking(move || FieldCorrection::prepare(&session.laps, &config)).await?
            };

            let tasks = session.laps.drivers().iter().map(|driver| {
                let (session, driver) = (Arc::clone(&session), driver.clone());
                blocking(move || {
                    analysis::driver_degradation(&session.laps, &driver, &correction, &config)
                })
            });
            let per_driver = try_join_all(tasks).await?;

            let mut entries = Vec::new();
            let mut skipped = SkipReport::new();
            for analysis in per_driver {
                entries.extend(analysis.result);
                skipped.extend(analysis.skipped);
            }
            let evolution = correction.track_evolution_per_lap();
            let report = DegradationReport::from_entries(evolution, entries);
            debug!(evolution, skipped = skipped.len(), "Degradation ready");
            Ok(Analysis::new(report, skipped))
        })
        .await
    }

    /// Degradation reports of several sessions, analysed concurrently.
    ///
    /// Output follows the order of `keys`. A session that cannot be loaded
    /// fails the whole request.
    pub async fn degradation_across(
        &self,
        keys: &[SessionKey],
    ) -> Result<Vec<(SessionKey, Analysis<DegradationReport>)>> {
        let tasks = keys.iter().map(|key| async move {
            let session = self.load(key).await?;
            let report = self.tyre_degradation(&session).await?;
            Ok::<_, AnalysisError>((key.clone(), report))
        });
        try_join_all(tasks).await
    }

    /// Ghost delta between two laps; `None` picks the driver's fastest lap.
    pub async fn ghost_delta(
        &self,
        session: &Arc<Session>,
        driver_a: &str,
        lap_a: Option<u32>,
        driver_b: &str,
        lap_b: Option<u32>,
    ) -> Result<Analysis<GhostDelta>> {
        let resolution = self.config.ghost_resolution_m;
        self.guarded("ghost_delta", async {
            let mut skipped = SkipReport::new();
            let pair = self.lap_pair(session, (driver_a, lap_a), (driver_b, lap_b), &mut skipped);
            let Some((trace_a, trace_b)) = pair.await? else {
                return Ok(Analysis::new(GhostDelta::default(), skipped));
            };

            let mut result =
                blocking(move || analysis::ghost_delta(&trace_a, &trace_b, resolution)).await?;
            skipped.extend(result.skipped);
            result.skipped = skipped;
            Ok(result)
        })
        .await
    }

    /// Speed comparison of two drivers' fastest laps.
    pub async fn compare_speed(
        &self,
        session: &Arc<Session>,
        driver_a: &str,
        driver_b: &str,
    ) -> Result<Analysis<SpeedComparison>> {
        let resolution = self.config.comparison_resolution_m;
        self.guarded("compare_speed", async {
            let mut skipped = SkipReport::new();
            let pair = self.lap_pair(session, (driver_a, None), (driver_b, None), &mut skipped);
            let Some((trace_a, trace_b)) = pair.await? else {
                return Ok(Analysis::new(SpeedComparison::default(), skipped));
            };

            let mut result =
                blocking(move || analysis::compare_speed(&trace_a, &trace_b, resolution)).await?;
            skipped.extend(result.skipped);
            result.skipped = skipped;
            Ok(result)
        })
        .await
    }

    /// Braking zones of one lap; `None` picks the driver's fastest lap.
    pub async fn braking_zones(
        &self,
        session: &Arc<Session>,
        driver: &str,
        lap: Option<u32>,
    ) -> Result<Analysis<Vec<BrakingZone>>> {
        let config = self.config.braking;
        self.guarded("braking_zones", async {
            let mut skipped = SkipReport::new();
            let trace = self.lap_telemetry(session, driver, lap).await?;
            let Some((unit, series)) = absorb(trace, &mut skipped) else {
                return Ok(Analysis::new(Vec::new(), skipped));
            };

            match blocking(move || analysis::braking_zones(&series, &config)).await? {
                Ok(zones) => Ok(Analysis::new(zones, skipped)),
                Err(e) if !e.is_fatal() => {
                    skipped.record(unit, &e);
                    Ok(Analysis::new(Vec::new(), skipped))
                }
                Err(e) => Err(e),
            }
        })
        .await
    }

    /// Theoretical best of each requested driver, in request order.
    ///
    /// Telemetry for every valid lap is fetched concurrently; drivers
    /// without a usable lap are left out and noted in the skip report.
    pub async fn theoretical_best<S: AsRef<str>>(
        &self,
        session: &Arc<Session>,
        drivers: &[S],
    ) -> Result<Analysis<Vec<TheoreticalBest>>> {
        let requested = unique_drivers(drivers);
        let micro_sectors = self.config.micro_sectors;

        self.guarded("theoretical_best", async {
            let tasks = requested.iter().map(|driver| async move {
                let mut skipped = SkipReport::new();
                let telemetry = self.valid_lap_telemetry(session, driver, &mut skipped).await?;
                let (session, driver) = (Arc::clone(session), driver.clone());
                let mut result = blocking(move || {
                    analysis::theoretical_best(&session.laps, &driver, &telemetry, micro_sectors)
                })
                .await?;
                skipped.extend(result.skipped);
                result.skipped = skipped;
                Ok::<_, AnalysisError>(result)
            });
            let per_driver = try_join_all(tasks).await?;

            let mut bests = Vec::new();
            let mut skipped = SkipReport::new();
            for analysis in per_driver {
                bests.extend(analysis.result);
                skipped.extend(analysis.skipped);
            }
            debug!(drivers = bests.len(), skipped = skipped.len(), "Theoretical bests ready");
            Ok(Analysis::new(bests, skipped))
        })
        .await
    }

    /// Telemetry of every lap eligible for the theoretical best.
    ///
    /// Fatal provider errors fail the request; anything else only drops
    /// that lap.
    async fn valid_lap_telemetry(
        &self,
        session: &Session,
        driver: &str,
        skipped: &mut SkipReport,
    ) -> Result<BTreeMap<u32, TelemetrySeries>> {
        let laps: Vec<u32> = analysis::theoretical_best_laps(&session.laps, driver)
            .iter()
            .map(|lap| lap.lap_number)
            .collect();
        let fetches = laps.iter().map(|&lap| self.provider.telemetry(&session.key, driver, lap));
        let results = join_all(fetches).await;

        let mut telemetry = BTreeMap::new();
        for (lap, result) in laps.into_iter().zip(results) {
            match result {
                Ok(Some(series)) => {
                    telemetry.insert(lap, series);
                }
                Ok(None) => {}
                Err(e) if !e.is_fatal() => skipped.record(format!("{driver} lap {lap}"), &e),
                Err(e) => return Err(e),
            }
        }
        Ok(telemetry)
    }

    /// Telemetry of two laps fetched concurrently, or `None` when either
    /// one is unavailable.
    async fn lap_pair(
        &self,
        session: &Session,
        (driver_a, lap_a): (&str, Option<u32>),
        (driver_b, lap_b): (&str, Option<u32>),
        skipped: &mut SkipReport,
    ) -> Result<Option<(TelemetrySeries, TelemetrySeries)>> {
        let (trace_a, trace_b) = futures::try_join!(
            self.lap_telemetry(session, driver_a, lap_a),
            self.lap_telemetry(session, driver_b, lap_b),
        )?;
        match (absorb(trace_a, skipped), absorb(trace_b, skipped)) {
            (Some((_, a)), Some((_, b))) => Ok(Some((a, b))),
            _ => Ok(None),
        }
    }

    /// Resolve a lap (or the fastest one) and fetch its telemetry.
    ///
    /// The outer error is fatal; the inner one names a lap that cannot be
    /// analysed.
    async fn lap_telemetry(
        &self,
        session: &Session,
        driver: &str,
        lap: Option<u32>,
    ) -> Result<LapFetch> {
        let record: Option<&LapRecord> = match lap {
            Some(number) => session.laps.lap(driver, number),
            None => session.laps.fastest_lap(driver),
        };
        let Some(record) = record else {
            let error = match lap {
                Some(lap) => AnalysisError::LapNotFound { driver: driver.to_string(), lap },
                None => AnalysisError::DriverNotFound { driver: driver.to_string() },
            };
            return Ok(Err((driver.to_string(), error)));
        };

        let unit = format!("{driver} lap {}", record.lap_number);
        match self.provider.telemetry(&session.key, driver, record.lap_number).await {
            Ok(Some(series)) => Ok(Ok((unit, series))),
            Ok(None) => {
                let error = AnalysisError::insufficient_data("telemetry samples", 1, 0);
                Ok(Err((unit, error)))
            }
            Err(e) if !e.is_fatal() => Ok(Err((unit, e))),
            Err(e) => Err(e),
        }
    }

    /// Bound a request by the budget and the engine's cancellation.
    async fn guarded<T, F>(&self, request: &'static str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        let budget = self.config.budget();
        tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!(request, "Request cancelled");
                Err(AnalysisError::Cancelled)
            }
            result = tokio::time::timeout(budget, work) => match result {
                Ok(result) => result,
                Err(_) => {
                    warn!(request, ?budget, "Request exceeded its budget");
                    Err(AnalysisError::Timeout { duration: budget })
                }
            },
        }
    }
}

/// Run CPU-bound work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AnalysisError::Worker { details: e.to_string() })
}

/// Requested drivers with repeats removed, first occurrence kept.
fn unique_drivers<S: AsRef<str>>(drivers: &[S]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(drivers.len());
    for driver in drivers.iter().map(AsRef::as_ref) {
        if !unique.iter().any(|d| d == driver) {
            unique.push(driver.to_string());
        }
    }
    unique
}

/// A lap's skip unit with its telemetry, or the unit with the reason it
/// cannot be analysed.
type LapFetch = std::result::Result<(String, TelemetrySeries), (String, AnalysisError)>;

/// The lap and its telemetry, or `None` with the reason recorded.
fn absorb(trace: LapFetch, skipped: &mut SkipReport) -> Option<(String, TelemetrySeries)> {
    match trace {
        Ok(lap) => Some(lap),
        Err((unit, error)) => {
            skipped.record(unit, &error);
            None
        }
    }
}
