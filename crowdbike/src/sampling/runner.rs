//! The fixed-period sampling loop.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::SamplingConfig;
use super::error::SamplingError;
use super::pacing::{is_overrun, sleep_duration};
use super::state::LoopState;
use crate::calibration::calibrate;
use crate::position::PositionProvider;
use crate::record::RecordAssembler;
use crate::sensor::{ClimateSensor, MissingReason, ParticulateSensor, Reading, SensorError};
use crate::storage::AppendLog;

/// What happened in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Sequence number of the record written.
    pub sequence: u64,
    /// Time from cycle start until the record was persisted.
    pub elapsed: Duration,
    /// Why the climate values are missing, if they are.
    pub climate: Option<MissingReason>,
    /// Why the particulate values are missing, if they are.
    pub particulate: Option<MissingReason>,
    pub has_fix: bool,
    /// Columns left empty in the record.
    pub missing_columns: Vec<&'static str>,
}

/// Totals for a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplingSummary {
    pub records_written: u64,
    /// Cycles that used their whole period.
    pub overruns: u64,
}

/// Consecutive failures of one sensor.
///
/// The first failure of a streak is logged at `warn`, the rest at `debug`.
#[derive(Debug)]
struct FailureStreak {
    sensor: &'static str,
    consecutive: u64,
}

impl FailureStreak {
    fn new(sensor: &'static str) -> Self {
        Self {
            sensor,
            consecutive: 0,
        }
    }

    fn observe(&mut self, reason: Option<&MissingReason>, sequence: u64) {
        match reason {
            None => {
                if self.consecutive > 0 {
                    info!(
                        sensor = self.sensor,
                        failed_cycles = self.consecutive,
                        sequence,
                        "Sensor recovered"
                    );
                }
                self.consecutive = 0;
            }
            Some(MissingReason::Disabled) => {}
            Some(reason) => {
                self.consecutive += 1;
                if self.consecutive == 1 {
                    warn!(sensor = self.sensor, %reason, sequence, "Sensor read failed");
                } else {
                    debug!(
                        sensor = self.sensor,
                        %reason,
                        sequence,
                        consecutive = self.consecutive,
                        "Sensor still failing"
                    );
                }
            }
        }
    }
}

/// Periodic driver: acquire, calibrate, assemble, persist, pace.
///
/// Sensor reads are sequential and each is bounded by its timeout. A failed
/// or slow read leaves its fields missing for that cycle only; the record is
/// still written and the sequence still advances. Only a failed append stops
/// the loop.
///
/// `particulate` is `None` when the particulate sensor is disabled.
///
/// # Example
///
/// ```ignore
/// let mut sampler = SamplingLoop::new(config, climate, Some(pm), shared, log)?;
/// let summary = sampler.run(cancellation).await?;
/// ```
pub struct SamplingLoop<C, P, Pos, L> {
    config: SamplingConfig,
    climate: C,
    particulate: Option<P>,
    position: Pos,
    log: L,
    assembler: RecordAssembler,
    state: LoopState,
    climate_streak: FailureStreak,
    particulate_streak: FailureStreak,
    summary: SamplingSummary,
}

impl<C, P, Pos, L> SamplingLoop<C, P, Pos, L>
where
    C: ClimateSensor,
    P: ParticulateSensor,
    Pos: PositionProvider,
    L: AppendLog,
{
    pub fn new(
        config: SamplingConfig,
        climate: C,
        particulate: Option<P>,
        position: Pos,
        log: L,
    ) -> Result<Self, SamplingError> {
        if config.period.is_zero() {
            return Err(SamplingError::InvalidPeriod(config.period));
        }

        let assembler = RecordAssembler::new(&config.device_id, &config.operator_id);
        Ok(Self {
            config,
            climate,
            particulate,
            position,
            log,
            assembler,
            state: LoopState::Idle,
            climate_streak: FailureStreak::new("climate"),
            particulate_streak: FailureStreak::new("particulate"),
            summary: SamplingSummary::default(),
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Counters so far.
    pub fn summary(&self) -> SamplingSummary {
        self.summary
    }

    /// Run one acquire/persist pass.
    ///
    /// Fails only when the record could not be appended, which stops the
    /// loop, or when the loop was already stopped.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, SamplingError> {
        if self.state.is_stopped() {
            return Err(SamplingError::Stopped);
        }

        let started = Instant::now();
        let captured_at = Utc::now();
        let sequence = self.assembler.next_sequence();

        self.state = LoopState::Acquiring;
        let climate = read_bounded(self.climate.read(), self.config.climate_timeout).await;
        let particulate = match self.particulate.as_mut() {
            Some(sensor) => read_bounded(sensor.read(), self.config.particulate_timeout).await,
            None => Reading::Missing(MissingReason::Disabled),
        };
        let fix = self.position.snapshot();

        self.climate_streak.observe(climate.missing_reason(), sequence);
        self.particulate_streak
            .observe(particulate.missing_reason(), sequence);

        self.state = LoopState::Persisting;
        let climate_missing = climate.missing_reason().cloned();
        let particulate_missing = particulate.missing_reason().cloned();

        let calibrated = calibrate(climate.value(), &self.config.coefficients);
        let record = self.assembler.assemble(
            captured_at,
            calibrated.as_ref(),
            particulate.value().as_ref(),
            &fix,
        );

        if let Err(source) = self.log.append(&record) {
            error!(sequence, error = %source, "Failed to persist record, stopping");
            self.state = LoopState::Stopped;
            return Err(SamplingError::Persist { sequence, source });
        }
        self.summary.records_written += 1;

        let report = CycleReport {
            sequence: record.sequence,
            elapsed: started.elapsed(),
            climate: climate_missing,
            particulate: particulate_missing,
            has_fix: fix.has_fix(),
            missing_columns: record.missing_columns(),
        };

        debug!(
            sequence,
            elapsed_ms = report.elapsed.as_millis() as u64,
            temperature = ?record.temperature,
            humidity = ?record.humidity,
            pm2_5 = ?record.pm2_5,
            pm10 = ?record.pm10,
            has_fix = report.has_fix,
            "Record written"
        );

        Ok(report)
    }

    /// Run cycles until `cancellation` fires, then close the log.
    ///
    /// Cancellation is honoured between cycles and interrupts the pacing
    /// sleep immediately. A persistence error ends the session with that
    /// error after a best-effort close.
    pub async fn run(
        &mut self,
        cancellation: CancellationToken,
    ) -> Result<SamplingSummary, SamplingError> {
        info!(
            device = %self.config.device_id,
            operator = %self.config.operator_id,
            period_ms = self.config.period.as_millis() as u64,
            particulate = self.particulate.is_some(),
            "Sampling started"
        );

        while !cancellation.is_cancelled() {
            let report = match self.run_cycle().await {
                Ok(report) => report,
                Err(e) => {
                    if let Err(close_error) = self.log.close() {
                        debug!(error = %close_error, "Failed to close log after error");
                    }
                    return Err(e);
                }
            };

            self.state = LoopState::Pacing;
            if is_overrun(self.config.period, report.elapsed) {
                self.summary.overruns += 1;
                warn!(
                    sequence = report.sequence,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    period_ms = self.config.period.as_millis() as u64,
                    "Cycle overran its period"
                );
            }

            let sleep = sleep_duration(self.config.period, report.elapsed);
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => break,
                _ = tokio::time::sleep(sleep) => {}
            }
        }

        self.state = LoopState::Stopped;
        self.log.close()?;

        info!(
            records = self.summary.records_written,
            overruns = self.summary.overruns,
            "Sampling stopped"
        );
        Ok(self.summary)
    }
}

/// Await a sensor read for at most `limit`.
async fn read_bounded<T>(
    read: impl Future<Output = Result<T, SensorError>>,
    limit: Duration,
) -> Reading<T> {
    match tokio::time::timeout(limit, read).await {
        Ok(result) => result.into(),
        Err(_) => Reading::from(Err(SensorError::Timeout(limit))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::ClimateSample;
    use crate::position::{FixMode, PositionFix};
    use crate::record::SensorRecord;
    use crate::sensor::ParticulateSample;
    use crate::storage::StorageError;
    use chrono::TimeZone;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Climate sensor replaying a script, then repeating a fixed sample.
    struct ScriptedClimate {
        script: VecDeque<Result<ClimateSample, SensorError>>,
        delay: Duration,
    }

    impl ScriptedClimate {
        fn ok() -> Self {
            Self::with_script(vec![])
        }

        fn with_script(script: Vec<Result<ClimateSample, SensorError>>) -> Self {
            Self {
                script: script.into(),
                delay: Duration::ZERO,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                script: VecDeque::new(),
                delay,
            }
        }
    }

    impl ClimateSensor for ScriptedClimate {
        async fn read(&mut self) -> Result<ClimateSample, SensorError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.script.pop_front().unwrap_or(Ok(ClimateSample {
                temperature: 20.0,
                humidity: 50.0,
            }))
        }
    }

    fn failed_read() -> Result<ClimateSample, SensorError> {
        Err(SensorError::Io {
            path: PathBuf::from("/sys/bus/iio/devices/iio:device0/in_temp_input"),
            source: std::io::Error::from_raw_os_error(5),
        })
    }

    struct FixedParticulate;

    impl ParticulateSensor for FixedParticulate {
        async fn read(&mut self) -> Result<ParticulateSample, SensorError> {
            Ok(ParticulateSample {
                pm2_5: 5.8,
                pm10: 11.9,
            })
        }
    }

    struct FailingParticulate;

    impl ParticulateSensor for FailingParticulate {
        async fn read(&mut self) -> Result<ParticulateSample, SensorError> {
            Err(SensorError::Closed(PathBuf::from("/dev/ttyUSB0")))
        }
    }

    struct FixedPosition(PositionFix);

    impl PositionProvider for FixedPosition {
        fn snapshot(&self) -> PositionFix {
            self.0
        }
    }

    fn good_fix() -> FixedPosition {
        FixedPosition(PositionFix::new(
            Some(Utc.with_ymd_and_hms(2019, 1, 21, 10, 0, 0).unwrap()),
            Some(51.44),
            Some(7.26),
            Some(100.0),
            FixMode::ThreeD,
        ))
    }

    fn no_fix() -> FixedPosition {
        FixedPosition(PositionFix::no_fix())
    }

    /// In-memory log, optionally failing from a given append on.
    #[derive(Clone, Default)]
    struct MemoryLog {
        records: Arc<Mutex<Vec<SensorRecord>>>,
        closed: Arc<Mutex<bool>>,
        fail_from: Option<usize>,
    }

    impl MemoryLog {
        fn failing_from(n: usize) -> Self {
            Self {
                fail_from: Some(n),
                ..Self::default()
            }
        }

        fn records(&self) -> Vec<SensorRecord> {
            self.records.lock().unwrap().clone()
        }

        fn is_closed(&self) -> bool {
            *self.closed.lock().unwrap()
        }
    }

    impl AppendLog for MemoryLog {
        fn ensure_initialized(&mut self) -> Result<(), StorageError> {
            Ok(())
        }

        fn append(&mut self, record: &SensorRecord) -> Result<(), StorageError> {
            let mut records = self.records.lock().unwrap();
            if self.fail_from.is_some_and(|n| records.len() >= n) {
                return Err(StorageError::Write {
                    path: PathBuf::from("/data/log.csv"),
                    source: std::io::Error::from_raw_os_error(28),
                });
            }
            records.push(record.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), StorageError> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    fn config() -> SamplingConfig {
        SamplingConfig::new("07", "jane")
            .with_period(Duration::from_secs(1))
            .with_coefficients(crate::calibration::CalibrationCoefficients::identity())
    }

    #[test]
    fn test_zero_period_rejected() {
        let result = SamplingLoop::new(
            config().with_period(Duration::ZERO),
            ScriptedClimate::ok(),
            None::<FixedParticulate>,
            good_fix(),
            MemoryLog::default(),
        );
        assert!(matches!(result, Err(SamplingError::InvalidPeriod(_))));
    }

    #[tokio::test]
    async fn test_full_cycle() {
        let log = MemoryLog::default();
        let mut sampler = SamplingLoop::new(
            config(),
            ScriptedClimate::ok(),
            Some(FixedParticulate),
            good_fix(),
            log.clone(),
        )
        .unwrap();
        assert_eq!(sampler.state(), LoopState::Idle);

        let report = sampler.run_cycle().await.unwrap();
        assert_eq!(report.sequence, 0);
        assert!(report.climate.is_none());
        assert!(report.particulate.is_none());
        assert!(report.has_fix);
        assert!(report.missing_columns.is_empty());

        let records = log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].temperature, Some(20.0));
        assert_eq!(records[0].pm10, Some(11.9));
        assert_eq!(records[0].latitude, Some(51.44));
    }

    #[tokio::test]
    async fn test_climate_failure_leaves_only_climate_missing() {
        let log = MemoryLog::default();
        let climate = ScriptedClimate::with_script(vec![
            Ok(ClimateSample {
                temperature: 20.0,
                humidity: 50.0,
            }),
            failed_read(),
        ]);
        let mut sampler =
            SamplingLoop::new(config(), climate, Some(FixedParticulate), good_fix(), log.clone())
                .unwrap();

        sampler.run_cycle().await.unwrap();
        let report = sampler.run_cycle().await.unwrap();
        sampler.run_cycle().await.unwrap();

        assert_eq!(report.sequence, 1);
        assert!(matches!(report.climate, Some(MissingReason::Failed(_))));

        let records = log.records();
        let failed = &records[1];
        assert_eq!(failed.sequence, 1);
        assert!(failed.temperature.is_none());
        assert!(failed.temperature_raw.is_none());
        assert!(failed.humidity.is_none());
        assert!(failed.vapour_pressure.is_none());
        assert!(failed.vapour_pressure_raw.is_none());
        assert_eq!(failed.pm2_5, Some(5.8));
        assert_eq!(failed.latitude, Some(51.44));

        // The next cycle is unaffected
        assert_eq!(records[2].temperature, Some(20.0));
    }

    #[tokio::test]
    async fn test_disabled_particulate_is_missing_not_zero() {
        let log = MemoryLog::default();
        let mut sampler = SamplingLoop::new(
            config(),
            ScriptedClimate::ok(),
            None::<FixedParticulate>,
            good_fix(),
            log.clone(),
        )
        .unwrap();

        let report = sampler.run_cycle().await.unwrap();
        assert_eq!(report.particulate, Some(MissingReason::Disabled));

        let record = &log.records()[0];
        assert_eq!(record.pm10, None);
        assert_eq!(record.pm2_5, None);
    }

    #[tokio::test]
    async fn test_no_fix_leaves_position_missing() {
        let log = MemoryLog::default();
        let mut sampler = SamplingLoop::new(
            config(),
            ScriptedClimate::ok(),
            Some(FixedParticulate),
            no_fix(),
            log.clone(),
        )
        .unwrap();

        let report = sampler.run_cycle().await.unwrap();
        assert!(!report.has_fix);
        assert_eq!(
            report.missing_columns,
            vec!["GPS_Time", "Altitude", "Latitude", "Longitude"]
        );

        let record = &log.records()[0];
        assert_eq!(record.sequence, 0);
        assert!(record.gps_time.is_none());
        assert!(record.altitude.is_none());
    }

    #[tokio::test]
    async fn test_sequence_advances_on_all_failure_cycles() {
        let log = MemoryLog::default();
        let climate =
            ScriptedClimate::with_script(vec![failed_read(), failed_read(), failed_read()]);
        let mut sampler =
            SamplingLoop::new(config(), climate, Some(FailingParticulate), no_fix(), log.clone())
                .unwrap();

        for expected in 0..3 {
            let report = sampler.run_cycle().await.unwrap();
            assert_eq!(report.sequence, expected);
            assert_eq!(report.missing_columns.len(), 12);
        }

        let sequences: Vec<u64> = log.records().iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_climate_read_times_out() {
        let log = MemoryLog::default();
        let mut sampler = SamplingLoop::new(
            config().with_timeouts(Duration::from_millis(500), Duration::from_secs(1)),
            ScriptedClimate::slow(Duration::from_secs(10)),
            Some(FixedParticulate),
            good_fix(),
            log.clone(),
        )
        .unwrap();

        let report = sampler.run_cycle().await.unwrap();
        assert_eq!(report.climate, Some(MissingReason::Timeout));
        assert!(report.elapsed >= Duration::from_millis(500));
        assert!(report.elapsed < Duration::from_secs(10));
        assert_eq!(log.records()[0].pm10, Some(11.9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_append_failure_is_fatal() {
        let log = MemoryLog::failing_from(2);
        let mut sampler = SamplingLoop::new(
            config(),
            ScriptedClimate::ok(),
            Some(FixedParticulate),
            good_fix(),
            log.clone(),
        )
        .unwrap();

        let result = sampler.run(CancellationToken::new()).await;
        match result {
            Err(SamplingError::Persist { sequence, .. }) => assert_eq!(sequence, 2),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(sampler.state(), LoopState::Stopped);
        assert_eq!(log.records().len(), 2);
        assert!(log.is_closed());
        assert!(matches!(
            sampler.run_cycle().await,
            Err(SamplingError::Stopped)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_paces_and_stops_on_cancel() {
        let log = MemoryLog::default();
        let mut sampler = SamplingLoop::new(
            config(),
            ScriptedClimate::ok(),
            Some(FixedParticulate),
            good_fix(),
            log.clone(),
        )
        .unwrap();

        let cancellation = CancellationToken::new();
        let canceller = cancellation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(3500)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let summary = sampler.run(cancellation).await.unwrap();

        // Cycles at t = 0, 1, 2 and 3 s
        assert_eq!(summary.records_written, 4);
        assert_eq!(summary.overruns, 0);
        assert_eq!(sampler.state(), LoopState::Stopped);
        assert!(log.is_closed());

        // The pacing sleep is interrupted, not waited out
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overruns_counted_without_catch_up() {
        let log = MemoryLog::default();
        let mut sampler = SamplingLoop::new(
            config().with_timeouts(Duration::from_secs(2), Duration::from_secs(1)),
            ScriptedClimate::slow(Duration::from_millis(1500)),
            None::<FixedParticulate>,
            good_fix(),
            log.clone(),
        )
        .unwrap();

        let cancellation = CancellationToken::new();
        let canceller = cancellation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            canceller.cancel();
        });

        let summary = sampler.run(cancellation).await.unwrap();

        // Cycles end at 1.5 s and 3.0 s; the second sees the cancel
        assert_eq!(summary.records_written, 2);
        assert_eq!(summary.overruns, 2);
        assert!(log.records().iter().all(|r| r.temperature.is_some()));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_writes_nothing() {
        let log = MemoryLog::default();
        let mut sampler = SamplingLoop::new(
            config(),
            ScriptedClimate::ok(),
            Some(FixedParticulate),
            good_fix(),
            log.clone(),
        )
        .unwrap();

        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let summary = sampler.run(cancellation).await.unwrap();
        assert_eq!(summary, SamplingSummary::default());
        assert!(log.records().is_empty());
        assert!(log.is_closed());
    }

    #[test]
    fn test_failure_streak_counts_and_resets() {
        let mut streak = FailureStreak::new("climate");
        streak.observe(Some(&MissingReason::Timeout), 0);
        streak.observe(Some(&MissingReason::Failed("EIO".into())), 1);
        assert_eq!(streak.consecutive, 2);

        streak.observe(Some(&MissingReason::Disabled), 2);
        assert_eq!(streak.consecutive, 2);

        streak.observe(None, 3);
        assert_eq!(streak.consecutive, 0);
    }
}
