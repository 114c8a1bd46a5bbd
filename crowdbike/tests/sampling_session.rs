//! Integration tests for a complete sampling session.
//!
//! These tests wire the real position reader, calibration, record assembly
//! and CSV data log together, drive them with scripted sensors or a fake
//! IIO device, and read the resulting file back.
//!
//! Run with: `cargo test --test sampling_session`

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crowdbike::calibration::{CalibrationCoefficients, ClimateSample};
use crowdbike::position::{
    FixMode, PositionError, PositionFeedReader, PositionFeedReaderConfig, PositionFix,
    PositionProvider, PositionSource, SharedPosition,
};
use crowdbike::sampling::{SamplingConfig, SamplingLoop};
use crowdbike::sensor::{
    ClimateSensor, IioClimateSensor, ParticulateSample, ParticulateSensor, Sds011Sensor,
    SensorError, HUMIDITY_CHANNEL, TEMPERATURE_CHANNEL,
};
use crowdbike::storage::{header_line, log_file_path, read_records, AppendLog, CsvAppendLog};

// ============================================================================
// Test Helpers
// ============================================================================

/// Position source yielding a script, then staying silent.
struct ScriptedSource {
    script: VecDeque<PositionFix>,
}

impl PositionSource for ScriptedSource {
    async fn next_update(&mut self) -> Result<PositionFix, PositionError> {
        match self.script.pop_front() {
            Some(fix) => Ok(fix),
            None => std::future::pending().await,
        }
    }
}

/// Climate sensor failing on the given cycles.
struct FlakyClimate {
    cycle: u64,
    fail_on: Vec<u64>,
}

impl ClimateSensor for FlakyClimate {
    async fn read(&mut self) -> Result<ClimateSample, SensorError> {
        let cycle = self.cycle;
        self.cycle += 1;
        if self.fail_on.contains(&cycle) {
            return Err(SensorError::Io {
                path: PathBuf::from("/sys/bus/iio/devices/iio:device0/in_temp_input"),
                source: std::io::Error::from_raw_os_error(5),
            });
        }
        Ok(ClimateSample {
            temperature: 18.5,
            humidity: 62.0,
        })
    }
}

struct SteadyParticulate;

impl ParticulateSensor for SteadyParticulate {
    async fn read(&mut self) -> Result<ParticulateSample, SensorError> {
        Ok(ParticulateSample {
            pm2_5: 7.3,
            pm10: 14.1,
        })
    }
}

fn bochum_fix() -> PositionFix {
    PositionFix::new(
        Some(Utc.with_ymd_and_hms(2019, 1, 21, 10, 15, 30).unwrap()),
        Some(51.445812),
        Some(7.262115),
        Some(104.6),
        FixMode::ThreeD,
    )
}

fn data_log(dir: &TempDir) -> PathBuf {
    let date = NaiveDate::from_ymd_opt(2019, 1, 21).unwrap();
    log_file_path(&dir.path().join("data"), "07", "jane", date)
}

fn fake_iio_device(dir: &TempDir, temperature: &str, humidity: &str) -> PathBuf {
    let device = dir.path().join("iio:device0");
    std::fs::create_dir_all(&device).unwrap();
    std::fs::write(device.join(TEMPERATURE_CHANNEL), temperature).unwrap();
    std::fs::write(device.join(HUMIDITY_CHANNEL), humidity).unwrap();
    device
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_session_with_position_reader_and_sensor_failure() {
    let dir = TempDir::new().unwrap();
    let path = data_log(&dir);

    let cancellation = CancellationToken::new();
    let shared = SharedPosition::new();
    let reader = PositionFeedReader::new(
        ScriptedSource {
            script: VecDeque::from([bochum_fix()]),
        },
        shared.clone(),
        PositionFeedReaderConfig::default(),
    );
    let reader_handle = reader.spawn(cancellation.clone());

    while !shared.has_fix() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let mut log = CsvAppendLog::new(&path);
    log.ensure_initialized().unwrap();

    let config = SamplingConfig::new("07", "jane")
        .with_period(Duration::from_secs(1))
        .with_coefficients(CalibrationCoefficients::identity());
    let mut sampler = SamplingLoop::new(
        config,
        FlakyClimate {
            cycle: 0,
            fail_on: vec![1],
        },
        Some(SteadyParticulate),
        shared.clone(),
        log,
    )
    .unwrap();

    let canceller = cancellation.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(3500)).await;
        canceller.cancel();
    });

    let summary = sampler.run(cancellation).await.unwrap();
    let reader_stats = reader_handle.await.unwrap();

    assert_eq!(summary.records_written, 4);
    assert_eq!(reader_stats.updates, 1);
    assert!(!shared.has_fix(), "Reader clears the fix on stop");

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with(&format!("{}\n", header_line())));

    let records = read_records(&path, "jane").unwrap();
    let sequences: Vec<u64> = records.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2, 3]);

    for record in &records {
        assert_eq!(record.device_id, "07");
        assert_eq!(record.latitude, Some(51.445812));
        assert_eq!(record.altitude, Some(104.6));
        assert_eq!(record.pm10, Some(14.1));
        assert_eq!(record.pm2_5, Some(7.3));
    }

    // Cycle 1 lost its climate values and nothing else
    let failed = &records[1];
    assert!(failed.temperature.is_none());
    assert!(failed.humidity_raw.is_none());
    assert!(failed.vapour_pressure.is_none());
    assert_eq!(records[0].temperature, Some(18.5));
    assert_eq!(records[2].temperature, Some(18.5));
}

#[tokio::test]
async fn test_session_with_iio_device_without_fix() {
    let dir = TempDir::new().unwrap();
    let path = data_log(&dir);
    let device = fake_iio_device(&dir, "21400\n", "105000\n");

    let mut log = CsvAppendLog::new(&path);
    log.ensure_initialized().unwrap();

    let mut sampler = SamplingLoop::new(
        SamplingConfig::new("07", "jane"),
        IioClimateSensor::new(&device),
        None::<Sds011Sensor>,
        SharedPosition::new(),
        log,
    )
    .unwrap();

    for _ in 0..2 {
        sampler.run_cycle().await.unwrap();
    }
    sampler.run(cancelled()).await.unwrap();

    let records = read_records(&path, "jane").unwrap();
    assert_eq!(records.len(), 2);

    let record = &records[0];
    // Default temperature slope 1.001
    assert_eq!(record.temperature, Some(21.421));
    assert_eq!(record.temperature_raw, Some(21.4));
    // Supersaturated raw humidity is clamped
    assert_eq!(record.humidity, Some(100.0));
    assert_eq!(record.humidity_raw, Some(105.0));

    // No fix and no particulate sensor
    assert!(record.gps_time.is_none());
    assert!(record.latitude.is_none());
    assert!(record.longitude.is_none());
    assert!(record.altitude.is_none());
    assert!(record.pm10.is_none());
    assert!(record.pm2_5.is_none());
}

#[tokio::test]
async fn test_second_session_appends_to_same_file() {
    let dir = TempDir::new().unwrap();
    let path = data_log(&dir);
    let device = fake_iio_device(&dir, "15000", "40000");

    for _ in 0..2 {
        let mut log = CsvAppendLog::new(&path);
        log.ensure_initialized().unwrap();

        let mut sampler = SamplingLoop::new(
            SamplingConfig::new("07", "jane"),
            IioClimateSensor::new(&device),
            None::<Sds011Sensor>,
            SharedPosition::new(),
            log,
        )
        .unwrap();
        sampler.run_cycle().await.unwrap();
        sampler.run(cancelled()).await.unwrap();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches(&header_line()).count(), 1);

    let sequences: Vec<u64> = read_records(&path, "jane")
        .unwrap()
        .iter()
        .map(|r| r.sequence)
        .collect();
    assert_eq!(sequences, vec![0, 0]);
}

fn cancelled() -> CancellationToken {
    let token = CancellationToken::new();
    token.cancel();
    token
}
