//! Integration tests for complete logging runs
//!
//! These tests validate the end-to-end contract of a run:
//! - Counter relations between reads, saves and log lines
//! - FIFO order within a channel
//! - Dropped writes on injected storage failures
//! - Backpressure with a one-slot queue
//! - Initialization failures

mod common;

use common::builders::{environmental_ramp, inertial_ramp, scripted_pair, ConfigBuilder};
use common::mock_helpers::{leading_values, run_in_memory, run_with_storage};
use sensorlog_rs::config::{LockOrdering, BMP280_ADDRESS, ENVIRONMENTAL_LOG_PATH, INERTIAL_LOG_PATH};
use sensorlog_rs::output::MemorySink;
use sensorlog_rs::sensor::{
    ScriptedSensor, SignalPattern, SimulatedBmp280, SimulatedMpu6050, SimulatedSignal,
};
use sensorlog_rs::storage::{FaultInjectingStorage, FileStorage, MemoryStorage, SharedStorage, Storage};
use sensorlog_rs::{ChannelId, RunSupervisor, SchedulingMode, SensorPair};
use serial_test::serial;

#[test]
#[serial]
fn test_zero_duration_leaves_empty_logs() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::mount(dir.path()).unwrap();

    // Stale content from a previous run must be truncated
    let mut stale = storage.clone();
    stale.append_line(ENVIRONMENTAL_LOG_PATH, "old line").unwrap();

    let config = ConfigBuilder::new(SchedulingMode::Concurrent)
        .duration_ms(0)
        .periods_ms(300, 100)
        .build();
    let outcome = run_with_storage(
        config,
        scripted_pair(environmental_ramp(5), inertial_ramp(5)),
        storage.clone(),
    );

    for channel in ChannelId::ALL {
        assert_eq!(outcome.summary.reads(channel), 0);
        assert_eq!(outcome.summary.saves(channel), 0);
    }
    for path in [ENVIRONMENTAL_LOG_PATH, INERTIAL_LOG_PATH] {
        assert!(storage.exists(path), "{} should exist", path);
        assert!(std::fs::read(storage.resolve(path)).unwrap().is_empty());
    }
}

#[test]
#[serial]
fn test_no_failures_means_every_read_is_saved() {
    let config = ConfigBuilder::new(SchedulingMode::Concurrent).build();
    let (outcome, storage) = run_in_memory(
        config,
        scripted_pair(environmental_ramp(12), inertial_ramp(20)),
    );

    let summary = &outcome.summary;
    assert_eq!(summary.reads(ChannelId::Environmental), 12);
    assert_eq!(summary.reads(ChannelId::Inertial), 20);
    for channel in ChannelId::ALL {
        assert_eq!(summary.saves(channel), summary.reads(channel));
    }
    assert_eq!(storage.lines(ENVIRONMENTAL_LOG_PATH).len(), 12);
    assert_eq!(storage.lines(INERTIAL_LOG_PATH).len(), 20);
}

#[test]
#[serial]
fn test_channel_order_is_preserved() {
    let config = ConfigBuilder::new(SchedulingMode::Concurrent)
        .queue_capacity(ChannelId::Environmental, 3)
        .build();
    let (_, storage) = run_in_memory(
        config,
        scripted_pair(environmental_ramp(25), inertial_ramp(25)),
    );

    let expected: Vec<f64> = (1..=25).map(|i| i as f64).collect();
    assert_eq!(leading_values(&storage.lines(ENVIRONMENTAL_LOG_PATH)), expected);
    assert_eq!(leading_values(&storage.lines(INERTIAL_LOG_PATH)), expected);
}

#[test]
#[serial]
fn test_third_environmental_write_is_dropped() {
    let memory = MemoryStorage::new();
    let storage = FaultInjectingStorage::new(memory.clone()).fail_append(ENVIRONMENTAL_LOG_PATH, 3);
    let config = ConfigBuilder::new(SchedulingMode::Concurrent).build();

    let outcome = run_with_storage(
        config,
        scripted_pair(environmental_ramp(6), inertial_ramp(6)),
        storage,
    );

    let env = outcome.summary.channel(ChannelId::Environmental).unwrap();
    assert_eq!(env.counters.reads, 6);
    assert_eq!(env.counters.saves, 5);
    assert_eq!(env.counters.dropped_writes, 1);

    let lines = memory.lines(ENVIRONMENTAL_LOG_PATH);
    assert_eq!(lines.len(), 5);
    assert_eq!(leading_values(&lines), vec![1.0, 2.0, 4.0, 5.0, 6.0]);

    // The other channel is unaffected
    assert_eq!(outcome.summary.saves(ChannelId::Inertial), 6);
}

#[test]
#[serial]
fn test_one_slot_queue_stalls_producer_without_loss() {
    let config = ConfigBuilder::new(SchedulingMode::Concurrent)
        .periods_ms(1, 50)
        .queue_capacity(ChannelId::Environmental, 1)
        .consumer_poll_ms(40)
        .duration_ms(400)
        .build();
    let (outcome, storage) = run_in_memory(
        config,
        scripted_pair(environmental_ramp(200), inertial_ramp(0)),
    );

    let env = outcome.summary.channel(ChannelId::Environmental).unwrap();
    let queue = env.queue.expect("concurrent runs report queue stats");
    assert_eq!(queue.capacity, 1);
    assert!(queue.high_water <= 1);
    assert!(queue.stalls > 0, "producer should have blocked on a full queue");

    // Throttled to the consumer's pace, yet nothing lost or overwritten
    assert!(env.counters.reads < 200);
    assert_eq!(env.counters.saves, env.counters.reads);
    let expected: Vec<f64> = (1..=env.counters.reads).map(|i| i as f64).collect();
    assert_eq!(leading_values(&storage.lines(ENVIRONMENTAL_LOG_PATH)), expected);
}

#[test]
#[serial]
fn test_hold_while_waiting_ordering_still_persists_everything() {
    let config = ConfigBuilder::new(SchedulingMode::Concurrent)
        .lock_ordering(LockOrdering::HoldWhileWaiting)
        .build();
    let (outcome, storage) = run_in_memory(
        config,
        scripted_pair(environmental_ramp(10), inertial_ramp(10)),
    );

    for channel in ChannelId::ALL {
        assert_eq!(outcome.summary.saves(channel), 10);
    }
    assert_eq!(storage.lines(INERTIAL_LOG_PATH).len(), 10);
    assert!(outcome.summary.storage_lock.acquisitions >= 20);
}

#[test]
#[serial]
fn test_read_failures_skip_ticks() {
    let env = ScriptedSensor::new("BMP280", BMP280_ADDRESS, environmental_ramp(4))
        .with_failure_at(1, "bus timeout");
    let imu = ScriptedSensor::new("MPU6050", 0x68, inertial_ramp(2));
    let config = ConfigBuilder::new(SchedulingMode::Concurrent).build();

    let (outcome, storage) = run_in_memory(config, SensorPair::new(env, imu));

    let env = outcome.summary.channel(ChannelId::Environmental).unwrap();
    assert_eq!(env.counters.reads, 4);
    assert_eq!(env.counters.saves, 4);
    assert!(env.counters.read_failures >= 1);
    assert_eq!(env.sensor.successful_reads, 4);
    assert_eq!(storage.lines(ENVIRONMENTAL_LOG_PATH).len(), 4);
}

#[test]
#[serial]
fn test_report_prints_logs_and_counters() {
    let config = ConfigBuilder::new(SchedulingMode::Concurrent).build();
    let (outcome, _) = run_in_memory(
        config,
        scripted_pair(environmental_ramp(2), inertial_ramp(3)),
    );

    let lines = outcome.output.lines();
    assert_eq!(lines[0], "Run complete. Saved data:");
    assert!(lines.contains(&"BMP280 data:".to_string()));
    assert!(lines.contains(
        &"Altitude: 2.00 m, Pressao: 99998.00 Pa, Temperatura: 20.02 Celsius".to_string()
    ));
    assert!(lines.ends_with(&[
        "Run summary:".to_string(),
        "BMP280 reads: 2".to_string(),
        "BMP280 saves: 2".to_string(),
        "MPU6050 reads: 3".to_string(),
        "MPU6050 saves: 3".to_string(),
    ]));
}

#[test]
#[serial]
fn test_wrong_address_fails_initialization() {
    let mut config = ConfigBuilder::new(SchedulingMode::Concurrent).build();
    config.environmental.i2c_address = 0x77;

    let memory = MemoryStorage::new();
    let output = MemorySink::new();
    let sensors = SensorPair::new(
        SimulatedBmp280::from_config(&config),
        SimulatedMpu6050::from_config(&config),
    );
    let err = RunSupervisor::new(config, sensors, SharedStorage::new(memory.clone()), output.clone())
        .run()
        .unwrap_err();

    assert!(err.is_initialization());
    assert!(output.contains("BMP280 initialization failed"));
    assert!(output.contains("0x77"));
    assert!(!output.contains("Run summary:"));
}

#[test]
#[serial]
fn test_simulated_run_writes_summary_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ConfigBuilder::new(SchedulingMode::Concurrent)
        .duration_ms(120)
        .periods_ms(20, 10)
        .build();
    config.output.summary_json = Some(dir.path().join("summary.json"));
    let sensors = SensorPair::new(
        SimulatedBmp280::from_config(&config),
        SimulatedMpu6050::from_config(&config),
    );

    let outcome = run_with_storage(config, sensors, FileStorage::mount(dir.path().join("sd")).unwrap());
    assert!(outcome.summary.reads(ChannelId::Inertial) > 0);

    let json = std::fs::read_to_string(dir.path().join("summary.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["mode"], "concurrent");
    assert_eq!(value["channels"][0]["device"], "BMP280");
    assert!(value["channels"][0]["queue"]["capacity"].as_u64() == Some(10));

    let log = std::fs::read_to_string(dir.path().join("sd").join("mpu6050.txt")).unwrap();
    assert!(log.lines().all(|line| line.starts_with("Accel: [")));
}

#[test]
#[serial]
fn test_sea_level_pressure_logs_zero_altitude() {
    let config = ConfigBuilder::new(SchedulingMode::Concurrent)
        .duration_ms(100)
        .periods_ms(10, 10)
        .build();
    // Sea level is 1016 hPa, so a steady 101600 Pa reads as 0 m
    let baro = SimulatedBmp280::from_config(&config)
        .with_pressure(SimulatedSignal::new(SignalPattern::Constant(101_600.0)));
    let sensors = SensorPair::new(baro, SimulatedMpu6050::from_config(&config));

    let (outcome, storage) = run_in_memory(config, sensors);

    assert!(std::time::Duration::from_millis(outcome.summary.elapsed_ms) < common::run_deadline());
    let lines = storage.lines(ENVIRONMENTAL_LOG_PATH);
    assert_eq!(lines.len() as u64, outcome.summary.saves(ChannelId::Environmental));
    assert!(lines.iter().all(|line| line.contains("Pressao: 101600.00 Pa")));
    common::assert_all_near(&leading_values(&lines), 0.0, 0.005);
}
