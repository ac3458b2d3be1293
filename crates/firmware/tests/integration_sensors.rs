//! Sensor polling integration tests
//!
//! Runs pollers, the I2C pump and a stand-in for the completion interrupt
//! under one scheduler, the way `main` wires them on hardware.
//!
//! Run with: cargo test -p firmware --test integration_sensors
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

mod common;

use common::{engine, TestEngine};
use firmware::sensors::{self, FaultPolicy, PollerState, RegisterPoller, SensorSpec};
use firmware::{I2cPumpJob, I2cRequest, JobControl, JobScheduler, Phase, RequestId};
use platform::mocks::MockI2c;
use platform::{FAULT_BUS, FAULT_NACK};

fn register(engine: &TestEngine, sensor: &SensorSpec) -> RequestId {
    engine
        .register(I2cRequest::read(
            sensor.address,
            sensor.data_register,
            sensor.data_len,
        ))
        .unwrap()
}

/// Run `passes` scheduler calls with the pump, the interrupt stand-in and
/// the given pollers registered under `RunRun`.
fn drive(
    engine: &TestEngine,
    pollers: &mut [&mut RegisterPoller<'_, MockI2c, 4, 8>],
    passes: usize,
) -> (firmware::Phase, Option<i32>) {
    let mut pump = I2cPumpJob::new(engine);
    let mut irq = |_: &JobControl| {
        engine.on_transfer_complete();
    };
    let mut sched = JobScheduler::<8>::new();
    sched.job_add(&mut pump, Phase::RunRun).unwrap();
    sched.job_add(&mut irq, Phase::RunRun).unwrap();
    for poller in pollers.iter_mut() {
        sched.job_add(&mut **poller, Phase::RunRun).unwrap();
    }
    for _ in 0..passes {
        sched.run();
    }
    (sched.phase(), sched.error_code())
}

#[test]
fn accelerometer_samples_reach_the_poller() {
    let engine = engine(MockI2c::new());
    let accel = &sensors::ACCELEROMETER;
    engine.with_controller(|bus| {
        for (offset, value) in [0x10u8, 0x01, 0x20, 0x02, 0x30, 0x03].into_iter().enumerate() {
            bus.set_register(accel.address, 0xA8 + offset as u8, value);
        }
    });
    let id = register(&engine, accel);
    let mut poller = RegisterPoller::new("accel", &engine, id);

    let (phase, error) = drive(&engine, &mut [&mut poller], 60);

    assert_eq!(phase, Phase::RunRun);
    assert_eq!(error, None);
    assert!(poller.samples() > 1);
    assert_eq!(
        poller.latest(),
        Some(&[0x10, 0x01, 0x20, 0x02, 0x30, 0x03][..])
    );
    engine.with_controller(|bus| assert_eq!(bus.overlapping_arms(), 0));
}

#[test]
fn interval_spaces_out_reads() {
    let engine = engine(MockI2c::new());
    let fast_id = register(&engine, &sensors::ACCELEROMETER);
    let slow_id = register(&engine, &sensors::LIGHT);
    let mut fast = RegisterPoller::new("accel", &engine, fast_id);
    let mut slow = RegisterPoller::new("light", &engine, slow_id).every(8);

    drive(&engine, &mut [&mut fast, &mut slow], 200);

    assert!(slow.samples() > 0);
    assert!(fast.samples() > slow.samples() * 2);
}

#[test]
fn transient_fault_is_retried() {
    let engine = engine(MockI2c::new());
    let id = register(&engine, &sensors::LIGHT);
    engine.with_controller(|bus| bus.fail_next_transfer(FAULT_BUS));
    let mut poller = RegisterPoller::new("light", &engine, id).retries(2);

    drive(&engine, &mut [&mut poller], 40);

    assert_eq!(poller.state(), PollerState::Ready);
    assert!(poller.samples() > 0);
    engine.process_one().unwrap();
    assert_eq!(engine.stats().failed, 1);
}

#[test]
fn missing_sensor_is_isolated() {
    let engine = engine(MockI2c::new());
    let accel_id = register(&engine, &sensors::ACCELEROMETER);
    let temp_id = register(&engine, &sensors::TEMPERATURE);
    let mut accel = RegisterPoller::new("accel", &engine, accel_id);
    let mut temp = RegisterPoller::new("temp", &engine, temp_id).retries(1);

    let (phase, _) = drive(&engine, &mut [&mut accel, &mut temp], 80);

    assert_eq!(phase, Phase::RunRun);
    assert_eq!(temp.state(), PollerState::Faulted(FAULT_NACK));
    assert_eq!(temp.latest(), None);
    assert!(accel.samples() > 0);
}

#[test]
fn missing_sensor_can_halt_the_firmware() {
    let engine = engine(MockI2c::new());
    let temp_id = register(&engine, &sensors::TEMPERATURE);
    let mut temp = RegisterPoller::new("temp", &engine, temp_id)
        .retries(2)
        .on_fault(FaultPolicy::Halt);

    let (phase, error) = drive(&engine, &mut [&mut temp], 80);

    assert!(phase.is_error());
    assert_eq!(error, Some(FAULT_NACK));
    assert_eq!(temp.state(), PollerState::Faulted(FAULT_NACK));
}

#[test]
fn start_up_register_sequence_runs_before_polling() {
    let engine = engine(MockI2c::new());
    let accel = &sensors::ACCELEROMETER;
    let scratch = engine
        .register(I2cRequest::read(accel.address, accel.id_register, platform::TransferLen::ONE))
        .unwrap();
    engine.with_controller(|bus| bus.set_register(accel.address, accel.id_register, 0x33));

    let mut id = [0u8; 1];
    engine
        .read_register(scratch, accel.address, accel.id_register, &mut id)
        .unwrap();
    assert_eq!(Some(id[0]), accel.id_value);

    // CTRL_REG1: 100 Hz, all axes enabled.
    engine
        .write_register(scratch, accel.address, 0x20, &[0x57])
        .unwrap();
    assert_eq!(
        engine.update_register_bits(scratch, accel.address, 0x20, 0xF0, 0x20),
        Ok(0x27)
    );
    assert!(engine.is_idle());
}
