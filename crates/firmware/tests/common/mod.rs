//! Shared helpers for firmware integration tests.
#![allow(dead_code)]

use firmware::{I2cEngine, InterruptController, RequestId};
use platform::mocks::{MockI2c, ScriptedRegisters};
use platform::{BusFlags, I2cAddress, I2cConfig};

/// LIS3DH accelerometer address used across the tests.
pub const ACCEL: I2cAddress = I2cAddress::new(0x18);
/// VCNL4020 light sensor address used across the tests.
pub const LIGHT: I2cAddress = I2cAddress::new(0x13);

/// Queue depth and slot count small enough to hit the limits quickly.
pub type TestEngine = I2cEngine<MockI2c, 4, 8>;

/// Engine over the interrupt-driven controller, with the test playing the
/// peripheral.
pub type IrqEngine = I2cEngine<InterruptController<ScriptedRegisters>, 4, 8>;

/// Route `tracing` output to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Initialised engine over a mock bus carrying the accelerometer and the
/// light sensor.
pub fn engine(bus: MockI2c) -> TestEngine {
    init_tracing();
    let engine = TestEngine::new(bus.with_device(ACCEL).with_device(LIGHT));
    engine.init(I2cConfig::default()).unwrap();
    engine
}

/// Initialised [`IrqEngine`] with the configure command already cleared.
pub fn irq_engine() -> IrqEngine {
    init_tracing();
    let engine = IrqEngine::new(InterruptController::new(ScriptedRegisters::new()));
    engine.init(I2cConfig::default()).unwrap();
    engine.with_controller(|c| c.registers_mut().clear_ops());
    engine
}

/// Latch `flags` and run the bus interrupt handler.
pub fn raise(engine: &IrqEngine, flags: BusFlags) -> Option<RequestId> {
    engine.with_controller(|c| c.registers_mut().raise(flags));
    engine.on_transfer_complete()
}
