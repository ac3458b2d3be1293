//! Widget Firmware - Main Entry Point
//!
//! Hardware-only entry point for STM32L072CZ (Cortex-M0+ @ 32 MHz).
//!
//! There is no executor: after bring-up, `main` hands control to the job
//! scheduler for good. The sensor bus runs on I2C1 with the peripheral
//! sequencing each transfer; the I2C1 vector feeds every event and error
//! flag to the engine, which finishes the transfer and arms the next one.

#![no_std]
#![no_main]

use core::cell::Cell;

use cortex_m_rt::entry;
use critical_section::Mutex;
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use static_cell::StaticCell;

use firmware::i2c::stm32::Stm32I2c1;
use firmware::jobs::{Job, JobControl};
use firmware::sensors::{self, FaultPolicy, RegisterPoller, SensorSpec};
use firmware::{
    I2cEngine, I2cError, I2cPumpJob, I2cRequest, InterruptController, JobScheduler, Phase,
};
use platform::config::DEVICE_READY_TRIALS;
use platform::{I2cConfig, TransferLen};

// Panic handler
use panic_probe as _;
// RTT transport for defmt
use defmt_rtt as _;

type Engine = I2cEngine<InterruptController<Stm32I2c1>>;

static ENGINE: StaticCell<Engine> = StaticCell::new();

/// Engine reference for the bus interrupt, set once during bring-up.
static COMPLETION_TARGET: Mutex<Cell<Option<&'static Engine>>> = Mutex::new(Cell::new(None));

#[interrupt]
fn I2C1() {
    let engine = critical_section::with(|cs| COMPLETION_TARGET.borrow(cs).get());
    if let Some(engine) = engine {
        engine.on_transfer_complete();
    }
}

/// Start-up probe: every sensor must answer and report its identity.
struct SensorCheck<'e> {
    engine: &'e Engine,
    scratch: firmware::RequestId,
}

impl SensorCheck<'_> {
    fn check(&self, sensor: &SensorSpec) -> Result<(), I2cError> {
        if !self.engine.device_is_ready(sensor.address, DEVICE_READY_TRIALS)? {
            defmt::error!("{=str}: no ACK at {}", sensor.name, sensor.address);
            return Err(I2cError::Transfer(platform::FAULT_NACK));
        }
        let mut raw = [0u8; 1];
        self.engine
            .read_register(self.scratch, sensor.address, sensor.id_register, &mut raw)?;
        let [id] = raw;
        match sensor.id_value {
            Some(expected) if expected != id => defmt::warn!(
                "{=str}: unexpected id 0x{=u8:X} (want 0x{=u8:X})",
                sensor.name,
                id,
                expected
            ),
            _ => defmt::info!("{=str}: id 0x{=u8:X}", sensor.name, id),
        }
        Ok(())
    }
}

impl Job for SensorCheck<'_> {
    fn run(&mut self, ctl: &JobControl) {
        let found = self.engine.scan(|address| defmt::debug!("i2c scan: {}", address));
        if let Ok(found) = found {
            defmt::info!("i2c scan: {=usize} device(s)", found);
        }
        for sensor in &sensors::ALL {
            if let Err(e) = self.check(sensor) {
                defmt::error!("{=str}: start-up check failed: {}", sensor.name, e);
                ctl.error_state_enter(e.code());
                return;
            }
        }
    }
}

fn read_request(sensor: &SensorSpec) -> I2cRequest {
    I2cRequest::read(sensor.address, sensor.data_register, sensor.data_len)
}

#[entry]
fn main() -> ! {
    defmt::info!("{=str} v{=str}", platform::config::APP_NAME, platform::config::APP_VERSION);
    defmt::info!("Initializing STM32L072CZ (Cortex-M0+)");

    let p = embassy_stm32::init(embassy_stm32::Config::default());

    let bus = Stm32I2c1::new(p.I2C1, p.PB6, p.PB7);
    let engine: &'static Engine = ENGINE.init(I2cEngine::new(InterruptController::new(bus)));

    // The scheduler cannot run without a working bus; halt with the error
    // visible over RTT.
    if let Err(e) = engine.init(I2cConfig::default()) {
        defmt::error!("I2C init failed: {}", e);
        loop {
            cortex_m::asm::wfi();
        }
    }

    critical_section::with(|cs| COMPLETION_TARGET.borrow(cs).set(Some(engine)));
    interrupt::I2C1.set_priority(Priority::P1);
    // SAFETY: the handler only touches the engine through its critical-section
    // protected API, and COMPLETION_TARGET is set above.
    unsafe { interrupt::I2C1.enable() };

    // ── Requests ────────────────────────────────────────────────────────────
    let registered = (|| -> Result<_, I2cError> {
        let scratch = engine.register(I2cRequest::read(
            sensors::ACCELEROMETER.address,
            sensors::ACCELEROMETER.id_register,
            TransferLen::ONE,
        ))?;
        let accel = engine.register(read_request(&sensors::ACCELEROMETER))?;
        let light = engine.register(read_request(&sensors::LIGHT))?;
        let temp = engine.register(read_request(&sensors::TEMPERATURE))?;
        Ok((scratch, accel, light, temp))
    })();
    let Ok((scratch, accel, light, temp)) = registered else {
        defmt::error!("request arena too small");
        loop {
            cortex_m::asm::wfi();
        }
    };

    // ── Jobs ────────────────────────────────────────────────────────────────
    let mut sensor_check = SensorCheck { engine, scratch };
    let mut announce = |_: &JobControl| defmt::info!("{=str}", platform::config::dev_banner());
    let mut pump = I2cPumpJob::new(engine);
    let mut accel_poller = RegisterPoller::new("accel", engine, accel).retries(3);
    let mut light_poller = RegisterPoller::new("light", engine, light)
        .every(8)
        .retries(3);
    let mut temp_poller = RegisterPoller::new("temp", engine, temp)
        .every(64)
        .retries(3)
        .on_fault(FaultPolicy::Halt);
    let mut report = |ctl: &JobControl| {
        defmt::error!(
            "halted: code {=i32}, i2c {}",
            ctl.error_code().unwrap_or_default(),
            engine.stats()
        );
    };
    let mut idle = |_: &JobControl| cortex_m::asm::wfi();

    let mut scheduler: JobScheduler = JobScheduler::new();
    let added = [
        scheduler.job_add(&mut sensor_check, Phase::Init),
        scheduler.job_add(&mut announce, Phase::RunEntry),
        scheduler.job_add(&mut pump, Phase::RunRun),
        scheduler.job_add(&mut accel_poller, Phase::RunRun),
        scheduler.job_add(&mut light_poller, Phase::RunRun),
        scheduler.job_add(&mut temp_poller, Phase::RunRun),
        scheduler.job_add(&mut report, Phase::ErrorEntry),
        scheduler.job_add(&mut idle, Phase::ErrorRun),
    ];
    if let Some(Err(e)) = added.into_iter().find(Result::is_err) {
        defmt::error!("job registration failed: {}", e);
        scheduler.error_state_enter(e.code());
    }

    scheduler.run_forever()
}
