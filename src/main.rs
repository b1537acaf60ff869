//! Soil beacon firmware — main entry point.
//!
//! Hexagonal architecture with timer-driven execution and light sleep
//! between events.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter                         LogEventSink          │
//! │  (SensorHub · BleAdvertiser ·            (EventSink)           │
//! │   WakeTimer · indicator LED)                                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              NodeService (pure logic)                  │    │
//! │  │  FSM · run counter · payload encoding                  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Event queue (timer callback → main loop) · power idle/halt    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{error, info};

use esp_idf_hal::delay::Delay;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::FromValueType;

use soilbeacon::adapters::ble::BleAdvertiser;
use soilbeacon::adapters::hardware::HardwareAdapter;
use soilbeacon::adapters::log_sink::LogEventSink;
use soilbeacon::app::service::NodeService;
use soilbeacon::config::NodeConfig;
use soilbeacon::drivers::hw_init;
use soilbeacon::drivers::hw_timer::WakeTimer;
use soilbeacon::error::Error;
use soilbeacon::events::{self, Event};
use soilbeacon::pins;
use soilbeacon::power::{self, IdleMode};
use soilbeacon::sensors::SensorHub;
use soilbeacon::sensors::analog::AdcFrontend;
use soilbeacon::sensors::shtc3::Shtc3;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  soilbeacon v{}                   ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Build-time configuration ───────────────────────────
    let config = NodeConfig::BUILD;
    config.validate()?;
    let address = config.address.resolve()?;
    info!(
        "Config: {:?} protocol, window {}s, sleep {}s, light={:?}",
        config.protocol, config.advertising_window_secs, config.sleep_interval_secs, config.light_sensor
    );

    // ── 3. Claim peripherals by `pins` number ────────────────
    let peripherals = Peripherals::take()?;

    // SAFETY: pins are claimed by their `pins` numbers, once each; `pins`
    // rejects duplicate numbers at compile time. The GPIO singletons in
    // `peripherals.pins` are never used.
    let (led_pin, discharge_pin, light_pin, pwm_pin, sda, scl) = unsafe {
        (
            AnyOutputPin::new(pins::LED_GPIO),
            AnyOutputPin::new(pins::FAST_DISCHARGE_GPIO),
            AnyOutputPin::new(pins::LIGHT_SUPPLY_GPIO),
            AnyOutputPin::new(pins::SOIL_PWM_GPIO),
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
        )
    };

    let mut led = PinDriver::output(led_pin)?;
    led.set_low()?;
    power::boot_flash(&mut led, &mut Delay::new_default()).map_err(Error::from)?;

    let mut discharge = PinDriver::output(discharge_pin)?;
    discharge.set_low()?;

    let light_supply = if config.has_light_sensor() {
        let mut pin = PinDriver::output(light_pin)?;
        pin.set_low()?;
        Some(pin)
    } else {
        None
    };

    let pwm_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new()
            .frequency(pins::SOIL_PWM_FREQ_HZ.Hz())
            .resolution(Resolution::Bits7),
    )?;
    let excitation = LedcDriver::new(peripherals.ledc.channel0, &pwm_timer, pwm_pin)?;

    let i2c = I2cDriver::new(
        peripherals.i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(pins::I2C_FREQ_HZ.Hz()),
    )?;

    hw_init::init_adc(config.has_light_sensor())?;

    // ── 4. Construct adapters ─────────────────────────────────
    let sensor_hub = SensorHub::new(
        Shtc3::new(i2c, Delay::new_default()),
        AdcFrontend::new(config.light_sensor),
        excitation,
        discharge,
        light_supply,
        Delay::new_default(),
    );

    let mut ble = BleAdvertiser::new(address, &config);
    ble.init().map_err(Error::from)?;

    let timer = WakeTimer::new().map_err(Error::from)?;

    let mut hw = HardwareAdapter::new(sensor_hub, ble, timer, led);
    let mut log_sink = LogEventSink::new();

    // ── 5. Start: arm the sleep timer and broadcast at once ───
    let mut node = NodeService::new(config, address);
    if let Err(e) = node.start(&mut hw, &mut log_sink) {
        error!("Boot cycle failed: {}", e);
        power::halt();
    }

    info!("System ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    loop {
        let mut failed = None;
        events::drain_events(|event| match event {
            Event::TimerFired => {
                if failed.is_none() {
                    if let Err(e) = node.on_timer(&mut hw, &mut log_sink) {
                        failed = Some(e);
                    }
                }
            }
        });

        if let Some(e) = failed {
            error!("Wake cycle failed: {}", e);
            power::halt();
        }

        power::idle(IdleMode::for_state(node.state()), hw.timer().remaining_us());
    }
}
