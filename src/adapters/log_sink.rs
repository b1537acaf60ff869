//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).

use log::{error, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Measured(r) => {
                info!(
                    "MEASURE | run={} | batt={}mV | T={:.2}\u{00b0}C | rh={:.1}% | \
                     soil={} ({:.1}%) | lux={}",
                    r.run_counter,
                    r.battery_mv,
                    r.temperature_c,
                    f32::from(r.humidity) * 100.0 / 65535.0,
                    r.soil_moisture,
                    r.soil_percent,
                    r.lux.map_or(-1, i32::from),
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::Advertising { len, run_counter } => {
                info!("ADV | run={} | {} bytes on air", run_counter, len);
            }
            AppEvent::CycleFailed(e) => {
                error!("FAULT | cycle aborted: {}", e);
            }
            AppEvent::Started { state, address } => {
                info!("START | initial_state={:?} | addr={}", state, address);
            }
        }
    }
}
