//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to                   |
//! |------------|-----------------|-------------------------------|
//! | `ble`      | RadioPort       | Bluedroid GAP advertiser      |
//! | `hardware` | SensorPort      | SensorHub (I²C, ADC, PWM)     |
//! |            | RadioPort       | `ble`                         |
//! |            | TimerPort       | esp_timer one-shot            |
//! |            | IndicatorPort   | LED GPIO                      |
//! | `log_sink` | EventSink       | Serial log output             |

pub mod ble;
pub mod hardware;
pub mod log_sink;
