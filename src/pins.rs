//! GPIO / peripheral pin assignments for the soil beacon board.
//!
//! Single source of truth: `main` claims every pin by the numbers below and
//! `power::halt` drives the same numbers, so a remap here moves both.

// ---------------------------------------------------------------------------
// Indicator
// ---------------------------------------------------------------------------

/// Digital output: indicator LED (active HIGH).
pub const LED_GPIO: i32 = 21;

// ---------------------------------------------------------------------------
// Soil sensor (capacitive, PWM-excited)
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the sensor's RC excitation network.
pub const SOIL_PWM_GPIO: i32 = 5;
/// Digital output: fast-discharge switch across the sensor's smoothing cap.
/// Held HIGH for the duration of a soil read.
pub const FAST_DISCHARGE_GPIO: i32 = 6;
/// Soil sensor analog output, ADC1 channel 3.
pub const SOIL_ADC_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Light sensor (board v1.1 LDR / v1.2 phototransistor)
// ---------------------------------------------------------------------------

/// Digital output: supply rail for the light sensor divider.
pub const LIGHT_SUPPLY_GPIO: i32 = 7;
/// Light sensor analog output, ADC1 channel 1.
pub const LIGHT_ADC_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Battery
// ---------------------------------------------------------------------------

/// Battery sense through a 1:1 resistive divider, ADC1 channel 0.
pub const BATTERY_ADC_GPIO: i32 = 1;

// ---------------------------------------------------------------------------
// I²C bus (SHTC3 temperature / humidity)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// Standard-mode clock; the sensor is read once per cycle.
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// ADC configuration
// ---------------------------------------------------------------------------

pub const ADC1_CH_BATTERY: u32 = 0;
pub const ADC1_CH_LIGHT: u32 = 1;
pub const ADC1_CH_SOIL: u32 = 3;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Sensor excitation frequency (500 kHz). From the 80 MHz APB clock this
/// leaves room for at most 7 bits of LEDC duty resolution.
pub const SOIL_PWM_FREQ_HZ: u32 = 500_000;

// ---------------------------------------------------------------------------
// Compile-time checks
// ---------------------------------------------------------------------------

/// On ESP32-S3, ADC1 channel `n` is GPIO `n + 1`.
const fn adc1_gpio(channel: u32) -> i32 {
    channel as i32 + 1
}

const _: () = assert!(BATTERY_ADC_GPIO == adc1_gpio(ADC1_CH_BATTERY));
const _: () = assert!(LIGHT_ADC_GPIO == adc1_gpio(ADC1_CH_LIGHT));
const _: () = assert!(SOIL_ADC_GPIO == adc1_gpio(ADC1_CH_SOIL));

/// Every GPIO the board wires up.
const CLAIMED_GPIOS: [i32; 9] = [
    LED_GPIO,
    SOIL_PWM_GPIO,
    FAST_DISCHARGE_GPIO,
    SOIL_ADC_GPIO,
    LIGHT_SUPPLY_GPIO,
    LIGHT_ADC_GPIO,
    BATTERY_ADC_GPIO,
    I2C_SDA_GPIO,
    I2C_SCL_GPIO,
];

const fn all_distinct(pins: &[i32]) -> bool {
    let mut i = 0;
    while i < pins.len() {
        let mut j = i + 1;
        while j < pins.len() {
            if pins[i] == pins[j] {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

// `main` claims pins by number, which is only sound if no number repeats.
const _: () = assert!(all_distinct(&CLAIMED_GPIOS));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_pins_are_detected() {
        assert!(all_distinct(&CLAIMED_GPIOS));
        assert!(!all_distinct(&[LED_GPIO, SOIL_PWM_GPIO, LED_GPIO]));
    }

    #[test]
    fn adc_gpios_follow_channels() {
        assert_eq!(adc1_gpio(ADC1_CH_BATTERY), BATTERY_ADC_GPIO);
        assert_eq!(adc1_gpio(ADC1_CH_SOIL), SOIL_ADC_GPIO);
    }
}
