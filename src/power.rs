//! Power sequencing policy.
//!
//! Two concerns live here:
//!
//! - **Rail guards.** [`Energized`] and [`Excited`] switch a rail on when
//!   constructed and off again on [`release`](Energized::release) or on
//!   drop, so every exit path of the acquisition sequence (including `?`
//!   returns) leaves the rail de-energised.
//! - **Idle policy.** Between wake cycles the main loop calls [`idle`],
//!   which drops into the lowest power mode compatible with the current
//!   state, and [`halt`] parks the node for good after a fatal fault.
//!
//! ```text
//!  Sleeping     ──▶ LightSleep  (all wake sources off except the timer)
//!  Advertising  ──▶ Wait        (radio must stay up; block the task only)
//! ```

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::{error, info};

use crate::error::ActuatorError;
use crate::fsm::StateId;

/// Excitation duty cycle applied to the soil sensor.
pub const EXCITATION_DUTY_PERCENT: u8 = 50;

// ---------------------------------------------------------------------------
// GPIO rail guard
// ---------------------------------------------------------------------------

/// A GPIO rail held HIGH for the lifetime of the guard.
#[must_use = "the rail is switched off as soon as the guard is dropped"]
pub struct Energized<'a, P: OutputPin> {
    pin: &'a mut P,
    name: &'static str,
    released: bool,
}

impl<'a, P: OutputPin> Energized<'a, P> {
    /// Drive the rail HIGH.
    pub fn engage(pin: &'a mut P, name: &'static str) -> Result<Self, ActuatorError> {
        if pin.set_high().is_err() {
            // Never leave a half-driven rail behind.
            let _ = pin.set_low();
            error!("POWER: failed to energise {}", name);
            return Err(ActuatorError::GpioWriteFailed);
        }
        Ok(Self { pin, name, released: false })
    }

    /// Drive the rail LOW, reporting failure. On failure the guard's drop
    /// makes a second attempt.
    pub fn release(mut self) -> Result<(), ActuatorError> {
        if self.pin.set_low().is_err() {
            error!("POWER: failed to de-energise {}", self.name);
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.released = true;
        Ok(())
    }
}

impl<P: OutputPin> Drop for Energized<'_, P> {
    fn drop(&mut self) {
        if !self.released && self.pin.set_low().is_err() {
            error!("POWER: failed to de-energise {} on unwind", self.name);
        }
    }
}

// ---------------------------------------------------------------------------
// PWM excitation guard
// ---------------------------------------------------------------------------

/// PWM excitation running at [`EXCITATION_DUTY_PERCENT`] for the lifetime of
/// the guard.
#[must_use = "excitation stops as soon as the guard is dropped"]
pub struct Excited<'a, X: SetDutyCycle> {
    pwm: &'a mut X,
    released: bool,
}

impl<'a, X: SetDutyCycle> Excited<'a, X> {
    pub fn start(pwm: &'a mut X) -> Result<Self, ActuatorError> {
        if pwm.set_duty_cycle_percent(EXCITATION_DUTY_PERCENT).is_err() {
            let _ = pwm.set_duty_cycle_fully_off();
            error!("POWER: failed to start excitation");
            return Err(ActuatorError::PwmWriteFailed);
        }
        Ok(Self { pwm, released: false })
    }

    /// Stop excitation (duty fully off), reporting failure. On failure the
    /// guard's drop makes a second attempt.
    pub fn release(mut self) -> Result<(), ActuatorError> {
        if self.pwm.set_duty_cycle_fully_off().is_err() {
            error!("POWER: failed to stop excitation");
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.released = true;
        Ok(())
    }
}

impl<X: SetDutyCycle> Drop for Excited<'_, X> {
    fn drop(&mut self) {
        if !self.released && self.pwm.set_duty_cycle_fully_off().is_err() {
            error!("POWER: failed to stop excitation on unwind");
        }
    }
}

// ---------------------------------------------------------------------------
// Idle policy
// ---------------------------------------------------------------------------

/// Low-power mode used while waiting for the next timer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleMode {
    /// CPU and radio gated; only the wake timer can resume execution.
    LightSleep,
    /// Block the main task; peripherals (radio) keep running.
    Wait,
}

impl IdleMode {
    pub fn for_state(state: StateId) -> Self {
        match state {
            StateId::Sleeping => Self::LightSleep,
            StateId::Advertising => Self::Wait,
        }
    }
}

/// Idle until roughly `remaining_us` from now, or until an interrupt.
#[cfg(target_os = "espidf")]
pub fn idle(mode: IdleMode, remaining_us: u64) {
    use esp_idf_svc::sys::*;

    if remaining_us == 0 {
        return;
    }
    match mode {
        IdleMode::LightSleep => {
            // SAFETY: plain register-level sleep configuration, called from
            // the single main task.
            unsafe {
                esp_sleep_disable_wakeup_source(esp_sleep_source_t_ESP_SLEEP_WAKEUP_ALL);
                esp_sleep_enable_timer_wakeup(remaining_us);
                let ret = esp_light_sleep_start();
                if ret != ESP_OK as i32 {
                    log::warn!("POWER: light sleep rejected (rc={}), waiting instead", ret);
                    std::thread::sleep(std::time::Duration::from_micros(remaining_us));
                }
            }
        }
        IdleMode::Wait => {
            std::thread::sleep(std::time::Duration::from_micros(remaining_us));
        }
    }
}

/// Simulation: both modes become a plain sleep.
#[cfg(not(target_os = "espidf"))]
pub fn idle(_mode: IdleMode, remaining_us: u64) {
    if remaining_us > 0 {
        std::thread::sleep(std::time::Duration::from_micros(remaining_us));
    }
}

/// Switch every rail off and stop for good. Used after a fatal fault.
#[cfg(target_os = "espidf")]
#[allow(unreachable_code)]
pub fn halt() -> ! {
    use crate::pins;
    use esp_idf_svc::sys::*;

    error!("POWER: fatal fault, halting with all rails off");
    // SAFETY: the pins are configured outputs and the LEDC channel exists;
    // nothing else runs after this point.
    unsafe {
        ledc_stop(ledc_mode_t_LEDC_LOW_SPEED_MODE, ledc_channel_t_LEDC_CHANNEL_0, 0);
        for pin in [
            pins::FAST_DISCHARGE_GPIO,
            pins::LIGHT_SUPPLY_GPIO,
            pins::LED_GPIO,
        ] {
            gpio_set_level(pin, 0);
        }
        esp_sleep_disable_wakeup_source(esp_sleep_source_t_ESP_SLEEP_WAKEUP_ALL);
        esp_deep_sleep_start();
    }
    loop {
        std::thread::park();
    }
}

/// Simulation: park the thread forever.
#[cfg(not(target_os = "espidf"))]
pub fn halt() -> ! {
    error!("POWER(sim): fatal fault, halting");
    loop {
        std::thread::park();
    }
}

/// Short indicator flash at boot.
pub fn boot_flash<P: OutputPin>(
    led: &mut P,
    delay: &mut impl embedded_hal::delay::DelayNs,
) -> Result<(), ActuatorError> {
    const BOOT_FLASH_MS: u32 = 200;
    let lit = Energized::engage(led, "indicator")?;
    delay.delay_ms(BOOT_FLASH_MS);
    lit.release()?;
    info!("POWER: boot flash done");
    Ok(())
}
