//! Single-shot wake timer using ESP-IDF's esp_timer API.
//!
//! Each [`TimerPort::arm`] replaces the previous deadline. When it expires
//! the callback pushes [`Event::TimerFired`] into the lock-free SPSC queue.
//! On simulation targets the deadline is tracked with `std::time::Instant`
//! and the event is pushed by [`WakeTimer::sim_fire`].
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can safely call push_event() which uses AtomicU8.

use crate::app::ports::TimerPort;
use crate::error::ActuatorError;

#[cfg(target_os = "espidf")]
use crate::events::{Event, push_event};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::debug;

const US_PER_SEC: u64 = 1_000_000;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn wake_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::TimerFired);
}

pub struct WakeTimer {
    #[cfg(target_os = "espidf")]
    handle: esp_timer_handle_t,
    #[cfg(target_os = "espidf")]
    deadline_us: i64,

    #[cfg(not(target_os = "espidf"))]
    deadline: Option<std::time::Instant>,
    #[cfg(not(target_os = "espidf"))]
    history: Vec<u32>,
}

#[cfg(target_os = "espidf")]
impl WakeTimer {
    /// Create the (not yet armed) one-shot timer.
    pub fn new() -> Result<Self, ActuatorError> {
        let args = esp_timer_create_args_t {
            callback: Some(wake_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"wake".as_ptr(),
            skip_unhandled_events: false,
        };
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        // SAFETY: args outlives the call; handle is written by esp_timer_create.
        let ret = unsafe { esp_timer_create(&args, &mut handle) };
        if ret != ESP_OK as i32 {
            log::error!("hw_timer: wake timer create failed (rc={})", ret);
            return Err(ActuatorError::TimerArmFailed);
        }
        log::info!("hw_timer: wake timer created");
        Ok(Self {
            handle,
            deadline_us: 0,
        })
    }

    /// Microseconds until the armed deadline, 0 if it has passed.
    pub fn remaining_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time is a plain counter read.
        let now = unsafe { esp_timer_get_time() };
        (self.deadline_us - now).max(0) as u64
    }
}

#[cfg(target_os = "espidf")]
impl TimerPort for WakeTimer {
    fn arm(&mut self, secs: u32) -> Result<(), ActuatorError> {
        let period_us = u64::from(secs) * US_PER_SEC;
        // SAFETY: handle was created in new() and is never deleted.
        unsafe {
            // Not running is fine here; only the start result matters.
            esp_timer_stop(self.handle);
            let ret = esp_timer_start_once(self.handle, period_us);
            if ret != ESP_OK as i32 {
                log::error!("hw_timer: arm {}s failed (rc={})", secs, ret);
                return Err(ActuatorError::TimerArmFailed);
            }
            self.deadline_us = esp_timer_get_time() + period_us as i64;
        }
        debug!("hw_timer: armed {}s", secs);
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl Drop for WakeTimer {
    fn drop(&mut self) {
        // SAFETY: handle is valid; stop before delete as esp_timer requires.
        unsafe {
            esp_timer_stop(self.handle);
            esp_timer_delete(self.handle);
        }
    }
}

// ── Simulation ────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl WakeTimer {
    pub fn new() -> Result<Self, ActuatorError> {
        log::info!("hw_timer(sim): wake timer created");
        Ok(Self {
            deadline: None,
            history: Vec::new(),
        })
    }

    pub fn remaining_us(&self) -> u64 {
        self.deadline.map_or(0, |d| {
            d.saturating_duration_since(std::time::Instant::now()).as_micros() as u64
        })
    }

    /// Every period armed so far, in seconds.
    pub fn history(&self) -> &[u32] {
        &self.history
    }

    /// Expire the deadline now and post the wake event.
    pub fn sim_fire(&mut self) -> bool {
        self.deadline = None;
        crate::events::push_event(crate::events::Event::TimerFired)
    }
}

#[cfg(not(target_os = "espidf"))]
impl TimerPort for WakeTimer {
    fn arm(&mut self, secs: u32) -> Result<(), ActuatorError> {
        let period = std::time::Duration::from_micros(u64::from(secs) * US_PER_SEC);
        self.deadline = Some(std::time::Instant::now() + period);
        self.history.push(secs);
        debug!("hw_timer(sim): armed {}s", secs);
        Ok(())
    }
}
