//! BLE broadcast adapter.
//!
//! Implements [`RadioPort`] as non-connectable undirected advertising of a
//! raw payload from a random static address. There is no GATT server and
//! no scan response.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GAP via raw `esp_idf_svc::sys` calls.
//! - **all other targets**: simulation that records the payload and the
//!   on-air flag for host-side tests.

use log::{info, warn};

use crate::app::ports::RadioPort;
use crate::config::NodeConfig;
use crate::error::RadioError;
use crate::identity::DeviceAddress;
use crate::payload::{MAX_ADV_LEN, Payload};

// ───────────────────────────────────────────────────────────────
// Advertising parameters
// ───────────────────────────────────────────────────────────────

/// Controller interval unit (µs).
const INTERVAL_UNIT_US: u32 = 625;

/// Convert an advertising interval in milliseconds to 0.625 ms units.
pub const fn interval_units(ms: u16) -> u16 {
    ((ms as u32 * 1000) / INTERVAL_UNIT_US) as u16
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct BleAdvertiser {
    address: DeviceAddress,
    interval: u16,
    tx_power_dbm: i8,
    payload: Payload,
    on_air: bool,
}

impl BleAdvertiser {
    pub fn new(address: DeviceAddress, config: &NodeConfig) -> Self {
        Self {
            address,
            interval: interval_units(config.advertising_interval_ms),
            tx_power_dbm: config.tx_power_dbm,
            payload: Payload::new(),
            on_air: false,
        }
    }

    /// Bring up the controller and host stack, set the own address and the
    /// TX power. Call once at boot.
    pub fn init(&mut self) -> Result<(), RadioError> {
        self.platform_init()?;
        info!(
            "BLE: ready as {} (interval {} units, {} dBm)",
            self.address, self.interval, self.tx_power_dbm
        );
        Ok(())
    }

    pub fn is_advertising(&self) -> bool {
        self.on_air
    }

    /// The last payload accepted by [`RadioPort::set_payload`].
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_init(&mut self) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;

        fn check(ret: i32, what: &str) -> Result<(), RadioError> {
            if ret == ESP_OK as i32 {
                Ok(())
            } else {
                log::error!("BLE: {} failed ({})", what, ret);
                Err(RadioError::StackInitFailed)
            }
        }

        let level = tx_power_level(self.tx_power_dbm).ok_or(RadioError::StackInitFailed)?;
        let mut addr = self.address.bytes();

        // SAFETY: called once from the main task before anything else uses
        // the controller; all pointers outlive the calls.
        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            check(esp_bt_controller_init(&mut bt_cfg), "bt_controller_init")?;
            check(esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE), "bt_controller_enable")?;
            check(esp_bluedroid_init(), "bluedroid_init")?;
            check(esp_bluedroid_enable(), "bluedroid_enable")?;
            check(esp_ble_gap_register_callback(Some(ble_gap_event_handler)), "gap_register")?;
            check(esp_ble_gap_set_rand_addr(addr.as_mut_ptr()), "set_rand_addr")?;
            check(
                esp_ble_tx_power_set(esp_ble_power_type_t_ESP_BLE_PWR_TYPE_ADV, level),
                "tx_power_set",
            )?;
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_init(&mut self) -> Result<(), RadioError> {
        info!("BLE(sim): stack init skipped");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_set_payload(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        // SAFETY: the stack copies the buffer before returning.
        let ret = unsafe {
            esp_ble_gap_config_adv_data_raw(payload.as_ptr() as *mut u8, payload.len() as u32)
        };
        if ret != ESP_OK as i32 {
            warn!("BLE: config_adv_data_raw failed ({})", ret);
            return Err(RadioError::PayloadRejected);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_set_payload(&mut self, _payload: &[u8]) -> Result<(), RadioError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        // SAFETY: adv_params lives across the call; zeroed peer address is
        // valid for undirected advertising.
        let ret = unsafe {
            let mut adv_params = esp_ble_adv_params_t {
                adv_int_min: self.interval,
                adv_int_max: self.interval,
                adv_type: esp_ble_adv_type_t_ADV_TYPE_NONCONN_IND,
                own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_RANDOM,
                channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
                adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
                ..core::mem::zeroed()
            };
            esp_ble_gap_start_advertising(&mut adv_params)
        };
        if ret != ESP_OK as i32 {
            warn!("BLE: start_advertising failed ({})", ret);
            return Err(RadioError::StartFailed);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), RadioError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) -> Result<(), RadioError> {
        use esp_idf_svc::sys::*;
        // SAFETY: plain GAP call from the main task.
        let ret = unsafe { esp_ble_gap_stop_advertising() };
        if ret != ESP_OK as i32 {
            warn!("BLE: stop_advertising failed ({})", ret);
            return Err(RadioError::StopFailed);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) -> Result<(), RadioError> {
        Ok(())
    }
}

impl RadioPort for BleAdvertiser {
    fn set_payload(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        if payload.len() > MAX_ADV_LEN {
            warn!("BLE: payload of {} bytes rejected", payload.len());
            return Err(RadioError::PayloadRejected);
        }
        self.platform_set_payload(payload)?;
        self.payload.clear();
        self.payload
            .extend_from_slice(payload)
            .map_err(|()| RadioError::PayloadRejected)?;
        Ok(())
    }

    fn start(&mut self) -> Result<(), RadioError> {
        self.platform_start()?;
        self.on_air = true;
        info!("BLE: advertising {} bytes", self.payload.len());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RadioError> {
        self.platform_stop()?;
        self.on_air = false;
        info!("BLE: advertising stopped");
        Ok(())
    }
}

// ── ESP-IDF GAP callback and power table ──────────────────────

/// Map a supported dBm value to the controller's power level.
#[cfg(target_os = "espidf")]
fn tx_power_level(dbm: i8) -> Option<esp_idf_svc::sys::esp_power_level_t> {
    use esp_idf_svc::sys::*;
    Some(match dbm {
        -12 => esp_power_level_t_ESP_PWR_LVL_N12,
        -9 => esp_power_level_t_ESP_PWR_LVL_N9,
        -6 => esp_power_level_t_ESP_PWR_LVL_N6,
        -3 => esp_power_level_t_ESP_PWR_LVL_N3,
        0 => esp_power_level_t_ESP_PWR_LVL_N0,
        3 => esp_power_level_t_ESP_PWR_LVL_P3,
        6 => esp_power_level_t_ESP_PWR_LVL_P6,
        9 => esp_power_level_t_ESP_PWR_LVL_P9,
        _ => return None,
    })
}

/// GAP completions arrive on the Bluedroid task; only failures are logged.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    // SAFETY: Bluedroid passes a valid param for the duration of the call;
    // the union member read matches the event tag.
    unsafe {
        match event {
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_RAW_SET_COMPLETE_EVT => {
                let status = (*param).adv_data_raw_cmpl.status;
                if status != esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                    warn!("BLE: adv data rejected by controller ({})", status);
                }
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
                let status = (*param).adv_start_cmpl.status;
                if status != esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                    warn!("BLE: advertising start failed in controller ({})", status);
                }
            }
            _ => {}
        }
    }
}
