//! BLE telemetry adapter.
//!
//! Implements [`TelemetryLink`]: a GATT server with one notify-only
//! characteristic per telemetry channel.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GATT server via `esp_idf_svc::sys`.
//! - **all other targets**: simulation that records notifications, for
//!   host-side tests.
//!
//! ## GATT Service Layout
//!
//! Service `e5df6019-cf42-49f6-a418-346db96363f6`
//!
//! | Characteristic | UUID                                   | Payload           |
//! |----------------|----------------------------------------|-------------------|
//! | Heart rate     | `3c1f4fe4-c7ce-4c09-a38a-ba166fce06c6` | u8 bpm            |
//! | SpO2           | `9749ccd9-940e-4ad6-bce9-d246a8d30dca` | u8 %              |
//! | Temperature    | `69b82322-1c56-423e-820e-eb08c3f030d4` | i16 LE, °C × 100  |
//!
//! Each characteristic is notify-only and carries a CCCD (0x2902).  The
//! stack answers reads and writes of both attributes itself; the write
//! callback only logs subscription changes.
//!
//! ## Callback bridge
//!
//! Bluedroid callbacks are C function pointers that cannot capture Rust
//! state.  They keep the connected-peer count in an atomic and post
//! [`LinkEvent`]s to [`LINK_EVENTS`]; the main loop does the rest.
//!
//! [`LinkEvent`]: crate::events::LinkEvent
//! [`LINK_EVENTS`]: crate::events::LINK_EVENTS

use core::sync::atomic::{AtomicUsize, Ordering};

use heapless::String;
use log::{debug, info, warn};

use crate::app::ports::TelemetryLink;
use crate::app::telemetry::TelemetryChannel;
use crate::config::DEVICE_NAME_MAX_LEN;
use crate::error::CommsError;

#[cfg(not(target_os = "espidf"))]
use crate::app::telemetry::MAX_PAYLOAD_LEN;
#[cfg(not(target_os = "espidf"))]
use crate::events::{LinkEvent, LinkEventChannel, push_link_event};

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0xe5df6019_cf42_49f6_a418_346db96363f6;
pub const CHAR_HEART_RATE: u128 = 0x3c1f4fe4_c7ce_4c09_a38a_ba166fce06c6;
pub const CHAR_SPO2: u128 = 0x9749ccd9_940e_4ad6_bce9_d246a8d30dca;
pub const CHAR_TEMPERATURE: u128 = 0x69b82322_1c56_423e_820e_eb08c3f030d4;

/// Characteristic UUID carrying `channel`.
pub const fn channel_uuid(channel: TelemetryChannel) -> u128 {
    match channel {
        TelemetryChannel::HeartRate => CHAR_HEART_RATE,
        TelemetryChannel::Spo2 => CHAR_SPO2,
        TelemetryChannel::Temperature => CHAR_TEMPERATURE,
    }
}

const fn channel_slot(channel: TelemetryChannel) -> usize {
    match channel {
        TelemetryChannel::HeartRate => 0,
        TelemetryChannel::Spo2 => 1,
        TelemetryChannel::Temperature => 2,
    }
}

/// Connected peers, maintained by the GATTS callbacks (or the simulation).
static BLE_PEERS: AtomicUsize = AtomicUsize::new(0);

fn peer_connected() {
    BLE_PEERS.fetch_add(1, Ordering::AcqRel);
}

fn peer_disconnected() {
    let _ = BLE_PEERS.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    Idle,
    Advertising,
    Failed,
}

/// What an advertising restart request should do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertStart {
    Now,
    /// GATT registration is still running; the GAP callback starts
    /// advertising once the advertising data is in place.
    Deferred,
    Refused,
}

pub fn advert_start(state: BleState, gatt_ready: bool) -> AdvertStart {
    match (state, gatt_ready) {
        (BleState::Advertising, true) => AdvertStart::Now,
        (BleState::Advertising, false) => AdvertStart::Deferred,
        _ => AdvertStart::Refused,
    }
}

/// A CCCD value is a little-endian u16; bit 0 enables notifications.
pub fn cccd_notifications_enabled(value: &[u8]) -> bool {
    match value {
        [lo, _hi] => lo & 0x01 != 0,
        _ => false,
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF Bluedroid GATT server
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicU32};

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONN_ID: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
/// Value handles, indexed by `channel_slot`.  0 = not registered yet.
#[cfg(target_os = "espidf")]
static BLE_CHAR_HANDLES: [AtomicU32; 3] = [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)];
/// CCCD handles, indexed by `channel_slot`.
#[cfg(target_os = "espidf")]
static BLE_CCCD_HANDLES: [AtomicU32; 3] = [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)];
/// Index into `TelemetryChannel::ALL` of the characteristic being added.
#[cfg(target_os = "espidf")]
static BLE_CHAR_STEP: AtomicU32 = AtomicU32::new(0);
/// Set once the service is started and the advertising data is configured.
#[cfg(target_os = "espidf")]
static BLE_GATT_READY: AtomicBool = AtomicBool::new(false);

#[cfg(target_os = "espidf")]
fn gatt_ready() -> bool {
    BLE_GATT_READY.load(Ordering::Acquire)
}

#[cfg(not(target_os = "espidf"))]
fn gatt_ready() -> bool {
    true
}

/// One service declaration plus declaration, value and CCCD per channel.
#[cfg(target_os = "espidf")]
const GATT_HANDLE_COUNT: u16 = 1 + 3 * 3;

#[cfg(target_os = "espidf")]
fn uuid128_to_esp(uuid: u128) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 16;
    t.uuid.uuid128 = uuid.to_le_bytes();
    t
}

#[cfg(target_os = "espidf")]
fn adv_params() -> esp_idf_svc::sys::esp_ble_adv_params_t {
    use esp_idf_svc::sys::*;
    esp_ble_adv_params_t {
        adv_int_min: 0x20,
        adv_int_max: 0x40,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        ..unsafe { core::mem::zeroed() }
    }
}

#[cfg(target_os = "espidf")]
fn auto_rsp() -> esp_idf_svc::sys::esp_attr_control_t {
    esp_idf_svc::sys::esp_attr_control_t {
        auto_rsp: esp_idf_svc::sys::ESP_GATT_AUTO_RSP as u8,
    }
}

#[cfg(target_os = "espidf")]
unsafe fn add_notify_char(svc_handle: u16, channel: TelemetryChannel) {
    use esp_idf_svc::sys::*;
    let mut char_uuid = uuid128_to_esp(channel_uuid(channel));
    // Bluedroid copies the initial value into its attribute table.
    let mut initial = [0u8; crate::app::telemetry::MAX_PAYLOAD_LEN];
    let mut value = esp_attr_value_t {
        attr_max_len: initial.len() as u16,
        attr_len: initial.len() as u16,
        attr_value: initial.as_mut_ptr(),
    };
    let mut control = auto_rsp();
    unsafe {
        esp_ble_gatts_add_char(
            svc_handle,
            &mut char_uuid,
            ESP_GATT_PERM_READ as esp_gatt_perm_t,
            ESP_GATT_CHAR_PROP_BIT_NOTIFY as esp_gatt_char_prop_t,
            &mut value,
            &mut control,
        );
    }
}

#[cfg(target_os = "espidf")]
unsafe fn add_cccd(svc_handle: u16) {
    use esp_idf_svc::sys::*;
    let mut uuid: esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    uuid.len = 2;
    uuid.uuid.uuid16 = ESP_GATT_UUID_CHAR_CLIENT_CONFIG as u16;
    // Notifications off until the peer subscribes.
    let mut initial = [0u8; 2];
    let mut value = esp_attr_value_t {
        attr_max_len: initial.len() as u16,
        attr_len: initial.len() as u16,
        attr_value: initial.as_mut_ptr(),
    };
    let mut control = auto_rsp();
    unsafe {
        esp_ble_gatts_add_char_descr(
            svc_handle,
            &mut uuid,
            (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
            &mut value,
            &mut control,
        );
    }
}

/// Advertising packet: flags, full name, 128-bit service UUID.  The scan
/// response repeats the name.  Advertising starts once both are set.
#[cfg(target_os = "espidf")]
unsafe fn configure_advertising() {
    use esp_idf_svc::sys::*;
    // Bluedroid deep-copies the UUID buffer before returning.
    let mut service_uuid = SERVICE_UUID.to_le_bytes();
    let mut adv: esp_ble_adv_data_t = unsafe { core::mem::zeroed() };
    adv.set_scan_rsp = false;
    adv.include_name = true;
    adv.service_uuid_len = service_uuid.len() as u16;
    adv.p_service_uuid = service_uuid.as_mut_ptr();
    adv.flag = (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8;

    let mut scan_rsp: esp_ble_adv_data_t = unsafe { core::mem::zeroed() };
    scan_rsp.set_scan_rsp = true;
    scan_rsp.include_name = true;
    // Preferred connection interval 7.5 ms .. 22.5 ms (1.25 ms units).
    scan_rsp.min_interval = 0x06;
    scan_rsp.max_interval = 0x12;

    unsafe {
        esp_ble_gap_config_adv_data(&mut adv);
        esp_ble_gap_config_adv_data(&mut scan_rsp);
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    _param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_RSP_DATA_SET_COMPLETE_EVT => {
            BLE_GATT_READY.store(true, Ordering::Release);
            let mut params = adv_params();
            unsafe {
                esp_ble_gap_start_advertising(&mut params);
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising started");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use crate::events::{LINK_EVENTS, LinkEvent, push_link_event};
    use esp_idf_svc::sys::*;

    BLE_GATTS_IF.store(gatts_if as u32, Ordering::Relaxed);

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: uuid128_to_esp(SERVICE_UUID),
                    inst_id: 0,
                },
                is_primary: true,
            };
            unsafe {
                esp_ble_gatts_create_service(gatts_if, &mut svc_id, GATT_HANDLE_COUNT);
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let svc_handle = unsafe { (*param).create.service_handle };
            BLE_SVC_HANDLE.store(svc_handle as u32, Ordering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            BLE_CHAR_STEP.store(0, Ordering::Relaxed);
            unsafe {
                add_notify_char(svc_handle, TelemetryChannel::ALL[0]);
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let handle = unsafe { (*param).add_char.attr_handle };
            let step = BLE_CHAR_STEP.load(Ordering::Relaxed) as usize;
            if let Some(&channel) = TelemetryChannel::ALL.get(step) {
                BLE_CHAR_HANDLES[channel_slot(channel)].store(handle as u32, Ordering::Relaxed);
                log::info!("BLE GATTS: {:?} char (handle={})", channel, handle);
                let svc_handle = BLE_SVC_HANDLE.load(Ordering::Relaxed) as u16;
                unsafe {
                    add_cccd(svc_handle);
                }
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            let handle = unsafe { (*param).add_char_descr.attr_handle };
            let step = BLE_CHAR_STEP.load(Ordering::Relaxed) as usize;
            if let Some(&channel) = TelemetryChannel::ALL.get(step) {
                BLE_CCCD_HANDLES[channel_slot(channel)].store(handle as u32, Ordering::Relaxed);
            }
            let step = step + 1;
            BLE_CHAR_STEP.store(step as u32, Ordering::Relaxed);
            let svc_handle = BLE_SVC_HANDLE.load(Ordering::Relaxed) as u16;
            match TelemetryChannel::ALL.get(step) {
                Some(&next) => unsafe { add_notify_char(svc_handle, next) },
                None => {
                    log::info!("BLE GATTS: all characteristics registered");
                    unsafe {
                        esp_ble_gatts_start_service(svc_handle);
                        configure_advertising();
                    }
                }
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let write = unsafe { &(*param).write };
            let value: &[u8] = if write.value.is_null() {
                &[]
            } else {
                unsafe { core::slice::from_raw_parts(write.value, write.len as usize) }
            };
            let channel = TelemetryChannel::ALL
                .into_iter()
                .find(|&c| BLE_CCCD_HANDLES[channel_slot(c)].load(Ordering::Relaxed) == write.handle as u32);
            if let Some(channel) = channel {
                log::info!(
                    "BLE GATTS: {:?} notifications {}",
                    channel,
                    if cccd_notifications_enabled(value) { "on" } else { "off" }
                );
            }
            if write.need_rsp {
                unsafe {
                    esp_ble_gatts_send_response(
                        gatts_if,
                        write.conn_id,
                        write.trans_id,
                        esp_gatt_status_t_ESP_GATT_OK,
                        core::ptr::null_mut(),
                    );
                }
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let conn_id = unsafe { (*param).connect.conn_id };
            BLE_CONN_ID.store(conn_id as u32, Ordering::Relaxed);
            peer_connected();
            log::info!("BLE GATTS: client connected (conn_id={})", conn_id);
            push_link_event(
                &LINK_EVENTS,
                LinkEvent::Connected {
                    at_ms: super::time::uptime_ms(),
                },
            );
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            peer_disconnected();
            log::info!("BLE GATTS: client disconnected");
            push_link_event(
                &LINK_EVENTS,
                LinkEvent::Disconnected {
                    at_ms: super::time::uptime_ms(),
                },
            );
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct BleTelemetryAdapter {
    state: BleState,
    device_name: String<DEVICE_NAME_MAX_LEN>,
    #[cfg(not(target_os = "espidf"))]
    sim_adverts: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_notifications: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_last_payload: [heapless::Vec<u8, MAX_PAYLOAD_LEN>; 3],
}

impl BleTelemetryAdapter {
    pub fn new(device_name: String<DEVICE_NAME_MAX_LEN>) -> Self {
        Self {
            state: BleState::Idle,
            device_name,
            #[cfg(not(target_os = "espidf"))]
            sim_adverts: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_notifications: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_last_payload: Default::default(),
        }
    }

    pub fn state(&self) -> BleState {
        self.state
    }

    /// Bring up the radio and register the GATT service.  Advertising starts
    /// once registration completes.
    pub fn start(&mut self) -> Result<(), CommsError> {
        info!("BLE: starting as '{}'", self.device_name);
        match self.platform_start() {
            Ok(()) => {
                self.state = BleState::Advertising;
                Ok(())
            }
            Err(e) => {
                self.state = BleState::Failed;
                Err(e)
            }
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), CommsError> {
        use esp_idf_svc::sys::*;

        fn check(step: &str, ret: esp_err_t) -> Result<(), CommsError> {
            if ret == ESP_OK as esp_err_t {
                Ok(())
            } else {
                log::error!("BLE: {} failed ({})", step, ret);
                Err(CommsError::BleInitFailed)
            }
        }

        unsafe {
            // BLE only: hand classic BT memory back to the heap.
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            check("bt_controller_init", esp_bt_controller_init(&mut bt_cfg))?;
            check(
                "bt_controller_enable",
                esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE),
            )?;
            check("bluedroid_init", esp_bluedroid_init())?;
            check("bluedroid_enable", esp_bluedroid_enable())?;

            check(
                "gap_register_callback",
                esp_ble_gap_register_callback(Some(ble_gap_event_handler)),
            )?;
            check(
                "gatts_register_callback",
                esp_ble_gatts_register_callback(Some(ble_gatts_event_handler)),
            )?;

            let mut name = [0u8; DEVICE_NAME_MAX_LEN + 1];
            name[..self.device_name.len()].copy_from_slice(self.device_name.as_bytes());
            check(
                "gap_set_device_name",
                esp_ble_gap_set_device_name(name.as_ptr() as *const _),
            )?;

            check("gatts_app_register", esp_ble_gatts_app_register(0))?;
        }
        info!("BLE(espidf): Bluedroid up, registering service {:032x}", SERVICE_UUID);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), CommsError> {
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            self.device_name, SERVICE_UUID
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_notify(&mut self, channel: TelemetryChannel, payload: &[u8]) -> Result<(), CommsError> {
        use esp_idf_svc::sys::*;
        let handle = BLE_CHAR_HANDLES[channel_slot(channel)].load(Ordering::Relaxed);
        if handle == 0 {
            return Err(CommsError::ChannelUnavailable);
        }
        let ret = unsafe {
            esp_ble_gatts_send_indicate(
                BLE_GATTS_IF.load(Ordering::Relaxed) as esp_gatt_if_t,
                BLE_CONN_ID.load(Ordering::Relaxed) as u16,
                handle as u16,
                payload.len() as u16,
                payload.as_ptr() as *mut u8,
                false,
            )
        };
        if ret == ESP_OK as esp_err_t {
            Ok(())
        } else {
            Err(CommsError::NotifyFailed)
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_notify(&mut self, channel: TelemetryChannel, payload: &[u8]) -> Result<(), CommsError> {
        let slot = &mut self.sim_last_payload[channel_slot(channel)];
        slot.clear();
        slot.extend_from_slice(payload)
            .map_err(|_| CommsError::NotifyFailed)?;
        self.sim_notifications = self.sim_notifications.wrapping_add(1);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_restart_advertising(&mut self) {
        let mut params = adv_params();
        unsafe {
            esp_idf_svc::sys::esp_ble_gap_start_advertising(&mut params);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_restart_advertising(&mut self) {
        self.sim_adverts = self.sim_adverts.wrapping_add(1);
    }

    // ── Simulation hooks (host only) ──────────────────────────

    /// What the connect callback does on target.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connect(&mut self, events: &LinkEventChannel, at_ms: u64) {
        peer_connected();
        push_link_event(events, LinkEvent::Connected { at_ms });
    }

    /// What the disconnect callback does on target.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_disconnect(&mut self, events: &LinkEventChannel, at_ms: u64) {
        peer_disconnected();
        push_link_event(events, LinkEvent::Disconnected { at_ms });
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_last_payload(&self, channel: TelemetryChannel) -> &[u8] {
        &self.sim_last_payload[channel_slot(channel)]
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_notifications(&self) -> u32 {
        self.sim_notifications
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_adverts(&self) -> u32 {
        self.sim_adverts
    }
}

// ───────────────────────────────────────────────────────────────
// TelemetryLink implementation
// ───────────────────────────────────────────────────────────────

impl TelemetryLink for BleTelemetryAdapter {
    fn connected_count(&self) -> usize {
        BLE_PEERS.load(Ordering::Acquire)
    }

    fn notify(&mut self, channel: TelemetryChannel, payload: &[u8]) -> Result<(), CommsError> {
        if self.state != BleState::Advertising {
            return Err(CommsError::ChannelUnavailable);
        }
        if self.connected_count() == 0 {
            return Err(CommsError::NotConnected);
        }
        self.platform_notify(channel, payload)
    }

    fn restart_advertising(&mut self) {
        match advert_start(self.state, gatt_ready()) {
            AdvertStart::Now => {
                info!("BLE: advertising");
                self.platform_restart_advertising();
            }
            AdvertStart::Deferred => {
                debug!("BLE: GATT registration pending, advertising starts when it completes");
            }
            AdvertStart::Refused => {
                warn!("BLE: advertising restart requested while {:?}", self.state);
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
