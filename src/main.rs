//! PowerMon Firmware — Main Entry Point
//!
//! Hexagonal architecture with a periodic sampling loop and asynchronous
//! cloud completions.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  Ina260Pair     MqttCloudAdapter     LogEventSink    Uptime  │
//! │  (SensorPort)   (CloudPort)          (EventSink)     (time)  │
//! │                                                              │
//! │  ────────────── Port Trait Boundary ─────────────────        │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            AppService (pure logic)                     │  │
//! │  │  UsageStore · CloudReconciler · Reset · Settings       │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  WakeSignal (settings-driven sleep cancel)                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::info;

use powermon::adapters::cloud_mqtt::MqttCloudAdapter;
use powermon::adapters::ina260::Ina260Pair;
use powermon::adapters::log_sink::LogEventSink;
use powermon::adapters::time::Uptime;
use powermon::app::service::AppService;
use powermon::cloud::{channels, CloudEvent};
use powermon::config;
use powermon::sampler::WakeSignal;

const MQTT_BROKER_URL: &str = match option_env!("POWERMON_BROKER_URL") {
    Some(url) => url,
    None => "mqtt://broker.local:1883",
};
const WIFI_SSID: &str = match option_env!("POWERMON_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "powermon",
};
const WIFI_PSK: &str = match option_env!("POWERMON_WIFI_PSK") {
    Some(psk) => psk,
    None => "",
};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("PowerMon v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. Shared state and domain service ────────────────────
    let settings = config::shared_default();
    let mut service = AppService::new(settings.clone());
    let mut sink = LogEventSink::new();
    let wake = WakeSignal::new();
    let uptime = Uptime::new();

    // ── 3. Hardware adapters ──────────────────────────────────
    let peripherals = esp_idf_hal::peripherals::Peripherals::take()?;
    let i2c = esp_idf_hal::i2c::I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6,
        peripherals.pins.gpio7,
        &esp_idf_hal::i2c::config::Config::new(),
    )?;
    let mut sensors = Ina260Pair::new(i2c);

    // ── 4. Network and transport ──────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID.try_into().map_err(|()| anyhow::anyhow!("SSID too long"))?,
        password: WIFI_PSK.try_into().map_err(|()| anyhow::anyhow!("PSK too long"))?,
        ..Default::default()
    }))?;
    wifi.start()?;
    wifi.connect()?;
    wifi.wait_netif_up()?;
    info!("WiFi up; connecting to {MQTT_BROKER_URL}");

    let mut cloud = MqttCloudAdapter::new(MQTT_BROKER_URL, &device_id())?;

    // ── 5. Sampling loop ──────────────────────────────────────
    loop {
        // Apply completions that arrived during the sleep.
        let mut loop_wake = wake.clone();
        channels::drain(|event| {
            if matches!(event, CloudEvent::Connected) {
                if let Err(e) = cloud.subscribe() {
                    log::warn!("MQTT subscribe failed: {e}");
                }
            }
            service.handle_cloud_event(event, &mut cloud, &mut sink, &mut loop_wake);
        });

        service.sample_cycle(&mut sensors, &mut cloud, &mut sink, uptime.now_ms());

        let delay_s = settings.lock().loop_delay_s;
        wake.wait_timeout(Duration::from_secs(delay_s as u64));
    }
}

/// Device identifier derived from the factory MAC.
fn device_id() -> String {
    let mut mac = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    format!(
        "{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}
