//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the usage store, the cloud reconciler, the reset
//! handler, and the settings registry. It exposes two entry points to the
//! main loop: [`sample_cycle`](AppService::sample_cycle), driven by the
//! periodic sampler, and [`handle_cloud_event`](AppService::handle_cloud_event),
//! which applies asynchronous transport completions between cycles. All I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────────┐ ──▶ CloudPort
//!                 │         AppService          │
//!  CloudEvent ──▶ │ UsageStore · Reconciler ·   │ ──▶ EventSink
//!                 │ ResetHandler · Settings     │
//!                 └─────────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::cloud::{CloudEvent, CloudReconciler, ResetCommandHandler};
use crate::config::SharedSettings;
use crate::error::Error;
use crate::settings::{SettingOutcome, SettingStatus, SettingsRegistry};
use crate::usage::{ChannelId, UsageStore};

use super::events::AppEvent;
use super::ports::{CloudPort, EventSink, RawSample, SamplerControl, SensorPort};

/// The application service orchestrates all domain logic.
pub struct AppService {
    store: UsageStore,
    reconciler: CloudReconciler,
    reset: ResetCommandHandler,
    registry: SettingsRegistry,
    settings: SharedSettings,
    cycle_count: u64,
}

impl AppService {
    pub fn new(settings: SharedSettings) -> Self {
        Self {
            store: UsageStore::new(),
            reconciler: CloudReconciler::new(),
            reset: ResetCommandHandler::new(),
            registry: SettingsRegistry::new(settings.clone()),
            settings,
            cycle_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Connect-time work: fetch the authoritative cumulative totals and
    /// publish an initial actual-state document.
    pub fn on_connect(&mut self, cloud: &mut impl CloudPort) {
        info!("Cloud session established");
        self.reconciler.request_fetch(cloud);
        if let Err(e) = self.reconciler.report_actual(&self.store, cloud) {
            warn!("Initial actual-state report failed: {e}");
        }
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one sampling cycle: read both channels, accrue active time for
    /// every valid sample, then hand the results to the reconciler.
    ///
    /// `now_ms` is monotonic uptime from the time adapter.
    pub fn sample_cycle(
        &mut self,
        hw: &mut impl SensorPort,
        cloud: &mut impl CloudPort,
        sink: &mut impl EventSink,
        now_ms: i64,
    ) {
        self.cycle_count += 1;

        let mut samples: [Option<RawSample>; 2] = [None, None];
        for channel in ChannelId::ALL {
            match hw.read(channel) {
                Ok(sample) => samples[channel.index()] = Some(sample),
                Err(e) => warn!("Error fetching sensor values from {channel}: {e}"),
            }
        }

        for channel in ChannelId::ALL {
            let Some(sample) = samples[channel.index()] else {
                continue;
            };
            let floor = self.settings.lock().adc_floor(channel);
            match self.store.update(channel, sample.current, floor, now_ms) {
                Ok(()) => {}
                Err(Error::LockTimeout) => {
                    // Contended sample is dropped, not escalated.
                    warn!("Failed to update ontime for {channel}: store busy");
                    sink.emit(&AppEvent::SampleDropped(channel));
                }
                Err(e) => warn!("Failed to update ontime for {channel}: {e}"),
            }
        }

        if let Ok((ch0, ch1)) = self.store.live_runtimes() {
            debug!("Ontime:\t(ch0): {ch0}\t(ch1): {ch1}");
        }

        if let Err(e) = self
            .reconciler
            .report_cycle(&self.store, &samples, cloud, sink)
        {
            warn!("Report cycle incomplete: {e}");
        }
    }

    // ── Cloud completions ─────────────────────────────────────

    /// Apply one asynchronous transport completion.
    pub fn handle_cloud_event(
        &mut self,
        event: CloudEvent,
        cloud: &mut impl CloudPort,
        sink: &mut impl EventSink,
        sampler: &mut impl SamplerControl,
    ) {
        match event {
            CloudEvent::Connected => self.on_connect(cloud),
            CloudEvent::PushAck { endpoint, success } => {
                self.reconciler
                    .on_push_ack(&self.store, endpoint, success, cloud, sink);
            }
            CloudEvent::FetchResult { payload } => {
                self.reconciler
                    .on_fetch_result(&self.store, payload.as_deref(), sink);
            }
            CloudEvent::DesiredReset { payload } => {
                match self
                    .reset
                    .on_desired(&payload, &self.store, &mut self.reconciler, cloud, sink)
                {
                    Ok(()) | Err(Error::Decode(_)) => {} // decode errors already logged
                    Err(e) => warn!("Reset command not applied: {e}"),
                }
            }
            CloudEvent::Setting { key, value } => {
                let result = self.registry.apply(&key, value);
                let status = SettingStatus::from(&result);
                match result {
                    Ok(SettingOutcome::Updated(applied)) => {
                        sink.emit(&AppEvent::SettingUpdated(applied));
                        sampler.wake();
                    }
                    Ok(SettingOutcome::Unchanged(_)) => {}
                    Err(Error::Validation(reason)) => {
                        warn!("Rejected setting {key}: {reason}");
                        sink.emit(&AppEvent::SettingRejected(reason));
                    }
                    Err(e) => warn!("Setting {key} not applied: {e}"),
                }
                if let Err(e) = cloud.ack_setting(&key, status) {
                    warn!("Could not report settings status: {e}");
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Shared counter store (read access for reporting and tests).
    pub fn store(&self) -> &UsageStore {
        &self.store
    }

    /// Total sampling cycles executed since startup.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }
}
