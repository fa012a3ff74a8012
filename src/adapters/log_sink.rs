//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A display or indicator adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::SampleDropped(channel) => {
                warn!("SAMPLE | {channel} dropped (store busy)");
            }
            AppEvent::ReportSkipped => {
                warn!("REPORT | no valid samples this cycle");
            }
            AppEvent::CumulativeMerged { ch0_ms, ch1_ms } => {
                info!("CLOUD  | cumulative loaded: ch0={ch0_ms}ms ch1={ch1_ms}ms");
            }
            AppEvent::CumulativeAbsent => {
                info!("CLOUD  | no cumulative on record; starting at zero");
            }
            AppEvent::DeltaFolded { channel, folded_ms } => {
                info!("CLOUD  | folded {folded_ms}ms of {channel} into cumulative");
            }
            AppEvent::ResetApplied => {
                info!("RESET  | cumulative totals zeroed and acknowledged");
            }
            AppEvent::ResetIntentMalformed => {
                warn!("RESET  | malformed intent ignored");
            }
            AppEvent::SettingUpdated(key) => {
                info!("CONFIG | {} updated", key.name());
            }
            AppEvent::SettingRejected(reason) => {
                warn!("CONFIG | setting rejected: {reason}");
            }
        }
    }
}
