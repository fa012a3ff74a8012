//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (the INA260 driver, the cloud transport, event sinks)
//! implement these traits. The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! or sockets directly.

use crate::cloud::payload::{ActualState, StreamReport};
use crate::error::{SensorError, TransportError};
use crate::settings::SettingStatus;
use crate::usage::ChannelId;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw register values from one current-sensing channel.
///
/// Physical conversion stays outside the core:
/// `voltage_mV = raw * 1.25`, `current_mA = raw * 1.25`,
/// `power_mW = raw * 10` (see [`crate::adapters::ina260`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub current: i16,
    pub voltage: i16,
    pub power: i16,
}

/// Read-side port: the domain calls this once per channel per cycle.
pub trait SensorPort {
    /// Fetch a fresh reading. A failure skips the channel for this cycle;
    /// no counters are mutated and nothing escalates.
    fn read(&mut self, channel: ChannelId) -> Result<RawSample, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Cloud port (driven adapter: domain → transport)
// ───────────────────────────────────────────────────────────────

/// Write-side port to the cloud backend.
///
/// Every method is fire-and-forget from the sampler's perspective: `Ok`
/// means the request was handed to the transport, not that it succeeded.
/// Completions arrive later as [`CloudEvent`](crate::cloud::CloudEvent)s.
pub trait CloudPort {
    /// Push a sensor report to the time-series stream.
    fn push_stream(&mut self, report: &StreamReport) -> Result<(), TransportError>;

    /// Publish the device actual-state document.
    fn set_actual(&mut self, state: &ActualState) -> Result<(), TransportError>;

    /// Request the authoritative cumulative totals.
    fn fetch_cumulative(&mut self) -> Result<(), TransportError>;

    /// Write the desired-reset field back (the reset acknowledgement).
    fn write_desired_reset(&mut self, value: bool) -> Result<(), TransportError>;

    /// Report a settings delivery outcome back to the settings service.
    fn ack_setting(&mut self, key: &str, status: SettingStatus) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Sampler control (decouples settings handling from the loop timer)
// ───────────────────────────────────────────────────────────────

/// Cancels the sampler's current sleep so a changed interval or threshold
/// takes effect without waiting the old delay out. The main loop implements
/// this with a [`WakeSignal`](crate::sampler::WakeSignal); the settings
/// handler knows nothing about condvars.
pub trait SamplerControl {
    fn wake(&mut self);
}
