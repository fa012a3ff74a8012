//! Cloud reconciliation — wire payloads, the cumulative merge protocol,
//! and the remote reset handshake.
//!
//! The sampler issues outbound pushes and fetches through the
//! [`CloudPort`](crate::app::ports::CloudPort) and keeps going; responses
//! arrive later on the transport task and are delivered to the control
//! loop as [`CloudEvent`]s through [`channels::CLOUD_EVENTS`].

pub mod channels;
pub mod payload;
pub mod reconciler;
pub mod reset;

pub use reconciler::CloudReconciler;
pub use reset::ResetCommandHandler;

use crate::settings::SettingValue;

/// Maximum encoded size of a cumulative fetch response.
pub const CUMULATIVE_PAYLOAD_MAX: usize = 64;
/// Maximum size of an observed reset-intent payload.
pub const INTENT_PAYLOAD_MAX: usize = 16;
/// Maximum length of a settings key.
pub const SETTING_KEY_MAX: usize = 24;

/// Which outbound endpoint a push acknowledgement refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEndpoint {
    /// Time-series sensor stream (`sensor`).
    Stream,
    /// Device actual-state document (`state/actual`).
    Actual,
}

/// Asynchronous completions and observations delivered out-of-band by the
/// transport, applied by the control loop between sampling cycles.
#[derive(Debug, Clone)]
pub enum CloudEvent {
    /// The transport (re-)established its session.
    Connected,
    /// A previously issued push completed.
    PushAck { endpoint: PushEndpoint, success: bool },
    /// The cumulative fetch completed. `None` means transport failure;
    /// the bytes are decoded by the reconciler.
    FetchResult {
        payload: Option<heapless::Vec<u8, CUMULATIVE_PAYLOAD_MAX>>,
    },
    /// The observed desired-reset value changed.
    DesiredReset {
        payload: heapless::Vec<u8, INTENT_PAYLOAD_MAX>,
    },
    /// A remote settings delivery.
    Setting {
        key: heapless::String<SETTING_KEY_MAX>,
        value: SettingValue,
    },
}
