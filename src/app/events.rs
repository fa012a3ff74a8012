//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them — log to serial, mirror to a display, etc.

use crate::error::SettingsError;
use crate::settings::SettingKey;
use crate::usage::ChannelId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// A sample was dropped because the usage store was contended.
    SampleDropped(ChannelId),

    /// Neither channel produced a valid sample; no report was sent.
    ReportSkipped,

    /// The authoritative cumulative totals were merged (ms per channel).
    CumulativeMerged { ch0_ms: u64, ch1_ms: u64 },

    /// The cloud held no cumulative value; both channels start at zero.
    CumulativeAbsent,

    /// A confirmed push folded this much unreported time (ms).
    DeltaFolded { channel: ChannelId, folded_ms: u64 },

    /// The remote reset command was executed and acknowledged.
    ResetApplied,

    /// A reset-intent payload failed to decode; no reset was performed.
    ResetIntentMalformed,

    /// A settings delivery changed a runtime parameter.
    SettingUpdated(SettingKey),

    /// A settings delivery was rejected; the prior value is retained.
    SettingRejected(SettingsError),
}
