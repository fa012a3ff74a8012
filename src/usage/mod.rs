//! Usage accounting — per-channel activity detection and the shared
//! counter store.
//!
//! A channel is *active* when its most recent raw current reading exceeds
//! its configured floor. [`channel::ChannelState`] turns a stream of raw
//! readings into a session runtime and an unreported active-time delta;
//! [`store::UsageStore`] holds both channels behind a single bounded lock
//! and owns the merge/fold/reset transitions against the cloud total.

pub mod channel;
pub mod store;

pub use channel::{ChannelSnapshot, ChannelState};
pub use store::UsageStore;

/// Identifier for one of the two monitored channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Ch0,
    Ch1,
}

impl ChannelId {
    /// Both channels, in reporting order.
    pub const ALL: [ChannelId; 2] = [ChannelId::Ch0, ChannelId::Ch1];

    /// Array index for per-channel storage.
    pub const fn index(self) -> usize {
        match self {
            Self::Ch0 => 0,
            Self::Ch1 => 1,
        }
    }

    /// Wire key used in cloud payloads.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Ch0 => "ch0",
            Self::Ch1 => "ch1",
        }
    }
}

impl core::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}
