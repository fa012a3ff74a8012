//! Shared counter store and its locking discipline.
//!
//! Both channel states live behind one `parking_lot::Mutex`, acquired with
//! a bounded timeout. Routine sampler updates and cloud-response merges use
//! a short bound and drop the operation on contention; the remote reset is
//! rare and latency-tolerant, so it waits longer. A timed-out acquisition
//! aborts cleanly with `Error::LockTimeout` and no partial mutation: the
//! lock guards the whole read-modify-write.

use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::error::{Error, Result};

use super::channel::{ChannelSnapshot, ChannelState};
use super::ChannelId;

/// Lock bound for routine updates, snapshots, and cloud merges.
pub const LOCK_TIMEOUT_SHORT: Duration = Duration::from_millis(300);
/// Lock bound for the remote reset command.
pub const LOCK_TIMEOUT_RESET: Duration = Duration::from_secs(5);

/// Outcome of [`UsageStore::commit_push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The unreported delta (ms) was folded into the cloud base.
    Folded(u64),
    /// The authoritative base is not loaded yet; nothing was folded and
    /// the caller should (re-)trigger a cumulative fetch.
    NotLoaded,
}

/// The single source of truth for both channels' usage counters.
pub struct UsageStore {
    inner: Mutex<[ChannelState; 2]>,
}

impl Default for UsageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new([ChannelState::new(), ChannelState::new()]),
        }
    }

    fn lock(&self, timeout: Duration) -> Result<MutexGuard<'_, [ChannelState; 2]>> {
        self.inner.try_lock_for(timeout).ok_or(Error::LockTimeout)
    }

    /// Feed one raw sample into a channel's activity detector.
    ///
    /// On contention the sample is dropped: `Err(LockTimeout)` with no
    /// counter mutation.
    pub fn update(&self, channel: ChannelId, raw: i16, floor: i16, now_ms: i64) -> Result<()> {
        let mut channels = self.lock(LOCK_TIMEOUT_SHORT)?;
        channels[channel.index()].observe(raw, floor, now_ms);
        Ok(())
    }

    /// Consistent read-only copy of both channels.
    pub fn snapshot(&self) -> Result<[ChannelSnapshot; 2]> {
        let channels = self.lock(LOCK_TIMEOUT_SHORT)?;
        Ok([channels[0].snapshot(), channels[1].snapshot()])
    }

    /// Fold a channel's unreported delta into its cloud base.
    ///
    /// Must only be called from a confirmed-success push acknowledgement.
    pub fn commit_push(&self, channel: ChannelId) -> Result<CommitOutcome> {
        let mut channels = self.lock(LOCK_TIMEOUT_SHORT)?;
        match channels[channel.index()].fold_unreported() {
            Some(folded) => Ok(CommitOutcome::Folded(folded)),
            None => Ok(CommitOutcome::NotLoaded),
        }
    }

    /// Install the authoritative cumulative value for one channel.
    pub fn merge_from_cloud(&self, channel: ChannelId, cumulative_ms: u64) -> Result<()> {
        let mut channels = self.lock(LOCK_TIMEOUT_SHORT)?;
        channels[channel.index()].merge_from_cloud(cumulative_ms);
        Ok(())
    }

    /// Install both channels' authoritative values under one acquisition,
    /// so readers never observe a half-merged pair.
    pub fn merge_pair(&self, ch0_ms: u64, ch1_ms: u64) -> Result<()> {
        let mut channels = self.lock(LOCK_TIMEOUT_SHORT)?;
        channels[0].merge_from_cloud(ch0_ms);
        channels[1].merge_from_cloud(ch1_ms);
        Ok(())
    }

    /// Zero the cumulative history on both channels.
    ///
    /// On `Err(LockTimeout)` the caller must not assume the reset occurred.
    pub fn reset_all(&self) -> Result<()> {
        let mut channels = self.lock(LOCK_TIMEOUT_RESET)?;
        for ch in channels.iter_mut() {
            ch.reset_cumulative();
        }
        Ok(())
    }

    /// Session runtimes for the actual-state report.
    pub fn live_runtimes(&self) -> Result<(u64, u64)> {
        let channels = self.lock(LOCK_TIMEOUT_SHORT)?;
        Ok((
            channels[0].session_runtime_ms(),
            channels[1].session_runtime_ms(),
        ))
    }
}
