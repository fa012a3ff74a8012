//! Per-channel activity detector and elapsed-time accumulator.
//!
//! Invariants maintained by [`ChannelState::observe`]:
//!
//! - `session_runtime_ms == 0` exactly when `last_active_at` is `None`.
//! - `unreported_ms` only ever decreases by being folded into
//!   `cloud_cumulative_ms` atomically with a confirmed push
//!   ([`fold_unreported`](ChannelState::fold_unreported)).
//! - Once `loaded_from_cloud` is set, `cloud_cumulative_ms + unreported_ms`
//!   never decreases except through an explicit reset.
//!
//! All mutation happens under the [`UsageStore`](super::UsageStore) lock;
//! this type has no locking of its own.

/// Activity counters for one monitored channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelState {
    /// Uptime (ms) of the last sample that found the channel active.
    /// `None` while the channel is off.
    last_active_at: Option<i64>,
    /// Active time (ms) since the most recent off-to-on transition.
    session_runtime_ms: u64,
    /// Active time (ms) accumulated locally but not yet confirmed by a
    /// cloud push.
    unreported_ms: u64,
    /// Last known authoritative total from the cloud. Meaningless until
    /// `loaded_from_cloud` is true.
    cloud_cumulative_ms: u64,
    /// Whether the authoritative base has been fetched since boot.
    loaded_from_cloud: bool,
}

/// Read-only copy of one channel's counters, taken under the store lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub session_runtime_ms: u64,
    pub unreported_ms: u64,
    pub cloud_cumulative_ms: u64,
    pub loaded_from_cloud: bool,
}

impl ChannelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw sample into the detector.
    ///
    /// A reading at or below `floor` forces the channel inactive: the
    /// session runtime is zeroed and the activity timestamp cleared. A
    /// reading above the floor accrues elapsed time since the previous
    /// active sample to both the session runtime and the unreported delta.
    /// The first sample of a new active session is credited a 1 ms floor
    /// rather than time the channel was not yet being observed.
    pub fn observe(&mut self, raw: i16, floor: i16, now_ms: i64) {
        if raw <= floor {
            self.session_runtime_ms = 0;
            self.last_active_at = None;
            return;
        }

        let elapsed = match self.last_active_at {
            // Clamp against a non-monotonic clock; zero is fine.
            Some(prev) => (now_ms - prev).max(0) as u64,
            None => 1,
        };
        self.session_runtime_ms += elapsed;
        self.unreported_ms += elapsed;
        self.last_active_at = Some(now_ms);
    }

    /// Fold the unreported delta into the cloud base after a confirmed
    /// push. Returns the folded amount, or `None` when the authoritative
    /// base has not been loaded yet (folding before the base is known
    /// would corrupt the cumulative total).
    pub fn fold_unreported(&mut self) -> Option<u64> {
        if !self.loaded_from_cloud {
            return None;
        }
        let folded = self.unreported_ms;
        self.cloud_cumulative_ms += folded;
        self.unreported_ms = 0;
        Some(folded)
    }

    /// Install the authoritative cumulative value fetched from the cloud.
    ///
    /// Leaves `unreported_ms` untouched: time accumulated while the fetch
    /// was in flight is still owed and folds in on the next confirmed push.
    pub fn merge_from_cloud(&mut self, cumulative_ms: u64) {
        self.cloud_cumulative_ms = cumulative_ms;
        self.loaded_from_cloud = true;
    }

    /// Zero the cumulative history. Session fields reflect physical
    /// activity, not history, and are left alone.
    pub fn reset_cumulative(&mut self) {
        self.cloud_cumulative_ms = 0;
        self.unreported_ms = 0;
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            session_runtime_ms: self.session_runtime_ms,
            unreported_ms: self.unreported_ms,
            cloud_cumulative_ms: self.cloud_cumulative_ms,
            loaded_from_cloud: self.loaded_from_cloud,
        }
    }

    pub fn session_runtime_ms(&self) -> u64 {
        self.session_runtime_ms
    }

    pub fn loaded_from_cloud(&self) -> bool {
        self.loaded_from_cloud
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_at_or_below_floor_zeroes_session() {
        let mut ch = ChannelState::new();
        ch.observe(5, 0, 0);
        ch.observe(5, 0, 100);
        assert_eq!(ch.session_runtime_ms(), 101); // 1 ms floor + 100 ms

        ch.observe(0, 0, 150);
        assert_eq!(ch.session_runtime_ms(), 0);
        // Unreported time survives the drop to inactive.
        assert_eq!(ch.snapshot().unreported_ms, 101);
    }

    #[test]
    fn first_active_sample_credits_one_ms() {
        let mut ch = ChannelState::new();
        ch.observe(100, 0, 5_000);
        assert_eq!(ch.session_runtime_ms(), 1);
        assert_eq!(ch.snapshot().unreported_ms, 1);
    }

    #[test]
    fn session_zero_iff_not_active() {
        let mut ch = ChannelState::new();
        assert_eq!(ch.session_runtime_ms(), 0);
        assert!(ch.last_active_at.is_none());

        ch.observe(10, 0, 10);
        assert!(ch.session_runtime_ms() > 0);
        assert!(ch.last_active_at.is_some());

        ch.observe(-3, 0, 20);
        assert_eq!(ch.session_runtime_ms(), 0);
        assert!(ch.last_active_at.is_none());
    }

    #[test]
    fn negative_reading_above_negative_floor_is_active() {
        let mut ch = ChannelState::new();
        ch.observe(-50, -100, 0);
        assert_eq!(ch.session_runtime_ms(), 1);
    }

    #[test]
    fn fold_before_load_is_refused() {
        let mut ch = ChannelState::new();
        ch.observe(10, 0, 0);
        assert_eq!(ch.fold_unreported(), None);
        assert_eq!(ch.snapshot().unreported_ms, 1);
    }

    #[test]
    fn fold_after_load_moves_delta_into_base() {
        let mut ch = ChannelState::new();
        ch.merge_from_cloud(1_000);
        ch.observe(10, 0, 0);
        ch.observe(10, 0, 50);

        assert_eq!(ch.fold_unreported(), Some(51));
        let snap = ch.snapshot();
        assert_eq!(snap.cloud_cumulative_ms, 1_051);
        assert_eq!(snap.unreported_ms, 0);

        // Folding again without new observations is a no-op.
        assert_eq!(ch.fold_unreported(), Some(0));
        assert_eq!(ch.snapshot().cloud_cumulative_ms, 1_051);
    }

    #[test]
    fn merge_preserves_unreported_delta() {
        let mut ch = ChannelState::new();
        ch.observe(10, 0, 0);
        ch.observe(10, 0, 49);
        assert_eq!(ch.snapshot().unreported_ms, 50);

        ch.merge_from_cloud(2_000);
        let snap = ch.snapshot();
        assert_eq!(snap.cloud_cumulative_ms, 2_000);
        assert_eq!(snap.unreported_ms, 50);
        assert!(snap.loaded_from_cloud);
    }

    #[test]
    fn reset_clears_history_but_not_session() {
        let mut ch = ChannelState::new();
        ch.merge_from_cloud(9_000);
        ch.observe(10, 0, 0);
        ch.observe(10, 0, 30);

        ch.reset_cumulative();
        let snap = ch.snapshot();
        assert_eq!(snap.cloud_cumulative_ms, 0);
        assert_eq!(snap.unreported_ms, 0);
        assert_eq!(snap.session_runtime_ms, 31);
        assert!(snap.loaded_from_cloud);
    }
}
