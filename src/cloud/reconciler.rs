//! Cumulative-counter merge protocol.
//!
//! The reconciler turns each sampling cycle into outbound reports, applies
//! push acknowledgements and fetch results to the [`UsageStore`], and keeps
//! the authoritative base self-healing: as long as a channel has no
//! cloud-loaded base, every report cycle re-issues the fetch rather than
//! relying on a timer.
//!
//! Reporting is at-least-once by construction. A failed or unacknowledged
//! push changes nothing locally, so the unreported delta simply rides along
//! into the next cycle's report.

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{CloudPort, EventSink, RawSample};
use crate::error::Result;
use crate::usage::store::CommitOutcome;
use crate::usage::{ChannelId, UsageStore};

use super::payload::{self, ActualState, RuntimePair, StreamReport};
use super::PushEndpoint;

pub struct CloudReconciler;

impl CloudReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Push this cycle's sensor report and the actual-state document.
    ///
    /// A combined payload goes out when both channels produced a valid
    /// sample, a single-channel payload when only one did, and nothing when
    /// neither did (a warning, not an error).
    pub fn report_cycle(
        &mut self,
        store: &UsageStore,
        samples: &[Option<RawSample>; 2],
        cloud: &mut impl CloudPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match StreamReport::from_samples(samples) {
            Some(report) => {
                if let Err(e) = cloud.push_stream(&report) {
                    error!("Failed to send sensor data to cloud: {e}");
                }
            }
            None => {
                warn!("Data not available from any sensor");
                sink.emit(&AppEvent::ReportSkipped);
                return Ok(());
            }
        }

        self.report_actual(store, cloud)
    }

    /// Publish the actual-state document, re-triggering the cumulative
    /// fetch when the authoritative base is still missing.
    pub fn report_actual(&mut self, store: &UsageStore, cloud: &mut impl CloudPort) -> Result<()> {
        let state = Self::build_actual_state(store)?;
        if state.cumulative.is_none() {
            // Cumulative not yet loaded from the cloud; try to load it now.
            self.request_fetch(cloud);
        }
        if let Err(e) = cloud.set_actual(&state) {
            error!("Unable to write actual state: {e}");
        }
        Ok(())
    }

    /// Snapshot the store into an actual-state document. The cumulative
    /// block carries the confirmed base only; unreported time folds in
    /// once the push is acknowledged.
    pub fn build_actual_state(store: &UsageStore) -> Result<ActualState> {
        let snap = store.snapshot()?;
        let cumulative = if snap.iter().all(|ch| ch.loaded_from_cloud) {
            Some(RuntimePair {
                ch0: snap[0].cloud_cumulative_ms,
                ch1: snap[1].cloud_cumulative_ms,
            })
        } else {
            None
        };
        Ok(ActualState {
            live_runtime: RuntimePair {
                ch0: snap[0].session_runtime_ms,
                ch1: snap[1].session_runtime_ms,
            },
            cumulative,
        })
    }

    /// Apply a push completion delivered by the transport.
    ///
    /// Only a confirmed actual-state push folds the unreported deltas; a
    /// failure leaves them owed for the next cycle.
    pub fn on_push_ack(
        &mut self,
        store: &UsageStore,
        endpoint: PushEndpoint,
        success: bool,
        cloud: &mut impl CloudPort,
        sink: &mut impl EventSink,
    ) {
        if !success {
            warn!("Async push to {endpoint:?} failed; will retry next cycle");
            return;
        }
        if endpoint != PushEndpoint::Actual {
            return;
        }

        for channel in ChannelId::ALL {
            match store.commit_push(channel) {
                Ok(CommitOutcome::Folded(folded_ms)) => {
                    if folded_ms > 0 {
                        sink.emit(&AppEvent::DeltaFolded { channel, folded_ms });
                    }
                }
                Ok(CommitOutcome::NotLoaded) => {
                    // Push confirmed but the base is unknown; fetch it so
                    // the delta can fold on a later ack.
                    debug!("Push confirmed before cumulative load on {channel}");
                    self.request_fetch(cloud);
                }
                Err(e) => warn!("Could not fold {channel} delta: {e}"),
            }
        }
    }

    /// Issue the cumulative fetch (connect time, or opportunistic retry).
    pub fn request_fetch(&mut self, cloud: &mut impl CloudPort) {
        if let Err(e) = cloud.fetch_cumulative() {
            warn!("Failed to request cumulative totals: {e}");
        }
    }

    /// Apply a fetch completion delivered by the transport.
    ///
    /// `payload` is `None` on transport failure. An explicit absent marker
    /// means both channels start at zero. A malformed payload mutates
    /// nothing; the next report cycle re-issues the fetch.
    pub fn on_fetch_result(
        &mut self,
        store: &UsageStore,
        payload: Option<&[u8]>,
        sink: &mut impl EventSink,
    ) {
        let Some(bytes) = payload else {
            warn!("Cumulative fetch failed; will retry on next report cycle");
            return;
        };

        match payload::decode_cumulative(bytes) {
            Ok(Some(totals)) => match store.merge_pair(totals.ch0, totals.ch1) {
                Ok(()) => {
                    info!("Loaded cumulative totals: ch0={} ch1={}", totals.ch0, totals.ch1);
                    sink.emit(&AppEvent::CumulativeMerged {
                        ch0_ms: totals.ch0,
                        ch1_ms: totals.ch1,
                    });
                }
                Err(e) => warn!("Could not merge cumulative totals: {e}"),
            },
            Ok(None) => {
                info!("No cumulative totals on record; starting both channels at zero");
                match store.merge_pair(0, 0) {
                    Ok(()) => sink.emit(&AppEvent::CumulativeAbsent),
                    Err(e) => warn!("Could not initialise cumulative totals: {e}"),
                }
            }
            Err(e) => {
                error!("Cumulative payload decode error: {e}");
            }
        }
    }
}

impl Default for CloudReconciler {
    fn default() -> Self {
        Self::new()
    }
}
