//! Remote reset command handshake.
//!
//! The cloud expresses a *desired* reset as a boolean field the device
//! observes asynchronously. Observing `true` resets the cumulative totals,
//! writes the field back to `false` as the acknowledgement, and publishes a
//! fresh actual-state document so the dashboard reflects the zeroed totals
//! immediately.
//!
//! Handler phases: `Idle → Resetting → Acknowledging → Idle`. Duplicate
//! delivery of `true` before the write-back has been observed as `false`
//! does not reset again.

use log::{debug, error, info};

use crate::app::events::AppEvent;
use crate::app::ports::{CloudPort, EventSink};
use crate::error::{DecodeError, Error, Result};
use crate::usage::UsageStore;

use super::reconciler::CloudReconciler;

/// Parsed reset-intent payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetIntent {
    Requested,
    Clear,
}

fn parse_intent(payload: &[u8]) -> Result<ResetIntent> {
    match payload {
        b"true" => Ok(ResetIntent::Requested),
        b"false" => Ok(ResetIntent::Clear),
        _ => Err(Error::Decode(DecodeError::ResetIntent)),
    }
}

/// Processes observed desired-reset values idempotently.
pub struct ResetCommandHandler {
    /// Set after a reset until the write-back is observed as `false`.
    awaiting_clear: bool,
}

impl ResetCommandHandler {
    pub fn new() -> Self {
        Self {
            awaiting_clear: false,
        }
    }

    /// Handle one observed desired-reset payload.
    ///
    /// A malformed payload is logged and answered with a `false` write-back
    /// without performing a reset: treating garbage as "nothing to do" can
    /// never destroy counter history, executing it could.
    pub fn on_desired(
        &mut self,
        payload: &[u8],
        store: &UsageStore,
        reconciler: &mut CloudReconciler,
        cloud: &mut impl CloudPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match parse_intent(payload) {
            Ok(ResetIntent::Clear) => {
                // Our own acknowledgement echoing back, or nothing to do.
                self.awaiting_clear = false;
                Ok(())
            }
            Ok(ResetIntent::Requested) => {
                if self.awaiting_clear {
                    debug!("Reset already performed; awaiting cleared intent");
                    return Ok(());
                }
                info!("Request to reset cumulative values received. Processing now.");
                store.reset_all()?;
                self.awaiting_clear = true;
                sink.emit(&AppEvent::ResetApplied);

                if let Err(e) = cloud.write_desired_reset(false) {
                    error!("Unable to acknowledge reset: {e}");
                }
                // Send the zeroed totals to the cloud right away.
                reconciler.report_actual(store, cloud)
            }
            Err(e) => {
                error!("Desired-state decoding error ({} bytes)", payload.len());
                sink.emit(&AppEvent::ResetIntentMalformed);
                // Clear the field without resetting anything.
                if let Err(te) = cloud.write_desired_reset(false) {
                    error!("Unable to clear malformed desired state: {te}");
                }
                Err(e)
            }
        }
    }
}

impl Default for ResetCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}
