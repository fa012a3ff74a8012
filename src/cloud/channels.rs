//! Transport-to-control-loop bridge.
//!
//! Uses an `embassy-sync` bounded MPMC channel to carry [`CloudEvent`]s
//! from the async transport callbacks into the synchronous sampling loop.
//! Both execution contexts share the static channel without heap
//! allocation.
//!
//! ```text
//! ┌──────────────┐  CloudEvent   ┌───────────────┐
//! │ Transport    │─────────────▶│ Sampling loop  │
//! │ (callbacks)  │               │ (sync)         │
//! └──────────────┘               └───────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use super::CloudEvent;

/// Channel depth for cloud completions. Push acks, one fetch result, a
/// reset intent, and a settings batch can all land between two cycles.
pub const EVENT_DEPTH: usize = 16;

/// Cloud completions: transport task → sampling loop.
pub static CLOUD_EVENTS: Channel<CriticalSectionRawMutex, CloudEvent, EVENT_DEPTH> = Channel::new();

/// Non-blocking enqueue from transport callbacks. Dropping an event under
/// backpressure is safe: every flow re-converges on the next report cycle.
pub fn publish(event: CloudEvent) {
    if CLOUD_EVENTS.try_send(event).is_err() {
        log::warn!("cloud event queue full; dropping event");
    }
}

/// Drain pending events without blocking (called between sampling cycles).
pub fn drain(mut handle: impl FnMut(CloudEvent)) {
    while let Ok(event) = CLOUD_EVENTS.try_receive() {
        handle(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_then_drain_preserves_order() {
        publish(CloudEvent::Connected);
        publish(CloudEvent::PushAck {
            endpoint: super::super::PushEndpoint::Stream,
            success: true,
        });

        let mut seen = Vec::new();
        drain(|event| seen.push(event));

        assert!(matches!(seen[0], CloudEvent::Connected));
        assert!(matches!(seen[1], CloudEvent::PushAck { success: true, .. }));
        // Queue is empty afterwards.
        drain(|_| panic!("queue should be drained"));
    }
}
