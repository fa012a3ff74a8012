//! Wire formats for the cloud endpoints.
//!
//! Outbound reports are JSON, matching the dashboard schema:
//!
//! ```json
//! {"cur":{"ch0":5,"ch1":6},"vol":{"ch0":7,"ch1":8},"pow":{"ch0":9,"ch1":10}}
//! {"live_runtime":{"ch0":12,"ch1":0},"cumulative":{"ch0":1000,"ch1":2000}}
//! ```
//!
//! The cumulative fetch response is a compact binary map with unsigned
//! totals keyed `"ch0"`/`"ch1"` (`postcard` map encoding), wrapped in an
//! option whose `None` is the explicit absent marker meaning neither
//! channel has ever reported. Key order is not significant and unknown
//! keys are ignored, but both channel keys must be present.

use serde::{Deserialize, Serialize};

use crate::app::ports::RawSample;
use crate::error::{DecodeError, Error, Result};
use crate::usage::ChannelId;

/// LightDB-style endpoint paths.
pub const STREAM_ENDPOINT: &str = "sensor";
pub const ACTUAL_ENDPOINT: &str = "state/actual";
pub const CUMULATIVE_ENDPOINT: &str = "state/cumulative";
pub const DESIRED_RESET_PATH: &str = "state/desired/reset_cumulative";

/// One value per channel; a missing channel is omitted from the JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch0: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch1: Option<i16>,
}

impl ChannelValues {
    fn set(&mut self, channel: ChannelId, value: i16) {
        match channel {
            ChannelId::Ch0 => self.ch0 = Some(value),
            ChannelId::Ch1 => self.ch1 = Some(value),
        }
    }
}

/// Periodic sensor report pushed to the time-series stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamReport {
    pub cur: ChannelValues,
    pub vol: ChannelValues,
    pub pow: ChannelValues,
}

impl StreamReport {
    /// Build a report from whichever channels produced a valid sample this
    /// cycle. Returns `None` when neither did.
    pub fn from_samples(samples: &[Option<RawSample>; 2]) -> Option<Self> {
        if samples.iter().all(Option::is_none) {
            return None;
        }
        let mut report = Self::default();
        for channel in ChannelId::ALL {
            if let Some(sample) = samples[channel.index()] {
                report.cur.set(channel, sample.current);
                report.vol.set(channel, sample.voltage);
                report.pow.set(channel, sample.power);
            }
        }
        Some(report)
    }
}

/// Pair of per-channel runtime totals (ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimePair {
    pub ch0: u64,
    pub ch1: u64,
}

/// Device actual-state document. `live_runtime` is always present;
/// `cumulative` only once both channels carry a cloud-loaded base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActualState {
    pub live_runtime: RuntimePair,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumulative: Option<RuntimePair>,
}

/// Authoritative cumulative totals held by the cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CumulativeTotals {
    pub ch0: u64,
    pub ch1: u64,
}

/// On-wire shape of the fetch response: a string-keyed map of totals.
type WireTotals<'a> = std::collections::BTreeMap<&'a str, u64>;

/// Decode a cumulative fetch response.
///
/// `Ok(None)` is the explicit absent marker. The map may carry its keys
/// in any order and extra keys are ignored, but a payload that is
/// truncated, has trailing garbage, or is missing either channel key is a
/// [`DecodeError::Cumulative`]; the caller leaves `loaded_from_cloud`
/// untouched and retries on the next report cycle.
pub fn decode_cumulative(bytes: &[u8]) -> Result<Option<CumulativeTotals>> {
    let wire = match postcard::take_from_bytes::<Option<WireTotals>>(bytes) {
        Ok((wire, rest)) if rest.is_empty() => wire,
        _ => return Err(Error::Decode(DecodeError::Cumulative)),
    };
    let Some(map) = wire else {
        return Ok(None);
    };
    match (map.get(ChannelId::Ch0.key()), map.get(ChannelId::Ch1.key())) {
        (Some(&ch0), Some(&ch1)) => Ok(Some(CumulativeTotals { ch0, ch1 })),
        _ => Err(Error::Decode(DecodeError::Cumulative)),
    }
}

/// Encode a cumulative document in the fetch-response format (tests only;
/// the backend produces the real payloads).
pub fn encode_cumulative(totals: Option<CumulativeTotals>) -> Vec<u8> {
    let wire = totals.map(|t| {
        WireTotals::from([
            (ChannelId::Ch0.key(), t.ch0),
            (ChannelId::Ch1.key(), t.ch1),
        ])
    });
    postcard::to_allocvec(&wire).unwrap_or_default()
}
