//! Runtime settings
//!
//! The tunable parameters for the PowerMon sampling loop. Values start at
//! firmware defaults and are mutated only by validated remote settings
//! updates (see [`crate::settings`]).

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::usage::ChannelId;

/// Inclusive bounds for `LOOP_DELAY_S` (12 hour maximum delay).
pub const LOOP_DELAY_MIN_S: i64 = 1;
pub const LOOP_DELAY_MAX_S: i64 = 43_200;

/// Process-wide mutable sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Seconds between sampling cycles.
    pub loop_delay_s: i32,
    /// Per-channel inactivity threshold: a raw reading at or below this
    /// value counts the channel as off.
    pub adc_floor: [i16; 2],
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            loop_delay_s: 6,
            adc_floor: [0, 0],
        }
    }
}

impl RuntimeSettings {
    /// Inactivity threshold for one channel.
    pub fn adc_floor(&self, channel: ChannelId) -> i16 {
        self.adc_floor[channel.index()]
    }
}

/// Settings shared between the sampler and the settings handler.
pub type SharedSettings = Arc<Mutex<RuntimeSettings>>;

/// Fresh shared settings at firmware defaults.
pub fn shared_default() -> SharedSettings {
    Arc::new(Mutex::new(RuntimeSettings::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_sane() {
        let s = RuntimeSettings::default();
        assert!(i64::from(s.loop_delay_s) >= LOOP_DELAY_MIN_S);
        assert!(i64::from(s.loop_delay_s) <= LOOP_DELAY_MAX_S);
        assert_eq!(s.adc_floor, [0, 0]);
    }

    #[test]
    fn floor_lookup_by_channel() {
        let s = RuntimeSettings {
            loop_delay_s: 6,
            adc_floor: [10, -20],
        };
        assert_eq!(s.adc_floor(ChannelId::Ch0), 10);
        assert_eq!(s.adc_floor(ChannelId::Ch1), -20);
    }

    #[test]
    fn serde_roundtrip() {
        let s = RuntimeSettings {
            loop_delay_s: 60,
            adc_floor: [100, -32768],
        };
        let json = serde_json::to_string(&s).unwrap();
        let s2: RuntimeSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(s.loop_delay_s, s2.loop_delay_s);
        assert_eq!(s.adc_floor, s2.adc_floor);
    }
}
