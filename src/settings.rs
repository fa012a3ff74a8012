//! Validated, change-gated remote settings.
//!
//! Three named integer settings arrive from the cloud settings service:
//! `LOOP_DELAY_S` (sampling interval, seconds) and `ADC_FLOOR_CH0` /
//! `ADC_FLOOR_CH1` (per-channel inactivity thresholds). Each delivery is
//! validated here; a rejected value leaves the prior value in place and is
//! reported back as a structured status. A value equal to the current one
//! is accepted silently; only an actual change warrants waking the sampler.

use log::{debug, info};

use crate::config::{SharedSettings, LOOP_DELAY_MAX_S, LOOP_DELAY_MIN_S};
use crate::error::{Error, Result, SettingsError};

/// The settings keys this firmware recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    LoopDelayS,
    AdcFloorCh0,
    AdcFloorCh1,
}

impl SettingKey {
    pub const fn name(self) -> &'static str {
        match self {
            Self::LoopDelayS => "LOOP_DELAY_S",
            Self::AdcFloorCh0 => "ADC_FLOOR_CH0",
            Self::AdcFloorCh1 => "ADC_FLOOR_CH1",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "LOOP_DELAY_S" => Some(Self::LoopDelayS),
            "ADC_FLOOR_CH0" => Some(Self::AdcFloorCh0),
            "ADC_FLOOR_CH1" => Some(Self::AdcFloorCh1),
            _ => None,
        }
    }
}

/// Typed value as delivered by the settings service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    Int(i64),
    Float(f32),
    Bool(bool),
}

/// Wire status reported back to the settings service for each delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingStatus {
    Ok,
    FormatInvalid,
    OutOfRange,
    UnknownKey,
}

impl From<&Result<SettingOutcome>> for SettingStatus {
    fn from(result: &Result<SettingOutcome>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(Error::Validation(SettingsError::FormatInvalid)) => Self::FormatInvalid,
            Err(Error::Validation(SettingsError::OutOfRange)) => Self::OutOfRange,
            _ => Self::UnknownKey,
        }
    }
}

/// Whether an accepted delivery actually changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingOutcome {
    /// The value was applied; the sampler should be woken.
    Updated(SettingKey),
    /// The value already matched; idempotent no-op, no wake.
    Unchanged(SettingKey),
}

/// Validates deliveries and applies them to the shared runtime settings.
pub struct SettingsRegistry {
    settings: SharedSettings,
}

impl SettingsRegistry {
    pub fn new(settings: SharedSettings) -> Self {
        Self { settings }
    }

    /// Validate one delivery and apply it if it passes.
    pub fn apply(&self, key: &str, value: SettingValue) -> Result<SettingOutcome> {
        let key = SettingKey::from_name(key)
            .ok_or(Error::Validation(SettingsError::UnknownKey))?;

        // Every known key is integer-typed.
        let SettingValue::Int(raw) = value else {
            debug!("Received {} with a non-integer value", key.name());
            return Err(Error::Validation(SettingsError::FormatInvalid));
        };

        match key {
            SettingKey::LoopDelayS => {
                if !(LOOP_DELAY_MIN_S..=LOOP_DELAY_MAX_S).contains(&raw) {
                    debug!("Received LOOP_DELAY_S outside allowed range: {raw}");
                    return Err(Error::Validation(SettingsError::OutOfRange));
                }
                let mut settings = self.settings.lock();
                if i64::from(settings.loop_delay_s) == raw {
                    debug!("Received LOOP_DELAY_S already matches local value");
                    return Ok(SettingOutcome::Unchanged(key));
                }
                settings.loop_delay_s = raw as i32;
                info!("Set loop delay to {raw} seconds");
            }
            SettingKey::AdcFloorCh0 | SettingKey::AdcFloorCh1 => {
                if !(i64::from(i16::MIN)..=i64::from(i16::MAX)).contains(&raw) {
                    debug!("Received {} outside allowed range: {raw}", key.name());
                    return Err(Error::Validation(SettingsError::OutOfRange));
                }
                let index = usize::from(key == SettingKey::AdcFloorCh1);
                let mut settings = self.settings.lock();
                if i64::from(settings.adc_floor[index]) == raw {
                    debug!("Received {} already matches local value", key.name());
                    return Ok(SettingOutcome::Unchanged(key));
                }
                settings.adc_floor[index] = raw as i16;
                info!("Set {} to {raw}", key.name());
            }
        }
        Ok(SettingOutcome::Updated(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::shared_default;

    fn registry() -> (SettingsRegistry, SharedSettings) {
        let shared = shared_default();
        (SettingsRegistry::new(shared.clone()), shared)
    }

    #[test]
    fn loop_delay_in_range_is_applied() {
        let (reg, shared) = registry();
        let outcome = reg.apply("LOOP_DELAY_S", SettingValue::Int(60)).unwrap();
        assert_eq!(outcome, SettingOutcome::Updated(SettingKey::LoopDelayS));
        assert_eq!(shared.lock().loop_delay_s, 60);
    }

    #[test]
    fn loop_delay_out_of_range_keeps_prior_value() {
        let (reg, shared) = registry();
        for bad in [0, -5, 43_201] {
            assert_eq!(
                reg.apply("LOOP_DELAY_S", SettingValue::Int(bad)),
                Err(Error::Validation(SettingsError::OutOfRange))
            );
        }
        assert_eq!(shared.lock().loop_delay_s, 6);
    }

    #[test]
    fn unchanged_value_is_an_idempotent_no_op() {
        let (reg, _) = registry();
        assert_eq!(
            reg.apply("LOOP_DELAY_S", SettingValue::Int(6)).unwrap(),
            SettingOutcome::Unchanged(SettingKey::LoopDelayS)
        );
    }

    #[test]
    fn adc_floor_routes_to_the_right_channel() {
        let (reg, shared) = registry();
        reg.apply("ADC_FLOOR_CH1", SettingValue::Int(100)).unwrap();
        assert_eq!(shared.lock().adc_floor, [0, 100]);
        reg.apply("ADC_FLOOR_CH0", SettingValue::Int(-7)).unwrap();
        assert_eq!(shared.lock().adc_floor, [-7, 100]);
    }

    #[test]
    fn adc_floor_accepts_full_i16_range_only() {
        let (reg, shared) = registry();
        reg.apply("ADC_FLOOR_CH0", SettingValue::Int(-32_768)).unwrap();
        reg.apply("ADC_FLOOR_CH1", SettingValue::Int(32_767)).unwrap();
        assert_eq!(shared.lock().adc_floor, [-32_768, 32_767]);

        assert_eq!(
            reg.apply("ADC_FLOOR_CH0", SettingValue::Int(32_768)),
            Err(Error::Validation(SettingsError::OutOfRange))
        );
    }

    #[test]
    fn non_integer_value_is_format_invalid() {
        let (reg, _) = registry();
        assert_eq!(
            reg.apply("LOOP_DELAY_S", SettingValue::Float(6.0)),
            Err(Error::Validation(SettingsError::FormatInvalid))
        );
        assert_eq!(
            reg.apply("ADC_FLOOR_CH0", SettingValue::Bool(true)),
            Err(Error::Validation(SettingsError::FormatInvalid))
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let (reg, _) = registry();
        assert_eq!(
            reg.apply("FAN_SPEED", SettingValue::Int(1)),
            Err(Error::Validation(SettingsError::UnknownKey))
        );
    }

    #[test]
    fn status_mapping_covers_all_outcomes() {
        let ok: Result<SettingOutcome> = Ok(SettingOutcome::Updated(SettingKey::LoopDelayS));
        assert_eq!(SettingStatus::from(&ok), SettingStatus::Ok);
        let bad: Result<SettingOutcome> = Err(Error::Validation(SettingsError::OutOfRange));
        assert_eq!(SettingStatus::from(&bad), SettingStatus::OutOfRange);
    }
}
