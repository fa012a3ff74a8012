//! Unified error types for the PowerMon firmware.
//!
//! Follows embedded best practice: a single `Error` enum that every subsystem
//! can convert into, keeping the top-level sampling loop's error handling
//! uniform. All variants are `Copy` so they can be cheaply passed between the
//! sampler and the cloud event handlers without allocation.
//!
//! Nothing in this taxonomy is fatal. Every failure mode degrades to "try
//! again next cycle" while preserving the usage-store invariants.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A channel sensor could not be read this cycle.
    Sensor(SensorError),
    /// The usage-store lock could not be acquired within its bound.
    /// The operation was aborted with no partial mutation.
    LockTimeout,
    /// A cloud payload (cumulative fetch or reset intent) failed to decode.
    Decode(DecodeError),
    /// A remote settings value was rejected; the prior value is retained.
    Validation(SettingsError),
    /// A push or fetch could not be handed to the transport.
    Transport(TransportError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::LockTimeout => write!(f, "usage store lock timed out"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Validation(e) => write!(f, "settings: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C transaction with the INA260 failed.
    BusError,
    /// The device did not respond or has not completed a conversion yet.
    NotReady,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusError => write!(f, "I2C bus error"),
            Self::NotReady => write!(f, "device not ready"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Cumulative payload was malformed or missing a channel entry.
    Cumulative,
    /// Reset-intent payload was neither literal `true` nor `false`.
    ResetIntent,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cumulative => write!(f, "malformed cumulative payload"),
            Self::ResetIntent => write!(f, "malformed reset intent"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Settings validation errors
// ---------------------------------------------------------------------------

/// Rejection reasons reported back to the remote settings service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// Known key delivered with a non-integer value.
    FormatInvalid,
    /// Integer value outside the allowed range for this key.
    OutOfRange,
    /// Key is not recognised by this firmware.
    UnknownKey,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FormatInvalid => write!(f, "value format not valid"),
            Self::OutOfRange => write!(f, "value outside allowed range"),
            Self::UnknownKey => write!(f, "key not recognised"),
        }
    }
}

impl From<SettingsError> for Error {
    fn from(e: SettingsError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The client is not connected to the cloud backend.
    NotConnected,
    /// The outbound request could not be enqueued.
    PublishFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::PublishFailed => write!(f, "publish failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
