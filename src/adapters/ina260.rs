//! INA260 current/voltage/power monitor adapter (one per channel, shared
//! I2C bus).
//!
//! Register map: 0x01 current, 0x02 bus voltage, 0x03 power, all 16-bit
//! big-endian. LSB weights: 1.25 mA, 1.25 mV, 10 mW.
//!
//! Generic over `embedded-hal`'s blocking [`I2c`] trait, so on target it
//! runs against `esp-idf-hal`'s `I2cDriver` and in tests against a stub
//! bus.

use embedded_hal::i2c::I2c;
use log::info;

use crate::app::ports::{RawSample, SensorPort};
use crate::error::SensorError;
use crate::usage::ChannelId;

/// I2C addresses for the two channel monitors.
pub const CH0_ADDR: u8 = 0x40;
pub const CH1_ADDR: u8 = 0x41;

const REG_CURRENT: u8 = 0x01;
const REG_BUS_VOLTAGE: u8 = 0x02;
const REG_POWER: u8 = 0x03;

/// Current register LSB in mA.
pub const CURRENT_LSB_MA: f32 = 1.25;
/// Bus-voltage register LSB in mV.
pub const VOLTAGE_LSB_MV: f32 = 1.25;
/// Power register LSB in mW.
pub const POWER_LSB_MW: f32 = 10.0;

/// Physical conversions for display/logging; the core only ever sees raw
/// register values.
pub fn raw_to_current_ma(raw: i16) -> f32 {
    f32::from(raw) * CURRENT_LSB_MA
}

pub fn raw_to_voltage_mv(raw: i16) -> f32 {
    f32::from(raw) * VOLTAGE_LSB_MV
}

pub fn raw_to_power_mw(raw: i16) -> f32 {
    f32::from(raw) * POWER_LSB_MW
}

const fn address_for(channel: ChannelId) -> u8 {
    match channel {
        ChannelId::Ch0 => CH0_ADDR,
        ChannelId::Ch1 => CH1_ADDR,
    }
}

/// Both INA260s behind the shared I2C bus.
pub struct Ina260Pair<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Ina260Pair<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    fn read_register(&mut self, addr: u8, reg: u8) -> Result<i16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(addr, &[reg], &mut buf)
            .map_err(|_| SensorError::BusError)?;
        Ok(i16::from_be_bytes(buf))
    }
}

impl<I2C: I2c> SensorPort for Ina260Pair<I2C> {
    fn read(&mut self, channel: ChannelId) -> Result<RawSample, SensorError> {
        let addr = address_for(channel);
        let sample = RawSample {
            current: self.read_register(addr, REG_CURRENT)?,
            voltage: self.read_register(addr, REG_BUS_VOLTAGE)?,
            power: self.read_register(addr, REG_POWER)?,
        };
        info!(
            "Device {channel}: {:.2} mV, {:.2} mA, {:.0} mW",
            raw_to_voltage_mv(sample.voltage),
            raw_to_current_ma(sample.current),
            raw_to_power_mw(sample.power),
        );
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use embedded_hal::i2c::{ErrorType, Operation};

    use super::*;

    /// Stub bus: every register read answers with `address ^ register`,
    /// big-endian, so routing mistakes show up in the returned values.
    struct EchoBus;

    impl ErrorType for EchoBus {
        type Error = Infallible;
    }

    impl I2c for EchoBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Infallible> {
            let mut reg = 0u8;
            for op in operations {
                match op {
                    Operation::Write(bytes) => reg = bytes[0],
                    Operation::Read(buf) => {
                        buf[0] = 0;
                        buf[1] = address ^ reg;
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn reads_route_to_the_channel_address() {
        let mut pair = Ina260Pair::new(EchoBus);

        let s0 = pair.read(ChannelId::Ch0).unwrap();
        assert_eq!(s0.current, i16::from(CH0_ADDR ^ REG_CURRENT));
        assert_eq!(s0.voltage, i16::from(CH0_ADDR ^ REG_BUS_VOLTAGE));
        assert_eq!(s0.power, i16::from(CH0_ADDR ^ REG_POWER));

        let s1 = pair.read(ChannelId::Ch1).unwrap();
        assert_eq!(s1.current, i16::from(CH1_ADDR ^ REG_CURRENT));
    }

    #[test]
    fn conversions_match_datasheet_lsb() {
        assert!((raw_to_current_ma(100) - 125.0).abs() < f32::EPSILON);
        assert!((raw_to_voltage_mv(4) - 5.0).abs() < f32::EPSILON);
        assert!((raw_to_power_mw(3) - 30.0).abs() < f32::EPSILON);
        assert!(raw_to_current_ma(-100) < 0.0);
    }

    #[test]
    fn channel_addresses() {
        assert_eq!(address_for(ChannelId::Ch0), 0x40);
        assert_eq!(address_for(ChannelId::Ch1), 0x41);
    }
}
