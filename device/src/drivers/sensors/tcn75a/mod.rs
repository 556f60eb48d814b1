//! Microchip TCN75A digital temperature sensor.
//!
//! Up to eight chips share one bus. Each answers at [`BASE_ADDR`] OR-ed with
//! the level of its three address pins, which this driver calls its slot.
pub mod register;

use crate::domain::reading::RawReading;
use crate::traits::i2c::{Bus, I2cAddress};
use register::config::Config;
use register::ta::Ta;

pub const BASE_ADDR: u8 = 0x48;

/// Number of addressable chips on one bus.
pub const SLOTS: usize = 8;

/// Position of a chip on the bus, `0..8`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotId(u8);

impl SlotId {
    pub const fn new(index: u8) -> Option<SlotId> {
        if (index as usize) < SLOTS {
            Some(SlotId(index))
        } else {
            None
        }
    }

    /// Every slot, in increasing order.
    pub fn all() -> impl Iterator<Item = SlotId> {
        (0..SLOTS as u8).map(SlotId)
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Bit of this slot in a presence mask.
    pub const fn mask(&self) -> u8 {
        1 << self.0
    }

    pub const fn address(&self) -> I2cAddress {
        I2cAddress::new(BASE_ADDR | self.0)
    }
}

/// Byte of a transaction the device did not acknowledge.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Address byte of a write transaction.
    Address,
    /// Register pointer byte.
    Pointer,
    /// Register data byte.
    Data,
    /// Address byte of the read transaction following a pointer write.
    ReadAddress,
}

/// A transaction was aborted because the device did not acknowledge.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Nack {
    address: I2cAddress,
    stage: Stage,
}

impl Nack {
    pub const fn new(address: I2cAddress, stage: Stage) -> Self {
        Self { address, stage }
    }

    pub fn address(&self) -> I2cAddress {
        self.address
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn slot(&self) -> Option<SlotId> {
        let address: u8 = self.address.into();
        if address & !0x07 == BASE_ADDR {
            SlotId::new(address & 0x07)
        } else {
            None
        }
    }
}

impl core::fmt::Display for Nack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "no ack from 0x{:x} at {:?}", self.address, self.stage)
    }
}

/// One chip of the bank.
///
/// The driver holds no bus; every operation borrows it for exactly one
/// transaction (or one pointer write plus one read).
pub struct Tcn75a {
    address: I2cAddress,
}

impl Tcn75a {
    pub const fn new(slot: SlotId) -> Self {
        Self {
            address: slot.address(),
        }
    }

    pub fn address(&self) -> I2cAddress {
        self.address
    }

    /// Write the configuration register.
    ///
    /// Address, pointer and data byte must each be acknowledged. The first
    /// missing acknowledge aborts the transaction; stop is still issued.
    /// There is no retry.
    pub fn write_config<B: Bus>(&self, bus: &mut B, config: Config) -> Result<(), Nack> {
        Config::write(self.address, bus, config)
    }

    pub fn read_config<B: Bus>(&self, bus: &mut B) -> Result<Config, Nack> {
        Config::read(self.address, bus)
    }

    /// Read the ambient temperature register.
    pub fn read_temperature<B: Bus>(&self, bus: &mut B) -> Result<RawReading, Nack> {
        Ta::read(self.address, bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_addresses() {
        let addresses: [u8; SLOTS] = core::array::from_fn(|i| {
            SlotId::new(i as u8).map(|s| s.address().into()).unwrap_or(0)
        });
        assert_eq!([0x48, 0x49, 0x4A, 0x4B, 0x4C, 0x4D, 0x4E, 0x4F], addresses);
        assert!(SlotId::new(8).is_none());
        assert_eq!(8, SlotId::all().count());
    }

    #[test]
    fn direction_bytes() {
        let address = SlotId::new(3).map(|s| s.address());
        assert_eq!(Some(0x96), address.map(|a| a.write()));
        assert_eq!(Some(0x97), address.map(|a| a.read()));
    }

    #[test]
    fn nack_maps_back_to_slot() {
        let nack = Nack::new(I2cAddress::new(0x4D), Stage::Data);
        assert_eq!(SlotId::new(5), nack.slot());
        assert_eq!(None, Nack::new(I2cAddress::new(0x20), Stage::Address).slot());
    }
}
