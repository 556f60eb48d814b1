use core::fmt::{Formatter, LowerHex, UpperHex};

/// 7-bit address of a device on the bus.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct I2cAddress(u8);

impl I2cAddress {
    pub const fn new(val: u8) -> Self {
        Self(val & 0x7F)
    }

    /// First byte of a write transaction: address shifted left, R/W bit clear.
    pub const fn write(&self) -> u8 {
        self.0 << 1
    }

    /// First byte of a read transaction: address shifted left, R/W bit set.
    pub const fn read(&self) -> u8 {
        (self.0 << 1) | 1
    }
}

impl From<I2cAddress> for u8 {
    fn from(address: I2cAddress) -> u8 {
        address.0
    }
}

impl From<u8> for I2cAddress {
    fn from(val: u8) -> I2cAddress {
        I2cAddress::new(val)
    }
}

impl LowerHex for I2cAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        LowerHex::fmt(&self.0, f)
    }
}

impl UpperHex for I2cAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        UpperHex::fmt(&self.0, f)
    }
}

/// Byte-level primitives of a two-wire bus master.
///
/// Implementations own the clock timing. Users only sequence calls: a
/// transaction is `start`, one or more `write_byte`/`read_byte` steps and
/// `stop`. There is no arbitration; the caller is the only master.
pub trait Bus {
    /// Bring the bus lines to idle. Called before each batch of transactions.
    fn init(&mut self) {}

    fn start(&mut self);

    fn stop(&mut self);

    /// Clock out one byte and sample the acknowledge bit.
    ///
    /// Returns `true` if the addressed device acknowledged.
    fn write_byte(&mut self, byte: u8) -> bool;

    fn read_byte(&mut self) -> u8;

    /// Answer a received byte: `true` acknowledges, `false` ends the read.
    fn send_ack(&mut self, ack: bool);
}

impl<B: Bus + ?Sized> Bus for &mut B {
    fn init(&mut self) {
        B::init(self)
    }

    fn start(&mut self) {
        B::start(self)
    }

    fn stop(&mut self) {
        B::stop(self)
    }

    fn write_byte(&mut self, byte: u8) -> bool {
        B::write_byte(self, byte)
    }

    fn read_byte(&mut self) -> u8 {
        B::read_byte(self)
    }

    fn send_ack(&mut self, ack: bool) {
        B::send_ack(self, ack)
    }
}
