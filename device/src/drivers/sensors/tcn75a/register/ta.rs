use super::read_register;
use crate::domain::reading::RawReading;
use crate::drivers::sensors::tcn75a::Nack;
use crate::traits::i2c::{Bus, I2cAddress};

// ambient temperature, 2 bytes MSB first, read-only
pub const TA: u8 = 0x00;

pub struct Ta;

impl Ta {
    pub fn read<B: Bus>(address: I2cAddress, bus: &mut B) -> Result<RawReading, Nack> {
        let mut buf = [0; 2];
        read_register(address, bus, TA, &mut buf)?;
        let [msb, lsb] = buf;
        Ok(RawReading::from_bytes(msb, lsb))
    }
}
