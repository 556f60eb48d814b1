pub mod config;
pub mod ta;

use super::{Nack, Stage};
use crate::traits::i2c::{Bus, I2cAddress};

/// Open a write transaction and load the register pointer.
///
/// On failure the transaction has already been closed with a stop.
fn select<B: Bus>(address: I2cAddress, bus: &mut B, pointer: u8) -> Result<(), Nack> {
    bus.start();
    if !bus.write_byte(address.write()) {
        bus.stop();
        return Err(Nack::new(address, Stage::Address));
    }
    if !bus.write_byte(pointer) {
        bus.stop();
        return Err(Nack::new(address, Stage::Pointer));
    }
    Ok(())
}

/// Write `bytes` to the register at `pointer` in a single transaction.
pub(crate) fn write_register<B: Bus>(
    address: I2cAddress,
    bus: &mut B,
    pointer: u8,
    bytes: &[u8],
) -> Result<(), Nack> {
    select(address, bus, pointer)?;
    for byte in bytes {
        if !bus.write_byte(*byte) {
            bus.stop();
            return Err(Nack::new(address, Stage::Data));
        }
    }
    bus.stop();
    Ok(())
}

/// Point at `pointer`, then clock `buf.len()` bytes out of the device.
///
/// Every byte but the last is acknowledged; the last one is not, which
/// tells the device the read is over.
pub(crate) fn read_register<B: Bus>(
    address: I2cAddress,
    bus: &mut B,
    pointer: u8,
    buf: &mut [u8],
) -> Result<(), Nack> {
    select(address, bus, pointer)?;
    bus.stop();

    bus.start();
    if !bus.write_byte(address.read()) {
        bus.stop();
        return Err(Nack::new(address, Stage::ReadAddress));
    }
    let last = buf.len().saturating_sub(1);
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = bus.read_byte();
        bus.send_ack(i != last);
    }
    bus.stop();
    Ok(())
}
