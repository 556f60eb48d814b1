use super::temperature::{Celsius, Temperature};

/// Marker OR-ed into a stored reading when the bus transaction for its slot failed.
///
/// Bit 0 lies below the finest resolution step (1/16 °C), so a successful
/// read never carries it.
pub const INVALID_READING: u16 = 1;

/// The 16-bit content of the ambient temperature register.
///
/// Layout is `[MSB: sign bit + integer degrees][LSB: fraction in 1/256 °C]`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RawReading(pub u16);

impl RawReading {
    pub const fn from_bytes(msb: u8, lsb: u8) -> Self {
        Self(((msb as u16) << 8) | lsb as u16)
    }

    pub const fn msb(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn lsb(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub const fn value(&self) -> u16 {
        self.0
    }

    pub const fn is_marked_invalid(&self) -> bool {
        self.0 & INVALID_READING != 0
    }

    /// Add the invalid marker, keeping whatever was stored before.
    pub const fn mark_invalid(self) -> Self {
        Self(self.0 | INVALID_READING)
    }

    pub fn celsius(&self) -> f32 {
        decode(self.0)
    }

    pub fn temperature(&self) -> Temperature<Celsius> {
        Temperature::new(self.celsius())
    }
}

impl From<u16> for RawReading {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<RawReading> for u16 {
    fn from(raw: RawReading) -> u16 {
        raw.0
    }
}

impl From<RawReading> for Temperature<Celsius> {
    fn from(raw: RawReading) -> Self {
        raw.temperature()
    }
}

/// Decode an ambient temperature register value into degrees Celsius.
///
/// The sign bit of the MSB is cleared before the integer part is taken,
/// then the result is negated. The LSB is always scaled by 1/256 whatever
/// resolution the chip was configured with.
pub fn decode(raw: u16) -> f32 {
    let [msb, lsb] = raw.to_be_bytes();
    let (sign, integer) = if msb & 0x80 != 0 {
        (-1.0, msb & 0x7F)
    } else {
        (1.0, msb)
    };
    sign * (integer as f32 + lsb as f32 / 256.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_positive() {
        assert_eq!(25.5, decode(0x1980));
        assert_eq!(0.0, decode(0x0000));
        assert_eq!(127.0 + 255.0 / 256.0, decode(0x7FFF));
    }

    #[test]
    fn decode_negative_clears_sign_bit() {
        assert_eq!(-25.5, decode(0x9980));
        assert_eq!(-(127.0 + 255.0 / 256.0), decode(0xFFFF));
    }

    #[test]
    fn decode_fraction_steps() {
        assert_eq!(21.0625, decode(0x1510));
        assert_eq!(21.125, decode(0x1520));
        assert_eq!(21.25, decode(0x1540));
    }

    #[test]
    fn decode_is_bounded() {
        for raw in 0..=u16::MAX {
            let t = decode(raw);
            let magnitude = if t < 0.0 { -t } else { t };
            let integer = magnitude as u32;
            let fraction = magnitude - integer as f32;
            assert!(integer <= 127, "{:#06x} -> {}", raw, t);
            assert!((0.0..1.0).contains(&fraction), "{:#06x} -> {}", raw, t);
        }
    }

    #[test]
    fn invalid_marker_accumulates() {
        let raw = RawReading(0x1980).mark_invalid();
        assert!(raw.is_marked_invalid());
        assert_eq!(0x1981, raw.value());
        assert_eq!(raw, raw.mark_invalid());
    }

    #[test]
    fn byte_split() {
        let raw = RawReading::from_bytes(0x19, 0x80);
        assert_eq!(0x19, raw.msb());
        assert_eq!(0x80, raw.lsb());
        assert_eq!(25.5, raw.temperature().raw_value());
    }
}
