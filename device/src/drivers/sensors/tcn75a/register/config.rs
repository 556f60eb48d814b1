use super::{read_register, write_register};
use crate::drivers::sensors::tcn75a::Nack;
use crate::traits::i2c::{Bus, I2cAddress};
use embassy_time::Duration;

pub const CONFIG: u8 = 0x01;

const ONE_SHOT: u8 = 1 << 7;
const RESOLUTION_SHIFT: u8 = 5;
const FAULT_QUEUE_SHIFT: u8 = 3;
const ALERT_POLARITY: u8 = 1 << 2;
const ALERT_MODE: u8 = 1 << 1;
const SHUTDOWN: u8 = 1 << 0;

/// ADC resolution. Finer steps take longer to convert.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// 0.5 °C
    Bits9,
    /// 0.25 °C
    Bits10,
    /// 0.125 °C
    Bits11,
    /// 0.0625 °C
    Bits12,
}

impl Resolution {
    /// Typical conversion time from the datasheet.
    pub const fn conversion_time(&self) -> Duration {
        match self {
            Resolution::Bits9 => Duration::from_millis(30),
            Resolution::Bits10 => Duration::from_millis(60),
            Resolution::Bits11 => Duration::from_millis(120),
            Resolution::Bits12 => Duration::from_millis(240),
        }
    }
}

/// Consecutive out-of-limit conversions needed to assert the alert output.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FaultQueue {
    One,
    Two,
    Four,
    Six,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AlertPolarity {
    ActiveLow,
    ActiveHigh,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AlertMode {
    Comparator,
    Interrupt,
}

/// The configuration register.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    one_shot: bool,
    resolution: Resolution,
    fault_queue: FaultQueue,
    alert_polarity: AlertPolarity,
    alert_mode: AlertMode,
    shutdown: bool,
}

impl Config {
    /// Low-power steady state used between conversions: shut down, 11 bit,
    /// single fault, active-low comparator output.
    pub const DEFAULT: Config = Config {
        one_shot: false,
        resolution: Resolution::Bits11,
        fault_queue: FaultQueue::One,
        alert_polarity: AlertPolarity::ActiveLow,
        alert_mode: AlertMode::Comparator,
        shutdown: true,
    };

    pub fn read<B: Bus>(address: I2cAddress, bus: &mut B) -> Result<Config, Nack> {
        let mut buf = [0; 1];
        read_register(address, bus, CONFIG, &mut buf)?;
        let [reg] = buf;
        Ok(reg.into())
    }

    pub fn write<B: Bus>(address: I2cAddress, bus: &mut B, reg: Config) -> Result<(), Nack> {
        write_register(address, bus, CONFIG, &[reg.into()])
    }

    pub fn modify<B: Bus, F: FnOnce(&mut Config)>(
        address: I2cAddress,
        bus: &mut B,
        modify: F,
    ) -> Result<(), Nack> {
        let mut reg = Self::read(address, bus)?;
        modify(&mut reg);
        Self::write(address, bus, reg)
    }

    /// Same settings with the one-shot bit set, to start a single conversion.
    pub const fn triggered(self) -> Config {
        Config {
            one_shot: true,
            ..self
        }
    }

    /// Same settings with the one-shot bit clear.
    pub const fn steady(self) -> Config {
        Config {
            one_shot: false,
            ..self
        }
    }

    pub fn resolution(&mut self, resolution: Resolution) -> &mut Self {
        self.resolution = resolution;
        self
    }

    pub fn fault_queue(&mut self, fault_queue: FaultQueue) -> &mut Self {
        self.fault_queue = fault_queue;
        self
    }

    pub fn alert_polarity(&mut self, polarity: AlertPolarity) -> &mut Self {
        self.alert_polarity = polarity;
        self
    }

    pub fn alert_mode(&mut self, mode: AlertMode) -> &mut Self {
        self.alert_mode = mode;
        self
    }

    pub fn shutdown(&mut self, shutdown: bool) -> &mut Self {
        self.shutdown = shutdown;
        self
    }

    pub const fn get_resolution(&self) -> Resolution {
        self.resolution
    }

    pub const fn is_one_shot(&self) -> bool {
        self.one_shot
    }

    pub const fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    pub const fn get_fault_queue(&self) -> FaultQueue {
        self.fault_queue
    }

    pub const fn get_alert_polarity(&self) -> AlertPolarity {
        self.alert_polarity
    }

    pub const fn get_alert_mode(&self) -> AlertMode {
        self.alert_mode
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::DEFAULT
    }
}

impl From<u8> for Resolution {
    fn from(reg: u8) -> Resolution {
        match (reg >> RESOLUTION_SHIFT) & 0b11 {
            0b00 => Resolution::Bits9,
            0b01 => Resolution::Bits10,
            0b10 => Resolution::Bits11,
            _ => Resolution::Bits12,
        }
    }
}

impl From<Resolution> for u8 {
    fn from(resolution: Resolution) -> u8 {
        let bits = match resolution {
            Resolution::Bits9 => 0b00,
            Resolution::Bits10 => 0b01,
            Resolution::Bits11 => 0b10,
            Resolution::Bits12 => 0b11,
        };
        bits << RESOLUTION_SHIFT
    }
}

impl From<u8> for FaultQueue {
    fn from(reg: u8) -> FaultQueue {
        match (reg >> FAULT_QUEUE_SHIFT) & 0b11 {
            0b00 => FaultQueue::One,
            0b01 => FaultQueue::Two,
            0b10 => FaultQueue::Four,
            _ => FaultQueue::Six,
        }
    }
}

impl From<FaultQueue> for u8 {
    fn from(fault_queue: FaultQueue) -> u8 {
        let bits = match fault_queue {
            FaultQueue::One => 0b00,
            FaultQueue::Two => 0b01,
            FaultQueue::Four => 0b10,
            FaultQueue::Six => 0b11,
        };
        bits << FAULT_QUEUE_SHIFT
    }
}

impl From<u8> for AlertPolarity {
    fn from(reg: u8) -> AlertPolarity {
        if reg & ALERT_POLARITY != 0 {
            AlertPolarity::ActiveHigh
        } else {
            AlertPolarity::ActiveLow
        }
    }
}

impl From<AlertPolarity> for u8 {
    fn from(polarity: AlertPolarity) -> u8 {
        match polarity {
            AlertPolarity::ActiveLow => 0,
            AlertPolarity::ActiveHigh => ALERT_POLARITY,
        }
    }
}

impl From<u8> for AlertMode {
    fn from(reg: u8) -> AlertMode {
        if reg & ALERT_MODE != 0 {
            AlertMode::Interrupt
        } else {
            AlertMode::Comparator
        }
    }
}

impl From<AlertMode> for u8 {
    fn from(mode: AlertMode) -> u8 {
        match mode {
            AlertMode::Comparator => 0,
            AlertMode::Interrupt => ALERT_MODE,
        }
    }
}

impl From<u8> for Config {
    fn from(reg: u8) -> Config {
        Config {
            one_shot: reg & ONE_SHOT != 0,
            resolution: reg.into(),
            fault_queue: reg.into(),
            alert_polarity: reg.into(),
            alert_mode: reg.into(),
            shutdown: reg & SHUTDOWN != 0,
        }
    }
}

impl From<Config> for u8 {
    fn from(reg: Config) -> u8 {
        let one_shot = if reg.one_shot { ONE_SHOT } else { 0 };
        let shutdown = if reg.shutdown { SHUTDOWN } else { 0 };
        one_shot
            | u8::from(reg.resolution)
            | u8::from(reg.fault_queue)
            | u8::from(reg.alert_polarity)
            | u8::from(reg.alert_mode)
            | shutdown
    }
}
