//! One-shot conversion scheduling for the whole bank.
//!
//! A cycle walks `Idle -> Triggering -> Converting -> ReadingBack -> Idle`.
//! [`Poller`] implements the phases; how the conversion wait is spent is up
//! to the driver: [`Poller::start`] blocks in-line, [`Schedule`] hands back
//! deadlines to a callback host and [`runner::run`] awaits them.

pub mod runner;
pub mod schedule;

pub use runner::{run, PollerCommand, PollerControl};
pub use schedule::Schedule;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Duration;
use embedded_hal::delay::DelayNs;

use crate::drivers::sensors::tcn75a::register::config::Config;
use crate::drivers::sensors::tcn75a::{SlotId, Tcn75a};
use crate::registry::{Readings, Registry};
use crate::traits::i2c::Bus;

/// Added to the datasheet conversion time before results are read.
pub const CONVERSION_MARGIN: Duration = Duration::from_millis(30);

/// Time between the starts of two cycles.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(10);

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Triggering,
    Converting,
    ReadingBack,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PollerConfig {
    config: Config,
    latency: Duration,
    period: Duration,
}

impl PollerConfig {
    /// Latency is derived from the resolution of `config`; the one-shot bit is dropped.
    pub fn new(config: Config) -> Self {
        let latency = config.get_resolution().conversion_time() + CONVERSION_MARGIN;
        Self {
            config: config.steady(),
            latency,
            period: Self::clamp_period(DEFAULT_PERIOD, latency),
        }
    }

    /// Override the cycle period. Anything shorter than twice the latency is raised to it.
    pub fn with_period(self, period: Duration) -> Self {
        Self {
            period: Self::clamp_period(period, self.latency),
            ..self
        }
    }

    fn clamp_period(period: Duration, latency: Duration) -> Duration {
        let min = latency * 2;
        if period < min {
            min
        } else {
            period
        }
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Minimum time between a trigger and the read-back of its result.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::new(Config::DEFAULT)
    }
}

/// Drives the conversion cycle of every present chip and keeps the registry current.
pub struct Poller<'r, M: RawMutex> {
    registry: &'r Registry<M>,
    config: PollerConfig,
    phase: Phase,
}

impl<'r, M: RawMutex> Poller<'r, M> {
    pub fn new(registry: &'r Registry<M>, config: PollerConfig) -> Self {
        Self {
            registry,
            config,
            phase: Phase::Idle,
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn registry(&self) -> &'r Registry<M> {
        self.registry
    }

    pub fn readings(&self) -> Readings {
        self.registry.readings()
    }

    /// Probe every slot by writing the steady-state configuration to it.
    ///
    /// A slot is present if its chip acknowledged the whole write. Present
    /// chips are left shut down. Returns the presence mask, which is also
    /// recorded in the registry.
    pub fn initialize_bank<B: Bus>(&mut self, bus: &mut B) -> u8 {
        bus.init();
        let config = self.config.config;
        let present = SlotId::all()
            .filter(|slot| match Tcn75a::new(*slot).write_config(bus, config) {
                Ok(()) => true,
                Err(e) => {
                    trace!("slot {} absent: {:?}", slot.index(), e.stage());
                    false
                }
            })
            .fold(0, |mask, slot| mask | slot.mask());

        self.registry.set_presence(present);
        self.phase = Phase::Idle;
        info!("TCN75A presence mask 0x{:x}", present);
        present
    }

    /// Run the first cycle, waiting out the conversion with a blocking delay.
    pub fn start<B: Bus, D: DelayNs>(&mut self, bus: &mut B, delay: &mut D) {
        self.trigger(bus);
        delay.delay_us(micros(self.config.latency));
        self.read_back(bus);
    }

    /// Start a one-shot conversion on every present chip.
    ///
    /// A chip that does not acknowledge is only logged; the cycle goes on
    /// and its read-back is attempted like any other.
    pub fn trigger<B: Bus>(&mut self, bus: &mut B) {
        self.phase = Phase::Triggering;
        trace!("triggering conversions");
        bus.init();
        let config = self.config.config.triggered();
        for slot in self.present_slots() {
            if let Err(e) = Tcn75a::new(slot).write_config(bus, config) {
                warn!("TCN:{} start err {:?}", slot.index(), e.stage());
            }
        }
        self.phase = Phase::Converting;
    }

    /// Read the result of every present chip into the registry.
    ///
    /// Only valid after [`Self::trigger`] and the conversion latency. A
    /// failing chip gets its reading marked invalid and the next slot is
    /// read. Returns `false`, without touching the bus, if no conversion
    /// is pending.
    pub fn read_back<B: Bus>(&mut self, bus: &mut B) -> bool {
        if self.phase != Phase::Converting {
            debug!("read-back without pending conversion ignored");
            return false;
        }
        self.phase = Phase::ReadingBack;
        trace!("reading back");
        bus.init();
        for slot in self.present_slots() {
            match Tcn75a::new(slot).read_temperature(bus) {
                Ok(raw) => self.registry.store(slot, raw),
                Err(e) => {
                    debug!("TCN:{} read err {:?}", slot.index(), e.stage());
                    self.registry.mark_invalid(slot);
                }
            }
        }
        self.phase = Phase::Idle;
        true
    }

    fn present_slots(&self) -> impl Iterator<Item = SlotId> {
        let present = self.registry.presence();
        SlotId::all().filter(move |slot| present & slot.mask() != 0)
    }
}

pub(crate) fn micros(duration: Duration) -> u32 {
    u32::try_from(duration.as_micros()).unwrap_or(u32::MAX)
}
