use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;

use super::{micros, Poller};
use crate::traits::i2c::Bus;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PollerCommand {
    /// Re-arm the cycle timer. The next cycle starts immediately.
    Start,
    /// Disarm the cycle timer. A conversion in flight is still read back.
    Stop,
}

/// Handle used by other tasks to arm and disarm a running [`run`] loop.
pub struct PollerControl<M: RawMutex> {
    signal: Signal<M, PollerCommand>,
}

impl<M: RawMutex> PollerControl<M> {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    pub fn start(&self) {
        self.signal.signal(PollerCommand::Start);
    }

    pub fn stop(&self) {
        self.signal.signal(PollerCommand::Stop);
    }

    async fn next(&self) -> PollerCommand {
        self.signal.wait().await
    }
}

impl<M: RawMutex> Default for PollerControl<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll the bank forever, one cycle per period.
///
/// Expects [`Poller::initialize_bank`] and the first cycle
/// ([`Poller::start`]) to have run, so it begins by idling for the rest of
/// the period. The conversion wait is a plain delay and cannot be
/// interrupted: a stop received while converting takes effect after the
/// read-back.
pub async fn run<M, C, B, D>(
    poller: &mut Poller<'_, M>,
    bus: &mut B,
    delay: &mut D,
    control: &PollerControl<C>,
) -> !
where
    M: RawMutex,
    C: RawMutex,
    B: Bus,
    D: DelayNs,
{
    let latency = poller.config().latency();
    let idle = micros(poller.config().period() - latency);
    let latency = micros(latency);

    loop {
        match select(delay.delay_us(idle), control.next()).await {
            Either::First(()) => {}
            Either::Second(PollerCommand::Start) => {}
            Either::Second(PollerCommand::Stop) => {
                info!("poller disarmed");
                while control.next().await == PollerCommand::Stop {}
                info!("poller armed");
            }
        }

        poller.trigger(bus);
        delay.delay_us(latency).await;
        poller.read_back(bus);
    }
}
