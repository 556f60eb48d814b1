use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Instant;

use super::Poller;
use crate::traits::i2c::Bus;

/// Deadline bookkeeping for hosts that drive the poller from timer callbacks.
///
/// Two handles are kept: a repeating one that starts a cycle every period
/// and a one-shot one that fires the read-back once the conversion latency
/// has passed. After every [`Schedule::poll`] the host arms its timer for
/// the returned instant and calls `poll` again when it fires.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    next_cycle: Option<Instant>,
    read_back_at: Option<Instant>,
}

impl Schedule {
    pub const fn new() -> Self {
        Self {
            next_cycle: None,
            read_back_at: None,
        }
    }

    /// Arm the repeating handle; the first cycle starts at `first`.
    pub fn arm(&mut self, first: Instant) {
        self.next_cycle = Some(first);
    }

    /// Disarm the repeating handle. A read-back already scheduled still fires.
    pub fn disarm(&mut self) {
        self.next_cycle = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_cycle.is_some()
    }

    pub fn next_cycle(&self) -> Option<Instant> {
        self.next_cycle
    }

    pub fn pending_read_back(&self) -> Option<Instant> {
        self.read_back_at
    }

    /// Earliest instant at which [`Self::poll`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.next_cycle, self.read_back_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run whatever is due at `now` and return the next deadline.
    ///
    /// A due read-back runs before a due cycle start. A cycle never starts
    /// while a read-back is still pending.
    pub fn poll<M: RawMutex, B: Bus>(
        &mut self,
        now: Instant,
        poller: &mut Poller<'_, M>,
        bus: &mut B,
    ) -> Option<Instant> {
        if let Some(at) = self.read_back_at {
            if now >= at {
                self.read_back_at = None;
                poller.read_back(bus);
            }
        }

        if let Some(at) = self.next_cycle {
            if now >= at {
                let period = poller.config().period();
                if self.read_back_at.is_none() {
                    poller.trigger(bus);
                    self.read_back_at = Some(now + poller.config().latency());
                }
                let mut next = at + period;
                if next <= now {
                    next = now + period;
                }
                self.next_cycle = Some(next);
            }
        }

        self.next_deadline()
    }
}
