//! Simulated sensor bank and virtual time for tests.
//!
//! [`TestBus`] answers the bus primitives like a set of TCN75A chips would:
//! register pointer, configuration register with a self-clearing one-shot
//! bit, and an ambient temperature register that only picks up a new value
//! once a conversion has had its datasheet time to finish. Every bus start
//! is timestamped with the shared [`VirtualClock`], which [`TestDelay`]
//! advances instead of sleeping.

use core::cell::Cell;
use std::rc::Rc;
use std::vec::Vec;

use embassy_time::{Duration, Instant};

use crate::drivers::sensors::tcn75a::register::config::{Config, CONFIG};
use crate::drivers::sensors::tcn75a::register::ta::TA;
use crate::drivers::sensors::tcn75a::{SlotId, Stage, BASE_ADDR, SLOTS};
use crate::traits::i2c::Bus;

/// Monotonic clock that only moves when told to.
#[derive(Clone, Default)]
pub struct VirtualClock {
    micros: Rc<Cell<u64>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Instant {
        Instant::from_micros(self.micros.get())
    }

    pub fn advance(&self, duration: Duration) {
        self.micros.set(self.micros.get() + duration.as_micros());
    }

    /// Move to `at`; does nothing if `at` is in the past.
    pub fn advance_to(&self, at: Instant) {
        if at.as_micros() > self.micros.get() {
            self.micros.set(at.as_micros());
        }
    }
}

/// Delay that advances a [`VirtualClock`] and records what it was asked for.
///
/// The async flavour yields once to the executor so concurrent futures get
/// polled in between.
pub struct TestDelay {
    clock: VirtualClock,
    requested: Vec<Duration>,
}

impl TestDelay {
    pub fn new(clock: VirtualClock) -> Self {
        Self {
            clock,
            requested: Vec::new(),
        }
    }

    pub fn requested(&self) -> &[Duration] {
        &self.requested
    }

    fn wait(&mut self, duration: Duration) {
        self.requested.push(duration);
        self.clock.advance(duration);
    }
}

impl embedded_hal::delay::DelayNs for TestDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.wait(Duration::from_nanos(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        self.wait(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wait(Duration::from_millis(ms as u64));
    }
}

impl embedded_hal_async::delay::DelayNs for TestDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.wait(Duration::from_nanos(ns as u64));
        embassy_futures::yield_now().await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.wait(Duration::from_micros(us as u64));
        embassy_futures::yield_now().await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.wait(Duration::from_millis(ms as u64));
        embassy_futures::yield_now().await;
    }
}

/// Everything that happened on a [`TestBus`], in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusEvent {
    Init,
    Start(Instant),
    Stop,
    Write { byte: u8, ack: bool },
    Read(u8),
    Ack(bool),
}

/// One transaction as seen by the bus: who was addressed, in which direction, when.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub address: u8,
    pub read: bool,
    pub at: Instant,
}

struct TestChip {
    config: u8,
    pointer: u8,
    ta: u16,
    temperature: u16,
    converting_until: Option<Instant>,
    fault: Option<Stage>,
}

impl TestChip {
    fn new(temperature: u16) -> Self {
        Self {
            // power-up default: continuous, 9 bit
            config: 0x00,
            pointer: TA,
            ta: 0,
            temperature,
            converting_until: None,
            fault: None,
        }
    }

    fn refresh(&mut self, now: Instant) {
        let shutdown = Config::from(self.config).is_shutdown();
        match self.converting_until {
            Some(done) if now >= done => {
                self.ta = self.temperature;
                self.converting_until = None;
            }
            Some(_) => {}
            None if !shutdown => self.ta = self.temperature,
            None => {}
        }
    }

    fn write_config(&mut self, byte: u8, now: Instant) -> bool {
        let requested = Config::from(byte);
        self.config = u8::from(requested.steady());
        let one_shot = requested.is_one_shot() && requested.is_shutdown();
        if one_shot {
            self.converting_until = Some(now + requested.get_resolution().conversion_time());
        }
        one_shot
    }
}

enum State {
    Idle,
    Address,
    Write { slot: usize, written: usize },
    Read { slot: usize, index: usize },
    Ignored,
}

/// Bus stub populated with simulated TCN75A chips.
pub struct TestBus {
    clock: VirtualClock,
    chips: [Option<TestChip>; SLOTS],
    state: State,
    events: Vec<BusEvent>,
    transactions: Vec<Transaction>,
    triggers: Vec<(SlotId, Instant)>,
    samples: Vec<(SlotId, Instant)>,
}

impl TestBus {
    pub fn new(clock: VirtualClock) -> Self {
        Self {
            clock,
            chips: Default::default(),
            state: State::Idle,
            events: Vec::new(),
            transactions: Vec::new(),
            triggers: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Bus with a chip in every slot set in `mask`, all reading `temperature` after conversion.
    pub fn with_chips(clock: VirtualClock, mask: u8, temperature: u16) -> Self {
        let mut bus = Self::new(clock);
        for slot in SlotId::all().filter(|slot| mask & slot.mask() != 0) {
            bus.attach(slot, temperature);
        }
        bus
    }

    pub fn attach(&mut self, slot: SlotId, temperature: u16) {
        self.chips[slot.index()] = Some(TestChip::new(temperature));
    }

    pub fn detach(&mut self, slot: SlotId) {
        self.chips[slot.index()] = None;
    }

    /// Value the next completed conversion of `slot` produces.
    pub fn set_temperature(&mut self, slot: SlotId, temperature: u16) {
        if let Some(chip) = self.chips[slot.index()].as_mut() {
            chip.temperature = temperature;
        }
    }

    /// Make `slot` withhold its acknowledge at `stage` until [`Self::heal`].
    pub fn fail(&mut self, slot: SlotId, stage: Stage) {
        if let Some(chip) = self.chips[slot.index()].as_mut() {
            chip.fault = Some(stage);
        }
    }

    pub fn heal(&mut self, slot: SlotId) {
        if let Some(chip) = self.chips[slot.index()].as_mut() {
            chip.fault = None;
        }
    }

    /// Content of the configuration register of `slot`.
    pub fn config(&self, slot: SlotId) -> Option<u8> {
        self.chips[slot.index()].as_ref().map(|chip| chip.config)
    }

    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Number of transactions addressed to `slot`, either direction.
    pub fn transactions_to(&self, slot: SlotId) -> usize {
        let address: u8 = slot.address().into();
        self.transactions
            .iter()
            .filter(|t| t.address == address)
            .count()
    }

    /// When each one-shot conversion was started, per slot.
    pub fn triggers(&self) -> &[(SlotId, Instant)] {
        &self.triggers
    }

    /// When each temperature register read started clocking out data, per slot.
    pub fn samples(&self) -> &[(SlotId, Instant)] {
        &self.samples
    }

    pub fn starts(&self) -> usize {
        self.count(|e| matches!(e, BusEvent::Start(_)))
    }

    pub fn stops(&self) -> usize {
        self.count(|e| matches!(e, BusEvent::Stop))
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.transactions.clear();
        self.triggers.clear();
        self.samples.clear();
    }

    fn count(&self, f: impl Fn(&BusEvent) -> bool) -> usize {
        self.events.iter().filter(|e| f(e)).count()
    }

    fn address_byte(&mut self, byte: u8) -> bool {
        let address = byte >> 1;
        let read = byte & 1 != 0;
        self.transactions.push(Transaction {
            address,
            read,
            at: self.clock.now(),
        });

        if address & !0x07 != BASE_ADDR {
            self.state = State::Ignored;
            return false;
        }
        let slot = (address & 0x07) as usize;
        let refused = if read {
            Stage::ReadAddress
        } else {
            Stage::Address
        };
        match self.chips[slot].as_ref() {
            Some(chip) if chip.fault != Some(refused) => {
                self.state = if read {
                    State::Read { slot, index: 0 }
                } else {
                    State::Write { slot, written: 0 }
                };
                true
            }
            _ => {
                self.state = State::Ignored;
                false
            }
        }
    }

    fn data_byte(&mut self, slot: usize, written: usize, byte: u8) -> bool {
        let now = self.clock.now();
        let Some(chip) = self.chips[slot].as_mut() else {
            return false;
        };
        let stage = if written == 0 {
            Stage::Pointer
        } else {
            Stage::Data
        };
        if chip.fault == Some(stage) {
            self.state = State::Ignored;
            return false;
        }

        if written == 0 {
            chip.pointer = byte & 0x03;
        } else if chip.pointer == CONFIG {
            chip.refresh(now);
            if chip.write_config(byte, now) {
                if let Some(id) = SlotId::new(slot as u8) {
                    self.triggers.push((id, now));
                }
            }
        }
        self.state = State::Write {
            slot,
            written: written + 1,
        };
        true
    }

    fn register_byte(&mut self, slot: usize, index: usize) -> u8 {
        let now = self.clock.now();
        let Some(chip) = self.chips[slot].as_mut() else {
            return 0xFF;
        };
        match chip.pointer {
            TA => {
                chip.refresh(now);
                if index == 0 {
                    if let Some(id) = SlotId::new(slot as u8) {
                        self.samples.push((id, now));
                    }
                }
                let [msb, lsb] = chip.ta.to_be_bytes();
                if index % 2 == 0 {
                    msb
                } else {
                    lsb
                }
            }
            CONFIG => chip.config,
            _ => 0,
        }
    }
}

impl Bus for TestBus {
    fn init(&mut self) {
        self.events.push(BusEvent::Init);
    }

    fn start(&mut self) {
        self.events.push(BusEvent::Start(self.clock.now()));
        self.state = State::Address;
    }

    fn stop(&mut self) {
        self.events.push(BusEvent::Stop);
        self.state = State::Idle;
    }

    fn write_byte(&mut self, byte: u8) -> bool {
        let ack = match self.state {
            State::Address => self.address_byte(byte),
            State::Write { slot, written } => self.data_byte(slot, written, byte),
            _ => false,
        };
        self.events.push(BusEvent::Write { byte, ack });
        ack
    }

    fn read_byte(&mut self) -> u8 {
        let byte = match self.state {
            State::Read { slot, index } => {
                self.state = State::Read {
                    slot,
                    index: index + 1,
                };
                self.register_byte(slot, index)
            }
            _ => 0xFF,
        };
        self.events.push(BusEvent::Read(byte));
        byte
    }

    fn send_ack(&mut self, ack: bool) {
        self.events.push(BusEvent::Ack(ack));
    }
}
