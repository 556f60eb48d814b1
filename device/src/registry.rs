//! Per-slot state of the sensor bank.
//!
//! The scheduler writes it, the application reads snapshots of it. Both go
//! through a blocking mutex so the registry can be shared between tasks.

use core::cell::Cell;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::domain::reading::RawReading;
use crate::domain::temperature::{Celsius, Temperature};
use crate::drivers::sensors::tcn75a::{SlotId, SLOTS};

/// State of one slot. `raw` and `valid` mean nothing unless `present`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotState {
    pub present: bool,
    pub raw: RawReading,
    pub valid: bool,
}

impl SlotState {
    const EMPTY: SlotState = SlotState {
        present: false,
        raw: RawReading(0),
        valid: false,
    };
}

#[derive(Copy, Clone)]
struct Bank {
    slots: [SlotState; SLOTS],
}

impl Bank {
    const EMPTY: Bank = Bank {
        slots: [SlotState::EMPTY; SLOTS],
    };

    fn presence(&self) -> u8 {
        SlotId::all()
            .filter(|slot| self.slots[slot.index()].present)
            .fold(0, |mask, slot| mask | slot.mask())
    }
}

pub struct Registry<M: RawMutex> {
    bank: Mutex<M, Cell<Bank>>,
}

impl<M: RawMutex> Registry<M> {
    pub const fn new() -> Self {
        Self {
            bank: Mutex::new(Cell::new(Bank::EMPTY)),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut Bank) -> R) -> R {
        self.bank.lock(|cell| {
            let mut bank = cell.get();
            let result = f(&mut bank);
            cell.set(bank);
            result
        })
    }

    fn get(&self) -> Bank {
        self.bank.lock(|cell| cell.get())
    }

    /// Record the outcome of presence detection. Clears every reading.
    pub fn set_presence(&self, mask: u8) {
        self.update(|bank| {
            for slot in SlotId::all() {
                bank.slots[slot.index()] = SlotState {
                    present: mask & slot.mask() != 0,
                    ..SlotState::EMPTY
                };
            }
        })
    }

    pub fn presence(&self) -> u8 {
        self.get().presence()
    }

    pub fn is_present(&self, slot: SlotId) -> bool {
        self.slot(slot).present
    }

    pub fn slot(&self, slot: SlotId) -> SlotState {
        self.get().slots[slot.index()]
    }

    /// Overwrite the reading of `slot`, clearing any invalid marker.
    pub fn store(&self, slot: SlotId, raw: RawReading) {
        self.update(|bank| {
            let state = &mut bank.slots[slot.index()];
            state.raw = raw;
            state.valid = true;
        })
    }

    /// Flag the reading of `slot` as invalid, keeping the previous value underneath.
    pub fn mark_invalid(&self, slot: SlotId) {
        self.update(|bank| {
            let state = &mut bank.slots[slot.index()];
            state.raw = state.raw.mark_invalid();
            state.valid = false;
        })
    }

    /// Snapshot of the presence mask and every raw reading.
    pub fn readings(&self) -> Readings {
        let bank = self.get();
        Readings {
            present: bank.presence(),
            raw: bank.slots.map(|state| state.raw.value()),
        }
    }
}

impl<M: RawMutex> Default for Registry<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the registry handed to the application.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Readings {
    pub present: u8,
    pub raw: [u16; SLOTS],
}

impl Readings {
    pub fn is_present(&self, slot: SlotId) -> bool {
        self.present & slot.mask() != 0
    }

    pub fn raw(&self, slot: SlotId) -> RawReading {
        RawReading(self.raw[slot.index()])
    }

    /// Raw readings of the present slots.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, RawReading)> + '_ {
        SlotId::all()
            .filter(|slot| self.is_present(*slot))
            .map(|slot| (slot, self.raw(slot)))
    }

    /// Decoded temperatures of the present slots, skipping readings marked invalid.
    pub fn temperatures(&self) -> impl Iterator<Item = (SlotId, Temperature<Celsius>)> + '_ {
        self.iter()
            .filter(|(_, raw)| !raw.is_marked_invalid())
            .map(|(slot, raw)| (slot, raw.temperature()))
    }
}
