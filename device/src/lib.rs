#![cfg_attr(not(feature = "std"), no_std)]
//! Polling engine for a bank of up to eight TCN75A temperature sensors sharing one I2C bus.
//!
//! Every chip is kept shut down between measurements. Once per period each
//! present chip is told to run a single conversion, the conversion time is
//! waited out and the results are read back into a [`Registry`] the
//! application can snapshot at any time.
//!
//! # Layers
//!
//! - [`traits::i2c::Bus`]: byte-level bus primitives, supplied by the board.
//! - [`drivers::sensors::tcn75a`]: register access for one chip.
//! - [`registry`]: presence mask and latest raw reading per slot.
//! - [`poller`]: presence detection and the trigger / wait / read-back cycle,
//!   driven either in-line, from host timer callbacks or as an async task.
//! - [`domain`]: decoding of raw readings into temperatures.
//!
//! # Example
//!
//! ```ignore
//! static REGISTRY: Registry<CriticalSectionRawMutex> = Registry::new();
//! static CONTROL: PollerControl<CriticalSectionRawMutex> = PollerControl::new();
//!
//! #[embassy_executor::task]
//! async fn poll(mut bus: BoardBus) {
//!     let mut poller = Poller::new(&REGISTRY, PollerConfig::default());
//!     if poller.initialize_bank(&mut bus) == 0 {
//!         return;
//!     }
//!     poller.start(&mut bus, &mut embassy_time::Delay);
//!     run(&mut poller, &mut bus, &mut embassy_time::Delay, &CONTROL).await
//! }
//!
//! for (slot, t) in REGISTRY.readings().temperatures() {
//!     info!("{}: {}", slot.index(), t);
//! }
//! ```

pub(crate) mod fmt;

pub mod traits;

pub mod domain;

pub mod drivers;

pub mod registry;

pub mod poller;

#[cfg(feature = "std")]
pub mod testutil;

pub use domain::reading::{decode, RawReading, INVALID_READING};
pub use domain::temperature::{Celsius, Fahrenheit, Temperature};
pub use drivers::sensors::tcn75a::register::config::Config;
pub use drivers::sensors::tcn75a::{Nack, SlotId, Stage, Tcn75a, SLOTS};
pub use poller::{run, Phase, Poller, PollerCommand, PollerConfig, PollerControl, Schedule};
pub use registry::{Readings, Registry};
pub use traits::i2c::{Bus, I2cAddress};
