//! Pure data types shared by the driver, the registry and the presentation layer.

pub mod reading;
pub mod temperature;

pub use reading::{decode, RawReading, INVALID_READING};
pub use temperature::{Celsius, Fahrenheit, Temperature, TemperatureScale};
