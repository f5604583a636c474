//! Drives HC-SR04/SRF05 style ultrasonic rangers by [bit banging] a trigger
//! and echo line through [`embedded-hal`] traits.
//!
//! [bit banging]: https://en.wikipedia.org/wiki/Bit_banging
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
//!
//! ## Usage
//!
//! See the [`sonar`] module documentation.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod clock;
mod median;
pub mod pins;
pub mod sonar;

pub use crate::clock::Clock;
pub use crate::pins::{Direction, OnePin, SonarPins, TwoPin};
pub use crate::sonar::{
    us_to_cm, us_to_in, Error, Sonar, DEFAULT_ITERATIONS, DEFAULT_MAX_DISTANCE_CM,
    MAX_MEDIAN_ITERATIONS, MAX_SENSOR_DELAY_US, MAX_SENSOR_DISTANCE, PING_MEDIAN_DELAY_MS,
    PING_OVERHEAD_US, US_ROUNDTRIP_CM, US_ROUNDTRIP_IN,
};
