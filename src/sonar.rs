/*!
  # Blocking ultrasonic ranging over bit-banged GPIO

  This implementation consumes the following hardware resources:
  - A free-running microsecond counter ([`Clock`])
  - A blocking delay provider
  - One or two GPIO pins wired to the sensor ([`SonarPins`])

  Every operation busy-polls the echo line on the calling thread. Each wait is
  bounded by its own deadline, so a disconnected sensor costs at most
  [`MAX_SENSOR_DELAY_US`] plus the trigger pulse, and an echo that outlasts the
  configured range is cut short at [`Sonar::max_echo_time_us`].

  ## Hardware requirements

  1. Trigger pin as push-pull output, echo pin as input (5V sensors need a
     level shifter or divider on echo).
  2. A clock ticking once per microsecond.

  ## Blue Pill example

  ```ignore
    use stm32f1xx_hal as hal;
    use hal::{prelude::*, stm32};
    use bitbang_sonar::{Sonar, TwoPin, DEFAULT_MAX_DISTANCE_CM};

    // ...

    let trig = gpioa.pa1.into_push_pull_output(&mut gpioa.crl);
    let echo = gpioa.pa2.into_floating_input(&mut gpioa.crl);
    let micros = || timer.micros();

    let mut sonar = Sonar::attach(TwoPin::new(trig, echo), micros, delay, DEFAULT_MAX_DISTANCE_CM).unwrap();
    match sonar.median_distance(5) {
        Ok(cm) => { /* ... */ }
        Err(bitbang_sonar::Error::NoEcho) => { /* nothing in range */ }
        Err(_) => { /* GPIO fault */ }
    }
  ```
*/

use core::convert::TryFrom;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use log::{debug, trace};

use crate::clock::{Clock, Deadline};
use crate::median::Descending;
use crate::pins::SonarPins;

/// Echo microseconds per centimeter of distance, there and back.
pub const US_ROUNDTRIP_CM: u32 = 57;
/// Echo microseconds per inch of distance, there and back.
pub const US_ROUNDTRIP_IN: u32 = 146;
/// Largest range a channel can be configured for.
pub const MAX_SENSOR_DISTANCE: u16 = 500;
/// Range used when the caller has no better idea.
pub const DEFAULT_MAX_DISTANCE_CM: u16 = 200;
/// How long the sensor gets to raise echo after a trigger pulse.
pub const MAX_SENSOR_DELAY_US: u32 = 5800;
/// Measurement overhead subtracted from every echo time.
pub const PING_OVERHEAD_US: u32 = 5;
/// Per-sample budget when taking a median, in milliseconds.
pub const PING_MEDIAN_DELAY_MS: u16 = 29;
/// Sample count used by callers without a preference.
pub const DEFAULT_ITERATIONS: u8 = 5;
/// Upper bound on samples in one median.
pub const MAX_MEDIAN_ITERATIONS: u8 = 32;

const TRIGGER_SETTLE_US: u16 = 4;
const TRIGGER_PULSE_US: u16 = 10;

/// Ranging error
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// GPIO error
    Bus(E),
    /// Sensor never answered, or answered beyond the configured range
    NoEcho,
}

/// Convert an echo time to centimeters.
#[inline]
pub fn us_to_cm(us: u32) -> u32 {
    us / US_ROUNDTRIP_CM
}

/// Convert an echo time to inches.
#[inline]
pub fn us_to_in(us: u32) -> u32 {
    us / US_ROUNDTRIP_IN
}

/// Echo time of a target `cm` away plus half a centimeter of slack.
#[inline]
fn max_echo_time_us(cm: u16) -> u32 {
    u32::from(cm) * US_ROUNDTRIP_CM + US_ROUNDTRIP_CM / 2
}

/// One ultrasonic sensor.
pub struct Sonar<PINS, CLK, DELAY> {
    pins: PINS,
    clock: CLK,
    delay: DELAY,
    max_distance_cm: u16,
    max_echo_time_us: u32,
}

impl<PINS, CLK, DELAY, E> Sonar<PINS, CLK, DELAY>
where
    PINS: SonarPins<Error = E>,
    CLK: Clock,
    DELAY: DelayUs<u16> + DelayMs<u16>,
{
    /// Bind the sensor and set its range.
    ///
    /// `max_distance_cm` is clamped to `1..=MAX_SENSOR_DISTANCE`.
    pub fn attach(
        mut pins: PINS,
        clock: CLK,
        delay: DELAY,
        max_distance_cm: u16,
    ) -> Result<Self, Error<E>> {
        pins.attach().map_err(Error::Bus)?;

        let mut sonar = Sonar {
            pins,
            clock,
            delay,
            max_distance_cm: 0,
            max_echo_time_us: 0,
        };
        sonar.set_max_distance(max_distance_cm);
        Ok(sonar)
    }

    /// Give the resources back.
    pub fn release(self) -> (PINS, CLK, DELAY) {
        (self.pins, self.clock, self.delay)
    }

    /// Change the range; the echo timeout follows.
    pub fn set_max_distance(&mut self, max_distance_cm: u16) {
        let cm = max_distance_cm.max(1).min(MAX_SENSOR_DISTANCE);
        self.max_distance_cm = cm;
        self.max_echo_time_us = max_echo_time_us(cm);
        trace!(
            "sonar range {} cm, echo timeout {} us",
            cm,
            self.max_echo_time_us
        );
    }

    /// Configured range in centimeters.
    pub fn max_distance_cm(&self) -> u16 {
        self.max_distance_cm
    }

    /// Longest echo accepted before a ping reports [`Error::NoEcho`].
    pub fn max_echo_time_us(&self) -> u32 {
        self.max_echo_time_us
    }

    /// Fire one ping and return the echo time in microseconds.
    pub fn ping(&mut self) -> Result<u32, Error<E>> {
        let deadline = self.trigger()?;

        while self.pins.echo_is_high().map_err(Error::Bus)? {
            if deadline.reached(self.clock.now_us()) {
                debug!("echo out of range");
                return Err(Error::NoEcho);
            }
        }

        let elapsed = deadline.elapsed(self.clock.now_us());
        Ok(elapsed.saturating_sub(PING_OVERHEAD_US))
    }

    /// Distance to the target in centimeters.
    pub fn distance(&mut self) -> Result<u32, Error<E>> {
        self.ping().map(us_to_cm)
    }

    /// Distance to the target in inches.
    pub fn distance_in(&mut self) -> Result<u32, Error<E>> {
        self.ping().map(us_to_in)
    }

    /// Median distance in centimeters over `iterations` pings.
    pub fn median_distance(&mut self, iterations: u8) -> Result<u32, Error<E>> {
        self.ping_median(iterations).map(us_to_cm)
    }

    /// Median distance in inches over `iterations` pings.
    pub fn median_distance_in(&mut self, iterations: u8) -> Result<u32, Error<E>> {
        self.ping_median(iterations).map(us_to_in)
    }

    /// Median echo time in microseconds over `iterations` pings.
    ///
    /// Out of range pings are dropped from the sample but still take their
    /// share of the pacing delay, so the whole call lasts about
    /// `iterations * PING_MEDIAN_DELAY_MS` whatever the sensor sees. With an
    /// even number of accepted samples the lower middle one is returned.
    /// Returns [`Error::NoEcho`] when no ping came back.
    pub fn ping_median(&mut self, iterations: u8) -> Result<u32, Error<E>> {
        let mut iterations = iterations.max(1).min(MAX_MEDIAN_ITERATIONS);
        let mut samples = Descending::<{ MAX_MEDIAN_ITERATIONS as usize }>::new();
        let mut taken = 0u8;

        while taken < iterations {
            let last = match self.ping() {
                Ok(us) => {
                    samples.insert(us);
                    taken += 1;
                    us
                }
                Err(Error::NoEcho) => {
                    iterations -= 1;
                    self.max_echo_time_us
                }
                Err(e) => return Err(e),
            };

            if taken < iterations {
                let last_ms = u16::try_from(last >> 10).unwrap_or(u16::MAX);
                let pause = PING_MEDIAN_DELAY_MS.saturating_sub(last_ms);
                self.delay.delay_ms(pause);
            }
        }

        let median = samples.median().ok_or(Error::NoEcho)?;
        debug!("median {} us of {} samples", median, samples.len());
        Ok(median)
    }

    /// Pulse the trigger and wait for the echo to rise.
    ///
    /// On success the returned deadline starts at the rising edge and spans
    /// the echo timeout.
    fn trigger(&mut self) -> Result<Deadline, Error<E>> {
        self.pins.claim_trigger().map_err(Error::Bus)?;
        self.pins.set_trigger(false).map_err(Error::Bus)?;
        self.delay.delay_us(TRIGGER_SETTLE_US);
        self.pins.set_trigger(true).map_err(Error::Bus)?;
        self.delay.delay_us(TRIGGER_PULSE_US);
        self.pins.set_trigger(false).map_err(Error::Bus)?;
        self.pins.release_trigger().map_err(Error::Bus)?;
        trace!("trigger sent");

        let startup = Deadline::new(self.clock.now_us(), MAX_SENSOR_DELAY_US);

        // previous echo still draining
        while self.pins.echo_is_high().map_err(Error::Bus)? {
            if startup.reached(self.clock.now_us()) {
                break;
            }
        }

        while !self.pins.echo_is_high().map_err(Error::Bus)? {
            if startup.reached(self.clock.now_us()) {
                debug!("echo never started");
                return Err(Error::NoEcho);
            }
        }

        Ok(Deadline::new(self.clock.now_us(), self.max_echo_time_us))
    }
}
