//! Sensor wiring.
//!
//! HC-SR04 style modules expose separate trigger and echo lines ([`TwoPin`]).
//! SRF05 style modules (and HC-SR04s with the lines tied together) can be
//! driven from a single GPIO that is flipped between output and input around
//! every trigger pulse ([`OnePin`]).
//!
//! [`Direction`] lives in this crate, so a HAL's pin type can't implement it
//! directly. Wrap the pin in a local newtype that switches the mode and
//! forwards the digital traits:
//!
//! ```ignore
//! use bitbang_sonar::{Direction, OnePin};
//! use embedded_hal::digital::v2::{InputPin, OutputPin};
//!
//! struct SonarLine(hal::gpio::Flex<'static>);
//!
//! impl Direction for SonarLine {
//!     type Error = core::convert::Infallible;
//!
//!     fn set_as_output(&mut self) -> Result<(), Self::Error> {
//!         self.0.set_as_output();
//!         Ok(())
//!     }
//!
//!     fn set_as_input(&mut self) -> Result<(), Self::Error> {
//!         self.0.set_as_input();
//!         Ok(())
//!     }
//! }
//!
//! impl OutputPin for SonarLine {
//!     type Error = core::convert::Infallible;
//!
//!     fn set_low(&mut self) -> Result<(), Self::Error> {
//!         self.0.set_low();
//!         Ok(())
//!     }
//!
//!     fn set_high(&mut self) -> Result<(), Self::Error> {
//!         self.0.set_high();
//!         Ok(())
//!     }
//! }
//!
//! impl InputPin for SonarLine {
//!     type Error = core::convert::Infallible;
//!
//!     fn is_high(&self) -> Result<bool, Self::Error> {
//!         Ok(self.0.is_high())
//!     }
//!
//!     fn is_low(&self) -> Result<bool, Self::Error> {
//!         Ok(self.0.is_low())
//!     }
//! }
//!
//! let pins = OnePin::new(SonarLine(flex));
//! ```

use embedded_hal::digital::v2::{InputPin, OutputPin};

/// Runtime direction switching for a GPIO shared between trigger and echo.
pub trait Direction {
    /// Error type
    type Error;

    /// Reconfigure the pin as a push-pull output.
    fn set_as_output(&mut self) -> Result<(), Self::Error>;

    /// Reconfigure the pin as a floating input.
    fn set_as_input(&mut self) -> Result<(), Self::Error>;
}

/// Line-level access the ranging protocol needs.
pub trait SonarPins {
    /// Error type
    type Error;

    /// One-time setup performed when the sensor is attached.
    fn attach(&mut self) -> Result<(), Self::Error>;

    /// Take control of the trigger line before a pulse.
    fn claim_trigger(&mut self) -> Result<(), Self::Error>;

    /// Drive the trigger line.
    fn set_trigger(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Hand the line back to the sensor after a pulse.
    fn release_trigger(&mut self) -> Result<(), Self::Error>;

    /// `true` while the echo line is asserted.
    fn echo_is_high(&mut self) -> Result<bool, Self::Error>;
}

/// Separate trigger output and echo input.
pub struct TwoPin<Trig, Echo> {
    trigger: Trig,
    echo: Echo,
}

impl<Trig, Echo, E> TwoPin<Trig, Echo>
where
    Trig: OutputPin<Error = E>,
    Echo: InputPin<Error = E>,
{
    /// Create instance
    pub fn new(trigger: Trig, echo: Echo) -> Self {
        TwoPin { trigger, echo }
    }

    /// Give the pins back.
    pub fn destroy(self) -> (Trig, Echo) {
        (self.trigger, self.echo)
    }
}

impl<Trig, Echo, E> SonarPins for TwoPin<Trig, Echo>
where
    Trig: OutputPin<Error = E>,
    Echo: InputPin<Error = E>,
{
    type Error = E;

    fn attach(&mut self) -> Result<(), E> {
        self.trigger.set_low()
    }

    #[inline]
    fn claim_trigger(&mut self) -> Result<(), E> {
        Ok(())
    }

    #[inline]
    fn set_trigger(&mut self, high: bool) -> Result<(), E> {
        if high {
            self.trigger.set_high()
        } else {
            self.trigger.set_low()
        }
    }

    #[inline]
    fn release_trigger(&mut self) -> Result<(), E> {
        Ok(())
    }

    #[inline]
    fn echo_is_high(&mut self) -> Result<bool, E> {
        self.echo.is_high()
    }
}

/// Trigger and echo sharing one GPIO.
pub struct OnePin<P> {
    pin: P,
}

impl<P, E> OnePin<P>
where
    P: OutputPin<Error = E> + InputPin<Error = E> + Direction<Error = E>,
{
    /// Create instance
    pub fn new(pin: P) -> Self {
        OnePin { pin }
    }

    /// Give the pin back.
    pub fn destroy(self) -> P {
        self.pin
    }
}

impl<P, E> SonarPins for OnePin<P>
where
    P: OutputPin<Error = E> + InputPin<Error = E> + Direction<Error = E>,
{
    type Error = E;

    // Direction is only touched around each trigger pulse.
    fn attach(&mut self) -> Result<(), E> {
        Ok(())
    }

    #[inline]
    fn claim_trigger(&mut self) -> Result<(), E> {
        self.pin.set_as_output()
    }

    #[inline]
    fn set_trigger(&mut self, high: bool) -> Result<(), E> {
        if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }

    #[inline]
    fn release_trigger(&mut self) -> Result<(), E> {
        self.pin.set_as_input()
    }

    #[inline]
    fn echo_is_high(&mut self) -> Result<bool, E> {
        self.pin.is_high()
    }
}
