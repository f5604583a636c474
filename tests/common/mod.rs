//! Simulated sensor bench: one shared microsecond timeline, a sensor that
//! answers trigger pulses from a script, and recording pins and delays.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use bitbang_sonar::{Clock, Direction};
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::digital::v2::{InputPin, OutputPin};

/// Microseconds between the trigger falling edge and the echo rising.
pub const ECHO_LATENCY_US: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Trigger(bool),
    Output,
    Input,
}

struct State {
    now: u32,
    script: VecDeque<Option<u32>>,
    // (rising edge, width)
    pulse: Option<(u32, u32)>,
    // echo left over from an earlier cycle, survives new triggers
    lingering: Option<(u32, u32)>,
    latency: u32,
    trigger_high: bool,
    output: bool,
    events: Vec<Event>,
    ms_delays: Vec<u16>,
    wrote_while_input: bool,
    echo_fault: bool,
}

impl State {
    fn echo_level(&self) -> bool {
        let high = |pulse: Option<(u32, u32)>| match pulse {
            Some((rise, width)) => self.now.wrapping_sub(rise) < width,
            None => false,
        };
        high(self.pulse) || high(self.lingering)
    }

    fn drive(&mut self, high: bool) {
        if !self.output {
            self.wrote_while_input = true;
        }
        self.events.push(Event::Trigger(high));
        if self.trigger_high && !high {
            self.pulse = self
                .script
                .pop_front()
                .flatten()
                .map(|width| (self.now.wrapping_add(self.latency), width));
        }
        self.trigger_high = high;
    }
}

#[derive(Clone)]
pub struct Bench(Rc<RefCell<State>>);

impl Bench {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(now: u32) -> Self {
        Bench(Rc::new(RefCell::new(State {
            now,
            script: VecDeque::new(),
            pulse: None,
            lingering: None,
            latency: ECHO_LATENCY_US,
            trigger_high: false,
            output: true,
            events: Vec::new(),
            ms_delays: Vec::new(),
            wrote_while_input: false,
            echo_fault: false,
        })))
    }

    /// Queue echo widths for upcoming pings; `None` means the sensor stays
    /// silent.
    pub fn script(&self, widths: &[Option<u32>]) {
        self.0.borrow_mut().script.extend(widths.iter().copied());
    }

    /// Hold the echo line high for `width` µs from now, whatever the
    /// trigger does.
    pub fn hold_echo(&self, width: u32) {
        let mut state = self.0.borrow_mut();
        let now = state.now;
        state.lingering = Some((now, width));
    }

    /// Delay between a trigger falling edge and the echo rising.
    pub fn set_latency(&self, us: u32) {
        self.0.borrow_mut().latency = us;
    }

    pub fn now(&self) -> u32 {
        self.0.borrow().now
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.0.borrow_mut().events.clear();
    }

    pub fn ms_delays(&self) -> Vec<u16> {
        self.0.borrow().ms_delays.clone()
    }

    pub fn wrote_while_input(&self) -> bool {
        self.0.borrow().wrote_while_input
    }

    pub fn fail_echo(&self) {
        self.0.borrow_mut().echo_fault = true;
    }

    pub fn trigger(&self) -> Trigger {
        Trigger(self.clone())
    }

    pub fn echo(&self) -> Echo {
        Echo(self.clone())
    }

    pub fn shared(&self) -> Shared {
        self.0.borrow_mut().output = false;
        Shared(self.clone())
    }

    pub fn clock(&self) -> Micros {
        Micros(self.clone())
    }

    pub fn delay(&self) -> Delay {
        Delay(self.clone())
    }
}

pub struct Trigger(Bench);

impl OutputPin for Trigger {
    type Error = BenchError;

    fn set_low(&mut self) -> Result<(), BenchError> {
        (self.0).0.borrow_mut().drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), BenchError> {
        (self.0).0.borrow_mut().drive(true);
        Ok(())
    }
}

pub struct Echo(Bench);

impl InputPin for Echo {
    type Error = BenchError;

    fn is_high(&self) -> Result<bool, BenchError> {
        let state = (self.0).0.borrow();
        if state.echo_fault {
            return Err(BenchError);
        }
        Ok(state.echo_level())
    }

    fn is_low(&self) -> Result<bool, BenchError> {
        self.is_high().map(|high| !high)
    }
}

/// Trigger and echo on one line.
pub struct Shared(Bench);

impl OutputPin for Shared {
    type Error = BenchError;

    fn set_low(&mut self) -> Result<(), BenchError> {
        (self.0).0.borrow_mut().drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), BenchError> {
        (self.0).0.borrow_mut().drive(true);
        Ok(())
    }
}

impl InputPin for Shared {
    type Error = BenchError;

    fn is_high(&self) -> Result<bool, BenchError> {
        let state = (self.0).0.borrow();
        Ok(!state.output && state.echo_level())
    }

    fn is_low(&self) -> Result<bool, BenchError> {
        self.is_high().map(|high| !high)
    }
}

impl Direction for Shared {
    type Error = BenchError;

    fn set_as_output(&mut self) -> Result<(), BenchError> {
        let mut state = (self.0).0.borrow_mut();
        state.output = true;
        state.events.push(Event::Output);
        Ok(())
    }

    fn set_as_input(&mut self) -> Result<(), BenchError> {
        let mut state = (self.0).0.borrow_mut();
        state.output = false;
        state.events.push(Event::Input);
        Ok(())
    }
}

/// Every read costs one microsecond.
pub struct Micros(Bench);

impl Clock for Micros {
    fn now_us(&mut self) -> u32 {
        let mut state = (self.0).0.borrow_mut();
        let now = state.now;
        state.now = now.wrapping_add(1);
        now
    }
}

pub struct Delay(Bench);

impl DelayUs<u16> for Delay {
    fn delay_us(&mut self, us: u16) {
        let mut state = (self.0).0.borrow_mut();
        state.now = state.now.wrapping_add(u32::from(us));
    }
}

impl DelayMs<u16> for Delay {
    fn delay_ms(&mut self, ms: u16) {
        let mut state = (self.0).0.borrow_mut();
        state.now = state.now.wrapping_add(u32::from(ms) * 1000);
        state.ms_delays.push(ms);
    }
}
