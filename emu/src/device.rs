//! Memory-mapped I/O devices.

use crate::memory::{Fault, Segments};

/// A device answering loads and stores at the addresses it maps.
///
/// Accesses get the data and stack segments so a device can move data in
/// memory. `update` runs once after every executed instruction and must not
/// block.
pub trait Device {
    fn maps(&self, addr: u32) -> bool;
    fn read(&mut self, addr: u32, mem: &mut Segments) -> Result<u32, Fault>;
    fn write(&mut self, addr: u32, value: u32, mem: &mut Segments) -> Result<(), Fault>;
    fn update(&mut self) {}
    fn reset(&mut self) {}
}

/// Down counter. Stores set it, loads read it, and every cycle moves it one
/// step toward zero.
#[derive(Debug, Clone)]
pub struct Counter {
    addr: u32,
    counter: u32,
}

impl Counter {
    pub fn new(addr: u32) -> Self {
        Self { addr, counter: 0 }
    }
}

impl Device for Counter {
    fn maps(&self, addr: u32) -> bool {
        addr == self.addr
    }

    fn read(&mut self, _addr: u32, _mem: &mut Segments) -> Result<u32, Fault> {
        Ok(self.counter)
    }

    fn write(&mut self, _addr: u32, value: u32, _mem: &mut Segments) -> Result<(), Fault> {
        self.counter = value;
        Ok(())
    }

    fn update(&mut self) {
        self.counter = self.counter.saturating_sub(1);
    }

    fn reset(&mut self) {
        self.counter = 0;
    }
}
