pub mod console;
pub mod dump;

use mipsemu::Machine;

/// Side effect run by the CLI around each cycle.
pub trait Hook {
    fn init(&mut self, machine: &Machine);
    fn exec(&mut self, time: u64, machine: &Machine);
}
