use std::io::Write;

use mipsemu::Machine;

use super::Hook;

/// Echoes program output as syscalls produce it.
#[derive(Default)]
pub struct Console {
    printed: usize,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Hook for Console {
    fn init(&mut self, _machine: &Machine) {
        self.printed = 0;
        println!(" * Console");
    }

    fn exec(&mut self, _time: u64, machine: &Machine) {
        let output = machine.output();
        if output.len() > self.printed {
            print!("{}", &output[self.printed..]);
            let _ = std::io::stdout().flush();
            self.printed = output.len();
        }
    }
}
