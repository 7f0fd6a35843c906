use arch::reg::Reg;
use indexmap::IndexMap;
use mipsemu::{config::DumpConfig, Machine};

use super::Hook;

/// Prints registers and memory words after configured source lines, or after
/// every cycle with `all`.
#[derive(Debug)]
pub struct Dump {
    all: bool,
    list: IndexMap<usize, DumpConfig>,
}

impl Dump {
    pub fn new(list: IndexMap<usize, DumpConfig>, all: bool) -> Self {
        Self { all, list }
    }
}

impl Hook for Dump {
    fn init(&mut self, _machine: &Machine) {
        if self.all {
            println!(" * Dump all");
        }
        if !self.list.is_empty() {
            println!(" * Dump[{}]", self.list.len());
        }
    }

    fn exec(&mut self, _time: u64, machine: &Machine) {
        let Some(line) = machine.current_line() else {
            return;
        };
        if let Some(cfg) = self.list.get(&line) {
            print_reg(machine);
            print_selected(machine, &cfg.registers);
            print_words(machine, &cfg.words);
        } else if self.all {
            print_reg(machine);
        }
    }
}

pub fn print_reg(machine: &Machine) {
    let regs = machine.registers();
    let row = |cols: [Reg; 4]| {
        let cells: Vec<String> = cols
            .iter()
            .map(|reg| format!("{:>4}: {:08X}", reg.to_string(), regs.get(*reg)))
            .collect();
        println!(" | {} |", cells.join(" | "));
    };
    println!(" +----------------+----------------+----------------+----------------+");
    println!(
        " |   pc: {:08X} |   hi: {:08X} |   lo: {:08X} |                |",
        regs.pc, regs.hi, regs.lo
    );
    row([Reg::V0, Reg::A0, Reg::T0, Reg::S0]);
    row([Reg::V1, Reg::A1, Reg::T1, Reg::S1]);
    row([Reg::At, Reg::A2, Reg::T2, Reg::S2]);
    row([Reg::Sp, Reg::A3, Reg::T3, Reg::S3]);
    row([Reg::Ra, Reg::Fp, Reg::T4, Reg::S4]);
    println!(" +----------------+----------------+----------------+----------------+");
}

fn print_selected(machine: &Machine, regs: &[Reg]) {
    for reg in regs {
        println!(
            " | {:>4} {:>5} : {:08X}",
            reg.asm(),
            reg.to_string(),
            machine.registers().get(*reg)
        );
    }
}

fn print_words(machine: &Machine, addrs: &[u32]) {
    for addr in addrs {
        match machine.memory().peek(*addr) {
            Some(word) => println!(" | {:08X} : {:08X}", addr, word),
            None => println!(" | {:08X} : --------", addr),
        }
    }
    if !addrs.is_empty() {
        println!(" +--------------------------------------------------------------------+");
    }
}
