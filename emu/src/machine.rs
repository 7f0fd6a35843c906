//! The virtual machine: reset, fetch/execute cycle, run control.

use std::{collections::BTreeSet, sync::Arc};

use arch::{error::Error, image::Program, reg::Reg};
use log::{debug, trace, warn};

use crate::{
    config::Config,
    device::Device,
    exec::{self, Flow},
    memory::Memory,
    state::{Registers, Snapshot},
};

pub struct Machine {
    program: Arc<Program>,
    main: u32,
    cycle_limit: u64,
    regs: Registers,
    memory: Memory,
    cycles: u64,
    has_exited: bool,
    error: Option<Error>,
    output: String,
    breakpoints: BTreeSet<usize>,
    paused_at: Option<usize>,
    /// Address of the last executed instruction.
    current: Option<u32>,
}

impl Machine {
    pub fn new(program: Arc<Program>) -> Result<Self, Error> {
        Self::with_config(program, &Config::default())
    }

    /// Machine with the cycle limit, breakpoints and devices of `config`.
    ///
    /// The segment layout always comes from the program, since its addresses
    /// were assigned against it. `config.layout` only matters when assembling;
    /// a different one here is logged and ignored.
    pub fn with_config(program: Arc<Program>, config: &Config) -> Result<Self, Error> {
        let main = program.main().ok_or(Error::MissingMain)?;
        if config.layout != program.layout {
            warn!("config layout ignored, the program was assembled with {:?}", program.layout);
        }
        let mut memory = Memory::new(program.layout);
        for device in &config.devices {
            memory.attach(device.build());
        }
        let mut machine = Self {
            program,
            main,
            cycle_limit: config.cycle_limit,
            regs: Registers::default(),
            memory,
            cycles: 0,
            has_exited: false,
            error: None,
            output: String::new(),
            breakpoints: config.breakpoints.iter().copied().collect(),
            paused_at: None,
            current: None,
        };
        machine.reset();
        Ok(machine)
    }

    pub fn attach(&mut self, device: Box<dyn Device>) {
        self.memory.attach(device);
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn reset(&mut self) -> Snapshot {
        let layout = self.program.layout;
        self.regs = Registers::default();
        self.regs.pc = self.main;
        self.regs.set(Reg::Ra, layout.sentinel());
        self.regs.set(Reg::Sp, layout.stack_max);
        self.memory.reset(self.program.data.materialize());
        self.cycles = 0;
        self.has_exited = false;
        self.error = None;
        self.output.clear();
        self.paused_at = None;
        self.current = None;
        debug!("reset, pc {:#010x}", self.main);
        self.state()
    }

    /// One fetch/execute step. Faults halt the machine and are kept as its
    /// error.
    pub fn run_cycle(&mut self) {
        if self.has_exited {
            return;
        }
        if let Err(err) = self.step() {
            debug!("halted after {} cycles: {}", self.cycles, err);
            self.error = Some(err);
            self.has_exited = true;
        }
    }

    fn step(&mut self) -> Result<(), Error> {
        let pc = self.regs.pc;
        if pc == self.program.layout.sentinel() || pc == self.program.end {
            debug!("exited after {} cycles", self.cycles);
            self.has_exited = true;
            return Ok(());
        }
        if self.cycles >= self.cycle_limit {
            return Err(Error::MaxCyclesExceeded);
        }
        let (slot, line) = self
            .program
            .fetch(pc)
            .ok_or(Error::NoInstructionAtAddress(pc))?;
        trace!("[{:>6}] {:#010x} {}", self.cycles, pc, slot.inst);

        self.current = Some(pc);
        let flow = exec::execute(
            &slot.inst,
            pc,
            &mut self.regs,
            &mut self.memory,
            &mut self.output,
        )
        .map_err(|fault| fault.at(&line.text, line.line))?;

        self.cycles += 1;
        match flow {
            Flow::Next => self.regs.pc = pc.wrapping_add(4),
            Flow::Jump(target) => self.regs.pc = target,
            Flow::Exit => {
                debug!("exit syscall after {} cycles", self.cycles);
                self.regs.pc = pc.wrapping_add(4);
                self.has_exited = true;
            }
        }
        self.memory.update();
        Ok(())
    }

    /// Run up to `count` cycles, stopping early on halt or breakpoint.
    pub fn run_n(&mut self, count: u64) -> Snapshot {
        self.run(Some(count))
    }

    /// Run until halted or a breakpoint is reached.
    pub fn run_to_end(&mut self) -> Snapshot {
        self.run(None)
    }

    fn run(&mut self, count: Option<u64>) -> Snapshot {
        self.paused_at = None;
        let mut done = 0;
        while !self.has_exited && count.map_or(true, |count| done < count) {
            // The first cycle may sit on a breakpoint; that is how a paused run resumes.
            if done > 0 {
                if let Some(line) = self.breakpoint() {
                    debug!("paused at line {line}");
                    self.paused_at = Some(line);
                    break;
                }
            }
            self.run_cycle();
            done += 1;
        }
        self.state()
    }

    /// Breakpoint line the next cycle would start, if any.
    pub fn breakpoint(&self) -> Option<usize> {
        let (slot, line) = self.program.fetch(self.regs.pc)?;
        (slot.index == 0 && self.breakpoints.contains(&line.line)).then_some(line.line)
    }

    pub fn add_breakpoint(&mut self, line: usize) {
        self.breakpoints.insert(line);
    }

    pub fn remove_breakpoint(&mut self, line: usize) -> bool {
        self.breakpoints.remove(&line)
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// Line the last run stopped at because of a breakpoint.
    pub fn paused_at(&self) -> Option<usize> {
        self.paused_at
    }

    /// Source line of the last executed instruction.
    pub fn current_line(&self) -> Option<usize> {
        let (_, line) = self.program.fetch(self.current?)?;
        Some(line.line)
    }

    pub fn has_exited(&self) -> bool {
        self.has_exited
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn state(&self) -> Snapshot {
        Snapshot {
            registers: self.regs.to_map(),
            cycles: self.cycles,
            has_exited: self.has_exited,
            error: self.error.as_ref().map(Error::info),
            output: self.output.clone(),
            breakpoints: self.breakpoints.iter().copied().collect(),
        }
    }
}
