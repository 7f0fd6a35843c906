use arch::reg::Reg;
use log::trace;

use crate::{
    exec::Flow,
    memory::{Fault, Memory},
    state::Registers,
};

/// Longest string `print_string` will scan for its terminator.
const MAX_STRING: u32 = 1000;

pub const PRINT_INT: u32 = 1;
pub const PRINT_STRING: u32 = 4;
pub const EXIT: u32 = 10;
pub const PRINT_CHAR: u32 = 11;

/// Service the call selected by `$v0`. Unknown codes do nothing.
pub fn dispatch(regs: &Registers, memory: &mut Memory, output: &mut String) -> Result<Flow, Fault> {
    let code = regs.get(Reg::V0);
    let arg = regs.get(Reg::A0);
    trace!("syscall {code} ({arg:#x})");
    match code {
        PRINT_INT => output.push_str(&(arg as i32).to_string()),
        PRINT_STRING => {
            for offset in 0..MAX_STRING {
                let byte = memory.read(arg.wrapping_add(offset), 1)? as u8;
                if byte == 0 {
                    break;
                }
                output.push(byte as char);
            }
        }
        PRINT_CHAR => output.push(arg as u8 as char),
        EXIT => return Ok(Flow::Exit),
        _ => {}
    }
    Ok(Flow::Next)
}
