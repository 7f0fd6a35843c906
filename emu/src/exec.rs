//! Opcode handlers.

use arch::{inst::Inst, op::Op, reg::Reg};

use crate::{
    memory::{Fault, Memory},
    state::Registers,
    syscall,
};

/// Where control goes after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Next,
    Jump(u32),
    Exit,
}

fn sext16(imm: i32) -> u32 {
    imm as i16 as i32 as u32
}

fn zext16(imm: i32) -> u32 {
    imm as u32 & 0xFFFF
}

/// Execute `inst` fetched from `pc`.
pub fn execute(
    inst: &Inst,
    pc: u32,
    regs: &mut Registers,
    memory: &mut Memory,
    output: &mut String,
) -> Result<Flow, Fault> {
    if !inst.is_well_formed() {
        return Err(Fault::Malformed);
    }
    let reg = |idx: usize| inst.reg(idx).ok_or(Fault::Malformed);
    let imm = |idx: usize| inst.imm(idx).ok_or(Fault::Malformed);

    match inst.op {
        // d, s, t
        Op::Add | Op::Addu | Op::Sub | Op::Subu | Op::And | Op::Or | Op::Xor | Op::Nor
        | Op::Slt | Op::Sllv | Op::Srlv => {
            let (d, s, t) = (reg(0)?, reg(1)?, reg(2)?);
            let (a, b) = (regs.get(s), regs.get(t));
            let value = match inst.op {
                Op::Add | Op::Addu => a.wrapping_add(b),
                Op::Sub | Op::Subu => a.wrapping_sub(b),
                Op::And => a & b,
                Op::Or => a | b,
                Op::Xor => a ^ b,
                Op::Nor => !(a | b),
                Op::Slt => ((a as i32) < (b as i32)) as u32,
                Op::Sllv => a.wrapping_shl(b),
                _ => a.wrapping_shr(b),
            };
            regs.set(d, value);
        }

        // d, s, imm
        Op::Addi | Op::Addiu | Op::Andi | Op::Ori | Op::Xori | Op::Slti | Op::Sll | Op::Srl => {
            let (d, s, imm) = (reg(0)?, reg(1)?, imm(2)?);
            let a = regs.get(s);
            let value = match inst.op {
                Op::Addi | Op::Addiu => a.wrapping_add(sext16(imm)),
                Op::Andi => a & zext16(imm),
                Op::Ori => a | zext16(imm),
                Op::Xori => a ^ zext16(imm),
                Op::Slti => ((a as i32) < sext16(imm) as i32) as u32,
                Op::Sll => a.wrapping_shl(imm as u32),
                _ => a.wrapping_shr(imm as u32),
            };
            regs.set(d, value);
        }

        Op::Lui => regs.set(reg(0)?, zext16(imm(1)?) << 16),

        // HI is not computed for products
        Op::Mult => {
            let (a, b) = (regs.get(reg(0)?) as i32, regs.get(reg(1)?) as i32);
            regs.lo = a.wrapping_mul(b) as u32;
            regs.hi = 0;
        }
        Op::Div => {
            let (a, b) = (regs.get(reg(0)?) as i32, regs.get(reg(1)?) as i32);
            if b == 0 {
                return Err(Fault::DivideByZero);
            }
            regs.lo = a.wrapping_div(b) as u32;
            regs.hi = a.wrapping_rem(b) as u32;
        }
        Op::Mfhi => regs.set(reg(0)?, regs.hi),
        Op::Mflo => regs.set(reg(0)?, regs.lo),

        Op::Jr => return Ok(Flow::Jump(regs.get(reg(0)?))),
        Op::J | Op::Jal => {
            if inst.op == Op::Jal {
                regs.set(Reg::Ra, pc.wrapping_add(4));
            }
            let target = (pc & 0xF000_0000) | ((imm(0)? as u32) << 2);
            return Ok(Flow::Jump(target));
        }
        Op::Beq | Op::Bne => {
            let (a, b) = (regs.get(reg(0)?), regs.get(reg(1)?));
            if (a == b) == (inst.op == Op::Beq) {
                let offset = sext16(imm(2)?).wrapping_shl(2);
                return Ok(Flow::Jump(pc.wrapping_add(4).wrapping_add(offset)));
            }
        }

        Op::Lw | Op::Lh | Op::Lhu | Op::Lb | Op::Lbu | Op::Sw | Op::Sh | Op::Sb => {
            let width = inst.op.width().ok_or(Fault::Malformed)?;
            let (rt, offset, base) = (reg(0)?, imm(1)?, reg(2)?);
            let addr = regs.get(base).wrapping_add(sext16(offset));
            if inst.op.is_store() {
                memory.write(addr, width, regs.get(rt))?;
            } else {
                let raw = memory.read(addr, width)?;
                let value = match inst.op {
                    Op::Lh => raw as u16 as i16 as i32 as u32,
                    Op::Lhu => raw as u16 as u32,
                    Op::Lb => raw as u8 as i8 as i32 as u32,
                    Op::Lbu => raw as u8 as u32,
                    _ => raw,
                };
                regs.set(rt, value);
            }
        }

        Op::Syscall => return syscall::dispatch(regs, memory, output),
    }
    Ok(Flow::Next)
}
