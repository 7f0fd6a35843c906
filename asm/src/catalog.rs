//! Instruction catalog: expands each mnemonic, pseudo-instructions included,
//! into canonical instructions.
//!
//! Overloads are tried register first, then 16-bit immediate, then 32-bit
//! immediate or label. Immediates that do not fit a single instruction are
//! staged through `$at`, which pseudo-instructions clobber freely.

use arch::{
    error::Error,
    inst::{Arg, Inst},
    line::Line,
    op::Op,
    operand,
    reg::Reg,
};

const AT: Reg = Reg::At;
const ZERO: Reg = Reg::Zero;

macro_rules! inst {
    ($op:ident $(, $arg:expr)*) => {
        Inst::new(Op::$op, vec![$(Arg::from($arg)),*])
    };
}

/// Expand one source line.
pub fn expand(line: &Line) -> Result<Vec<Inst>, Error> {
    let a = Args(&line.args);
    let expanded = match line.mnemonic.as_str() {
        "add" => arith(&a, Op::Add, Some(Op::Addi)),
        "addu" => arith(&a, Op::Addu, Some(Op::Addiu)),
        "addi" => imm_only(&a, Op::Addi, a.imm16(2)),
        "addiu" => imm_only(&a, Op::Addiu, a.imm16(2)),
        "sub" => sub(&a, Op::Sub, Op::Addi),
        "subu" => sub(&a, Op::Subu, Op::Addiu),
        "mult" | "multu" => two_regs(&a, Op::Mult),
        "mul" => mul_div(&a, Op::Mult, Op::Mflo),
        "div" | "divu" if a.len() == 2 => two_regs(&a, Op::Div),
        "div" | "divu" => mul_div(&a, Op::Div, Op::Mflo),
        "rem" | "mod" => mul_div(&a, Op::Div, Op::Mfhi),
        "mfhi" => one_reg(&a, Op::Mfhi),
        "mflo" => one_reg(&a, Op::Mflo),
        "lui" => lui(&a),
        "and" => logic(&a, Op::And, Op::Andi),
        "or" => logic(&a, Op::Or, Op::Ori),
        "xor" => logic(&a, Op::Xor, Op::Xori),
        "andi" => imm_only(&a, Op::Andi, a.imm16u(2)),
        "ori" => imm_only(&a, Op::Ori, a.imm16u(2)),
        "xori" => imm_only(&a, Op::Xori, a.imm16u(2)),
        "nor" => nor(&a),
        "slt" => arith(&a, Op::Slt, Some(Op::Slti)),
        "slti" => imm_only(&a, Op::Slti, a.imm16(2)),
        "sll" => shift(&a, Op::Sll, Op::Sllv),
        "srl" => shift(&a, Op::Srl, Op::Srlv),
        "sllv" => arith(&a, Op::Sllv, None),
        "srlv" => arith(&a, Op::Srlv, None),
        "abs" => abs(&a),
        "move" => move_(&a),
        "clear" => clear(&a),
        "not" => not(&a),
        "li" => li(&a),
        "la" => la(&a),
        "lw" => memory(&a, Op::Lw),
        "lh" => memory(&a, Op::Lh),
        "lhu" => memory(&a, Op::Lhu),
        "lb" => memory(&a, Op::Lb),
        "lbu" => memory(&a, Op::Lbu),
        "sw" => memory(&a, Op::Sw),
        "sh" => memory(&a, Op::Sh),
        "sb" => memory(&a, Op::Sb),
        "jr" => one_reg(&a, Op::Jr),
        "j" => jump(&a, Op::J),
        "jal" => jump(&a, Op::Jal),
        "beq" => branch(&a, Op::Beq),
        "bne" => branch(&a, Op::Bne),
        "bgt" => compare(&a, Cmp::Gt),
        "blt" => compare(&a, Cmp::Lt),
        "bge" => compare(&a, Cmp::Ge),
        "ble" => compare(&a, Cmp::Le),
        "bgtz" => compare_zero(&a, Cmp::Gt),
        "bltz" => compare_zero(&a, Cmp::Lt),
        "bgez" => compare_zero(&a, Cmp::Ge),
        "blez" => compare_zero(&a, Cmp::Le),
        "syscall" => a.arity(0).map(|_| vec![inst!(Syscall)]),
        _ => {
            return Err(Error::InvalidInstruction(
                line.mnemonic.clone(),
                line.line,
            ))
        }
    };

    let insts = expanded.ok_or_else(|| Error::InvalidOperands(line.text.clone(), line.line))?;
    if insts.iter().any(|inst| inst.destination() == Some(ZERO)) {
        return Err(Error::WriteToZero(line.text.clone(), line.line));
    }
    Ok(insts)
}

// ----------------------------------------------------------------------------
// Operands

struct Args<'a>(&'a [String]);

impl Args<'_> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn arity(&self, n: usize) -> Option<()> {
        (self.0.len() == n).then_some(())
    }

    fn reg(&self, idx: usize) -> Option<Reg> {
        operand::reg(self.0.get(idx)?)
    }

    fn imm16(&self, idx: usize) -> Option<i32> {
        operand::imm16(self.0.get(idx)?)
    }

    fn imm16u(&self, idx: usize) -> Option<i32> {
        operand::imm16u(self.0.get(idx)?)
    }

    fn imm26(&self, idx: usize) -> Option<i32> {
        operand::imm26(self.0.get(idx)?)
    }

    fn imm32(&self, idx: usize) -> Option<u32> {
        operand::imm32(self.0.get(idx)?)
    }

    fn label(&self, idx: usize) -> Option<Arg> {
        operand::label(self.0.get(idx)?).map(|l| Arg::Label(l.to_string()))
    }

    fn int(&self, idx: usize) -> Option<i64> {
        operand::parse_int(self.0.get(idx)?)
    }
}

/// `lui reg, hi` ; `ori reg, reg, lo`
fn load(reg: Reg, value: u32) -> Vec<Inst> {
    vec![
        inst!(Lui, reg, operand::hi16(value)),
        inst!(Ori, reg, reg, operand::lo16(value)),
    ]
}

/// Address of a label into `reg`; split into halves during resolution.
fn load_label(reg: Reg, label: Arg) -> Vec<Inst> {
    vec![inst!(Lui, reg, label.clone()), inst!(Ori, reg, reg, label)]
}

fn with(mut insts: Vec<Inst>, rest: impl IntoIterator<Item = Inst>) -> Vec<Inst> {
    insts.extend(rest);
    insts
}

// ----------------------------------------------------------------------------
// Arithmetic and logic

/// `op d, s, t`, `opi d, s, imm16`, or `imm32` staged through `$at`.
fn arith(a: &Args, op: Op, opi: Option<Op>) -> Option<Vec<Inst>> {
    a.arity(3)?;
    let (d, s) = (a.reg(0)?, a.reg(1)?);
    if let Some(t) = a.reg(2) {
        return Some(vec![Inst::new(op, vec![d.into(), s.into(), t.into()])]);
    }
    let opi = opi?;
    if let Some(imm) = a.imm16(2) {
        return Some(vec![Inst::new(opi, vec![d.into(), s.into(), imm.into()])]);
    }
    let imm = a.imm32(2)?;
    Some(with(
        load(AT, imm),
        [Inst::new(op, vec![d.into(), s.into(), AT.into()])],
    ))
}

fn imm_only(a: &Args, op: Op, imm: Option<i32>) -> Option<Vec<Inst>> {
    a.arity(3)?;
    let (d, s, imm) = (a.reg(0)?, a.reg(1)?, imm?);
    Some(vec![Inst::new(op, vec![d.into(), s.into(), imm.into()])])
}

fn sub(a: &Args, op: Op, opi: Op) -> Option<Vec<Inst>> {
    a.arity(3)?;
    let (d, s) = (a.reg(0)?, a.reg(1)?);
    if let Some(t) = a.reg(2) {
        return Some(vec![Inst::new(op, vec![d.into(), s.into(), t.into()])]);
    }
    if let Some(neg) = a.imm16(2).map(|imm| -imm).filter(|n| operand::in_signed_range(*n as i64, 16)) {
        return Some(vec![Inst::new(opi, vec![d.into(), s.into(), neg.into()])]);
    }
    let imm = a.imm32(2)?;
    Some(with(
        load(AT, imm),
        [Inst::new(op, vec![d.into(), s.into(), AT.into()])],
    ))
}

fn one_reg(a: &Args, op: Op) -> Option<Vec<Inst>> {
    a.arity(1)?;
    Some(vec![Inst::new(op, vec![a.reg(0)?.into()])])
}

fn two_regs(a: &Args, op: Op) -> Option<Vec<Inst>> {
    a.arity(2)?;
    Some(vec![Inst::new(op, vec![a.reg(0)?.into(), a.reg(1)?.into()])])
}

/// Three-operand `mul`/`div`/`rem`: the HI/LO op followed by a move.
fn mul_div(a: &Args, op: Op, take: Op) -> Option<Vec<Inst>> {
    a.arity(3)?;
    let (d, s) = (a.reg(0)?, a.reg(1)?);
    let tail = |t: Reg| {
        [
            Inst::new(op, vec![s.into(), t.into()]),
            Inst::new(take, vec![d.into()]),
        ]
    };
    if let Some(t) = a.reg(2) {
        return Some(tail(t).to_vec());
    }
    if let Some(imm) = a.imm16(2) {
        return Some(with(vec![inst!(Addi, AT, ZERO, imm)], tail(AT)));
    }
    let imm = a.imm32(2)?;
    Some(with(load(AT, imm), tail(AT)))
}

fn lui(a: &Args) -> Option<Vec<Inst>> {
    a.arity(2)?;
    Some(vec![inst!(Lui, a.reg(0)?, a.imm16u(1)?)])
}

/// Bitwise ops take their immediate zero-extended.
fn logic(a: &Args, op: Op, opi: Op) -> Option<Vec<Inst>> {
    a.arity(3)?;
    let (d, s) = (a.reg(0)?, a.reg(1)?);
    if let Some(t) = a.reg(2) {
        return Some(vec![Inst::new(op, vec![d.into(), s.into(), t.into()])]);
    }
    if let Some(imm) = a.imm16u(2) {
        return Some(vec![Inst::new(opi, vec![d.into(), s.into(), imm.into()])]);
    }
    let imm = a.imm32(2)?;
    Some(with(
        load(AT, imm),
        [Inst::new(op, vec![d.into(), s.into(), AT.into()])],
    ))
}

fn nor(a: &Args) -> Option<Vec<Inst>> {
    a.arity(3)?;
    let (d, s) = (a.reg(0)?, a.reg(1)?);
    if let Some(t) = a.reg(2) {
        return Some(vec![inst!(Nor, d, s, t)]);
    }
    let staged = match a.imm16u(2) {
        Some(imm) => vec![inst!(Ori, AT, ZERO, imm)],
        None => load(AT, a.imm32(2)?),
    };
    Some(with(staged, [inst!(Nor, d, s, AT)]))
}

fn shift(a: &Args, op: Op, opv: Op) -> Option<Vec<Inst>> {
    a.arity(3)?;
    let (d, s) = (a.reg(0)?, a.reg(1)?);
    if let Some(t) = a.reg(2) {
        return Some(vec![Inst::new(opv, vec![d.into(), s.into(), t.into()])]);
    }
    let amount = a.imm16(2)?;
    Some(vec![Inst::new(op, vec![d.into(), s.into(), amount.into()])])
}

// ----------------------------------------------------------------------------
// Moves

/// Negate when negative; the branch skips exactly the one `sub` after it.
fn abs(a: &Args) -> Option<Vec<Inst>> {
    a.arity(2)?;
    let (d, s) = (a.reg(0)?, a.reg(1)?);
    Some(vec![
        inst!(Slt, AT, s, ZERO),
        inst!(Add, d, s, ZERO),
        inst!(Beq, AT, ZERO, 1_i32),
        inst!(Sub, d, ZERO, d),
    ])
}

fn move_(a: &Args) -> Option<Vec<Inst>> {
    a.arity(2)?;
    Some(vec![inst!(Add, a.reg(0)?, a.reg(1)?, ZERO)])
}

fn clear(a: &Args) -> Option<Vec<Inst>> {
    a.arity(1)?;
    Some(vec![inst!(Add, a.reg(0)?, ZERO, ZERO)])
}

fn not(a: &Args) -> Option<Vec<Inst>> {
    a.arity(2)?;
    Some(vec![inst!(Nor, a.reg(0)?, a.reg(1)?, ZERO)])
}

fn li(a: &Args) -> Option<Vec<Inst>> {
    a.arity(2)?;
    let d = a.reg(0)?;
    match a.int(1)? {
        n @ 0..=0xFFFF => Some(vec![inst!(Ori, d, ZERO, n as i32)]),
        _ => Some(load(d, a.imm32(1)?)),
    }
}

fn la(a: &Args) -> Option<Vec<Inst>> {
    a.arity(2)?;
    let d = a.reg(0)?;
    match a.label(1) {
        Some(label) => Some(load_label(d, label)),
        None => Some(load(d, a.imm32(1)?)),
    }
}

// ----------------------------------------------------------------------------
// Memory

/// `op rt, offset, base`. A 16-bit offset from a base other than `$zero` is
/// used directly. Every other address, including a bare or `$zero`-based
/// immediate, is staged through `$at` with `lui`/`ori`, then the base is added
/// unless it is `$zero`.
fn memory(a: &Args, op: Op) -> Option<Vec<Inst>> {
    let rt = a.reg(0)?;
    let base = match a.len() {
        2 => ZERO,
        3 => a.reg(2)?,
        _ => return None,
    };
    let access = Inst::new(op, vec![rt.into(), Arg::Imm(0), AT.into()]);

    if base != ZERO {
        if let Some(offset) = a.imm16(1) {
            return Some(vec![Inst::new(op, vec![rt.into(), offset.into(), base.into()])]);
        }
    }
    let staged = match a.label(1) {
        Some(label) => load_label(AT, label),
        None => load(AT, a.imm32(1)?),
    };
    if base == ZERO {
        Some(with(staged, [access]))
    } else {
        Some(with(staged, [inst!(Add, AT, AT, base), access]))
    }
}

// ----------------------------------------------------------------------------
// Control

fn jump(a: &Args, op: Op) -> Option<Vec<Inst>> {
    a.arity(1)?;
    let target = match a.imm26(0) {
        Some(imm) => Arg::Imm(imm),
        None => a.label(0)?,
    };
    Some(vec![Inst::new(op, vec![target])])
}

/// `beq/bne r, (t | imm16), (offset | label)`
fn branch(a: &Args, op: Op) -> Option<Vec<Inst>> {
    a.arity(3)?;
    let r = a.reg(0)?;
    let target = match a.imm16(2) {
        Some(offset) => Arg::Imm(offset),
        None => a.label(2)?,
    };
    if let Some(t) = a.reg(1) {
        return Some(vec![Inst::new(op, vec![r.into(), t.into(), target])]);
    }
    let imm = a.imm16(1)?;
    Some(vec![
        inst!(Addi, AT, ZERO, imm),
        Inst::new(op, vec![r.into(), AT.into(), target]),
    ])
}

#[derive(Debug, Clone, Copy)]
enum Cmp {
    Gt,
    Lt,
    Ge,
    Le,
}

/// `bgt/blt/bge/ble r, (t | imm16), label` through `slt`/`slti` into `$at`.
fn compare(a: &Args, cmp: Cmp) -> Option<Vec<Inst>> {
    a.arity(3)?;
    let r = a.reg(0)?;
    let label = a.label(2)?;

    let (set, taken) = if let Some(t) = a.reg(1) {
        match cmp {
            Cmp::Gt => (inst!(Slt, AT, t, r), Op::Bne),
            Cmp::Lt => (inst!(Slt, AT, r, t), Op::Bne),
            Cmp::Ge => (inst!(Slt, AT, r, t), Op::Beq),
            Cmp::Le => (inst!(Slt, AT, t, r), Op::Beq),
        }
    } else {
        let imm = a.imm16(1)?;
        // r > imm  <=>  !(r < imm + 1)
        let inclusive = |imm: i32| {
            let imm = imm + 1;
            operand::in_signed_range(imm as i64, 16).then_some(imm)
        };
        match cmp {
            Cmp::Gt => (inst!(Slti, AT, r, inclusive(imm)?), Op::Beq),
            Cmp::Lt => (inst!(Slti, AT, r, imm), Op::Bne),
            Cmp::Ge => (inst!(Slti, AT, r, imm), Op::Beq),
            Cmp::Le => (inst!(Slti, AT, r, inclusive(imm)?), Op::Bne),
        }
    };
    Some(vec![set, Inst::new(taken, vec![AT.into(), ZERO.into(), label])])
}

/// `bgtz/bltz/bgez/blez r, label`
fn compare_zero(a: &Args, cmp: Cmp) -> Option<Vec<Inst>> {
    a.arity(2)?;
    let r = a.reg(0)?;
    let label = a.label(1)?;
    let (set, taken) = match cmp {
        Cmp::Gt => (inst!(Slt, AT, ZERO, r), Op::Bne),
        Cmp::Lt => (inst!(Slt, AT, r, ZERO), Op::Bne),
        Cmp::Ge => (inst!(Slt, AT, r, ZERO), Op::Beq),
        Cmp::Le => (inst!(Slt, AT, ZERO, r), Op::Beq),
    };
    Some(vec![set, Inst::new(taken, vec![AT.into(), ZERO.into(), label])])
}
