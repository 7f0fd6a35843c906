use std::fmt;

use color_print::cformat;
use serde::{Deserialize, Serialize};

use crate::{
    op::{Kind, Op},
    reg::Reg,
};

/// One operand of a canonical instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arg {
    Reg(Reg),
    Imm(i32),
    Label(String),
}

impl From<Reg> for Arg {
    fn from(reg: Reg) -> Self {
        Arg::Reg(reg)
    }
}

impl From<i32> for Arg {
    fn from(imm: i32) -> Self {
        Arg::Imm(imm)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Reg(reg) => write!(f, "{}", reg.asm()),
            Arg::Imm(imm) => write!(f, "{imm}"),
            Arg::Label(label) => write!(f, "{label}"),
        }
    }
}

/// A primitive, directly executable instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inst {
    pub op: Op,
    pub args: Vec<Arg>,
}

impl Inst {
    pub fn new(op: Op, args: Vec<Arg>) -> Self {
        Self { op, args }
    }

    pub fn reg(&self, idx: usize) -> Option<Reg> {
        match self.args.get(idx) {
            Some(Arg::Reg(reg)) => Some(*reg),
            _ => None,
        }
    }

    pub fn imm(&self, idx: usize) -> Option<i32> {
        match self.args.get(idx) {
            Some(Arg::Imm(imm)) => Some(*imm),
            _ => None,
        }
    }

    /// First symbolic operand, with its position.
    pub fn label(&self) -> Option<(usize, &str)> {
        self.args.iter().enumerate().find_map(|(idx, arg)| match arg {
            Arg::Label(label) => Some((idx, label.as_str())),
            _ => None,
        })
    }

    /// Register written by this instruction, if any.
    pub fn destination(&self) -> Option<Reg> {
        if self.op.writes() {
            self.reg(0)
        } else {
            None
        }
    }

    /// Operands agree with the opcode's shape and no label is left unresolved.
    pub fn is_well_formed(&self) -> bool {
        let shape = self.op.shape();
        shape.len() == self.args.len()
            && shape.iter().zip(&self.args).all(|(kind, arg)| {
                matches!((kind, arg), (Kind::Reg, Arg::Reg(_)) | (Kind::Imm, Arg::Imm(_)))
            })
    }

    pub fn cformat(&self) -> String {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| match arg {
                Arg::Reg(reg) => cformat!("<green>{}</>", reg.asm()),
                Arg::Imm(imm) => cformat!("<yellow>{}</>", imm),
                Arg::Label(label) => cformat!("<magenta>{}</>", label),
            })
            .collect();
        cformat!("<red>{:<8}</>{}", self.op.to_string(), args.join(", "))
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.op.width(), self.args.as_slice()) {
            (Some(_), [rt, offset, base]) => write!(f, "{} {}, {}({})", self.op, rt, offset, base),
            (_, []) => write!(f, "{}", self.op),
            (_, args) => {
                let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
                write!(f, "{} {}", self.op, args.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_inst {
        ($($name:ident: $inst:expr => $text:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let inst = $inst;
                    assert!(inst.is_well_formed());
                    assert_eq!(inst.to_string(), $text);
                }
            )*
        }
    }

    test_inst! {
        test_add: Inst::new(Op::Add, vec![Reg::T0.into(), Reg::T1.into(), Reg::T2.into()]) => "add $8, $9, $10",
        test_addi: Inst::new(Op::Addi, vec![Reg::Sp.into(), Reg::Sp.into(), Arg::Imm(-4)]) => "addi $29, $29, -4",
        test_lui: Inst::new(Op::Lui, vec![Reg::At.into(), Arg::Imm(0x1000)]) => "lui $1, 4096",
        test_lw: Inst::new(Op::Lw, vec![Reg::Ra.into(), Arg::Imm(0), Reg::Sp.into()]) => "lw $31, 0($29)",
        test_jr: Inst::new(Op::Jr, vec![Reg::Ra.into()]) => "jr $31",
        test_syscall: Inst::new(Op::Syscall, vec![]) => "syscall",
    }

    #[test]
    fn unresolved_label_is_not_well_formed() {
        let inst = Inst::new(Op::J, vec![Arg::Label("main".into())]);
        assert_eq!(inst.label(), Some((0, "main")));
        assert!(!inst.is_well_formed());
    }

    #[test]
    fn wrong_arity_is_not_well_formed() {
        let inst = Inst::new(Op::Add, vec![Reg::T0.into(), Reg::T1.into()]);
        assert!(!inst.is_well_formed());
    }

    #[test]
    fn destination() {
        let add = Inst::new(Op::Add, vec![Reg::Zero.into(), Reg::T1.into(), Reg::T2.into()]);
        assert_eq!(add.destination(), Some(Reg::Zero));
        let sw = Inst::new(Op::Sw, vec![Reg::Zero.into(), Arg::Imm(0), Reg::Sp.into()]);
        assert_eq!(sw.destination(), None);
    }
}
