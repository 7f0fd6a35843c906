use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Kind of a canonical operand slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Reg,
    Imm,
}

/// Canonical opcodes executed by the machine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, EnumIter, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Op {
    Add,
    Addu,
    Addi,
    Addiu,
    Sub,
    Subu,
    Mult,
    Div,
    Mfhi,
    Mflo,
    Lui,
    And,
    Andi,
    Or,
    Ori,
    Xor,
    Xori,
    Nor,
    Slt,
    Slti,
    Sll,
    Srl,
    Sllv,
    Srlv,
    Jr,
    J,
    Jal,
    Beq,
    Bne,
    Lw,
    Lh,
    Lhu,
    Lb,
    Lbu,
    Sw,
    Sh,
    Sb,
    Syscall,
}

impl Op {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().parse::<Self>() {
            Ok(op) => Ok(op),
            Err(_) => Err(format!("Unknown opcode: {s}")),
        }
    }

    /// Operand slots, in order.
    pub fn shape(self) -> &'static [Kind] {
        use Kind::*;
        match self {
            Op::Add | Op::Addu | Op::Sub | Op::Subu => &[Reg, Reg, Reg],
            Op::And | Op::Or | Op::Xor | Op::Nor | Op::Slt => &[Reg, Reg, Reg],
            Op::Sllv | Op::Srlv => &[Reg, Reg, Reg],
            Op::Addi | Op::Addiu | Op::Andi | Op::Ori | Op::Xori | Op::Slti => &[Reg, Reg, Imm],
            Op::Sll | Op::Srl => &[Reg, Reg, Imm],
            Op::Mult | Op::Div => &[Reg, Reg],
            Op::Mfhi | Op::Mflo | Op::Jr => &[Reg],
            Op::Lui => &[Reg, Imm],
            Op::J | Op::Jal => &[Imm],
            Op::Beq | Op::Bne => &[Reg, Reg, Imm],
            Op::Lw | Op::Lh | Op::Lhu | Op::Lb | Op::Lbu => &[Reg, Imm, Reg],
            Op::Sw | Op::Sh | Op::Sb => &[Reg, Imm, Reg],
            Op::Syscall => &[],
        }
    }

    /// Whether the first operand is a destination register.
    pub fn writes(self) -> bool {
        !matches!(
            self,
            Op::Mult
                | Op::Div
                | Op::Jr
                | Op::J
                | Op::Jal
                | Op::Beq
                | Op::Bne
                | Op::Sw
                | Op::Sh
                | Op::Sb
                | Op::Syscall
        )
    }

    /// Access width in bytes for loads and stores.
    pub fn width(self) -> Option<u32> {
        match self {
            Op::Lw | Op::Sw => Some(4),
            Op::Lh | Op::Lhu | Op::Sh => Some(2),
            Op::Lb | Op::Lbu | Op::Sb => Some(1),
            _ => None,
        }
    }

    pub fn is_load(self) -> bool {
        matches!(self, Op::Lw | Op::Lh | Op::Lhu | Op::Lb | Op::Lbu)
    }

    pub fn is_store(self) -> bool {
        matches!(self, Op::Sw | Op::Sh | Op::Sb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn parse() {
        assert_eq!(Op::parse("addiu"), Ok(Op::Addiu));
        assert_eq!(Op::parse("SYSCALL"), Ok(Op::Syscall));
        assert!(Op::parse("nop").is_err());
    }

    #[test]
    fn display_round_trips() {
        for op in Op::iter() {
            assert_eq!(Op::parse(&op.to_string()), Ok(op));
        }
    }

    #[test]
    fn memory_ops_have_width() {
        for op in Op::iter() {
            assert_eq!(op.width().is_some(), op.is_load() || op.is_store(), "{op}");
        }
    }

    #[test]
    fn stores_do_not_write() {
        assert!(Op::Lw.writes());
        assert!(Op::Mflo.writes());
        assert!(!Op::Sw.writes());
        assert!(!Op::Mult.writes());
        assert!(!Op::Beq.writes());
    }
}
