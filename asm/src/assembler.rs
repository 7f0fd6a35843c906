//! Two-pass text segment assembly: expansion, addresses, labels, resolution.

use std::collections::BTreeMap;

use arch::{
    error::Error,
    image::{Labels, Slot},
    inst::{Arg, Inst},
    layout::Layout,
    line::Line,
    op::Op,
    operand,
};
use log::{debug, trace};

use crate::catalog;

/// Assembled text segment.
#[derive(Debug, Clone)]
pub struct Text {
    pub lines: Vec<Line>,
    pub slots: BTreeMap<u32, Slot>,
    pub labels: Labels,
    pub end: u32,
}

/// A source line with its expansion and base address.
struct Unit {
    line: Line,
    insts: Vec<Inst>,
    base: u32,
}

pub fn assemble(lines: Vec<Line>, data_labels: &Labels, layout: &Layout) -> Result<Text, Error> {
    // Expand and assign addresses
    let mut units = Vec::with_capacity(lines.len());
    let mut addr = layout.text_base as u64;
    for line in lines {
        let insts = catalog::expand(&line)?;
        let base = addr;
        addr += 4 * insts.len() as u64;
        if addr > layout.text_max as u64 {
            return Err(Error::SegmentSizeExceeded("text".to_string(), line.line));
        }
        units.push(Unit {
            line,
            insts,
            base: base as u32,
        });
    }
    let end = addr as u32;

    // Collect labels
    let mut labels = Labels::new();
    for unit in &units {
        if let Some(label) = &unit.line.label {
            if labels.contains_key(label) {
                return Err(Error::DuplicateLabel(label.clone(), unit.line.line));
            }
            labels.insert(label.clone(), unit.base);
        }
    }
    if !labels.contains_key("main") {
        return Err(Error::MissingMain);
    }

    // Resolve label operands
    for unit in &mut units {
        for (idx, inst) in unit.insts.iter_mut().enumerate() {
            let addr = unit.base + 4 * idx as u32;
            resolve(inst, addr, data_labels, &labels, &unit.line)?;
        }
    }

    // Flatten
    let mut slots = BTreeMap::new();
    let mut lines = Vec::with_capacity(units.len());
    for (source, unit) in units.into_iter().enumerate() {
        for (index, inst) in unit.insts.into_iter().enumerate() {
            let addr = unit.base + 4 * index as u32;
            trace!("{addr:#010x}: {inst}");
            slots.insert(
                addr,
                Slot {
                    inst,
                    source,
                    index,
                },
            );
        }
        lines.push(unit.line);
    }
    debug!(
        "text segment: {} instructions, {} labels, end {:#010x}",
        slots.len(),
        labels.len(),
        end
    );

    Ok(Text {
        lines,
        slots,
        labels,
        end,
    })
}

/// Replace a label operand with its value for this kind of instruction.
fn resolve(
    inst: &mut Inst,
    addr: u32,
    data_labels: &Labels,
    text_labels: &Labels,
    line: &Line,
) -> Result<(), Error> {
    let Some((idx, label)) = inst.label() else {
        return Ok(());
    };
    let not_found = || Error::LabelNotFound(label.to_string(), line.line);

    let value = match (inst.op, idx) {
        (Op::Lui, 1) => operand::hi16(*data_labels.get(label).ok_or_else(not_found)?),
        (Op::Ori, 2) => operand::lo16(*data_labels.get(label).ok_or_else(not_found)?),
        (Op::J | Op::Jal, 0) => {
            let target = *text_labels.get(label).ok_or_else(not_found)?;
            ((target & 0x0FFF_FFFC) >> 2) as i32
        }
        (Op::Beq | Op::Bne, 2) => {
            let target = *text_labels.get(label).ok_or_else(not_found)?;
            let offset = (target as i64 - addr as i64 - 4).div_euclid(4);
            if !operand::in_signed_range(offset, 16) {
                return Err(Error::InvalidOperands(line.text.clone(), line.line));
            }
            offset as i32
        }
        _ => return Err(not_found()),
    };
    inst.args[idx] = Arg::Imm(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::preprocess;

    fn text(src: &str) -> Result<Text, Error> {
        let src = preprocess(src)?;
        let mut data = Labels::new();
        data.insert("dlabel".to_string(), 0x1000_0004);
        assemble(src.text, &data, &Layout::default())
    }

    fn listing(src: &str) -> Vec<(u32, String)> {
        text(src)
            .unwrap()
            .slots
            .iter()
            .map(|(addr, slot)| (*addr, slot.inst.to_string()))
            .collect()
    }

    #[test]
    fn addresses_follow_expansion() {
        let text = text(".text\nmain: li $8 0x12345678\nnext: jr $31").unwrap();
        assert_eq!(text.labels["main"], 0x0040_0000);
        assert_eq!(text.labels["next"], 0x0040_0008);
        assert_eq!(text.end, 0x0040_000C);
        assert_eq!(text.slots[&0x0040_0004].index, 1);
        assert_eq!(text.slots[&0x0040_0008].source, 1);
    }

    #[test]
    fn data_labels_split_into_halves() {
        assert_eq!(
            listing(".text\nmain: la $3 dlabel"),
            vec![
                (0x0040_0000, "lui $3, 4096".to_string()),
                (0x0040_0004, "ori $3, $3, 4".to_string()),
            ]
        );
    }

    #[test]
    fn jumps_use_word_address() {
        let out = listing(".text\nmain: j main");
        assert_eq!(out[0].1, format!("j {}", 0x0040_0000 >> 2));
    }

    #[test]
    fn branch_offsets() {
        // beq sits at the second slot of its line
        let out = listing(".text\nmain: beq $2 5 skip\nli $3 1\nskip: jr $31");
        assert_eq!(out[1], (0x0040_0004, "beq $2, $1, 1".to_string()));

        let out = listing(".text\nmain: bne $2 $3 main");
        assert_eq!(out[0].1, "bne $2, $3, -1");
    }

    macro_rules! error_case {
        ($($name:ident: $src:expr => $code:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(text($src).unwrap_err().code(), $code);
                }
            )*
        }
    }

    error_case! {
        unknown_text_label: ".text\nmain: j nolabel" => 8,
        text_label_in_la: ".text\nmain: la $8 main" => 8,
        duplicate_text_label: ".text\nmain: j main\nmain: add $t0, $t1, $t2" => 9,
        invalid_instruction: ".text\nmain:\nnop $ra $t0 5" => 10,
        invalid_operands: ".text\nmain:\nj $ra" => 11,
        missing_main: ".text\njr $ra" => 12,
        write_to_zero: ".text\nmain: add $zero, $t0, 55" => 16,
    }

    #[test]
    fn text_segment_bound() {
        let layout = Layout {
            text_max: 0x0040_0008,
            ..Layout::default()
        };
        let src = preprocess(".text\nmain: li $8 1\nli $9 0x12345678").unwrap();
        let err = assemble(src.text, &Labels::new(), &layout).unwrap_err();
        assert_eq!(err, Error::SegmentSizeExceeded("text".into(), 3));
    }
}
