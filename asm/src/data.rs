//! Data segment layout from `.data` directives.

use arch::{
    error::Error,
    image::{DataEntry, DataSegment},
    layout::Layout,
    line::Line,
    operand,
};
use log::debug;

const MAX_SPACE: i64 = 1024 * 1028 * 8;
const MAX_ALIGN: i64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Word,
    Half,
    Byte,
    Ascii,
    Asciiz,
    Space,
    Align,
}

impl Directive {
    fn parse(s: &str) -> Option<Self> {
        match s.strip_prefix('.')?.to_ascii_lowercase().as_str() {
            "word" => Some(Directive::Word),
            "half" => Some(Directive::Half),
            "byte" => Some(Directive::Byte),
            "ascii" => Some(Directive::Ascii),
            "asciiz" => Some(Directive::Asciiz),
            "space" => Some(Directive::Space),
            "align" => Some(Directive::Align),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Directive::Word => "word",
            Directive::Half => "half",
            Directive::Byte => "byte",
            Directive::Ascii => "ascii",
            Directive::Asciiz => "asciiz",
            Directive::Space => "space",
            Directive::Align => "align",
        }
    }

    /// Alignment applied before the directive's bytes, also the element width
    /// of the numeric directives.
    fn alignment(self) -> u32 {
        match self {
            Directive::Word => 4,
            Directive::Half => 2,
            _ => 1,
        }
    }
}

/// `.word` operand waiting for the label table.
struct Fixup {
    entry: usize,
    offset: usize,
    label: String,
    line: usize,
}

pub fn build(lines: &[Line], layout: &Layout) -> Result<DataSegment, Error> {
    let mut segment = DataSegment::new(layout.data_base);
    let mut fixups = vec![];
    let mut addr = layout.data_base as u64;

    for line in lines {
        let directive = Directive::parse(&line.mnemonic).ok_or(Error::MissingDataType(line.line))?;
        if line.args.is_empty() {
            return Err(Error::MissingDataArguments(
                directive.name().to_string(),
                line.line,
            ));
        }
        let invalid = |arg: &str| {
            Error::InvalidDataArgument(arg.to_string(), directive.name().to_string(), line.line)
        };

        let (pad, bytes) = match directive {
            Directive::Word | Directive::Half | Directive::Byte => {
                let width = directive.alignment() as usize;
                let mut bytes = Vec::with_capacity(width * line.args.len());
                for arg in &line.args {
                    match operand::parse_int(arg) {
                        Some(n) if operand::in_bit_range(n, 8 * width as u32) => {
                            let n = operand::to_unsigned(n, 8 * width as u32) as u32;
                            bytes.extend_from_slice(&n.to_le_bytes()[..width]);
                        }
                        None if directive == Directive::Word && operand::label(arg).is_some() => {
                            fixups.push(Fixup {
                                entry: segment.entries.len(),
                                offset: bytes.len(),
                                label: arg.clone(),
                                line: line.line,
                            });
                            bytes.extend_from_slice(&[0; 4]);
                        }
                        _ => return Err(invalid(arg)),
                    }
                }
                (padding(addr, directive.alignment() as u64), bytes)
            }
            Directive::Ascii | Directive::Asciiz => {
                let mut bytes = vec![];
                for arg in &line.args {
                    bytes.extend(operand::parse_string(arg).ok_or_else(|| invalid(arg))?);
                }
                if directive == Directive::Asciiz {
                    bytes.push(0);
                }
                (0, bytes)
            }
            Directive::Space => {
                let n = single(line, 1, MAX_SPACE).map_err(invalid)?;
                (0, vec![0; n as usize])
            }
            Directive::Align => {
                let n = single(line, 1, MAX_ALIGN).map_err(invalid)?;
                (padding(addr, 1 << n), vec![])
            }
        };

        let start = addr + pad;
        if let Some(label) = &line.label {
            if segment.labels.contains_key(label) {
                return Err(Error::DuplicateLabel(label.clone(), line.line));
            }
            segment.labels.insert(label.clone(), start as u32);
        }
        addr = start + bytes.len() as u64;
        if addr > layout.data_max as u64 {
            return Err(Error::SegmentSizeExceeded("data".to_string(), line.line));
        }
        segment.entries.push(DataEntry {
            line: line.line,
            addr: start as u32,
            bytes,
        });
    }

    for fixup in fixups {
        let value = *segment
            .labels
            .get(&fixup.label)
            .ok_or(Error::LabelNotFound(fixup.label.clone(), fixup.line))?;
        if let Some(entry) = segment.entries.get_mut(fixup.entry) {
            entry.bytes[fixup.offset..fixup.offset + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    segment.end = addr as u32;
    debug!(
        "data segment: {} bytes, {} labels",
        segment.end - segment.base,
        segment.labels.len()
    );
    Ok(segment)
}

fn padding(addr: u64, align: u64) -> u64 {
    (align - addr % align) % align
}

/// The only operand of `.space`/`.align`, within `min..=max`.
fn single(line: &Line, min: i64, max: i64) -> Result<i64, &str> {
    match line.args.as_slice() {
        [arg] => operand::parse_int(arg)
            .filter(|n| (min..=max).contains(n))
            .ok_or(arg.as_str()),
        [_, extra, ..] => Err(extra.as_str()),
        [] => Err(""),
    }
}
