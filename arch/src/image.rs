use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{inst::Inst, layout::Layout, line::Line};

/// Label name to absolute address, in declaration order.
pub type Labels = IndexMap<String, u32>;

// ----------------------------------------------------------------------------
// Data segment

/// Bytes placed by one data directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEntry {
    pub line: usize,
    pub addr: u32,
    pub bytes: Vec<u8>,
}

/// Declarative data segment layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataSegment {
    pub base: u32,
    pub end: u32,
    pub entries: Vec<DataEntry>,
    pub labels: Labels,
}

impl DataSegment {
    pub fn new(base: u32) -> Self {
        Self {
            base,
            end: base,
            ..Default::default()
        }
    }

    /// Fresh byte image of `[base, end)`.
    pub fn materialize(&self) -> Vec<u8> {
        let mut bytes = vec![0; self.end.saturating_sub(self.base) as usize];
        for entry in &self.entries {
            let start = entry.addr.wrapping_sub(self.base) as usize;
            if let Some(dst) = bytes.get_mut(start..start + entry.bytes.len()) {
                dst.copy_from_slice(&entry.bytes);
            }
        }
        bytes
    }
}

// ----------------------------------------------------------------------------
// Program image

/// One address of the text segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub inst: Inst,
    /// Index into [`Program::lines`].
    pub source: usize,
    /// Position within the line's expansion.
    pub index: usize,
}

/// Assembled program: text image, its source lines, and the data layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub layout: Layout,
    pub lines: Vec<Line>,
    pub text: BTreeMap<u32, Slot>,
    pub labels: Labels,
    /// Address one word past the last instruction.
    pub end: u32,
    pub data: DataSegment,
}

impl Program {
    pub fn fetch(&self, addr: u32) -> Option<(&Slot, &Line)> {
        let slot = self.text.get(&addr)?;
        let line = self.lines.get(slot.source)?;
        Some((slot, line))
    }

    pub fn main(&self) -> Option<u32> {
        self.labels.get("main").copied()
    }

    /// Text label declared at `addr`, if any.
    pub fn label_at(&self, addr: u32) -> Option<&str> {
        self.labels
            .iter()
            .find(|(_, a)| **a == addr)
            .map(|(name, _)| name.as_str())
    }
}
