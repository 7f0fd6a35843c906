use arch::{error::ErrorInfo, reg::Reg};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Register file. Writes to `$0` are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    pub pc: u32,
    pub hi: u32,
    pub lo: u32,
    gpr: [u32; 32],
}

impl Registers {
    pub fn get(&self, reg: Reg) -> u32 {
        self.gpr[reg.index()]
    }

    pub fn set(&mut self, reg: Reg, value: u32) {
        if reg != Reg::Zero {
            self.gpr[reg.index()] = value;
        }
    }

    /// `PC, HI, LO, $0..$31`
    pub fn to_map(&self) -> IndexMap<String, u32> {
        let mut map = IndexMap::with_capacity(35);
        map.insert("PC".to_string(), self.pc);
        map.insert("HI".to_string(), self.hi);
        map.insert("LO".to_string(), self.lo);
        for (idx, value) in self.gpr.iter().enumerate() {
            map.insert(format!("${idx}"), *value);
        }
        map
    }
}

/// Observable machine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub registers: IndexMap<String, u32>,
    pub cycles: u64,
    pub has_exited: bool,
    pub error: Option<ErrorInfo>,
    pub output: String,
    pub breakpoints: Vec<usize>,
}

impl Snapshot {
    pub fn reg(&self, reg: Reg) -> u32 {
        self.registers
            .get(&reg.asm())
            .copied()
            .unwrap_or_default()
    }

    pub fn error_code(&self) -> Option<u32> {
        self.error.as_ref().map(|err| err.code)
    }
}
