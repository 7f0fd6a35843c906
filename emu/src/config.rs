//! Run configuration, read from YAML.
//!
//! ```yaml
//! cycle_limit: 5000
//! breakpoints: [12]
//! devices:
//!   - kind: counter
//!     addr: 0xFFFF0000
//! dump:
//!   12:
//!     registers: [8, 29]
//!     words: [0x10000000]
//! ```

use arch::{layout::Layout, reg::Reg};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::device::{Counter, Device};

pub const CYCLE_LIMIT: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cycle_limit: u64,
    pub layout: Layout,
    pub breakpoints: Vec<usize>,
    pub devices: Vec<DeviceConfig>,
    /// Source line to the state printed after it executes.
    pub dump: IndexMap<usize, DumpConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cycle_limit: CYCLE_LIMIT,
            layout: Layout::default(),
            breakpoints: vec![],
            devices: vec![],
            dump: IndexMap::new(),
        }
    }
}

impl Config {
    pub fn from_yaml(src: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(src)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeviceConfig {
    Counter { addr: u32 },
}

impl DeviceConfig {
    pub fn build(&self) -> Box<dyn Device> {
        match self {
            DeviceConfig::Counter { addr } => Box::new(Counter::new(*addr)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    pub registers: Vec<Reg>,
    pub words: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cycle_limit, 1_000_000);
    }

    #[test]
    fn full() {
        let config = Config::from_yaml(
            "cycle_limit: 5000\n\
             layout:\n  stack_base: 0x7FFE0000\n\
             breakpoints: [12]\n\
             devices:\n  - kind: counter\n    addr: 0xFFFF0000\n\
             dump:\n  12:\n    registers: [8, 29]\n    words: [0x10000000]\n",
        )
        .unwrap();
        assert_eq!(config.cycle_limit, 5000);
        assert_eq!(config.layout.stack_base, 0x7FFE_0000);
        assert_eq!(config.layout.stack_max, 0x8000_0000);
        assert_eq!(config.breakpoints, vec![12]);
        assert_eq!(config.devices, vec![DeviceConfig::Counter { addr: 0xFFFF_0000 }]);
        assert_eq!(config.dump[&12].registers, vec![Reg::T0, Reg::Sp]);
        assert_eq!(config.dump[&12].words, vec![0x1000_0000]);
    }
}
