use serde::{Deserialize, Serialize};

pub const TEXT_BASE: u32 = 0x0040_0000;
pub const TEXT_MAX: u32 = 0x0050_0000;
pub const DATA_BASE: u32 = 0x1000_0000;
pub const DATA_MAX: u32 = 0x1010_0000;
pub const STACK_BASE: u32 = 0x7FFF_0000;
pub const STACK_MAX: u32 = 0x8000_0000;

/// Width of the band below the stack that is reported as an overflow rather
/// than a plain segmentation fault.
pub const OVERFLOW_BAND: u32 = 40;

/// Segment bounds. Each segment spans `[base, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub text_base: u32,
    pub text_max: u32,
    pub data_base: u32,
    pub data_max: u32,
    pub stack_base: u32,
    pub stack_max: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            text_base: TEXT_BASE,
            text_max: TEXT_MAX,
            data_base: DATA_BASE,
            data_max: DATA_MAX,
            stack_base: STACK_BASE,
            stack_max: STACK_MAX,
        }
    }
}

impl Layout {
    /// Return address planted in `$ra` on reset; jumping to it ends the program.
    pub fn sentinel(&self) -> u32 {
        self.text_base.wrapping_sub(4)
    }

    pub fn in_data(&self, addr: u32) -> bool {
        self.data_base <= addr && addr < self.data_max
    }

    pub fn in_stack(&self, addr: u32) -> bool {
        self.stack_base <= addr && addr < self.stack_max
    }

    pub fn in_overflow_band(&self, addr: u32) -> bool {
        self.stack_base.saturating_sub(OVERFLOW_BAND) <= addr && addr < self.stack_base
    }

    pub fn stack_size(&self) -> usize {
        self.stack_max.saturating_sub(self.stack_base) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        let layout = Layout::default();
        assert_eq!(layout.sentinel(), 0x003F_FFFC);
        assert!(layout.in_data(DATA_BASE));
        assert!(!layout.in_data(DATA_MAX));
        assert!(layout.in_stack(STACK_MAX - 4));
        assert!(!layout.in_stack(STACK_MAX));
        assert!(layout.in_overflow_band(STACK_BASE - 4));
        assert!(layout.in_overflow_band(STACK_BASE - 40));
        assert!(!layout.in_overflow_band(STACK_BASE - 44));
        assert!(!layout.in_overflow_band(STACK_BASE));
        assert_eq!(layout.stack_size(), 0x1_0000);
    }
}
