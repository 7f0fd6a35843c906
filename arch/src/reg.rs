use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// General purpose registers. The discriminant is the register number.
///
/// `Display` and `FromStr` use the conventional alias (`t0`, `sp`, ...),
/// while [`Reg::parse`] accepts only the numeric `$N` operand syntax.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Default,
    TryFromPrimitive,
    IntoPrimitive,
    EnumString,
    EnumIter,
    Display,
)]
#[repr(u8)]
#[serde(into = "u8", try_from = "u8")]
#[strum(serialize_all = "lowercase")]
pub enum Reg {
    #[default]
    #[strum(to_string = "zero", serialize = "r0")]
    Zero,
    At,
    V0,
    V1,
    A0,
    A1,
    A2,
    A3,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    T8,
    T9,
    K0,
    K1,
    Gp,
    Sp,
    Fp,
    Ra,
}

impl Reg {
    /// Parse the numeric operand form `$0`..`$31`.
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('$')?;
        if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if digits.len() == 2 && digits.starts_with('0') {
            return None;
        }
        let n: u8 = digits.parse().ok()?;
        Self::try_from(n).ok()
    }

    /// Resolve a conventional alias such as `$t0` or `$ra`.
    pub fn alias(s: &str) -> Option<Self> {
        s.strip_prefix('$')?.to_ascii_lowercase().parse().ok()
    }

    pub fn index(self) -> usize {
        u8::from(self) as usize
    }

    /// Operand spelling, `$N`.
    pub fn asm(self) -> String {
        format!("${}", u8::from(self))
    }
}
