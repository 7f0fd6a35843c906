//! Operand classifiers.
//!
//! Each classifier either returns the typed operand or `None` when the lexeme
//! is not of that kind, so callers can try alternatives in order.

use crate::{error::Error, reg::Reg};

// ----------------------------------------------------------------------------
// Numeric literals

/// Parse a numeric literal: `0x` hex (up to 8 digits), `0b` binary (up to 32
/// digits), decimal with an optional `-`, or a character literal.
pub fn parse_int(s: &str) -> Option<i64> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() || hex.len() > 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        if bin.is_empty() || bin.len() > 32 || !bin.bytes().all(|b| b == b'0' || b == b'1') {
            return None;
        }
        return i64::from_str_radix(bin, 2).ok();
    }
    if s.starts_with('\'') {
        return parse_char(s).map(i64::from);
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse `'c'`, `'\n'`, `'\t'`, `'\0'`, `'\\'` or `'\''`.
pub fn parse_char(s: &str) -> Option<u8> {
    let body = s.strip_prefix('\'')?.strip_suffix('\'')?;
    match body.as_bytes() {
        [c] if *c != b'\\' => Some(*c),
        [b'\\', c] => unescape(*c),
        _ => None,
    }
}

/// Parse a double quoted string literal into bytes.
pub fn parse_string(s: &str) -> Option<Vec<u8>> {
    let body = s.strip_prefix('"')?.strip_suffix('"')?;
    let mut bytes = Vec::with_capacity(body.len());
    let mut iter = body.bytes();
    while let Some(b) = iter.next() {
        match b {
            b'\\' => bytes.push(unescape(iter.next()?)?),
            b'"' => return None,
            _ => bytes.push(b),
        }
    }
    Some(bytes)
}

fn unescape(c: u8) -> Option<u8> {
    match c {
        b'n' => Some(b'\n'),
        b't' => Some(b'\t'),
        b'0' => Some(0),
        b'\\' => Some(b'\\'),
        b'\'' => Some(b'\''),
        b'"' => Some(b'"'),
        _ => None,
    }
}

/// Parse the value of a named constant, failing with the constant error.
pub fn parse_constant(s: &str, line: usize) -> Result<i64, Error> {
    parse_int(s)
        .filter(|n| in_bit_range(*n, 32))
        .ok_or_else(|| Error::BadConstant(s.to_string(), line))
}

// ----------------------------------------------------------------------------
// Bit ranges

/// Representable in `bits` bits as either a signed or an unsigned quantity.
pub fn in_bit_range(n: i64, bits: u32) -> bool {
    let min = -(1_i64 << (bits - 1));
    let max = (1_i64 << bits) - 1;
    min <= n && n <= max
}

/// Representable in `bits` bits as a signed quantity.
pub fn in_signed_range(n: i64, bits: u32) -> bool {
    let min = -(1_i64 << (bits - 1));
    let max = (1_i64 << (bits - 1)) - 1;
    min <= n && n <= max
}

pub fn to_unsigned(n: i64, bits: u32) -> i64 {
    n & ((1_i64 << bits) - 1)
}

/// Upper half of a 32-bit value, as a `lui` operand.
pub fn hi16(value: u32) -> i32 {
    (value >> 16) as i32
}

/// Lower half of a 32-bit value, as an `ori` operand.
pub fn lo16(value: u32) -> i32 {
    (value & 0xFFFF) as i32
}

// ----------------------------------------------------------------------------
// Classifiers

pub fn reg(s: &str) -> Option<Reg> {
    Reg::parse(s)
}

/// Signed 16-bit immediate.
pub fn imm16(s: &str) -> Option<i32> {
    parse_int(s)
        .filter(|n| in_signed_range(*n, 16))
        .map(|n| n as i32)
}

/// 16-bit immediate, normalized to its unsigned pattern.
pub fn imm16u(s: &str) -> Option<i32> {
    parse_int(s)
        .filter(|n| in_bit_range(*n, 16))
        .map(|n| to_unsigned(n, 16) as i32)
}

/// 26-bit jump target, normalized to its unsigned pattern.
pub fn imm26(s: &str) -> Option<i32> {
    parse_int(s)
        .filter(|n| in_bit_range(*n, 26))
        .map(|n| to_unsigned(n, 26) as i32)
}

/// 32-bit immediate, normalized to its unsigned pattern.
pub fn imm32(s: &str) -> Option<u32> {
    parse_int(s)
        .filter(|n| in_bit_range(*n, 32))
        .map(|n| to_unsigned(n, 32) as u32)
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Label reference.
pub fn label(s: &str) -> Option<&str> {
    if is_identifier(s) {
        Some(s)
    } else {
        None
    }
}

/// Label declaration, `name:`.
pub fn label_decl(s: &str) -> Option<&str> {
    s.strip_suffix(':').and_then(label)
}
