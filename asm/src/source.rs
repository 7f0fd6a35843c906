//! Source preprocessing: comments, tokens, constants, register aliases and
//! segment splitting.

use arch::{error::Error, line::Line, operand, reg::Reg};
use indexmap::IndexMap;
use log::debug;

/// Preprocessed program, split by segment.
#[derive(Debug, Clone, Default)]
pub struct Source {
    pub data: Vec<Line>,
    pub text: Vec<Line>,
    pub constants: IndexMap<String, i64>,
}

/// A statement before it is split into label, mnemonic and operands.
#[derive(Debug, Clone)]
struct Stmt {
    line: usize,
    tokens: Vec<String>,
}

impl Stmt {
    fn text(&self) -> String {
        self.tokens.join(" ")
    }

    fn is_directive(&self, name: &str) -> bool {
        matches!(self.tokens.as_slice(), [t] if t.eq_ignore_ascii_case(name))
    }
}

pub fn preprocess(src: &str) -> Result<Source, Error> {
    let stmts = cleanup(src);
    let (stmts, constants) = constants(stmts)?;
    let stmts: Vec<Stmt> = stmts
        .into_iter()
        .map(|stmt| Stmt {
            line: stmt.line,
            tokens: substitute(stmt.tokens, &constants),
        })
        .collect();
    let (data, text) = segment(stmts)?;
    debug!(
        "preprocessed {} data lines, {} text lines, {} constants",
        data.len(),
        text.len(),
        constants.len()
    );
    Ok(Source {
        data,
        text,
        constants,
    })
}

// ----------------------------------------------------------------------------
// Cleanup

fn cleanup(src: &str) -> Vec<Stmt> {
    let src = strip_block_comments(src);
    let mut stmts: Vec<Stmt> = src
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let mut tokens = tokenize(strip_comment(raw));
            if let Some(pos) = tokens
                .iter()
                .position(|t| t == ".globl" || t == ".global")
            {
                tokens.truncate(pos);
            }
            if tokens.is_empty() {
                None
            } else {
                Some(Stmt {
                    line: idx + 1,
                    tokens,
                })
            }
        })
        .collect();

    // A label alone on its line belongs to the next statement.
    let mut merged: Vec<Stmt> = Vec::with_capacity(stmts.len());
    let mut pending: Vec<String> = vec![];
    let last = stmts.len().saturating_sub(1);
    for (idx, mut stmt) in stmts.drain(..).enumerate() {
        let label_only = matches!(stmt.tokens.as_slice(), [t] if operand::label_decl(t).is_some());
        if label_only && idx < last {
            pending.append(&mut stmt.tokens);
            continue;
        }
        if !pending.is_empty() {
            pending.append(&mut stmt.tokens);
            stmt.tokens = std::mem::take(&mut pending);
        }
        merged.push(stmt);
    }
    merged
}

/// Remove `/* ... */` comments, keeping their newlines so line numbers hold.
fn strip_block_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => {
                let comment = &rest[start..start + 2 + end + 2];
                out.extend(comment.chars().filter(|c| *c == '\n'));
                rest = &rest[start + 2 + end + 2..];
            }
            None => {
                out.extend(rest[start..].chars().filter(|c| *c == '\n'));
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Cut a `#` or `//` comment, ignoring markers inside quotes.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (idx, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'#' => return &line[..idx],
            b'/' if bytes.get(idx + 1) == Some(&b'/') => return &line[..idx],
            _ => {}
        }
    }
    line
}

/// Split on whitespace, `,` and `;`, keeping quoted literals whole.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = vec![];
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in line.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            c if c.is_whitespace() || c == ',' || c == ';' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

// ----------------------------------------------------------------------------
// Constants and aliases

fn constants(stmts: Vec<Stmt>) -> Result<(Vec<Stmt>, IndexMap<String, i64>), Error> {
    let mut constants = IndexMap::new();
    let mut rest = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        let text = stmt.text();
        match split_constant(&text) {
            Some((name, value)) => {
                let value = operand::parse_constant(value, stmt.line)
                    .map_err(|_| Error::BadConstant(text.clone(), stmt.line))?;
                constants.insert(name.to_string(), value);
            }
            None => rest.push(stmt),
        }
    }
    Ok((rest, constants))
}

/// `NAME = value`
fn split_constant(text: &str) -> Option<(&str, &str)> {
    let (name, value) = text.split_once('=')?;
    let (name, value) = (name.trim(), value.trim());
    if operand::is_identifier(name) && !value.is_empty() {
        Some((name, value))
    } else {
        None
    }
}

fn substitute(tokens: Vec<String>, constants: &IndexMap<String, i64>) -> Vec<String> {
    let constant = |t: &str| match constants.get(t) {
        Some(value) => value.to_string(),
        None => t.to_string(),
    };
    let register = |t: &str| match Reg::alias(t) {
        Some(reg) => reg.asm(),
        None => t.to_string(),
    };

    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match split_offset(&token) {
            Some((offset, reg)) => {
                out.push(if offset.is_empty() {
                    "0".to_string()
                } else {
                    constant(offset)
                });
                out.push(register(reg));
            }
            None => out.push(register(&constant(&token))),
        }
    }
    out
}

/// `offset($reg)` into its two parts.
fn split_offset(token: &str) -> Option<(&str, &str)> {
    let inner = token.strip_suffix(')')?;
    let (offset, reg) = inner.split_once('(')?;
    if reg.starts_with('$') && (2..=5).contains(&reg.len()) {
        Some((offset, reg))
    } else {
        None
    }
}

// ----------------------------------------------------------------------------
// Segments

fn segment(stmts: Vec<Stmt>) -> Result<(Vec<Line>, Vec<Line>), Error> {
    let data: Vec<usize> = positions(&stmts, ".data");
    let text: Vec<usize> = positions(&stmts, ".text");

    if data.len() > 1 {
        return Err(Error::MultipleDataSegments);
    }
    let text_idx = match text.as_slice() {
        [idx] => *idx,
        _ => return Err(Error::TextSegmentCount),
    };
    match data.first() {
        Some(idx) if *idx != 0 => return Err(Error::SegmentOrder),
        None if text_idx != 0 => return Err(Error::SegmentOrder),
        _ => {}
    }

    let to_lines = |stmts: &[Stmt]| -> Vec<Line> {
        stmts
            .iter()
            .map(|stmt| Line::new(stmt.line, stmt.tokens.clone()))
            .collect()
    };
    let data_lines = if data.is_empty() {
        vec![]
    } else {
        to_lines(&stmts[1..text_idx])
    };
    Ok((data_lines, to_lines(&stmts[text_idx + 1..])))
}

fn positions(stmts: &[Stmt], directive: &str) -> Vec<usize> {
    stmts
        .iter()
        .enumerate()
        .filter(|(_, stmt)| stmt.is_directive(directive))
        .map(|(idx, _)| idx)
        .collect()
}
