use serde::{Deserialize, Serialize};

use crate::operand;

/// One preprocessed source statement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Line {
    /// 1-based line number in the source file.
    pub line: usize,
    pub text: String,
    pub label: Option<String>,
    pub mnemonic: String,
    pub args: Vec<String>,
}

impl Line {
    /// Build a line from its tokens. A leading `name:` token becomes the label.
    pub fn new(line: usize, tokens: Vec<String>) -> Self {
        let text = tokens.join(" ");
        let mut tokens = tokens.into_iter().peekable();
        let label = tokens
            .peek()
            .and_then(|t| operand::label_decl(t))
            .map(String::from);
        if label.is_some() {
            tokens.next();
        }
        let mnemonic = tokens.next().unwrap_or_default().to_ascii_lowercase();
        Self {
            line,
            text,
            label,
            mnemonic,
            args: tokens.collect(),
        }
    }
}
