pub mod assembler;
pub mod catalog;
pub mod data;
pub mod error;
pub mod listing;
pub mod logger;
pub mod source;

use arch::{error::Error, image::Program, layout::Layout};

/// Assemble `src` with the default memory layout.
pub fn assemble(src: &str) -> Result<Program, Error> {
    assemble_with(src, &Layout::default())
}

pub fn assemble_with(src: &str, layout: &Layout) -> Result<Program, Error> {
    let source = source::preprocess(src)?;
    let data = data::build(&source.data, layout)?;
    let text = assembler::assemble(source.text, &data.labels, layout)?;
    Ok(Program {
        layout: *layout,
        lines: text.lines,
        text: text.slots,
        labels: text.labels,
        end: text.end,
        data,
    })
}
