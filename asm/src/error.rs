use color_print::cprintln;
use thiserror::Error;

/// Failures of the command line tools around the assembler proper.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read file: {0}")]
    FileRead(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),

    #[error("Invalid YAML in {0}")]
    Yaml(String, #[source] serde_yaml::Error),

    #[error(transparent)]
    Asm(#[from] arch::error::Error),
}

impl CliError {
    pub fn print(&self) {
        cprintln!("<red,bold>error</>: {}", self);
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            cprintln!("  <blue>caused by</>: {}", cause);
            source = cause.source();
        }
    }
}

/// Print an assembly or runtime error, pointing at the source line when it
/// names one.
pub fn print_diag(err: &arch::error::Error, file: &str, lines: &[&str]) {
    cprintln!("<red,bold>error[{}]</>: {}", err.code(), err);

    let Some(line_num) = err.line() else {
        return;
    };
    let content = line_num
        .checked_sub(1)
        .and_then(|idx| lines.get(idx))
        .copied()
        .unwrap_or("");
    cprintln!("     <blue>--></> <underline>{}:{}</>", file, line_num);
    cprintln!("      <blue>|</>");
    cprintln!(" <blue>{:>4} |</> {}", line_num, content);
    cprintln!("      <blue>|</>");
}
