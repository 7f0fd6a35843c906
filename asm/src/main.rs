use std::path::PathBuf;

use color_print::cprintln;
use log::info;
use mipsasm::error::{print_diag, CliError};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input assembly file
    input: PathBuf,

    /// Output image (YAML)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Dump assembled listing
    #[clap(short, long)]
    dump: bool,

    /// Log verbosity, repeat for more
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    use clap::Parser;

    let args = Args::parse();
    mipsasm::logger::init(args.verbose);
    if let Err(err) = run(&args) {
        err.print();
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let path = args.input.display().to_string();
    cprintln!("<s>MIPS Assembler</>");
    println!("  < {}", path);
    let src = std::fs::read_to_string(&args.input).map_err(|e| CliError::FileRead(path.clone(), e))?;

    let program = match mipsasm::assemble(&src) {
        Ok(program) => program,
        Err(err) => {
            let lines: Vec<&str> = src.lines().collect();
            print_diag(&err, &path, &lines);
            std::process::exit(1);
        }
    };
    info!(
        "{} instructions, {} data bytes",
        program.text.len(),
        program.data.end - program.data.base
    );

    if args.dump {
        mipsasm::listing::print(&program);
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("yaml"));
    let output_path = output.display().to_string();
    println!("  > {}", output_path);
    let yaml = serde_yaml::to_string(&program).map_err(|e| CliError::Yaml(output_path.clone(), e))?;
    std::fs::write(&output, yaml).map_err(|e| CliError::FileWrite(output_path, e))?;
    Ok(())
}
