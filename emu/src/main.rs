mod hooks;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use arch::image::Program;
use clap::Parser;
use color_print::cprintln;
use log::info;
use mipsasm::error::{print_diag, CliError};
use mipsemu::{config::Config, Machine};

use hooks::{console::Console, dump::Dump, Hook};

#[derive(Parser, Debug)]
#[clap(
    name = "MIPS Emulator",
    version = "v1.0.0",
    about = "Runs MIPS assembly or an assembled image"
)]
struct Args {
    /// Stop after this many cycles
    #[arg(short = 't', long)]
    tmax: Option<u64>,

    /// Run configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dump registers after every cycle
    #[arg(short = 'a', long)]
    dump_all: bool,

    /// Log verbosity, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Assembly source, or a `.yaml` image
    input_file: PathBuf,
}

fn main() {
    let args = Args::parse();
    mipsasm::logger::init(args.verbose);
    if let Err(err) = run(&args) {
        err.print();
        std::process::exit(1);
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::FileRead(path.display().to_string(), e))
}

fn run(args: &Args) -> Result<(), CliError> {
    let input = args.input_file.display().to_string();
    println!("MIPS Emulator");
    println!("+-----------------------------------------------+");
    println!("| {:<45} |", input);
    println!("+-----------------------------------------------+");

    let config = match &args.config {
        Some(path) => Config::from_yaml(&read(path)?)
            .map_err(|e| CliError::Yaml(path.display().to_string(), e))?,
        None => Config::default(),
    };

    // ------------------------------------------------------------------------
    // Load or assemble
    let src = read(&args.input_file)?;
    let is_image = matches!(
        args.input_file.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );
    let program: Program = if is_image {
        serde_yaml::from_str(&src).map_err(|e| CliError::Yaml(input.clone(), e))?
    } else {
        match mipsasm::assemble_with(&src, &config.layout) {
            Ok(program) => program,
            Err(err) => {
                let lines: Vec<&str> = src.lines().collect();
                print_diag(&err, &input, &lines);
                std::process::exit(1);
            }
        }
    };
    info!(
        "{} instructions, entry {:#010x}",
        program.text.len(),
        program.main().unwrap_or_default()
    );
    let lines = source_lines(&program);
    let mut machine = Machine::with_config(Arc::new(program), &config)?;

    // ------------------------------------------------------------------------
    // Hooks
    println!("[INIT]");
    let mut hooks: Vec<Box<dyn Hook>> = vec![
        Box::new(Dump::new(config.dump.clone(), args.dump_all)),
        Box::new(Console::new()),
    ];
    for hook in hooks.iter_mut() {
        hook.init(&machine);
    }

    // ------------------------------------------------------------------------
    // Main loop
    for time in 0..args.tmax.unwrap_or(u64::MAX) {
        if machine.has_exited() {
            break;
        }
        if time > 0 {
            if let Some(line) = machine.breakpoint() {
                cprintln!("<y,s>break</> at line {}", line);
                hooks::dump::print_reg(&machine);
            }
        }
        machine.run_cycle();
        for hook in hooks.iter_mut() {
            hook.exec(time, &machine);
        }
    }

    // ------------------------------------------------------------------------
    // Summary
    let state = machine.state();
    println!();
    println!("=================================================");
    println!("cycles: {}", state.cycles);
    match machine.error() {
        Some(err) => {
            let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
            print_diag(err, &input, &lines);
        }
        None if state.has_exited => cprintln!("<g,s>exited</>"),
        None => cprintln!("<y,s>stopped</> (tmax reached)"),
    }
    Ok(())
}

/// Source text by line number, rebuilt from the image.
fn source_lines(program: &Program) -> Vec<String> {
    let count = program.lines.iter().map(|line| line.line).max().unwrap_or(0);
    let mut lines = vec![String::new(); count];
    for line in &program.lines {
        if let Some(slot) = line.line.checked_sub(1).and_then(|idx| lines.get_mut(idx)) {
            *slot = line.text.clone();
        }
    }
    lines
}
