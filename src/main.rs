// File: src/main.rs
//
// Main entry point for the Falcon programming language interpreter.
// Handles command-line argument parsing and dispatches to the appropriate
// subcommand (run or repl).

mod chunk;
mod compiler;
mod debug;
mod errors;
mod gc;
mod map;
mod natives;
mod repl;
mod scanner;
mod value;
mod vm;

use clap::{Parser as ClapParser, Subcommand};
use std::fs;
use std::path::PathBuf;
use vm::Vm;

#[derive(ClapParser)]
#[command(
    name = "falcon",
    about = "Falcon: a small bytecode-compiled scripting language",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run a Falcon script file
    Run {
        /// Path to the script file
        file: PathBuf,

        /// Print bytecode disassembly before running
        #[arg(long)]
        dump_opcodes: bool,

        /// Trace every executed instruction and the stack to stderr
        #[arg(long)]
        trace_exec: bool,

        /// Log every heap allocation and collection to stderr
        #[arg(long)]
        trace_memory: bool,

        /// Run the garbage collector before every allocation (stress test)
        #[arg(long)]
        gc_stress: bool,
    },

    /// Launch the interactive REPL
    Repl {
        #[arg(long)]
        trace_exec: bool,

        #[arg(long)]
        trace_memory: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, dump_opcodes, trace_exec, trace_memory, gc_stress } => {
            // Read as raw bytes, not a `String`: the scanner doesn't assume
            // UTF-8 source (spec.md §6).
            let source = match fs::read(&file) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("falcon: can't read {}: {}", file.display(), e);
                    std::process::exit(74);
                }
            };

            let mut vm = Vm::new();
            vm.filename = Some(file.to_string_lossy().to_string());
            vm.dump_opcodes = dump_opcodes;
            vm.trace_exec = trace_exec;
            vm.trace_memory = trace_memory;
            vm.gc.stress = gc_stress;

            match compiler::compile(&mut vm, &source) {
                Ok(script) => {
                    // `Vm::run` itself disassembles the script chunk when
                    // `dump_opcodes` is set, so the dump isn't duplicated here.
                    match vm.run(script) {
                        Ok(()) => {}
                        Err(e) => {
                            eprintln!("{e}");
                            std::process::exit(70);
                        }
                    }
                }
                Err(errors) => {
                    for err in &errors {
                        eprintln!("{err}");
                    }
                    std::process::exit(65);
                }
            }
        }

        Commands::Repl { trace_exec, trace_memory } => {
            let mut repl = match repl::Repl::new() {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("failed to start REPL: {e}");
                    std::process::exit(1);
                }
            };
            repl.vm.trace_exec = trace_exec;
            repl.vm.trace_memory = trace_memory;
            if let Err(e) = repl.run() {
                eprintln!("REPL error: {e}");
                std::process::exit(1);
            }
        }
    }
}
