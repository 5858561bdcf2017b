// File: src/repl.rs
//
// Interactive REPL (Read-Eval-Print Loop) for the Falcon programming
// language. One long-lived `Vm` instance persists across inputs, so
// top-level `var` declarations and function/class definitions from one
// line remain visible to the next. Trailing expression statements print
// their value via the `POPEXPR` opcode, which the compiler only emits at
// script top-level while `vm.is_repl` is set.

use crate::compiler;
use crate::vm::Vm;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// REPL session that maintains VM state and handles user interaction.
pub struct Repl {
    pub vm: Vm,
    editor: DefaultEditor,
}

impl Repl {
    /// Creates a new REPL session with a fresh VM.
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let editor = DefaultEditor::new()?;
        let mut vm = Vm::new();
        vm.is_repl = true;
        Ok(Repl { vm, editor })
    }

    fn show_banner(&self) {
        println!("{}", "╔══════════════════════════════════════════════════════╗".bright_cyan());
        println!("{}", "║          Falcon REPL - Interactive Shell             ║".bright_cyan());
        println!("{}", "╚══════════════════════════════════════════════════════╝".bright_cyan());
        println!();
        println!(
            "  {} Use {}{}{}{}",
            "Welcome!".bright_green(),
            ":".bright_blue(),
            "help".bright_yellow(),
            " for commands or ".bright_blue(),
            ":quit".bright_yellow()
        );
        println!("  {} Multi-line input: end with unclosed braces", "Tip:".bright_magenta());
        println!();
    }

    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.show_banner();

        let mut buffer = String::new();

        loop {
            let prompt =
                if buffer.is_empty() { "falcon> ".bright_green().to_string() } else { "....> ".bright_blue().to_string() };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    if buffer.is_empty() && line.trim().starts_with(':') {
                        if self.handle_command(line.trim()) {
                            continue;
                        } else {
                            break;
                        }
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if Self::is_input_complete(&buffer) {
                        self.eval_input(&buffer);
                        buffer.clear();
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C (Ctrl+C to interrupt, :quit to exit)".bright_yellow());
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "\nGoodbye!".bright_cyan());
                    break;
                }
                Err(err) => {
                    eprintln!("{} {}", "Error:".bright_red(), err);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Returns true to continue the REPL, false to quit.
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":help" | ":h" => {
                self.show_help();
                true
            }
            ":quit" | ":q" | ":exit" => {
                println!("{}", "Goodbye!".bright_cyan());
                false
            }
            ":clear" | ":c" => {
                print!("\x1B[2J\x1B[1;1H");
                self.show_banner();
                true
            }
            ":reset" | ":r" => {
                let trace_exec = self.vm.trace_exec;
                let trace_memory = self.vm.trace_memory;
                self.vm = Vm::new();
                self.vm.is_repl = true;
                self.vm.trace_exec = trace_exec;
                self.vm.trace_memory = trace_memory;
                println!("{}", "Environment reset".bright_green());
                true
            }
            _ => {
                println!(
                    "{} Unknown command: {}. Type {}{}{}",
                    "Error:".bright_red(),
                    cmd.bright_yellow(),
                    ":".bright_blue(),
                    "help".bright_yellow(),
                    " for available commands.".bright_blue()
                );
                true
            }
        }
    }

    fn show_help(&self) {
        println!();
        println!("{}", "REPL Commands:".bright_cyan().bold());
        println!();
        println!("  {}{}  Display this help message", ":help".bright_yellow(), " or :h     ".dimmed());
        println!("  {}{}  Exit the REPL", ":quit".bright_yellow(), " or :q     ".dimmed());
        println!("  {}{}  Clear the screen", ":clear".bright_yellow(), " or :c    ".dimmed());
        println!("  {}{}  Reset the VM", ":reset".bright_yellow(), " or :r    ".dimmed());
        println!();
        println!("{}", "Navigation:".bright_cyan().bold());
        println!();
        println!("  {}  Navigate command history", "↑/↓ arrows".bright_blue());
        println!("  {}  Interrupt current input", "Ctrl+C    ".bright_blue());
        println!("  {}  Exit REPL", "Ctrl+D    ".bright_blue());
        println!();
        println!("{}", "Multi-line Input:".bright_cyan().bold());
        println!();
        println!("  Leave braces, brackets, or parentheses unclosed to continue");
        println!("  on the next line. Close them to execute the statement.");
        println!();
    }

    /// True if all brackets/braces/parentheses are balanced and no string
    /// literal is left open.
    fn is_input_complete(input: &str) -> bool {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return true;
        }

        let mut brace_count = 0i32;
        let mut bracket_count = 0i32;
        let mut paren_count = 0i32;
        let mut in_string = false;
        let mut escape_next = false;
        let mut in_comment = false;

        for ch in trimmed.chars() {
            if in_comment {
                if ch == '\n' {
                    in_comment = false;
                }
                continue;
            }
            if escape_next {
                escape_next = false;
                continue;
            }
            match ch {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                '#' if !in_string => in_comment = true,
                '{' if !in_string => brace_count += 1,
                '}' if !in_string => brace_count -= 1,
                '[' if !in_string => bracket_count += 1,
                ']' if !in_string => bracket_count -= 1,
                '(' if !in_string => paren_count += 1,
                ')' if !in_string => paren_count -= 1,
                _ => {}
            }
        }

        !in_string && brace_count <= 0 && bracket_count <= 0 && paren_count <= 0
    }

    fn eval_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }

        match compiler::compile(&mut self.vm, input.as_bytes()) {
            Ok(script) => {
                if let Err(err) = self.vm.run(script) {
                    println!("{} {}", "Error:".bright_red().bold(), err.to_string().bright_red());
                }
            }
            Err(errors) => {
                for err in &errors {
                    println!("{err}");
                }
            }
        }
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new().expect("failed to create REPL")
    }
}
