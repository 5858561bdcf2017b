// File: src/errors.rs
//
// Error handling and reporting for the Falcon language. Mirrors the two
// error families the core actually raises: compile errors (from the
// scanner/compiler) and runtime errors (from the VM's dispatch loop).

use colored::Colorize;
use std::fmt;

/// Source location information for tracking where code appears in a file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub file: Option<String>,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column, file: None }
    }

    pub fn with_file(line: u32, column: u32, file: String) -> Self {
        Self { line, column, file: Some(file) }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// A single compile-time diagnostic: `file:line:column => CompilerError: <msg>`
/// followed by the offending source line and a caret, per the language's
/// user-visible error format.
#[derive(Debug, Clone)]
pub struct CompilerError {
    pub message: String,
    pub location: SourceLocation,
    pub source_line: Option<String>,
}

impl CompilerError {
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self { message: message.into(), location, source_line: None }
    }

    pub fn with_source(mut self, source_line: impl Into<String>) -> Self {
        self.source_line = Some(source_line.into());
        self
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} {} {} {}",
            self.location.to_string().bright_blue(),
            "=>".bright_blue(),
            "CompilerError:".red().bold(),
            self.message
        )?;
        if let Some(line) = &self.source_line {
            writeln!(f, "{}", line)?;
            writeln!(
                f,
                "{}{}",
                " ".repeat(self.location.column.saturating_sub(1) as usize),
                "^".red().bold()
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilerError {}

/// One entry of a runtime stack trace: the line being executed and the
/// function it was executing in (`None` means the top-level script).
#[derive(Debug, Clone)]
pub struct TraceFrame {
    pub line: u32,
    pub function_name: Option<String>,
}

/// Stack traces are capped so a runaway recursive error doesn't dump
/// thousands of frames to stderr.
pub const MAX_TRACE_FRAMES: usize = 64;

#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub message: String,
    /// Last call first, matching the user-visible trace order.
    pub trace: Vec<TraceFrame>,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), trace: Vec::new() }
    }

    pub fn with_trace(mut self, trace: Vec<TraceFrame>) -> Self {
        trace.into_iter().take(MAX_TRACE_FRAMES).for_each(|f| self.trace.push(f));
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} {}", "RuntimeError:".red().bold(), self.message)?;
        if !self.trace.is_empty() {
            writeln!(f, "Stack trace (last call first):")?;
            for frame in &self.trace {
                let name = frame.function_name.as_deref().unwrap_or("script");
                writeln!(f, "  [Line {}] in {}()", frame.line, name)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

/// Outcome of `interpret`, matching spec.md §6's host contract.
#[derive(Debug)]
pub enum InterpretResult {
    Ok,
    CompileError(Vec<CompilerError>),
    RuntimeError(RuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiler_error_display_has_caret() {
        let err = CompilerError::new("expected expression", SourceLocation::new(3, 5))
            .with_source("  var x = ;");
        let rendered = format!("{}", err);
        assert!(rendered.contains("CompilerError"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn runtime_trace_is_capped() {
        let frames: Vec<TraceFrame> = (0..200)
            .map(|i| TraceFrame { line: i, function_name: Some("f".into()) })
            .collect();
        let err = RuntimeError::new("boom").with_trace(frames);
        assert_eq!(err.trace.len(), MAX_TRACE_FRAMES);
    }
}
