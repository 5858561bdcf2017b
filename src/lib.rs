// File: src/lib.rs
//
// Library interface for the Falcon interpreter.
// Exposes modules for integration testing and external use.

pub mod chunk;
pub mod compiler;
pub mod debug;
pub mod errors;
pub mod gc;
pub mod map;
pub mod natives;
pub mod repl;
pub mod scanner;
pub mod value;
pub mod vm;

use errors::InterpretResult;

/// Compiles and runs `source` against `vm`, folding both halves of the
/// pipeline into the one result type callers actually care about. `source`
/// is raw bytes, not `&str`: per spec.md §6 the scanner doesn't assume UTF-8.
pub fn interpret(vm: &mut vm::Vm, source: &[u8]) -> InterpretResult {
    match compiler::compile(vm, source) {
        Ok(script) => match vm.run(script) {
            Ok(()) => InterpretResult::Ok,
            Err(e) => InterpretResult::RuntimeError(e),
        },
        Err(errors) => InterpretResult::CompileError(errors),
    }
}
