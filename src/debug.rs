// File: src/debug.rs
//
// Textual debug dumps: bytecode disassembly (`--dump-opcodes`) and the
// per-instruction execution trace (`--trace-exec`). External concerns per
// the core's design: the compiler and VM only expose what these need.

use crate::chunk::{Chunk, OpCode};
use crate::value::{Heap, Obj, Value};
use crate::vm::Vm;

/// Prints every instruction in `chunk` to stdout, prefixed with `name`.
pub fn disassemble_chunk(heap: &Heap, chunk: &Chunk, name: &str) {
    println!("== {name} ==");
    let mut offset = 0;
    while offset < chunk.code.len() {
        offset = disassemble_instruction(heap, chunk, offset);
    }
}

fn upvalue_count_of(heap: &Heap) -> impl Fn(&Value) -> usize + '_ {
    move |v| match v {
        Value::Obj(r) => match heap.get(*r) {
            Obj::Function(f) => f.upvalue_count as usize,
            _ => 0,
        },
        _ => 0,
    }
}

pub fn disassemble_instruction(heap: &Heap, chunk: &Chunk, offset: usize) -> usize {
    print!("{offset:04} ");
    let line = chunk.source_line_of(offset);
    if offset > 0 && line == chunk.source_line_of(offset.saturating_sub(1)) {
        print!("   | ");
    } else {
        print!("{line:4} ");
    }

    let op = match OpCode::from_u8(chunk.code[offset]) {
        Some(op) => op,
        None => {
            println!("unknown opcode {}", chunk.code[offset]);
            return offset + 1;
        }
    };

    match op {
        OpCode::LoadConst => constant_instruction(op, chunk, offset),
        OpCode::DefList | OpCode::DefMap => u16_instruction(op, chunk, offset),
        OpCode::And | OpCode::Or | OpCode::Jump | OpCode::JumpIff => jump_instruction(op, chunk, offset, 1),
        OpCode::Loop => jump_instruction(op, chunk, offset, -1),
        OpCode::DefGlobal | OpCode::GetGlobal | OpCode::SetGlobal => named_constant_instruction(op, chunk, offset),
        OpCode::GetLocal | OpCode::SetLocal | OpCode::GetUpval | OpCode::SetUpval | OpCode::Call => {
            byte_instruction(op, chunk, offset)
        }
        OpCode::Closure => closure_instruction(heap, chunk, offset),
        OpCode::DefClass | OpCode::DefMethod | OpCode::GetProp | OpCode::SetProp | OpCode::Super => {
            named_constant_instruction(op, chunk, offset)
        }
        OpCode::InvProp | OpCode::InvSuper => invoke_instruction(chunk, offset),
        _ => simple_instruction(op, offset),
    }
}

fn simple_instruction(op: OpCode, offset: usize) -> usize {
    println!("{}", op.name());
    offset + 1
}

fn byte_instruction(op: OpCode, chunk: &Chunk, offset: usize) -> usize {
    let slot = chunk.code[offset + 1];
    println!("{:<16} {}", op.name(), slot);
    offset + 2
}

fn u16_instruction(op: OpCode, chunk: &Chunk, offset: usize) -> usize {
    let value = chunk.read_u16(offset + 1);
    println!("{:<16} {}", op.name(), value);
    offset + 3
}

fn jump_instruction(op: OpCode, chunk: &Chunk, offset: usize, sign: i32) -> usize {
    let jump = chunk.read_u16(offset + 1) as i32;
    let target = offset as i32 + 3 + sign * jump;
    println!("{:<16} {offset:04} -> {target}", op.name());
    offset + 3
}

fn constant_instruction(op: OpCode, chunk: &Chunk, offset: usize) -> usize {
    let idx = chunk.read_u16(offset + 1);
    println!("{:<16} {idx:04}", op.name());
    offset + 3
}

fn named_constant_instruction(op: OpCode, chunk: &Chunk, offset: usize) -> usize {
    let idx = chunk.code[offset + 1];
    println!("{:<16} {idx:04}", op.name());
    offset + 2
}

fn invoke_instruction(chunk: &Chunk, offset: usize) -> usize {
    let name_idx = chunk.code[offset + 1];
    let argc = chunk.code[offset + 2];
    println!("{:<16} ({} args) {name_idx:04}", "INVOKE", argc);
    offset + 3
}

fn closure_instruction(heap: &Heap, chunk: &Chunk, offset: usize) -> usize {
    let len = chunk.instruction_len(offset, upvalue_count_of(heap));
    let const_idx = chunk.code[offset + 1];
    println!("{:<16} {const_idx:04}", OpCode::Closure.name());
    offset + len
}

/// One line per executed instruction: current stack contents followed by
/// the disassembly of the instruction about to run, to stderr.
pub fn trace_instruction(vm: &Vm) {
    let stack_repr: Vec<String> =
        vm.stack_slice().iter().map(|v| format!("[{}]", v.to_display_string(&vm.heap))).collect();
    eprintln!("          {}", stack_repr.join(""));

    let (chunk, ip) = vm.current_chunk_and_ip();
    eprintln!("{}", format_instruction(chunk, ip));
}

fn format_instruction(chunk: &Chunk, offset: usize) -> String {
    match OpCode::from_u8(chunk.code[offset]) {
        Some(op) => format!("{offset:04} {}", op.name()),
        None => format!("{offset:04} <unknown>"),
    }
}
