// File: src/natives.rs
//
// The minimal native-function surface registered into every fresh `Vm`.
// Host natives run synchronously and return `Value::Err` (via
// `Vm::native_error`) to signal a runtime error that's already been
// reported, per the `NativeFn` contract in value.rs.

use crate::value::{Obj, Value};
use crate::vm::Vm;

pub fn register(vm: &mut Vm) {
    vm.define_native("print", native_print);
    vm.define_native("len", native_len);
    vm.define_native("clock", native_clock);
}

fn native_print(vm: &mut Vm, args: &[Value]) -> Value {
    let parts: Vec<String> = args.iter().map(|v| v.to_display_string(&vm.heap)).collect();
    println!("{}", parts.join(" "));
    Value::Null
}

fn native_len(vm: &mut Vm, args: &[Value]) -> Value {
    if args.len() != 1 {
        return vm.native_error(format!("len() expects 1 argument, got {}", args.len()));
    }
    match args[0] {
        Value::Obj(r) => match vm.heap.get(r) {
            Obj::String(s) => Value::Num(s.bytes.len() as f64),
            Obj::List(l) => Value::Num(l.items.len() as f64),
            Obj::Map(m) => Value::Num(m.table.count() as f64),
            other => vm.native_error(format!("len() has no meaning for a {}", other.type_name())),
        },
        _ => vm.native_error("len() expects a string, list, or map"),
    }
}

fn native_clock(vm: &mut Vm, args: &[Value]) -> Value {
    if !args.is_empty() {
        return vm.native_error(format!("clock() expects 0 arguments, got {}", args.len()));
    }
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(d) => Value::Num(d.as_secs_f64()),
        Err(_) => vm.native_error("system clock is before the Unix epoch"),
    }
}
