// File: src/gc.rs
//
// Tri-color mark-and-sweep garbage collector over the VM's object heap.
// Partitions objects into white (unmarked), gray (marked, unscanned), and
// black (marked, scanned); sweep frees whites.

use crate::value::{Heap, Obj, ObjRef, Value};
use crate::vm::Vm;

/// Tuning knobs; defaults match spec.md §4.5/§B.
pub struct GcConfig {
    pub enabled: bool,
    pub stress: bool,
    pub next_gc: usize,
    pub growth_factor: f64,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self { enabled: true, stress: false, next_gc: 1024 * 1024, growth_factor: 2.0 }
    }
}

fn mark_value(heap: &mut Heap, gray: &mut Vec<ObjRef>, value: Value) {
    if let Value::Obj(r) = value {
        mark_object(heap, gray, r);
    }
}

fn mark_object(heap: &mut Heap, gray: &mut Vec<ObjRef>, r: ObjRef) {
    if heap.mark(r) {
        gray.push(r);
    }
}

/// Marks every outgoing reference of `r` (which is already black after this
/// call returns) and pushes any newly-reached children onto the gray stack.
fn blacken(heap: &mut Heap, gray: &mut Vec<ObjRef>) {
    while let Some(r) = gray.pop() {
        // Clone the small set of references out before mutating the heap
        // through further marks (marks only flip a bool, so this is just to
        // satisfy the borrow checker, not to avoid aliasing bugs).
        match heap.get(r).clone() {
            Obj::String(_) | Obj::Native(_) => {}
            Obj::Function(f) => {
                if let Some(name) = f.name {
                    mark_object(heap, gray, name);
                }
                for c in &f.chunk.constants {
                    mark_value(heap, gray, *c);
                }
            }
            Obj::Upvalue(crate::value::ObjUpvalue::Closed(v)) => mark_value(heap, gray, v),
            Obj::Upvalue(crate::value::ObjUpvalue::Open { .. }) => {}
            Obj::Closure(c) => {
                mark_object(heap, gray, c.function);
                for u in &c.upvalues {
                    mark_object(heap, gray, *u);
                }
            }
            Obj::Class(c) => {
                mark_object(heap, gray, c.name);
                for (k, v) in c.methods.iter() {
                    mark_object(heap, gray, k);
                    mark_value(heap, gray, v);
                }
            }
            Obj::Instance(i) => {
                mark_object(heap, gray, i.class);
                for (k, v) in i.fields.iter() {
                    mark_object(heap, gray, k);
                    mark_value(heap, gray, v);
                }
            }
            Obj::BoundMethod(b) => {
                mark_value(heap, gray, b.receiver);
                mark_object(heap, gray, b.method);
            }
            Obj::List(l) => {
                for v in &l.items {
                    mark_value(heap, gray, *v);
                }
            }
            Obj::Map(m) => {
                for (k, v) in m.table.iter() {
                    mark_object(heap, gray, k);
                    mark_value(heap, gray, v);
                }
            }
        }
    }
}

/// Mark-roots, trace, weak-sweep-the-intern-table, sweep, per spec.md §4.5.
/// Returns the number of objects freed (for `--trace-memory`).
pub fn collect(vm: &mut Vm) -> usize {
    let mut gray: Vec<ObjRef> = Vec::new();

    for &v in vm.stack_slice() {
        mark_value(&mut vm.heap, &mut gray, v);
    }
    for frame in vm.frames_slice() {
        mark_object(&mut vm.heap, &mut gray, frame.closure);
    }
    for &u in vm.open_upvalues_slice() {
        mark_object(&mut vm.heap, &mut gray, u);
    }
    let global_entries: Vec<(ObjRef, Value)> = vm.globals.iter().collect();
    for (k, v) in global_entries {
        mark_object(&mut vm.heap, &mut gray, k);
        mark_value(&mut vm.heap, &mut gray, v);
    }
    mark_object(&mut vm.heap, &mut gray, vm.init_string);

    blacken(&mut vm.heap, &mut gray);

    vm.strings.remove_unmarked(&vm.heap);

    let all: Vec<ObjRef> = vm.heap.live_refs().collect();
    let mut freed = 0;
    for r in all {
        if vm.heap.is_marked(r) {
            vm.heap.clear_mark(r);
        } else {
            vm.heap.free(r);
            freed += 1;
        }
    }

    vm.gc.next_gc = ((vm.heap.bytes_allocated as f64) * vm.gc.growth_factor) as usize;
    freed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::Vm;

    #[test]
    fn unreachable_strings_are_collected_reachable_ones_survive() {
        let mut vm = Vm::new();
        let kept = crate::map::intern(&mut vm.heap, &mut vm.strings, b"kept");
        vm.push(Value::Obj(kept));
        let _discarded = crate::map::intern(&mut vm.heap, &mut vm.strings, b"discarded");
        let before = vm.heap.len();
        collect(&mut vm);
        let after = vm.heap.len();
        assert!(after < before);
        assert!(vm.heap.is_marked(kept) == false); // cleared after sweep
        // `kept` must still resolve (wasn't freed).
        assert_eq!(vm.heap.get_string_bytes(kept), "kept");
    }
}
