// File: src/value.rs
//
// Tagged-union runtime value, the heap object bodies it can point to, and
// the handle-based arena ("heap") that owns them. Rust has no room for
// clox's raw, possibly-cyclic object pointers, so every cross-object
// reference here is a stable `ObjRef` handle into `Heap`'s arena rather than
// an owning pointer; the garbage collector is just a reachability
// traversal over handles (see gc.rs).

use crate::chunk::Chunk;
use crate::map::FalconMap;

/// A stable handle to a heap-allocated object. Never dereferenced directly;
/// always resolved through a `Heap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(pub u32);

/// Native function signature: receives the VM (for allocation/errors) and
/// the argument slice, returns a `Value` or `Value::Err` to signal that a
/// runtime error has already been reported.
pub type NativeFn = fn(&mut crate::vm::Vm, &[Value]) -> Value;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Null,
    Num(f64),
    Obj(ObjRef),
    /// Sentinel returned by native functions that already reported a
    /// runtime error; tells the dispatch loop to unwind.
    Err,
}

impl Value {
    /// `Null`, `false`, `0`, empty string, empty list, empty map are falsy;
    /// everything else is truthy.
    pub fn is_falsy(&self, heap: &Heap) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !*b,
            Value::Num(n) => *n == 0.0,
            Value::Err => true,
            Value::Obj(r) => match heap.get(*r) {
                Obj::String(s) => s.bytes.is_empty(),
                Obj::List(l) => l.items.is_empty(),
                Obj::Map(m) => m.table.count() == 0,
                _ => false,
            },
        }
    }

    pub fn is_truthy(&self, heap: &Heap) -> bool {
        !self.is_falsy(heap)
    }

    /// Same-tag required; `Obj` equality is identity (handle equality),
    /// immediate variants compare structurally.
    pub fn values_equal(a: Value, b: Value) -> bool {
        match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Null, Value::Null) => true,
            (Value::Num(x), Value::Num(y)) => x == y,
            (Value::Obj(x), Value::Obj(y)) => x == y,
            (Value::Err, Value::Err) => true,
            _ => false,
        }
    }

    /// Canonical textual form for `print`/coercion. Numbers use `%.14g`
    /// style formatting; lists/maps recurse with double-quoted strings.
    pub fn to_display_string(&self, heap: &Heap) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::Num(n) => format_number(*n),
            Value::Err => "<error>".to_string(),
            Value::Obj(r) => obj_to_display_string(*r, heap, false),
        }
    }
}

/// Mimics C's `%.14g`: shortest representation at 14 significant digits,
/// trailing zeros trimmed, integral floats printed without a decimal point.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if n == n.trunc() && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let s = format!("{:.14e}", n);
    // Fall back to a reasonably short fixed representation; `{}` already
    // produces the shortest round-trippable form for normal floats.
    let short = format!("{}", n);
    if short.parse::<f64>() == Ok(n) {
        short
    } else {
        s
    }
}

fn obj_to_display_string(r: ObjRef, heap: &Heap, quote_strings: bool) -> String {
    match heap.get(r) {
        Obj::String(s) => {
            let text = String::from_utf8_lossy(&s.bytes).into_owned();
            if quote_strings {
                format!("\"{}\"", text)
            } else {
                text
            }
        }
        Obj::Function(f) => match f.name {
            Some(n) => format!("<fn {}>", heap.get_string_bytes(n)),
            None => "<script>".to_string(),
        },
        Obj::Closure(c) => obj_to_display_string(c.function, heap, quote_strings),
        Obj::Upvalue(_) => "<upvalue>".to_string(),
        Obj::Class(c) => format!("<class {}>", heap.get_string_bytes(c.name)),
        Obj::Instance(i) => {
            let cname = match heap.get(i.class) {
                Obj::Class(c) => heap.get_string_bytes(c.name),
                _ => "?".to_string(),
            };
            format!("<{} instance>", cname)
        }
        Obj::BoundMethod(b) => obj_to_display_string(b.method, heap, quote_strings),
        Obj::List(l) => {
            let parts: Vec<String> =
                l.items.iter().map(|v| match v {
                    Value::Obj(inner) => obj_to_display_string(*inner, heap, true),
                    other => other.to_display_string(heap),
                }).collect();
            format!("[{}]", parts.join(", "))
        }
        Obj::Map(m) => {
            let mut parts = Vec::new();
            for (k, v) in m.table.iter() {
                let key_str = heap.get_string_bytes(k);
                let val_str = match v {
                    Value::Obj(inner) => obj_to_display_string(inner, heap, true),
                    other => other.to_display_string(heap),
                };
                parts.push(format!("\"{}\": {}", key_str, val_str));
            }
            format!("{{{}}}", parts.join(", "))
        }
        Obj::Native(n) => format!("<native {}>", n.name),
    }
}

#[derive(Debug, Clone)]
pub struct ObjString {
    pub bytes: Vec<u8>,
    pub hash: u32,
}

/// FNV-1a, computed once per string at interning time.
pub fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[derive(Debug, Clone)]
pub struct ObjFunction {
    pub arity: u8,
    pub upvalue_count: u8,
    pub name: Option<ObjRef>,
    pub chunk: Chunk,
}

/// Open while `slot` is a still-live VM stack index; closed once the value
/// has been copied out (the slot may be reused or popped after closing).
#[derive(Debug, Clone)]
pub enum ObjUpvalue {
    Open { slot: usize },
    Closed(Value),
}

#[derive(Debug, Clone)]
pub struct ObjClosure {
    pub function: ObjRef,
    pub upvalues: Vec<ObjRef>,
}

#[derive(Debug, Clone)]
pub struct ObjClass {
    pub name: ObjRef,
    pub methods: FalconMap,
}

#[derive(Debug, Clone)]
pub struct ObjInstance {
    pub class: ObjRef,
    pub fields: FalconMap,
}

#[derive(Debug, Clone)]
pub struct ObjBoundMethod {
    pub receiver: Value,
    pub method: ObjRef,
}

#[derive(Debug, Clone, Default)]
pub struct ObjList {
    pub items: Vec<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct ObjMap {
    pub table: FalconMap,
}

#[derive(Clone)]
pub struct ObjNative {
    pub name: String,
    pub function: NativeFn,
}

impl std::fmt::Debug for ObjNative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjNative({})", self.name)
    }
}

/// Closed tagged variant over every heap object kind (spec.md §9:
/// "polymorphism over object kinds ... modeled as a closed tagged variant").
#[derive(Debug, Clone)]
pub enum Obj {
    String(ObjString),
    Function(ObjFunction),
    Upvalue(ObjUpvalue),
    Closure(ObjClosure),
    Class(ObjClass),
    Instance(ObjInstance),
    BoundMethod(ObjBoundMethod),
    List(ObjList),
    Map(ObjMap),
    Native(ObjNative),
}

impl Obj {
    pub fn type_name(&self) -> &'static str {
        match self {
            Obj::String(_) => "string",
            Obj::Function(_) => "function",
            Obj::Upvalue(_) => "upvalue",
            Obj::Closure(_) => "closure",
            Obj::Class(_) => "class",
            Obj::Instance(_) => "instance",
            Obj::BoundMethod(_) => "bound method",
            Obj::List(_) => "list",
            Obj::Map(_) => "map",
            Obj::Native(_) => "native function",
        }
    }

    /// Rough accounting for the GC's allocation threshold; doesn't need to
    /// be exact, just proportional to real footprint.
    pub fn approx_size(&self) -> usize {
        let base = std::mem::size_of::<Obj>();
        base + match self {
            Obj::String(s) => s.bytes.len(),
            Obj::List(l) => l.items.len() * std::mem::size_of::<Value>(),
            Obj::Map(m) => m.table.capacity() * std::mem::size_of::<(Option<ObjRef>, Value)>(),
            Obj::Closure(c) => c.upvalues.len() * std::mem::size_of::<ObjRef>(),
            Obj::Function(f) => f.chunk.code.len() + f.chunk.constants.len() * std::mem::size_of::<Value>(),
            _ => 0,
        }
    }
}

struct HeapSlot {
    obj: Obj,
    marked: bool,
}

/// A single arena of object records indexed by `ObjRef`; references between
/// objects are handles, not owning pointers, which keeps mark-and-sweep a
/// plain reachability walk with no borrow-checker fights (spec.md §9).
pub struct Heap {
    slots: Vec<Option<HeapSlot>>,
    free: Vec<u32>,
    pub bytes_allocated: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self { slots: Vec::new(), free: Vec::new(), bytes_allocated: 0 }
    }

    /// Inserts an already-built object into the arena; does not itself
    /// consult or trigger GC (callers that should trigger a collection call
    /// through `Vm::allocate` instead, see vm.rs).
    pub fn alloc(&mut self, obj: Obj) -> ObjRef {
        self.bytes_allocated += obj.approx_size();
        let slot = HeapSlot { obj, marked: false };
        if let Some(idx) = self.free.pop() {
            self.slots[idx as usize] = Some(slot);
            ObjRef(idx)
        } else {
            self.slots.push(Some(slot));
            ObjRef((self.slots.len() - 1) as u32)
        }
    }

    pub fn get(&self, r: ObjRef) -> &Obj {
        &self.slots[r.0 as usize].as_ref().expect("dangling ObjRef").obj
    }

    pub fn get_mut(&mut self, r: ObjRef) -> &mut Obj {
        &mut self.slots[r.0 as usize].as_mut().expect("dangling ObjRef").obj
    }

    pub fn get_string_bytes(&self, r: ObjRef) -> String {
        match self.get(r) {
            Obj::String(s) => String::from_utf8_lossy(&s.bytes).into_owned(),
            other => panic!("expected string object, found {}", other.type_name()),
        }
    }

    pub fn get_string(&self, r: ObjRef) -> &ObjString {
        match self.get(r) {
            Obj::String(s) => s,
            other => panic!("expected string object, found {}", other.type_name()),
        }
    }

    pub fn mark(&mut self, r: ObjRef) -> bool {
        let slot = self.slots[r.0 as usize].as_mut().expect("dangling ObjRef");
        let was_marked = slot.marked;
        slot.marked = true;
        !was_marked
    }

    pub fn is_marked(&self, r: ObjRef) -> bool {
        self.slots[r.0 as usize].as_ref().map(|s| s.marked).unwrap_or(false)
    }

    pub fn clear_mark(&mut self, r: ObjRef) {
        if let Some(slot) = self.slots[r.0 as usize].as_mut() {
            slot.marked = false;
        }
    }

    /// Iterates every live handle currently in the arena (the "heap list"
    /// of spec.md §3, realized as arena occupancy rather than an intrusive
    /// linked list).
    pub fn live_refs(&self) -> impl Iterator<Item = ObjRef> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| ObjRef(i as u32)))
    }

    pub fn free(&mut self, r: ObjRef) {
        if let Some(slot) = self.slots[r.0 as usize].take() {
            self.bytes_allocated = self.bytes_allocated.saturating_sub(slot.obj.approx_size());
            self.free.push(r.0);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_is_total() {
        let heap = Heap::new();
        for v in [Value::Null, Value::Bool(true), Value::Bool(false), Value::Num(0.0), Value::Num(1.0)] {
            assert!(v.is_falsy(&heap) != v.is_truthy(&heap));
        }
    }

    #[test]
    fn object_equality_is_identity() {
        let mut heap = Heap::new();
        let a = heap.alloc(Obj::String(ObjString { bytes: b"x".to_vec(), hash: fnv1a(b"x") }));
        let b = heap.alloc(Obj::String(ObjString { bytes: b"x".to_vec(), hash: fnv1a(b"x") }));
        assert!(!Value::values_equal(Value::Obj(a), Value::Obj(b)));
        assert!(Value::values_equal(Value::Obj(a), Value::Obj(a)));
    }

    #[test]
    fn format_number_strips_trailing_zero_for_integers() {
        assert_eq!(format_number(55.0), "55");
        assert_eq!(format_number(0.5), "0.5");
    }

    #[test]
    fn heap_reuses_freed_slots() {
        let mut heap = Heap::new();
        let a = heap.alloc(Obj::String(ObjString { bytes: b"a".to_vec(), hash: 0 }));
        heap.free(a);
        let b = heap.alloc(Obj::String(ObjString { bytes: b"b".to_vec(), hash: 0 }));
        assert_eq!(a, b);
    }
}
