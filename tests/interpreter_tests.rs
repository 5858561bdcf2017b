// File: tests/interpreter_tests.rs
//
// End-to-end scenarios run through the public `falcon::interpret` entry
// point, plus a handful of compile-error and runtime-error checks.

use falcon::errors::InterpretResult;
use falcon::vm::Vm;

fn run(source: &str) -> InterpretResult {
    let mut vm = Vm::new();
    falcon::interpret(&mut vm, source.as_bytes())
}

fn expect_ok(source: &str) {
    match run(source) {
        InterpretResult::Ok => {}
        InterpretResult::CompileError(errs) => panic!("unexpected compile error(s): {errs:?}"),
        InterpretResult::RuntimeError(e) => panic!("unexpected runtime error: {e}"),
    }
}

#[test]
fn fibonacci_recursion() {
    expect_ok("fn fib(n) { if n < 2 { return n; } return fib(n-1) + fib(n-2); } print(fib(10));");
}

#[test]
fn lexical_capture_across_scopes() {
    expect_ok(
        "fn counter() { var n = 0; fn inc() { n = n + 1; return n; } return inc; } \
         var c = counter(); print(c()); print(c()); print(c());",
    );
}

#[test]
fn class_inheritance_and_method_override() {
    expect_ok(
        "class A { greet() { return \"A\"; } } \
         class B < A { greet() { return \"B\"; } } \
         class C < A { } \
         print(A().greet()); print(B().greet()); print(C().greet());",
    );
}

#[test]
fn list_subscript_wraparound_and_mutation() {
    expect_ok("var xs = [10, 20, 30]; xs[-1] = 99; print(xs[-1]); print(xs[0]); print(len(xs));");
}

#[test]
fn map_defaulting_and_switch() {
    expect_ok(
        "var m = {\"x\": 1}; switch m[\"x\"] { when 1 -> { print(\"one\"); } else -> { print(\"other\"); } } \
         print(m[\"missing\"]);",
    );
}

#[test]
fn runtime_error_carries_a_stack_trace() {
    let result = run("fn a() { return b(); } fn b() { return 1 / 0; } a();");
    match result {
        InterpretResult::RuntimeError(e) => {
            assert!(e.message.contains("non-zero"));
            let names: Vec<&str> = e.trace.iter().filter_map(|f| f.function_name.as_deref()).collect();
            assert!(names.contains(&"b"));
            assert!(names.contains(&"a"));
        }
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

#[test]
fn compile_error_is_reported_without_running() {
    match run("var x = ;") {
        InterpretResult::CompileError(errs) => assert!(!errs.is_empty()),
        other => panic!("expected a compile error, got {other:?}"),
    }
}

#[test]
fn while_loop_break_and_next() {
    expect_ok(
        "var i = 0; var sum = 0; \
         while i < 10 { \
           i = i + 1; \
           if i == 5 { next; } \
           if i == 8 { break; } \
           sum = sum + i; \
         } \
         print(sum);",
    );
}

#[test]
fn for_loop_with_comma_clauses() {
    expect_ok("var total = 0; for (var i = 0, i < 5, i = i + 1) { total = total + i; } print(total);");
}

#[test]
fn ternary_expression_value() {
    expect_ok("var x = 5; print(x > 0 ? \"positive\" : \"non-positive\");");
}

#[test]
fn closures_over_loop_variables_are_independent() {
    expect_ok(
        "var first = null; var second = null; \
         for (var i = 0, i < 3, i = i + 1) { \
           fn make() { var captured = i; fn get() { return captured; } return get; } \
           if i == 0 { first = make(); } \
           if i == 1 { second = make(); } \
         } \
         print(first()); print(second());",
    );
}

#[test]
fn compound_assignment_operators() {
    expect_ok(
        "var x = 10; x += 5; x -= 2; x *= 2; x /= 2; x %= 5; print(x); \
         var g = 2; g ^= 3; print(g);",
    );
}

#[test]
fn string_subscript_reads_a_byte_but_rejects_assignment() {
    expect_ok("var s = \"hello\"; print(s[0]); print(s[-1]);");
    match run("var s = \"hello\"; s[0] = \"y\";") {
        InterpretResult::RuntimeError(e) => assert!(e.message.contains("string index")),
        other => panic!("expected a runtime error, got {other:?}"),
    }
}
