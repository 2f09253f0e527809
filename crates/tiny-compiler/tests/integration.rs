use std::collections::VecDeque;

use tiny_compiler::{compile, compile_with_options, CompileError, CompileOptions, ErrorKind};
use wasmtime::{Caller, Engine, Linker, Module, Store, Val};

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

/// Host side of `read_i32` / `write_i32`.
struct HostIo {
    input: VecDeque<i32>,
    output: Vec<i32>,
}

struct Outcome {
    result: i64,
    output: Vec<i32>,
    stack_pointer: i32,
}

fn execute(wat: &str, input: &[i32]) -> Outcome {
    // Export the stack pointer so its final value can be checked.
    let wat = wat.replace(
        "(global $__sp (mut i32)",
        "(global $__sp (export \"__sp\") (mut i32)",
    );
    let bytes = wat::parse_str(&wat).expect("invalid wat");
    wasmparser::Validator::new()
        .validate_all(&bytes)
        .expect("invalid wasm");

    let engine = Engine::default();
    let module = Module::new(&engine, &bytes).expect("failed to load module");
    let io = HostIo {
        input: input.iter().copied().collect(),
        output: Vec::new(),
    };
    let mut store = Store::new(&engine, io);
    let mut linker = Linker::new(&engine);
    linker
        .func_wrap("", "read_i32", |mut caller: Caller<'_, HostIo>| -> i32 {
            caller.data_mut().input.pop_front().unwrap_or(0)
        })
        .unwrap();
    linker
        .func_wrap("", "write_i32", |mut caller: Caller<'_, HostIo>, value: i32| {
            caller.data_mut().output.push(value);
        })
        .unwrap();
    let instance = linker
        .instantiate(&mut store, &module)
        .expect("failed to instantiate");

    let main = instance.get_func(&mut store, "main").expect("no main export");
    let mut results = [Val::I32(0)];
    main.call(&mut store, &[], &mut results).expect("execution trapped");
    let result = match &results[0] {
        Val::I32(v) => i64::from(*v),
        Val::I64(v) => *v,
        other => panic!("unexpected result {other:?}"),
    };
    let stack_pointer = instance
        .get_global(&mut store, "__sp")
        .expect("no __sp export")
        .get(&mut store)
        .i32()
        .expect("__sp is not i32");

    Outcome {
        result,
        output: store.into_data().output,
        stack_pointer,
    }
}

fn run_io(src: &str, input: &[i32]) -> Outcome {
    let wat = compile(src).expect("compile failed");
    execute(&wat, input)
}

fn run(src: &str) -> i64 {
    let outcome = run_io(src, &[]);
    assert_eq!(outcome.stack_pointer, 65536, "auxiliary stack not balanced");
    outcome.result
}

fn compile_err(src: &str) -> CompileError {
    compile(src).expect_err("expected a compile error")
}

// ═══════════════════════════════════════════════════════════════════
// Reference scenarios
// ═══════════════════════════════════════════════════════════════════

#[test]
fn counting_loop() {
    let src = "VAR X=0,Y=5 PROGRAM P BEGIN WHILE Y>0 X=X+2;Y=Y-1 END END.";
    assert_eq!(run(src), 10);
}

#[test]
fn by_reference_argument() {
    let src = "
        VAR X = 4, Y = 9
        PROCEDURE ADDTOX(REF A)
            X = X + A
        END
        PROGRAM P BEGIN ADDTOX(Y) END .";
    assert_eq!(run(src), 13);
}

#[test]
fn comparisons_as_integers() {
    assert_eq!(run("VAR X PROGRAM P BEGIN X = 5 = 2 END ."), 0);
    assert_eq!(run("VAR X PROGRAM P BEGIN X = 2 < 3 END ."), 1);
}

#[test]
fn narrow_value_kept_wide() {
    let src = "
        VAR A = 20
        VAR QUAD C = 0, X
        PROGRAM P BEGIN
            C = A
            C = C * 1000000000
            X = C + 1
        END .";
    assert_eq!(run(src), 20_000_000_001);
}

#[test]
fn missing_argument() {
    let src = "
        VAR X
        PROCEDURE TWO(A, B) X = A + B END
        PROGRAM P BEGIN TWO(1) END .";
    let err = compile_err(src);
    assert_eq!(err.kind(), ErrorKind::Arity);
    assert!(err.to_string().contains("expects 2 parameters, got 1"), "{err}");
}

// ═══════════════════════════════════════════════════════════════════
// Expressions and types
// ═══════════════════════════════════════════════════════════════════

#[test]
fn operator_precedence() {
    assert_eq!(run("VAR X PROGRAM P BEGIN X = 2 + 3 * 4 - 10 / 5 END ."), 12);
    assert_eq!(run("VAR X PROGRAM P BEGIN X = (2 + 3) * 4 END ."), 20);
    assert_eq!(run("VAR X PROGRAM P BEGIN X = -(2 + 3) * 4 END ."), -20);
    assert_eq!(run("VAR X PROGRAM P BEGIN X = +7 - -3 END ."), 10);
}

#[test]
fn boolean_operators() {
    assert_eq!(run("VAR X PROGRAM P BEGIN X = 6 & 3 END ."), 2);
    assert_eq!(run("VAR X PROGRAM P BEGIN X = 6 | 3 END ."), 7);
    assert_eq!(run("VAR X PROGRAM P BEGIN X = 6 ~ 3 END ."), 5);
    assert_eq!(run("VAR X PROGRAM P BEGIN X = !0 END ."), 1);
    assert_eq!(run("VAR X PROGRAM P BEGIN X = (1 < 2) & (3 >= 3) END ."), 1);
    assert_eq!(run("VAR X PROGRAM P BEGIN X = 1 <> 1 END ."), 0);
}

#[test]
fn promotion_is_symmetric() {
    let narrow_first = "VAR A = 7 VAR QUAD B = 3000000000, X PROGRAM P BEGIN X = A + B END .";
    let wide_first = "VAR A = 7 VAR QUAD B = 3000000000, X PROGRAM P BEGIN X = B + A END .";
    assert_eq!(run(narrow_first), 3_000_000_007);
    assert_eq!(run(wide_first), 3_000_000_007);

    let narrow_sub = "VAR A = 7 VAR QUAD B = 3000000000, X PROGRAM P BEGIN X = A - B END .";
    let wide_sub = "VAR A = 7 VAR QUAD B = 3000000000, X PROGRAM P BEGIN X = B - A END .";
    assert_eq!(run(narrow_sub), -2_999_999_993);
    assert_eq!(run(wide_sub), 2_999_999_993);
}

#[test]
fn negative_narrow_values_sign_extend() {
    let src = "VAR A = -5 VAR QUAD X PROGRAM P BEGIN X = A * 1000000000000 END .";
    assert_eq!(run(src), -5_000_000_000_000);
}

#[test]
fn wide_comparison_result() {
    let src = "VAR QUAD B = 5000000000, X PROGRAM P BEGIN X = B > 4999999999 END .";
    assert_eq!(run(src), 1);
}

#[test]
fn narrowing_assignment_wraps() {
    let src = "VAR X VAR QUAD B = 4294967297 PROGRAM P BEGIN X = B END .";
    assert_eq!(run(src), 1);
}

// ═══════════════════════════════════════════════════════════════════
// Control flow
// ═══════════════════════════════════════════════════════════════════

#[test]
fn if_else() {
    let src = "
        VAR X, Y = 3
        PROGRAM P BEGIN
            IF Y > 2 X = 1 ELSE X = 2 END
            IF Y > 5 X = X + 10 ELSE X = X + 20 END
        END .";
    assert_eq!(run(src), 21);
}

#[test]
fn break_leaves_innermost_loop() {
    let src = "
        VAR X, I, J
        PROGRAM P BEGIN
            WHILE I < 3
                J = 0
                WHILE 1
                    IF J = 2 BREAK END
                    J = J + 1
                    X = X + 1
                END
                I = I + 1
            END
        END .";
    assert_eq!(run(src), 6);
}

#[test]
fn break_from_outer_loop() {
    let src = "
        VAR X
        PROGRAM P BEGIN
            WHILE 1
                X = X + 1
                IF X = 7 BREAK END
            END
        END .";
    assert_eq!(run(src), 7);
}

#[test]
fn wide_loop_condition() {
    let src = "
        VAR X
        VAR QUAD N = 4
        PROGRAM P BEGIN
            WHILE N
                X = X + 1
                N = N - 1
            END
        END .";
    assert_eq!(run(src), 4);
}

#[test]
fn read_and_write() {
    let src = "
        VAR X, A
        VAR QUAD B
        PROGRAM P BEGIN
            READ(A, B)
            WRITE(A + 1, B * 2)
            X = A + B
        END .";
    let outcome = run_io(src, &[40, -3]);
    assert_eq!(outcome.output, vec![41, -6]);
    assert_eq!(outcome.result, 37);
}

// ═══════════════════════════════════════════════════════════════════
// Procedures and scopes
// ═══════════════════════════════════════════════════════════════════

#[test]
fn local_shadows_global() {
    let src = "
        VAR X, Y = 1
        PROCEDURE SHADOW()
            VAR Y = 100
            Y = Y + 1
            X = Y
        END
        PROGRAM P BEGIN
            SHADOW()
            X = X + Y
        END .";
    assert_eq!(run(src), 102);
}

#[test]
fn parameter_shadows_global() {
    let src = "
        VAR X, N = 5
        PROCEDURE SET(N) X = N END
        PROGRAM P BEGIN SET(9) X = X + N END .";
    assert_eq!(run(src), 14);
}

#[test]
fn by_reference_mutates_local_and_global() {
    let src = "
        VAR X
        PROCEDURE BUMP(REF A) A = A + 1 END
        PROCEDURE USE()
            VAR L = 10
            BUMP(L)
            BUMP(L)
            X = L
        END
        PROGRAM P BEGIN
            USE()
            BUMP(X)
        END .";
    assert_eq!(run(src), 13);
}

#[test]
fn reference_forwarded_through_procedures() {
    let src = "
        VAR X = 1
        PROCEDURE INNER(REF A) A = A * 10 END
        PROCEDURE OUTER(REF B) INNER(B) B = B + 1 END
        PROGRAM P BEGIN OUTER(X) END .";
    assert_eq!(run(src), 11);
}

#[test]
fn mixed_width_references() {
    let src = "
        VAR A = 1
        VAR QUAD B = 5000000000, X
        PROCEDURE SWAPADD(REF L, REF QUAD Q, K)
            L = L + K
            Q = Q + K
        END
        PROGRAM P BEGIN
            SWAPADD(A, B, 2)
            X = A + B
        END .";
    assert_eq!(run(src), 5_000_000_005);
}

#[test]
fn narrow_variable_through_wide_reference() {
    let src = "
        VAR X = 7
        PROCEDURE WIDEN(REF QUAD Q) Q = Q * 3 END
        PROGRAM P BEGIN WIDEN(X) END .";
    assert_eq!(run(src), 21);
}

#[test]
fn same_variable_passed_twice() {
    // Copies are written back newest first, so the first argument wins.
    let src = "
        VAR X = 1
        PROCEDURE TWO(REF A, REF B)
            A = 10
            B = 20
        END
        PROGRAM P BEGIN TWO(X, X) END .";
    assert_eq!(run(src), 10);
}

#[test]
fn forward_call() {
    let src = "
        VAR X
        PROCEDURE FIRST() SECOND(5) END
        PROCEDURE SECOND(N) X = N * 2 END
        PROGRAM P BEGIN FIRST() END .";
    assert_eq!(run(src), 10);
}

#[test]
fn typed_value_parameters() {
    let src = "
        VAR QUAD X
        PROCEDURE SCALE(QUAD V, F) X = V * F END
        PROGRAM P BEGIN SCALE(3000000000, 3) END .";
    assert_eq!(run(src), 9_000_000_000);
}

#[test]
fn stack_balanced_across_many_calls() {
    let src = "
        VAR X, I
        PROCEDURE BUMP(REF A) A = A + 1 END
        PROGRAM P BEGIN
            WHILE I < 100000
                BUMP(X)
                I = I + 1
            END
        END .";
    assert_eq!(run(src), 100_000);
}

#[test]
fn recursion() {
    let src = "
        VAR X = 1, N = 5
        PROCEDURE FACT(K)
            IF K > 1
                X = X * K
                FACT(K - 1)
            END
        END
        PROGRAM P BEGIN FACT(N) END .";
    assert_eq!(run(src), 120);
}

// ═══════════════════════════════════════════════════════════════════
// Surface details
// ═══════════════════════════════════════════════════════════════════

#[test]
fn comments_and_case_insensitivity() {
    let src = "
        { totals { nested } }
        var x = 1
        program p begin
            { add one }
            X = x + 1;
        end.";
    assert_eq!(run(src), 2);
}

#[test]
fn custom_entry_point_and_result() {
    let options = CompileOptions {
        memory_pages: 1,
        entry_point: "main".to_string(),
        result_variable: "TOTAL".to_string(),
    };
    let wat = compile_with_options(
        "VAR TOTAL VAR X PROGRAM P BEGIN TOTAL = 33 END .",
        &options,
    )
    .unwrap();
    let outcome = execute(&wat, &[]);
    assert_eq!(outcome.result, 33);
}

#[test]
fn larger_stack_region() {
    let options = CompileOptions {
        memory_pages: 3,
        ..CompileOptions::default()
    };
    let src = "
        VAR X
        PROCEDURE BUMP(REF A) A = A + 1 END
        PROGRAM P BEGIN BUMP(X) END .";
    let wat = compile_with_options(src, &options).unwrap();
    let outcome = execute(&wat, &[]);
    assert_eq!(outcome.result, 1);
    assert_eq!(outcome.stack_pointer, 3 * 65536);
}

#[test]
fn errors_carry_positions() {
    let err = compile_err("VAR X\nPROGRAM P BEGIN\n  X = Y\nEND .");
    assert_eq!(err.kind(), ErrorKind::NameResolution);
    let span = err.span().unwrap();
    assert_eq!((span.line, span.column), (3, 7));
}
