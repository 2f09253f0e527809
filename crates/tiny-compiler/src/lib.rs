//! Single-pass compiler from TINY source to WebAssembly text.
//!
//! ```
//! let wat = tiny_compiler::compile("VAR X PROGRAM P BEGIN X = 6 * 7 END .").unwrap();
//! assert!(wat.contains("(func $main (export \"main\") (result i32)"));
//! ```

mod compiler;

pub use compiler::{
    compile, compile_with_options, CompileError, CompileOptions, Compiler, ErrorKind, ValueType,
};
