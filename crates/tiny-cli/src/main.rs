use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use log::{debug, info};

use tiny_compiler::CompileOptions;
use tiny_lexer::Lexer;

/// TINY compiler & runtime
#[derive(Parser)]
#[command(name = "tiny")]
#[command(version)]
#[command(about = "Compile TINY programs to WebAssembly text and run them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program to a .wat file
    Build {
        /// The source file to compile
        file: PathBuf,

        /// Output file (defaults to <input>.wat)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Compile and execute a program, printing its result
    Run {
        /// The source file to run
        file: PathBuf,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Check a program for errors without writing anything
    Check {
        /// The source file to check
        file: PathBuf,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Show tokens from the lexer (for debugging)
    Tokens {
        /// The source file to tokenize
        file: PathBuf,
    },
}

#[derive(Args)]
struct OptionArgs {
    /// Pages of linear memory reserved for the auxiliary stack
    #[arg(long, default_value_t = 1)]
    memory_pages: u32,

    /// Export name of the entry point
    #[arg(long, default_value = "main")]
    entry_point: String,

    /// Global variable returned by the entry point
    #[arg(long, default_value = "X")]
    result: String,
}

impl From<OptionArgs> for CompileOptions {
    fn from(args: OptionArgs) -> Self {
        CompileOptions {
            memory_pages: args.memory_pages,
            entry_point: args.entry_point,
            result_variable: args.result,
        }
    }
}

fn read_source(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Error reading file '{}': {}", path.display(), e))
}

fn compile(path: &Path, options: &CompileOptions) -> Result<String, String> {
    let source = read_source(path)?;
    info!("compiling {} ({} bytes)", path.display(), source.len());
    let wat = tiny_compiler::compile_with_options(&source, options).map_err(|e| e.to_string())?;
    debug!("emitted {} lines of module text", wat.lines().count());
    Ok(wat)
}

fn cmd_build(path: &Path, output: Option<PathBuf>, options: &CompileOptions) -> Result<(), String> {
    let wat = compile(path, options)?;
    let output_path = output.unwrap_or_else(|| path.with_extension("wat"));
    fs::write(&output_path, &wat)
        .map_err(|e| format!("Error writing '{}': {}", output_path.display(), e))?;
    info!("wrote {}", output_path.display());
    println!(
        "Compiled {} -> {} ({} bytes)",
        path.display(),
        output_path.display(),
        wat.len()
    );
    Ok(())
}

fn cmd_run(path: &Path, options: &CompileOptions) -> Result<(), String> {
    let wat = compile(path, options)?;
    let result = execute_wat(&wat, &options.entry_point)?;
    println!("{}", result);
    Ok(())
}

fn cmd_check(path: &Path, options: &CompileOptions) -> Result<(), String> {
    let wat = compile(path, options)?;
    wat::parse_str(&wat).map_err(|e| format!("Invalid module: {}", e))?;
    println!("{}: ok", path.display());
    Ok(())
}

fn cmd_tokens(path: &Path) -> Result<(), String> {
    let source = read_source(path)?;
    let tokens = Lexer::new(&source)
        .and_then(Lexer::tokenize)
        .map_err(|e| e.to_string())?;
    for token in tokens {
        println!(
            "{:>4}:{:<4} {:<14} {}",
            token.span.line,
            token.span.column,
            token.token_type.describe(),
            token.value
        );
    }
    Ok(())
}

/// Host input: one integer per line of stdin, 0 when absent or malformed.
fn read_i32() -> i32 {
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok();
    let value = line.trim().parse::<i32>().unwrap_or(0);
    debug!("read_i32 -> {}", value);
    value
}

fn write_i32(value: i32) {
    debug!("write_i32 <- {}", value);
    println!("{}", value);
}

fn execute_wat(wat: &str, entry_point: &str) -> Result<i64, String> {
    use wasmtime::*;

    let bytes = wat::parse_str(wat).map_err(|e| format!("Invalid module text: {}", e))?;
    let engine = Engine::default();
    let module =
        Module::new(&engine, &bytes).map_err(|e| format!("Failed to load WASM module: {:#?}", e))?;
    let mut store = Store::new(&engine, ());
    let mut linker = Linker::new(&engine);

    linker
        .func_wrap("", "read_i32", |_caller: Caller<'_, ()>| -> i32 { read_i32() })
        .map_err(|e| format!("Failed to register read_i32: {}", e))?;
    linker
        .func_wrap("", "write_i32", |_caller: Caller<'_, ()>, value: i32| {
            write_i32(value)
        })
        .map_err(|e| format!("Failed to register write_i32: {}", e))?;

    let instance = linker
        .instantiate(&mut store, &module)
        .map_err(|e| format!("Failed to instantiate module: {}", e))?;
    let entry = instance
        .get_func(&mut store, entry_point)
        .ok_or_else(|| format!("No {} function found", entry_point))?;

    info!("calling {}", entry_point);
    let mut results = [Val::I32(0)];
    entry
        .call(&mut store, &[], &mut results)
        .map_err(|e| format!("Execution failed: {}", e))?;

    match &results[0] {
        Val::I32(v) => Ok(i64::from(*v)),
        Val::I64(v) => Ok(*v),
        other => Err(format!("Unexpected result {:?}", other)),
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build { file, output, options } => cmd_build(&file, output, &options.into()),
        Commands::Run { file, options } => cmd_run(&file, &options.into()),
        Commands::Check { file, options } => cmd_check(&file, &options.into()),
        Commands::Tokens { file } => cmd_tokens(&file),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}
