use tiny_lexer::{is_keyword, Lexer, Span, Token, TokenType};

mod compile_bool;
mod compile_expr;
mod compile_proc;
mod compile_stmt;
mod emitter;
mod error;
mod prescan;
mod symbols;
mod types;

pub use error::{CompileError, ErrorKind};
pub use types::ValueType;

use compile_proc::parse_parameters;
use emitter::Emitter;
use error::{expected, reference_err, syntax_err, type_err, wrong_kind};
use symbols::{Entry, Param, SymbolError, SymbolTable};
use types::{parse_literal, BinOp};

/// Scratch local present in every function, used to reorder operands
/// while widening.
pub(crate) const SCRATCH_LOCAL: &str = "$__tmp";
/// Global holding the auxiliary stack pointer.
pub(crate) const STACK_POINTER: &str = "$__sp";

const PAGE_SIZE: u32 = 65536;
const MAX_MEMORY_PAGES: u32 = 32767;

/// Knobs for the emitted module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Pages of linear memory reserved for the auxiliary stack.
    pub memory_pages: u32,
    /// Export name of the entry-point function.
    pub entry_point: String,
    /// Global whose final value the entry point returns.
    pub result_variable: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            memory_pages: 1,
            entry_point: "main".to_string(),
            result_variable: "X".to_string(),
        }
    }
}

impl CompileOptions {
    /// Initial value of the auxiliary stack pointer.
    pub fn stack_top(&self) -> u32 {
        self.memory_pages * PAGE_SIZE
    }

    fn validate(&self) -> Result<(), CompileError> {
        if self.memory_pages == 0 || self.memory_pages > MAX_MEMORY_PAGES {
            return Err(CompileError::Options {
                message: format!(
                    "memory pages must be between 1 and {MAX_MEMORY_PAGES}, got {}",
                    self.memory_pages
                ),
            });
        }
        if self.entry_point.is_empty()
            || self.entry_point.contains(['"', '\\'])
            || self.entry_point.chars().any(char::is_control)
        {
            return Err(CompileError::Options {
                message: format!("invalid entry point name {:?}", self.entry_point),
            });
        }
        let mut chars = self.result_variable.chars();
        let valid_name = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric());
        if !valid_name {
            return Err(CompileError::Options {
                message: format!("invalid result variable {:?}", self.result_variable),
            });
        }
        Ok(())
    }
}

/// Compile TINY source to WebAssembly text with default options.
pub fn compile(source: &str) -> Result<String, CompileError> {
    compile_with_options(source, &CompileOptions::default())
}

pub fn compile_with_options(
    source: &str,
    options: &CompileOptions,
) -> Result<String, CompileError> {
    Compiler::new(source, options.clone())?.compile()
}

/// Labels of one `WHILE` loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoopLabels {
    pub(crate) continue_label: String,
    pub(crate) break_label: String,
}

/// A variable as an assignable, readable storage location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Place {
    Global { name: String, ty: ValueType },
    Local { name: String, ty: ValueType },
    /// Local holding the address of a cell of type `ty`.
    RefLocal { name: String, ty: ValueType },
}

impl Place {
    pub(crate) fn ty(&self) -> ValueType {
        match self {
            Place::Global { ty, .. } | Place::Local { ty, .. } | Place::RefLocal { ty, .. } => *ty,
        }
    }

    pub(crate) fn name(&self) -> &str {
        match self {
            Place::Global { name, .. }
            | Place::Local { name, .. }
            | Place::RefLocal { name, .. } => name,
        }
    }
}

/// One parsed `name [= literal]` item of a `VAR` declaration.
struct VarItem {
    name: String,
    span: Span,
    ty: ValueType,
    init: Option<i64>,
}

/// Single-pass compiler: scanning, name resolution and emission are
/// interleaved, driven by the recursive-descent grammar.
pub struct Compiler {
    lexer: Lexer,
    symbols: SymbolTable,
    out: Emitter,
    loop_count: u32,
    options: CompileOptions,
}

impl Compiler {
    /// Set up a compilation of `source`. Procedure signatures are collected
    /// here so calls may precede the declarations they refer to.
    pub fn new(source: &str, options: CompileOptions) -> Result<Self, CompileError> {
        options.validate()?;
        let mut compiler = Self {
            lexer: Lexer::new(source)?,
            symbols: SymbolTable::new(),
            out: Emitter::new(),
            loop_count: 0,
            options,
        };
        compiler.prescan(source)?;
        Ok(compiler)
    }

    /// Compile the whole source and return the module text.
    pub fn compile(mut self) -> Result<String, CompileError> {
        self.module_prolog();
        self.top_decls()?;
        Ok(self.out.finish())
    }

    // ── Token navigation ─────────────────────────────────────

    fn token(&self) -> &Token {
        self.lexer.current()
    }

    fn span(&self) -> Span {
        self.lexer.current().span
    }

    fn at(&self, token_type: TokenType) -> bool {
        self.token().token_type == token_type
    }

    fn at_keyword(&self, word: &str) -> bool {
        self.token().is_name(word)
    }

    fn advance(&mut self) -> Result<(), CompileError> {
        self.lexer.advance()?;
        Ok(())
    }

    /// Consume a token of `token_type` and return its text.
    fn expect(&mut self, token_type: TokenType) -> Result<String, CompileError> {
        expect_token(&mut self.lexer, token_type)
    }

    fn expect_keyword(&mut self, word: &str) -> Result<(), CompileError> {
        expect_keyword(&mut self.lexer, word)
    }

    /// Statement separators are optional.
    fn skip_semicolon(&mut self) -> Result<(), CompileError> {
        if self.at(TokenType::Semicolon) {
            self.advance()?;
        }
        Ok(())
    }

    fn expected(&self, what: &str) -> CompileError {
        expected(what, self.token())
    }

    // ── Symbols ──────────────────────────────────────────────

    fn declare(&mut self, name: &str, entry: Entry, span: Span) -> Result<(), CompileError> {
        self.symbols
            .declare(name, entry)
            .map_err(|e| symbol_error(e, span))
    }

    fn resolve(&self, name: &str, span: Span) -> Result<Entry, CompileError> {
        self.symbols
            .resolve(name)
            .cloned()
            .map_err(|e| symbol_error(e, span))
    }

    /// Resolve `name` as a variable.
    fn place_of(&self, name: &str, span: Span) -> Result<Place, CompileError> {
        let name = name.to_string();
        match self.resolve(&name, span)? {
            Entry::Global { ty } => Ok(Place::Global { name, ty }),
            Entry::Local { ty, by_ref: false } => Ok(Place::Local { name, ty }),
            Entry::Local { ty, by_ref: true } => Ok(Place::RefLocal { name, ty }),
            Entry::Procedure { .. } => Err(wrong_kind(
                format!("procedure {name} cannot be used as a variable"),
                span,
            )),
        }
    }

    fn next_loop_labels(&mut self) -> LoopLabels {
        self.loop_count += 1;
        LoopLabels {
            continue_label: format!("$loop{}", self.loop_count),
            break_label: format!("$breakloop{}", self.loop_count),
        }
    }

    // ── Storage access ───────────────────────────────────────

    /// Push the value of `place`.
    fn load(&mut self, place: &Place) {
        match place {
            Place::Global { name, .. } => self.out.line(format!("global.get ${name}")),
            Place::Local { name, .. } => self.out.line(format!("local.get ${name}")),
            Place::RefLocal { name, ty } => {
                self.out.line(format!("local.get ${name}"));
                self.out.line(format!("{}.load", ty.wasm()));
            }
        }
    }

    /// Emitted before the value of an assignment: stores through an address
    /// need it underneath the value.
    fn store_prefix(&mut self, place: &Place) {
        if let Place::RefLocal { name, .. } = place {
            self.out.line(format!("local.get ${name}"));
        }
    }

    /// Store the value on top of the stack, of type `from`, into `place`.
    fn store(&mut self, place: &Place, from: ValueType) {
        self.convert(from, place.ty());
        match place {
            Place::Global { name, .. } => self.out.line(format!("global.set ${name}")),
            Place::Local { name, .. } => self.out.line(format!("local.set ${name}")),
            Place::RefLocal { ty, .. } => self.out.line(format!("{}.store", ty.wasm())),
        }
    }

    // ── Module ───────────────────────────────────────────────

    fn module_prolog(&mut self) {
        self.out.line(format!("(memory {})", self.options.memory_pages));
        self.out.line(";; Auxiliary stack pointer for by-reference arguments.");
        self.out.line(";; Grows downwards from the top of memory.");
        self.out.line(format!(
            "(global {STACK_POINTER} (mut i32) (i32.const {}))",
            self.options.stack_top()
        ));
    }

    // <top-level> ::= ( <data decl> | <procedure> | <program> )* '.'
    fn top_decls(&mut self) -> Result<(), CompileError> {
        let mut program_seen = false;
        while !self.at(TokenType::Dot) {
            if !self.at(TokenType::Name) {
                return Err(self.expected("a top-level declaration"));
            }
            let word = self.token().value.clone();
            match word.as_str() {
                "VAR" => self.global_decl()?,
                "PROCEDURE" => self.procedure()?,
                "PROGRAM" => {
                    if program_seen {
                        return Err(syntax_err("only one PROGRAM block is allowed", self.span()));
                    }
                    self.program()?;
                    program_seen = true;
                }
                _ => {
                    return Err(syntax_err(
                        format!("unrecognized keyword '{word}'"),
                        self.span(),
                    ));
                }
            }
            self.skip_semicolon()?;
        }
        if !program_seen {
            return Err(self.expected("'PROGRAM'"));
        }
        self.expect(TokenType::Dot)?;
        Ok(())
    }

    // <data decl> ::= 'VAR' [ <type> ] <var> ( ',' <var> )*
    // <var> ::= <ident> [ '=' [ '-' ] <number> ]
    fn var_decl(&mut self) -> Result<Vec<VarItem>, CompileError> {
        self.expect_keyword("VAR")?;
        let ty = self.optional_type()?;
        let mut items = Vec::new();
        loop {
            let (name, span) = declared_name(&mut self.lexer)?;
            let init = self.initializer(ty)?;
            items.push(VarItem { name, span, ty, init });
            if !self.at(TokenType::Comma) {
                break;
            }
            self.advance()?;
        }
        Ok(items)
    }

    fn optional_type(&mut self) -> Result<ValueType, CompileError> {
        if self.at(TokenType::Name) {
            if let Some(ty) = ValueType::from_keyword(&self.token().value) {
                self.advance()?;
                return Ok(ty);
            }
        }
        Ok(ValueType::Long)
    }

    fn initializer(&mut self, ty: ValueType) -> Result<Option<i64>, CompileError> {
        if !self.at(TokenType::Equal) {
            return Ok(None);
        }
        self.advance()?;
        let negative = self.at(TokenType::Sub);
        if negative {
            self.advance()?;
        }
        let span = self.span();
        let digits = self.expect(TokenType::Number)?;
        let value = parse_literal(&digits, negative).ok_or_else(|| CompileError::NumberOutOfRange {
            digits: digits.clone(),
            line: span.line,
            column: span.column,
        })?;
        if !ty.holds(value) {
            return Err(type_err(format!("initializer {value} does not fit in {ty}"), span));
        }
        Ok(Some(value))
    }

    fn global_decl(&mut self) -> Result<(), CompileError> {
        for item in self.var_decl()? {
            self.declare(&item.name, Entry::Global { ty: item.ty }, item.span)?;
            let t = item.ty.wasm();
            self.out.line(format!(
                "(global ${} (mut {t}) ({t}.const {}))",
                item.name,
                item.init.unwrap_or(0)
            ));
        }
        Ok(())
    }

    // <program> ::= 'PROGRAM' <ident> 'BEGIN' <block> 'END'
    fn program(&mut self) -> Result<(), CompileError> {
        let span = self.span();
        self.expect_keyword("PROGRAM")?;
        self.expect(TokenType::Name)?;
        self.expect_keyword("BEGIN")?;

        // The entry point returns this global at its declared width.
        let result_name = self.options.result_variable.to_ascii_uppercase();
        let result = match self.place_of(&result_name, span)? {
            place @ Place::Global { .. } => place,
            _ => {
                return Err(wrong_kind(
                    format!("{result_name} must be a global variable"),
                    span,
                ));
            }
        };

        self.out.blank();
        self.out.line(format!(
            "(func $main (export \"{}\") (result {})",
            self.options.entry_point,
            result.ty().wasm()
        ));
        self.out.indent();
        self.out.line(format!("(local {SCRATCH_LOCAL} i64)"));
        self.block(None)?;
        self.load(&result);
        self.out.dedent();
        self.out.line(")");
        self.expect_keyword("END")?;
        Ok(())
    }
}

fn symbol_error(e: SymbolError, span: Span) -> CompileError {
    match e {
        SymbolError::Duplicate(name) => CompileError::Duplicate {
            name,
            line: span.line,
            column: span.column,
        },
        SymbolError::Undefined(name) => CompileError::Undefined {
            name,
            line: span.line,
            column: span.column,
        },
        SymbolError::NoEnclosingScope => {
            syntax_err("scope closed without an enclosing scope", span)
        }
    }
}

// ── Token helpers shared with the pre-scan ──────────────────────

fn expect_token(lexer: &mut Lexer, token_type: TokenType) -> Result<String, CompileError> {
    let tok = lexer.current();
    if tok.token_type != token_type {
        return Err(expected(token_type.describe(), tok));
    }
    let value = tok.value.clone();
    lexer.advance()?;
    Ok(value)
}

fn expect_keyword(lexer: &mut Lexer, word: &str) -> Result<(), CompileError> {
    if !lexer.current().is_name(word) {
        return Err(expected(format!("'{word}'"), lexer.current()));
    }
    lexer.advance()?;
    Ok(())
}

/// A name being declared; reserved words are refused.
fn declared_name(lexer: &mut Lexer) -> Result<(String, Span), CompileError> {
    let span = lexer.current().span;
    let name = expect_token(lexer, TokenType::Name)?;
    if is_keyword(&name) {
        return Err(CompileError::Reserved {
            name,
            line: span.line,
            column: span.column,
        });
    }
    Ok((name, span))
}
