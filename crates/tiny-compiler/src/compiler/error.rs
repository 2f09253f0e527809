use tiny_lexer::{LexError, Span, Token};

/// Category of a compile failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntactic,
    NameResolution,
    Arity,
    ReferenceBinding,
    Type,
    Options,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Lex error at line {line}, column {column}: number {digits} is out of range")]
    NumberOutOfRange {
        digits: String,
        line: usize,
        column: usize,
    },

    #[error("Syntax error at line {line}, column {column}: {expected} expected, found {found}")]
    Expected {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },

    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Name error at line {line}, column {column}: undefined identifier {name}")]
    Undefined {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("Name error at line {line}, column {column}: duplicate symbol {name}")]
    Duplicate {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("Name error at line {line}, column {column}: {name} is a reserved word")]
    Reserved {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("Name error at line {line}, column {column}: {message}")]
    WrongKind {
        message: String,
        line: usize,
        column: usize,
    },

    #[error(
        "Arity error at line {line}, column {column}: \
         procedure {procedure} expects {expected} parameters, got {found}"
    )]
    Arity {
        procedure: String,
        expected: usize,
        found: usize,
        line: usize,
        column: usize,
    },

    #[error("Reference error at line {line}, column {column}: {message}")]
    Reference {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Reference error at line {line}, column {column}: no loop to break from")]
    BreakOutsideLoop { line: usize, column: usize },

    #[error("Type error at line {line}, column {column}: {message}")]
    Type {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Invalid options: {message}")]
    Options { message: String },
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Lex(_) | CompileError::NumberOutOfRange { .. } => ErrorKind::Lexical,
            CompileError::Expected { .. } | CompileError::Syntax { .. } => ErrorKind::Syntactic,
            CompileError::Undefined { .. }
            | CompileError::Duplicate { .. }
            | CompileError::Reserved { .. }
            | CompileError::WrongKind { .. } => ErrorKind::NameResolution,
            CompileError::Arity { .. } => ErrorKind::Arity,
            CompileError::Reference { .. } | CompileError::BreakOutsideLoop { .. } => {
                ErrorKind::ReferenceBinding
            }
            CompileError::Type { .. } => ErrorKind::Type,
            CompileError::Options { .. } => ErrorKind::Options,
        }
    }

    /// Position of the offending token, if the error has one.
    pub fn span(&self) -> Option<Span> {
        let (line, column) = match self {
            CompileError::Lex(e) => return Some(e.span()),
            CompileError::NumberOutOfRange { line, column, .. }
            | CompileError::Expected { line, column, .. }
            | CompileError::Syntax { line, column, .. }
            | CompileError::Undefined { line, column, .. }
            | CompileError::Duplicate { line, column, .. }
            | CompileError::Reserved { line, column, .. }
            | CompileError::WrongKind { line, column, .. }
            | CompileError::Arity { line, column, .. }
            | CompileError::Reference { line, column, .. }
            | CompileError::BreakOutsideLoop { line, column }
            | CompileError::Type { line, column, .. } => (*line, *column),
            CompileError::Options { .. } => return None,
        };
        Some(Span { line, column })
    }
}

pub(crate) fn expected(what: impl Into<String>, found: &Token) -> CompileError {
    CompileError::Expected {
        expected: what.into(),
        found: found.display(),
        line: found.span.line,
        column: found.span.column,
    }
}

pub(crate) fn syntax_err(message: impl Into<String>, span: Span) -> CompileError {
    CompileError::Syntax {
        message: message.into(),
        line: span.line,
        column: span.column,
    }
}

pub(crate) fn wrong_kind(message: impl Into<String>, span: Span) -> CompileError {
    CompileError::WrongKind {
        message: message.into(),
        line: span.line,
        column: span.column,
    }
}

pub(crate) fn reference_err(message: impl Into<String>, span: Span) -> CompileError {
    CompileError::Reference {
        message: message.into(),
        line: span.line,
        column: span.column,
    }
}

pub(crate) fn type_err(message: impl Into<String>, span: Span) -> CompileError {
    CompileError::Type {
        message: message.into(),
        line: span.line,
        column: span.column,
    }
}
