/// Source location span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

/// All token types in TINY.
///
/// Keywords are not separate types: they scan as `Name` and the compiler
/// compares the upper-cased text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Arithmetic operators
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /

    // Boolean operators
    Or,  // |
    Xor, // ~
    And, // &
    Not, // !

    // Relational operators
    Equal,        // =
    NotEqual,     // <>
    LessThan,     // <
    LessEqual,    // <=
    GreaterThan,  // >
    GreaterEqual, // >=

    // Punctuation
    LParen,    // (
    RParen,    // )
    Dot,       // .
    Comma,     // ,
    Semicolon, // ;

    Name,
    Number,

    Eof,
}

impl TokenType {
    /// Human readable form used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenType::Add => "'+'",
            TokenType::Sub => "'-'",
            TokenType::Mul => "'*'",
            TokenType::Div => "'/'",
            TokenType::Or => "'|'",
            TokenType::Xor => "'~'",
            TokenType::And => "'&'",
            TokenType::Not => "'!'",
            TokenType::Equal => "'='",
            TokenType::NotEqual => "'<>'",
            TokenType::LessThan => "'<'",
            TokenType::LessEqual => "'<='",
            TokenType::GreaterThan => "'>'",
            TokenType::GreaterEqual => "'>='",
            TokenType::LParen => "'('",
            TokenType::RParen => "')'",
            TokenType::Dot => "'.'",
            TokenType::Comma => "','",
            TokenType::Semicolon => "';'",
            TokenType::Name => "name",
            TokenType::Number => "number",
            TokenType::Eof => "end of input",
        }
    }
}

/// Operator spellings and the token each one produces.
pub(crate) const OPERATORS: &[(&str, TokenType)] = &[
    ("+", TokenType::Add),
    ("-", TokenType::Sub),
    ("*", TokenType::Mul),
    ("/", TokenType::Div),
    ("(", TokenType::LParen),
    (")", TokenType::RParen),
    ("|", TokenType::Or),
    ("~", TokenType::Xor),
    ("&", TokenType::And),
    ("!", TokenType::Not),
    ("=", TokenType::Equal),
    ("<>", TokenType::NotEqual),
    (">", TokenType::GreaterThan),
    (">=", TokenType::GreaterEqual),
    ("<", TokenType::LessThan),
    ("<=", TokenType::LessEqual),
    (".", TokenType::Dot),
    (",", TokenType::Comma),
    (";", TokenType::Semicolon),
];

pub(crate) fn operator(spelling: &str) -> Option<TokenType> {
    OPERATORS
        .iter()
        .find(|(op, _)| *op == spelling)
        .map(|(_, token_type)| *token_type)
}

/// Words the grammar gives meaning to. They still scan as names.
pub const KEYWORDS: &[&str] = &[
    "VAR",
    "PROCEDURE",
    "PROGRAM",
    "BEGIN",
    "END",
    "IF",
    "ELSE",
    "WHILE",
    "BREAK",
    "READ",
    "WRITE",
    "REF",
    "LONG",
    "QUAD",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// A single token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub span: Span,
}

impl Token {
    /// True when this is the name token `word` (already upper case).
    pub fn is_name(&self, word: &str) -> bool {
        self.token_type == TokenType::Name && self.value == word
    }

    /// Text shown when the token turns up where something else was expected.
    pub fn display(&self) -> String {
        match self.token_type {
            TokenType::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.value),
        }
    }
}
