use crate::token::{self, Span, Token, TokenType};

/// On-demand scanner for TINY source code.
///
/// Holds exactly one token of lookahead. `advance` replaces it with the next
/// token after skipping whitespace and `{ ... }` comments, which may nest.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    token: Token,
}

impl Lexer {
    /// Create a scanner positioned on the first token of `source`.
    pub fn new(source: &str) -> Result<Self, LexError> {
        let mut lexer = Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            token: Token {
                token_type: TokenType::Eof,
                value: String::new(),
                span: Span { line: 1, column: 1 },
            },
        };
        lexer.advance()?;
        Ok(lexer)
    }

    /// The token at the cursor. Never consumes anything.
    pub fn current(&self) -> &Token {
        &self.token
    }

    /// Consume the current token and scan the next one.
    ///
    /// Once the end of input is reached the scanner keeps returning `Eof`.
    pub fn advance(&mut self) -> Result<(), LexError> {
        self.skip_white()?;
        let span = self.span();
        let Some(ch) = self.peek() else {
            self.token = Token {
                token_type: TokenType::Eof,
                value: String::new(),
                span,
            };
            return Ok(());
        };

        if let Some(token_type) = self.scan_operator(ch) {
            let len = if matches!(
                token_type,
                TokenType::NotEqual | TokenType::LessEqual | TokenType::GreaterEqual
            ) {
                2
            } else {
                1
            };
            let value: String = self.source[self.pos..self.pos + len].iter().collect();
            for _ in 0..len {
                self.bump();
            }
            self.token = Token { token_type, value, span };
        } else if ch.is_ascii_alphabetic() {
            let mut name = String::new();
            while let Some(c) = self.peek().filter(char::is_ascii_alphanumeric) {
                name.push(c.to_ascii_uppercase());
                self.bump();
            }
            self.token = Token {
                token_type: TokenType::Name,
                value: name,
                span,
            };
        } else if ch.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                digits.push(c);
                self.bump();
            }
            self.token = Token {
                token_type: TokenType::Number,
                value: digits,
                span,
            };
        } else {
            return Err(LexError::UnrecognizedCharacter {
                ch,
                line: span.line,
                column: span.column,
            });
        }
        Ok(())
    }

    /// Drain the scanner into a token list ending with `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let done = self.token.token_type == TokenType::Eof;
            tokens.push(self.token.clone());
            if done {
                return Ok(tokens);
            }
            self.advance()?;
        }
    }

    // ── Helpers ──────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn span(&self) -> Span {
        Span { line: self.line, column: self.column }
    }

    // ── Whitespace / comments ────────────────────────────────

    fn skip_white(&mut self) -> Result<(), LexError> {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else if ch == '{' {
                self.skip_comment()?;
            } else {
                break;
            }
        }
        Ok(())
    }

    /// Skip one comment starting at `{`, including any comments nested in it.
    ///
    /// Open braces are tracked on a heap stack, so nesting depth is bounded
    /// by memory rather than the call stack. An unterminated comment reports
    /// the innermost brace left open.
    fn skip_comment(&mut self) -> Result<(), LexError> {
        let mut open = vec![self.span()];
        self.bump(); // consume '{'
        while let Some(&innermost) = open.last() {
            match self.peek() {
                Some('}') => {
                    self.bump();
                    open.pop();
                }
                Some('{') => {
                    open.push(self.span());
                    self.bump();
                }
                Some(_) => {
                    self.bump();
                }
                None => {
                    return Err(LexError::UnterminatedComment {
                        line: innermost.line,
                        column: innermost.column,
                    });
                }
            }
        }
        Ok(())
    }

    // ── Operators ────────────────────────────────────────────

    /// Two-character operators win over their one-character prefixes.
    fn scan_operator(&self, ch: char) -> Option<TokenType> {
        if let Some(next) = self.source.get(self.pos + 1) {
            let pair: String = [ch, *next].iter().collect();
            if let Some(token_type) = token::operator(&pair) {
                return Some(token_type);
            }
        }
        let mut buf = [0u8; 4];
        token::operator(ch.encode_utf8(&mut buf))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("Lex error at line {line}, column {column}: unrecognized character '{ch}'")]
    UnrecognizedCharacter { ch: char, line: usize, column: usize },
    #[error("Lex error at line {line}, column {column}: unterminated comment")]
    UnterminatedComment { line: usize, column: usize },
}

impl LexError {
    pub fn span(&self) -> Span {
        match *self {
            LexError::UnrecognizedCharacter { line, column, .. }
            | LexError::UnterminatedComment { line, column } => Span { line, column },
        }
    }
}
