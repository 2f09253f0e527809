mod token;
mod lexer;

pub use token::{is_keyword, Span, Token, TokenType, KEYWORDS};
pub use lexer::{LexError, Lexer};
