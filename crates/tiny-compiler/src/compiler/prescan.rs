use super::*;

/// Move the cursor onto the next `PROCEDURE` keyword. False once the top
/// level ends.
fn seek_procedure(lexer: &mut Lexer) -> Result<bool, CompileError> {
    loop {
        let tok = lexer.current();
        match tok.token_type {
            TokenType::Eof | TokenType::Dot => return Ok(false),
            TokenType::Name if tok.value == "PROCEDURE" => return Ok(true),
            _ => lexer.advance()?,
        }
    }
}

fn signature(lexer: &mut Lexer) -> Result<(String, Span, Vec<Param>), CompileError> {
    expect_keyword(lexer, "PROCEDURE")?;
    let (name, span) = declared_name(lexer)?;
    let params = parse_parameters(lexer)?;
    Ok((name, span, params))
}

impl Compiler {
    /// Enter every procedure signature in the global scope, so that a call
    /// may precede the procedure's declaration.
    ///
    /// A malformed header is skipped and scanning resumes at the next
    /// `PROCEDURE`; the main pass reports it where it occurs. A scanner error
    /// ends the pre-scan for the same reason. Duplicate procedures are
    /// reported here.
    pub(super) fn prescan(&mut self, source: &str) -> Result<(), CompileError> {
        let Ok(mut lexer) = Lexer::new(source) else {
            return Ok(());
        };
        while let Ok(true) = seek_procedure(&mut lexer) {
            match signature(&mut lexer) {
                Ok((name, span, params)) => {
                    self.declare(&name, Entry::Procedure { params }, span)?;
                }
                Err(CompileError::Lex(_)) => break,
                Err(_) => {
                    // The failing token may itself start the next header.
                    if !lexer.current().is_name("PROCEDURE") && lexer.advance().is_err() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
