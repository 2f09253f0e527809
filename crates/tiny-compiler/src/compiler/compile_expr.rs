use super::*;

impl Compiler {
    // <expression> ::= <term> ( ('+' | '-') <term> )*
    pub(super) fn expression(&mut self) -> Result<ValueType, CompileError> {
        let mut ty = self.term()?;
        loop {
            let op = match self.token().token_type {
                TokenType::Add => BinOp::Add,
                TokenType::Sub => BinOp::Sub,
                _ => break,
            };
            self.advance()?;
            let rhs = self.term()?;
            ty = self.binary_op(ty, rhs, op);
        }
        Ok(ty)
    }

    // <term> ::= <signed factor> ( ('*' | '/') <factor> )*
    fn term(&mut self) -> Result<ValueType, CompileError> {
        let mut ty = self.signed_factor()?;
        loop {
            let op = match self.token().token_type {
                TokenType::Mul => BinOp::Mul,
                TokenType::Div => BinOp::Div,
                _ => break,
            };
            self.advance()?;
            let rhs = self.factor()?;
            ty = self.binary_op(ty, rhs, op);
        }
        Ok(ty)
    }

    fn signed_factor(&mut self) -> Result<ValueType, CompileError> {
        match self.token().token_type {
            TokenType::Add => {
                self.advance()?;
                self.factor()
            }
            TokenType::Sub => {
                self.advance()?;
                if self.at(TokenType::Number) {
                    return self.literal(true);
                }
                let ty = self.factor()?;
                let t = ty.wasm();
                self.out.line(format!("{t}.const -1"));
                self.out.line(format!("{t}.mul"));
                Ok(ty)
            }
            _ => self.factor(),
        }
    }

    // <factor> ::= <number> | <ident> | '(' <bool expression> ')'
    fn factor(&mut self) -> Result<ValueType, CompileError> {
        match self.token().token_type {
            TokenType::LParen => {
                self.advance()?;
                let ty = self.bool_expression()?;
                self.expect(TokenType::RParen)?;
                Ok(ty)
            }
            TokenType::Number => self.literal(false),
            TokenType::Name => self.variable(),
            _ => Err(self.expected("an expression")),
        }
    }

    /// Push a number literal, typed by the narrowest width that holds it.
    fn literal(&mut self, negative: bool) -> Result<ValueType, CompileError> {
        let span = self.span();
        let digits = self.expect(TokenType::Number)?;
        let Some(value) = parse_literal(&digits, negative) else {
            return Err(CompileError::NumberOutOfRange {
                digits,
                line: span.line,
                column: span.column,
            });
        };
        let ty = ValueType::of_literal(value);
        self.out.line(format!("{}.const {value}", ty.wasm()));
        Ok(ty)
    }

    fn variable(&mut self) -> Result<ValueType, CompileError> {
        let span = self.span();
        let name = self.token().value.clone();
        if is_keyword(&name) {
            return Err(self.expected("an expression"));
        }
        let place = self.place_of(&name, span)?;
        self.advance()?;
        self.load(&place);
        Ok(place.ty())
    }
}
