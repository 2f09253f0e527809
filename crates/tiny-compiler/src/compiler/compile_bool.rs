use super::*;

impl Compiler {
    // <bool expression> ::= <bool term> ( ('|' | '~') <bool term> )*
    pub(super) fn bool_expression(&mut self) -> Result<ValueType, CompileError> {
        let mut ty = self.bool_term()?;
        loop {
            let op = match self.token().token_type {
                TokenType::Or => BinOp::Or,
                TokenType::Xor => BinOp::Xor,
                _ => break,
            };
            self.advance()?;
            let rhs = self.bool_term()?;
            ty = self.binary_op(ty, rhs, op);
        }
        Ok(ty)
    }

    // <bool term> ::= <not factor> ( '&' <not factor> )*
    fn bool_term(&mut self) -> Result<ValueType, CompileError> {
        let mut ty = self.not_factor()?;
        while self.at(TokenType::And) {
            self.advance()?;
            let rhs = self.not_factor()?;
            ty = self.binary_op(ty, rhs, BinOp::And);
        }
        Ok(ty)
    }

    // <not factor> ::= [ '!' ] <relation>
    fn not_factor(&mut self) -> Result<ValueType, CompileError> {
        if !self.at(TokenType::Not) {
            return self.relation();
        }
        self.advance()?;
        let ty = self.relation()?;
        self.out.line(format!("{}.eqz", ty.wasm()));
        if ty == ValueType::Quad {
            self.out.line("i64.extend_i32_u");
        }
        Ok(ty)
    }

    // <relation> ::= <expression> [ <relop> <expression> ]
    fn relation(&mut self) -> Result<ValueType, CompileError> {
        let ty = self.expression()?;
        let Some(op) = BinOp::relational(self.token().token_type) else {
            return Ok(ty);
        };
        self.advance()?;
        let rhs = self.expression()?;
        Ok(self.binary_op(ty, rhs, op))
    }
}
