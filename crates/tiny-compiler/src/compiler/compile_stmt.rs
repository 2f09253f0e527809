use super::*;

impl Compiler {
    /// Statements up to the closing `END` or `ELSE`. `break_label` is the
    /// exit of the innermost enclosing loop.
    pub(super) fn block(&mut self, break_label: Option<&str>) -> Result<(), CompileError> {
        while !self.at_keyword("END") && !self.at_keyword("ELSE") {
            self.statement(break_label)?;
            self.skip_semicolon()?;
        }
        Ok(())
    }

    fn statement(&mut self, break_label: Option<&str>) -> Result<(), CompileError> {
        if !self.at(TokenType::Name) {
            return Err(self.expected("a statement"));
        }
        let word = self.token().value.clone();
        match word.as_str() {
            "IF" => self.if_stmt(break_label),
            "WHILE" => self.while_stmt(),
            "BREAK" => self.break_stmt(break_label),
            "READ" => self.read_stmt(),
            "WRITE" => self.write_stmt(),
            _ if is_keyword(&word) => Err(self.expected("a statement")),
            _ => self.assign_or_call(),
        }
    }

    // IF <bool expression> <block> [ ELSE <block> ] END
    fn if_stmt(&mut self, break_label: Option<&str>) -> Result<(), CompileError> {
        self.expect_keyword("IF")?;
        let ty = self.bool_expression()?;
        self.truth_test(ty);
        self.out.line("if");
        self.out.indent();
        self.block(break_label)?;
        if self.at_keyword("ELSE") {
            self.advance()?;
            self.out.dedent();
            self.out.line("else");
            self.out.indent();
            self.block(break_label)?;
        }
        self.out.dedent();
        self.out.line("end");
        self.expect_keyword("END")
    }

    // WHILE <bool expression> <block> END
    fn while_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("WHILE")?;
        let labels = self.next_loop_labels();
        self.out.line(format!("loop {}", labels.continue_label));
        self.out.indent();
        self.out.line(format!("block {}", labels.break_label));
        self.out.indent();
        let ty = self.bool_expression()?;
        self.falsity_test(ty);
        self.out.line(format!("br_if {}", labels.break_label));
        self.block(Some(&labels.break_label))?;
        self.out.line(format!("br {}", labels.continue_label));
        self.out.dedent();
        self.out.line("end");
        self.out.dedent();
        self.out.line("end");
        self.expect_keyword("END")
    }

    fn break_stmt(&mut self, break_label: Option<&str>) -> Result<(), CompileError> {
        let span = self.span();
        self.expect_keyword("BREAK")?;
        match break_label {
            Some(label) => {
                self.out.line(format!("br {label}"));
                Ok(())
            }
            None => Err(CompileError::BreakOutsideLoop {
                line: span.line,
                column: span.column,
            }),
        }
    }

    // READ '(' <ident> ( ',' <ident> )* ')'
    fn read_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("READ")?;
        self.expect(TokenType::LParen)?;
        loop {
            let span = self.span();
            let name = self.expect(TokenType::Name)?;
            let place = self.place_of(&name, span)?;
            self.store_prefix(&place);
            self.out.call_read();
            self.store(&place, ValueType::Long);
            if !self.at(TokenType::Comma) {
                break;
            }
            self.advance()?;
        }
        self.expect(TokenType::RParen)?;
        Ok(())
    }

    // WRITE '(' <bool expression> ( ',' <bool expression> )* ')'
    fn write_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("WRITE")?;
        self.expect(TokenType::LParen)?;
        loop {
            let ty = self.bool_expression()?;
            self.convert(ty, ValueType::Long);
            self.out.call_write();
            if !self.at(TokenType::Comma) {
                break;
            }
            self.advance()?;
        }
        self.expect(TokenType::RParen)?;
        Ok(())
    }

    fn assign_or_call(&mut self) -> Result<(), CompileError> {
        let span = self.span();
        let name = self.token().value.clone();
        let entry = self.resolve(&name, span)?;
        self.advance()?;
        match entry {
            Entry::Procedure { params } => {
                if self.at(TokenType::Equal) {
                    return Err(wrong_kind(
                        format!("cannot assign to procedure {name}"),
                        span,
                    ));
                }
                self.procedure_call(&name, &params, span)
            }
            Entry::Global { .. } | Entry::Local { .. } => {
                if self.at(TokenType::LParen) {
                    return Err(wrong_kind(format!("{name} is not a procedure"), span));
                }
                let place = self.place_of(&name, span)?;
                self.expect(TokenType::Equal)?;
                self.store_prefix(&place);
                let ty = self.bool_expression()?;
                self.store(&place, ty);
                Ok(())
            }
        }
    }
}
