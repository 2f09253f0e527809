use super::*;

/// A by-value variable passed to a by-reference parameter. Its value
/// travels through a slot on the auxiliary stack and is copied back once
/// the call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingRestore {
    pub(crate) target: Place,
    /// Width of the slot, that of the parameter.
    pub(crate) slot: ValueType,
}

/// Parse a parameter list: `'(' [ <param> ( ',' <param> )* ] ')'` where
/// `<param> ::= [ 'REF' ] [ 'LONG' | 'QUAD' ] <ident>`.
pub(super) fn parse_parameters(lexer: &mut Lexer) -> Result<Vec<Param>, CompileError> {
    expect_token(lexer, TokenType::LParen)?;
    let mut params: Vec<Param> = Vec::new();
    if lexer.current().token_type != TokenType::RParen {
        loop {
            let by_ref = lexer.current().is_name("REF");
            if by_ref {
                lexer.advance()?;
            }
            let mut ty = ValueType::Long;
            if lexer.current().token_type == TokenType::Name {
                if let Some(declared) = ValueType::from_keyword(&lexer.current().value) {
                    ty = declared;
                    lexer.advance()?;
                }
            }
            let (name, span) = declared_name(lexer)?;
            if params.iter().any(|p| p.name == name) {
                return Err(CompileError::Duplicate {
                    name,
                    line: span.line,
                    column: span.column,
                });
            }
            params.push(Param { name, ty, by_ref });
            if lexer.current().token_type != TokenType::Comma {
                break;
            }
            lexer.advance()?;
        }
    }
    expect_token(lexer, TokenType::RParen)?;
    Ok(params)
}

impl Compiler {
    // <procedure> ::= PROCEDURE <ident> <params> ( <data decl> )* <block> END
    pub(super) fn procedure(&mut self) -> Result<(), CompileError> {
        self.expect_keyword("PROCEDURE")?;
        let (name, span) = declared_name(&mut self.lexer)?;
        let params = parse_parameters(&mut self.lexer)?;

        // Signatures are entered by the pre-scan.
        match self.symbols.resolve(&name) {
            Ok(Entry::Procedure { params: known }) if *known == params => {}
            _ => {
                return Err(CompileError::Duplicate {
                    name,
                    line: span.line,
                    column: span.column,
                });
            }
        }

        let mut header = format!("(func ${name}");
        for p in &params {
            let wasm = if p.by_ref { "i32" } else { p.ty.wasm() };
            header.push_str(&format!(" (param ${} {wasm})", p.name));
        }
        self.out.blank();
        self.out.line(header);
        self.out.indent();

        let initial = params.iter().map(|p| {
            (
                p.name.clone(),
                Entry::Local {
                    ty: p.ty,
                    by_ref: p.by_ref,
                },
            )
        });
        self.symbols
            .push_scope(initial)
            .map_err(|e| symbol_error(e, span))?;

        let mut inits = Vec::new();
        while self.at_keyword("VAR") {
            for item in self.var_decl()? {
                self.declare(
                    &item.name,
                    Entry::Local {
                        ty: item.ty,
                        by_ref: false,
                    },
                    item.span,
                )?;
                self.out.line(format!("(local ${} {})", item.name, item.ty.wasm()));
                if let Some(value) = item.init {
                    inits.push((item.name, item.ty, value));
                }
            }
            self.skip_semicolon()?;
        }
        self.out.line(format!("(local {SCRATCH_LOCAL} i64)"));
        for (local, ty, value) in inits {
            self.out.line(format!("{}.const {value}", ty.wasm()));
            self.out.line(format!("local.set ${local}"));
        }

        self.block(None)?;
        self.expect_keyword("END")?;
        self.symbols
            .pop_scope()
            .map_err(|e| symbol_error(e, span))?;
        self.out.dedent();
        self.out.line(")");
        Ok(())
    }

    // <call> ::= <ident> '(' [ <argument> ( ',' <argument> )* ] ')'
    pub(super) fn procedure_call(
        &mut self,
        name: &str,
        params: &[Param],
        span: Span,
    ) -> Result<(), CompileError> {
        self.expect(TokenType::LParen)?;
        let pending = self.call_arguments(name, params, span)?;
        self.expect(TokenType::RParen)?;
        self.out.line(format!("call ${name}"));
        self.restore_ref_arguments(&pending);
        Ok(())
    }

    /// Push the arguments of a call, returning the by-reference copies that
    /// must be written back after it.
    fn call_arguments(
        &mut self,
        name: &str,
        params: &[Param],
        span: Span,
    ) -> Result<Vec<PendingRestore>, CompileError> {
        let mut pending = Vec::new();
        let mut count = 0;
        if !self.at(TokenType::RParen) {
            loop {
                match params.get(count) {
                    Some(param) if param.by_ref => {
                        if let Some(restore) = self.ref_argument(param)? {
                            pending.push(restore);
                        }
                    }
                    Some(param) => {
                        let ty = self.bool_expression()?;
                        self.convert(ty, param.ty);
                    }
                    None => {
                        self.bool_expression()?;
                    }
                }
                count += 1;
                if !self.at(TokenType::Comma) {
                    break;
                }
                self.advance()?;
            }
        }
        if count != params.len() {
            return Err(CompileError::Arity {
                procedure: name.to_string(),
                expected: params.len(),
                found: count,
                line: span.line,
                column: span.column,
            });
        }
        Ok(pending)
    }

    /// Push the address for a by-reference parameter. A by-value variable is
    /// copied into a fresh stack slot; a by-reference local forwards its own
    /// address.
    fn ref_argument(&mut self, param: &Param) -> Result<Option<PendingRestore>, CompileError> {
        let span = self.span();
        if !self.at(TokenType::Name) {
            return Err(reference_err(
                format!("argument for REF parameter {} must be a variable", param.name),
                span,
            ));
        }
        let var = self.token().value.clone();
        let place = self.place_of(&var, span)?;
        self.advance()?;
        if !self.at(TokenType::Comma) && !self.at(TokenType::RParen) {
            return Err(reference_err(
                format!("argument for REF parameter {} must be a single variable", param.name),
                span,
            ));
        }

        match place {
            Place::RefLocal { name, ty } => {
                if ty != param.ty {
                    return Err(type_err(
                        format!(
                            "cannot pass {ty} reference {name} to {} parameter {}",
                            param.ty, param.name
                        ),
                        span,
                    ));
                }
                self.out.line(format!("local.get ${name}"));
                Ok(None)
            }
            Place::Global { .. } | Place::Local { .. } => {
                self.reserve_stack(param.ty.size());
                self.out.line(format!("global.get {STACK_POINTER}"));
                self.load(&place);
                self.convert(place.ty(), param.ty);
                self.out.line(format!("{}.store", param.ty.wasm()));
                self.out.line(format!("global.get {STACK_POINTER}"));
                Ok(Some(PendingRestore {
                    target: place,
                    slot: param.ty,
                }))
            }
        }
    }

    /// Copy the slots back into their variables, newest slot first, then
    /// release them.
    fn restore_ref_arguments(&mut self, pending: &[PendingRestore]) {
        if pending.is_empty() {
            return;
        }
        let mut offset = 0;
        for restore in pending.iter().rev() {
            self.out.line(format!(";; restore {} by reference", restore.target.name()));
            self.store_prefix(&restore.target);
            self.out.line(format!("global.get {STACK_POINTER}"));
            if offset == 0 {
                self.out.line(format!("{}.load", restore.slot.wasm()));
            } else {
                self.out.line(format!("{}.load offset={offset}", restore.slot.wasm()));
            }
            self.store(&restore.target, restore.slot);
            offset += restore.slot.size();
        }
        self.release_stack(offset);
    }

    fn reserve_stack(&mut self, bytes: u32) {
        self.out.line(format!("global.get {STACK_POINTER}"));
        self.out.line(format!("i32.const {bytes}"));
        self.out.line("i32.sub");
        self.out.line(format!("global.set {STACK_POINTER}"));
    }

    fn release_stack(&mut self, bytes: u32) {
        self.out.line(format!("global.get {STACK_POINTER}"));
        self.out.line(format!("i32.const {bytes}"));
        self.out.line("i32.add");
        self.out.line(format!("global.set {STACK_POINTER}"));
    }
}
