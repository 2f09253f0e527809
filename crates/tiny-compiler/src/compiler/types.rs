use std::fmt;

use super::*;

/// The two integer widths of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// 32-bit, keyword `LONG`.
    Long,
    /// 64-bit, keyword `QUAD`.
    Quad,
}

impl ValueType {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "LONG" => Some(ValueType::Long),
            "QUAD" => Some(ValueType::Quad),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ValueType::Long => "LONG",
            ValueType::Quad => "QUAD",
        }
    }

    /// WebAssembly value type name.
    pub fn wasm(self) -> &'static str {
        match self {
            ValueType::Long => "i32",
            ValueType::Quad => "i64",
        }
    }

    /// Bytes one memory cell of this type occupies.
    pub fn size(self) -> u32 {
        match self {
            ValueType::Long => 4,
            ValueType::Quad => 8,
        }
    }

    pub fn holds(self, value: i64) -> bool {
        match self {
            ValueType::Long => i32::try_from(value).is_ok(),
            ValueType::Quad => true,
        }
    }

    /// Narrowest type that holds a literal value.
    pub fn of_literal(value: i64) -> Self {
        if ValueType::Long.holds(value) {
            ValueType::Long
        } else {
            ValueType::Quad
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Parse the digits of a literal, applying a folded leading minus.
pub(crate) fn parse_literal(digits: &str, negative: bool) -> Option<i64> {
    let magnitude: i128 = digits.parse::<u64>().ok()?.into();
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

/// Binary operators, all of which go through promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
}

impl BinOp {
    pub(crate) fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div_s",
            BinOp::Eq => "eq",
            BinOp::Ne => "ne",
            BinOp::Lt => "lt_s",
            BinOp::Le => "le_s",
            BinOp::Gt => "gt_s",
            BinOp::Ge => "ge_s",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
        }
    }

    /// Comparisons leave an i32 regardless of operand width.
    pub(crate) fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub(crate) fn relational(token_type: TokenType) -> Option<Self> {
        match token_type {
            TokenType::Equal => Some(BinOp::Eq),
            TokenType::NotEqual => Some(BinOp::Ne),
            TokenType::LessThan => Some(BinOp::Lt),
            TokenType::LessEqual => Some(BinOp::Le),
            TokenType::GreaterThan => Some(BinOp::Gt),
            TokenType::GreaterEqual => Some(BinOp::Ge),
            _ => None,
        }
    }
}

/// How the operands of a binary operator are brought to a common width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Promotion {
    /// Both sides already share this type.
    Same(ValueType),
    /// Left is narrow and sits under a wide right operand.
    WidenLeft,
    /// Right is narrow and on top of the stack.
    WidenRight,
}

impl Promotion {
    pub(crate) fn result(self) -> ValueType {
        match self {
            Promotion::Same(ty) => ty,
            Promotion::WidenLeft | Promotion::WidenRight => ValueType::Quad,
        }
    }
}

pub(crate) fn promote(lhs: ValueType, rhs: ValueType) -> Promotion {
    match (lhs, rhs) {
        (ValueType::Long, ValueType::Long) => Promotion::Same(ValueType::Long),
        (ValueType::Quad, ValueType::Quad) => Promotion::Same(ValueType::Quad),
        (ValueType::Long, ValueType::Quad) => Promotion::WidenLeft,
        (ValueType::Quad, ValueType::Long) => Promotion::WidenRight,
    }
}

impl Compiler {
    /// Convert the value on top of the stack from `from` to `to`.
    pub(super) fn convert(&mut self, from: ValueType, to: ValueType) {
        match (from, to) {
            (ValueType::Long, ValueType::Quad) => self.out.line("i64.extend_i32_s"),
            (ValueType::Quad, ValueType::Long) => self.out.line("i32.wrap_i64"),
            (ValueType::Long, ValueType::Long) | (ValueType::Quad, ValueType::Quad) => {}
        }
    }

    /// Emit `op` for operands of types `lhs` and `rhs` already on the stack.
    pub(super) fn binary_op(&mut self, lhs: ValueType, rhs: ValueType, op: BinOp) -> ValueType {
        let promotion = promote(lhs, rhs);
        match promotion {
            Promotion::Same(_) => {}
            Promotion::WidenLeft => {
                self.out.line(format!("local.set {SCRATCH_LOCAL}"));
                self.out.line("i64.extend_i32_s");
                self.out.line(format!("local.get {SCRATCH_LOCAL}"));
            }
            Promotion::WidenRight => self.out.line("i64.extend_i32_s"),
        }
        let ty = promotion.result();
        self.out.line(format!("{}.{}", ty.wasm(), op.mnemonic()));
        if op.is_comparison() && ty == ValueType::Quad {
            self.out.line("i64.extend_i32_u");
        }
        ty
    }

    /// Reduce a value of type `ty` to an i32 that is non-zero when true.
    pub(super) fn truth_test(&mut self, ty: ValueType) {
        match ty {
            ValueType::Long => {}
            ValueType::Quad => {
                self.out.line("i64.const 0");
                self.out.line("i64.ne");
            }
        }
    }

    /// Reduce a value of type `ty` to an i32 that is non-zero when false.
    pub(super) fn falsity_test(&mut self, ty: ValueType) {
        self.out.line(format!("{}.eqz", ty.wasm()));
    }
}
