//! Expression tree for rule test expressions.
//!
//! Produced once per rule at profile-load time and reused read-only across
//! every evaluation of that rule. The tree owns its children outright; no
//! cycles, no sharing below the root.

use serde::Serialize;
use std::fmt;

// ──────────────────────────────────────────────
// Literals
// ──────────────────────────────────────────────

/// A literal as it appears in expression source. Arrays have no literal
/// form in the grammar; they only arise at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
}

// ──────────────────────────────────────────────
// Operators
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }

    /// Binding strength used by the parser and the printer. Higher binds
    /// tighter. Ternary sits below all of these at 0.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Resolved against the evaluation context; missing keys are null
    Ident(String),
    /// `base.name`
    Member { base: Box<Expr>, name: String },
    /// `base[index]`
    Index { base: Box<Expr>, index: Box<Expr> },
    /// `callee(args)` -- callee is always a Member in valid rules
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `cond ? then : else` -- exactly one branch is ever evaluated
    Ternary {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// `/pattern/flags` -- legal only as the receiver of `.test(...)`
    Regex { pattern: String, flags: String },
    /// `param => body` -- legal only as the sole argument of a
    /// predicate-taking method (filter / some / every)
    Predicate { param: String, body: Box<Expr> },
}

// ──────────────────────────────────────────────
// Pretty-printer
// ──────────────────────────────────────────────

// Pseudo-precedence for non-binary forms, on the BinaryOp scale.
const PREC_TERNARY: u8 = 0;
const PREC_UNARY: u8 = 7;
const PREC_POSTFIX: u8 = 8;

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Ternary { .. } | Expr::Predicate { .. } => PREC_TERNARY,
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { .. } => PREC_UNARY,
            Expr::Member { .. } | Expr::Index { .. } | Expr::Call { .. } => PREC_POSTFIX,
            Expr::Literal(_) | Expr::Ident(_) | Expr::Regex { .. } => u8::MAX,
        }
    }

    /// Print `self`, parenthesizing when its binding is weaker than the
    /// position it appears in.
    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        let needs_parens = self.precedence() < min;
        if needs_parens {
            write!(f, "(")?;
        }
        match self {
            Expr::Literal(lit) => write!(f, "{}", lit)?,
            Expr::Ident(name) => write!(f, "{}", name)?,
            Expr::Member { base, name } => {
                base.fmt_prec(f, PREC_POSTFIX)?;
                write!(f, ".{}", name)?;
            }
            Expr::Index { base, index } => {
                base.fmt_prec(f, PREC_POSTFIX)?;
                write!(f, "[")?;
                index.fmt_prec(f, PREC_TERNARY)?;
                write!(f, "]")?;
            }
            Expr::Call { callee, args } => {
                callee.fmt_prec(f, PREC_POSTFIX)?;
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    arg.fmt_prec(f, PREC_TERNARY)?;
                }
                write!(f, ")")?;
            }
            Expr::Unary { op, operand } => {
                write!(f, "{}", op.symbol())?;
                operand.fmt_prec(f, PREC_UNARY)?;
            }
            Expr::Binary { op, left, right } => {
                let prec = op.precedence();
                // Left-associative: the right child needs one level more
                left.fmt_prec(f, prec)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_prec(f, prec + 1)?;
            }
            Expr::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                // The grammar requires the condition at logical-or level
                cond.fmt_prec(f, PREC_TERNARY + 1)?;
                write!(f, " ? ")?;
                then_branch.fmt_prec(f, PREC_TERNARY)?;
                write!(f, " : ")?;
                else_branch.fmt_prec(f, PREC_TERNARY)?;
            }
            Expr::Regex { pattern, flags } => write!(f, "/{}/{}", pattern, flags)?,
            Expr::Predicate { param, body } => {
                write!(f, "{} => ", param)?;
                body.fmt_prec(f, PREC_TERNARY)?;
            }
        }
        if needs_parens {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(n) => write!(f, "{}", n),
            // {:?} always keeps a decimal point, so the literal re-lexes
            // as a Real rather than collapsing to an Int
            Literal::Real(r) => write!(f, "{:?}", r),
            Literal::Str(s) => {
                write!(f, "'")?;
                for c in s.chars() {
                    match c {
                        '\'' => write!(f, "\\'")?,
                        '\\' => write!(f, "\\\\")?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "'")
            }
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
