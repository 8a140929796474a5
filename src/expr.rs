use std::mem;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::ensure_sufficient_stack;
use crate::token::Token;

/// Stable identity of an expression node that the resolver can bind.
///
/// Two structurally identical references (`a` here and `a` there) get
/// different ids, so the distance table never confuses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExprId(usize);

impl ExprId {
    /// Next unused id.  Ids are unique for the whole process, so trees parsed
    /// separately (REPL lines) can share one interpreter.
    pub fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        ExprId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(Rc<str>),

    True,

    False,

    Nil,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*
/// in Lox.  `'a` ties token lexemes back to the source buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr<'a> {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr<'a>>),

    /// Prefix unary operator expression: `!isReady` or `-42`.
    Unary {
        operator: Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Infix arithmetic, comparison or equality: `a + b`, `x <= y`.
    Binary {
        left: Box<Expr<'a>>,
        operator: Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr<'a>>,
        operator: Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Variable access.
    Variable { id: ExprId, name: Token<'a> },

    /// `identifier "=" expression`
    Assign {
        id: ExprId,
        name: Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// Function‑, method‑ or constructor‑call: `clock()`, `Point(1, 2)`.
    Call {
        callee: Box<Expr<'a>>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token<'a>,
        arguments: Vec<Expr<'a>>,
    },

    /// object.property
    Get {
        object: Box<Expr<'a>>,
        name: Token<'a>,
    },

    /// object.property = value
    Set {
        object: Box<Expr<'a>>,
        name: Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// The `this` keyword inside a method.
    This { id: ExprId, keyword: Token<'a> },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Token<'a>,
        method: Token<'a>,
    },
}

/// Children are detached and dropped on a checked stack, so a tree nested a
/// hundred thousand levels deep is freed as safely as it was walked.
impl Drop for Expr<'_> {
    fn drop(&mut self) {
        ensure_sufficient_stack(|| match self {
            Expr::Literal(_) | Expr::Variable { .. } | Expr::This { .. } | Expr::Super { .. } => {}

            Expr::Grouping(inner)
            | Expr::Unary { right: inner, .. }
            | Expr::Assign { value: inner, .. }
            | Expr::Get { object: inner, .. } => drop(detach(inner)),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                drop(detach(left));
                drop(detach(right));
            }

            Expr::Set { object, value, .. } => {
                drop(detach(object));
                drop(detach(value));
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                drop(detach(callee));
                drop(mem::take(arguments));
            }
        })
    }
}

fn detach<'a>(slot: &mut Box<Expr<'a>>) -> Expr<'a> {
    mem::replace(slot.as_mut(), Expr::Literal(LiteralValue::Nil))
}
