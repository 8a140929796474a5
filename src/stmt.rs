use std::mem;
use std::rc::Rc;

use serde::Serialize;

use crate::ensure_sufficient_stack;
use crate::expr::Expr;
use crate::token::Token;

/// Name of the method a class call runs on the fresh instance.
pub const INITIALIZER: &str = "init";

/// How a function declaration was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FunctionKind {
    /// `fun name(..) { .. }`
    Function,

    /// `name(..) { .. }` inside a class body.
    Method,

    /// `name { .. }` inside a class body; runs on property access.
    Getter,

    /// `class name(..) { .. }` inside a class body; lives on the class.
    Static,
}

/// Shared by the statement tree and every function value created from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl<'a> {
    pub name: Token<'a>,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token<'a>>,

    pub body: Vec<Stmt<'a>>,

    pub kind: FunctionKind,
}

impl<'a> FunctionDecl<'a> {
    pub fn is_initializer(&self) -> bool {
        self.kind == FunctionKind::Method && self.name.lexeme == INITIALIZER
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDecl<'a> {
    pub name: Token<'a>,

    /// Always an [`Expr::Variable`] when present.
    pub superclass: Option<Expr<'a>>,

    /// Instance methods, getters and static methods, in source order.
    pub methods: Vec<Rc<FunctionDecl<'a>>>,
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt<'a> {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr<'a>),

    Print(Expr<'a>),

    /// `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token<'a>,
        initializer: Option<Expr<'a>>,
    },

    Block(Vec<Stmt<'a>>),

    If {
        condition: Expr<'a>,
        then_branch: Box<Stmt<'a>>,
        else_branch: Option<Box<Stmt<'a>>>,
    },

    /// `while` loop; `for` loops are desugared into this.
    While {
        condition: Expr<'a>,
        body: Box<Stmt<'a>>,
    },

    Function(Rc<FunctionDecl<'a>>),

    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token<'a>,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr<'a>>,
    },

    Class(ClassDecl<'a>),
}

/// Nested statements are detached and dropped on a checked stack; nested
/// expressions take care of themselves.
impl Drop for Stmt<'_> {
    fn drop(&mut self) {
        ensure_sufficient_stack(|| match self {
            Stmt::Block(statements) => drop(mem::take(statements)),

            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                drop(detach(then_branch));
                if let Some(else_branch) = else_branch {
                    drop(detach(else_branch));
                }
            }

            Stmt::While { body, .. } => drop(detach(body)),

            Stmt::Function(declaration) => {
                if let Some(declaration) = Rc::get_mut(declaration) {
                    drop(mem::take(&mut declaration.body));
                }
            }

            Stmt::Class(class) => {
                for method in &mut class.methods {
                    if let Some(method) = Rc::get_mut(method) {
                        drop(mem::take(&mut method.body));
                    }
                }
            }

            Stmt::Expression(_) | Stmt::Print(_) | Stmt::Var { .. } | Stmt::Return { .. } => {}
        })
    }
}

fn detach<'a>(slot: &mut Box<Stmt<'a>>) -> Stmt<'a> {
    mem::replace(slot.as_mut(), Stmt::Block(Vec::new()))
}
