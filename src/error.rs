//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! Scanner, parser and resolver report *diagnostics* as [`LoxError`] values
//! collected into a `Vec`; evaluation fails with a typed [`RuntimeError`].
//! A `return` in guest code is **not** an error and never appears here (see
//! [`crate::interpreter::Flow`]).
//!
//! The module **does not** print diagnostics itself

use std::io;
use thiserror::Error;

use log::debug;

use crate::token::Token;

/// Canonical diagnostic type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        /// ` at 'lexeme'` or ` at end`.
        location: String,
    },

    /// Static‑analysis failure (scope rules checked by the resolver).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Source line the diagnostic points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. } => Some(*line),
            LoxError::Runtime(e) => e.line(),
            LoxError::Io(_) | LoxError::Utf8(_) => None,
        }
    }

    /// True for diagnostics found before execution starts (exit code 65).
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

fn location(token: &Token<'_>) -> String {
    if token.is_eof() {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// A failure raised while executing a program. Exactly one of these aborts an
/// [`Interpreter::interpret`](crate::interpreter::Interpreter::interpret) run.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("[line {line}] Error: Undefined variable '{name}'.")]
    UndefinedVariable { name: String, line: usize },

    /// `owner` is what was searched, e.g. `Point instance` or `Point`.
    #[error("[line {line}] Error: Undefined property '{name}' on {owner}.")]
    UndefinedProperty {
        name: String,
        owner: String,
        line: usize,
    },

    #[error("[line {line}] Error: Operand of '{operator}' must be a number.")]
    OperandMustBeNumber { operator: String, line: usize },

    #[error("[line {line}] Error: Operands of '{operator}' must be numbers.")]
    OperandsMustBeNumbers { operator: String, line: usize },

    #[error("[line {line}] Error: Operands of '{operator}' must be two numbers or two strings.")]
    OperandsMustBeNumbersOrStrings { operator: String, line: usize },

    #[error("[line {line}] Error: Expected {expected} arguments but got {got}.")]
    Arity {
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("[line {line}] Error: Can only call functions and classes.")]
    NotCallable { line: usize },

    /// `what` is `properties` for reads and `fields` for writes.
    #[error("[line {line}] Error: Only instances have {what}.")]
    NotAnInstance { what: &'static str, line: usize },

    #[error("[line {line}] Error: Superclass must be a class.")]
    InvalidSuperclass { line: usize },

    #[error("[line {line}] Error: Stack overflow (call depth exceeded {limit}).")]
    StackOverflow { limit: usize, line: usize },

    #[error("[line {line}] Error: {name}: {message}")]
    Native {
        name: &'static str,
        message: String,
        line: usize,
    },

    /// Writing to the program output sink failed.
    #[error("Error: could not write program output: {0}")]
    Output(#[from] io::Error),
}

impl RuntimeError {
    pub fn line(&self) -> Option<usize> {
        match self {
            RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::UndefinedProperty { line, .. }
            | RuntimeError::OperandMustBeNumber { line, .. }
            | RuntimeError::OperandsMustBeNumbers { line, .. }
            | RuntimeError::OperandsMustBeNumbersOrStrings { line, .. }
            | RuntimeError::Arity { line, .. }
            | RuntimeError::NotCallable { line }
            | RuntimeError::NotAnInstance { line, .. }
            | RuntimeError::InvalidSuperclass { line }
            | RuntimeError::StackOverflow { line, .. }
            | RuntimeError::Native { line, .. } => Some(*line),
            RuntimeError::Output(_) => None,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
