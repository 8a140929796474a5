pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use std::io::Write;

use log::info;

use error::LoxError;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;

/// Grow the host stack once less than this much is left (100KB red zone).
pub(crate) const RED_ZONE: usize = 100 * 1024;

/// Size of each additional stack segment (1MB).
pub(crate) const STACK_GROWTH: usize = 1024 * 1024;

/// Run `f`, first moving to a fresh stack segment if less than [`RED_ZONE`]
/// remains.  Every recursive walk over the tree goes through here, so guest
/// nesting depth is bounded by memory rather than by the host thread stack.
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_GROWTH, f)
}

/// Scan, parse, resolve and run `source`, writing `print` output to `out`.
///
/// Lexing and parsing diagnostics are returned together and stop the run
/// before resolution; resolver diagnostics stop it before execution; a
/// runtime failure aborts the program and is returned alone.
pub fn run<W: Write>(
    source: &str,
    out: W,
    max_call_depth: usize,
) -> std::result::Result<(), Vec<LoxError>> {
    let (tokens, mut errors) = scanner::scan_tokens(source);
    let (statements, parse_errors) = Parser::new(&tokens).parse();
    errors.extend(parse_errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut interpreter = Interpreter::with_output(out).with_max_call_depth(max_call_depth);

    Resolver::new(&mut interpreter).resolve(&statements)?;

    info!("Running {} statement(s)", statements.len());

    interpreter
        .interpret(&statements)
        .map_err(|e| vec![LoxError::Runtime(e)])
}
