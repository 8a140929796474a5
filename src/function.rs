use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::callable::Callable;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Flow, Interpreter};
use crate::stmt::{FunctionDecl, FunctionKind};
use crate::value::Value;

/// A user‑defined function or method paired with the frame it closed over.
pub struct Function<'a> {
    declaration: Rc<FunctionDecl<'a>>,
    closure: Rc<RefCell<Environment<'a>>>,
    is_initializer: bool,
}

impl<'a> Function<'a> {
    pub fn new(
        declaration: Rc<FunctionDecl<'a>>,
        closure: Rc<RefCell<Environment<'a>>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &'a str {
        self.declaration.name.lexeme
    }

    pub fn kind(&self) -> FunctionKind {
        self.declaration.kind
    }

    pub fn is_getter(&self) -> bool {
        self.declaration.kind == FunctionKind::Getter
    }

    /// Same declaration, new closure frame holding `this`.
    pub fn bind(&self, this: Value<'a>) -> Function<'a> {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", this);

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: environment.into_shared(),
            is_initializer: self.is_initializer,
        }
    }
}

impl<'a> Callable<'a> for Function<'a> {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<'a, W>,
        arguments: Vec<Value<'a>>,
        line: usize,
    ) -> Result<Value<'a>, RuntimeError> {
        debug!("Calling '{}' with {} argument(s)", self.name(), arguments.len());

        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(param.lexeme, argument);
        }

        let flow = interpreter.execute_block(&self.declaration.body, environment.into_shared())?;

        // An initializer yields its instance whatever the body returned.
        if self.is_initializer {
            return Environment::get_at(&self.closure, 0, "this", line);
        }

        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        })
    }
}

impl fmt::Debug for Function<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({:?} {})", self.kind(), self.name())
    }
}
