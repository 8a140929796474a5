use std::io::Write;
use std::rc::Rc;

use crate::class::{Class, Instance};
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::stmt::INITIALIZER;
use crate::value::{NativeFunction, Value};

/// Anything a call expression can invoke.  The interpreter checks `arity`
/// against the argument count before calling.
pub trait Callable<'a> {
    fn arity(&self) -> usize;

    /// `line` is the call site, used for errors raised by the callee itself.
    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<'a, W>,
        arguments: Vec<Value<'a>>,
        line: usize,
    ) -> Result<Value<'a>, RuntimeError>;
}

impl<'a> Callable<'a> for NativeFunction<'a> {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call<W: Write>(
        &self,
        _interpreter: &mut Interpreter<'a, W>,
        arguments: Vec<Value<'a>>,
        line: usize,
    ) -> Result<Value<'a>, RuntimeError> {
        (self.func)(&arguments).map_err(|message| RuntimeError::Native {
            name: self.name,
            message,
            line,
        })
    }
}

/// Calling a class constructs an instance and runs `init` on it, if any.
impl<'a> Callable<'a> for Rc<Class<'a>> {
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER)
            .map_or(0, |initializer| initializer.arity())
    }

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<'a, W>,
        arguments: Vec<Value<'a>>,
        line: usize,
    ) -> Result<Value<'a>, RuntimeError> {
        let instance = Rc::new(Instance::new(Rc::clone(self)));

        if let Some(initializer) = self.find_method(INITIALIZER) {
            initializer
                .bind(Value::Instance(Rc::clone(&instance)))
                .call(interpreter, arguments, line)?;
        }

        Ok(Value::Instance(instance))
    }
}
