use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One scope frame.  Frames are shared by every closure that captured them,
/// so they live behind `Rc<RefCell<..>>`; the chain towards the globals is
/// acyclic even when a frame holds a closure over itself.
#[derive(Debug, Clone, Default)]
pub struct Environment<'a> {
    values: HashMap<&'a str, Value<'a>>,
    enclosing: Option<Rc<RefCell<Environment<'a>>>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment<'a>>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap into the shared handle used throughout the interpreter.
    pub fn into_shared(self) -> Rc<RefCell<Environment<'a>>> {
        Rc::new(RefCell::new(self))
    }

    /// Insert or overwrite a binding in this frame only.
    pub fn define(&mut self, name: &'a str, value: Value<'a>) {
        self.values.insert(name, value);
    }

    /// Look `name` up here, then in each enclosing frame.
    pub fn get(&self, name: &str, line: usize) -> Result<Value<'a>, RuntimeError> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Overwrite the nearest existing binding of `name`.  Never creates one.
    pub fn assign(&mut self, name: &str, value: Value<'a>, line: usize) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// The frame `distance` links up the chain from `env` (0 is `env` itself).
    pub fn ancestor(
        env: &Rc<RefCell<Environment<'a>>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment<'a>>>> {
        let mut frame = Rc::clone(env);

        for _ in 0..distance {
            let parent = frame.borrow().enclosing.clone()?;
            frame = parent;
        }

        Some(frame)
    }

    /// Read `name` from exactly the frame `distance` links up, no search.
    pub fn get_at(
        env: &Rc<RefCell<Environment<'a>>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Value<'a>, RuntimeError> {
        Self::ancestor(env, distance)
            .and_then(|frame| frame.borrow().values.get(name).cloned())
            .ok_or_else(|| undefined(name, line))
    }

    /// Write `name` in exactly the frame `distance` links up, no search.
    pub fn assign_at(
        env: &Rc<RefCell<Environment<'a>>>,
        distance: usize,
        name: &str,
        value: Value<'a>,
        line: usize,
    ) -> Result<(), RuntimeError> {
        let frame = Self::ancestor(env, distance).ok_or_else(|| undefined(name, line))?;
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name, line)),
        }
    }
}

fn undefined(name: &str, line: usize) -> RuntimeError {
    RuntimeError::UndefinedVariable {
        name: name.to_string(),
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (Rc<RefCell<Environment<'static>>>, Rc<RefCell<Environment<'static>>>) {
        let globals = Environment::new().into_shared();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&globals)).into_shared();
        inner.borrow_mut().define("b", Value::Number(2.0));

        (globals, inner)
    }

    #[test]
    fn get_walks_outward() {
        let (_globals, inner) = chain();

        assert_eq!(inner.borrow().get("a", 1).unwrap(), Value::Number(1.0));
        assert_eq!(inner.borrow().get("b", 1).unwrap(), Value::Number(2.0));
        assert!(matches!(
            inner.borrow().get("c", 7),
            Err(RuntimeError::UndefinedVariable { line: 7, .. })
        ));
    }

    #[test]
    fn assign_mutates_owner_and_never_defines() {
        let (globals, inner) = chain();

        inner
            .borrow_mut()
            .assign("a", Value::Bool(true), 1)
            .unwrap();
        assert_eq!(globals.borrow().get("a", 1).unwrap(), Value::Bool(true));

        assert!(inner.borrow_mut().assign("nope", Value::Nil, 3).is_err());
        assert!(inner.borrow().get("nope", 3).is_err());
    }

    #[test]
    fn distance_access_skips_shadowing_frames() {
        let (globals, inner) = chain();
        inner.borrow_mut().define("a", Value::Number(10.0));

        assert_eq!(
            Environment::get_at(&inner, 0, "a", 1).unwrap(),
            Value::Number(10.0)
        );
        assert_eq!(
            Environment::get_at(&inner, 1, "a", 1).unwrap(),
            Value::Number(1.0)
        );

        Environment::assign_at(&inner, 1, "a", Value::Nil, 1).unwrap();
        assert_eq!(globals.borrow().get("a", 1).unwrap(), Value::Nil);
        assert_eq!(
            Environment::get_at(&inner, 0, "a", 1).unwrap(),
            Value::Number(10.0)
        );

        // Past the root, or a frame without the name.
        assert!(Environment::get_at(&inner, 2, "a", 1).is_err());
        assert!(Environment::get_at(&inner, 0, "zzz", 1).is_err());
    }
}
