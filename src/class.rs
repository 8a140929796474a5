use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::function::Function;
use crate::token::Token;
use crate::value::Value;

/// A class value.  It also behaves as its own instance: static methods and
/// fields stored on the class are reached with `Class.name`.
pub struct Class<'a> {
    name: &'a str,
    superclass: Option<Rc<Class<'a>>>,
    methods: HashMap<&'a str, Rc<Function<'a>>>,
    statics: HashMap<&'a str, Rc<Function<'a>>>,
    fields: RefCell<HashMap<&'a str, Value<'a>>>,
}

impl<'a> Class<'a> {
    pub fn new(
        name: &'a str,
        superclass: Option<Rc<Class<'a>>>,
        methods: HashMap<&'a str, Rc<Function<'a>>>,
        statics: HashMap<&'a str, Rc<Function<'a>>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
            statics,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Instance method defined here or inherited.  Absence is not an error.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function<'a>>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self.superclass.as_ref()?.find_method(name),
        }
    }

    /// Static method defined here or inherited.
    pub fn find_static(&self, name: &str) -> Option<Rc<Function<'a>>> {
        match self.statics.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self.superclass.as_ref()?.find_static(name),
        }
    }

    /// `Class.name`: a field set on the class, else a static method bound
    /// with `this` = the class.
    pub fn get(self: &Rc<Self>, name: &Token<'a>) -> Result<Value<'a>, RuntimeError> {
        if let Some(value) = self.fields.borrow().get(name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = self.find_static(name.lexeme) {
            let bound = method.bind(Value::Class(Rc::clone(self)));
            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(RuntimeError::UndefinedProperty {
            name: name.lexeme.to_string(),
            owner: self.name.to_string(),
            line: name.line,
        })
    }

    pub fn set(&self, name: &Token<'a>, value: Value<'a>) {
        self.fields.borrow_mut().insert(name.lexeme, value);
    }
}

impl fmt::Debug for Class<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.name)
    }
}

/// An object created by calling a class.  Fields appear on first assignment.
pub struct Instance<'a> {
    class: Rc<Class<'a>>,
    fields: RefCell<HashMap<&'a str, Value<'a>>>,
}

impl<'a> Instance<'a> {
    pub fn new(class: Rc<Class<'a>>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn class(&self) -> &Rc<Class<'a>> {
        &self.class
    }

    /// Fields shadow methods; a method comes back bound to this instance.
    pub fn get(self: &Rc<Self>, name: &Token<'a>) -> Result<Value<'a>, RuntimeError> {
        if let Some(value) = self.fields.borrow().get(name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = self.class.find_method(name.lexeme) {
            let bound = method.bind(Value::Instance(Rc::clone(self)));
            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(RuntimeError::UndefinedProperty {
            name: name.lexeme.to_string(),
            owner: format!("{} instance", self.class.name),
            line: name.line,
        })
    }

    pub fn set(&self, name: &Token<'a>, value: Value<'a>) {
        self.fields.borrow_mut().insert(name.lexeme, value);
    }
}

impl fmt::Debug for Instance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.class.name)
    }
}
