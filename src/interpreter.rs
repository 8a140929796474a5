use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::callable::Callable;
use crate::class::Class;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::function::Function;
use crate::stmt::{ClassDecl, FunctionKind, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{self, NativeFunction, Value};
use crate::ensure_sufficient_stack;

/// Default bound on nested guest calls before `StackOverflow` is raised.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

/// How a statement finished.  `Return` unwinds to the nearest call boundary
/// and is not an error.
#[derive(Debug, Clone)]
pub enum Flow<'a> {
    Normal,
    Return(Value<'a>),
}

/// Tree‑walking evaluator.  `print` output goes to `W` (stdout by default).
pub struct Interpreter<'a, W: Write = io::Stdout> {
    globals: Rc<RefCell<Environment<'a>>>,
    environment: Rc<RefCell<Environment<'a>>>,

    /// Resolver output: expression id → number of frames to walk.
    locals: HashMap<ExprId, usize>,

    out: W,
    depth: usize,
    max_depth: usize,
}

impl<'a> Interpreter<'a, io::Stdout> {
    /// Interpreter printing to stdout, with `clock` defined.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<'a> Default for Interpreter<'a, io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, W: Write> Interpreter<'a, W> {
    /// Creates an Interpreter writing to `out` and defines native functions
    /// such as `clock`.
    pub fn with_output(out: W) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new().into_shared();

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            depth: 0,
            max_depth: DEFAULT_MAX_CALL_DEPTH,
        };

        interpreter.define_native(value::clock());

        interpreter
    }

    pub fn with_max_call_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn define_native(&mut self, native: NativeFunction<'a>) {
        debug!("Defining native function '{}'", native.name);

        self.globals
            .borrow_mut()
            .define(native.name, Value::NativeFunction(Rc::new(native)));
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Record that the expression `id` refers to a binding `depth` frames up.
    /// Called by the resolver; ids without an entry are globals.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// failure aborts the run and is returned.
    pub fn interpret(&mut self, statements: &[Stmt<'a>]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                break;
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt<'a>) -> IResult<Flow<'a>> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt<'a>) -> IResult<Flow<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment =
                    Environment::with_enclosing(Rc::clone(&self.environment)).into_shared();
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = Function::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class(declaration) => {
                self.execute_class(declaration)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` in `environment`, restoring the current environment
    /// afterwards on every path, errors included.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt<'a>],
        environment: Rc<RefCell<Environment<'a>>>,
    ) -> IResult<Flow<'a>> {
        let previous = mem::replace(&mut self.environment, environment);

        let result = ensure_sufficient_stack(|| -> IResult<Flow<'a>> {
            for stmt in statements {
                if let Flow::Return(value) = self.execute(stmt)? {
                    return Ok(Flow::Return(value));
                }
            }
            Ok(Flow::Normal)
        });

        self.environment = previous;
        result
    }

    fn execute_class(&mut self, declaration: &ClassDecl<'a>) -> IResult<()> {
        let name = &declaration.name;
        debug!("Declaring class '{}'", name.lexeme);

        // Methods close over a scope that can already see the name.
        self.environment.borrow_mut().define(name.lexeme, Value::Nil);

        let superclass: Option<Rc<Class<'a>>> = match &declaration.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                // Reported at the superclass name, which may sit on a later line.
                _ => {
                    let line = match expr {
                        Expr::Variable {
                            name: superclass_name,
                            ..
                        } => superclass_name.line,
                        _ => name.line,
                    };
                    return Err(RuntimeError::InvalidSuperclass { line });
                }
            },
            None => None,
        };

        let enclosing = Rc::clone(&self.environment);

        if let Some(superclass) = &superclass {
            let mut environment = Environment::with_enclosing(Rc::clone(&enclosing));
            environment.define("super", Value::Class(Rc::clone(superclass)));
            self.environment = environment.into_shared();
        }

        let mut methods = HashMap::new();
        let mut statics = HashMap::new();

        for method in &declaration.methods {
            let function = Rc::new(Function::new(
                Rc::clone(method),
                Rc::clone(&self.environment),
                method.is_initializer(),
            ));

            match method.kind {
                FunctionKind::Static => statics.insert(method.name.lexeme, function),
                _ => methods.insert(method.name.lexeme, function),
            };
        }

        let class = Class::new(name.lexeme, superclass, methods, statics);

        self.environment = enclosing;

        info!("Class '{}' defined", name.lexeme);

        self.environment
            .borrow_mut()
            .assign(name.lexeme, Value::Class(Rc::new(class)), name.line)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr<'a>) -> IResult<Value<'a>> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr<'a>) -> IResult<Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(Rc::clone(s)),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                unary(operator, right)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuit = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                    None => {
                        self.globals
                            .borrow_mut()
                            .assign(name.lexeme, value.clone(), name.line)?
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;
                debug!("Calling a {} at line {}", callee.type_name(), paren.line);

                if !matches!(
                    callee,
                    Value::Function(_) | Value::NativeFunction(_) | Value::Class(_)
                ) {
                    return Err(RuntimeError::NotCallable { line: paren.line });
                }

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call_value(callee, values, paren.line)
            }

            Expr::Get { object, name } => {
                let value = match self.evaluate(object)? {
                    Value::Instance(instance) => instance.get(name)?,
                    Value::Class(class) => class.get(name)?,
                    _ => {
                        return Err(RuntimeError::NotAnInstance {
                            what: "properties",
                            line: name.line,
                        })
                    }
                };

                self.run_getter(value, name.line)
            }

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value = self.evaluate(value)?;
                    instance.set(name, value.clone());
                    Ok(value)
                }

                Value::Class(class) => {
                    let value = self.evaluate(value)?;
                    class.set(name, value.clone());
                    Ok(value)
                }

                _ => Err(RuntimeError::NotAnInstance {
                    what: "fields",
                    line: name.line,
                }),
            },

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    /// `super.method`: look the method up on the superclass only and bind it
    /// to the current `this`, one frame below the `super` frame.
    fn evaluate_super(
        &mut self,
        id: ExprId,
        keyword: &Token<'a>,
        method: &Token<'a>,
    ) -> IResult<Value<'a>> {
        let line = keyword.line;
        let unresolved = || RuntimeError::UndefinedVariable {
            name: "super".to_string(),
            line,
        };

        let distance = *self.locals.get(&id).ok_or_else(unresolved)?;

        let superclass = match Environment::get_at(&self.environment, distance, "super", line)? {
            Value::Class(class) => class,
            _ => return Err(RuntimeError::InvalidSuperclass { line }),
        };

        let this_distance = distance.checked_sub(1).ok_or_else(unresolved)?;
        let this = Environment::get_at(&self.environment, this_distance, "this", line)?;

        let function = superclass.find_method(method.lexeme).ok_or_else(|| {
            RuntimeError::UndefinedProperty {
                name: method.lexeme.to_string(),
                owner: superclass.name().to_string(),
                line: method.line,
            }
        })?;

        let bound = Value::Function(Rc::new(function.bind(this)));
        self.run_getter(bound, method.line)
    }

    fn look_up_variable(&self, id: ExprId, name: &Token<'a>) -> IResult<Value<'a>> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::get_at(&self.environment, distance, name.lexeme, name.line)
            }
            None => self.globals.borrow().get(name.lexeme, name.line),
        }
    }

    /// A getter fetched as a property runs at once with no arguments.
    fn run_getter(&mut self, value: Value<'a>, line: usize) -> IResult<Value<'a>> {
        if let Value::Function(function) = &value {
            if function.is_getter() {
                return self.invoke(function.as_ref(), Vec::new(), line);
            }
        }

        Ok(value)
    }

    fn call_value(
        &mut self,
        callee: Value<'a>,
        arguments: Vec<Value<'a>>,
        line: usize,
    ) -> IResult<Value<'a>> {
        match callee {
            Value::Function(function) => self.invoke(function.as_ref(), arguments, line),
            Value::NativeFunction(native) => self.invoke(native.as_ref(), arguments, line),
            Value::Class(class) => self.invoke(&class, arguments, line),
            _ => Err(RuntimeError::NotCallable { line }),
        }
    }

    /// Arity check, depth accounting and the call itself.
    fn invoke<C: Callable<'a>>(
        &mut self,
        callable: &C,
        arguments: Vec<Value<'a>>,
        line: usize,
    ) -> IResult<Value<'a>> {
        if arguments.len() != callable.arity() {
            return Err(RuntimeError::Arity {
                expected: callable.arity(),
                got: arguments.len(),
                line,
            });
        }

        if self.depth >= self.max_depth {
            return Err(RuntimeError::StackOverflow {
                limit: self.max_depth,
                line,
            });
        }

        self.depth += 1;
        let result = ensure_sufficient_stack(|| callable.call(self, arguments, line));
        self.depth -= 1;

        result
    }
}

fn unary<'a>(operator: &Token<'a>, right: Value<'a>) -> IResult<Value<'a>> {
    match operator.token_type {
        TokenType::MINUS => match right {
            Value::Number(n) => Ok(Value::Number(-n)),
            _ => Err(RuntimeError::OperandMustBeNumber {
                operator: operator.lexeme.to_string(),
                line: operator.line,
            }),
        },

        TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),

        _ => unreachable!("Invalid unary operator"),
    }
}

fn binary<'a>(operator: &Token<'a>, left: Value<'a>, right: Value<'a>) -> IResult<Value<'a>> {
    match operator.token_type {
        TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left == right)),
        TokenType::BANG_EQUAL => return Ok(Value::Bool(left != right)),
        TokenType::PLUS => {
            return match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => {
                    Ok(Value::String(format!("{}{}", a, b).into()))
                }
                _ => Err(RuntimeError::OperandsMustBeNumbersOrStrings {
                    operator: operator.lexeme.to_string(),
                    line: operator.line,
                }),
            }
        }
        _ => {}
    }

    let (a, b) = match (left, right) {
        (Value::Number(a), Value::Number(b)) => (a, b),
        _ => {
            return Err(RuntimeError::OperandsMustBeNumbers {
                operator: operator.lexeme.to_string(),
                line: operator.line,
            })
        }
    };

    Ok(match operator.token_type {
        TokenType::MINUS => Value::Number(a - b),
        TokenType::STAR => Value::Number(a * b),
        TokenType::SLASH => Value::Number(a / b),
        TokenType::GREATER => Value::Bool(a > b),
        TokenType::GREATER_EQUAL => Value::Bool(a >= b),
        TokenType::LESS => Value::Bool(a < b),
        TokenType::LESS_EQUAL => Value::Bool(a <= b),
        _ => unreachable!("Invalid binary operator"),
    })
}
