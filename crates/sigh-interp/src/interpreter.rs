//! The tree-walking interpreter.
//!
//! Execution model: one storage chain per thread index, kept in a concurrent
//! map. The main program runs on index `0`; every async function call
//! allocates a frame under the callee's own index, linked to the caller's
//! current frame, and spawns an OS thread over it. `born(f[, v])` joins the
//! thread for `f` and optionally moves its recorded return value into `v`.
//!
//! Function calls save the caller's current frame and restore it on every
//! exit path; block frames are popped only on normal completion, because a
//! `return` unwinds to the call and the wholesale restore cleans up.

use crate::storage::ScopeStorage;
use crate::value::{ClassInstance, Value};
use crate::lock;
use dashmap::DashMap;
use sigh_analysis::{Analysis, ScopeId, ScopeKind};
use sigh_common::Span;
use sigh_syntax::{Ast, BinaryOp, NodeId, NodeKind, SyntheticKind, UnaryOp};
use sigh_types::Type;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;
use thiserror::Error;

/// Errors that terminate an interpretation.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero { span: Span },

    #[error("integer overflow")]
    IntegerOverflow { span: Span },

    #[error("{message}")]
    NullPointer { message: String, span: Span },

    #[error("{message}")]
    IndexOutOfBounds { message: String, span: Span },

    #[error("{message}")]
    Born { message: String, span: Span },

    #[error("{message}")]
    Interpreter { message: String, span: Span },
}

impl RuntimeError {
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::DivisionByZero { span }
            | RuntimeError::IntegerOverflow { span }
            | RuntimeError::NullPointer { span, .. }
            | RuntimeError::IndexOutOfBounds { span, .. }
            | RuntimeError::Born { span, .. }
            | RuntimeError::Interpreter { span, .. } => *span,
        }
    }
}

/// Non-local control flow during evaluation.
enum Signal {
    /// A `return` statement unwinding to the enclosing call.
    Return(Option<Value>),
    Error(RuntimeError),
}

impl From<RuntimeError> for Signal {
    fn from(error: RuntimeError) -> Self {
        Signal::Error(error)
    }
}

type Exec<T> = Result<T, Signal>;

/// The interpreter. Cloning is cheap and shares all runtime state; spawned
/// async bodies run on clones.
#[derive(Clone)]
pub struct Interpreter {
    inner: Arc<Inner>,
}

struct Inner {
    ast: Ast,
    analysis: Analysis,
    /// Thread index to the top frame of that thread's chain.
    storage: DashMap<u64, Arc<ScopeStorage>>,
    root_scope: OnceLock<ScopeId>,
    root_storage: OnceLock<Arc<ScopeStorage>>,
    /// Async function name to its running thread.
    threads: Mutex<HashMap<String, JoinHandle<()>>>,
    /// Return values recorded by async functions, keyed by thread index.
    return_values: DashMap<u64, Value>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl Interpreter {
    pub fn new(ast: Ast, analysis: Analysis) -> Self {
        Self::with_output(ast, analysis, Box::new(std::io::stdout()))
    }

    /// Use a custom sink for `print`, e.g. a buffer in tests.
    pub fn with_output(ast: Ast, analysis: Analysis, output: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(Inner {
                ast,
                analysis,
                storage: DashMap::new(),
                root_scope: OnceLock::new(),
                root_storage: OnceLock::new(),
                threads: Mutex::new(HashMap::new()),
                return_values: DashMap::new(),
                output: Mutex::new(output),
            }),
        }
    }

    /// Run the program. The result is the value of a top-level `return`, if
    /// any. Threads of async functions the program never `born`ed are joined
    /// before returning.
    pub fn interpret(&self) -> Result<Option<Value>, RuntimeError> {
        let Some(root) = self.ast().root else {
            return Ok(None);
        };
        let scope = match self.analysis().scope_of(root) {
            Some(scope) => scope,
            None => return Err(self.internal("program was not analyzed", root)),
        };

        let frame = Arc::new(ScopeStorage::new(scope, None));
        for (name, decl) in self.analysis().scopes.declarations(scope) {
            if let NodeKind::Synthetic {
                kind: SyntheticKind::Variable,
                ..
            } = self.ast().kind(decl)
            {
                let value = match name {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    _ => Value::Null,
                };
                frame.set_local(name, value);
            }
        }
        self.inner.root_scope.set(scope).ok();
        self.inner.root_storage.set(frame.clone()).ok();
        self.inner.storage.insert(0, frame);

        let NodeKind::Root { statements } = self.ast().kind(root) else {
            return Ok(None);
        };
        let statements = statements.clone();

        let mut outcome = Ok(None);
        for statement in statements {
            match self.eval(statement) {
                Ok(_) => {}
                Err(Signal::Return(value)) => {
                    outcome = Ok(value);
                    break;
                }
                Err(Signal::Error(error)) => {
                    outcome = Err(error);
                    break;
                }
            }
        }

        self.join_remaining();
        outcome
    }

    /// Join every async thread still in the pool, ignoring failures.
    fn join_remaining(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut threads = lock(&self.inner.threads);
            threads.drain().map(|(_, handle)| handle).collect()
        };
        for handle in handles {
            let _ = handle.join();
        }
    }

    // ── Shared accessors ────────────────────────────────────────────

    fn ast(&self) -> &Ast {
        &self.inner.ast
    }

    fn analysis(&self) -> &Analysis {
        &self.inner.analysis
    }

    fn thread_of(&self, node: NodeId) -> u64 {
        self.inner.analysis.thread_index(node)
    }

    fn internal(&self, message: impl Into<String>, node: NodeId) -> RuntimeError {
        RuntimeError::Interpreter {
            message: message.into(),
            span: self.ast().span(node),
        }
    }

    fn scope_of(&self, node: NodeId) -> Exec<ScopeId> {
        self.analysis()
            .scope_of(node)
            .ok_or_else(|| self.internal("missing scope attribute", node).into())
    }

    fn current_frame(&self, thread: u64) -> Option<Arc<ScopeStorage>> {
        self.inner
            .storage
            .get(&thread)
            .map(|entry| Arc::clone(entry.value()))
    }

    fn set_frame(&self, thread: u64, frame: Arc<ScopeStorage>) {
        self.inner.storage.insert(thread, frame);
    }

    fn restore_frame(&self, thread: u64, frame: Option<Arc<ScopeStorage>>) {
        match frame {
            Some(frame) => {
                self.inner.storage.insert(thread, frame);
            }
            None => {
                self.inner.storage.remove(&thread);
            }
        }
    }

    /// The innermost frame of a chain able to answer for `target`.
    fn frame_for(&self, thread: u64, target: ScopeId) -> Option<Arc<ScopeStorage>> {
        let scopes = &self.analysis().scopes;
        let mut frame = self.current_frame(thread);
        while let Some(current) = frame {
            if scopes.frame_matches(self.ast(), current.scope, target) {
                return Some(current);
            }
            frame = current.parent.clone();
        }
        None
    }

    fn read_variable(&self, node: NodeId, scope: ScopeId, name: &str) -> Exec<Value> {
        if Some(&scope) == self.inner.root_scope.get() {
            if let Some(root) = self.inner.root_storage.get() {
                return Ok(root.get_local(name).unwrap_or(Value::Null));
            }
        }
        let thread = self.thread_of(node);
        match self.frame_for(thread, scope) {
            Some(frame) => Ok(frame.get_local(name).unwrap_or(Value::Null)),
            None => Err(self
                .internal(format!("no storage frame holds `{}`", name), node)
                .into()),
        }
    }

    /// Store a value, widening `Int` to `Float` when the target asks for it.
    fn assign_value(
        &self,
        node: NodeId,
        scope: ScopeId,
        name: &str,
        mut value: Value,
        target_ty: Option<&Type>,
        thread: u64,
    ) -> Exec<()> {
        if let (Value::Int(int), Some(Type::Float)) = (&value, target_ty) {
            value = Value::Float(*int as f64);
        }
        if Some(&scope) == self.inner.root_scope.get() {
            if let Some(root) = self.inner.root_storage.get() {
                root.set_local(name, value);
                return Ok(());
            }
        }
        match self.frame_for(thread, scope) {
            Some(frame) => {
                frame.set_local(name, value);
                Ok(())
            }
            None => Err(self
                .internal(format!("no storage frame holds `{}`", name), node)
                .into()),
        }
    }

    // ── Evaluation ──────────────────────────────────────────────────

    fn eval(&self, node: NodeId) -> Exec<Value> {
        match self.ast().kind(node) {
            NodeKind::IntLiteral(value) => Ok(Value::Int(*value)),
            NodeKind::FloatLiteral(value) => Ok(Value::Float(*value)),
            NodeKind::StringLiteral(value) => Ok(Value::string(value.clone())),
            NodeKind::Parenthesized { expression } => self.eval(*expression),

            NodeKind::ArrayLiteral { elements } => {
                let elements = elements.clone();
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element)?);
                }
                Ok(Value::array(values))
            }

            NodeKind::Reference { name } => {
                let name = name.clone();
                self.reference(node, &name)
            }

            NodeKind::Constructor { reference } => match self.eval(*reference)? {
                Value::TypeRef(decl)
                    if matches!(self.ast().kind(decl), NodeKind::StructDeclaration { .. }) =>
                {
                    Ok(Value::Constructor(decl))
                }
                _ => Err(self.internal("`$` applied to a non-struct value", node).into()),
            },

            NodeKind::FieldAccess { stem, field } => {
                let (stem, field) = (*stem, field.clone());
                self.field_access(node, stem, &field)
            }

            NodeKind::ArrayAccess { array, index } => {
                let (array, index) = (*array, *index);
                self.array_access(node, array, index)
            }

            NodeKind::FunCall {
                function,
                arguments,
            } => {
                let (function, arguments) = (*function, arguments.clone());
                self.fun_call(node, function, &arguments)
            }

            NodeKind::DaddyCall { arguments } => {
                let arguments = arguments.clone();
                self.daddy_call(node, &arguments)
            }

            NodeKind::Unary { op: UnaryOp::Not, operand } => {
                let operand = *operand;
                let value = self.eval(operand)?;
                let value = self.expect_bool(&value, operand)?;
                Ok(Value::Bool(!value))
            }

            NodeKind::Binary { op, left, right } => {
                let (op, left, right) = (*op, *left, *right);
                self.binary(node, op, left, right)
            }

            NodeKind::Assignment { left, right } => {
                let (left, right) = (*left, *right);
                self.assignment(node, left, right)
            }

            NodeKind::ExpressionStatement { expression } => {
                self.eval(*expression)?;
                Ok(Value::Null)
            }

            NodeKind::Block { statements } => {
                let statements = statements.clone();
                self.block(node, &statements)
            }

            NodeKind::VarDeclaration { name, initializer, .. } => {
                let (name, initializer) = (name.clone(), *initializer);
                self.var_decl(node, &name, initializer)
            }

            NodeKind::If {
                condition,
                true_branch,
                false_branch,
            } => {
                let (condition, true_branch, false_branch) =
                    (*condition, *true_branch, *false_branch);
                let value = self.eval(condition)?;
                if self.expect_bool(&value, condition)? {
                    self.eval(true_branch)?;
                } else if let Some(false_branch) = false_branch {
                    self.eval(false_branch)?;
                }
                Ok(Value::Null)
            }

            NodeKind::While { condition, body } => {
                let (condition, body) = (*condition, *body);
                loop {
                    let value = self.eval(condition)?;
                    if !self.expect_bool(&value, condition)? {
                        break;
                    }
                    self.eval(body)?;
                }
                Ok(Value::Null)
            }

            NodeKind::Return { expression } => {
                let expression = *expression;
                self.return_stmt(node, expression)
            }

            NodeKind::Born { function, variable } => {
                let (function, variable) = (*function, *variable);
                self.born_stmt(node, function, variable)
            }

            // Declarations and type syntax execute as no-ops.
            NodeKind::FunDeclaration { .. }
            | NodeKind::StructDeclaration { .. }
            | NodeKind::ClassDeclaration { .. }
            | NodeKind::FieldDeclaration { .. }
            | NodeKind::Parameter { .. }
            | NodeKind::Synthetic { .. }
            | NodeKind::SimpleType { .. }
            | NodeKind::ArrayType { .. }
            | NodeKind::UnbornType { .. }
            | NodeKind::Root { .. } => Ok(Value::Null),
        }
    }

    fn block(&self, node: NodeId, statements: &[NodeId]) -> Exec<Value> {
        let thread = self.thread_of(node);
        let scope = self.scope_of(node)?;
        let parent = self.current_frame(thread);
        self.set_frame(thread, Arc::new(ScopeStorage::new(scope, parent.clone())));

        for &statement in statements {
            self.eval(statement)?;
        }

        self.restore_frame(thread, parent);
        Ok(Value::Null)
    }

    fn reference(&self, node: NodeId, name: &str) -> Exec<Value> {
        let Some(decl) = self.analysis().decl_of(node) else {
            return Err(self
                .internal(format!("unresolved reference `{}`", name), node)
                .into());
        };

        match self.ast().kind(decl) {
            NodeKind::VarDeclaration { .. }
            | NodeKind::Parameter { .. }
            | NodeKind::Synthetic {
                kind: SyntheticKind::Variable,
                ..
            } => {
                let scope = self.scope_of(node)?;
                self.read_variable(node, scope, name)
            }
            NodeKind::FunDeclaration { .. }
            | NodeKind::Synthetic {
                kind: SyntheticKind::Function,
                ..
            } => Ok(Value::Fun(decl)),
            NodeKind::StructDeclaration { .. }
            | NodeKind::ClassDeclaration { .. }
            | NodeKind::Synthetic {
                kind: SyntheticKind::Type,
                ..
            } => Ok(Value::TypeRef(decl)),
            _ => Err(self
                .internal(format!("reference `{}` resolves to no value", name), node)
                .into()),
        }
    }

    fn var_decl(&self, node: NodeId, name: &str, initializer: NodeId) -> Exec<Value> {
        let value = self.eval(initializer)?;
        let scope = self.scope_of(node)?;
        let thread = self.thread_of(node);
        let target_ty = self.analysis().ty(node).cloned();
        self.assign_value(node, scope, name, value, target_ty.as_ref(), thread)?;
        Ok(Value::Null)
    }

    fn assignment(&self, node: NodeId, left: NodeId, right: NodeId) -> Exec<Value> {
        match self.ast().kind(left).clone() {
            NodeKind::Reference { name } => {
                let scope = self.scope_of(left)?;
                let value = self.eval(right)?;
                let target_ty = self.analysis().ty(node).cloned();
                self.assign_value(
                    node,
                    scope,
                    &name,
                    value.clone(),
                    target_ty.as_ref(),
                    self.thread_of(node),
                )?;
                Ok(value)
            }
            NodeKind::ArrayAccess { array, index } => {
                let elements = self.non_null_array(array)?;
                let position = self.checked_index(index)?;
                let value = self.eval(right)?;
                let mut elements = lock(&elements);
                if position >= elements.len() {
                    return Err(RuntimeError::IndexOutOfBounds {
                        message: format!(
                            "Index {} out of bounds for length {}",
                            position,
                            elements.len()
                        ),
                        span: self.ast().span(index),
                    }
                    .into());
                }
                elements[position] = value.clone();
                Ok(value)
            }
            NodeKind::FieldAccess { stem, field } => {
                let object = self.eval(stem)?;
                let value = self.eval(right)?;
                match object {
                    Value::Null => Err(RuntimeError::NullPointer {
                        message: "accessing field of null object".into(),
                        span: self.ast().span(stem),
                    }
                    .into()),
                    Value::Instance(instance) => {
                        instance.set_field(&field, value.clone());
                        Ok(value)
                    }
                    Value::Struct(fields) => {
                        lock(&fields).insert(field, value.clone());
                        Ok(value)
                    }
                    _ => Err(self
                        .internal("assigning a field of a non-object value", node)
                        .into()),
                }
            }
            _ => Err(self.internal("assigning to a non-lvalue expression", node).into()),
        }
    }

    fn field_access(&self, node: NodeId, stem: NodeId, field: &str) -> Exec<Value> {
        let value = self.eval(stem)?;
        match value {
            Value::Null => Err(RuntimeError::NullPointer {
                message: "accessing field of null object".into(),
                span: self.ast().span(node),
            }
            .into()),
            Value::Instance(instance) => Ok(instance.field(field).unwrap_or(Value::Null)),
            Value::Struct(fields) => Ok(lock(&fields).get(field).cloned().unwrap_or(Value::Null)),
            // The analyzer only lets `length` through on arrays.
            Value::Array(elements) => Ok(Value::Int(lock(&elements).len() as i64)),
            _ => Err(self
                .internal(format!("no field `{}` on this value", field), node)
                .into()),
        }
    }

    fn array_access(&self, node: NodeId, array: NodeId, index: NodeId) -> Exec<Value> {
        let elements = self.non_null_array(array)?;
        let position = self.checked_index(index)?;
        let elements = lock(&elements);
        if position >= elements.len() {
            return Err(RuntimeError::IndexOutOfBounds {
                message: format!(
                    "Index {} out of bounds for length {}",
                    position,
                    elements.len()
                ),
                span: self.ast().span(node),
            }
            .into());
        }
        Ok(elements[position].clone())
    }

    fn non_null_array(&self, node: NodeId) -> Exec<Arc<Mutex<Vec<Value>>>> {
        match self.eval(node)? {
            Value::Array(elements) => Ok(elements),
            Value::Null => Err(RuntimeError::NullPointer {
                message: "indexing null array".into(),
                span: self.ast().span(node),
            }
            .into()),
            _ => Err(self.internal("indexing a non-array value", node).into()),
        }
    }

    /// Evaluate an index expression and validate its range.
    fn checked_index(&self, node: NodeId) -> Exec<usize> {
        let value = self.eval(node)?;
        let Some(index) = value.as_int() else {
            return Err(self.internal("array index is not an Int", node).into());
        };
        if index < 0 {
            return Err(RuntimeError::IndexOutOfBounds {
                message: format!("Negative index: {}", index),
                span: self.ast().span(node),
            }
            .into());
        }
        if index >= i32::MAX as i64 - 1 {
            return Err(RuntimeError::IndexOutOfBounds {
                message: format!("Index exceeds max array index (2^31 - 2): {}", index),
                span: self.ast().span(node),
            }
            .into());
        }
        Ok(index as usize)
    }

    fn expect_bool(&self, value: &Value, node: NodeId) -> Exec<bool> {
        value
            .as_bool()
            .ok_or_else(|| self.internal("expected a Bool value", node).into())
    }

    // ── Operators ───────────────────────────────────────────────────

    fn binary(&self, node: NodeId, op: BinaryOp, left: NodeId, right: NodeId) -> Exec<Value> {
        // Logic operators short-circuit; nothing else does.
        if op.is_logic() {
            let left_value = self.eval(left)?;
            let left_value = self.expect_bool(&left_value, left)?;
            return match op {
                BinaryOp::And if !left_value => Ok(Value::Bool(false)),
                BinaryOp::Or if left_value => Ok(Value::Bool(true)),
                _ => {
                    let right_value = self.eval(right)?;
                    Ok(Value::Bool(self.expect_bool(&right_value, right)?))
                }
            };
        }

        let left_ty = self.analysis().ty(left).cloned();
        let right_ty = self.analysis().ty(right).cloned();
        let left_value = self.eval(left)?;
        let right_value = self.eval(right)?;

        if op == BinaryOp::Siblings {
            return self.sibling_check(node, &left_value, &right_value);
        }

        if op == BinaryOp::Add
            && (matches!(left_ty, Some(Type::String)) || matches!(right_ty, Some(Type::String)))
        {
            let text = format!("{}{}", self.render(&left_value), self.render(&right_value));
            return Ok(Value::string(text));
        }

        let floating = matches!(left_ty, Some(Type::Float)) || matches!(right_ty, Some(Type::Float));
        let numeric = floating || matches!(left_ty, Some(Type::Int));
        if numeric {
            return self.numeric_op(node, op, floating, &left_value, &right_value);
        }

        match op {
            BinaryOp::Eq | BinaryOp::Ne => {
                let primitive = left_ty.as_ref().is_some_and(Type::is_primitive);
                let equal = if primitive {
                    left_value == right_value
                } else {
                    left_value.same_reference(&right_value)
                };
                Ok(Value::Bool(if op == BinaryOp::Eq { equal } else { !equal }))
            }
            _ => Err(self.internal("operands do not fit this operator", node).into()),
        }
    }

    fn numeric_op(
        &self,
        node: NodeId,
        op: BinaryOp,
        floating: bool,
        left: &Value,
        right: &Value,
    ) -> Exec<Value> {
        let span = self.ast().span(node);
        if floating {
            let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                return Err(self.internal("expected numeric operands", node).into());
            };
            return Ok(match op {
                BinaryOp::Mul => Value::Float(a * b),
                BinaryOp::Div => Value::Float(a / b),
                BinaryOp::Rem => Value::Float(a % b),
                BinaryOp::Add => Value::Float(a + b),
                BinaryOp::Sub => Value::Float(a - b),
                BinaryOp::Gt => Value::Bool(a > b),
                BinaryOp::Lt => Value::Bool(a < b),
                BinaryOp::Ge => Value::Bool(a >= b),
                BinaryOp::Le => Value::Bool(a <= b),
                BinaryOp::Eq => Value::Bool(a == b),
                BinaryOp::Ne => Value::Bool(a != b),
                _ => return Err(self.internal("operator is not numeric", node).into()),
            });
        }

        let (Some(a), Some(b)) = (left.as_int(), right.as_int()) else {
            return Err(self.internal("expected Int operands", node).into());
        };
        let overflow = |value: Option<i64>| -> Exec<Value> {
            value
                .map(Value::Int)
                .ok_or(RuntimeError::IntegerOverflow { span }.into())
        };
        match op {
            BinaryOp::Mul => overflow(a.checked_mul(b)),
            BinaryOp::Add => overflow(a.checked_add(b)),
            BinaryOp::Sub => overflow(a.checked_sub(b)),
            BinaryOp::Div => {
                if b == 0 {
                    Err(RuntimeError::DivisionByZero { span }.into())
                } else {
                    overflow(a.checked_div(b))
                }
            }
            BinaryOp::Rem => {
                if b == 0 {
                    Err(RuntimeError::DivisionByZero { span }.into())
                } else {
                    overflow(a.checked_rem(b))
                }
            }
            BinaryOp::Gt => Ok(Value::Bool(a > b)),
            BinaryOp::Lt => Ok(Value::Bool(a < b)),
            BinaryOp::Ge => Ok(Value::Bool(a >= b)),
            BinaryOp::Le => Ok(Value::Bool(a <= b)),
            BinaryOp::Eq => Ok(Value::Bool(a == b)),
            BinaryOp::Ne => Ok(Value::Bool(a != b)),
            _ => Err(self.internal("operator is not numeric", node).into()),
        }
    }

    /// `a ciblingsOf b`: does `a`'s class shape accept `b`'s class?
    fn sibling_check(&self, node: NodeId, left: &Value, right: &Value) -> Exec<Value> {
        let left_class = self.class_type_of(node, left)?;
        let right_class = self.class_type_of(node, right)?;
        let Type::Class(left_class) = &left_class else {
            return Err(self.internal("siblings check on a non-class value", node).into());
        };
        let mut ignored = String::new();
        Ok(Value::Bool(
            left_class.can_be_assigned_with(&right_class, &mut ignored),
        ))
    }

    fn class_type_of(&self, node: NodeId, value: &Value) -> Exec<Type> {
        match value {
            Value::Instance(instance) => Ok(instance.ty.clone()),
            Value::TypeRef(decl) => match self.analysis().ty(*decl) {
                Some(ty @ Type::Class(_)) => Ok(ty.clone()),
                _ => Err(self.internal("siblings check on a non-class value", node).into()),
            },
            _ => Err(self.internal("siblings check on a non-class value", node).into()),
        }
    }

    // ── Calls ───────────────────────────────────────────────────────

    fn fun_call(&self, node: NodeId, function: NodeId, arguments: &[NodeId]) -> Exec<Value> {
        let thread = self.thread_of(node);

        // `instance.method(args)` resolves through the instance, not through
        // the field value.
        if let NodeKind::FieldAccess { stem, field } = self.ast().kind(function) {
            let (stem, field) = (*stem, field.clone());
            return self.method_call(node, stem, &field, arguments, thread);
        }

        let callee = self.eval(function)?;
        let args = self.eval_arguments(arguments)?;

        match callee {
            Value::Null => Err(RuntimeError::NullPointer {
                message: "calling a null function".into(),
                span: self.ast().span(function),
            }
            .into()),
            Value::Fun(decl) => match self.ast().kind(decl) {
                NodeKind::Synthetic { name, .. } => {
                    let name = name.clone();
                    self.builtin(node, &name, args)
                }
                _ => self.call_function(decl, args, thread),
            },
            Value::Constructor(decl) => self.build_struct(decl, args),
            Value::TypeRef(decl)
                if matches!(self.ast().kind(decl), NodeKind::ClassDeclaration { .. }) =>
            {
                self.construct(node, decl, args, thread)
            }
            _ => Err(self.internal("calling a non-function value", node).into()),
        }
    }

    fn eval_arguments(&self, arguments: &[NodeId]) -> Exec<Vec<Value>> {
        let mut values = Vec::with_capacity(arguments.len());
        for &argument in arguments {
            values.push(self.eval(argument)?);
        }
        Ok(values)
    }

    fn builtin(&self, node: NodeId, name: &str, args: Vec<Value>) -> Exec<Value> {
        match name {
            "print" => {
                let text = args
                    .first()
                    .map(|value| self.render(value))
                    .unwrap_or_default();
                let mut output = lock(&self.inner.output);
                writeln!(output, "{}", text)
                    .and_then(|_| output.flush())
                    .map_err(|error| self.internal(format!("print failed: {}", error), node))?;
                Ok(Value::string(text))
            }
            _ => Err(self
                .internal(format!("unknown built-in function `{}`", name), node)
                .into()),
        }
    }

    fn build_struct(&self, decl: NodeId, args: Vec<Value>) -> Exec<Value> {
        let NodeKind::StructDeclaration { fields, .. } = self.ast().kind(decl) else {
            return Err(self.internal("constructing a non-struct", decl).into());
        };
        let mut record = indexmap::IndexMap::new();
        for (&field, value) in fields.iter().zip(args) {
            let name = self.ast().decl_name(field).unwrap_or_default().to_string();
            record.insert(name, value);
        }
        Ok(Value::Struct(Arc::new(Mutex::new(record))))
    }

    fn parameter_names(&self, decl: NodeId) -> Vec<String> {
        let NodeKind::FunDeclaration { parameters, .. } = self.ast().kind(decl) else {
            return Vec::new();
        };
        parameters
            .iter()
            .map(|&p| self.ast().decl_name(p).unwrap_or_default().to_string())
            .collect()
    }

    /// An ordinary (or async) call of a declared function or method value.
    fn call_function(&self, decl: NodeId, args: Vec<Value>, thread: u64) -> Exec<Value> {
        let NodeKind::FunDeclaration {
            name,
            return_type,
            body,
            ..
        } = self.ast().kind(decl)
        else {
            return Err(self.internal("calling a non-function declaration", decl).into());
        };
        let (name, return_type, body) = (name.clone(), *return_type, *body);
        let fn_scope = self.scope_of(decl)?;
        let params = self.parameter_names(decl);

        let is_async = matches!(self.ast().kind(return_type), NodeKind::UnbornType { .. });
        if is_async {
            // The async frame lives under the callee's own thread index,
            // linked to the caller's current frame so enclosing variables
            // stay reachable.
            let async_thread = self.analysis().thread_index(decl);
            let frame = Arc::new(ScopeStorage::new(fn_scope, self.current_frame(thread)));
            for (param, arg) in params.iter().zip(args) {
                frame.set_local(param, arg);
            }
            self.set_frame(async_thread, frame);

            let interpreter = self.clone();
            let handle = std::thread::spawn(move || {
                if let Err(Signal::Error(error)) = interpreter.eval(body) {
                    eprintln!("error in async function: {}", error);
                }
            });
            lock(&self.inner.threads).insert(name, handle);
            return Ok(Value::Null);
        }

        let saved = self.current_frame(thread);
        let frame = Arc::new(ScopeStorage::new(fn_scope, saved.clone()));
        for (param, arg) in params.iter().zip(args) {
            frame.set_local(param, arg);
        }
        self.set_frame(thread, frame);

        let result = self.eval(body);
        self.restore_frame(thread, saved);

        match result {
            Ok(_) => Ok(Value::Null),
            Err(Signal::Return(value)) => Ok(value.unwrap_or(Value::Null)),
            Err(error) => Err(error),
        }
    }

    /// Class instantiation: field initializers run in the class-scope frame,
    /// then the constructor body; the finished frame refreshes the instance.
    fn construct(&self, node: NodeId, class_decl: NodeId, args: Vec<Value>, thread: u64) -> Exec<Value> {
        let class_scope = self.scope_of(class_decl)?;
        let Some(class_ty @ Type::Class(class)) = self.analysis().ty(class_decl) else {
            return Err(self.internal("class type is missing", class_decl).into());
        };
        let (class_ty, class) = (class_ty.clone(), class.clone());

        let Some(ctor_ctx) = self
            .analysis()
            .scopes
            .class_lookup(self.ast(), class_scope, "<constructor>")
        else {
            return Err(self.internal("class has no constructor", node).into());
        };
        let ctor = ctor_ctx.declaration;
        let ctor_scope = self.scope_of(ctor)?;
        let NodeKind::FunDeclaration { body: ctor_body, .. } = self.ast().kind(ctor) else {
            return Err(self.internal("constructor is not a method", node).into());
        };
        let ctor_body = *ctor_body;

        let saved = self.current_frame(thread);
        let class_frame = Arc::new(ScopeStorage::new(class_scope, saved.clone()));
        self.set_frame(thread, class_frame.clone());
        let ctor_frame = Arc::new(ScopeStorage::new(ctor_scope, Some(class_frame.clone())));
        self.set_frame(thread, ctor_frame.clone());

        let instance = Arc::new(ClassInstance::new(class_scope, class_ty));

        let run = || -> Exec<()> {
            // Field initializers, in inheritance-chain order.
            for field_name in class.fields.keys() {
                let Some(ctx) = self
                    .analysis()
                    .scopes
                    .class_lookup(self.ast(), class_scope, field_name)
                else {
                    continue;
                };
                if let NodeKind::VarDeclaration { initializer, .. } =
                    self.ast().kind(ctx.declaration)
                {
                    let value = self.eval(*initializer)?;
                    instance.set_field(field_name, value.clone());
                    class_frame.set_local(field_name, value);
                }
            }

            // Constructor arguments bind after the fields exist.
            for (param, arg) in self.parameter_names(ctor).iter().zip(args) {
                ctor_frame.set_local(param, arg);
            }

            self.eval(ctor_body)?;
            Ok(())
        };
        let result = run();

        self.refresh_instance(&instance, thread, &saved);
        self.restore_frame(thread, saved);

        match result {
            // A bare `return` from the constructor is fine.
            Ok(()) | Err(Signal::Return(_)) => Ok(Value::Instance(instance)),
            Err(error) => Err(error),
        }
    }

    /// `instance.method(args)`: resolve through the instance's class scope
    /// (honoring inheritance), run over a class frame prefilled with the
    /// instance's fields, and write the frame back into the instance.
    fn method_call(
        &self,
        node: NodeId,
        stem: NodeId,
        method_name: &str,
        arguments: &[NodeId],
        thread: u64,
    ) -> Exec<Value> {
        let instance = match self.eval(stem)? {
            Value::Instance(instance) => instance,
            Value::Null => {
                return Err(RuntimeError::NullPointer {
                    message: "calling a method on a null object".into(),
                    span: self.ast().span(stem),
                }
                .into())
            }
            _ => return Err(self.internal("calling a method on a non-class value", node).into()),
        };
        let args = self.eval_arguments(arguments)?;

        let class_scope = instance.scope;
        let Some(ctx) = self
            .analysis()
            .scopes
            .class_lookup(self.ast(), class_scope, method_name)
        else {
            return Err(self
                .internal(format!("method `{}` not found", method_name), node)
                .into());
        };
        let method = ctx.declaration;
        let NodeKind::FunDeclaration { body, .. } = self.ast().kind(method) else {
            return Err(self
                .internal(format!("`{}` is not a method", method_name), node)
                .into());
        };
        let body = *body;
        let method_scope = self.scope_of(method)?;

        let saved = self.current_frame(thread);
        let class_frame = Arc::new(ScopeStorage::new(class_scope, saved.clone()));
        for (name, value) in instance.fields_snapshot() {
            class_frame.set_local(&name, value);
        }
        self.set_frame(thread, class_frame.clone());
        let method_frame = Arc::new(ScopeStorage::new(method_scope, Some(class_frame)));
        for (param, arg) in self.parameter_names(method).iter().zip(args) {
            method_frame.set_local(param, arg);
        }
        self.set_frame(thread, method_frame);

        let result = self.eval(body);

        self.refresh_instance(&instance, thread, &saved);
        self.restore_frame(thread, saved);

        match result {
            // Without an explicit return the call yields nothing visible.
            Ok(_) => Ok(Value::Null),
            Err(Signal::Return(value)) => Ok(value.unwrap_or(Value::Null)),
            Err(error) => Err(error),
        }
    }

    /// Copy the innermost class-scope frame above `saved` back into the
    /// instance.
    fn refresh_instance(
        &self,
        instance: &Arc<ClassInstance>,
        thread: u64,
        saved: &Option<Arc<ScopeStorage>>,
    ) {
        let scopes = &self.analysis().scopes;
        let mut frame = self.current_frame(thread);
        while let Some(current) = frame {
            if let Some(saved) = saved {
                if Arc::ptr_eq(&current, saved) {
                    return;
                }
            }
            if scopes.get(current.scope).kind == ScopeKind::Class {
                for (name, value) in current.snapshot() {
                    instance.set_field(&name, value);
                }
                return;
            }
            frame = current.parent.clone();
        }
    }

    /// `Daddy(args)`: run the overridden parent method over the caller's
    /// chain, so it sees the same class-scope frame.
    fn daddy_call(&self, node: NodeId, arguments: &[NodeId]) -> Exec<Value> {
        let thread = self.thread_of(node);
        let Some(parent) = self.analysis().parent_method(node) else {
            return Err(self.internal("Daddy call has no resolved parent", node).into());
        };
        let args = self.eval_arguments(arguments)?;

        let NodeKind::FunDeclaration { body, .. } = self.ast().kind(parent) else {
            return Err(self.internal("Daddy call parent is not a method", node).into());
        };
        let body = *body;
        let parent_scope = self.scope_of(parent)?;

        let saved = self.current_frame(thread);
        let frame = Arc::new(ScopeStorage::new(parent_scope, saved.clone()));
        for (param, arg) in self.parameter_names(parent).iter().zip(args) {
            frame.set_local(param, arg);
        }
        self.set_frame(thread, frame);

        let result = self.eval(body);
        self.restore_frame(thread, saved);

        match result {
            Ok(_) => Ok(Value::Null),
            Err(Signal::Return(value)) => Ok(value.unwrap_or(Value::Null)),
            Err(error) => Err(error),
        }
    }

    // ── Statements with thread semantics ────────────────────────────

    fn return_stmt(&self, node: NodeId, expression: Option<NodeId>) -> Exec<Value> {
        let thread = self.thread_of(node);
        let value = match expression {
            Some(expression) => Some(self.eval(expression)?),
            None => None,
        };
        if thread == 0 {
            // Ordinary control flow: unwind to the enclosing call.
            Err(Signal::Return(value))
        } else {
            // Async functions record their result instead of unwinding.
            self.inner
                .return_values
                .insert(thread, value.unwrap_or(Value::Null));
            Ok(Value::Null)
        }
    }

    fn born_stmt(&self, node: NodeId, function: NodeId, variable: Option<NodeId>) -> Exec<Value> {
        let NodeKind::Reference { name: function_name } = self.ast().kind(function) else {
            return Err(self.internal("born expects a function name", node).into());
        };
        let function_name = function_name.clone();

        let handle = lock(&self.inner.threads).remove(&function_name);
        let Some(handle) = handle else {
            return Err(RuntimeError::Born {
                message: "Please call the async function before trying to born it.".into(),
                span: self.ast().span(node),
            }
            .into());
        };
        // An interrupted join is swallowed, like the rest of the teardown.
        let _ = handle.join();

        if let Some(variable) = variable {
            let NodeKind::Reference { name: variable_name } = self.ast().kind(variable) else {
                return Err(self.internal("born expects a variable name", node).into());
            };
            let variable_name = variable_name.clone();
            let scope = self.scope_of(node)?;

            let Some(function_ctx) =
                self.analysis()
                    .scopes
                    .lookup(self.ast(), scope, &function_name)
            else {
                return Err(self.internal("born function is not declared", node).into());
            };
            let Some(variable_ctx) =
                self.analysis()
                    .scopes
                    .lookup(self.ast(), scope, &variable_name)
            else {
                return Err(self.internal("born variable is not declared", node).into());
            };

            let async_thread = self.analysis().thread_index(function_ctx.declaration);
            let value = self
                .inner
                .return_values
                .get(&async_thread)
                .map(|entry| entry.value().clone())
                .unwrap_or(Value::Null);
            let target_ty = self.analysis().ty(variable_ctx.declaration).cloned();
            self.assign_value(
                node,
                variable_ctx.scope,
                &variable_name,
                value,
                target_ty.as_ref(),
                self.thread_of(node),
            )?;
        }
        Ok(Value::Null)
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// String conversion used by `print` and `+` on strings.
    fn render(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => {
                if value.fract() == 0.0 && value.is_finite() {
                    format!("{:.1}", value)
                } else {
                    value.to_string()
                }
            }
            Value::Bool(value) => value.to_string(),
            Value::Str(value) => value.as_ref().clone(),
            Value::Array(elements) => {
                let rendered: Vec<String> =
                    lock(elements).iter().map(|v| self.render(v)).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Struct(fields) => {
                let rendered: Vec<String> = lock(fields)
                    .iter()
                    .map(|(name, v)| format!("{}: {}", name, self.render(v)))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Value::Instance(instance) => format!("<{} instance>", instance.class_name()),
            Value::Fun(decl) | Value::TypeRef(decl) => self
                .ast()
                .decl_name(*decl)
                .unwrap_or("<declaration>")
                .to_string(),
            Value::Constructor(decl) => {
                format!("${}", self.ast().decl_name(*decl).unwrap_or_default())
            }
        }
    }
}
