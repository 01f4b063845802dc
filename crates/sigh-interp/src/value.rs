//! Runtime values.

use crate::lock;
use indexmap::IndexMap;
use sigh_analysis::ScopeId;
use sigh_syntax::NodeId;
use sigh_types::Type;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A runtime value.
///
/// Primitives are stored inline; arrays, structs and class instances are
/// shared references, so `==` on them means identity.
#[derive(Clone)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Arc<String>),
    Array(Arc<Mutex<Vec<Value>>>),
    /// A struct record: insertion-ordered field map.
    Struct(Arc<Mutex<IndexMap<String, Value>>>),
    Instance(Arc<ClassInstance>),
    /// A function value: the declaration node (or a built-in).
    Fun(NodeId),
    /// A `$Struct` constructor value.
    Constructor(NodeId),
    /// A struct or class declaration used as a value.
    TypeRef(NodeId),
}

impl Value {
    pub fn string(text: impl Into<String>) -> Value {
        Value::Str(Arc::new(text.into()))
    }

    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Arc::new(Mutex::new(elements)))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Identity comparison for reference values, used by `==` on
    /// non-primitive operands.
    pub fn same_reference(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Struct(a), Value::Struct(b)) => Arc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Arc::ptr_eq(a, b),
            (Value::Fun(a), Value::Fun(b)) => a == b,
            (Value::Constructor(a), Value::Constructor(b)) => a == b,
            (Value::TypeRef(a), Value::TypeRef(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => self.same_reference(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Str(value) => write!(f, "{:?}", value),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in lock(elements).iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", element)?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in lock(fields).iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {:?}", name, value)?;
                }
                write!(f, "}}")
            }
            Value::Instance(instance) => write!(f, "<{} instance>", instance.class_name()),
            Value::Fun(_) => write!(f, "<function>"),
            Value::Constructor(_) => write!(f, "<constructor>"),
            Value::TypeRef(_) => write!(f, "<type>"),
        }
    }
}

/// A class instance: its field values, its class scope, and its class type.
pub struct ClassInstance {
    fields: Mutex<IndexMap<String, Value>>,
    pub scope: ScopeId,
    pub ty: Type,
}

impl ClassInstance {
    pub fn new(scope: ScopeId, ty: Type) -> Self {
        Self {
            fields: Mutex::new(IndexMap::new()),
            scope,
            ty,
        }
    }

    pub fn class_name(&self) -> &str {
        match &self.ty {
            Type::Class(class) => &class.name,
            _ => "<class>",
        }
    }

    pub fn set_field(&self, name: &str, value: Value) {
        lock(&self.fields).insert(name.to_string(), value);
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        lock(&self.fields).get(name).cloned()
    }

    pub fn fields_snapshot(&self) -> Vec<(String, Value)> {
        lock(&self.fields)
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
