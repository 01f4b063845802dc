//! The Sigh type model.
//!
//! Types are cheap to clone: composite variants share their payload behind
//! `Arc`, which also lets them travel to the interpreter's worker threads.

use indexmap::IndexMap;
use sigh_syntax::NodeId;
use std::fmt;
use std::sync::Arc;

/// A Sigh type.
#[derive(Debug, Clone)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Void,
    Null,
    /// The type of type values (`var t: Type = S`).
    Type,
    /// Placeholder resolved from the initializer at declaration time.
    Auto,
    Array(Arc<Type>),
    Unborn(Arc<Type>),
    Fun(Arc<FunType>),
    Struct(Arc<StructType>),
    Class(Arc<ClassType>),
}

/// A function type: return type plus ordered parameter types.
#[derive(Debug, Clone, PartialEq)]
pub struct FunType {
    pub ret: Type,
    pub params: Vec<Type>,
}

/// A struct type. Field typing goes through the declaration node, so the
/// type itself only carries identity.
#[derive(Debug, Clone)]
pub struct StructType {
    pub name: String,
    pub decl: NodeId,
}

/// A class type: the field map covers variables, methods, nested type
/// members, and the synthetic `<constructor>`, in inheritance-chain order
/// (the class's own members first).
#[derive(Debug, Clone)]
pub struct ClassType {
    pub name: String,
    pub fields: IndexMap<String, Type>,
}

/// Outcome of adding one inherited or own member while building a class type.
pub enum AddField {
    Added,
    /// The name was already present with an identical method signature.
    SameSignature,
    /// The name was already present and at least one side is not a method.
    OverridesVariable,
    /// Both are methods but the signatures differ.
    SignatureMismatch { existing: Type },
}

impl ClassType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a member by name while walking the inheritance chain. The first
    /// occurrence of a name wins, so a subclass override shadows the parent
    /// as long as the signatures agree. Constructors are exempt: each class
    /// declares its own, with whatever parameters it wants.
    pub fn add_field(&mut self, name: &str, ty: Type) -> AddField {
        match self.fields.get(name) {
            None => {
                self.fields.insert(name.to_string(), ty);
                AddField::Added
            }
            Some(_) if name == "<constructor>" => AddField::SameSignature,
            Some(existing) => match (existing, &ty) {
                (Type::Fun(a), Type::Fun(b)) => {
                    if a == b {
                        AddField::SameSignature
                    } else {
                        AddField::SignatureMismatch {
                            existing: existing.clone(),
                        }
                    }
                }
                _ => AddField::OverridesVariable,
            },
        }
    }

    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields.get(name)
    }

    pub fn constructor(&self) -> Option<&FunType> {
        match self.fields.get("<constructor>") {
            Some(Type::Fun(fun)) => Some(fun),
            _ => None,
        }
    }

    /// Structural shape compatibility: a location of this class type accepts
    /// a value of type `other` iff `other` is a class providing every field
    /// of this class (except the constructor) with an identically named
    /// type. On failure, `error` explains which field broke the shape.
    pub fn can_be_assigned_with(&self, other: &Type, error: &mut String) -> bool {
        let Type::Class(other_class) = other else {
            error.push_str(&format!("Cannot assign {} to {}", other, self.name));
            return false;
        };
        for (name, field) in &self.fields {
            if name == "<constructor>" {
                continue;
            }
            match other_class.field(name) {
                None => {
                    error.push_str(&format!(
                        "Field {} {} is missing in {}",
                        name, field, other_class.name
                    ));
                    return false;
                }
                // Field types are compared by rendered name, so same-shaped
                // classes in field position stay compatible.
                Some(other_field) if field.to_string() != other_field.to_string() => {
                    error.push_str(&format!(
                        "Field {} has different types: {} and {}",
                        name, field, other_field
                    ));
                    return false;
                }
                Some(_) => {}
            }
        }
        true
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Int, Type::Int)
            | (Type::Float, Type::Float)
            | (Type::Bool, Type::Bool)
            | (Type::String, Type::String)
            | (Type::Void, Type::Void)
            | (Type::Null, Type::Null)
            | (Type::Type, Type::Type)
            | (Type::Auto, Type::Auto) => true,
            (Type::Array(a), Type::Array(b)) => a == b,
            (Type::Unborn(a), Type::Unborn(b)) => a == b,
            (Type::Fun(a), Type::Fun(b)) => a == b,
            // Structs are identified by their declaration, classes by name.
            (Type::Struct(a), Type::Struct(b)) => a.decl == b.decl,
            (Type::Class(a), Type::Class(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl Eq for Type {}

impl Type {
    /// Primitive types compare by value at run time.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Type::Int | Type::Float | Type::Bool | Type::String | Type::Type
        )
    }

    /// Types whose locations accept `null`. Strings sit on both sides of
    /// the fence: nullable like a reference, compared by value like a
    /// primitive.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Null
                | Type::String
                | Type::Array(_)
                | Type::Unborn(_)
                | Type::Fun(_)
                | Type::Struct(_)
                | Type::Class(_)
        )
    }

    pub fn array(element: Type) -> Type {
        Type::Array(Arc::new(element))
    }

    pub fn unborn(inner: Type) -> Type {
        Type::Unborn(Arc::new(inner))
    }

    pub fn fun(ret: Type, params: Vec<Type>) -> Type {
        Type::Fun(Arc::new(FunType { ret, params }))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("Int"),
            Type::Float => f.write_str("Float"),
            Type::Bool => f.write_str("Bool"),
            Type::String => f.write_str("String"),
            Type::Void => f.write_str("Void"),
            Type::Null => f.write_str("Null"),
            Type::Type => f.write_str("Type"),
            Type::Auto => f.write_str("Auto"),
            Type::Array(element) => write!(f, "{}[]", element),
            Type::Unborn(inner) => write!(f, "Unborn<{}>", inner),
            Type::Fun(fun) => {
                f.write_str("(")?;
                for (i, p) in fun.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", fun.ret)
            }
            Type::Struct(s) => f.write_str(&s.name),
            Type::Class(c) => f.write_str(&c.name),
        }
    }
}

/// Indicates whether a value of type `a` can be assigned to a location of
/// type `b`.
pub fn is_assignable_to(a: &Type, b: &Type) -> bool {
    if matches!(b, Type::Auto) {
        return true;
    }
    if matches!(a, Type::Void) || matches!(b, Type::Void) {
        return false;
    }
    if matches!(a, Type::Int) && matches!(b, Type::Float) {
        return true;
    }
    match (a, b) {
        (Type::Array(x), Type::Array(y)) => return is_assignable_to(x, y),
        (Type::Unborn(x), Type::Unborn(y)) => return is_assignable_to(x, y),
        _ => {}
    }
    matches!(a, Type::Null) && b.is_reference() || a == b
}

/// Indicates whether two types may be compared with `==` / `!=`.
pub fn is_comparable_to(a: &Type, b: &Type) -> bool {
    if matches!(a, Type::Void) || matches!(b, Type::Void) {
        return false;
    }
    a.is_reference() && b.is_reference()
        || a == b
        || matches!(a, Type::Int) && matches!(b, Type::Float)
        || matches!(a, Type::Float) && matches!(b, Type::Int)
}

/// Returns the common supertype of both types, if any.
pub fn common_supertype(a: &Type, b: &Type) -> Option<Type> {
    if matches!(a, Type::Void) || matches!(b, Type::Void) {
        None
    } else if is_assignable_to(a, b) {
        Some(b.clone())
    } else if is_assignable_to(b, a) {
        Some(a.clone())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, fields: &[(&str, Type)]) -> Type {
        let mut c = ClassType::new(name);
        for (n, t) in fields {
            c.add_field(n, t.clone());
        }
        Type::Class(Arc::new(c))
    }

    #[test]
    fn assignability_is_reflexive() {
        for ty in [
            Type::Int,
            Type::Float,
            Type::Bool,
            Type::String,
            Type::array(Type::Int),
            Type::unborn(Type::Float),
            Type::fun(Type::Void, vec![Type::Int]),
        ] {
            assert!(is_assignable_to(&ty, &ty), "{} -> {}", ty, ty);
        }
    }

    #[test]
    fn int_widens_to_float_not_back() {
        assert!(is_assignable_to(&Type::Int, &Type::Float));
        assert!(!is_assignable_to(&Type::Float, &Type::Int));
        assert!(is_assignable_to(
            &Type::array(Type::Int),
            &Type::array(Type::Float)
        ));
    }

    #[test]
    fn null_assigns_to_references_only() {
        assert!(is_assignable_to(&Type::Null, &Type::array(Type::Int)));
        assert!(is_assignable_to(&Type::Null, &Type::String));
        assert!(!is_assignable_to(&Type::Null, &Type::Int));
        assert!(!is_assignable_to(&Type::Null, &Type::Bool));
    }

    #[test]
    fn void_never_assigns() {
        assert!(!is_assignable_to(&Type::Void, &Type::Void));
        assert!(!is_assignable_to(&Type::Int, &Type::Void));
    }

    #[test]
    fn common_supertype_is_commutative() {
        let cases = [
            (Type::Int, Type::Float),
            (Type::Int, Type::Int),
            (Type::Null, Type::array(Type::Int)),
        ];
        for (a, b) in cases {
            assert_eq!(common_supertype(&a, &b), common_supertype(&b, &a));
        }
        assert_eq!(common_supertype(&Type::Int, &Type::Bool), None);
    }

    #[test]
    fn duck_typing_accepts_superset_shapes() {
        let father = class("Father", &[("x", Type::Int)]);
        let duck = class("Duck", &[("x", Type::Int), ("extra", Type::String)]);
        let Type::Class(father) = &father else { unreachable!() };

        let mut err = String::new();
        assert!(father.can_be_assigned_with(&duck, &mut err), "{}", err);
    }

    #[test]
    fn duck_typing_reports_missing_field() {
        let father = class("Father", &[("x", Type::Int)]);
        let other = class("Other", &[("y", Type::Int)]);
        let Type::Class(father) = &father else { unreachable!() };

        let mut err = String::new();
        assert!(!father.can_be_assigned_with(&other, &mut err));
        assert!(err.contains("Field x"));
        assert!(err.contains("is missing"));
    }

    #[test]
    fn constructor_is_ignored_by_shape_test() {
        let a = class(
            "A",
            &[("<constructor>", Type::fun(Type::Void, vec![])), ("x", Type::Int)],
        );
        let b = class(
            "B",
            &[
                ("<constructor>", Type::fun(Type::Void, vec![Type::String])),
                ("x", Type::Int),
            ],
        );
        let Type::Class(a) = &a else { unreachable!() };
        let mut err = String::new();
        assert!(a.can_be_assigned_with(&b, &mut err), "{}", err);
    }
}
