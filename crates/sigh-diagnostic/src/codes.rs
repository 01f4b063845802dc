//! Error codes for Sigh diagnostics.
//!
//! Codes group into the language's error families: lexing and parsing,
//! name resolution, shape (typing) errors, inheritance errors, control-flow
//! errors, asynchrony errors, and runtime errors.

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer errors (E0001 - E0099)
    UnexpectedCharacter,
    UnterminatedString,
    UnterminatedComment,
    InvalidEscape,
    InvalidNumber,

    // Parser errors (E0100 - E0199)
    UnexpectedToken,
    ExpectedExpression,
    ExpectedType,
    ExpectedIdentifier,
    UnclosedDelimiter,

    // Resolution errors (E0200 - E0299)
    UnresolvedName,
    UseBeforeDeclaration,
    WrongDeclarationKind,

    // Shape errors (E0300 - E0399)
    WrongArity,
    NotAssignable,
    IncompatibleClassShape,
    MissingField,
    NotIndexable,
    NonIntIndex,

    // Inheritance errors (E0400 - E0499)
    UndeclaredAncestor,
    AncestorNotAClass,
    CyclicInheritance,
    MissingConstructor,
    IllegalOverride,
    ReservedName,
    UncapitalizedClassName,

    // Control-flow errors (E0500 - E0599)
    MissingReturn,
    ReturnValueMismatch,
    DaddyOutsideMethod,

    // Async errors (E0600 - E0699)
    BornNonAsync,
    BornVoidResult,
    AsyncMethodAccess,
    BornBeforeCall,

    // Runtime errors (E0700 - E0799)
    DivisionByZero,
    IntegerOverflow,
    NullDereference,
    IndexOutOfBounds,
    InterpreterError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer
            ErrorCode::UnexpectedCharacter => "E0001",
            ErrorCode::UnterminatedString => "E0002",
            ErrorCode::UnterminatedComment => "E0003",
            ErrorCode::InvalidEscape => "E0004",
            ErrorCode::InvalidNumber => "E0005",

            // Parser
            ErrorCode::UnexpectedToken => "E0100",
            ErrorCode::ExpectedExpression => "E0101",
            ErrorCode::ExpectedType => "E0102",
            ErrorCode::ExpectedIdentifier => "E0103",
            ErrorCode::UnclosedDelimiter => "E0104",

            // Resolution
            ErrorCode::UnresolvedName => "E0200",
            ErrorCode::UseBeforeDeclaration => "E0201",
            ErrorCode::WrongDeclarationKind => "E0202",

            // Shape
            ErrorCode::WrongArity => "E0300",
            ErrorCode::NotAssignable => "E0301",
            ErrorCode::IncompatibleClassShape => "E0302",
            ErrorCode::MissingField => "E0303",
            ErrorCode::NotIndexable => "E0304",
            ErrorCode::NonIntIndex => "E0305",

            // Inheritance
            ErrorCode::UndeclaredAncestor => "E0400",
            ErrorCode::AncestorNotAClass => "E0401",
            ErrorCode::CyclicInheritance => "E0402",
            ErrorCode::MissingConstructor => "E0403",
            ErrorCode::IllegalOverride => "E0404",
            ErrorCode::ReservedName => "E0405",
            ErrorCode::UncapitalizedClassName => "E0406",

            // Control flow
            ErrorCode::MissingReturn => "E0500",
            ErrorCode::ReturnValueMismatch => "E0501",
            ErrorCode::DaddyOutsideMethod => "E0502",

            // Async
            ErrorCode::BornNonAsync => "E0600",
            ErrorCode::BornVoidResult => "E0601",
            ErrorCode::AsyncMethodAccess => "E0602",
            ErrorCode::BornBeforeCall => "E0603",

            // Runtime
            ErrorCode::DivisionByZero => "E0700",
            ErrorCode::IntegerOverflow => "E0701",
            ErrorCode::NullDereference => "E0702",
            ErrorCode::IndexOutOfBounds => "E0703",
            ErrorCode::InterpreterError => "E0704",
        }
    }

    /// Get a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer
            ErrorCode::UnexpectedCharacter => "unexpected character in input",
            ErrorCode::UnterminatedString => "string literal is not terminated",
            ErrorCode::UnterminatedComment => "comment is not terminated",
            ErrorCode::InvalidEscape => "invalid escape sequence in string",
            ErrorCode::InvalidNumber => "invalid number literal",

            // Parser
            ErrorCode::UnexpectedToken => "unexpected token",
            ErrorCode::ExpectedExpression => "expected an expression",
            ErrorCode::ExpectedType => "expected a type",
            ErrorCode::ExpectedIdentifier => "expected an identifier",
            ErrorCode::UnclosedDelimiter => "unclosed delimiter",

            // Resolution
            ErrorCode::UnresolvedName => "cannot resolve name",
            ErrorCode::UseBeforeDeclaration => "variable used before its declaration",
            ErrorCode::WrongDeclarationKind => "name resolves to the wrong kind of declaration",

            // Shape
            ErrorCode::WrongArity => "wrong number of arguments",
            ErrorCode::NotAssignable => "value is not assignable to this location",
            ErrorCode::IncompatibleClassShape => "class shapes are not compatible",
            ErrorCode::MissingField => "field does not exist",
            ErrorCode::NotIndexable => "expression is not an array",
            ErrorCode::NonIntIndex => "array index is not an Int",

            // Inheritance
            ErrorCode::UndeclaredAncestor => "ancestor class is not declared",
            ErrorCode::AncestorNotAClass => "parent is not a class",
            ErrorCode::CyclicInheritance => "cyclic inheritance",
            ErrorCode::MissingConstructor => "class has no constructor",
            ErrorCode::IllegalOverride => "illegal override",
            ErrorCode::ReservedName => "name is reserved",
            ErrorCode::UncapitalizedClassName => "class names must start with a capital letter",

            // Control flow
            ErrorCode::MissingReturn => "function does not return on every path",
            ErrorCode::ReturnValueMismatch => "return value does not match the function signature",
            ErrorCode::DaddyOutsideMethod => "Daddy call outside of a method",

            // Async
            ErrorCode::BornNonAsync => "born of a function that is not asynchronous",
            ErrorCode::BornVoidResult => "cannot store the result of a Void async function",
            ErrorCode::AsyncMethodAccess => "async methods cannot be reached from outside the class",
            ErrorCode::BornBeforeCall => "born of an async function that was never called",

            // Runtime
            ErrorCode::DivisionByZero => "division by zero",
            ErrorCode::IntegerOverflow => "integer overflow",
            ErrorCode::NullDereference => "null dereference",
            ErrorCode::IndexOutOfBounds => "array index out of bounds",
            ErrorCode::InterpreterError => "interpreter error",
        }
    }
}
