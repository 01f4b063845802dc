//! Common types shared by every Sigh compiler phase.
//! Sigh 编译器各阶段共享的通用类型。

mod span;

pub use span::{BytePos, Span};
