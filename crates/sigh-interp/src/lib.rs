//! Interpreter and runtime support for Sigh.
//!
//! The interpreter executes the analyzed AST directly. All shared runtime
//! state sits behind `Arc`s so asynchronous function calls can run on plain
//! OS threads against the same storage graph.

mod interpreter;
mod storage;
mod value;

pub use interpreter::{Interpreter, RuntimeError};
pub use storage::ScopeStorage;
pub use value::{ClassInstance, Value};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, tolerating poisoning (an async body may have panicked).
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
