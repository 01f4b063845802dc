//! Per-thread runtime storage frames.
//! 每线程的运行时存储帧。
//!
//! A [`ScopeStorage`] is one frame of name/value slots bound to a scope,
//! linked to the frame below it. Each thread index owns one chain; an async
//! function's chain is linked onto its caller's frame, which is how spawned
//! code reaches enclosing and root variables.
//! 一个 [`ScopeStorage`] 是绑定到某个作用域的一帧名称/值槽，链接到其下方的
//! 帧。每个线程索引拥有一条链；异步函数的链挂在调用者的帧上，生成的线程
//! 借此访问外层变量和根变量。

use crate::{lock, Value};
use sigh_analysis::ScopeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct ScopeStorage {
    /// The scope this frame stores values for.
    /// 此帧存储值所属的作用域。
    pub scope: ScopeId,
    /// The frame below this one; `None` for the root frame.
    /// 此帧下方的帧；根帧为 `None`。
    pub parent: Option<Arc<ScopeStorage>>,
    slots: Mutex<HashMap<String, Value>>,
}

impl ScopeStorage {
    pub fn new(scope: ScopeId, parent: Option<Arc<ScopeStorage>>) -> Self {
        Self {
            scope,
            parent,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Read a slot of this frame.
    /// 读取此帧的一个槽。
    pub fn get_local(&self, name: &str) -> Option<Value> {
        lock(&self.slots).get(name).cloned()
    }

    /// Write a slot of this frame.
    /// 写入此帧的一个槽。
    pub fn set_local(&self, name: &str, value: Value) {
        lock(&self.slots).insert(name.to_string(), value);
    }

    /// All slots of this frame, copied out.
    /// 复制出此帧的所有槽。
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        lock(&self.slots)
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
