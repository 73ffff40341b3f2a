//! Shared execution context.
//!
//! One mutable record visible to every hook, candidate, and case callback
//! of a builder. Hooks stash values here for later operations to
//! observe within the same run. The context is deliberately NOT reset
//! between repeated invocations of the same runnable; callers wanting
//! per-run isolation construct a fresh context and hand it to the builder.
//!
//! No locking: correctness relies on the sequencer's strict ordering
//! guarantee. Nothing runs concurrently, so concurrent mutation cannot
//! occur.

use std::cell::RefCell;

use im::HashMap;

use crate::value::Value;

/// The shared mutable record visible to all hooks and cases within a run.
#[derive(Debug, Default)]
pub struct Context {
    slots: RefCell<HashMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    /// Reads a slot, cloning the stored value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use thunklet::{context::Context, value::Value};
    /// let cx = Context::new();
    /// cx.set("hits", 1);
    /// assert_eq!(cx.get("hits"), Some(Value::Number(1.0)));
    /// assert_eq!(cx.get("misses"), None);
    /// ```
    pub fn get(&self, key: &str) -> Option<Value> {
        self.slots.borrow().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.slots.borrow_mut().insert(key.into(), value.into());
    }

    /// Rewrites one slot from its current value (None when unset).
    pub fn update(&self, key: &str, f: impl FnOnce(Option<Value>) -> Value) {
        let mut slots = self.slots.borrow_mut();
        let next = f(slots.get(key).cloned());
        slots.insert(key.to_string(), next);
    }

    /// Whether a slot has been written at all.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use thunklet::context::Context;
    /// let cx = Context::new();
    /// assert!(!cx.contains("flag"));
    /// cx.set("flag", true);
    /// assert!(cx.contains("flag"));
    /// ```
    pub fn contains(&self, key: &str) -> bool {
        self.slots.borrow().contains_key(key)
    }
}
