//! Variable scopes.
//!
//! Copyright (c) 2025 Posit, PBC

use std::collections::HashMap;

use crate::value::Value;

/// Stack of variable frames. The first frame is the global scope; each
/// block (a style rule or an at-rule body) pushes one more. An imported
/// file is evaluated in the frame of the `@import` that loaded it.
#[derive(Debug)]
pub(crate) struct ScopeChain {
    frames: Vec<HashMap<String, Value>>,
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }
}

impl ScopeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Drop the innermost frame. The global frame is never dropped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Innermost binding of `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let key = normalize(name);
        self.frames.iter().rev().find_map(|frame| frame.get(&key))
    }

    /// Assign `name`.
    ///
    /// An existing binding in an enclosing local frame is updated in place.
    /// Otherwise the variable is bound in the innermost frame, which shadows
    /// any global of the same name without changing it.
    pub fn set(&mut self, name: &str, value: Value) {
        let key = normalize(name);
        let innermost = self.frames.len() - 1;
        let target = (1..self.frames.len())
            .rev()
            .find(|&i| self.frames[i].contains_key(&key))
            .unwrap_or(innermost);
        self.frames[target].insert(key, value);
    }

    /// Assign `name` in the global frame.
    pub fn set_global(&mut self, name: &str, value: Value) {
        self.frames[0].insert(normalize(name), value);
    }

    /// True if `name` would resolve to a non-null value.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    /// True if `name` is bound to a non-null value in the global frame.
    pub fn is_set_globally(&self, name: &str) -> bool {
        self.frames[0]
            .get(&normalize(name))
            .is_some_and(|v| !v.is_null())
    }
}

/// `$a-b` and `$a_b` name the same variable.
fn normalize(name: &str) -> String {
    name.replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(v: &str) -> Value {
        Value::unquoted(v)
    }

    #[test]
    fn test_last_write_wins() {
        let mut scopes = ScopeChain::new();
        scopes.set("a", text("1"));
        scopes.set("a", text("2"));
        assert_eq!(scopes.get("a"), Some(&text("2")));
    }

    #[test]
    fn test_inner_binding_shadows_global() {
        let mut scopes = ScopeChain::new();
        scopes.set("a", text("global"));
        scopes.push();
        scopes.set("a", text("local"));
        assert_eq!(scopes.get("a"), Some(&text("local")));
        scopes.pop();
        assert_eq!(scopes.get("a"), Some(&text("global")));
    }

    #[test]
    fn test_enclosing_local_updated() {
        let mut scopes = ScopeChain::new();
        scopes.push();
        scopes.set("a", text("outer"));
        scopes.push();
        scopes.set("a", text("inner"));
        scopes.pop();
        assert_eq!(scopes.get("a"), Some(&text("inner")));
    }

    #[test]
    fn test_global_flag() {
        let mut scopes = ScopeChain::new();
        scopes.push();
        scopes.set_global("a", text("g"));
        scopes.pop();
        assert!(scopes.is_set_globally("a"));
        assert_eq!(scopes.get("a"), Some(&text("g")));
    }

    #[test]
    fn test_underscore_and_hyphen_equivalent() {
        let mut scopes = ScopeChain::new();
        scopes.set("main_color", text("red"));
        assert_eq!(scopes.get("main-color"), Some(&text("red")));
    }

    #[test]
    fn test_null_is_unset() {
        let mut scopes = ScopeChain::new();
        scopes.set("a", Value::Null);
        assert!(!scopes.is_set("a"));
        scopes.pop();
        assert!(scopes.get("a").is_some());
    }
}
