//! Variable environments for evaluation.
//!
//! A [`Scope`] is the caller-supplied data object. It is shared and
//! copy-on-write: the engine never mutates a scope handed to it, it derives
//! new ones. A [`ScopeStack`] layers the parameter frames pushed by lambdas
//! and macros on top of a base scope.
//!
//! Lookup only ever considers own keys, innermost frame first:
//! ```text
//! items.map(x => x + offset)   // `x` from the lambda frame, `offset` from the base
//! ```

use alloc::rc::Rc;
use alloc::vec::Vec;

use ecow::EcoString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::values::{Object, Value};

/// Reserved variable that refers to the scope itself.
pub const GLOBAL_KEY: &str = "global";

/// A string-keyed map of variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope(Rc<Object>);

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an object value. Returns `None` for any other value kind.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Scope(map)),
            _ => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Sets `name`, copying the underlying map if it is shared.
    pub fn insert(&mut self, name: impl Into<EcoString>, value: Value) {
        Rc::make_mut(&mut self.0).insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EcoString, &Value)> {
        self.0.iter()
    }

    /// The scope as an object value.
    pub fn to_value(&self) -> Value {
        Value::Object(Rc::clone(&self.0))
    }

    /// Returns a scope where [`GLOBAL_KEY`] holds this scope's own contents,
    /// unless the caller already defined that key.
    pub fn with_global(&self) -> Scope {
        if self.contains(GLOBAL_KEY) {
            return self.clone();
        }
        let mut scope = self.clone();
        scope.insert(GLOBAL_KEY, self.to_value());
        scope
    }
}

impl<K: Into<EcoString>> FromIterator<(K, Value)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Scope(Rc::new(
            iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = value.type_name();
        Scope::from_value(value).ok_or_else(|| {
            serde::de::Error::custom(format!("scope must be an object, found {}", kind))
        })
    }
}

/// Parameter bindings introduced by one lambda or macro call.
#[derive(Debug)]
struct Frame(Vec<(EcoString, Value)>);

/// A base scope plus a stack of parameter frames.
///
/// Cloning is cheap; closures capture the stack they were created in.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    base: Scope,
    frames: Vec<Rc<Frame>>,
}

impl ScopeStack {
    pub fn new(base: Scope) -> Self {
        Self {
            base,
            frames: Vec::new(),
        }
    }

    /// Binds `names[i]` to `args[i]` in a new innermost frame. Names without
    /// a matching argument are bound to null; surplus arguments are ignored.
    pub fn with_bindings<'n>(
        &self,
        names: impl IntoIterator<Item = &'n str>,
        args: &[Value],
    ) -> ScopeStack {
        let frame = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (EcoString::from(name), args.get(i).cloned().unwrap_or_default()))
            .collect();
        let mut stack = self.clone();
        stack.frames.push(Rc::new(Frame(frame)));
        stack
    }

    /// Resolves `name`, innermost frame first. Unbound names are `None`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| {
                frame
                    .0
                    .iter()
                    .rev()
                    .find(|(n, _)| n.as_str() == name)
                    .map(|(_, v)| v)
            })
            .or_else(|| self.base.get(name))
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn base(&self) -> &Scope {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(entries: &[(&str, Value)]) -> Scope {
        entries.iter().cloned().collect()
    }

    #[test]
    fn test_with_global_adds_self_reference() {
        let base = scope(&[("a", Value::from(1))]);
        let scope = base.with_global();
        assert_eq!(scope.get(GLOBAL_KEY), Some(&base.to_value()));
        assert!(!base.contains(GLOBAL_KEY), "caller scope must not change");
    }

    #[test]
    fn test_with_global_keeps_caller_definition() {
        let base = scope(&[(GLOBAL_KEY, Value::from("mine"))]);
        assert_eq!(base.with_global().get(GLOBAL_KEY), Some(&Value::from("mine")));
    }

    #[test]
    fn test_frames_shadow_base() {
        let stack = ScopeStack::new(scope(&[("x", Value::from(1)), ("y", Value::from(2))]));
        let inner = stack.with_bindings(["x"], &[Value::from(10)]);
        assert_eq!(inner.lookup("x"), Some(&Value::from(10)));
        assert_eq!(inner.lookup("y"), Some(&Value::from(2)));
        assert_eq!(stack.lookup("x"), Some(&Value::from(1)));
        assert_eq!(inner.depth(), 1);
    }

    #[test]
    fn test_missing_arguments_bind_null() {
        let stack = ScopeStack::new(scope(&[("b", Value::from(5))]));
        let inner = stack.with_bindings(["a", "b"], &[Value::from(1)]);
        assert_eq!(inner.lookup("b"), Some(&Value::Null));
        assert_eq!(inner.lookup("missing"), None);
    }

    #[test]
    fn test_insert_is_copy_on_write() {
        let original = scope(&[("a", Value::from(1))]);
        let mut copy = original.clone();
        copy.insert("b", Value::from(2));
        assert!(!original.contains("b"));
        assert!(copy.contains("b"));
    }
}
