//! Scope chain for semantic passes.
//!
//! Scopes live in an arena and point at their parent by index. `push`
//! appends a child of the current scope and makes it current; `pop` drops
//! the current scope and moves back to its parent. Because scopes are only
//! ever opened and closed in stack order, the current scope is always the
//! last slot of the arena, so popping never leaves a dead slot behind.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Misuse of an [`Environment`].
///
/// These are programming errors in a pass, never problems in user source.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EnvironmentError {
    #[error("cannot pop the root scope")]
    PopRoot,
    #[error("`{0}` is not bound in any enclosing scope")]
    Unbound(String),
}

#[derive(Clone, Debug)]
struct Scope<K, V> {
    bindings: FxHashMap<K, V>,
    /// `None` only for the root.
    parent: Option<usize>,
}

impl<K, V> Scope<K, V> {
    fn new(parent: Option<usize>) -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent,
        }
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for Scope<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.bindings == other.bindings
    }
}

impl<K: Hash + Eq, V: Eq> Eq for Scope<K, V> {}

/// A chain of scopes mapping keys to values.
///
/// Lookups walk from the current scope out to the root; the innermost
/// binding wins. Writes only ever touch the current scope.
#[derive(Clone, Debug)]
pub struct Environment<K, V> {
    scopes: Vec<Scope<K, V>>,
    current: usize,
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for Environment<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current && self.scopes == other.scopes
    }
}

impl<K: Hash + Eq, V: Eq> Eq for Environment<K, V> {}

impl<K: Hash + Eq, V> Default for Environment<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> Environment<K, V> {
    /// Create an environment holding only an empty root scope.
    pub fn new() -> Self {
        Environment {
            scopes: vec![Scope::new(None)],
            current: 0,
        }
    }

    /// Open a child of the current scope and make it current.
    pub fn push(&mut self) -> &mut Self {
        self.scopes.push(Scope::new(Some(self.current)));
        self.current = self.scopes.len() - 1;
        self
    }

    /// Close the current scope, returning to its parent.
    pub fn pop(&mut self) -> Result<&mut Self, EnvironmentError> {
        let parent = self.scopes[self.current]
            .parent
            .ok_or(EnvironmentError::PopRoot)?;
        self.scopes.truncate(self.current);
        self.current = parent;
        Ok(self)
    }

    /// Number of open scopes, counting the root.
    pub fn depth(&self) -> usize {
        self.chain().count()
    }

    /// Whether this is the root scope.
    pub fn is_root(&self) -> bool {
        self.scopes[self.current].parent.is_none()
    }

    /// Scopes from the current one out to the root.
    fn chain(&self) -> impl Iterator<Item = &Scope<K, V>> + '_ {
        let mut next = Some(self.current);
        std::iter::from_fn(move || {
            let scope = &self.scopes[next?];
            next = scope.parent;
            Some(scope)
        })
    }

    /// Whether `key` is bound in this scope or any ancestor.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// The innermost binding of `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.chain().find_map(|scope| scope.bindings.get(key))
    }

    /// The innermost binding of `key`, which the caller knows exists.
    pub fn require<Q>(&self, key: &Q) -> Result<&V, EnvironmentError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.get(key)
            .ok_or_else(|| EnvironmentError::Unbound(key.to_string()))
    }

    /// Bind `key` in the current scope, shadowing any outer binding.
    ///
    /// Returns the value previously bound in the current scope.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        self.scopes[self.current].bindings.insert(key, value)
    }

    /// Remove `key` from the current scope only.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.scopes[self.current].bindings.remove(key)
    }

    /// Remove the innermost binding of `key`, searching outward.
    pub fn remove_recursive<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut next = Some(self.current);
        while let Some(index) = next {
            let scope = &mut self.scopes[index];
            if let Some(value) = scope.bindings.remove(key) {
                return Some(value);
            }
            next = scope.parent;
        }
        None
    }

    /// Bindings of the current scope, not its ancestors.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.scopes[self.current].bindings.iter()
    }

    /// Run `f` inside a fresh child scope, closing it afterwards.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.scopes.len();
        self.push();
        let result = f(self);
        // `f` may leave inner scopes open on an early return.
        self.scopes.truncate(depth);
        self.current = depth - 1;
        result
    }
}
