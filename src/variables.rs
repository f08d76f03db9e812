//! Variable Store
//!
//! Keyed string storage with two namespaces (user / system) held in one
//! flat map, distinguished purely by name: a name beginning with `_` or
//! `@` is System, everything else is User. Lookup of an undefined name
//! always yields the empty string; it never fails.

use std::collections::HashMap;

use crate::errors::VariableError;

/// Returns true if `name` belongs to the reserved System namespace.
pub fn is_system_name(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('@')
}

/// Flat keyed string storage for the engine's User and System variables.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    values: HashMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value, or the empty string if `name` is unset.
    /// Never fails.
    pub fn get(&self, name: &str) -> String {
        self.values.get(name).cloned().unwrap_or_default()
    }

    /// True if `name` has been set, regardless of namespace.
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// User-level upsert. Rejects an empty name and rejects names that
    /// fall in the reserved System namespace (leading `_` or `@`).
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), VariableError> {
        if name.is_empty() {
            return Err(VariableError::EmptyName);
        }
        if is_system_name(name) {
            return Err(VariableError::ReservedName(name.to_string()));
        }
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Engine-internal upsert into the System namespace. Callers are the
    /// engine itself (`_status`, `_error`, `@status`, ...); no naming
    /// validation is applied beyond requiring a non-empty name.
    pub fn set_system(&mut self, name: &str, value: impl Into<String>) {
        debug_assert!(!name.is_empty(), "system variable name must not be empty");
        self.values.insert(name.to_string(), value.into());
    }

    /// Engine-internal upsert for script parameter bindings. These are
    /// conceptually User-namespace variables but are written by the
    /// engine during script invocation rather than by a `set`-style
    /// command, so the ordinary `set` validation does not apply (a
    /// parameter key written as `_foo` by a caller's option map is still
    /// bound, per the Parser's `key` grammar allowing a leading `_`).
    pub fn bind(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Snapshot of all User-namespace entries.
    pub fn all_user(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .filter(|(k, _)| !is_system_name(k))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Snapshot of all System-namespace entries.
    pub fn all_system(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .filter(|(k, _)| is_system_name(k))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_undefined_is_empty() {
        let store = VariableStore::new();
        assert_eq!(store.get("missing"), "");
    }

    #[test]
    fn set_and_get_roundtrip() {
        let mut store = VariableStore::new();
        store.set("foo", "bar").unwrap();
        assert_eq!(store.get("foo"), "bar");
        assert!(store.has("foo"));
    }

    #[test]
    fn set_rejects_system_names() {
        let mut store = VariableStore::new();
        assert!(matches!(store.set("_status", "1"), Err(VariableError::ReservedName(_))));
        assert!(matches!(store.set("@error", "x"), Err(VariableError::ReservedName(_))));
    }

    #[test]
    fn set_rejects_empty_name() {
        let mut store = VariableStore::new();
        assert!(matches!(store.set("", "x"), Err(VariableError::EmptyName)));
    }

    #[test]
    fn set_system_bypasses_validation() {
        let mut store = VariableStore::new();
        store.set_system("_status", "0");
        assert_eq!(store.get("_status"), "0");
    }

    #[test]
    fn namespace_partition() {
        let mut store = VariableStore::new();
        store.set("user_var", "1").unwrap();
        store.set_system("_sys_var", "2");
        let users: Vec<_> = store.all_user().collect();
        let systems: Vec<_> = store.all_system().collect();
        assert_eq!(users, vec![("user_var", "1")]);
        assert_eq!(systems, vec![("_sys_var", "2")]);
    }
}
