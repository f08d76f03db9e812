//! Builtin registry: an in-process map from command name to `Command`
//! handle, plus the per-name read-only override used by §4.9.

use std::collections::HashMap;
use std::sync::Arc;

use crate::command::Command;

/// Registered builtins, keyed by their stable `name()`.
#[derive(Default)]
pub struct BuiltinRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
    read_only_overrides: HashMap<String, bool>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a builtin. Returns `false` (and leaves the existing
    /// registration untouched) if `name` is already taken; callers treat
    /// a duplicate as a registration error per §6.
    pub fn register(&mut self, command: Arc<dyn Command>) -> bool {
        let name = command.name().to_string();
        if self.commands.contains_key(&name) {
            return false;
        }
        self.commands.insert(name, command);
        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(|s| s.as_str())
    }

    /// Install a per-name override of the declared `read_only()` flag.
    pub fn set_command_read_only(&mut self, name: &str, read_only: bool) {
        self.read_only_overrides.insert(name.to_string(), read_only);
    }

    /// Remove a previously-installed override, reverting to the
    /// command's declared flag.
    pub fn clear_read_only_override(&mut self, name: &str) {
        self.read_only_overrides.remove(name);
    }

    /// Per §4.9: override if present, else the declared flag, else
    /// `true` (writable) if `name` is not a known builtin. The override
    /// only applies to a name that is actually a registered Builtin -
    /// overriding an unregistered name has no effect.
    pub fn is_read_only(&self, name: &str) -> bool {
        match self.commands.get(name) {
            Some(cmd) => match self.read_only_overrides.get(name) {
                Some(&override_value) => override_value,
                None => cmd.read_only(),
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ParseMode;
    use crate::facade::EngineFacade;
    use indexmap::IndexMap;

    struct Noop {
        name: &'static str,
        read_only: bool,
    }

    impl Command for Noop {
        fn name(&self) -> &str {
            self.name
        }
        fn read_only(&self) -> bool {
            self.read_only
        }
        fn execute(
            &self,
            _facade: &mut EngineFacade,
            _options: &IndexMap<String, String>,
            _message: &str,
        ) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn register_and_get() {
        let mut registry = BuiltinRegistry::new();
        assert!(registry.register(Arc::new(Noop { name: "echo", read_only: true })));
        assert!(registry.contains("echo"));
        assert_eq!(registry.get("echo").unwrap().name(), "echo");
        assert_eq!(registry.get("echo").unwrap().parse_mode(), ParseMode::KeyValue);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = BuiltinRegistry::new();
        assert!(registry.register(Arc::new(Noop { name: "echo", read_only: true })));
        assert!(!registry.register(Arc::new(Noop { name: "echo", read_only: false })));
    }

    #[test]
    fn read_only_determination_precedence() {
        let mut registry = BuiltinRegistry::new();
        registry.register(Arc::new(Noop { name: "get", read_only: true }));
        registry.register(Arc::new(Noop { name: "set", read_only: false }));

        assert!(registry.is_read_only("get"));
        assert!(!registry.is_read_only("set"));
        // Unknown name defaults to writable.
        assert!(!registry.is_read_only("unknown"));

        registry.set_command_read_only("set", true);
        assert!(registry.is_read_only("set"));
        registry.clear_read_only_override("set");
        assert!(!registry.is_read_only("set"));
    }

    #[test]
    fn override_on_unregistered_name_has_no_effect() {
        let mut registry = BuiltinRegistry::new();
        registry.set_command_read_only("ghost", true);
        assert!(!registry.is_read_only("ghost"));
    }
}
