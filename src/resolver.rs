//! Resolver: three-tier priority lookup of a command name - builtin
//! registry, embedded stdlib table, user filesystem script - plus the
//! `try` special case that bypasses all three.

use std::path::Path;
use std::sync::Arc;

use crate::command::Command;
use crate::errors::ResolveError;
use crate::registry::BuiltinRegistry;

/// Outcome of resolving one command name.
pub enum Resolved {
    Try,
    Builtin(Arc<dyn Command>),
    Stdlib { body: String, virtual_path: String },
    User { body: String, real_path: String },
}

/// Read-only, name-indexed table of embedded `.neuro` script bodies.
/// Keys are script names without the `.neuro` suffix.
pub trait StdlibTable {
    fn lookup(&self, name: &str) -> Option<&str>;
}

/// A `StdlibTable` backed by a plain in-memory map, the shape external
/// collaborators are expected to provide (§6).
#[derive(Debug, Clone, Default)]
pub struct InMemoryStdlib {
    scripts: std::collections::HashMap<String, String>,
}

impl InMemoryStdlib {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.scripts.insert(name.into(), body.into());
    }
}

impl StdlibTable for InMemoryStdlib {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(|s| s.as_str())
    }
}

/// Reads User-tier script bodies from a real filesystem. Kept behind a
/// trait so tests can substitute an in-memory loader without touching
/// disk.
pub trait ScriptLoader {
    fn read(&self, resolved_path: &str) -> Result<String, ResolveError>;
}

/// `ScriptLoader` backed by `std::fs`, resolving relative paths against
/// the process's current working directory.
#[derive(Debug, Clone, Default)]
pub struct FsScriptLoader;

impl ScriptLoader for FsScriptLoader {
    fn read(&self, resolved_path: &str) -> Result<String, ResolveError> {
        let path = Path::new(resolved_path);
        if !path.exists() {
            return Err(ResolveError::FileNotFound(resolved_path.to_string()));
        }
        std::fs::read_to_string(path).map_err(|e| ResolveError::ReadError(e.to_string()))
    }
}

/// Three-tier command resolver.
pub struct Resolver<'a> {
    registry: &'a BuiltinRegistry,
    stdlib: &'a dyn StdlibTable,
    loader: &'a dyn ScriptLoader,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a BuiltinRegistry, stdlib: &'a dyn StdlibTable, loader: &'a dyn ScriptLoader) -> Self {
        Resolver { registry, stdlib, loader }
    }

    pub fn resolve(&self, name: &str) -> Result<Resolved, ResolveError> {
        if name == "try" {
            return Ok(Resolved::Try);
        }

        if let Some(cmd) = self.registry.get(name) {
            return Ok(Resolved::Builtin(cmd));
        }

        if let Some(body) = self.stdlib.lookup(name) {
            return Ok(Resolved::Stdlib {
                body: body.to_string(),
                virtual_path: format!("stdlib:{name}.neuro"),
            });
        }

        if name.ends_with(".neuro") {
            if name.contains("..") {
                return Err(ResolveError::InvalidPath(name.to_string()));
            }
            let body = self.loader.read(name)?;
            return Ok(Resolved::User { body, real_path: name.to_string() });
        }

        Err(ResolveError::NotFound(name.to_string()))
    }
}
