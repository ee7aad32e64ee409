//! Global dialect registry.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use super::definition::Dialect;
use super::vendors;
use crate::error::{DialectError, Result};

/// Global dialect registry.
static REGISTRY: Lazy<RwLock<DialectRegistry>> = Lazy::new(|| {
    let mut registry = DialectRegistry::new();
    registry.register_builtin_dialects();
    RwLock::new(registry)
});

/// Registry for dialect definitions.
#[derive(Debug, Default)]
pub struct DialectRegistry {
    dialects: HashMap<String, Dialect>,
}

impl DialectRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            dialects: HashMap::new(),
        }
    }

    /// Get the global registry.
    pub fn global() -> &'static RwLock<DialectRegistry> {
        &REGISTRY
    }

    /// Look up a dialect in the global registry by name.
    pub fn lookup(name: &str) -> Result<Dialect> {
        REGISTRY
            .read()
            .map_err(|_| DialectError::InvalidDefinition {
                message: "failed to acquire registry lock".to_string(),
            })?
            .get(name)
            .cloned()
            .ok_or_else(|| {
                DialectError::UnknownDialect {
                    name: name.to_string(),
                }
                .into()
            })
    }

    fn register_builtin_dialects(&mut self) {
        let generic = vendors::generic::dialect();
        let ericsson = vendors::ericsson_ipos::dialect();
        self.dialects.insert(generic.name.clone(), generic);
        self.dialects.insert(ericsson.name.clone(), ericsson);
    }

    /// Register a dialect definition.
    pub fn register(&mut self, dialect: Dialect) -> Result<()> {
        if self.dialects.contains_key(&dialect.name) {
            return Err(DialectError::AlreadyRegistered {
                name: dialect.name.clone(),
            }
            .into());
        }
        self.dialects.insert(dialect.name.clone(), dialect);
        Ok(())
    }

    /// Get a dialect by name.
    pub fn get(&self, name: &str) -> Option<&Dialect> {
        self.dialects.get(name)
    }

    /// Check if a dialect is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.dialects.contains_key(name)
    }

    /// List all registered dialect names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.dialects.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        assert!(DialectRegistry::lookup("generic").is_ok());
        assert!(DialectRegistry::lookup("ericsson_ipos").is_ok());
        assert!(matches!(
            DialectRegistry::lookup("no_such_vendor"),
            Err(crate::error::Error::Dialect(
                DialectError::UnknownDialect { .. }
            ))
        ));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = DialectRegistry::new();
        registry.register(vendors::generic::dialect()).unwrap();
        assert!(registry.register(vendors::generic::dialect()).is_err());
    }
}
