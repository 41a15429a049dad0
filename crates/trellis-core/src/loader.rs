//! Injected module loading.
//!
//! The core never touches the filesystem. A [`Loader`] turns a pattern into
//! declaration modules, and [`Suite::load`](crate::Suite::load) applies them in
//! the order they are returned.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::error::ConfigError;
use crate::tree::Declare;

/// Loader errors.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No modules match pattern: {0}")]
    NotFound(String),

    #[error("Failed to load module {module}: {message}")]
    Module { module: String, message: String },

    #[error("Failed to declare module {module}: {source}")]
    Declare {
        module: String,
        #[source]
        source: ConfigError,
    },
}

/// Declaration function of a module.
pub type DeclareFn = Arc<dyn Fn(&mut Declare<'_>) -> Result<(), ConfigError> + Send + Sync>;

/// A unit of test declarations, usually one test file.
#[derive(Clone)]
pub struct Module {
    pub name: String,
    pub declare: DeclareFn,
}

impl Module {
    pub fn new<F>(name: impl Into<String>, declare: F) -> Self
    where
        F: Fn(&mut Declare<'_>) -> Result<(), ConfigError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            declare: Arc::new(declare),
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module").field("name", &self.name).finish()
    }
}

/// Resolves a pattern to declaration modules.
///
/// Implementations own all globbing and module-loading work. Returning an
/// empty list is allowed; the caller decides whether that is an error.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn resolve(&self, pattern: &str) -> Result<Vec<Module>, LoadError>;
}

/// In-memory loader keyed by module name.
///
/// A pattern matches a module by exact name, or by prefix when it ends in
/// `*`. Modules are returned in name order.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Module>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a module.
    pub fn register(&mut self, module: Module) -> &mut Self {
        self.modules.insert(module.name.clone(), module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[async_trait]
impl Loader for ModuleRegistry {
    async fn resolve(&self, pattern: &str) -> Result<Vec<Module>, LoadError> {
        let found: Vec<Module> = match pattern.strip_suffix('*') {
            Some(prefix) => self
                .modules
                .range(prefix.to_string()..)
                .take_while(|(name, _)| name.starts_with(prefix))
                .map(|(_, module)| module.clone())
                .collect(),
            None => self.modules.get(pattern).cloned().into_iter().collect(),
        };

        if found.is_empty() {
            return Err(LoadError::NotFound(pattern.to_string()));
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry
            .register(Module::new("math/add", |_| Ok(())))
            .register(Module::new("math/sub", |_| Ok(())))
            .register(Module::new("strings", |_| Ok(())));
        registry
    }

    #[tokio::test]
    async fn test_exact_pattern() {
        let modules = registry().resolve("strings").await.unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name, "strings");
    }

    #[tokio::test]
    async fn test_prefix_pattern_in_name_order() {
        let modules = registry().resolve("math/*").await.unwrap();
        let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["math/add", "math/sub"]);
    }

    #[tokio::test]
    async fn test_unmatched_pattern() {
        let result = registry().resolve("nope").await;
        assert!(matches!(result, Err(LoadError::NotFound(p)) if p == "nope"));
    }
}
