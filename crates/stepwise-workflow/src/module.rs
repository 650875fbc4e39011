use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::post_function::WeightResolver;

/// Capability a plugin module provides to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Condition,
    Validator,
    Function,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKind::Condition => f.write_str("condition"),
            ModuleKind::Validator => f.write_str("validator"),
            ModuleKind::Function => f.write_str("function"),
        }
    }
}

/// A workflow plugin module as registered by its plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Complete module key, `plugin.key:module.key`.
    pub key: String,
    pub class_name: String,
    pub kind: ModuleKind,
    /// Ordering weight for post-functions; `None` means unweighted.
    #[serde(default)]
    pub weight: Option<i32>,
    /// At most one instance per transition.
    #[serde(default)]
    pub unique: bool,
}

impl ModuleDescriptor {
    pub fn new(key: impl Into<String>, class_name: impl Into<String>, kind: ModuleKind) -> Self {
        Self {
            key: key.into(),
            class_name: class_name.into(),
            kind,
            weight: None,
            unique: false,
        }
    }

    pub fn weighted(mut self, weight: i32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Resolves descriptor implementation classes to their modules.
pub trait ModuleResolver {
    /// Look a module up by key when one is given, else by implementation class.
    fn resolve(&self, class_name: &str, module_key: Option<&str>) -> Option<ModuleDescriptor>;
}

/// In-memory module registry.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, ModuleDescriptor>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, replacing one with the same key.
    pub fn register(&mut self, module: ModuleDescriptor) {
        self.modules.insert(module.key.clone(), module);
    }

    /// Unregister a module by key.
    pub fn unregister(&mut self, key: &str) -> bool {
        self.modules.remove(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(key)
    }

    /// List registered module keys of one kind, sorted.
    pub fn list(&self, kind: ModuleKind) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .modules
            .values()
            .filter(|m| m.kind == kind)
            .map(|m| m.key.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn by_class(&self, class_name: &str) -> Option<&ModuleDescriptor> {
        // Several modules may share a class; pick the lowest key so lookups are stable.
        self.modules
            .values()
            .filter(|m| m.class_name == class_name)
            .min_by(|a, b| a.key.cmp(&b.key))
    }
}

impl ModuleResolver for ModuleRegistry {
    fn resolve(&self, class_name: &str, module_key: Option<&str>) -> Option<ModuleDescriptor> {
        match module_key.and_then(|key| self.modules.get(key)) {
            Some(module) => Some(module.clone()),
            None => self.by_class(class_name).cloned(),
        }
    }
}

impl WeightResolver for ModuleRegistry {
    fn weight_of(&self, class_name: &str) -> Option<i32> {
        self.by_class(class_name)
            .filter(|m| m.kind == ModuleKind::Function)
            .and_then(|m| m.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register(ModuleDescriptor::new(
            "core:only-assignee",
            "AllowOnlyAssignee",
            ModuleKind::Condition,
        ));
        registry.register(
            ModuleDescriptor::new("core:reindex", "ReindexFunction", ModuleKind::Function).weighted(90),
        );
        registry.register(
            ModuleDescriptor::new("core:permission", "PermissionValidator", ModuleKind::Validator).unique(),
        );
        registry
    }

    #[test]
    fn resolve_by_key_or_class() {
        let registry = registry();
        let by_key = registry.resolve("ignored", Some("core:reindex")).unwrap();
        assert_eq!(by_key.class_name, "ReindexFunction");

        let by_class = registry.resolve("AllowOnlyAssignee", None).unwrap();
        assert_eq!(by_class.kind, ModuleKind::Condition);

        let fallback = registry.resolve("AllowOnlyAssignee", Some("gone:key")).unwrap();
        assert_eq!(fallback.key, "core:only-assignee");

        assert!(registry.resolve("Nope", None).is_none());
    }

    #[test]
    fn weight_only_for_functions() {
        let registry = registry();
        assert_eq!(registry.weight_of("ReindexFunction"), Some(90));
        assert_eq!(registry.weight_of("AllowOnlyAssignee"), None);
        assert_eq!(registry.weight_of("Nope"), None);
    }

    #[test]
    fn list_and_unregister() {
        let mut registry = registry();
        assert_eq!(registry.list(ModuleKind::Validator), vec!["core:permission"]);
        assert!(registry.unregister("core:permission"));
        assert!(!registry.unregister("core:permission"));
        assert!(registry.list(ModuleKind::Validator).is_empty());
        assert_eq!(registry.len(), 2);
    }
}
