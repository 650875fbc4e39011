use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Argument holding the implementation class of a descriptor.
pub const CLASS_NAME_ARG: &str = "class.name";
/// Argument holding the plugin module key that contributed a descriptor.
pub const MODULE_KEY_ARG: &str = "full.module.key";
/// Descriptor type resolved through the module registry.
pub const CLASS_TYPE: &str = "class";

/// A condition, validator or post-function: a type tag plus ordered args.
///
/// Mirrors the `<condition type="class"><arg name="...">...</arg></condition>`
/// element of the serialized workflow; arg order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub args: IndexMap<String, String>,
}

impl Descriptor {
    /// A `type="class"` descriptor for the given implementation class.
    pub fn class(class_name: impl Into<String>) -> Self {
        let mut args = IndexMap::new();
        args.insert(CLASS_NAME_ARG.to_string(), class_name.into());
        Self {
            kind: CLASS_TYPE.to_string(),
            args,
        }
    }

    /// Set the contributing module key.
    pub fn with_module_key(self, key: impl Into<String>) -> Self {
        self.with_arg(MODULE_KEY_ARG, key)
    }

    /// Set an argument, keeping the position of an existing one.
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn is_class(&self) -> bool {
        self.kind == CLASS_TYPE
    }

    pub fn class_name(&self) -> Option<&str> {
        self.args.get(CLASS_NAME_ARG).map(String::as_str)
    }

    pub fn module_key(&self) -> Option<&str> {
        self.args.get(MODULE_KEY_ARG).map(String::as_str)
    }

    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_descriptor_carries_class_name() {
        let d = Descriptor::class("com.example.AllowOnlyReporter")
            .with_module_key("com.example:only-reporter")
            .with_arg("permission", "BROWSE");

        assert!(d.is_class());
        assert_eq!(d.class_name(), Some("com.example.AllowOnlyReporter"));
        assert_eq!(d.module_key(), Some("com.example:only-reporter"));
        let names: Vec<&str> = d.args.keys().map(String::as_str).collect();
        assert_eq!(names, vec![CLASS_NAME_ARG, MODULE_KEY_ARG, "permission"]);
    }

    #[test]
    fn serialized_shape_uses_type_tag() {
        let d = Descriptor::class("X");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "class");
        assert_eq!(json["args"]["class.name"], "X");

        let back: Descriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
