//! Classes, functions, properties and call sites.

use serde::{Deserialize, Serialize};

use super::Enrichment;

/// Declared visibility after applying the language's default rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    /// C# `internal`.
    Internal,
    /// C# `protected internal` / `private protected`.
    ProtectedInternal,
    /// Java package-private.
    Package,
    /// Apex `global`.
    Global,
}

impl Visibility {
    /// Go exports by capitalization.
    pub fn from_go_name(name: &str) -> Self {
        if name.chars().next().is_some_and(|c| c.is_uppercase()) {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    /// Python hides by leading underscore; dunder names stay public.
    pub fn from_python_name(name: &str) -> Self {
        let dunder = name.len() > 4 && name.starts_with("__") && name.ends_with("__");
        if name.starts_with('_') && !dunder {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Class,
    Interface,
    Struct,
    Enum,
    Record,
    Trigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassModifier {
    Abstract,
    Sealed,
    Static,
    Partial,
    Virtual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    Free,
    Instance,
    Static,
    Constructor,
}

/// A field or property declared on a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyNode {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub has_default: bool,
}

impl PropertyNode {
    pub fn new(name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            visibility,
            is_static: false,
            is_final: false,
            has_default: false,
        }
    }

    pub fn with_type(mut self, type_name: Option<String>) -> Self {
        self.type_name = type_name.filter(|t| !t.is_empty());
        self
    }
}

/// A class, interface, struct, enum, record or Apex trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassNode {
    pub name: String,
    /// Namespace/package qualified name, or `Outer.Inner` for nested types.
    pub qualified_name: String,
    pub kind: ClassKind,
    pub visibility: Visibility,
    #[serde(default)]
    pub modifiers: Vec<ClassModifier>,
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub constructor_params: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub properties: Vec<PropertyNode>,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

impl ClassNode {
    pub fn new(name: impl Into<String>, kind: ClassKind, visibility: Visibility) -> Self {
        let name = name.into();
        Self {
            qualified_name: name.clone(),
            name,
            kind,
            visibility,
            modifiers: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            constructor_params: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            start_line: 0,
            end_line: 0,
            enrichment: Enrichment::default(),
        }
    }

    pub fn with_lines(mut self, start_line: u32, end_line: u32) -> Self {
        self.start_line = start_line;
        self.end_line = end_line;
        self
    }

    pub fn add_modifier(&mut self, modifier: ClassModifier) {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
    }

    pub fn add_method(&mut self, name: &str) {
        if !self.methods.iter().any(|m| m == name) {
            self.methods.push(name.to_string());
        }
    }

    pub fn needs_enrichment(&self) -> bool {
        self.enrichment.is_missing()
    }
}

/// A call expression found directly in a function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    pub name: String,
    /// Resolved file, or `null` when the callee is outside the repository.
    pub path: Option<String>,
    /// Expression left of the call (`obj` in `obj.save()`); resolver input only.
    #[serde(skip)]
    pub receiver: Option<String>,
    /// Type the extractor inferred for the receiver, if any.
    #[serde(skip)]
    pub receiver_type: Option<String>,
}

impl CallSite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            receiver: None,
            receiver_type: None,
        }
    }

    pub fn with_receiver(mut self, receiver: Option<String>) -> Self {
        self.receiver = receiver.filter(|r| !r.is_empty());
        self
    }

    pub fn with_receiver_type(mut self, receiver_type: Option<String>) -> Self {
        self.receiver_type = receiver_type.filter(|t| !t.is_empty());
        self
    }
}

/// A free function, method or constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionNode {
    pub name: String,
    pub kind: FunctionKind,
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub params: Vec<String>,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(default)]
    pub calls: Vec<CallSite>,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

impl FunctionNode {
    pub fn new(name: impl Into<String>, kind: FunctionKind, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            kind,
            visibility,
            class_name: None,
            params: Vec::new(),
            start_line: 0,
            end_line: 0,
            calls: Vec::new(),
            enrichment: Enrichment::default(),
        }
    }

    pub fn with_class(mut self, class_name: Option<&str>) -> Self {
        self.class_name = class_name.map(str::to_string);
        self
    }

    pub fn with_lines(mut self, start_line: u32, end_line: u32) -> Self {
        self.start_line = start_line;
        self.end_line = end_line;
        self
    }

    pub fn with_params(mut self, params: Vec<String>) -> Self {
        self.params = params;
        self
    }

    pub fn needs_enrichment(&self) -> bool {
        self.enrichment.is_missing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_visibility() {
        assert_eq!(Visibility::from_go_name("Bar"), Visibility::Public);
        assert_eq!(Visibility::from_go_name("bar"), Visibility::Private);
        assert_eq!(Visibility::from_go_name("_x"), Visibility::Private);
    }

    #[test]
    fn test_python_visibility() {
        assert_eq!(Visibility::from_python_name("run"), Visibility::Public);
        assert_eq!(Visibility::from_python_name("_helper"), Visibility::Private);
        assert_eq!(Visibility::from_python_name("__secret"), Visibility::Private);
        assert_eq!(Visibility::from_python_name("__init__"), Visibility::Public);
    }

    #[test]
    fn test_call_receiver_is_not_serialized() {
        let call = CallSite::new("save").with_receiver(Some("repo".to_string()));
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json, serde_json::json!({"name": "save", "path": null}));
    }

    #[test]
    fn test_property_serializes_type_field() {
        let prop = PropertyNode::new("id", Visibility::Private).with_type(Some("int".into()));
        let json = serde_json::to_value(&prop).unwrap();
        assert_eq!(json["type"], "int");
        assert_eq!(json["hasDefault"], false);
    }
}
