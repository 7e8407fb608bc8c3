//! Java analyzer using tree-sitter.
//!
//! The same walker also serves Apex: the Apex analyzer masks its source into
//! Java-shaped text of identical byte layout and hands both texts in, so
//! modifiers can still be read from the original.

use std::collections::HashMap;

use tree_sitter::{Node, Tree};

use super::result::ParseResult;
use super::traits::LanguageAnalyzer;
use super::treesitter::{
    ancestors, direct_calls, last_segment, variadic, Preorder, TreeSitterParser,
};
use crate::language::Language;
use crate::model::{
    CallSite, ClassKind, ClassModifier, ClassNode, FunctionKind, FunctionNode, ImportBinding,
    ImportRef, PropertyNode, Visibility,
};

const CALL_KINDS: &[&str] = &["method_invocation", "object_creation_expression"];
const SCOPE_KINDS: &[&str] = &[
    "lambda_expression",
    "class_body",
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];
const TYPE_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];
/// Nodes whose contents never declare members.
const BODY_KINDS: &[&str] = &[
    "block",
    "constructor_body",
    "lambda_expression",
    "object_creation_expression",
];

/// Source dialect handled by [`JavaWalker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    Java,
    Apex,
}

/// One pass over a parsed Java-grammar tree.
pub(crate) struct JavaWalker<'a> {
    pub dialect: Dialect,
    /// Text the tree was parsed from.
    pub content: &'a str,
    /// Text modifiers are read from; same byte layout as `content`.
    pub original: &'a str,
}

impl<'a> JavaWalker<'a> {
    pub fn walk(&self, tree: &Tree, result: &mut ParseResult) {
        let mut class_slots: HashMap<usize, usize> = HashMap::new();

        for node in Preorder::with_prune(tree.root_node(), |n| BODY_KINDS.contains(&n.kind())) {
            match node.kind() {
                "package_declaration" => {
                    if result.namespace.is_none() {
                        result.namespace = node
                            .named_child(0)
                            .filter(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
                            .map(|n| self.text(&n).to_string());
                    }
                }
                "import_declaration" => self.extract_import(&node, result),
                kind if TYPE_KINDS.contains(&kind) => {
                    if let Some(class) = self.extract_type(&node, result.namespace.as_deref()) {
                        class_slots.insert(node.id(), result.classes.len());
                        result.add_class(class);
                    }
                }
                "field_declaration" | "constant_declaration" => {
                    if let Some(slot) = self.owner_slot(&node, &class_slots) {
                        let in_interface = self.in_interface(&node);
                        let properties = self.extract_fields(&node, in_interface);
                        result.classes[slot].properties.extend(properties);
                    }
                }
                "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                    let slot = self.owner_slot(&node, &class_slots);
                    let class_name = slot.map(|s| result.classes[s].name.clone());
                    if let Some(function) = self.extract_method(&node, class_name.as_deref()) {
                        if let Some(slot) = slot {
                            let class = &mut result.classes[slot];
                            if function.kind == FunctionKind::Constructor {
                                if class.constructor_params.is_empty() {
                                    class.constructor_params = function.params.clone();
                                }
                            } else {
                                class.add_method(&function.name);
                            }
                        }
                        result.add_function(function);
                    }
                }
                _ => {}
            }
        }

        result.type_member_receivers(&["this"], true);
    }

    fn text(&self, node: &Node) -> &'a str {
        TreeSitterParser::node_text(node, self.content)
    }

    fn extract_import(&self, node: &Node, result: &mut ParseResult) {
        let Some(name) = TreeSitterParser::child_of_kinds(node, &["scoped_identifier", "identifier"])
        else {
            return;
        };
        let source = self.text(&name).to_string();
        let is_static = TreeSitterParser::has_keyword(node, "static");
        let is_wildcard = TreeSitterParser::has_keyword(node, "asterisk");

        let mut import = if is_wildcard {
            ImportRef::new(format!("{}.*", source)).wildcard()
        } else {
            let symbol = last_segment(&source);
            ImportRef::new(source.clone()).with_binding(ImportBinding::symbol(symbol, symbol))
        };
        import.is_static = is_static;
        result.add_import(import);
    }

    /// Index of the class that directly owns a member node.
    fn owner_slot(&self, node: &Node, slots: &HashMap<usize, usize>) -> Option<usize> {
        ancestors(*node)
            .find(|a| TYPE_KINDS.contains(&a.kind()))
            .and_then(|a| slots.get(&a.id()).copied())
    }

    fn in_interface(&self, node: &Node) -> bool {
        ancestors(*node)
            .find(|a| TYPE_KINDS.contains(&a.kind()))
            .is_some_and(|a| a.kind() == "interface_declaration")
    }

    /// Lowercased modifier keywords, read from the original text.
    fn modifier_words(&self, node: &Node) -> Vec<String> {
        let Some(modifiers) = TreeSitterParser::child_of_kinds(node, &["modifiers"]) else {
            return Vec::new();
        };
        let mut cursor = modifiers.walk();
        let words = modifiers
            .children(&mut cursor)
            .filter(|c| !c.kind().contains("annotation"))
            .map(|c| TreeSitterParser::node_text(&c, self.original).to_lowercase())
            .collect();
        words
    }

    fn visibility(&self, words: &[String], in_interface: bool) -> Visibility {
        let has = |w: &str| words.iter().any(|m| m == w);
        if has("global") {
            Visibility::Global
        } else if has("public") {
            Visibility::Public
        } else if has("protected") {
            Visibility::Protected
        } else if has("private") {
            Visibility::Private
        } else if in_interface {
            Visibility::Public
        } else {
            match self.dialect {
                Dialect::Java => Visibility::Package,
                Dialect::Apex => Visibility::Private,
            }
        }
    }

    fn extract_type(&self, node: &Node, package: Option<&str>) -> Option<ClassNode> {
        let name = TreeSitterParser::field_text(node, "name", self.content)?;
        let kind = match node.kind() {
            "interface_declaration" => ClassKind::Interface,
            "enum_declaration" => ClassKind::Enum,
            "record_declaration" => ClassKind::Record,
            _ => ClassKind::Class,
        };

        let words = self.modifier_words(node);
        let mut class = ClassNode::new(name, kind, self.visibility(&words, self.in_interface(node)))
            .with_lines(
                TreeSitterParser::node_line(node),
                TreeSitterParser::node_end_line(node),
            );

        for word in &words {
            match word.as_str() {
                "abstract" => class.add_modifier(ClassModifier::Abstract),
                "final" | "sealed" => class.add_modifier(ClassModifier::Sealed),
                "static" => class.add_modifier(ClassModifier::Static),
                "virtual" => class.add_modifier(ClassModifier::Virtual),
                _ => {}
            }
        }

        let mut chain: Vec<&str> = ancestors(*node)
            .filter(|a| TYPE_KINDS.contains(&a.kind()))
            .filter_map(|a| TreeSitterParser::field_text(&a, "name", self.content))
            .collect();
        chain.reverse();
        chain.push(name);
        let nested = chain.join(".");
        class.qualified_name = match (self.dialect, package) {
            (Dialect::Java, Some(package)) => format!("{}.{}", package, nested),
            _ => nested,
        };

        class.superclass = node
            .child_by_field_name("superclass")
            .and_then(|s| s.named_child(0))
            .map(|t| self.text(&t).to_string());

        let interface_list = node
            .child_by_field_name("interfaces")
            .or_else(|| TreeSitterParser::child_of_kinds(node, &["extends_interfaces"]));
        if let Some(list) = interface_list {
            for type_list in Preorder::new(list).filter(|n| n.kind() == "type_list") {
                let mut cursor = type_list.walk();
                for ty in type_list.named_children(&mut cursor) {
                    class.interfaces.push(self.text(&ty).to_string());
                }
            }
        }

        if kind == ClassKind::Record {
            if let Some(params) = node.child_by_field_name("parameters") {
                let mut locals = HashMap::new();
                class.constructor_params = self.extract_parameters(&params, &mut locals);
                for param in &class.constructor_params {
                    let mut property = PropertyNode::new(param.as_str(), Visibility::Private)
                        .with_type(locals.get(param).cloned());
                    property.is_final = true;
                    class.properties.push(property);
                }
            }
        }

        Some(class)
    }

    fn extract_fields(&self, node: &Node, in_interface: bool) -> Vec<PropertyNode> {
        let words = self.modifier_words(node);
        let visibility = self.visibility(&words, in_interface);
        let type_name = TreeSitterParser::field_text(node, "type", self.content).map(str::to_string);
        let is_static = in_interface || words.iter().any(|w| w == "static");
        let is_final = in_interface || words.iter().any(|w| w == "final");

        let mut cursor = node.walk();
        let properties = node
            .children_by_field_name("declarator", &mut cursor)
            .filter_map(|decl| {
                let name = TreeSitterParser::field_text(&decl, "name", self.content)?;
                let mut property =
                    PropertyNode::new(name, visibility).with_type(type_name.clone());
                property.is_static = is_static;
                property.is_final = is_final;
                property.has_default = decl.child_by_field_name("value").is_some();
                Some(property)
            })
            .collect();
        properties
    }

    fn extract_method(&self, node: &Node, class_name: Option<&str>) -> Option<FunctionNode> {
        let name = TreeSitterParser::field_text(node, "name", self.content)?;
        let words = self.modifier_words(node);
        let visibility = self.visibility(&words, self.in_interface(node));

        let kind = if node.kind() != "method_declaration" {
            FunctionKind::Constructor
        } else if words.iter().any(|w| w == "static") {
            FunctionKind::Static
        } else {
            FunctionKind::Instance
        };

        let mut locals = HashMap::new();
        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.extract_parameters(&p, &mut locals))
            .unwrap_or_default();

        let mut function = FunctionNode::new(name, kind, visibility)
            .with_class(class_name)
            .with_lines(
                TreeSitterParser::node_line(node),
                TreeSitterParser::node_end_line(node),
            )
            .with_params(params);

        if let Some(body) = node.child_by_field_name("body") {
            function.calls = self.body_calls(&body, &mut locals);
        }
        Some(function)
    }

    fn extract_parameters(
        &self,
        params: &Node,
        locals: &mut HashMap<String, String>,
    ) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "formal_parameter" => {
                    let Some(name) = TreeSitterParser::field_text(&param, "name", self.content)
                    else {
                        continue;
                    };
                    if let Some(ty) = TreeSitterParser::field_text(&param, "type", self.content) {
                        locals.insert(name.to_string(), ty.to_string());
                    }
                    names.push(name.to_string());
                }
                "spread_parameter" => {
                    let name = Preorder::new(param)
                        .find(|n| n.kind() == "variable_declarator")
                        .and_then(|d| TreeSitterParser::field_text(&d, "name", self.content));
                    if let Some(name) = name {
                        names.push(variadic(name));
                    }
                }
                _ => {}
            }
        }
        names
    }

    /// Direct calls of a method, constructor or trigger body.
    pub fn body_calls(&self, body: &Node, locals: &mut HashMap<String, String>) -> Vec<CallSite> {
        self.collect_local_types(body, locals);

        let mut calls = Vec::new();
        for call in direct_calls(*body, CALL_KINDS, SCOPE_KINDS) {
            if call.kind() == "object_creation_expression" {
                if let Some(ty) = TreeSitterParser::field_text(&call, "type", self.content) {
                    calls.push(CallSite::new(constructed_type(ty)));
                }
                continue;
            }

            let Some(name) = TreeSitterParser::field_text(&call, "name", self.content) else {
                continue;
            };
            let receiver =
                TreeSitterParser::field_text(&call, "object", self.content).map(str::to_string);
            let receiver_type = receiver.as_ref().and_then(|r| locals.get(r).cloned());
            calls.push(
                CallSite::new(name)
                    .with_receiver(receiver)
                    .with_receiver_type(receiver_type),
            );
        }
        calls
    }

    /// Declared local types, with `var x = new T()` inferred as `T`.
    fn collect_local_types(&self, body: &Node, locals: &mut HashMap<String, String>) {
        let prune = |n: &Node| matches!(n.kind(), "lambda_expression" | "class_body");
        for node in Preorder::with_prune(*body, prune) {
            match node.kind() {
                "local_variable_declaration" => {
                    let declared = TreeSitterParser::field_text(&node, "type", self.content);
                    let mut cursor = node.walk();
                    for decl in node.children_by_field_name("declarator", &mut cursor) {
                        let Some(name) = TreeSitterParser::field_text(&decl, "name", self.content)
                        else {
                            continue;
                        };
                        let inferred = decl
                            .child_by_field_name("value")
                            .filter(|v| v.kind() == "object_creation_expression")
                            .and_then(|v| TreeSitterParser::field_text(&v, "type", self.content));
                        let ty = match declared {
                            Some("var") | None => inferred,
                            Some(ty) => Some(ty),
                        };
                        if let Some(ty) = ty {
                            locals.insert(name.to_string(), ty.to_string());
                        }
                    }
                }
                "enhanced_for_statement" => {
                    if let (Some(name), Some(ty)) = (
                        TreeSitterParser::field_text(&node, "name", self.content),
                        TreeSitterParser::field_text(&node, "type", self.content),
                    ) {
                        locals.insert(name.to_string(), ty.to_string());
                    }
                }
                _ => {}
            }
        }
    }
}

/// `new java.util.ArrayList<String>()` is a call named `ArrayList`.
fn constructed_type(ty: &str) -> &str {
    let base = ty.split('<').next().unwrap_or(ty).trim();
    last_segment(base)
}

/// Java analyzer using tree-sitter.
pub struct JavaAnalyzer {
    base: TreeSitterParser,
}

impl JavaAnalyzer {
    pub fn new() -> Self {
        Self {
            base: TreeSitterParser::new(tree_sitter_java::LANGUAGE.into(), "Java"),
        }
    }
}

impl Default for JavaAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for JavaAnalyzer {
    fn parse_file(&self, path: &str, content: &str) -> Result<ParseResult, String> {
        let tree = self.base.parse_tree(content)?;
        let mut result = ParseResult::new(path);

        let walker = JavaWalker {
            dialect: Dialect::Java,
            content,
            original: content,
        };
        walker.walk(&tree, &mut result);

        Ok(result)
    }

    fn language(&self) -> Language {
        Language::Java
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["java"]
    }
}
