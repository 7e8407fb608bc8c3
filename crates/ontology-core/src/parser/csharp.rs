//! C# analyzer using tree-sitter.

use std::collections::HashMap;

use tree_sitter::Node;

use super::result::ParseResult;
use super::traits::LanguageAnalyzer;
use super::treesitter::{ancestors, direct_calls, last_segment, variadic, Preorder, TreeSitterParser};
use crate::language::Language;
use crate::model::{
    CallSite, ClassKind, ClassModifier, ClassNode, FunctionKind, FunctionNode, ImportBinding,
    ImportRef, PropertyNode, Visibility,
};

const CALL_KINDS: &[&str] = &["invocation_expression", "object_creation_expression"];
const SCOPE_KINDS: &[&str] = &[
    "lambda_expression",
    "anonymous_method_expression",
    "local_function_statement",
];
const TYPE_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "struct_declaration",
    "record_declaration",
    "record_struct_declaration",
    "enum_declaration",
];
const BODY_KINDS: &[&str] = &["block", "arrow_expression_clause", "accessor_list"];

/// C# analyzer using tree-sitter.
pub struct CSharpAnalyzer {
    base: TreeSitterParser,
}

impl CSharpAnalyzer {
    pub fn new() -> Self {
        Self {
            base: TreeSitterParser::new(tree_sitter_c_sharp::LANGUAGE.into(), "C#"),
        }
    }

    fn extract_using(&self, node: &Node, content: &str, result: &mut ParseResult) {
        let text = TreeSitterParser::node_text(node, content)
            .trim()
            .trim_end_matches(';');
        let text = text.strip_prefix("global").map(str::trim_start).unwrap_or(text);
        let Some(rest) = text.strip_prefix("using") else {
            return;
        };
        let rest = rest.trim();

        let import = if let Some(target) = rest.strip_prefix("static ") {
            let mut import = ImportRef::new(target.trim());
            import.is_static = true;
            import
        } else if let Some((alias, target)) = rest.split_once('=') {
            ImportRef::new(target.trim()).with_binding(ImportBinding::module(alias.trim()))
        } else {
            ImportRef::new(rest).wildcard()
        };
        if !import.source.is_empty() {
            result.add_import(import);
        }
    }

    fn extract_type(&self, node: &Node, content: &str, file_namespace: Option<&str>) -> Option<ClassNode> {
        let name = TreeSitterParser::field_text(node, "name", content)?;
        let kind = match node.kind() {
            "interface_declaration" => ClassKind::Interface,
            "struct_declaration" | "record_struct_declaration" => ClassKind::Struct,
            "record_declaration" => ClassKind::Record,
            "enum_declaration" => ClassKind::Enum,
            _ => ClassKind::Class,
        };

        let words = modifier_words(node, content);
        let nested = enclosing_type(node).is_some();
        let default = if in_interface(node) {
            Visibility::Public
        } else if nested {
            Visibility::Private
        } else {
            Visibility::Internal
        };
        let mut class = ClassNode::new(name, kind, visibility(&words, default)).with_lines(
            TreeSitterParser::node_line(node),
            TreeSitterParser::node_end_line(node),
        );
        for word in &words {
            match word.as_str() {
                "abstract" => class.add_modifier(ClassModifier::Abstract),
                "sealed" => class.add_modifier(ClassModifier::Sealed),
                "static" => class.add_modifier(ClassModifier::Static),
                "partial" => class.add_modifier(ClassModifier::Partial),
                "virtual" => class.add_modifier(ClassModifier::Virtual),
                _ => {}
            }
        }

        let mut chain: Vec<&str> = ancestors(*node)
            .filter(|a| TYPE_KINDS.contains(&a.kind()) || a.kind() == "namespace_declaration")
            .filter_map(|a| TreeSitterParser::field_text(&a, "name", content))
            .collect();
        if let Some(ns) = file_namespace {
            chain.push(ns);
        }
        chain.reverse();
        chain.push(name);
        class.qualified_name = chain.join(".");

        // C# does not mark which base is the class; an `I`-prefixed name is
        // taken as an interface.
        if let Some(bases) = TreeSitterParser::child_of_kinds(node, &["base_list"]) {
            let mut cursor = bases.walk();
            for (i, base) in bases.named_children(&mut cursor).enumerate() {
                let base_name = match base.kind() {
                    "primary_constructor_base_type" => base
                        .named_child(0)
                        .map(|t| TreeSitterParser::node_text(&t, content))
                        .unwrap_or_default(),
                    "argument_list" => continue,
                    _ => TreeSitterParser::node_text(&base, content),
                };
                if base_name.is_empty() {
                    continue;
                }
                let is_interface = kind == ClassKind::Interface || looks_like_interface(base_name);
                if i == 0 && !is_interface && kind != ClassKind::Enum {
                    class.superclass = Some(base_name.to_string());
                } else {
                    class.interfaces.push(base_name.to_string());
                }
            }
        }

        if matches!(kind, ClassKind::Record | ClassKind::Struct | ClassKind::Class) {
            if let Some(params) = node
                .child_by_field_name("parameters")
                .or_else(|| TreeSitterParser::child_of_kinds(node, &["parameter_list"]))
            {
                let mut locals = HashMap::new();
                class.constructor_params = self.extract_parameters(&params, content, &mut locals);
                for param in &class.constructor_params {
                    let mut property = PropertyNode::new(param.as_str(), Visibility::Public)
                        .with_type(locals.get(param).cloned());
                    property.is_final = kind == ClassKind::Record;
                    class.properties.push(property);
                }
            }
        }

        Some(class)
    }

    fn extract_fields(&self, node: &Node, content: &str) -> Vec<PropertyNode> {
        let words = modifier_words(node, content);
        let default = if in_interface(node) {
            Visibility::Public
        } else {
            Visibility::Private
        };
        let visibility = visibility(&words, default);
        let is_static = words.iter().any(|w| w == "static" || w == "const");
        let is_final = words.iter().any(|w| w == "readonly" || w == "const");

        if node.kind() == "property_declaration" {
            let Some(name) = TreeSitterParser::field_text(node, "name", content) else {
                return Vec::new();
            };
            let mut property = PropertyNode::new(name, visibility).with_type(
                TreeSitterParser::field_text(node, "type", content).map(str::to_string),
            );
            property.is_static = is_static;
            property.is_final = is_final;
            property.has_default = node.child_by_field_name("value").is_some();
            return vec![property];
        }

        let Some(declaration) = TreeSitterParser::child_of_kinds(node, &["variable_declaration"]) else {
            return Vec::new();
        };
        let type_name = TreeSitterParser::field_text(&declaration, "type", content).map(str::to_string);
        TreeSitterParser::children_of_kind(&declaration, "variable_declarator")
            .into_iter()
            .filter_map(|decl| {
                let name = declarator_name(&decl, content)?;
                let mut property = PropertyNode::new(name, visibility).with_type(type_name.clone());
                property.is_static = is_static;
                property.is_final = is_final;
                property.has_default = TreeSitterParser::has_keyword(&decl, "=")
                    || TreeSitterParser::child_of_kinds(&decl, &["equals_value_clause"]).is_some();
                Some(property)
            })
            .collect()
    }

    fn extract_method(
        &self,
        node: &Node,
        content: &str,
        class_name: Option<&str>,
        class_types: &HashMap<String, String>,
    ) -> Option<FunctionNode> {
        let name = TreeSitterParser::field_text(node, "name", content)?;
        let words = modifier_words(node, content);
        let default = if in_interface(node) {
            Visibility::Public
        } else {
            Visibility::Private
        };
        let kind = if node.kind() == "constructor_declaration" {
            FunctionKind::Constructor
        } else if words.iter().any(|w| w == "static") {
            FunctionKind::Static
        } else {
            FunctionKind::Instance
        };

        let mut locals = class_types.clone();
        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.extract_parameters(&p, content, &mut locals))
            .unwrap_or_default();

        let mut function = FunctionNode::new(name, kind, visibility(&words, default))
            .with_class(class_name)
            .with_lines(
                TreeSitterParser::node_line(node),
                TreeSitterParser::node_end_line(node),
            )
            .with_params(params);

        let body = node
            .child_by_field_name("body")
            .or_else(|| TreeSitterParser::child_of_kinds(node, &["arrow_expression_clause"]));
        if let Some(body) = body {
            function.calls = self.body_calls(&body, content, &mut locals);
        }
        Some(function)
    }

    fn extract_parameters(
        &self,
        params: &Node,
        content: &str,
        locals: &mut HashMap<String, String>,
    ) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if !matches!(param.kind(), "parameter" | "parameter_array") {
                continue;
            }
            let Some(name) = TreeSitterParser::field_text(&param, "name", content).or_else(|| {
                TreeSitterParser::children_of_kind(&param, "identifier")
                    .last()
                    .map(|n| TreeSitterParser::node_text(n, content))
            }) else {
                continue;
            };
            if let Some(ty) = TreeSitterParser::field_text(&param, "type", content) {
                locals.insert(name.to_string(), ty.to_string());
            }

            let is_params = param.kind() == "parameter_array"
                || TreeSitterParser::has_keyword(&param, "params")
                || TreeSitterParser::node_text(&param, content).starts_with("params ");
            if is_params {
                names.push(variadic(name));
            } else {
                names.push(name.to_string());
            }
        }

        // `params T[] xs` can sit as bare fields on the list itself.
        if let Some(name) = TreeSitterParser::field_text(params, "name", content) {
            if let Some(ty) = TreeSitterParser::field_text(params, "type", content) {
                locals.insert(name.to_string(), ty.to_string());
            }
            names.push(variadic(name));
        }
        names
    }

    fn body_calls(
        &self,
        body: &Node,
        content: &str,
        locals: &mut HashMap<String, String>,
    ) -> Vec<CallSite> {
        collect_local_types(body, content, locals);

        let mut calls = Vec::new();
        for call in direct_calls(*body, CALL_KINDS, SCOPE_KINDS) {
            if call.kind() == "object_creation_expression" {
                if let Some(ty) = TreeSitterParser::field_text(&call, "type", content) {
                    calls.push(CallSite::new(constructed_type(ty)));
                }
                continue;
            }

            let Some(func) = call.child_by_field_name("function") else {
                continue;
            };
            match func.kind() {
                "identifier" => calls.push(CallSite::new(TreeSitterParser::node_text(&func, content))),
                "generic_name" => {
                    if let Some(id) = TreeSitterParser::child_of_kinds(&func, &["identifier"]) {
                        calls.push(CallSite::new(TreeSitterParser::node_text(&id, content)));
                    }
                }
                "member_access_expression" => {
                    let Some(name_node) = func.child_by_field_name("name") else {
                        continue;
                    };
                    let name = match name_node.kind() {
                        "generic_name" => TreeSitterParser::child_of_kinds(&name_node, &["identifier"])
                            .map(|id| TreeSitterParser::node_text(&id, content)),
                        _ => Some(TreeSitterParser::node_text(&name_node, content)),
                    };
                    let Some(name) = name else {
                        continue;
                    };
                    let receiver =
                        TreeSitterParser::field_text(&func, "expression", content).map(str::to_string);
                    let receiver_type = receiver.as_ref().and_then(|r| locals.get(r).cloned());
                    calls.push(
                        CallSite::new(name)
                            .with_receiver(receiver)
                            .with_receiver_type(receiver_type),
                    );
                }
                _ => {}
            }
        }
        calls
    }
}

impl Default for CSharpAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for CSharpAnalyzer {
    fn parse_file(&self, path: &str, content: &str) -> Result<ParseResult, String> {
        let tree = self.base.parse_tree(content)?;
        let mut result = ParseResult::new(path);
        let mut class_slots: HashMap<usize, usize> = HashMap::new();
        let mut file_namespace: Option<String> = None;

        for node in Preorder::with_prune(tree.root_node(), |n| BODY_KINDS.contains(&n.kind())) {
            match node.kind() {
                "using_directive" => self.extract_using(&node, content, &mut result),
                "file_scoped_namespace_declaration" => {
                    file_namespace =
                        TreeSitterParser::field_text(&node, "name", content).map(str::to_string);
                    if result.namespace.is_none() {
                        result.namespace = file_namespace.clone();
                    }
                }
                "namespace_declaration" => {
                    if result.namespace.is_none() {
                        let mut chain: Vec<&str> = ancestors(node)
                            .filter(|a| a.kind() == "namespace_declaration")
                            .filter_map(|a| TreeSitterParser::field_text(&a, "name", content))
                            .collect();
                        chain.reverse();
                        if let Some(name) = TreeSitterParser::field_text(&node, "name", content) {
                            chain.push(name);
                        }
                        result.namespace = Some(chain.join("."));
                    }
                }
                kind if TYPE_KINDS.contains(&kind) => {
                    if let Some(class) = self.extract_type(&node, content, file_namespace.as_deref()) {
                        class_slots.insert(node.id(), result.classes.len());
                        result.add_class(class);
                    }
                }
                "field_declaration" | "property_declaration" | "event_field_declaration" => {
                    if let Some(slot) = owner_slot(&node, &class_slots) {
                        let properties = self.extract_fields(&node, content);
                        result.classes[slot].properties.extend(properties);
                    }
                }
                "method_declaration" | "constructor_declaration" => {
                    let slot = owner_slot(&node, &class_slots);
                    let class_name = slot.map(|s| result.classes[s].name.clone());
                    let class_types = slot
                        .map(|s| member_types(&result.classes[s]))
                        .unwrap_or_default();
                    let Some(function) =
                        self.extract_method(&node, content, class_name.as_deref(), &class_types)
                    else {
                        continue;
                    };
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
                _ => {}
            }
        }

        result.type_member_receivers(&["this"], true);
        Ok(result)
    }

    fn language(&self) -> Language {
        Language::CSharp
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["cs"]
    }
}

fn enclosing_type<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    ancestors(*node).find(|a| TYPE_KINDS.contains(&a.kind()))
}

fn owner_slot(node: &Node, slots: &HashMap<usize, usize>) -> Option<usize> {
    enclosing_type(node).and_then(|a| slots.get(&a.id()).copied())
}

fn in_interface(node: &Node) -> bool {
    enclosing_type(node).is_some_and(|a| a.kind() == "interface_declaration")
}

fn modifier_words(node: &Node, content: &str) -> Vec<String> {
    TreeSitterParser::children_of_kind(node, "modifier")
        .iter()
        .map(|m| TreeSitterParser::node_text(m, content).to_string())
        .collect()
}

fn visibility(words: &[String], default: Visibility) -> Visibility {
    let has = |w: &str| words.iter().any(|m| m == w);
    match (has("public"), has("protected"), has("internal"), has("private")) {
        (true, ..) => Visibility::Public,
        (_, true, true, _) | (_, true, _, true) => Visibility::ProtectedInternal,
        (_, true, ..) => Visibility::Protected,
        (_, _, true, _) => Visibility::Internal,
        (_, _, _, true) => Visibility::Private,
        _ => default,
    }
}

/// Fields and properties of a class keyed by name, seeding local type lookup.
fn member_types(class: &ClassNode) -> HashMap<String, String> {
    class
        .properties
        .iter()
        .filter_map(|p| p.type_name.clone().map(|t| (p.name.clone(), t)))
        .collect()
}

fn declarator_name<'a>(decl: &Node, content: &'a str) -> Option<&'a str> {
    TreeSitterParser::field_text(decl, "name", content).or_else(|| {
        TreeSitterParser::child_of_kinds(decl, &["identifier"])
            .map(|id| TreeSitterParser::node_text(&id, content))
    })
}

fn looks_like_interface(name: &str) -> bool {
    let simple = last_segment(name);
    let mut chars = simple.chars();
    matches!((chars.next(), chars.next()), (Some('I'), Some(c)) if c.is_uppercase())
}

/// `new Dictionary<string, int>()` is a call named `Dictionary`.
fn constructed_type(ty: &str) -> &str {
    let base = ty.split('<').next().unwrap_or(ty).trim();
    last_segment(base)
}

/// Declared local types, with `var x = new T()` inferred as `T`.
fn collect_local_types(body: &Node, content: &str, locals: &mut HashMap<String, String>) {
    let prune = |n: &Node| SCOPE_KINDS.contains(&n.kind());
    for node in Preorder::with_prune(*body, prune) {
        match node.kind() {
            "variable_declaration" => {
                let declared = TreeSitterParser::field_text(&node, "type", content);
                for decl in TreeSitterParser::children_of_kind(&node, "variable_declarator") {
                    let Some(name) = declarator_name(&decl, content) else {
                        continue;
                    };
                    let inferred = Preorder::new(decl)
                        .find(|n| n.kind() == "object_creation_expression")
                        .and_then(|n| TreeSitterParser::field_text(&n, "type", content));
                    let ty = match declared {
                        Some("var") | None => inferred,
                        Some(ty) => Some(ty),
                    };
                    if let Some(ty) = ty {
                        locals.insert(name.to_string(), ty.to_string());
                    }
                }
            }
            "foreach_statement" => {
                let name = TreeSitterParser::field_text(&node, "left", content);
                let ty = TreeSitterParser::field_text(&node, "type", content).filter(|t| *t != "var");
                if let (Some(name), Some(ty)) = (name, ty) {
                    locals.insert(name.to_string(), ty.to_string());
                }
            }
            _ => {}
        }
    }
}
