//! Go analyzer using tree-sitter.

use std::collections::HashMap;

use tree_sitter::Node;

use super::result::ParseResult;
use super::traits::LanguageAnalyzer;
use super::treesitter::{direct_calls, unquote, variadic, Preorder, TreeSitterParser};
use crate::language::Language;
use crate::model::{
    CallSite, ClassKind, ClassNode, FunctionKind, FunctionNode, ImportBinding, ImportRef,
    PropertyNode, Visibility,
};

const CALL_KINDS: &[&str] = &["call_expression"];
const SCOPE_KINDS: &[&str] = &["func_literal"];

/// Go analyzer using tree-sitter.
pub struct GoAnalyzer {
    base: TreeSitterParser,
}

impl GoAnalyzer {
    pub fn new() -> Self {
        Self {
            base: TreeSitterParser::new(tree_sitter_go::LANGUAGE.into(), "Go"),
        }
    }

    fn extract_import_spec(&self, spec: &Node, content: &str, result: &mut ParseResult) {
        let Some(path) = TreeSitterParser::field_text(spec, "path", content) else {
            return;
        };
        let source = unquote(path).to_string();
        let mut import = ImportRef::new(source.clone());

        match spec.child_by_field_name("name") {
            Some(name) if name.kind() == "dot" => import = import.wildcard(),
            Some(name) if name.kind() == "blank_identifier" => {}
            Some(name) => {
                let alias = TreeSitterParser::node_text(&name, content);
                import = import.with_binding(ImportBinding::module(alias));
            }
            None => {
                import = import.with_binding(ImportBinding::module(package_name(&source)));
            }
        }
        result.add_import(import);
    }

    fn extract_type_spec(&self, node: &Node, content: &str, result: &mut ParseResult) {
        let Some(name) = TreeSitterParser::field_text(node, "name", content) else {
            return;
        };
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let kind = match type_node.kind() {
            "struct_type" => ClassKind::Struct,
            "interface_type" => ClassKind::Interface,
            _ => return,
        };

        let mut class = ClassNode::new(name, kind, Visibility::from_go_name(name)).with_lines(
            TreeSitterParser::node_line(node),
            TreeSitterParser::node_end_line(node),
        );
        if let Some(package) = &result.namespace {
            class.qualified_name = format!("{}.{}", package, name);
        }

        if kind == ClassKind::Struct {
            self.extract_struct_fields(&type_node, content, &mut class);
        } else {
            for elem in Preorder::new(type_node) {
                if matches!(elem.kind(), "method_elem" | "method_spec") {
                    if let Some(method) = TreeSitterParser::field_text(&elem, "name", content) {
                        class.add_method(method);
                    }
                }
            }
        }

        result.add_class(class);
    }

    fn extract_struct_fields(&self, struct_node: &Node, content: &str, class: &mut ClassNode) {
        for field in Preorder::new(*struct_node).filter(|n| n.kind() == "field_declaration") {
            let type_name = TreeSitterParser::field_text(&field, "type", content)
                .unwrap_or_default()
                .to_string();

            let mut cursor = field.walk();
            let names: Vec<&str> = field
                .children_by_field_name("name", &mut cursor)
                .map(|n| TreeSitterParser::node_text(&n, content))
                .collect();

            if names.is_empty() {
                // Embedded field: promoted methods come from the embedded type.
                let embedded = type_name.trim_start_matches('*');
                let short = embedded.rsplit('.').next().unwrap_or(embedded);
                if class.superclass.is_none() {
                    class.superclass = Some(embedded.to_string());
                }
                class.properties.push(
                    PropertyNode::new(short, Visibility::from_go_name(short))
                        .with_type(Some(type_name.clone())),
                );
                continue;
            }

            for name in names {
                class.properties.push(
                    PropertyNode::new(name, Visibility::from_go_name(name))
                        .with_type(Some(type_name.clone())),
                );
            }
        }
    }

    fn extract_function(&self, node: &Node, content: &str, result: &mut ParseResult) {
        let Some(name) = TreeSitterParser::field_text(node, "name", content) else {
            return;
        };

        let mut locals = HashMap::new();
        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|r| self.extract_receiver(&r, content));

        let (kind, class_name, receiver_var) = match &receiver {
            Some((var, ty)) => {
                if let Some(var) = var {
                    locals.insert(var.clone(), ty.clone());
                }
                (FunctionKind::Instance, Some(ty.as_str()), var.as_deref())
            }
            None => (FunctionKind::Free, None, None),
        };

        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.extract_parameters(&p, content, &mut locals))
            .unwrap_or_default();

        let mut function = FunctionNode::new(name, kind, Visibility::from_go_name(name))
            .with_class(class_name)
            .with_lines(
                TreeSitterParser::node_line(node),
                TreeSitterParser::node_end_line(node),
            )
            .with_params(params);

        if let Some(body) = node.child_by_field_name("body") {
            self.collect_local_types(&body, content, &mut locals);
            function.calls = self.extract_calls(&body, content, &locals, receiver_var);
        }

        if let Some(class) = class_name.and_then(|c| result.class_mut(c)) {
            class.add_method(name);
        }
        result.add_function(function);
    }

    /// Receiver variable and its base type name (`(s *Server)` -> `s`, `Server`).
    fn extract_receiver(&self, receiver: &Node, content: &str) -> Option<(Option<String>, String)> {
        let decl = Preorder::new(*receiver).find(|n| n.kind() == "parameter_declaration")?;
        let var = TreeSitterParser::field_text(&decl, "name", content).map(str::to_string);
        let ty = decl.child_by_field_name("type")?;
        let base = Preorder::new(ty).find(|n| n.kind() == "type_identifier")?;
        Some((var, TreeSitterParser::node_text(&base, content).to_string()))
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
            let type_name = TreeSitterParser::field_text(&param, "type", content);
            let mut name_cursor = param.walk();
            for name in param.children_by_field_name("name", &mut name_cursor) {
                let name = TreeSitterParser::node_text(&name, content);
                if let Some(ty) = type_name {
                    locals.insert(name.to_string(), ty.to_string());
                }
                if param.kind() == "variadic_parameter_declaration" {
                    names.push(variadic(name));
                } else {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    /// `x := T{}`, `x := &T{}`, `x := NewT()` and `var x T` give `x` a type.
    fn collect_local_types(&self, body: &Node, content: &str, locals: &mut HashMap<String, String>) {
        for node in Preorder::with_prune(*body, |n| n.kind() == "func_literal") {
            match node.kind() {
                "short_var_declaration" => {
                    let (Some(left), Some(right)) = (
                        node.child_by_field_name("left"),
                        node.child_by_field_name("right"),
                    ) else {
                        continue;
                    };
                    let mut lc = left.walk();
                    let mut rc = right.walk();
                    for (name, value) in left.named_children(&mut lc).zip(right.named_children(&mut rc)) {
                        if let Some(ty) = self.value_type(&value, content) {
                            locals.insert(TreeSitterParser::node_text(&name, content).to_string(), ty);
                        }
                    }
                }
                "var_spec" => {
                    let ty = TreeSitterParser::field_text(&node, "type", content)
                        .map(str::to_string)
                        .or_else(|| {
                            node.child_by_field_name("value")
                                .and_then(|v| v.named_child(0))
                                .and_then(|v| self.value_type(&v, content))
                        });
                    if let Some(ty) = ty {
                        let mut cursor = node.walk();
                        for name in node.children_by_field_name("name", &mut cursor) {
                            locals.insert(TreeSitterParser::node_text(&name, content).to_string(), ty.clone());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn value_type(&self, value: &Node, content: &str) -> Option<String> {
        match value.kind() {
            "composite_literal" => TreeSitterParser::field_text(value, "type", content).map(str::to_string),
            "unary_expression" => value
                .child_by_field_name("operand")
                .and_then(|operand| self.value_type(&operand, content)),
            "call_expression" => {
                // Constructor convention: NewServer() returns a Server.
                let func = TreeSitterParser::field_text(value, "function", content)?;
                let name = func.rsplit('.').next()?;
                name.strip_prefix("New")
                    .filter(|t| t.starts_with(char::is_uppercase))
                    .map(str::to_string)
            }
            _ => None,
        }
    }

    fn extract_calls(
        &self,
        body: &Node,
        content: &str,
        locals: &HashMap<String, String>,
        receiver_var: Option<&str>,
    ) -> Vec<CallSite> {
        let mut calls = Vec::new();
        for call in direct_calls(*body, CALL_KINDS, SCOPE_KINDS) {
            let Some(func) = call.child_by_field_name("function") else {
                continue;
            };
            match func.kind() {
                "identifier" => {
                    calls.push(CallSite::new(TreeSitterParser::node_text(&func, content)));
                }
                "selector_expression" => {
                    let Some(field) = TreeSitterParser::field_text(&func, "field", content) else {
                        continue;
                    };
                    // `s.repo` on the method receiver `s` is a member access.
                    let receiver = TreeSitterParser::field_text(&func, "operand", content)
                        .map(|r| match receiver_var.and_then(|v| r.strip_prefix(v)) {
                            Some(rest) if rest.starts_with('.') => format!("this{}", rest),
                            _ => r.to_string(),
                        });
                    let receiver_type = receiver.as_ref().and_then(|r| locals.get(r).cloned());
                    calls.push(
                        CallSite::new(field)
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

impl Default for GoAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for GoAnalyzer {
    fn parse_file(&self, path: &str, content: &str) -> Result<ParseResult, String> {
        let tree = self.base.parse_tree(content)?;
        let mut result = ParseResult::new(path);

        let mut deferred = Vec::new();
        for node in Preorder::with_prune(tree.root_node(), |n| n.kind() == "block") {
            match node.kind() {
                "package_clause" => {
                    let mut cursor = node.walk();
                    let package = node
                        .named_children(&mut cursor)
                        .next()
                        .map(|n| TreeSitterParser::node_text(&n, content).to_string());
                    if result.namespace.is_none() {
                        result.namespace = package;
                    }
                }
                "import_spec" => self.extract_import_spec(&node, content, &mut result),
                "type_spec" => self.extract_type_spec(&node, content, &mut result),
                "function_declaration" | "method_declaration" => deferred.push(node),
                _ => {}
            }
        }

        // Methods attach to structs declared anywhere in the file.
        for node in deferred {
            self.extract_function(&node, content, &mut result);
        }
        result.type_member_receivers(&["this"], false);

        Ok(result)
    }

    fn language(&self) -> Language {
        Language::Go
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["go"]
    }
}

/// Name a Go import path binds by default (`github.com/x/pkg/v2` -> `pkg`).
fn package_name(import_path: &str) -> &str {
    let mut segments = import_path.rsplit('/');
    let last = segments.next().unwrap_or(import_path);
    let is_version = last.len() > 1
        && last.starts_with('v')
        && last[1..].chars().all(|c| c.is_ascii_digit());
    if is_version {
        segments.next().unwrap_or(last)
    } else {
        last
    }
}
