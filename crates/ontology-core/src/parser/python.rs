//! Python analyzer using tree-sitter.

use std::collections::HashMap;

use tree_sitter::Node;

use super::result::ParseResult;
use super::traits::LanguageAnalyzer;
use super::treesitter::{
    ancestors, direct_calls, last_segment, variadic, Preorder, TreeSitterParser, ARRAY_PATTERN,
};
use crate::language::Language;
use crate::model::{
    CallSite, ClassKind, ClassModifier, ClassNode, FunctionKind, FunctionNode, ImportBinding,
    ImportRef, PropertyNode, Visibility,
};

const CALL_KINDS: &[&str] = &["call"];
const SCOPE_KINDS: &[&str] = &["lambda", "function_definition", "class_definition"];

/// Python analyzer using tree-sitter.
pub struct PythonAnalyzer {
    base: TreeSitterParser,
}

impl PythonAnalyzer {
    pub fn new() -> Self {
        Self {
            base: TreeSitterParser::new(tree_sitter_python::LANGUAGE.into(), "Python"),
        }
    }

    fn extract_import(&self, node: &Node, content: &str, result: &mut ParseResult) {
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let (module, alias) = split_alias(&name, content);
            let local = alias.unwrap_or(module);
            result.add_import(ImportRef::new(module).with_binding(ImportBinding::module(local)));
        }
    }

    fn extract_from_import(&self, node: &Node, content: &str, result: &mut ParseResult) {
        let Some(module) = TreeSitterParser::field_text(node, "module_name", content) else {
            return;
        };
        let mut import = ImportRef::new(module);

        if TreeSitterParser::child_of_kinds(node, &["wildcard_import"]).is_some() {
            import = import.wildcard();
        }
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let (symbol, alias) = split_alias(&name, content);
            import = import.with_binding(ImportBinding::symbol(alias.unwrap_or(symbol), symbol));
        }
        result.add_import(import);
    }

    fn extract_class(&self, node: &Node, content: &str) -> Option<ClassNode> {
        let name = TreeSitterParser::field_text(node, "name", content)?;
        let mut class = ClassNode::new(name, ClassKind::Class, Visibility::from_python_name(name))
            .with_lines(
                TreeSitterParser::node_line(node),
                TreeSitterParser::node_end_line(node),
            );
        class.qualified_name = enclosing_classes(node, content)
            .into_iter()
            .rev()
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join(".");

        if let Some(bases) = node.child_by_field_name("superclasses") {
            let mut cursor = bases.walk();
            for base in bases.named_children(&mut cursor) {
                match base.kind() {
                    "identifier" | "attribute" => {
                        let base = TreeSitterParser::node_text(&base, content);
                        if last_segment(base) == "ABC" {
                            class.add_modifier(ClassModifier::Abstract);
                        } else if class.superclass.is_none() {
                            class.superclass = Some(base.to_string());
                        } else {
                            class.interfaces.push(base.to_string());
                        }
                    }
                    "keyword_argument" => {
                        let value = TreeSitterParser::field_text(&base, "value", content);
                        if value.is_some_and(|v| last_segment(v) == "ABCMeta") {
                            class.add_modifier(ClassModifier::Abstract);
                        }
                    }
                    _ => {}
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for stmt in body.named_children(&mut cursor) {
                let Some(assignment) = stmt.named_child(0).filter(|n| n.kind() == "assignment")
                else {
                    continue;
                };
                if let Some(property) = self.class_attribute(&assignment, content) {
                    class.properties.push(property);
                }
            }
        }

        Some(class)
    }

    /// `name: T = value` at class level.
    fn class_attribute(&self, assignment: &Node, content: &str) -> Option<PropertyNode> {
        let left = assignment.child_by_field_name("left")?;
        if left.kind() != "identifier" {
            return None;
        }
        let name = TreeSitterParser::node_text(&left, content);
        let type_name = TreeSitterParser::field_text(assignment, "type", content)
            .map(str::to_string)
            .or_else(|| {
                assignment
                    .child_by_field_name("right")
                    .and_then(|v| constructed_type(&v, content))
            });
        let mut property = PropertyNode::new(name, Visibility::from_python_name(name))
            .with_type(type_name);
        property.is_static = true;
        property.is_final = name.chars().all(|c| c.is_uppercase() || c == '_' || c.is_ascii_digit());
        property.has_default = assignment.child_by_field_name("right").is_some();
        Some(property)
    }

    fn extract_function(
        &self,
        node: &Node,
        content: &str,
        class_name: Option<&str>,
    ) -> (FunctionNode, Vec<PropertyNode>, bool) {
        let name = TreeSitterParser::field_text(node, "name", content).unwrap_or_default();
        let decorators = decorators(node, content);
        let has = |d: &str| decorators.iter().any(|x| last_segment(x) == d);

        let kind = match class_name {
            None => FunctionKind::Free,
            Some(_) if name == "__init__" => FunctionKind::Constructor,
            Some(_) if has("staticmethod") || has("classmethod") => FunctionKind::Static,
            Some(_) => FunctionKind::Instance,
        };

        let mut locals = HashMap::new();
        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.extract_parameters(&p, content, &mut locals))
            .unwrap_or_default();

        let mut function = FunctionNode::new(name, kind, Visibility::from_python_name(name))
            .with_class(class_name)
            .with_lines(
                TreeSitterParser::node_line(node),
                TreeSitterParser::node_end_line(node),
            )
            .with_params(params);

        let mut members = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            self.collect_assignments(&body, content, &mut locals, &mut members);
            function.calls = self.extract_calls(&body, content, &locals, class_name);
        }
        if kind != FunctionKind::Constructor {
            members.clear();
        }

        (function, members, has("abstractmethod"))
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
            let name = match param.kind() {
                "identifier" => TreeSitterParser::node_text(&param, content).to_string(),
                "typed_parameter" => match param.named_child(0) {
                    Some(inner) if inner.kind() == "identifier" => {
                        TreeSitterParser::node_text(&inner, content).to_string()
                    }
                    Some(inner) => splat_name(&inner, content),
                    None => continue,
                },
                "default_parameter" | "typed_default_parameter" => {
                    match TreeSitterParser::field_text(&param, "name", content) {
                        Some(name) => name.to_string(),
                        None => continue,
                    }
                }
                "list_splat_pattern" | "dictionary_splat_pattern" => splat_name(&param, content),
                "tuple_pattern" => ARRAY_PATTERN.to_string(),
                _ => continue,
            };
            if name == "self" || name == "cls" || name.is_empty() {
                continue;
            }
            if let Some(ty) = type_name {
                locals.insert(name.clone(), ty.to_string());
            }
            names.push(name);
        }
        names
    }

    /// Local variable types and `self.x = ...` members of a body.
    fn collect_assignments(
        &self,
        body: &Node,
        content: &str,
        locals: &mut HashMap<String, String>,
        members: &mut Vec<PropertyNode>,
    ) {
        let prune = |n: &Node| SCOPE_KINDS.contains(&n.kind());
        for node in Preorder::with_prune(*body, prune).filter(|n| n.kind() == "assignment") {
            let Some(left) = node.child_by_field_name("left") else {
                continue;
            };
            let right = node.child_by_field_name("right");
            let ty = TreeSitterParser::field_text(&node, "type", content)
                .map(str::to_string)
                .or_else(|| right.and_then(|r| constructed_type(&r, content)))
                .or_else(|| {
                    right
                        .filter(|r| r.kind() == "identifier")
                        .and_then(|r| locals.get(TreeSitterParser::node_text(&r, content)).cloned())
                });

            match left.kind() {
                "identifier" => {
                    if let Some(ty) = ty {
                        locals.insert(TreeSitterParser::node_text(&left, content).to_string(), ty);
                    }
                }
                "attribute" => {
                    let object = TreeSitterParser::field_text(&left, "object", content);
                    let attribute = TreeSitterParser::field_text(&left, "attribute", content);
                    if let (Some("self"), Some(attribute)) = (object, attribute) {
                        if members.iter().any(|m: &PropertyNode| m.name == attribute) {
                            continue;
                        }
                        let mut property =
                            PropertyNode::new(attribute, Visibility::from_python_name(attribute))
                                .with_type(ty);
                        property.has_default = right.is_some();
                        members.push(property);
                    }
                }
                _ => {}
            }
        }
    }

    fn extract_calls(
        &self,
        body: &Node,
        content: &str,
        locals: &HashMap<String, String>,
        class_name: Option<&str>,
    ) -> Vec<CallSite> {
        let mut calls = Vec::new();
        for call in direct_calls(*body, CALL_KINDS, SCOPE_KINDS) {
            let Some(func) = call.child_by_field_name("function") else {
                continue;
            };
            match func.kind() {
                "identifier" => calls.push(CallSite::new(TreeSitterParser::node_text(&func, content))),
                "attribute" => {
                    let Some(name) = TreeSitterParser::field_text(&func, "attribute", content) else {
                        continue;
                    };
                    let receiver =
                        TreeSitterParser::field_text(&func, "object", content).map(str::to_string);
                    let receiver_type = match receiver.as_deref() {
                        Some("cls") => class_name.map(str::to_string),
                        Some(r) => locals.get(r).cloned(),
                        None => None,
                    };
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

impl Default for PythonAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for PythonAnalyzer {
    fn parse_file(&self, path: &str, content: &str) -> Result<ParseResult, String> {
        let tree = self.base.parse_tree(content)?;
        let mut result = ParseResult::new(path);
        let mut class_slots: HashMap<usize, usize> = HashMap::new();

        // Function bodies are not entered: nested functions belong to their
        // enclosing function's scope, not to the file.
        let prune = |n: &Node| {
            n.kind() == "block" && n.parent().is_some_and(|p| p.kind() == "function_definition")
        };
        for node in Preorder::with_prune(tree.root_node(), prune) {
            match node.kind() {
                "import_statement" => self.extract_import(&node, content, &mut result),
                "import_from_statement" => self.extract_from_import(&node, content, &mut result),
                "class_definition" => {
                    if let Some(class) = self.extract_class(&node, content) {
                        class_slots.insert(node.id(), result.classes.len());
                        result.add_class(class);
                    }
                }
                "function_definition" => {
                    let owner = owner_class(&node);
                    let slot = owner.and_then(|o| class_slots.get(&o.id()).copied());
                    let class_name = slot.map(|s| result.classes[s].name.clone());
                    let (function, members, is_abstract) =
                        self.extract_function(&node, content, class_name.as_deref());

                    if let Some(slot) = slot {
                        let class = &mut result.classes[slot];
                        if function.kind == FunctionKind::Constructor {
                            class.constructor_params = function.params.clone();
                            for member in members {
                                if !class.properties.iter().any(|p| p.name == member.name) {
                                    class.properties.push(member);
                                }
                            }
                        }
                        class.add_method(&function.name);
                        if is_abstract {
                            class.add_modifier(ClassModifier::Abstract);
                        }
                    }
                    result.add_function(function);
                }
                _ => {}
            }
        }

        result.type_member_receivers(&["self"], false);
        Ok(result)
    }

    fn language(&self) -> Language {
        Language::Python
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["py"]
    }
}

/// `a.b as c` -> (`a.b`, Some(`c`)).
fn split_alias<'a>(node: &Node, content: &'a str) -> (&'a str, Option<&'a str>) {
    if node.kind() == "aliased_import" {
        let name = TreeSitterParser::field_text(node, "name", content).unwrap_or_default();
        (name, TreeSitterParser::field_text(node, "alias", content))
    } else {
        (TreeSitterParser::node_text(node, content), None)
    }
}

/// The class a `def` is a method of, looking through decorators.
fn owner_class<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    ancestors(*node)
        .find(|a| matches!(a.kind(), "class_definition" | "function_definition"))
        .filter(|a| a.kind() == "class_definition")
}

fn enclosing_classes<'a>(node: &Node, content: &'a str) -> Vec<&'a str> {
    ancestors(*node)
        .filter(|a| a.kind() == "class_definition")
        .filter_map(|a| TreeSitterParser::field_text(&a, "name", content))
        .collect()
}

fn decorators(node: &Node, content: &str) -> Vec<String> {
    let Some(parent) = node.parent().filter(|p| p.kind() == "decorated_definition") else {
        return Vec::new();
    };
    TreeSitterParser::children_of_kind(&parent, "decorator")
        .iter()
        .map(|d| {
            let text = TreeSitterParser::node_text(d, content).trim_start_matches('@');
            text.split('(').next().unwrap_or(text).trim().to_string()
        })
        .collect()
}

/// `*args` -> `...args`, `**kwargs` -> `...kwargs`.
fn splat_name(node: &Node, content: &str) -> String {
    let mut cursor = node.walk();
    let name = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "identifier")
        .map(|c| TreeSitterParser::node_text(&c, content).to_string());
    match name {
        Some(name) if matches!(node.kind(), "list_splat_pattern" | "dictionary_splat_pattern") => {
            variadic(&name)
        }
        Some(name) => name,
        None => String::new(),
    }
}

/// `Foo(...)` or `mod.Foo(...)` constructs a `Foo` by naming convention.
fn constructed_type(value: &Node, content: &str) -> Option<String> {
    if value.kind() != "call" {
        return None;
    }
    let func = TreeSitterParser::field_text(value, "function", content)?;
    last_segment(func)
        .starts_with(char::is_uppercase)
        .then(|| func.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> ParseResult {
        PythonAnalyzer::new().parse_file("app/service.py", src).unwrap()
    }

    const SERVICE: &str = r#"import os
import app.models as models
from .repo import UserRepository, helper as h
from ..util import *
from abc import ABC, abstractmethod


class BaseService(ABC):
    @abstractmethod
    def run(self): ...


class UserService(BaseService):
    MAX_RETRIES = 3

    def __init__(self, repo: UserRepository, *args, **kwargs):
        self.repo = repo
        self._cache = Cache()

    @staticmethod
    def create(name, *, strict=False):
        return UserService(UserRepository())

    def save(self, user):
        self.repo.save(user)
        h(lambda: hidden())
        local = UserRepository()
        local.flush(validate(user))

        def inner():
            nested()

    def _internal(self):
        pass


def main():
    service = UserService.create("x")
    service.save(None)
"#;

    #[test]
    fn test_python_classes() {
        let result = parse(SERVICE);

        let base = &result.classes[0];
        assert_eq!(base.name, "BaseService");
        assert!(base.modifiers.contains(&ClassModifier::Abstract));

        let service = &result.classes[1];
        assert_eq!(service.superclass.as_deref(), Some("BaseService"));
        assert_eq!(service.constructor_params, vec!["repo", "...args", "...kwargs"]);
        assert_eq!(service.methods, vec!["__init__", "create", "save", "_internal"]);

        let props: Vec<(&str, Option<&str>)> = service
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.type_name.as_deref()))
            .collect();
        assert_eq!(
            props,
            vec![
                ("MAX_RETRIES", None),
                ("repo", Some("UserRepository")),
                ("_cache", Some("Cache")),
            ]
        );
        assert!(service.properties[0].is_final);
        assert_eq!(service.properties[2].visibility, Visibility::Private);
    }

    #[test]
    fn test_python_functions() {
        let result = parse(SERVICE);
        let find = |name: &str| result.functions.iter().find(|f| f.name == name).unwrap();

        assert_eq!(find("__init__").kind, FunctionKind::Constructor);
        assert_eq!(find("__init__").visibility, Visibility::Public);
        assert_eq!(find("create").kind, FunctionKind::Static);
        assert_eq!(find("create").params, vec!["name", "strict"]);
        assert_eq!(find("_internal").visibility, Visibility::Private);
        assert_eq!(find("main").kind, FunctionKind::Free);
        assert!(result.functions.iter().all(|f| f.name != "inner"));

        let save = find("save");
        let names: Vec<&str> = save.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["save", "h", "UserRepository", "flush"]);
        assert_eq!(save.calls[0].receiver_type.as_deref(), Some("UserRepository"));
        assert_eq!(save.calls[3].receiver_type.as_deref(), Some("UserRepository"));
    }

    #[test]
    fn test_python_imports() {
        let result = parse(SERVICE);
        let sources: Vec<&str> = result.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["os", "app.models", ".repo", "..util", "abc"]);
        assert_eq!(result.imports[1].bindings[0].local, "models");
        assert_eq!(result.imports[2].bindings[1].local, "h");
        assert_eq!(result.imports[2].bindings[1].symbol.as_deref(), Some("helper"));
        assert!(result.imports[3].wildcard);
    }
}
