//! TypeScript and JavaScript analyzer using tree-sitter.
//!
//! Both languages form one module ecosystem, so a single analyzer owns every
//! extension and picks the grammar per file.

use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use super::result::ParseResult;
use super::traits::LanguageAnalyzer;
use super::treesitter::{
    ancestors, direct_calls, last_segment, unquote, variadic, Preorder, TreeSitterParser,
    ARRAY_PATTERN, OBJECT_PATTERN,
};
use crate::language::Language;
use crate::model::{
    CallSite, ClassKind, ClassModifier, ClassNode, FunctionKind, FunctionNode, ImportBinding,
    ImportRef, PropertyNode, Visibility,
};

const CALL_KINDS: &[&str] = &["call_expression", "new_expression"];
const SCOPE_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "function_declaration",
    "generator_function",
    "generator_function_declaration",
    "class",
    "class_declaration",
];
const CLASS_KINDS: &[&str] = &[
    "class_declaration",
    "abstract_class_declaration",
    "class",
    "interface_declaration",
    "enum_declaration",
];
const FUNCTION_VALUE_KINDS: &[&str] = &["arrow_function", "function_expression", "function"];
/// Nodes whose contents never declare module-level entities.
const BODY_KINDS: &[&str] = &[
    "statement_block",
    "arrow_function",
    "function_expression",
    "function",
];

/// TypeScript/JavaScript analyzer using tree-sitter.
pub struct TypeScriptAnalyzer {
    typescript: TreeSitterParser,
    tsx: TreeSitterParser,
    javascript: TreeSitterParser,
}

impl TypeScriptAnalyzer {
    pub fn new() -> Self {
        Self {
            typescript: TreeSitterParser::new(
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                "TypeScript",
            ),
            tsx: TreeSitterParser::new(tree_sitter_typescript::LANGUAGE_TSX.into(), "TSX"),
            javascript: TreeSitterParser::new(tree_sitter_javascript::LANGUAGE.into(), "JavaScript"),
        }
    }

    fn grammar_for(&self, path: &str) -> &TreeSitterParser {
        let ext = std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "ts" | "mts" | "cts" => &self.typescript,
            "tsx" => &self.tsx,
            _ => &self.javascript,
        }
    }

    fn extract_import(&self, node: &Node, content: &str, result: &mut ParseResult) {
        let Some(source) = TreeSitterParser::field_text(node, "source", content) else {
            // `import x = require("y")`
            if let Some(clause) = TreeSitterParser::child_of_kinds(node, &["import_require_clause"]) {
                if let Some(source) = TreeSitterParser::field_text(&clause, "source", content) {
                    let mut import = ImportRef::new(unquote(source));
                    if let Some(local) = TreeSitterParser::child_of_kinds(&clause, &["identifier"]) {
                        import = import.with_binding(ImportBinding::module(
                            TreeSitterParser::node_text(&local, content),
                        ));
                    }
                    result.add_import(import);
                }
            }
            return;
        };

        let mut import = ImportRef::new(unquote(source));
        if let Some(clause) = TreeSitterParser::child_of_kinds(node, &["import_clause"]) {
            let mut cursor = clause.walk();
            for part in clause.named_children(&mut cursor) {
                match part.kind() {
                    "identifier" => {
                        let local = TreeSitterParser::node_text(&part, content);
                        import = import.with_binding(ImportBinding::symbol(local, "default"));
                    }
                    "namespace_import" => {
                        if let Some(local) = TreeSitterParser::child_of_kinds(&part, &["identifier"]) {
                            import = import.with_binding(ImportBinding::module(
                                TreeSitterParser::node_text(&local, content),
                            ));
                        }
                    }
                    "named_imports" => {
                        for spec in TreeSitterParser::children_of_kind(&part, "import_specifier") {
                            let Some(name) = TreeSitterParser::field_text(&spec, "name", content)
                            else {
                                continue;
                            };
                            let local = TreeSitterParser::field_text(&spec, "alias", content)
                                .unwrap_or(name);
                            import = import.with_binding(ImportBinding::symbol(local, unquote(name)));
                        }
                    }
                    _ => {}
                }
            }
        }
        result.add_import(import);
    }

    /// `require("x")` and `import("x")` anywhere in the file.
    fn extract_dynamic_imports(&self, root: Node, content: &str, result: &mut ParseResult) {
        for call in Preorder::new(root).filter(|n| n.kind() == "call_expression") {
            let Some(func) = call.child_by_field_name("function") else {
                continue;
            };
            let is_require = func.kind() == "identifier"
                && TreeSitterParser::node_text(&func, content) == "require";
            if !is_require && func.kind() != "import" {
                continue;
            }
            let source = call
                .child_by_field_name("arguments")
                .and_then(|args| args.named_child(0))
                .filter(|arg| arg.kind() == "string");
            let Some(source) = source else {
                continue;
            };

            let mut import = ImportRef::new(unquote(TreeSitterParser::node_text(&source, content)));
            if is_require {
                import.bindings = require_bindings(&call, content);
            }
            result.add_import(import);
        }
    }

    fn extract_class(&self, node: &Node, content: &str, exported: bool) -> Option<ClassNode> {
        let name = TreeSitterParser::field_text(node, "name", content)
            .or_else(|| declarator_name(node, content))?;
        let kind = match node.kind() {
            "interface_declaration" => ClassKind::Interface,
            "enum_declaration" => ClassKind::Enum,
            _ => ClassKind::Class,
        };
        let visibility = if exported {
            Visibility::Public
        } else {
            Visibility::Private
        };

        let mut class = ClassNode::new(name, kind, visibility).with_lines(
            TreeSitterParser::node_line(node),
            TreeSitterParser::node_end_line(node),
        );
        if node.kind() == "abstract_class_declaration" {
            class.add_modifier(ClassModifier::Abstract);
        }

        if let Some(heritage) = TreeSitterParser::child_of_kinds(node, &["class_heritage"]) {
            match TreeSitterParser::child_of_kinds(&heritage, &["extends_clause"]) {
                Some(extends) => {
                    class.superclass = extends
                        .child_by_field_name("value")
                        .or_else(|| extends.named_child(0))
                        .map(|v| TreeSitterParser::node_text(&v, content).to_string());
                }
                // JavaScript: `class A extends B`
                None => {
                    class.superclass = heritage
                        .named_child(0)
                        .filter(|n| n.kind() != "implements_clause")
                        .map(|v| TreeSitterParser::node_text(&v, content).to_string());
                }
            }
            if let Some(implements) = TreeSitterParser::child_of_kinds(&heritage, &["implements_clause"]) {
                let mut cursor = implements.walk();
                for ty in implements.named_children(&mut cursor) {
                    class.interfaces.push(TreeSitterParser::node_text(&ty, content).to_string());
                }
            }
        }
        if let Some(extends) = TreeSitterParser::child_of_kinds(node, &["extends_type_clause"]) {
            let mut cursor = extends.walk();
            for ty in extends.named_children(&mut cursor) {
                class.interfaces.push(TreeSitterParser::node_text(&ty, content).to_string());
            }
        }

        if kind == ClassKind::Interface {
            if let Some(body) = node.child_by_field_name("body") {
                let mut cursor = body.walk();
                for member in body.named_children(&mut cursor) {
                    let Some(member_name) = TreeSitterParser::field_text(&member, "name", content)
                    else {
                        continue;
                    };
                    match member.kind() {
                        "method_signature" => class.add_method(member_name),
                        "property_signature" => class.properties.push(
                            PropertyNode::new(member_name, Visibility::Public)
                                .with_type(type_annotation(&member, content)),
                        ),
                        _ => {}
                    }
                }
            }
        }

        Some(class)
    }

    fn extract_field(&self, node: &Node, content: &str) -> Option<PropertyNode> {
        let name_node = node
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("property"))?;
        let name = TreeSitterParser::node_text(&name_node, content);
        let visibility = member_visibility(node, &name_node, content);

        let mut property = PropertyNode::new(name, visibility).with_type(
            type_annotation(node, content).or_else(|| {
                node.child_by_field_name("value")
                    .and_then(|v| new_type(&v, content))
            }),
        );
        property.is_static = TreeSitterParser::has_keyword(node, "static");
        property.is_final = TreeSitterParser::has_keyword(node, "readonly");
        property.has_default = node.child_by_field_name("value").is_some();
        Some(property)
    }

    fn extract_method(
        &self,
        node: &Node,
        content: &str,
        class_name: &str,
    ) -> Option<(FunctionNode, Vec<PropertyNode>)> {
        let name_node = node.child_by_field_name("name")?;
        let name = TreeSitterParser::node_text(&name_node, content);
        let kind = if name == "constructor" {
            FunctionKind::Constructor
        } else if TreeSitterParser::has_keyword(node, "static") {
            FunctionKind::Static
        } else {
            FunctionKind::Instance
        };

        let mut locals = HashMap::new();
        let mut parameter_properties = Vec::new();
        let params = node
            .child_by_field_name("parameters")
            .map(|p| {
                self.extract_parameters(&p, content, &mut locals, Some(&mut parameter_properties))
            })
            .unwrap_or_default();

        let mut function = FunctionNode::new(name, kind, member_visibility(node, &name_node, content))
            .with_class(Some(class_name))
            .with_lines(
                TreeSitterParser::node_line(node),
                TreeSitterParser::node_end_line(node),
            )
            .with_params(params);
        if let Some(body) = node.child_by_field_name("body") {
            function.calls = self.extract_calls(&body, content, &mut locals);
        }
        Some((function, parameter_properties))
    }

    /// A `function` declaration or a function value bound to a module-level
    /// variable (`const f = () => ...`), or a class field holding one.
    fn extract_function(
        &self,
        name: &str,
        decl: &Node,
        func: &Node,
        content: &str,
        visibility: Visibility,
        class_name: Option<&str>,
    ) -> FunctionNode {
        let kind = match class_name {
            Some(_) if TreeSitterParser::has_keyword(decl, "static") => FunctionKind::Static,
            Some(_) => FunctionKind::Instance,
            None => FunctionKind::Free,
        };

        let mut locals = HashMap::new();
        let params = match func.child_by_field_name("parameters") {
            Some(p) => self.extract_parameters(&p, content, &mut locals, None),
            None => func
                .child_by_field_name("parameter")
                .map(|p| vec![TreeSitterParser::node_text(&p, content).to_string()])
                .unwrap_or_default(),
        };

        let mut function = FunctionNode::new(name, kind, visibility)
            .with_class(class_name)
            .with_lines(
                TreeSitterParser::node_line(decl),
                TreeSitterParser::node_end_line(decl),
            )
            .with_params(params);
        if let Some(body) = func.child_by_field_name("body") {
            function.calls = self.extract_calls(&body, content, &mut locals);
        }
        function
    }

    fn extract_parameters(
        &self,
        params: &Node,
        content: &str,
        locals: &mut HashMap<String, String>,
        mut properties: Option<&mut Vec<PropertyNode>>,
    ) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            let pattern = match param.kind() {
                "required_parameter" | "optional_parameter" => {
                    match param.child_by_field_name("pattern") {
                        Some(p) => p,
                        None => continue,
                    }
                }
                "assignment_pattern" => match param.child_by_field_name("left") {
                    Some(p) => p,
                    None => continue,
                },
                "comment" => continue,
                _ => param,
            };
            let Some(name) = pattern_name(&pattern, content) else {
                continue;
            };
            if name == "this" {
                continue;
            }

            if let Some(ty) = type_annotation(&param, content) {
                locals.insert(name.clone(), ty);
            }

            // `constructor(private readonly repo: Repo)`
            if let Some(modifier) = TreeSitterParser::child_of_kinds(&param, &["accessibility_modifier"]) {
                if let Some(properties) = properties.as_deref_mut() {
                    let visibility = match TreeSitterParser::node_text(&modifier, content) {
                        "private" => Visibility::Private,
                        "protected" => Visibility::Protected,
                        _ => Visibility::Public,
                    };
                    let mut property = PropertyNode::new(name.as_str(), visibility)
                        .with_type(locals.get(&name).cloned());
                    property.is_final = TreeSitterParser::has_keyword(&param, "readonly");
                    properties.push(property);
                }
            }
            names.push(name);
        }
        names
    }

    fn extract_calls(
        &self,
        body: &Node,
        content: &str,
        locals: &mut HashMap<String, String>,
    ) -> Vec<CallSite> {
        let prune = |n: &Node| SCOPE_KINDS.contains(&n.kind());
        for decl in Preorder::with_prune(*body, prune).filter(|n| n.kind() == "variable_declarator") {
            let Some(name) = TreeSitterParser::field_text(&decl, "name", content) else {
                continue;
            };
            let ty = type_annotation(&decl, content).or_else(|| {
                decl.child_by_field_name("value")
                    .and_then(|v| new_type(&v, content))
            });
            if let Some(ty) = ty {
                locals.insert(name.to_string(), ty);
            }
        }

        let mut calls = Vec::new();
        for call in direct_calls(*body, CALL_KINDS, SCOPE_KINDS) {
            if call.kind() == "new_expression" {
                if let Some(ty) = new_type(&call, content) {
                    calls.push(CallSite::new(last_segment(&ty)));
                }
                continue;
            }

            let Some(func) = call.child_by_field_name("function") else {
                continue;
            };
            match func.kind() {
                "identifier" => {
                    let name = TreeSitterParser::node_text(&func, content);
                    if name != "require" {
                        calls.push(CallSite::new(name));
                    }
                }
                "member_expression" => {
                    let Some(name) = TreeSitterParser::field_text(&func, "property", content) else {
                        continue;
                    };
                    let receiver =
                        TreeSitterParser::field_text(&func, "object", content).map(str::to_string);
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

impl Default for TypeScriptAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for TypeScriptAnalyzer {
    fn parse_file(&self, path: &str, content: &str) -> Result<ParseResult, String> {
        let tree = self.grammar_for(path).parse_tree(content)?;
        let root = tree.root_node();
        let mut result = ParseResult::new(path);
        let mut class_slots: HashMap<usize, usize> = HashMap::new();
        let mut export_names: HashSet<String> = HashSet::new();

        for node in Preorder::with_prune(root, |n| BODY_KINDS.contains(&n.kind())) {
            match node.kind() {
                "import_statement" => self.extract_import(&node, content, &mut result),
                "export_statement" => {
                    if let Some(source) = TreeSitterParser::field_text(&node, "source", content) {
                        result.add_import(ImportRef::new(unquote(source)));
                    } else if let Some(clause) = TreeSitterParser::child_of_kinds(&node, &["export_clause"]) {
                        for spec in TreeSitterParser::children_of_kind(&clause, "export_specifier") {
                            if let Some(name) = TreeSitterParser::field_text(&spec, "name", content) {
                                export_names.insert(name.to_string());
                            }
                        }
                    }
                }
                kind if CLASS_KINDS.contains(&kind) => {
                    if let Some(class) = self.extract_class(&node, content, is_exported(&node)) {
                        class_slots.insert(node.id(), result.classes.len());
                        result.add_class(class);
                    }
                }
                "public_field_definition" | "field_definition" => {
                    let Some(slot) = owner_slot(&node, &class_slots) else {
                        continue;
                    };
                    let value = node
                        .child_by_field_name("value")
                        .filter(|v| FUNCTION_VALUE_KINDS.contains(&v.kind()));
                    if let Some(value) = value {
                        let name_node = node
                            .child_by_field_name("name")
                            .or_else(|| node.child_by_field_name("property"));
                        if let Some(name_node) = name_node {
                            let name = TreeSitterParser::node_text(&name_node, content);
                            let class_name = result.classes[slot].name.clone();
                            let visibility = member_visibility(&node, &name_node, content);
                            let function = self.extract_function(
                                name,
                                &node,
                                &value,
                                content,
                                visibility,
                                Some(&class_name),
                            );
                            result.classes[slot].add_method(name);
                            result.add_function(function);
                        }
                    } else if let Some(property) = self.extract_field(&node, content) {
                        result.classes[slot].properties.push(property);
                    }
                }
                "method_definition" | "abstract_method_signature" => {
                    let Some(slot) = owner_slot(&node, &class_slots) else {
                        continue;
                    };
                    let class_name = result.classes[slot].name.clone();
                    if let Some((function, properties)) = self.extract_method(&node, content, &class_name) {
                        let class = &mut result.classes[slot];
                        if function.kind == FunctionKind::Constructor {
                            class.constructor_params = function.params.clone();
                            class.properties.extend(properties);
                        } else {
                            class.add_method(&function.name);
                        }
                        result.add_function(function);
                    }
                }
                "function_declaration" | "generator_function_declaration" => {
                    let Some(name) = TreeSitterParser::field_text(&node, "name", content) else {
                        continue;
                    };
                    let visibility = export_visibility(&node);
                    let function = self.extract_function(name, &node, &node, content, visibility, None);
                    result.add_function(function);
                }
                "variable_declarator" => {
                    let Some(value) = node
                        .child_by_field_name("value")
                        .filter(|v| FUNCTION_VALUE_KINDS.contains(&v.kind()))
                    else {
                        continue;
                    };
                    let Some(name) = TreeSitterParser::field_text(&node, "name", content) else {
                        continue;
                    };
                    let visibility = node
                        .parent()
                        .map(|decl| export_visibility(&decl))
                        .unwrap_or(Visibility::Private);
                    let function = self.extract_function(name, &node, &value, content, visibility, None);
                    result.add_function(function);
                }
                _ => {}
            }
        }

        for function in result.functions.iter_mut().filter(|f| f.class_name.is_none()) {
            if export_names.contains(&function.name) {
                function.visibility = Visibility::Public;
            }
        }
        for class in &mut result.classes {
            if export_names.contains(&class.name) {
                class.visibility = Visibility::Public;
            }
        }

        self.extract_dynamic_imports(root, content, &mut result);
        result.type_member_receivers(&["this"], false);
        Ok(result)
    }

    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["ts", "tsx", "js", "jsx", "mjs", "cjs"]
    }
}

fn is_exported(node: &Node) -> bool {
    node.parent().is_some_and(|p| p.kind() == "export_statement")
}

fn export_visibility(node: &Node) -> Visibility {
    if is_exported(node) {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

fn owner_slot(node: &Node, slots: &HashMap<usize, usize>) -> Option<usize> {
    ancestors(*node)
        .find(|a| CLASS_KINDS.contains(&a.kind()))
        .and_then(|a| slots.get(&a.id()).copied())
}

/// Class members are public unless marked `private`/`protected` or `#named`.
fn member_visibility(node: &Node, name_node: &Node, content: &str) -> Visibility {
    if name_node.kind() == "private_property_identifier" {
        return Visibility::Private;
    }
    match TreeSitterParser::child_of_kinds(node, &["accessibility_modifier"])
        .map(|m| TreeSitterParser::node_text(&m, content))
    {
        Some("private") => Visibility::Private,
        Some("protected") => Visibility::Protected,
        _ => Visibility::Public,
    }
}

/// Name of `const Foo = class { ... }`.
fn declarator_name<'a>(node: &Node, content: &'a str) -> Option<&'a str> {
    node.parent()
        .filter(|p| p.kind() == "variable_declarator")
        .and_then(|p| TreeSitterParser::field_text(&p, "name", content))
}

fn type_annotation(node: &Node, content: &str) -> Option<String> {
    let annotation = node.child_by_field_name("type")?;
    let text = TreeSitterParser::node_text(&annotation, content);
    Some(text.trim_start_matches(':').trim().to_string())
}

/// Type constructed by a `new` expression.
fn new_type(node: &Node, content: &str) -> Option<String> {
    if node.kind() != "new_expression" {
        return None;
    }
    TreeSitterParser::field_text(node, "constructor", content).map(str::to_string)
}

fn pattern_name(pattern: &Node, content: &str) -> Option<String> {
    match pattern.kind() {
        "identifier" | "this" => Some(TreeSitterParser::node_text(pattern, content).to_string()),
        "object_pattern" => Some(OBJECT_PATTERN.to_string()),
        "array_pattern" => Some(ARRAY_PATTERN.to_string()),
        "rest_pattern" => {
            let inner = pattern.named_child(0)?;
            Some(variadic(&pattern_name(&inner, content)?))
        }
        "assignment_pattern" => pattern_name(&pattern.child_by_field_name("left")?, content),
        _ => None,
    }
}

/// Names a `require` call binds through its enclosing declarator.
fn require_bindings(call: &Node, content: &str) -> Vec<ImportBinding> {
    let Some(declarator) = call.parent().filter(|p| p.kind() == "variable_declarator") else {
        return Vec::new();
    };
    let Some(name) = declarator.child_by_field_name("name") else {
        return Vec::new();
    };
    match name.kind() {
        "identifier" => vec![ImportBinding::module(TreeSitterParser::node_text(&name, content))],
        "object_pattern" => {
            let mut cursor = name.walk();
            let bindings = name
                .named_children(&mut cursor)
                .filter_map(|prop| match prop.kind() {
                    "shorthand_property_identifier_pattern" => {
                        let local = TreeSitterParser::node_text(&prop, content);
                        Some(ImportBinding::symbol(local, local))
                    }
                    "pair_pattern" => {
                        let key = TreeSitterParser::field_text(&prop, "key", content)?;
                        let value = TreeSitterParser::field_text(&prop, "value", content)?;
                        Some(ImportBinding::symbol(value, key))
                    }
                    _ => None,
                })
                .collect();
            bindings
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, src: &str) -> ParseResult {
        TypeScriptAnalyzer::new().parse_file(path, src).unwrap()
    }

    const SERVICE: &str = r#"import { helper, format as fmt } from "./utils";
import * as path from "path";
import React from "react";
export { Shared } from "./shared";

export interface Repo {
  save(user: User): void;
  name: string;
}

export abstract class UserService extends BaseService implements Closeable {
  private cache = new Map<string, User>();
  static instances: number = 0;
  #secret = 1;

  constructor(private readonly repo: Repo, public name: string) {
    super();
  }

  async save(user: User, ...rest: User[]): Promise<void> {
    this.repo.save(helper(user));
    users.forEach((u) => notify(u));
    const logger = new Logger();
    logger.info(fmt(user));
    path.join("a", "b");
  }

  protected static create({ id }: Options, [first]: string[]) {
    return new UserService(null, "x");
  }

  handle = (event: Event) => {
    this.save(event.user);
  };
}

function internal(a, b = 1) {
  internal(a);
}

export const run = async (input) => {
  internal(input);
};
"#;

    #[test]
    fn test_ts_classes_and_visibility() {
        let result = parse("src/service.ts", SERVICE);

        let repo = result.classes.iter().find(|c| c.name == "Repo").unwrap();
        assert_eq!(repo.kind, ClassKind::Interface);
        assert_eq!(repo.visibility, Visibility::Public);
        assert_eq!(repo.methods, vec!["save"]);

        let service = result.classes.iter().find(|c| c.name == "UserService").unwrap();
        assert_eq!(service.visibility, Visibility::Public);
        assert_eq!(service.modifiers, vec![ClassModifier::Abstract]);
        assert_eq!(service.superclass.as_deref(), Some("BaseService"));
        assert_eq!(service.interfaces, vec!["Closeable"]);
        assert_eq!(service.constructor_params, vec!["repo", "name"]);
        assert_eq!(service.methods, vec!["save", "create", "handle"]);

        let props: Vec<(&str, Visibility)> = service
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.visibility))
            .collect();
        assert_eq!(
            props,
            vec![
                ("cache", Visibility::Private),
                ("instances", Visibility::Public),
                ("#secret", Visibility::Private),
                ("repo", Visibility::Private),
                ("name", Visibility::Public),
            ]
        );
        assert!(service.properties[1].is_static);
        assert!(service.properties[3].is_final);
    }

    #[test]
    fn test_ts_functions_and_params() {
        let result = parse("src/service.ts", SERVICE);
        let find = |name: &str| result.functions.iter().find(|f| f.name == name).unwrap();

        assert_eq!(find("save").params, vec!["user", "...rest"]);
        assert_eq!(find("create").params, vec!["{...}", "[...]"]);
        assert_eq!(find("create").kind, FunctionKind::Static);
        assert_eq!(find("create").visibility, Visibility::Protected);
        assert_eq!(find("constructor").kind, FunctionKind::Constructor);
        assert_eq!(find("internal").visibility, Visibility::Private);
        assert_eq!(find("internal").params, vec!["a", "b"]);
        assert_eq!(find("run").visibility, Visibility::Public);
        assert_eq!(find("run").kind, FunctionKind::Free);
        assert_eq!(find("handle").class_name.as_deref(), Some("UserService"));
    }

    #[test]
    fn test_ts_direct_calls() {
        let result = parse("src/service.ts", SERVICE);
        let save = result.functions.iter().find(|f| f.name == "save").unwrap();
        let names: Vec<&str> = save.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["save", "forEach", "Logger", "info", "join"]);
        assert_eq!(save.calls[0].receiver_type.as_deref(), Some("Repo"));
        assert_eq!(save.calls[3].receiver_type.as_deref(), Some("Logger"));
        assert_eq!(save.calls[4].receiver.as_deref(), Some("path"));
    }

    #[test]
    fn test_ts_imports() {
        let result = parse("src/service.ts", SERVICE);
        let sources: Vec<&str> = result.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["./utils", "path", "react", "./shared"]);
        assert_eq!(result.imports[0].bindings[1].local, "fmt");
        assert_eq!(result.imports[0].bindings[1].symbol.as_deref(), Some("format"));
        assert_eq!(result.imports[1].bindings[0].symbol, None);
        assert_eq!(result.imports[2].bindings[0].symbol.as_deref(), Some("default"));
    }

    #[test]
    fn test_js_require_and_exports() {
        let src = r#"const fs = require("fs");
const { helper, other: alias } = require("./lib/helpers");

function main() {
  const mod = import("./lazy");
  helper();
}

class Widget {
  render() { return alias(); }
}

module.exports = { main };
export { Widget };
"#;
        let result = parse("index.js", src);
        let sources: Vec<&str> = result.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["fs", "./lib/helpers", "./lazy"]);
        assert_eq!(result.imports[0].bindings[0].local, "fs");
        assert_eq!(result.imports[1].bindings[1].local, "alias");
        assert_eq!(result.imports[1].bindings[1].symbol.as_deref(), Some("other"));

        let widget = &result.classes[0];
        assert_eq!(widget.visibility, Visibility::Public);
        let main = result.functions.iter().find(|f| f.name == "main").unwrap();
        assert_eq!(main.calls.len(), 1);
        assert_eq!(main.calls[0].name, "helper");
    }
}
