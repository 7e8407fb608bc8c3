//! Tree-sitter based parsing utilities shared across language analyzers.

use tree_sitter::{Language, Node, Parser as TSParser, Tree, TreeCursor};

/// Base tree-sitter grammar adapter.
pub struct TreeSitterParser {
    language: Language,
    language_name: &'static str,
}

impl TreeSitterParser {
    pub fn new(language: Language, language_name: &'static str) -> Self {
        Self {
            language,
            language_name,
        }
    }

    pub fn language_name(&self) -> &'static str {
        self.language_name
    }

    /// Parse source code into a tree-sitter tree.
    ///
    /// Tree-sitter recovers from most syntax errors; only a file whose root
    /// itself is an error node is rejected.
    pub fn parse_tree(&self, content: &str) -> Result<Tree, String> {
        let mut parser = TSParser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| format!("Failed to set {} language: {}", self.language_name, e))?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| "Failed to parse content".to_string())?;

        if tree.root_node().is_error() {
            return Err(format!("Unsupported {} syntax", self.language_name));
        }
        Ok(tree)
    }

    /// Get text for a node from source content.
    pub fn node_text<'a>(node: &Node, content: &'a str) -> &'a str {
        content.get(node.byte_range()).unwrap_or("")
    }

    /// Get line number (1-based) for a node.
    pub fn node_line(node: &Node) -> u32 {
        node.start_position().row as u32 + 1
    }

    /// Get end line number (1-based) for a node.
    pub fn node_end_line(node: &Node) -> u32 {
        node.end_position().row as u32 + 1
    }

    /// Text of a named field, if present.
    pub fn field_text<'a>(node: &Node, field: &str, content: &'a str) -> Option<&'a str> {
        node.child_by_field_name(field)
            .map(|n| Self::node_text(&n, content))
    }

    /// Find all children of a specific kind.
    pub fn children_of_kind<'t>(node: &Node<'t>, kind: &str) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .filter(|n| n.kind() == kind)
            .collect()
    }

    /// First child of one of the given kinds.
    pub fn child_of_kinds<'t>(node: &Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
        let mut cursor = node.walk();
        let found = node.children(&mut cursor).find(|n| kinds.contains(&n.kind()));
        found
    }

    /// Whether an anonymous keyword child (e.g. `static`, `async`) exists.
    pub fn has_keyword(node: &Node, keyword: &str) -> bool {
        let mut cursor = node.walk();
        let found = node.children(&mut cursor).any(|c| c.kind() == keyword);
        found
    }
}

/// Lazy preorder walk over a subtree.
///
/// Each call to [`Preorder::new`] restarts from the given root. Nodes for
/// which the prune predicate returns true are still yielded, but their
/// children are skipped.
pub struct Preorder<'tree, F>
where
    F: FnMut(&Node<'tree>) -> bool,
{
    cursor: TreeCursor<'tree>,
    prune: F,
    started: bool,
    finished: bool,
}

impl<'tree> Preorder<'tree, fn(&Node<'tree>) -> bool> {
    /// Walk every node below and including `root`.
    pub fn new(root: Node<'tree>) -> Self {
        let never: fn(&Node<'tree>) -> bool = |_| false;
        Preorder::with_prune(root, never)
    }
}

impl<'tree, F> Preorder<'tree, F>
where
    F: FnMut(&Node<'tree>) -> bool,
{
    /// Walk below `root`, not descending into nodes matching `prune`.
    pub fn with_prune(root: Node<'tree>, prune: F) -> Self {
        Self {
            cursor: root.walk(),
            prune,
            started: false,
            finished: false,
        }
    }
}

impl<'tree, F> Iterator for Preorder<'tree, F>
where
    F: FnMut(&Node<'tree>) -> bool,
{
    type Item = Node<'tree>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.cursor.node());
        }

        let current = self.cursor.node();
        if !(self.prune)(&current) && self.cursor.goto_first_child() {
            return Some(self.cursor.node());
        }

        loop {
            if self.cursor.goto_next_sibling() {
                return Some(self.cursor.node());
            }
            if !self.cursor.goto_parent() {
                self.finished = true;
                return None;
            }
        }
    }
}

/// True when `node` is the argument list of its parent call.
///
/// Calls found there are callbacks, not direct calls of the enclosing body.
pub fn is_call_arguments(node: &Node, call_kinds: &[&str]) -> bool {
    node.parent().is_some_and(|parent| {
        call_kinds.contains(&parent.kind())
            && parent
                .child_by_field_name("arguments")
                .is_some_and(|args| args.id() == node.id())
    })
}

/// Direct call nodes of a function body.
///
/// Argument lists of calls and nested scopes (closures, lambdas, local
/// functions, anonymous classes) are not entered. `body` itself is always
/// walked, even when it is of a scope kind.
pub fn direct_calls<'tree>(
    body: Node<'tree>,
    call_kinds: &'static [&'static str],
    scope_kinds: &'static [&'static str],
) -> impl Iterator<Item = Node<'tree>> {
    let root_id = body.id();
    Preorder::with_prune(body, move |n: &Node<'tree>| {
        n.id() != root_id && (scope_kinds.contains(&n.kind()) || is_call_arguments(n, call_kinds))
    })
    .filter(move |n| call_kinds.contains(&n.kind()))
}

/// Ancestors of `node`, nearest first.
pub fn ancestors<'tree>(node: Node<'tree>) -> impl Iterator<Item = Node<'tree>> {
    std::iter::successors(node.parent(), |n| n.parent())
}

/// Strip one layer of matching quotes from a string literal.
pub fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\'', '`'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// Marker used for variadic parameters in normalized parameter lists.
pub fn variadic(name: &str) -> String {
    format!("...{}", name.trim_start_matches("..."))
}

/// Markers for destructured parameters.
pub const OBJECT_PATTERN: &str = "{...}";
pub const ARRAY_PATTERN: &str = "[...]";

/// Last dotted segment of a name (`a.b.C` -> `C`).
pub fn last_segment(name: &str) -> &str {
    name.rsplit(['.', ':']).next().unwrap_or(name)
}

/// Count source lines the way editors do: a trailing newline does not start
/// a new line.
pub fn count_lines(content: &str) -> usize {
    content.lines().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn go_tree(src: &str) -> Tree {
        TreeSitterParser::new(tree_sitter_go::LANGUAGE.into(), "Go")
            .parse_tree(src)
            .unwrap()
    }

    #[test]
    fn test_preorder_visits_all_and_restarts() {
        let src = "package p\nfunc a() { b(c()) }\n";
        let tree = go_tree(src);
        let root = tree.root_node();

        let calls = Preorder::new(root)
            .filter(|n| n.kind() == "call_expression")
            .count();
        assert_eq!(calls, 2);

        let again = Preorder::new(root).count();
        assert_eq!(again, Preorder::new(root).count());
    }

    #[test]
    fn test_preorder_prunes_call_arguments() {
        let src = "package p\nfunc a() { b(c()) }\n";
        let tree = go_tree(src);
        let calls: Vec<String> =
            Preorder::with_prune(tree.root_node(), |n| {
                is_call_arguments(n, &["call_expression"])
            })
            .filter(|n| n.kind() == "call_expression")
            .map(|n| TreeSitterParser::field_text(&n, "function", src).unwrap_or("").to_string())
            .collect();
        assert_eq!(calls, vec!["b"]);
    }

    #[test]
    fn test_direct_calls_skip_closures() {
        let src = "package p\nfunc a() { b(); go func() { c() }(); d(e()) }\n";
        let tree = go_tree(src);
        let func = Preorder::new(tree.root_node())
            .find(|n| n.kind() == "function_declaration")
            .unwrap();
        let body = func.child_by_field_name("body").unwrap();
        let names: Vec<&str> = direct_calls(body, &["call_expression"], &["func_literal"])
            .filter_map(|n| TreeSitterParser::field_text(&n, "function", src))
            .collect();
        assert_eq!(names, vec!["b", "func() { c() }", "d"]);
    }

    #[test]
    fn test_helpers() {
        assert_eq!(unquote("\"fmt\""), "fmt");
        assert_eq!(unquote("'./utils'"), "./utils");
        assert_eq!(variadic("args"), "...args");
        assert_eq!(last_segment("com.acme.Service"), "Service");
        assert_eq!(count_lines("a\nb\n"), 2);
    }
}
