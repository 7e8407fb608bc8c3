//! Parse result types containing extracted entities.

use std::collections::HashMap;

use crate::model::{ClassNode, FunctionNode, ImportRef};

/// Result of parsing a source file.
///
/// Calls and imports are still unresolved; the resolver fills in their
/// paths once the language's reference index exists.
#[derive(Debug, Default, Clone)]
pub struct ParseResult {
    /// File path that was parsed.
    pub file_path: String,

    /// Package, namespace or module the file declares (first one wins for
    /// files declaring several).
    pub namespace: Option<String>,

    pub imports: Vec<ImportRef>,

    pub classes: Vec<ClassNode>,

    pub functions: Vec<FunctionNode>,

    /// Parse warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

impl ParseResult {
    /// Create a new parse result for the given file.
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    pub fn add_import(&mut self, import: ImportRef) {
        self.imports.push(import);
    }

    pub fn add_class(&mut self, class: ClassNode) {
        self.classes.push(class);
    }

    pub fn add_function(&mut self, function: FunctionNode) {
        self.functions.push(function);
    }

    /// Add a parse warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Find a class by simple name, for attaching methods declared apart
    /// from their type (Go receivers).
    pub fn class_mut(&mut self, name: &str) -> Option<&mut ClassNode> {
        self.classes.iter_mut().find(|c| c.name == name)
    }

    /// Give calls on a class member the member's declared type.
    ///
    /// `this.repo.save()` becomes a call on the type of `repo` when the
    /// enclosing class declares it. With `implicit_members`, a bare `repo`
    /// receiver that is not already typed counts as a member too.
    pub fn type_member_receivers(&mut self, self_names: &[&str], implicit_members: bool) {
        let members: HashMap<(&str, &str), &str> = self
            .classes
            .iter()
            .flat_map(|c| {
                c.properties.iter().filter_map(move |p| {
                    p.type_name
                        .as_deref()
                        .map(|t| ((c.name.as_str(), p.name.as_str()), t))
                })
            })
            .collect();
        if members.is_empty() {
            return;
        }

        let mut typed = Vec::new();
        for (fi, function) in self.functions.iter().enumerate() {
            let Some(class) = function.class_name.as_deref() else {
                continue;
            };
            for (ci, call) in function.calls.iter().enumerate() {
                if call.receiver_type.is_some() {
                    continue;
                }
                let Some(receiver) = call.receiver.as_deref() else {
                    continue;
                };
                let member = self_names
                    .iter()
                    .find_map(|s| receiver.strip_prefix(s).and_then(|r| r.strip_prefix('.')))
                    .or(implicit_members.then_some(receiver));
                if let Some(ty) = member.and_then(|m| members.get(&(class, m))) {
                    typed.push((fi, ci, ty.to_string()));
                }
            }
        }

        for (fi, ci, ty) in typed {
            self.functions[fi].calls[ci].receiver_type = Some(ty);
        }
    }

    /// Get statistics about the parse result.
    pub fn stats(&self) -> ParseStats {
        ParseStats {
            classes: self.classes.len(),
            functions: self.functions.len(),
            calls: self.functions.iter().map(|f| f.calls.len()).sum(),
            imports: self.imports.len(),
            warnings: self.warnings.len(),
        }
    }
}

/// Statistics about a parse result.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParseStats {
    pub classes: usize,
    pub functions: usize,
    pub calls: usize,
    pub imports: usize,
    pub warnings: usize,
}

impl std::fmt::Display for ParseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} classes, {} functions, {} calls, {} imports",
            self.classes, self.functions, self.calls, self.imports
        )?;
        if self.warnings > 0 {
            write!(f, ", {} warnings", self.warnings)?;
        }
        Ok(())
    }
}
