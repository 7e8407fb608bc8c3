//! Apex analyzer.
//!
//! There is no Apex grammar; Apex is close enough to Java that its source can
//! be masked into Java-shaped text and parsed with the Java grammar. Masking
//! never changes byte offsets or line breaks, so node positions stay valid
//! for the original text.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::java::{Dialect, JavaWalker};
use super::result::ParseResult;
use super::traits::LanguageAnalyzer;
use super::treesitter::TreeSitterParser;
use crate::language::Language;
use crate::model::{ClassKind, ClassNode, FunctionKind, FunctionNode, Visibility};

/// Apex keywords that Java spells the same way, modulo case.
const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "break", "catch", "class", "continue", "do", "else", "enum", "extends", "false",
    "final", "finally", "for", "if", "implements", "instanceof", "interface", "new", "null",
    "private", "protected", "public", "return", "static", "super", "this", "throw", "transient",
    "true", "try", "void", "while",
];

/// Same-length stand-ins for Apex-only modifiers.
const SWAPS: &[(&str, &str)] = &[
    ("global", "public"),
    ("virtual", "default"),
    ("override", "strictfp"),
];

/// Apex-only modifiers with no Java counterpart.
const BLANKED: &[&str] = &["testmethod", "webservice"];

static SHARING: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(with|without|inherited)\s+sharing\b").ok());

static TRIGGER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\btrigger\s+(\w+)\s+on\s+(\w+)\s*\([^)]*\)").ok());

static ACCESSOR: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^\{\s*((public|private|protected|global)\s+)?(get|set)\s*[;{]").ok()
});

/// Apex analyzer on top of the Java grammar.
pub struct ApexAnalyzer {
    base: TreeSitterParser,
}

impl ApexAnalyzer {
    pub fn new() -> Self {
        Self {
            base: TreeSitterParser::new(tree_sitter_java::LANGUAGE.into(), "Apex"),
        }
    }

    fn extract_trigger(
        &self,
        header: &TriggerHeader,
        tree: &tree_sitter::Tree,
        walker: &JavaWalker,
        result: &mut ParseResult,
    ) {
        let root = tree.root_node();
        let mut cursor = root.walk();
        let body = root
            .named_children(&mut cursor)
            .find(|n| n.kind() == "block" && n.start_byte() >= header.end);

        let end_line = body
            .map(|b| TreeSitterParser::node_end_line(&b))
            .unwrap_or(header.line);

        let mut class = ClassNode::new(&header.name, ClassKind::Trigger, Visibility::Public)
            .with_lines(header.line, end_line);
        class.interfaces.push(header.sobject.clone());
        class.add_method(&header.name);

        let mut function =
            FunctionNode::new(&header.name, FunctionKind::Instance, Visibility::Public)
                .with_class(Some(&header.name))
                .with_lines(header.line, end_line);
        if let Some(body) = body {
            let mut locals = HashMap::new();
            function.calls = walker.body_calls(&body, &mut locals);
        }

        result.add_class(class);
        result.add_function(function);
    }
}

impl Default for ApexAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for ApexAnalyzer {
    fn parse_file(&self, path: &str, content: &str) -> Result<ParseResult, String> {
        let (masked, trigger) = mask_apex(content);
        let tree = self.base.parse_tree(&masked)?;
        let mut result = ParseResult::new(path);

        let walker = JavaWalker {
            dialect: Dialect::Apex,
            content: &masked,
            original: content,
        };
        if let Some(header) = &trigger {
            self.extract_trigger(header, &tree, &walker, &mut result);
        }
        walker.walk(&tree, &mut result);

        Ok(result)
    }

    fn language(&self) -> Language {
        Language::Apex
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["cls", "trigger"]
    }
}

/// `trigger Name on SObject (events)`, located in the original text.
#[derive(Debug, Clone, PartialEq)]
struct TriggerHeader {
    name: String,
    sobject: String,
    line: u32,
    start: usize,
    /// Byte offset just past the header.
    end: usize,
}

/// Rewrite Apex source into Java-parsable text of identical byte layout.
fn mask_apex(content: &str) -> (String, Option<TriggerHeader>) {
    let mut bytes = content.as_bytes().to_vec();
    let code = code_spans(content, &mut bytes);

    // Keywords: lowercase the Java ones, swap or blank the Apex-only ones.
    for (start, end) in &code {
        let mut i = *start;
        while i < *end {
            if !is_word_byte(bytes[i]) || (i > 0 && is_word_byte(bytes[i - 1])) {
                i += 1;
                continue;
            }
            let mut j = i;
            while j < *end && is_word_byte(bytes[j]) {
                j += 1;
            }
            let word = content[i..j].to_ascii_lowercase();
            let after_dot = bytes[..i]
                .iter()
                .rev()
                .find(|b| !b.is_ascii_whitespace())
                .is_some_and(|b| *b == b'.');
            if after_dot {
                // `Trigger.new` is a member, not the keyword.
                if JAVA_KEYWORDS.contains(&word.as_str()) {
                    bytes[i] = bytes[i].to_ascii_uppercase();
                }
            } else if let Some((_, java)) = SWAPS.iter().find(|(apex, _)| *apex == word) {
                bytes[i..j].copy_from_slice(java.as_bytes());
            } else if BLANKED.contains(&word.as_str()) {
                blank(&mut bytes, i, j);
            } else if JAVA_KEYWORDS.contains(&word.as_str()) {
                bytes[i..j].copy_from_slice(word.as_bytes());
            }
            i = j;
        }
    }

    let mut masked = String::from_utf8_lossy(&bytes).into_owned();
    let in_code = |pos: usize| code.iter().any(|(s, e)| pos >= *s && pos < *e);

    let sharing: Vec<(usize, usize)> = SHARING
        .as_ref()
        .map(|re| {
            re.find_iter(&masked)
                .filter(|m| in_code(m.start()))
                .map(|m| (m.start(), m.end()))
                .collect()
        })
        .unwrap_or_default();
    let mut bytes = masked.into_bytes();
    for (start, end) in sharing {
        blank(&mut bytes, start, end);
    }
    masked = String::from_utf8_lossy(&bytes).into_owned();

    let trigger = TRIGGER
        .as_ref()
        .and_then(|re| re.captures(&masked))
        .filter(|caps| caps.get(0).is_some_and(|m| in_code(m.start())))
        .and_then(|caps| {
            let whole = caps.get(0)?;
            Some(TriggerHeader {
                name: caps.get(1)?.as_str().to_string(),
                sobject: caps.get(2)?.as_str().to_string(),
                line: content[..whole.start()].matches('\n').count() as u32 + 1,
                start: whole.start(),
                end: whole.end(),
            })
        });

    let mut bytes = masked.into_bytes();
    if let Some(header) = &trigger {
        blank(&mut bytes, header.start, header.end);
    }
    mask_accessors(&mut bytes, &code);

    (String::from_utf8_lossy(&bytes).into_owned(), trigger)
}

/// Turn `'strings'` into `"strings"` and inline `[SELECT ...]` /
/// `[FIND ...]` queries into `null`, returning the byte ranges that are
/// plain code (outside comments and strings).
fn code_spans(content: &str, bytes: &mut [u8]) -> Vec<(usize, usize)> {
    let src = content.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < src.len() {
        match src[i] {
            b'/' if src.get(i + 1) == Some(&b'/') => {
                spans.push((start, i));
                while i < src.len() && src[i] != b'\n' {
                    i += 1;
                }
                start = i;
            }
            b'/' if src.get(i + 1) == Some(&b'*') => {
                spans.push((start, i));
                i += 2;
                while i < src.len() && !(src[i] == b'*' && src.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i = (i + 2).min(src.len());
                start = i;
            }
            b'\'' => {
                spans.push((start, i));
                bytes[i] = b'"';
                i += 1;
                while i < src.len() && src[i] != b'\'' && src[i] != b'\n' {
                    if src[i] == b'\\' {
                        i += 1;
                    } else if src[i] == b'"' {
                        bytes[i] = b'\'';
                    }
                    i += 1;
                }
                if i < src.len() && src[i] == b'\'' {
                    bytes[i] = b'"';
                }
                i += 1;
                start = i.min(src.len());
            }
            b'[' if starts_query(&src[i + 1..]) => {
                let end = matching_bracket(src, i);
                spans.push((start, i));
                blank(bytes, i, end);
                bytes[i..i + 4].copy_from_slice(b"null");
                spans.push((i, i + 4));
                i = end;
                start = i;
            }
            _ => i += 1,
        }
    }
    spans.push((start, src.len()));
    spans.retain(|(s, e)| s < e);
    spans
}

fn starts_query(rest: &[u8]) -> bool {
    let trimmed: Vec<u8> = rest
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take(7)
        .map(|b| b.to_ascii_lowercase())
        .collect();
    let word_end = |n: usize| trimmed.get(n).map_or(true, |b| !is_word_byte(*b));
    (trimmed.starts_with(b"select") && word_end(6)) || (trimmed.starts_with(b"find") && word_end(4))
}

/// Offset just past the `]` closing the bracket at `open`.
fn matching_bracket(src: &[u8], open: usize) -> usize {
    let mut depth = 0;
    let mut i = open;
    while i < src.len() {
        match src[i] {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            b'\'' => {
                i += 1;
                while i < src.len() && src[i] != b'\'' {
                    if src[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    src.len()
}

/// `{ get; set; }` and accessor blocks become a field terminator.
fn mask_accessors(bytes: &mut [u8], code: &[(usize, usize)]) {
    let mut i = 0;
    while i < bytes.len() {
        let in_code = code.iter().any(|(s, e)| i >= *s && i < *e);
        if bytes[i] != b'{' || !in_code {
            i += 1;
            continue;
        }
        let window_end = (i + 64).min(bytes.len());
        let window = String::from_utf8_lossy(&bytes[i..window_end]).into_owned();
        if !ACCESSOR.as_ref().is_some_and(|re| re.is_match(&window)) {
            i += 1;
            continue;
        }

        let mut depth = 0;
        let mut end = i;
        while end < bytes.len() {
            match bytes[end] {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        end += 1;
                        break;
                    }
                }
                _ => {}
            }
            end += 1;
        }
        blank(bytes, i, end);
        bytes[i] = b';';
        i = end;
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Overwrite with spaces, keeping line breaks.
fn blank(bytes: &mut [u8], start: usize, end: usize) {
    let stop = end.min(bytes.len());
    for b in &mut bytes[start..stop] {
        if *b != b'\n' && *b != b'\r' {
            *b = b' ';
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, src: &str) -> ParseResult {
        ApexAnalyzer::new().parse_file(path, src).unwrap()
    }

    #[test]
    fn test_masking_keeps_layout() {
        let src = "global with sharing class A {\n  String q = 'it\\'s';\n  List<Account> a = [SELECT Id\n FROM Account];\n}\n";
        let (masked, trigger) = mask_apex(src);
        assert!(trigger.is_none());
        assert_eq!(masked.len(), src.len());
        assert_eq!(masked.matches('\n').count(), src.matches('\n').count());
        assert!(masked.starts_with("public "));
        assert_eq!(masked.find("class A {"), src.find("class A {"));
        assert!(masked.contains("String q = \"it\\'s\";"));
        assert!(masked.contains("a = null"));
        assert!(!masked.contains("SELECT"));
    }

    #[test]
    fn test_apex_class() {
        let src = r#"public with sharing class AccountService extends BaseService {
    private AccountRepository repo = new AccountRepository();
    public String Name { get; set; }
    Integer count;

    public static List<Account> load(Id accountId) {
        List<Account> accounts = [SELECT Id, Name FROM Account WHERE Id = :accountId];
        return accounts;
    }

    global virtual void sync() {
        repo.upsertAll(load(null));
        Logger.log('done');
    }

    public class Result {
        public Boolean ok { get; private set; }
    }
}
"#;
        let result = parse("force-app/main/default/classes/AccountService.cls", src);
        let service = &result.classes[0];
        assert_eq!(service.name, "AccountService");
        assert_eq!(service.qualified_name, "AccountService");
        assert_eq!(service.visibility, Visibility::Public);
        assert_eq!(service.superclass.as_deref(), Some("BaseService"));
        assert_eq!(service.methods, vec!["load", "sync"]);

        let props: Vec<(&str, Visibility)> = service
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.visibility))
            .collect();
        assert_eq!(
            props,
            vec![
                ("repo", Visibility::Private),
                ("Name", Visibility::Public),
                ("count", Visibility::Private),
            ]
        );

        let sync = result.functions.iter().find(|f| f.name == "sync").unwrap();
        assert_eq!(sync.visibility, Visibility::Global);
        let names: Vec<&str> = sync.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["upsertAll", "log"]);
        assert_eq!(sync.calls[0].receiver_type.as_deref(), Some("AccountRepository"));

        let load = result.functions.iter().find(|f| f.name == "load").unwrap();
        assert_eq!(load.kind, FunctionKind::Static);
        assert_eq!(load.params, vec!["accountId"]);

        let inner = result.classes.iter().find(|c| c.name == "Result").unwrap();
        assert_eq!(inner.qualified_name, "AccountService.Result");
    }

    #[test]
    fn test_apex_default_visibility_is_private() {
        let result = parse("classes/Util.cls", "public class Util {\n  void helper() {}\n}\n");
        assert_eq!(result.functions[0].visibility, Visibility::Private);
    }

    #[test]
    fn test_apex_trigger() {
        let src = r#"trigger AccountTrigger on Account (before insert, after update) {
    AccountHandler handler = new AccountHandler();
    handler.run(Trigger.new);
    if (Trigger.isInsert) { AccountHandler.audit(); }
}
"#;
        let result = parse("triggers/AccountTrigger.trigger", src);
        let trigger = &result.classes[0];
        assert_eq!(trigger.kind, ClassKind::Trigger);
        assert_eq!(trigger.name, "AccountTrigger");
        assert_eq!(trigger.interfaces, vec!["Account"]);
        assert_eq!((trigger.start_line, trigger.end_line), (1, 5));

        let function = &result.functions[0];
        assert_eq!(function.name, "AccountTrigger");
        let names: Vec<&str> = function.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["AccountHandler", "run", "audit"]);
        assert_eq!(function.calls[1].receiver_type.as_deref(), Some("AccountHandler"));
    }
}
