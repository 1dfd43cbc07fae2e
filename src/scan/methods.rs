//! Method collection: a best-effort registry of declared methods, built from
//! regex matches so later snippets can be cross-referenced against it.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::lang::{self, Language};

lazy_static! {
    /// Modifier keywords that a loose capture group can pick up instead of a
    /// real identifier. Checked as a prefix, same as the scan patterns do.
    static ref RESERVED_MODIFIER: Regex =
        Regex::new(r"^(?:public|private|protected|internal|static|const|let|var)").unwrap();
}

/// A declared method or function spotted during the collection pass.
#[derive(Debug, Clone)]
pub struct MethodRecord {
    /// `Class.method` when a class declaration precedes it, bare name otherwise.
    pub qualified_name: String,
    pub file: String,
    pub language: Language,
    /// 1-based line of the declaration.
    pub line: usize,
    /// Raw span matched by the method pattern.
    pub text: String,
}

/// Registry of declared methods keyed by qualified name.
///
/// Advisory only: collisions are resolved last-writer-wins and entries feed
/// dependency hints, never control flow.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: BTreeMap<String, MethodRecord>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn get(&self, qualified_name: &str) -> Option<&MethodRecord> {
        self.methods.get(qualified_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MethodRecord)> {
        self.methods.iter()
    }

    /// Record every class and method declaration the language patterns find
    /// in `content`. Methods are attributed to the most recently declared
    /// class at or before their own offset; nesting is not tracked.
    pub fn collect_file(&mut self, file: &str, language: Language, content: &str) {
        let profile = lang::compiled(language);

        let classes: Vec<(usize, String)> = profile
            .class
            .captures_iter(content)
            .filter_map(|caps| {
                let start = caps.get(0)?.start();
                let name = first_group(&caps)?;
                Some((start, name.to_string()))
            })
            .collect();

        let mut class_idx = 0;
        let mut current_class: Option<&str> = None;
        for caps in profile.method.captures_iter(content) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            while class_idx < classes.len() && classes[class_idx].0 <= whole.start() {
                current_class = Some(&classes[class_idx].1);
                class_idx += 1;
            }
            let name = match first_identifier_group(&caps) {
                Some(name) => name,
                None => continue,
            };
            let qualified_name = match current_class {
                Some(class) => format!("{}.{}", class, name),
                None => name.to_string(),
            };
            let line = line_at_offset(content, whole.start());
            self.methods.insert(
                qualified_name.clone(),
                MethodRecord {
                    qualified_name,
                    file: file.to_string(),
                    language,
                    line,
                    text: whole.as_str().to_string(),
                },
            );
        }
    }
}

/// First non-empty capture group, if any.
pub(crate) fn first_group<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str())
        .find(|group| !group.is_empty())
}

/// First non-empty capture group that is not a bare modifier keyword.
pub(crate) fn first_identifier_group<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str())
        .find(|group| !group.is_empty() && !RESERVED_MODIFIER.is_match(group))
}

/// 1-based line number of a byte offset.
pub fn line_at_offset(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

/// Pull a method name out of an extracted span using the language's name
/// pattern. Falls back to `"unknown"` when nothing identifier-like is found.
pub fn extract_method_name(span: &str, language: Language) -> String {
    if let Some(caps) = lang::compiled(language).name.captures(span) {
        if let Some(name) = first_identifier_group(&caps) {
            return name.to_string();
        }
    }
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAVA_SOURCE: &str = r#"
public class Empresa {
    public boolean validaCnpj(long cnpj) {
        return cnpj % 97 == 2;
    }

    public String getNome() {
        return nome;
    }
}
"#;

    #[test]
    fn test_collect_java_methods_qualified_by_class() {
        let mut registry = MethodRegistry::new();
        registry.collect_file("Empresa.java", Language::Java, JAVA_SOURCE);

        let record = registry
            .get("Empresa.validaCnpj")
            .expect("validaCnpj should be registered");
        assert_eq!(record.file, "Empresa.java");
        assert_eq!(record.language, Language::Java);
        assert_eq!(record.line, 3);
        assert!(registry.get("Empresa.getNome").is_some());
    }

    #[test]
    fn test_collect_python_bare_names_without_class() {
        let source = "def valida_cnpj(cnpj):\n    return True\n";
        let mut registry = MethodRegistry::new();
        registry.collect_file("fiscal.py", Language::Python, source);

        let record = registry.get("valida_cnpj").expect("function registered");
        assert_eq!(record.line, 1);
        assert_eq!(record.qualified_name, "valida_cnpj");
    }

    #[test]
    fn test_methods_attributed_to_nearest_preceding_class() {
        let source = r#"
class First:
    def alpha(self):
        pass

class Second:
    def beta(self):
        pass
"#;
        let mut registry = MethodRegistry::new();
        registry.collect_file("two.py", Language::Python, source);

        assert!(registry.get("First.alpha").is_some());
        assert!(registry.get("Second.beta").is_some());
        assert!(registry.get("First.beta").is_none());
    }

    #[test]
    fn test_duplicate_names_last_writer_wins() {
        let mut registry = MethodRegistry::new();
        registry.collect_file("a.py", Language::Python, "def helper():\n    pass\n");
        registry.collect_file("b.py", Language::Python, "def helper():\n    return 1\n");

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("helper").unwrap().file, "b.py");
    }

    #[test]
    fn test_line_at_offset() {
        let text = "one\ntwo\nthree";
        assert_eq!(line_at_offset(text, 0), 1);
        assert_eq!(line_at_offset(text, 4), 2);
        assert_eq!(line_at_offset(text, 8), 3);
    }

    #[test]
    fn test_extract_method_name_java() {
        let span = "public boolean validaCnpj(long cnpj) {";
        assert_eq!(extract_method_name(span, Language::Java), "validaCnpj");
    }

    #[test]
    fn test_extract_method_name_skips_modifier_groups() {
        // The loose C name pattern captures "static" here; the prefix check
        // rejects it and nothing else qualifies.
        assert_eq!(extract_method_name("unsigned static(", Language::C), "unknown");
    }

    #[test]
    fn test_extract_method_name_unknown_when_no_match() {
        assert_eq!(extract_method_name("42 + 42", Language::Java), "unknown");
    }

    #[test]
    fn test_extract_method_name_javascript_alternatives() {
        assert_eq!(
            extract_method_name("const checkCnpj = (value) => {", Language::JavaScript),
            "checkCnpj"
        );
        assert_eq!(
            extract_method_name("function formatCnpj(raw) {", Language::JavaScript),
            "formatCnpj"
        );
    }
}
