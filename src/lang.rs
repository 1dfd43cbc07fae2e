//! Language profiles: extension mapping and per-language pattern tables.
//!
//! Everything the scanner knows about a language lives here — which file
//! extensions it owns, how to spot a CNPJ mention in it, and the lexical
//! patterns that approximate class/method declarations. The patterns are a
//! deliberate best-effort approximation: there is no parser behind them, and
//! both false positives and false negatives are accepted.

use once_cell::sync::Lazy;
use phf::phf_map;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Languages the scanner understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    CSharp,
    C,
    Cpp,
    Html,
    JavaScript,
    Python,
    Go,
    Sql,
}

impl Language {
    /// All supported languages, in registry order.
    pub const ALL: &'static [Language] = &[
        Language::Java,
        Language::CSharp,
        Language::C,
        Language::Cpp,
        Language::Html,
        Language::JavaScript,
        Language::Python,
        Language::Go,
        Language::Sql,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Html => "html",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Sql => "sql",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "java" => Some(Language::Java),
            "csharp" => Some(Language::CSharp),
            "c" => Some(Language::C),
            "cpp" => Some(Language::Cpp),
            "html" => Some(Language::Html),
            "javascript" => Some(Language::JavaScript),
            "python" => Some(Language::Python),
            "go" => Some(Language::Go),
            "sql" => Some(Language::Sql),
            _ => None,
        }
    }

    /// File extensions (without the dot) associated with this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Java => &["java"],
            Language::CSharp => &["cs", "cshtml", "csx"],
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "hpp", "cc", "cxx", "h", "hxx", "hh"],
            Language::Html => &["html", "htm", "xhtml", "aspx"],
            Language::JavaScript => &["js", "jsx", "ts", "tsx", "mjs", "cjs"],
            Language::Python => &["py", "pyw", "ipynb", "pyc"],
            Language::Go => &["go"],
            Language::Sql => &["sql"],
        }
    }

    /// Whether method bodies are delimited by indentation rather than braces.
    pub fn uses_indentation(&self) -> bool {
        matches!(self, Language::Python)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extension → language table.
///
/// `.h` is claimed by both C and C++; it resolves to C here (the first
/// claimant in registry order), which also decides which targeted pattern
/// and fallback policy a header file gets.
static EXTENSIONS: phf::Map<&'static str, Language> = phf_map! {
    "java" => Language::Java,
    "cs" => Language::CSharp,
    "cshtml" => Language::CSharp,
    "csx" => Language::CSharp,
    "c" => Language::C,
    "h" => Language::C,
    "cpp" => Language::Cpp,
    "hpp" => Language::Cpp,
    "cc" => Language::Cpp,
    "cxx" => Language::Cpp,
    "hxx" => Language::Cpp,
    "hh" => Language::Cpp,
    "html" => Language::Html,
    "htm" => Language::Html,
    "xhtml" => Language::Html,
    "aspx" => Language::Html,
    "js" => Language::JavaScript,
    "jsx" => Language::JavaScript,
    "ts" => Language::JavaScript,
    "tsx" => Language::JavaScript,
    "mjs" => Language::JavaScript,
    "cjs" => Language::JavaScript,
    "py" => Language::Python,
    "pyw" => Language::Python,
    "ipynb" => Language::Python,
    "pyc" => Language::Python,
    "go" => Language::Go,
    "sql" => Language::Sql,
};

/// Resolve a file extension (with or without leading dot, any case) to a
/// language. Returns `None` for unsupported extensions.
pub fn resolve_language(extension: &str) -> Option<Language> {
    let ext = extension.trim_start_matches('.').to_lowercase();
    EXTENSIONS.get(ext.as_str()).copied()
}

/// Generic CNPJ detection pattern: the identifier, the spelled-out registry
/// name, or a formatted numeric CNPJ literal (12.345.678/0001-90 and
/// punctuation-less variants).
pub const GENERIC_CNPJ_PATTERN: &str = r"(?:cnpj|cadastro\s+nacional\s+(?:de|da)\s+pessoa\s+jur[íi]dica|\b\d{2}[.-]?\d{3}[.-]?\d{3}[/]?\d{4}[-]?\d{2}\b)";

lazy_static::lazy_static! {
    /// Compiled generic pattern, case-insensitive. Used for the fallback
    /// gate, python body checks, and context-window extraction.
    pub static ref GENERIC_CNPJ: Regex = RegexBuilder::new(GENERIC_CNPJ_PATTERN)
        .case_insensitive(true)
        .build()
        .unwrap();
}

/// Lexical patterns for one language.
///
/// `class_pattern` and `method_pattern` drive the collection pass,
/// `keyword_pattern` is the file-level gate, `name_pattern` recovers a
/// method name from an already-extracted span, and `fallback_pattern` (Java
/// and C# only) is a looser method-with-keyword form tried when the targeted
/// pass comes up empty.
pub struct LanguageProfile {
    pub language: Language,
    pub class_pattern: &'static str,
    pub method_pattern: &'static str,
    pub keyword_pattern: &'static str,
    pub name_pattern: &'static str,
    pub fallback_pattern: Option<&'static str>,
}

static PROFILES: &[LanguageProfile] = &[
    LanguageProfile {
        language: Language::Java,
        class_pattern: r"class\s+(\w+)",
        method_pattern: r"(?:public|private|protected)?\s+(?:static\s+)?[\w<>\[\]]+\s+(\w+)\s*\([^)]*\)\s*(?:\{|throws)",
        keyword_pattern: r"(?:cnpj|CNPJ|getCnpj|setCnpj|validaCnpj|cadastro\s+nacional)",
        name_pattern: r"(?:public|private|protected)?\s+(?:static\s+)?[\w<>\[\]]+\s+(\w+)\s*\(",
        fallback_pattern: Some(
            r"(?:public|private|protected)?\s+\w+\s+(\w+)\s*\([^)]*\)\s*\{[^}]*(?:cnpj|CNPJ)[^}]*\}",
        ),
    },
    LanguageProfile {
        language: Language::CSharp,
        class_pattern: r"class\s+(\w+)",
        method_pattern: r"(?:public|private|protected|internal)?\s+(?:static\s+|virtual\s+|async\s+|override\s+|readonly\s+)?[\w<>\[\]\.]+\s+(\w+)\s*\([^)]*\)\s*(?:\{|=>|\s*where)",
        keyword_pattern: r"(?:cnpj|CNPJ|GetCnpj|SetCnpj|ValidaCnpj|cadastro\s+nacional)",
        name_pattern: r"(?:public|private|protected|internal)?\s+(?:static\s+|virtual\s+|async\s+|override\s+|readonly\s+)?[\w<>\[\]\.]+\s+(\w+)\s*\(",
        fallback_pattern: Some(
            r"(?:public|private|protected|internal)?\s+[\w<>\[\]\.]+\s+(\w+)\s*\([^)]*\)\s*\{[^}]*(?:cnpj|CNPJ|Cnpj)[^}]*\}",
        ),
    },
    LanguageProfile {
        language: Language::C,
        class_pattern: r"struct\s+(\w+)",
        method_pattern: r"[\w\*]+\s+(\w+)\s*\([^;]*\)\s*\{",
        keyword_pattern: r"(?:cnpj|CNPJ|get_cnpj|set_cnpj|valida_cnpj|cadastro\s+nacional)",
        name_pattern: r"[\w\*]+\s+(\w+)\s*\(",
        fallback_pattern: None,
    },
    LanguageProfile {
        language: Language::Cpp,
        class_pattern: r"(?:class|struct)\s+(\w+)",
        method_pattern: r"(?:virtual\s+)?[\w:~\*<>\[\]]+\s+(\w+)\s*\([^;]*\)(?:\s*const)?\s*(?:\{|override|final)",
        keyword_pattern: r"(?:cnpj|CNPJ|getCnpj|setCnpj|validaCnpj|cadastro\s+nacional)",
        name_pattern: r"(?:virtual\s+)?[\w:~\*<>\[\]]+\s+(\w+)\s*\(",
        fallback_pattern: None,
    },
    LanguageProfile {
        language: Language::Html,
        class_pattern: r#"<[^>]*class=["'](.*?)["']"#,
        method_pattern: r"(?:<script[^>]*>.*?)?function\s+(\w+)|(\w+)\s*=\s*function",
        keyword_pattern: r"(?:cnpj|CNPJ|cadastro\s+nacional)",
        name_pattern: r"function\s+(\w+)|(\w+)\s*=\s*function",
        fallback_pattern: None,
    },
    LanguageProfile {
        language: Language::JavaScript,
        class_pattern: r"class\s+(\w+)|function\s+(\w+)",
        method_pattern: r"(?:function\s+(\w+)|const\s+(\w+)\s*=|let\s+(\w+)\s*=|var\s+(\w+)\s*=|(\w+)\s*:\s*function)\s*\([^)]*\)",
        keyword_pattern: r"(?:cnpj|CNPJ|getCnpj|setCnpj|validaCnpj|cadastro\s+nacional)",
        name_pattern: r"function\s+(\w+)|const\s+(\w+)|let\s+(\w+)|var\s+(\w+)|(\w+)\s*:\s*function",
        fallback_pattern: None,
    },
    LanguageProfile {
        language: Language::Python,
        class_pattern: r"class\s+(\w+)",
        method_pattern: r"def\s+(\w+)\s*\([^)]*\)\s*:",
        keyword_pattern: r"(?:cnpj|CNPJ|get_cnpj|set_cnpj|valida_cnpj|cadastro\s+nacional)",
        name_pattern: r"def\s+(\w+)\s*\(",
        fallback_pattern: None,
    },
    LanguageProfile {
        language: Language::Go,
        class_pattern: r"type\s+(\w+)\s+struct",
        method_pattern: r"func\s+(?:\([^)]*\))?\s*(\w+)",
        keyword_pattern: r"(?:cnpj|CNPJ|GetCnpj|SetCnpj|ValidaCnpj|cadastro\s+nacional)",
        name_pattern: r"func\s+(?:\([^)]*\))?\s*(\w+)",
        fallback_pattern: None,
    },
    LanguageProfile {
        language: Language::Sql,
        class_pattern: r"CREATE\s+TABLE\s+(\w+)",
        method_pattern: r"CREATE\s+(?:OR\s+REPLACE\s+)?(?:PROCEDURE|FUNCTION)\s+(\w+)",
        keyword_pattern: r"(?:cnpj|CNPJ|cadastro\s+nacional)",
        name_pattern: r"(?:PROCEDURE|FUNCTION)\s+(\w+)",
        fallback_pattern: None,
    },
];

/// Get the pattern table for a language.
pub fn profile(language: Language) -> &'static LanguageProfile {
    PROFILES
        .iter()
        .find(|p| p.language == language)
        .expect("every language has a profile")
}

/// Pre-compiled regexes for one language.
pub struct CompiledProfile {
    pub keyword: Regex,
    pub class: Regex,
    pub method: Regex,
    pub name: Regex,
    pub fallback: Option<Regex>,
}

static COMPILED: Lazy<HashMap<Language, CompiledProfile>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for p in PROFILES {
        map.insert(
            p.language,
            CompiledProfile {
                keyword: compile_scan_pattern(p.keyword_pattern)
                    .expect("keyword pattern compiles"),
                class: compile_scan_pattern(p.class_pattern).expect("class pattern compiles"),
                method: compile_scan_pattern(p.method_pattern).expect("method pattern compiles"),
                name: RegexBuilder::new(p.name_pattern)
                    .case_insensitive(true)
                    .build()
                    .expect("name pattern compiles"),
                fallback: p
                    .fallback_pattern
                    .map(|f| compile_scan_pattern(f).expect("fallback pattern compiles")),
            },
        );
    }
    map
});

/// Get the compiled patterns for a language.
pub fn compiled(language: Language) -> &'static CompiledProfile {
    &COMPILED[&language]
}

/// Compile a pattern with the scanner's flags: case-insensitive, multiline,
/// dot-matches-newline.
pub fn compile_scan_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()
}

/// Compose the targeted method-with-keyword pattern for a language.
///
/// Appends a bounded body clause to the method pattern: the keyword must
/// occur before the next closing delimiter (`}` for brace languages, `;` for
/// SQL statement bodies). `[^}]*` cannot cross a closing brace, so the match
/// ends at the first `}` after the declaration — correct for non-nested
/// bodies, best-effort otherwise. Pure: no profile state is touched.
pub fn build_targeted_pattern(language: Language) -> String {
    let p = profile(language);
    match language {
        Language::Sql => format!(
            "{}(?:[^;]*?(?:{})[^;]*?;)",
            p.method_pattern, p.keyword_pattern
        ),
        _ => format!(
            r"{}[^}}]*(?:{})[^}}]*\}}",
            p.method_pattern, p.keyword_pattern
        ),
    }
}
