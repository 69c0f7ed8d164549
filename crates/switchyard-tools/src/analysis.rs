//! Static analysis - lightweight, line-oriented code checks
//!
//! The analyzer does not parse; it applies per-language line rules that are
//! cheap enough to run on every request:
//! - Python: empty functions, `print` calls
//! - Rust: `unwrap()` / `expect(`, `todo!()` / `unimplemented!()`
//! - All languages: TODO/FIXME markers, long lines, trailing whitespace

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Lines longer than this are reported
pub const MAX_LINE_LENGTH: usize = 120;

static PY_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\s*)(?:async\s+)?def\s+(\w+)\s*\(").expect("PY_DEF is a compile-time constant")
});

static PY_PRINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w.])print\s*\(").expect("PY_PRINT is a compile-time constant")
});

static RUST_PANICKY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(unwrap\(\)|expect\()").expect("RUST_PANICKY is a compile-time constant")
});

static RUST_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(todo|unimplemented)!\(").expect("RUST_PLACEHOLDER is a compile-time constant")
});

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(TODO|FIXME)\b").expect("MARKER is a compile-time constant"));

/// Languages the analyzer knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Python
    Python,
    /// Rust
    Rust,
    /// TypeScript
    TypeScript,
    /// JavaScript
    JavaScript,
    /// C#
    CSharp,
    /// Anything else; only the generic rules apply
    Unknown,
}

impl Language {
    /// Every concrete language
    pub const SUPPORTED: [Language; 5] = [
        Language::Python,
        Language::Rust,
        Language::TypeScript,
        Language::JavaScript,
        Language::CSharp,
    ];

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Rust => "rust",
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::CSharp => "csharp",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a language name or common alias
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "python" | "py" => Self::Python,
            "rust" | "rs" => Self::Rust,
            "typescript" | "ts" => Self::TypeScript,
            "javascript" | "js" => Self::JavaScript,
            "csharp" | "c#" | "cs" => Self::CSharp,
            _ => Self::Unknown,
        }
    }

    /// Guess from a file extension
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        match path.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()) {
            Some(ext) => match ext.as_str() {
                "py" | "pyi" => Self::Python,
                "rs" => Self::Rust,
                "ts" | "tsx" => Self::TypeScript,
                "js" | "jsx" | "mjs" => Self::JavaScript,
                "cs" => Self::CSharp,
                _ => Self::Unknown,
            },
            None => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pick a language from an explicit hint, then the file path, then the code itself.
#[must_use]
pub fn detect_language(hint: Option<&str>, path: Option<&str>, code: &str) -> Language {
    if let Some(lang) = hint.map(Language::from_name).filter(|l| *l != Language::Unknown) {
        return lang;
    }
    if let Some(lang) = path.map(Language::from_path).filter(|l| *l != Language::Unknown) {
        return lang;
    }

    if code.contains("fn ") && (code.contains("let ") || code.contains("->")) {
        Language::Rust
    } else if PY_DEF.is_match(code) || code.lines().any(|l| l.trim_start().starts_with("import ")) {
        Language::Python
    } else if code.contains("namespace ") && code.contains("using ") {
        Language::CSharp
    } else if code.contains("interface ") || code.contains(": string") {
        Language::TypeScript
    } else if code.contains("function ") || code.contains("const ") {
        Language::JavaScript
    } else {
        Language::Unknown
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// 1-based line number
    pub line: usize,
    /// Rule identifier
    pub rule: String,
    /// Human-readable message
    pub message: String,
}

impl Issue {
    fn new(line: usize, rule: &str, message: impl Into<String>) -> Self {
        Self {
            line,
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Analysis report for one snippet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Language the rules were chosen for
    pub language: Language,
    /// Findings ordered by line
    pub issues: Vec<Issue>,
    /// One-line summary
    pub summary: String,
}

/// Run every rule that applies to `language`
#[must_use]
pub fn analyze(code: &str, language: Language) -> AnalysisReport {
    let mut issues = Vec::new();

    match language {
        Language::Python => {
            issues.extend(python_empty_functions(code));
            issues.extend(python_prints(code));
        }
        Language::Rust => issues.extend(rust_rules(code)),
        _ => {}
    }
    issues.extend(generic_rules(code));
    issues.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.rule.cmp(&b.rule)));

    let summary = if issues.is_empty() {
        "No issues found".to_string()
    } else {
        format!("{} issue(s) found", issues.len())
    };

    AnalysisReport {
        language,
        issues,
        summary,
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_placeholder_body(stmt: &str) -> bool {
    matches!(stmt.trim(), "pass" | "...")
}

fn python_empty_functions(code: &str) -> Vec<Issue> {
    let lines: Vec<&str> = code.lines().collect();
    let mut issues = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let Some(caps) = PY_DEF.captures(line) else {
            continue;
        };
        let def_indent = caps.get(1).map_or(0, |m| m.as_str().len());
        let name = caps.get(2).map_or("", |m| m.as_str());

        // one-liner: `def f(): pass`
        if let Some((_, inline)) = line.rsplit_once("):") {
            if !inline.trim().is_empty() {
                if is_placeholder_body(inline) {
                    issues.push(Issue::new(idx + 1, "empty-function", format!("Empty function found: {name}")));
                }
                continue;
            }
        }

        let body: Vec<&str> = lines[idx + 1..]
            .iter()
            .take_while(|l| l.trim().is_empty() || indent_of(l) > def_indent)
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();

        if body.iter().all(|stmt| is_placeholder_body(stmt)) {
            issues.push(Issue::new(idx + 1, "empty-function", format!("Empty function found: {name}")));
        }
    }
    issues
}

fn python_prints(code: &str) -> Vec<Issue> {
    code.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim_start().starts_with('#') && PY_PRINT.is_match(l))
        .map(|(i, _)| Issue::new(i + 1, "print-call", "print() call; prefer the logging module"))
        .collect()
}

fn rust_rules(code: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (i, line) in code.lines().enumerate() {
        if line.trim_start().starts_with("//") {
            continue;
        }
        if RUST_PANICKY.is_match(line) {
            issues.push(Issue::new(i + 1, "panicking-call", "unwrap()/expect() can panic; propagate the error instead"));
        }
        if RUST_PLACEHOLDER.is_match(line) {
            issues.push(Issue::new(i + 1, "placeholder", "todo!()/unimplemented!() left in code"));
        }
    }
    issues
}

fn generic_rules(code: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (i, line) in code.lines().enumerate() {
        if MARKER.is_match(line) {
            issues.push(Issue::new(i + 1, "marker", "TODO/FIXME marker"));
        }
        let width = line.chars().count();
        if width > MAX_LINE_LENGTH {
            issues.push(Issue::new(i + 1, "long-line", format!("line is {width} characters long")));
        }
        if line.ends_with(' ') || line.ends_with('\t') {
            issues.push(Issue::new(i + 1, "trailing-whitespace", "trailing whitespace"));
        }
    }
    issues
}

/// Outcome of a refactoring pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refactoring {
    /// Rewritten code
    pub code: String,
    /// Number of rewritten call sites
    pub changes: usize,
}

/// Rewrite Python `print(...)` calls to `logging.info(...)`.
///
/// Adds `import logging` when at least one call was rewritten and the module
/// does not import it yet.
pub fn refactor_prints_to_logging(code: &str, language: Language) -> Result<Refactoring> {
    if language != Language::Python {
        return Err(Error::UnsupportedLanguage(language.to_string()));
    }

    let mut changes = 0;
    let rewritten: Vec<String> = code
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            let count = PY_PRINT.find_iter(line).count();
            if count == 0 {
                return line.to_string();
            }
            changes += count;
            PY_PRINT.replace_all(line, "${1}logging.info(").into_owned()
        })
        .collect();

    let mut lines = rewritten;
    let has_import = lines
        .iter()
        .any(|l| l.trim() == "import logging" || l.trim_start().starts_with("import logging"));
    if changes > 0 && !has_import {
        let at = usize::from(lines.first().is_some_and(|l| l.starts_with("#!")));
        lines.insert(at, "import logging".to_string());
    }

    let mut code_out = lines.join("\n");
    if code.ends_with('\n') {
        code_out.push('\n');
    }

    Ok(Refactoring {
        code: code_out,
        changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Some("py"), None, ""), Language::Python);
        assert_eq!(detect_language(None, Some("src/lib.rs"), ""), Language::Rust);
        assert_eq!(detect_language(Some("cobol"), Some("App.cs"), ""), Language::CSharp);
        assert_eq!(
            detect_language(None, None, "def main():\n    return 1\n"),
            Language::Python
        );
        assert_eq!(
            detect_language(None, None, "fn main() {\n    let x = 1;\n}\n"),
            Language::Rust
        );
        assert_eq!(detect_language(None, None, "hello"), Language::Unknown);
    }

    #[test]
    fn test_python_empty_functions() {
        let code = "def empty():\n    pass\n\ndef stub(): ...\n\ndef real(x):\n    return x * 2\n";
        let report = analyze(code, Language::Python);

        let empties: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.rule == "empty-function")
            .collect();
        assert_eq!(empties.len(), 2);
        assert_eq!(empties[0].message, "Empty function found: empty");
        assert_eq!(empties[0].line, 1);
        assert_eq!(empties[1].message, "Empty function found: stub");
    }

    #[test]
    fn test_python_prints_ignore_methods_and_comments() {
        let code = "print('a')\n# print('b')\nlogger.print('c')\n";
        let report = analyze(code, Language::Python);
        let prints: Vec<_> = report.issues.iter().filter(|i| i.rule == "print-call").collect();
        assert_eq!(prints.len(), 1);
        assert_eq!(prints[0].line, 1);
    }

    #[test]
    fn test_rust_rules() {
        let code = "fn main() {\n    let v = parse().unwrap();\n    todo!()\n}\n";
        let report = analyze(code, Language::Rust);
        let rules: Vec<_> = report.issues.iter().map(|i| i.rule.as_str()).collect();
        assert_eq!(rules, vec!["panicking-call", "placeholder"]);
    }

    #[test]
    fn test_clean_code_summary() {
        let report = analyze("def ok():\n    return 1\n", Language::Python);
        assert!(report.issues.is_empty());
        assert_eq!(report.summary, "No issues found");
    }

    #[test]
    fn test_generic_rules() {
        let long = "x".repeat(MAX_LINE_LENGTH + 1);
        let code = format!("// TODO: later\n{long}\nend \n");
        let report = analyze(&code, Language::Unknown);
        let rules: Vec<_> = report.issues.iter().map(|i| i.rule.as_str()).collect();
        assert_eq!(rules, vec!["marker", "long-line", "trailing-whitespace"]);
        assert_eq!(report.summary, "3 issue(s) found");
    }

    #[test]
    fn test_refactor_prints() {
        let code = "def main():\n    print('hi')\n    print(\"x\", 1)\n";
        let result = refactor_prints_to_logging(code, Language::Python).unwrap();

        assert_eq!(result.changes, 2);
        assert_eq!(
            result.code,
            "import logging\ndef main():\n    logging.info('hi')\n    logging.info(\"x\", 1)\n"
        );
    }

    #[test]
    fn test_refactor_keeps_existing_import_and_shebang() {
        let code = "#!/usr/bin/env python\nimport logging\nprint(1)";
        let result = refactor_prints_to_logging(code, Language::Python).unwrap();
        assert_eq!(result.code, "#!/usr/bin/env python\nimport logging\nlogging.info(1)");

        let bare = "#!/usr/bin/env python\nprint(1)\n";
        let result = refactor_prints_to_logging(bare, Language::Python).unwrap();
        assert_eq!(result.code, "#!/usr/bin/env python\nimport logging\nlogging.info(1)\n");
    }

    #[test]
    fn test_refactor_rejects_other_languages() {
        let err = refactor_prints_to_logging("println!(\"x\");", Language::Rust).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLanguage(_)));
    }
}
