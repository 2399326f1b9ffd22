//! Entry-point scoring.
//!
//! A symbol's score combines its call fan ratio with export status, naming
//! conventions and framework hints. High scores seed process detection.

use crate::analysis::frameworks;

/// Exact names that signal an entry point in any language.
const UNIVERSAL_ENTRY_NAMES: &[&str] = &[
    "main",
    "init",
    "bootstrap",
    "start",
    "run",
    "setup",
    "configure",
];

/// Prefixes that signal an entry point when followed by a word boundary.
const ENTRY_PREFIXES: &[&str] = &[
    "handle", "on", "process", "execute", "perform", "dispatch", "trigger", "fire", "emit",
];

const ENTRY_SUFFIXES: &[&str] = &["handler", "controller"];

/// Prefixes that mark plumbing helpers; they damp the score.
const UTILITY_PREFIXES: &[&str] = &[
    "get",
    "set",
    "is",
    "has",
    "can",
    "format",
    "parse",
    "validate",
    "to",
    "from",
    "encode",
    "serialize",
    "clone",
    "merge",
];

fn language_entry_names(language: &str) -> &'static [&'static str] {
    match language {
        "typescript" | "javascript" => &["getserversideprops", "getstaticprops", "middleware"],
        "python" => &["lambda_handler", "wsgi", "asgi"],
        "java" => &["doget", "dopost", "doput", "dodelete"],
        "go" => &["servehttp"],
        "php" => &["boot", "register"],
        "swift" => &["viewdidload", "viewwillappear", "application"],
        "kotlin" => &["oncreate", "onstart"],
        _ => &[],
    }
}

#[derive(Debug, Clone)]
pub struct EntryPointSignal<'a> {
    pub name: &'a str,
    pub language: &'a str,
    pub is_exported: bool,
    pub caller_count: usize,
    pub callee_count: usize,
    pub file_path: Option<&'a str>,
    pub ast_text: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct EntryPointScore {
    pub score: f64,
    pub reasons: Vec<String>,
}

pub fn score_entry_point(signal: &EntryPointSignal) -> EntryPointScore {
    if signal.callee_count == 0 {
        return EntryPointScore {
            score: 0.0,
            reasons: vec!["no-outgoing-calls".to_string()],
        };
    }

    let mut reasons = Vec::new();
    let base = signal.callee_count as f64 / (signal.caller_count as f64 + 1.0);
    let mut score = base;

    if signal.is_exported {
        score *= 2.0;
        reasons.push("exported".to_string());
    }

    if matches_entry_pattern(signal.name, signal.language) {
        score *= 1.5;
        reasons.push("entry-pattern".to_string());
    }

    if matches_utility_pattern(signal.name) {
        score *= 0.3;
        reasons.push("utility-pattern".to_string());
    }

    if let Some(path) = signal.file_path {
        if let Some(hint) = frameworks::detect_from_path(path) {
            score *= hint.entry_point_multiplier;
            reasons.push(format!("framework:{}", hint.reason));
        }
    }

    if let Some(text) = signal.ast_text {
        if let Some(hint) = frameworks::detect_from_ast(signal.language, text) {
            score *= hint.entry_point_multiplier;
        }
    }

    EntryPointScore { score, reasons }
}

/// Prefix with a word boundary after it: end of name, an uppercase letter
/// (camelCase) or an underscore (snake_case).
fn prefix_with_boundary(name_lower: &str, name: &str, prefix: &str) -> bool {
    if !name_lower.starts_with(prefix) {
        return false;
    }
    match name.chars().nth(prefix.len()) {
        None => true,
        Some(c) => c.is_uppercase() || c == '_',
    }
}

fn matches_entry_pattern(name: &str, language: &str) -> bool {
    let lower = name.to_lowercase();

    if UNIVERSAL_ENTRY_NAMES.contains(&lower.as_str()) {
        return true;
    }
    if language_entry_names(language).contains(&lower.as_str()) {
        return true;
    }
    if ENTRY_PREFIXES
        .iter()
        .any(|p| prefix_with_boundary(&lower, name, p))
    {
        return true;
    }
    ENTRY_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

fn matches_utility_pattern(name: &str) -> bool {
    if name.starts_with('_') {
        return true;
    }
    let lower = name.to_lowercase();
    UTILITY_PREFIXES
        .iter()
        .any(|p| prefix_with_boundary(&lower, name, p))
}

/// Test files never contribute entry points.
pub fn is_test_file(path: &str) -> bool {
    let mut normalized = path.replace('\\', "/").to_lowercase();
    if !normalized.starts_with('/') {
        normalized.insert(0, '/');
    }

    const MARKERS: &[&str] = &[
        ".test.",
        ".spec.",
        "__tests__",
        "__mocks__",
        "/test/",
        "/tests/",
        "/testing/",
        ".tests/",
        "tests/feature/",
        "tests/unit/",
    ];
    if MARKERS.iter().any(|m| normalized.contains(m)) {
        return true;
    }

    normalized.ends_with("_test.go")
        || normalized.ends_with("_test.py")
        || normalized.ends_with("tests.swift")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal<'a>(name: &'a str, callers: usize, callees: usize) -> EntryPointSignal<'a> {
        EntryPointSignal {
            name,
            language: "typescript",
            is_exported: false,
            caller_count: callers,
            callee_count: callees,
            file_path: None,
            ast_text: None,
        }
    }

    #[test]
    fn test_no_outgoing_calls_scores_zero() {
        let score = score_entry_point(&signal("leaf", 5, 0));
        assert_eq!(score.score, 0.0);
        assert!(score.reasons.contains(&"no-outgoing-calls".to_string()));
    }

    #[test]
    fn test_base_fan_ratio() {
        let score = score_entry_point(&signal("plainname", 1, 4));
        assert!((score.score - 2.0).abs() < 1e-9);
        assert!(score.reasons.is_empty());
    }

    #[test]
    fn test_exported_doubles() {
        let mut s = signal("plainname", 1, 4);
        s.is_exported = true;
        let score = score_entry_point(&s);
        assert!((score.score - 4.0).abs() < 1e-9);
        assert!(score.reasons.contains(&"exported".to_string()));
    }

    #[test]
    fn test_entry_pattern_multiplier() {
        let score = score_entry_point(&signal("handleRequest", 0, 3));
        // 3 / 1 * 1.5
        assert!((score.score - 4.5).abs() < 1e-9);
        assert!(score.reasons.contains(&"entry-pattern".to_string()));
    }

    #[test]
    fn test_utility_pattern_damping() {
        let score = score_entry_point(&signal("validateInput", 2, 3));
        // 3 / 3 * 0.3
        assert!((score.score - 0.3).abs() < 1e-9);
        assert!(score.reasons.contains(&"utility-pattern".to_string()));
    }

    #[test]
    fn test_framework_path_multiplier() {
        let mut s = signal("listUsers", 0, 2);
        s.file_path = Some("src/routes/users.ts");
        let score = score_entry_point(&s);
        // 2 / 1 * 2.5
        assert!((score.score - 5.0).abs() < 1e-9);
        assert!(score
            .reasons
            .iter()
            .any(|r| r.starts_with("framework:")));
    }

    #[test]
    fn test_ast_multiplier_applies() {
        let mut s = signal("plainname", 0, 2);
        s.ast_text = Some("@Controller('x') export class X {}");
        let score = score_entry_point(&s);
        assert!((score.score - 6.4).abs() < 1e-9);
    }

    #[test]
    fn test_entry_name_patterns() {
        assert!(matches_entry_pattern("main", "rust"));
        assert!(matches_entry_pattern("bootstrap", "typescript"));
        assert!(matches_entry_pattern("onClick", "typescript"));
        assert!(matches_entry_pattern("handle_request", "python"));
        assert!(matches_entry_pattern("RequestHandler", "typescript"));
        assert!(matches_entry_pattern("UserController", "java"));
        assert!(matches_entry_pattern("ServeHTTP", "go"));
        assert!(!matches_entry_pattern("once", "typescript"));
        assert!(!matches_entry_pattern("random", "typescript"));
    }

    #[test]
    fn test_utility_name_patterns() {
        assert!(matches_utility_pattern("getUser"));
        assert!(matches_utility_pattern("is_valid"));
        assert!(matches_utility_pattern("toJson"));
        assert!(matches_utility_pattern("_private"));
        assert!(!matches_utility_pattern("isolate"));
        assert!(!matches_utility_pattern("total"));
        assert!(!matches_utility_pattern("settle"));
    }

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file("src/app.test.ts"));
        assert!(is_test_file("src/app.spec.ts"));
        assert!(is_test_file("src/__tests__/app.ts"));
        assert!(is_test_file("src/__mocks__/db.ts"));
        assert!(is_test_file("test/helpers.py"));
        assert!(is_test_file("pkg/server_test.go"));
        assert!(is_test_file("tests/feature/LoginTest.php"));
        assert!(is_test_file("App/HomeTests.swift"));
        assert!(is_test_file("src\\tests\\unit\\a.py"));
        assert!(!is_test_file("src/app.ts"));
        assert!(!is_test_file("src/testimonials.ts"));
    }
}
