//! Framework detection from file paths and definition text.
//!
//! Both tables are fixed and ordered; the first matching rule wins. Path
//! rules see a lowercased, slash-normalised path with a leading slash. AST
//! rules see the first ~300 characters of a definition, lowercased.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::indexer::walker::normalize_path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameworkHint {
    pub framework: &'static str,
    pub entry_point_multiplier: f64,
    pub reason: &'static str,
}

struct PathRule {
    pattern: Regex,
    exclude: Option<Regex>,
    framework: &'static str,
    multiplier: f64,
    reason: &'static str,
}

fn rule(
    pattern: &str,
    exclude: Option<&str>,
    framework: &'static str,
    multiplier: f64,
    reason: &'static str,
) -> PathRule {
    PathRule {
        pattern: Regex::new(pattern).expect("path rule pattern"),
        exclude: exclude.map(|e| Regex::new(e).expect("path rule exclusion")),
        framework,
        multiplier,
        reason,
    }
}

static PATH_RULES: Lazy<Vec<PathRule>> = Lazy::new(|| {
    vec![
        rule(
            r"/pages/api/.*\.(ts|tsx|js|jsx)$",
            None,
            "nextjs-api",
            3.0,
            "nextjs-api-route",
        ),
        rule(
            r"/app/(.*/)?route\.(ts|js)$",
            None,
            "nextjs-api",
            3.0,
            "nextjs-app-route",
        ),
        rule(
            r"/pages/.*\.(ts|tsx|js|jsx)$",
            Some(r"/pages/(api/|_)"),
            "nextjs-pages",
            3.0,
            "nextjs-page",
        ),
        rule(
            r"/app/(.*/)?page\.(tsx|ts|jsx|js)$",
            None,
            "nextjs-app",
            3.0,
            "nextjs-app-page",
        ),
        rule(
            r"/app/(.*/)?layout\.(tsx|ts)$",
            None,
            "nextjs-app",
            2.0,
            "nextjs-app-layout",
        ),
        rule(
            r"/routes/[^/]+\.(ts|js)$",
            None,
            "express",
            2.5,
            "express-route",
        ),
        rule(
            r"/http/controllers/.*\.php$",
            None,
            "laravel",
            3.0,
            "laravel-controller",
        ),
        rule(
            r"/routes/[^/]+\.php$",
            None,
            "laravel",
            3.0,
            "laravel-route",
        ),
        rule(
            r"/(jobs|listeners|middleware)/[^/]+\.php$",
            None,
            "laravel",
            2.5,
            "laravel-component",
        ),
        rule(
            r"/controllers/[^/]+\.(ts|js)$",
            None,
            "express",
            2.5,
            "controller-dir",
        ),
        rule(
            r"/controllers/[^/]+\.java$",
            None,
            "spring",
            3.0,
            "controller-dir",
        ),
        rule(
            r"/controllers/[^/]+\.(kt|kts)$",
            None,
            "spring",
            3.0,
            "controller-dir",
        ),
        rule(
            r"/controllers/[^/]+\.cs$",
            None,
            "aspnet",
            3.0,
            "controller-dir",
        ),
        rule(
            r"/controllers/[^/]+\.go$",
            None,
            "go-http",
            2.5,
            "controller-dir",
        ),
        rule(
            r"/controllers/[^/]+\.php$",
            None,
            "laravel",
            3.0,
            "controller-dir",
        ),
        rule(r"views\.py$", None, "django", 2.0, "django-views"),
        rule(r"urls\.py$", None, "django", 2.5, "django-urls"),
        rule(
            r"/routers/[^/]+\.py$",
            None,
            "fastapi",
            3.0,
            "fastapi-router",
        ),
        rule(
            r"controller[^/]*\.java$",
            None,
            "spring",
            3.0,
            "spring-controller",
        ),
        rule(
            r"/handlers?/[^/]+\.go$",
            None,
            "go-http",
            2.5,
            "handler-dir",
        ),
        rule(
            r"/handlers?/[^/]+\.(ts|js)$",
            None,
            "node-http",
            2.5,
            "handler-dir",
        ),
        rule(
            r"/handlers?/[^/]+\.rs$",
            None,
            "rust-http",
            2.5,
            "handler-dir",
        ),
        rule(r"/main\.go$", None, "go", 3.0, "main-entry"),
        rule(r"/main\.rs$", None, "rust", 3.0, "main-entry"),
        rule(r"/main\.c$", None, "c", 3.0, "main-entry"),
        rule(r"/main\.(cpp|cc|cxx)$", None, "cpp", 3.0, "main-entry"),
        rule(r"/main\.kt$", None, "kotlin", 3.0, "main-entry"),
        rule(r"/src/bin/[^/]+\.rs$", None, "rust", 2.5, "rust-bin"),
        rule(
            r"appdelegate\.swift$",
            None,
            "ios",
            3.0,
            "ios-app-delegate",
        ),
        rule(
            r"/viewcontrollers/[^/]+\.swift$",
            None,
            "uikit",
            2.5,
            "ios-view-controller",
        ),
        rule(
            r"viewcontroller\.swift$",
            None,
            "uikit",
            2.5,
            "ios-view-controller",
        ),
    ]
});

/// AST text patterns per language; matched as lowercase substrings against
/// the head of a definition.
static AST_RULES: &[(&str, &[(&str, &str, f64)])] = &[
    (
        "typescript",
        &[
            ("@controller", "nestjs", 3.2),
            ("@get(", "nestjs", 3.2),
            ("@post(", "nestjs", 3.2),
            ("@put(", "nestjs", 3.2),
            ("@delete(", "nestjs", 3.2),
            ("router.get", "express", 2.8),
            ("router.post", "express", 2.8),
            ("app.get(", "express", 2.8),
            ("app.post(", "express", 2.8),
            ("express()", "express", 2.5),
        ],
    ),
    (
        "javascript",
        &[
            ("router.get", "express", 2.8),
            ("router.post", "express", 2.8),
            ("app.get(", "express", 2.8),
            ("app.post(", "express", 2.8),
            ("express()", "express", 2.5),
        ],
    ),
    (
        "python",
        &[
            ("@app.get", "fastapi", 3.0),
            ("@app.post", "fastapi", 3.0),
            ("@router.", "fastapi", 3.0),
            ("@api_view", "django", 2.8),
        ],
    ),
    (
        "java",
        &[
            ("@restcontroller", "spring", 3.2),
            ("@getmapping", "spring", 3.0),
            ("@postmapping", "spring", 3.0),
            ("@requestmapping", "spring", 3.0),
        ],
    ),
    (
        "kotlin",
        &[
            ("@restcontroller", "spring", 3.2),
            ("@getmapping", "spring", 3.0),
            ("@postmapping", "spring", 3.0),
        ],
    ),
    (
        "csharp",
        &[
            ("[apicontroller]", "aspnet", 3.2),
            ("[httpget", "aspnet", 3.0),
            ("[httppost", "aspnet", 3.0),
        ],
    ),
    (
        "php",
        &[
            ("route::get", "laravel", 3.0),
            ("route::post", "laravel", 3.0),
        ],
    ),
    (
        "swift",
        &[("viewdidload", "uikit", 2.5), ("@main", "swiftui", 3.0)],
    ),
];

const AST_WINDOW: usize = 300;

/// Path-based framework hint; the first matching rule wins.
pub fn detect_from_path(path: &str) -> Option<FrameworkHint> {
    let mut normalized = normalize_path(path).to_lowercase();
    if !normalized.starts_with('/') {
        normalized.insert(0, '/');
    }

    for rule in PATH_RULES.iter() {
        if rule.pattern.is_match(&normalized) {
            if let Some(exclude) = &rule.exclude {
                if exclude.is_match(&normalized) {
                    continue;
                }
            }
            return Some(FrameworkHint {
                framework: rule.framework,
                entry_point_multiplier: rule.multiplier,
                reason: rule.reason,
            });
        }
    }
    None
}

/// AST-text framework hint for the subset of languages in the table.
pub fn detect_from_ast(language: &str, text: &str) -> Option<FrameworkHint> {
    let rules = AST_RULES
        .iter()
        .find(|(lang, _)| *lang == language)
        .map(|(_, rules)| *rules)?;

    let head: String = text.chars().take(AST_WINDOW).collect::<String>().to_lowercase();
    for (needle, framework, multiplier) in rules {
        if head.contains(needle) {
            return Some(FrameworkHint {
                framework,
                entry_point_multiplier: *multiplier,
                reason: needle,
            });
        }
    }
    None
}
