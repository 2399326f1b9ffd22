//! Import resolution against the set of indexed files.
//!
//! Specifiers are resolved without touching the filesystem: relative
//! specifiers are joined lexically against the importing file's directory,
//! everything else goes through a pre-built path-suffix index.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::indexer::walker::normalize_path;

/// fromFile -> resolved target files, in first-insertion order. The order
/// matters: call resolution breaks ties on the first matching import.
pub type ImportMap = IndexMap<String, Vec<String>>;

/// Extensions appended when a specifier omits one.
const EXTENSION_CANDIDATES: &[&str] = &[
    ".ts", ".tsx", ".js", ".jsx", ".py", ".go", ".rs", ".java", ".kt", ".cs", ".c", ".h", ".cpp",
    ".php", ".swift",
];

/// Index-file names tried for directory imports.
const INDEX_CANDIDATES: &[&str] = &["/index.ts", "/index.tsx", "/index.js", "/index.jsx"];

/// Immutable resolution context over the indexed file list, with a memoised
/// resolve cache.
pub struct ResolutionContext {
    all_file_paths: std::collections::HashSet<String>,
    suffix_index: HashMap<String, String>,
    resolve_cache: HashMap<(String, String), Option<String>>,
}

impl ResolutionContext {
    pub fn build(files: &[String]) -> Self {
        let mut all_file_paths = std::collections::HashSet::new();
        let mut suffix_index: HashMap<String, String> = HashMap::new();

        for file in files {
            let normalized = normalize_path(file);
            // Every path suffix maps to the file; on collision the first
            // indexed file wins.
            let segments: Vec<&str> = normalized.split('/').collect();
            for start in 0..segments.len() {
                let suffix = segments[start..].join("/");
                suffix_index.entry(suffix).or_insert_with(|| normalized.clone());
            }
            all_file_paths.insert(normalized);
        }

        Self {
            all_file_paths,
            suffix_index,
            resolve_cache: HashMap::new(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.all_file_paths.contains(path)
    }

    /// Resolves one import specifier from a file to an in-repo file path.
    /// Unresolvable specifiers (external packages, stdlib) yield None; that
    /// is not an error.
    pub fn resolve(&mut self, from_file: &str, specifier: &str) -> Option<String> {
        let key = (from_file.to_string(), specifier.to_string());
        if let Some(cached) = self.resolve_cache.get(&key) {
            return cached.clone();
        }
        let resolved = self.resolve_uncached(from_file, specifier);
        self.resolve_cache.insert(key, resolved.clone());
        resolved
    }

    fn resolve_uncached(&self, from_file: &str, specifier: &str) -> Option<String> {
        let specifier = normalize_path(specifier.trim());
        if specifier.is_empty() {
            return None;
        }

        if specifier.starts_with("./") || specifier.starts_with("../") {
            if let Some(hit) = self.resolve_relative(from_file, &specifier) {
                return Some(hit);
            }
        }

        self.resolve_by_suffix(&specifier)
    }

    fn resolve_relative(&self, from_file: &str, specifier: &str) -> Option<String> {
        let mut dir = parent_dir(&normalize_path(from_file));
        let mut rest = specifier;

        loop {
            if let Some(stripped) = rest.strip_prefix("./") {
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix("../") {
                dir = parent_dir(&dir);
                rest = stripped;
            } else {
                break;
            }
        }

        let joined = if dir.is_empty() {
            rest.to_string()
        } else {
            format!("{dir}/{rest}")
        };

        self.probe_candidates(&joined)
    }

    fn probe_candidates(&self, base: &str) -> Option<String> {
        if self.all_file_paths.contains(base) {
            return Some(base.to_string());
        }
        for ext in EXTENSION_CANDIDATES {
            let candidate = format!("{base}{ext}");
            if self.all_file_paths.contains(&candidate) {
                return Some(candidate);
            }
        }
        for index in INDEX_CANDIDATES {
            let candidate = format!("{base}{index}");
            if self.all_file_paths.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn resolve_by_suffix(&self, specifier: &str) -> Option<String> {
        let trimmed = specifier.trim_start_matches("./").trim_start_matches('/');

        if let Some(hit) = self.suffix_lookup(trimmed) {
            return Some(hit);
        }

        // Dotted module paths (python/java/kotlin) become path suffixes.
        if trimmed.contains('.') && !trimmed.contains('/') {
            let slashed = trimmed.replace('.', "/");
            if let Some(hit) = self.suffix_lookup(&slashed) {
                return Some(hit);
            }
        }

        None
    }

    fn suffix_lookup(&self, suffix: &str) -> Option<String> {
        if suffix.is_empty() {
            return None;
        }
        if let Some(hit) = self.suffix_index.get(suffix) {
            return Some(hit.clone());
        }
        for ext in EXTENSION_CANDIDATES {
            if let Some(hit) = self.suffix_index.get(&format!("{suffix}{ext}")) {
                return Some(hit.clone());
            }
        }
        None
    }
}

fn parent_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(files: &[&str]) -> ResolutionContext {
        let owned: Vec<String> = files.iter().map(|f| f.to_string()).collect();
        ResolutionContext::build(&owned)
    }

    #[test]
    fn test_relative_with_extension_probing() {
        let mut ctx = context(&["src/index.ts", "src/utils.ts"]);
        assert_eq!(
            ctx.resolve("src/index.ts", "./utils"),
            Some("src/utils.ts".to_string())
        );
    }

    #[test]
    fn test_relative_exact_path() {
        let mut ctx = context(&["src/a/b.py"]);
        assert_eq!(
            ctx.resolve("src/a/main.py", "./b.py"),
            Some("src/a/b.py".to_string())
        );
    }

    #[test]
    fn test_parent_relative() {
        let mut ctx = context(&["src/shared/util.ts", "src/feature/a.ts"]);
        assert_eq!(
            ctx.resolve("src/feature/a.ts", "../shared/util"),
            Some("src/shared/util.ts".to_string())
        );
    }

    #[test]
    fn test_directory_index_import() {
        let mut ctx = context(&["src/components/index.ts"]);
        assert_eq!(
            ctx.resolve("src/app.ts", "./components"),
            Some("src/components/index.ts".to_string())
        );
    }

    #[test]
    fn test_suffix_lookup() {
        let mut ctx = context(&["pkg/auth/login.go"]);
        assert_eq!(
            ctx.resolve("cmd/main.go", "example.com/app/pkg/auth/login.go"),
            None,
            "full foreign prefix does not match"
        );
        assert_eq!(
            ctx.resolve("cmd/main.go", "auth/login.go"),
            Some("pkg/auth/login.go".to_string())
        );
    }

    #[test]
    fn test_dotted_module_path() {
        let mut ctx = context(&["app/models/user.py"]);
        assert_eq!(
            ctx.resolve("app/views.py", "models.user"),
            Some("app/models/user.py".to_string())
        );
    }

    #[test]
    fn test_suffix_collision_first_wins() {
        let mut ctx = context(&["a/util.ts", "b/util.ts"]);
        assert_eq!(
            ctx.resolve("main.ts", "util.ts"),
            Some("a/util.ts".to_string())
        );
    }

    #[test]
    fn test_unresolved_external_package() {
        let mut ctx = context(&["src/app.ts"]);
        assert_eq!(ctx.resolve("src/app.ts", "react"), None);
        assert_eq!(ctx.resolve("src/app.ts", "std::collections::HashMap"), None);
    }

    #[test]
    fn test_backslash_specifier_normalised() {
        let mut ctx = context(&["app/Http/Controllers/UserController.php"]);
        assert_eq!(
            ctx.resolve(
                "routes/web.php",
                "App\\Http\\Controllers\\UserController"
            ),
            None,
            "namespace root differs from path casing"
        );
        assert_eq!(
            ctx.resolve("routes/web.php", "Http\\Controllers\\UserController"),
            Some("app/Http/Controllers/UserController.php".to_string())
        );
    }

    #[test]
    fn test_resolution_is_memoised() {
        let mut ctx = context(&["src/utils.ts"]);
        let first = ctx.resolve("src/index.ts", "./utils");
        let second = ctx.resolve("src/index.ts", "./utils");
        assert_eq!(first, second);
    }

    #[test]
    fn test_contains() {
        let ctx = context(&["src/a.ts"]);
        assert!(ctx.contains("src/a.ts"));
        assert!(!ctx.contains("src/b.ts"));
    }
}
