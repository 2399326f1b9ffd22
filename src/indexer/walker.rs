use std::path::Path;

use ignore::WalkBuilder;

use crate::error::Result;

/// A file discovered under the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Repo-relative path with forward slashes.
    pub relative_path: String,
    pub size: u64,
}

/// Directory segments that are never descended into.
const IGNORED_DIRS: &[&str] = &[
    // version control / IDE
    ".git",
    ".svn",
    ".hg",
    ".bzr",
    ".idea",
    ".vscode",
    ".vs",
    // own analysis output
    ".codeatlas",
    // dependency and cache directories
    "node_modules",
    "vendor",
    "venv",
    ".venv",
    "__pycache__",
    "site-packages",
    ".mypy_cache",
    ".pytest_cache",
    // build outputs
    "dist",
    "build",
    "out",
    "output",
    "bin",
    "obj",
    "target",
    ".next",
    ".nuxt",
    ".vercel",
    ".parcel-cache",
    ".turbo",
    // test artefacts
    "coverage",
    "__tests__",
    "__mocks__",
    ".nyc_output",
];

const IGNORED_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "bmp", "tiff",
    // archives
    "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "jar",
    // native binaries
    "so", "dll", "dylib", "a", "o", "exe", "class", "wasm",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    // media
    "mp3", "mp4", "avi", "mov", "mkv", "wav", "flac", "ogg", "webm",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // databases and maps
    "db", "sqlite", "sqlite3", "map",
    // lock artefacts and certificates
    "lock", "pem", "crt", "cer",
    // data files
    "csv", "tsv", "parquet", "jsonl", "log",
];

const IGNORED_FILENAMES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "composer.lock",
    "Cargo.lock",
    "go.sum",
    ".DS_Store",
    "Thumbs.db",
    ".gitignore",
    ".gitattributes",
    ".editorconfig",
    ".prettierrc",
    ".eslintrc",
    "CHANGELOG.md",
];

const IGNORED_FILENAME_PREFIXES: &[&str] = &["LICENSE", ".env"];

const IGNORED_COMPOUND_SUFFIXES: &[&str] =
    &[".min.js", ".min.css", ".bundle.js", ".chunk.js", ".d.ts"];

/// Normalises backslashes to forward slashes for matching and reporting.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Walks a repository root applying the fixed ignore policy. Language
/// gating happens later in the pipeline; the walker only knows which
/// entries can never hold source.
pub struct FileWalker {
    case_insensitive: bool,
}

impl FileWalker {
    pub fn new() -> Self {
        Self {
            // Case-insensitive comparison on platforms whose filesystems
            // usually are.
            case_insensitive: cfg!(any(windows, target_os = "macos")),
        }
    }

    pub fn walk(&self, root: &Path) -> Result<Vec<WalkedFile>> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let relative = match path.strip_prefix(root) {
                Ok(rel) => normalize_path(&rel.to_string_lossy()),
                Err(_) => continue,
            };
            if self.is_ignored(&relative) {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(WalkedFile {
                relative_path: relative,
                size,
            });
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }

    /// Applies the ignore policy to a repo-relative, slash-normalised path.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        let path = normalize_path(relative_path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((file_name, dir_segments)) = segments.split_last() else {
            return true;
        };

        for seg in dir_segments {
            if IGNORED_DIRS.iter().any(|d| self.eq(seg, d)) {
                return true;
            }
        }

        if IGNORED_FILENAMES.iter().any(|f| self.eq(file_name, f)) {
            return true;
        }
        if IGNORED_FILENAME_PREFIXES
            .iter()
            .any(|p| self.starts_with(file_name, p))
        {
            return true;
        }

        let lower_name = file_name.to_lowercase();
        if IGNORED_COMPOUND_SUFFIXES
            .iter()
            .any(|s| lower_name.ends_with(s))
            || lower_name.contains(".generated.")
        {
            return true;
        }

        if let Some(ext) = lower_name.rsplit('.').next() {
            if ext != lower_name && IGNORED_EXTENSIONS.contains(&ext) {
                return true;
            }
        }

        false
    }

    fn eq(&self, a: &str, b: &str) -> bool {
        if self.case_insensitive {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    }

    fn starts_with(&self, s: &str, prefix: &str) -> bool {
        if self.case_insensitive {
            s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix)
        } else {
            s.starts_with(prefix)
        }
    }
}

impl Default for FileWalker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_walk_reports_relative_paths_and_sizes() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "src/main.rs", "fn main() {}");

        let walker = FileWalker::new();
        let files = walker.walk(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "src/main.rs");
        assert_eq!(files[0].size, "fn main() {}".len() as u64);
    }

    #[test]
    fn test_walk_sorted_by_path() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "b.ts", "");
        create_file(temp_dir.path(), "a.ts", "");
        create_file(temp_dir.path(), "src/c.ts", "");

        let walker = FileWalker::new();
        let files = walker.walk(temp_dir.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["a.ts", "b.ts", "src/c.ts"]);
    }

    #[test]
    fn test_walk_skips_dependency_dirs() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "src/app.ts", "const x = 1;");
        create_file(temp_dir.path(), "node_modules/lib/index.js", "x");
        create_file(temp_dir.path(), "dist/bundle.js", "x");
        create_file(temp_dir.path(), "__pycache__/mod.pyc", "x");

        let walker = FileWalker::new();
        let files = walker.walk(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "src/app.ts");
    }

    #[test]
    fn test_walk_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let walker = FileWalker::new();
        let files = walker.walk(temp_dir.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_ignored_vcs_and_ide_dirs() {
        let walker = FileWalker::new();
        assert!(walker.is_ignored(".git/config"));
        assert!(walker.is_ignored(".idea/workspace.xml"));
        assert!(walker.is_ignored("sub/.vscode/settings.json"));
        assert!(!walker.is_ignored("src/app.ts"));
    }

    #[test]
    fn test_ignored_build_outputs() {
        let walker = FileWalker::new();
        assert!(walker.is_ignored("target/debug/foo.rs"));
        assert!(walker.is_ignored("app/.next/chunk.js"));
        assert!(walker.is_ignored("web/.turbo/cache.bin"));
    }

    #[test]
    fn test_ignored_extensions() {
        let walker = FileWalker::new();
        assert!(walker.is_ignored("assets/logo.png"));
        assert!(walker.is_ignored("docs/manual.pdf"));
        assert!(walker.is_ignored("sounds/beep.mp3"));
        assert!(walker.is_ignored("data/export.csv"));
        assert!(walker.is_ignored("bundle.js.map"));
    }

    #[test]
    fn test_ignored_lock_files_and_dotfiles() {
        let walker = FileWalker::new();
        assert!(walker.is_ignored("package-lock.json"));
        assert!(walker.is_ignored("yarn.lock"));
        assert!(walker.is_ignored("Cargo.lock"));
        assert!(walker.is_ignored("go.sum"));
        assert!(walker.is_ignored(".env"));
        assert!(walker.is_ignored(".env.local"));
        assert!(walker.is_ignored("LICENSE"));
        assert!(walker.is_ignored("LICENSE.md"));
        assert!(walker.is_ignored("CHANGELOG.md"));
    }

    #[test]
    fn test_ignored_compound_suffixes() {
        let walker = FileWalker::new();
        assert!(walker.is_ignored("lib/jquery.min.js"));
        assert!(walker.is_ignored("styles/site.min.css"));
        assert!(walker.is_ignored("app.bundle.js"));
        assert!(walker.is_ignored("vendor.chunk.js"));
        assert!(walker.is_ignored("api.generated.ts"));
        assert!(walker.is_ignored("types.d.ts"));
        assert!(!walker.is_ignored("minify.js"));
    }

    #[test]
    fn test_backslashes_normalised_before_matching() {
        let walker = FileWalker::new();
        assert!(walker.is_ignored("src\\node_modules\\lib\\a.js"));
        assert!(!walker.is_ignored("src\\app.ts"));
    }

    #[test]
    fn test_test_artefact_dirs() {
        let walker = FileWalker::new();
        assert!(walker.is_ignored("src/__tests__/app.test.ts"));
        assert!(walker.is_ignored("coverage/lcov.info"));
        assert!(walker.is_ignored(".nyc_output/out.json"));
    }
}
