//! Per-label tabular files for graph-engine bulk load.
//!
//! Every node label gets its own file with a fixed column order. Textual
//! fields are quoted with inner quotes doubled; list elements escape
//! backslashes and commas; text is sanitised before it reaches disk and
//! binary-looking content is elided entirely.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::storage::{Field, Row, StorageWriter};

/// Share of non-printable code units (over the first 1000) past which a
/// string is treated as binary.
const BINARY_THRESHOLD: f64 = 0.10;
const BINARY_SAMPLE: usize = 1000;

pub fn is_binary(text: &str) -> bool {
    let mut total = 0usize;
    let mut non_printable = 0usize;
    for c in text.chars().take(BINARY_SAMPLE) {
        total += 1;
        if is_non_printable(c) {
            non_printable += 1;
        }
    }
    total > 0 && (non_printable as f64 / total as f64) > BINARY_THRESHOLD
}

fn is_non_printable(c: char) -> bool {
    c.is_control() && c != '\n' && c != '\r' && c != '\t'
}

/// Normalises CRLF to LF, strips BOM code points and non-printable bytes.
/// Binary-classified input is elided to an empty string.
pub fn sanitize_text(text: &str) -> String {
    if is_binary(text) {
        return String::new();
    }
    text.replace("\r\n", "\n")
        .chars()
        .filter(|&c| c != '\u{FEFF}' && !is_non_printable(c) && c != '\r')
        .collect()
}

/// Escapes one array element: backslashes first, then commas.
pub fn escape_list_element(element: &str) -> String {
    element.replace('\\', "\\\\").replace(',', "\\,")
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

pub fn field_to_csv(field: &Field) -> String {
    match field {
        Field::Str(s) => quote(&sanitize_text(s)),
        Field::Int(i) => i.to_string(),
        Field::Float(f) => f.to_string(),
        Field::Bool(b) => b.to_string(),
        Field::List(items) => {
            let joined = items
                .iter()
                .map(|item| escape_list_element(&sanitize_text(item)))
                .collect::<Vec<_>>()
                .join(",");
            quote(&joined)
        }
    }
}

fn row_to_line(row: &Row) -> String {
    row.0
        .iter()
        .map(field_to_csv)
        .collect::<Vec<_>>()
        .join(",")
}

/// Writes one tabular file per node label plus a relationships file into a
/// target directory.
pub struct CsvBulkWriter {
    dir: PathBuf,
}

impl CsvBulkWriter {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn write_file(&self, name: &str, header: &[&str], rows: &[Row]) -> Result<()> {
        let mut out = String::new();
        out.push_str(&header.join(","));
        out.push('\n');
        for row in rows {
            out.push_str(&row_to_line(row));
            out.push('\n');
        }
        fs::write(self.dir.join(name), out)?;
        Ok(())
    }
}

impl StorageWriter for CsvBulkWriter {
    fn write_nodes(&mut self, label: &str, header: &[&str], rows: &[Row]) -> Result<()> {
        self.write_file(&format!("{label}.csv"), header, rows)
    }

    fn write_relationships(&mut self, header: &[&str], rows: &[Row]) -> Result<()> {
        self.write_file("relationships.csv", header, rows)
    }

    fn create_index(&mut self, _kind: &str, _params: &str) -> Result<()> {
        // bulk files are indexed by the consuming graph engine at load time
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_quote_doubles_inner_quotes() {
        assert_eq!(
            field_to_csv(&Field::Str("say \"hi\"".to_string())),
            "\"say \"\"hi\"\"\""
        );
    }

    #[test]
    fn test_list_escaping() {
        let field = Field::List(vec![
            "auth".to_string(),
            "login".to_string(),
            "pass,word".to_string(),
        ]);
        let csv = field_to_csv(&field);
        assert!(csv.contains("pass\\,word"), "got {csv}");
        assert_eq!(csv, "\"auth,login,pass\\,word\"");
    }

    #[test]
    fn test_list_backslash_escaped_before_comma() {
        let field = Field::List(vec!["a\\b,c".to_string()]);
        assert_eq!(field_to_csv(&field), "\"a\\\\b\\,c\"");
    }

    #[test]
    fn test_numeric_and_bool_fields() {
        assert_eq!(field_to_csv(&Field::Int(-1)), "-1");
        assert_eq!(field_to_csv(&Field::Float(0.85)), "0.85");
        assert_eq!(field_to_csv(&Field::Bool(false)), "false");
    }

    #[test]
    fn test_sanitize_crlf_and_bom() {
        assert_eq!(sanitize_text("a\r\nb"), "a\nb");
        assert_eq!(sanitize_text("\u{FEFF}hello"), "hello");
        assert_eq!(sanitize_text("a\x00b\x07c"), "abc");
        assert_eq!(sanitize_text("tab\tok"), "tab\tok");
    }

    #[test]
    fn test_binary_detection_elides() {
        let mut binary = String::new();
        for _ in 0..200 {
            binary.push('\x00');
            binary.push('a');
        }
        assert!(is_binary(&binary));
        assert_eq!(sanitize_text(&binary), "");

        assert!(!is_binary("ordinary source text\nwith lines"));
    }

    #[test]
    fn test_writer_produces_per_label_files() {
        let dir = TempDir::new().unwrap();
        let mut writer = CsvBulkWriter::new(dir.path()).unwrap();

        writer
            .write_nodes(
                "Function",
                &["id", "label", "name"],
                &[Row(vec![
                    Field::Str("Function:a.ts:f".into()),
                    Field::Str("Function".into()),
                    Field::Str("f".into()),
                ])],
            )
            .unwrap();
        writer
            .write_relationships(
                &["id", "type", "sourceId", "targetId"],
                &[Row(vec![
                    Field::Str("a-CALLS-b".into()),
                    Field::Str("CALLS".into()),
                    Field::Str("a".into()),
                    Field::Str("b".into()),
                ])],
            )
            .unwrap();

        let functions = std::fs::read_to_string(dir.path().join("Function.csv")).unwrap();
        assert!(functions.starts_with("id,label,name\n"));
        assert!(functions.contains("\"Function:a.ts:f\""));

        let rels = std::fs::read_to_string(dir.path().join("relationships.csv")).unwrap();
        assert!(rels.contains("\"a-CALLS-b\""));
    }
}
