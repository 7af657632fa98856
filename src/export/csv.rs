use std::path::{Path, PathBuf};

use super::{Dataset, RecordType};

/// `<dir>/<stem>_<type>.csv` for an export whose base path is `base`.
pub fn file_path(base: &Path, kind: RecordType) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "devtracker_export".to_string());
    base.with_file_name(format!("{stem}_{}.csv", kind.as_str()))
}

/// Header row plus one CRLF-terminated line per record.
pub fn to_bytes(dataset: &Dataset) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&dataset.columns.join(","));
    out.push_str("\r\n");

    for row in &dataset.rows {
        let line: Vec<String> = row.iter().map(|cell| escape(&cell.to_text())).collect();
        out.push_str(&line.join(","));
        out.push_str("\r\n");
    }

    out.into_bytes()
}

/// Quote a field when it holds a delimiter, quote or line break.
pub fn escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
