#![allow(dead_code)]
use std::path::{Path, PathBuf};
pub use tempfile;

use suggest_rs::{Item, SuggestIndex, SuggestIndexBuilder};

/// Create a temporary directory for corpus and shard files.
pub fn new_workdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create tempdir")
}

/// Write `lines` joined by '\n' (with a trailing newline) and return the path.
pub fn write_corpus(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let p = dir.join(name);
    let mut body = lines.join("\n");
    body.push('\n');
    std::fs::write(&p, body).expect("write corpus");
    p
}

/// Build an index from plain lines with a pinned version.
pub fn index_of(lines: &[&str], version: u64) -> SuggestIndex {
    let items = lines
        .iter()
        .map(|l| Item::parse(l).expect("parse item"))
        .collect();
    SuggestIndexBuilder::new(items).version(version).build()
}

/// Bytes of `path` covered by the inclusive span.
pub fn span_text(path: &Path, start: u64, end: u64) -> String {
    let bytes = std::fs::read(path).expect("read corpus");
    String::from_utf8(bytes[start as usize..=end as usize].to_vec()).expect("utf8")
}
