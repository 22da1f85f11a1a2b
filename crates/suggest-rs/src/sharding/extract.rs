//! Second streaming pass: pull the lines of selected prefix groups out of the
//! corpus by seeking straight to each group's byte span.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::index::BuildError;
use crate::item::Item;

use super::stats::PrefixGroup;
use super::PROGRESS_EVERY;

/// Read every non-blank line inside the spans of `groups` (visited in the
/// given order, file order within a span) and turn each into an [`Item`]
/// with `construct`. The first line that fails to construct aborts the
/// whole extraction.
pub fn extract_items<F>(
    path: impl AsRef<Path>,
    groups: &[&PrefixGroup],
    construct: F,
) -> Result<Vec<Item>, BuildError>
where
    F: Fn(&str) -> anyhow::Result<Item>,
{
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    let mut items: Vec<Item> = Vec::new();
    let mut buf: Vec<u8> = Vec::with_capacity(256);

    for group in groups {
        reader.seek(SeekFrom::Start(group.start_offset))?;
        let mut pos = group.start_offset;
        let mut line_in_span: u64 = 0;

        while pos <= group.end_offset {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            pos += n as u64;
            line_in_span += 1;

            let file_line = group.start_line + line_in_span - 1;

            let line = std::str::from_utf8(&buf).map_err(|e| BuildError::Parse {
                line: file_line,
                line_in_span,
                key: group.key.clone(),
                reason: format!("not valid UTF-8: {}", e),
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let item = construct(line).map_err(|e| BuildError::Parse {
                line: file_line,
                line_in_span,
                key: group.key.clone(),
                reason: e.to_string(),
            })?;
            items.push(item);

            if items.len() as u64 % PROGRESS_EVERY == 0 {
                tracing::info!("read {} lines", items.len());
            }
        }
        tracing::debug!(
            key = %group.key,
            lines = line_in_span,
            start = group.start_offset,
            end = group.end_offset,
            "extracted prefix group"
        );
    }
    Ok(items)
}
