//! Header-plus-rows table primitives.
//!
//! Both functions are pure: they never coerce types and only produce string
//! or null cells. Callers normalise the header line before calling.

use crate::value::{Map, ParseValue};

/// Parse a table whose data rows are whitespace-separated like the header.
///
/// The first line is the header. When a row has more tokens than the header
/// the last column absorbs the remainder (inner spacing preserved); when it
/// has fewer, the missing trailing columns are null. Blank rows are skipped.
pub fn simple_table<S: AsRef<str>>(lines: &[S]) -> Vec<Map> {
    let Some((header, rows)) = lines.split_first() else {
        return Vec::new();
    };
    let headers: Vec<&str> = header.as_ref().split_whitespace().collect();
    if headers.is_empty() {
        return Vec::new();
    }

    rows.iter()
        .map(|row| row.as_ref())
        .filter(|row| !row.trim().is_empty())
        .map(|row| {
            let cells = split_max(row, headers.len());
            let mut record = Map::with_capacity(headers.len());
            for (i, key) in headers.iter().enumerate() {
                let value = cells
                    .get(i)
                    .map(|c| ParseValue::String(c.to_string()))
                    .unwrap_or(ParseValue::Null);
                record.insert(*key, value);
            }
            record
        })
        .collect()
}

/// Split on whitespace into at most `n` fields; the last keeps the rest of the line.
fn split_max(line: &str, n: usize) -> Vec<&str> {
    let mut fields = Vec::with_capacity(n);
    let mut rest = line.trim();
    while !rest.is_empty() {
        if fields.len() + 1 == n {
            fields.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                fields.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                fields.push(rest);
                break;
            }
        }
    }
    fields
}

/// Parse a table whose columns are aligned to the header positions.
///
/// Column `i` spans from the start of header token `i` to the start of
/// token `i + 1`; the last column runs to end of line. Blank or missing
/// cells are null. Positions are counted in characters, not bytes.
pub fn sparse_table<S: AsRef<str>>(lines: &[S]) -> Vec<Map> {
    let Some((header, rows)) = lines.split_first() else {
        return Vec::new();
    };
    let columns = column_spans(header.as_ref());
    if columns.is_empty() {
        return Vec::new();
    }

    rows.iter()
        .map(|row| row.as_ref())
        .filter(|row| !row.trim().is_empty())
        .map(|row| {
            let chars: Vec<char> = row.chars().collect();
            let mut record = Map::with_capacity(columns.len());
            for (i, (name, start)) in columns.iter().enumerate() {
                let end = columns
                    .get(i + 1)
                    .map(|(_, next)| *next)
                    .unwrap_or(chars.len())
                    .min(chars.len());
                let cell: String = if *start < end {
                    chars[*start..end].iter().collect()
                } else {
                    String::new()
                };
                record.insert(name.as_str(), ParseValue::non_empty(&cell));
            }
            record
        })
        .collect()
}

/// Header tokens with their starting character index.
fn column_spans(header: &str) -> Vec<(String, usize)> {
    let mut spans = Vec::new();
    let mut current: Option<(String, usize)> = None;
    for (idx, ch) in header.chars().enumerate() {
        if ch.is_whitespace() {
            if let Some(span) = current.take() {
                spans.push(span);
            }
        } else {
            match current.as_mut() {
                Some((name, _)) => name.push(ch),
                None => current = Some((ch.to_string(), idx)),
            }
        }
    }
    if let Some(span) = current {
        spans.push(span);
    }
    spans
}
