//! Small helpers shared by the parsers: warnings, type coercion and key
//! normalisation.

use crate::descriptor::{ParserInfo, Platform};
use crate::value::{Map, ParseValue};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Write warning lines to the diagnostic stream unless `quiet`.
pub fn warning_message(quiet: bool, lines: &[&str]) {
    if quiet {
        return;
    }
    for line in lines {
        warn!("{}", line);
    }
}

/// Warn when the running platform is not in the parser's compatibility list.
/// Returns `true` when a warning applied.
pub fn compatibility(info: &ParserInfo, quiet: bool) -> bool {
    let Some(current) = Platform::current() else {
        return false;
    };
    if info.is_compatible_with(current) {
        return false;
    }
    let supported = info
        .compatible
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    warning_message(
        quiet,
        &[&format!(
            "{} parser is not compatible with your OS ({}). Compatible platforms: {}",
            info.name, current, supported
        )],
    );
    true
}

/// `true` when the input has any non-whitespace content.
pub fn has_data(data: &str) -> bool {
    !data.trim().is_empty()
}

/// Non-blank lines of the input, in order.
pub fn data_lines(data: &str) -> Vec<&str> {
    data.lines().filter(|l| !l.trim().is_empty()).collect()
}

static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9\-.]").expect("static regex must compile"));

/// Convert a string to an integer, tolerating thousands separators and
/// trailing units. Floats are truncated.
pub fn convert_to_int(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    let cleaned = NON_NUMERIC.replace_all(trimmed, "");
    if let Ok(n) = cleaned.parse::<i64>() {
        return Some(n);
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
}

pub fn convert_to_float(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if let Ok(f) = trimmed.parse::<f64>() {
        return Some(f);
    }
    NON_NUMERIC.replace_all(trimmed, "").parse::<f64>().ok()
}

/// `y`, `yes`, `true`, `*` and non-zero numbers are true; `n`, `no`,
/// `false` and zero are false.
pub fn convert_to_bool(value: &str) -> Option<bool> {
    let v = value.trim().to_lowercase();
    match v.as_str() {
        "y" | "yes" | "true" | "*" | "on" => Some(true),
        "n" | "no" | "false" | "off" => Some(false),
        _ => v.parse::<f64>().ok().map(|f| f != 0.0),
    }
}

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9]*\.?[0-9]+)\s*([a-zA-Z]*)\s*$").expect("static regex must compile")
});

/// Convert a human-readable size (`1G`, `1.5 KiB`, `0B`, `2048`) to bytes.
///
/// Units with an `i` (`KiB`) are always binary; bare units follow `binary`.
pub fn convert_size_to_int(size: &str, binary: bool) -> Option<i64> {
    let caps = SIZE_RE.captures(size)?;
    let number: f64 = caps[1].parse().ok()?;
    let unit = &caps[2];
    if unit.is_empty() {
        return Some(number as i64);
    }
    let mut chars = unit.chars();
    let prefix = chars.next()?.to_ascii_uppercase();
    let exponent = match prefix {
        'B' => 0,
        'K' => 1,
        'M' => 2,
        'G' => 3,
        'T' => 4,
        'P' => 5,
        'E' => 6,
        'Z' => 7,
        'Y' => 8,
        _ => return None,
    };
    let base: f64 = if binary || unit.to_lowercase().contains('i') {
        1024.0
    } else {
        1000.0
    };
    Some((number * base.powi(exponent)).round() as i64)
}

/// Lowercase a header or key and collapse non-word runs to `_`.
pub fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut last_underscore = false;
    for ch in key.trim().chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    out.trim_matches('_').to_string()
}

/// Header substitutions applied by table-based parsers before calling the
/// tabular primitives: lowercase, `%` → `percent_`, `-` and `/` → `_`.
pub fn normalize_header(header: &str) -> String {
    header
        .to_lowercase()
        .replace('%', "percent_")
        .replace(['-', '/'], "_")
}

fn map_str(value: &ParseValue, f: impl FnOnce(&str) -> ParseValue) -> ParseValue {
    match value {
        ParseValue::String(s) => f(s),
        other => other.clone(),
    }
}

/// Convert the string values at `keys` to integers (null when unparsable).
pub fn int_fields(map: &mut Map, keys: &[&str]) {
    for key in keys {
        map.update(key, |v| map_str(v, |s| convert_to_int(s).into()));
    }
}

pub fn float_fields(map: &mut Map, keys: &[&str]) {
    for key in keys {
        map.update(key, |v| map_str(v, |s| convert_to_float(s).into()));
    }
}

pub fn bool_fields(map: &mut Map, keys: &[&str]) {
    for key in keys {
        map.update(key, |v| map_str(v, |s| convert_to_bool(s).into()));
    }
}

/// Convert every string value that parses cleanly as an integer.
pub fn int_values(map: &mut Map) {
    for (_, v) in map.iter_mut() {
        if let ParseValue::String(s) = v {
            if let Ok(n) = s.trim().parse::<i64>() {
                *v = ParseValue::Int(n);
            }
        }
    }
}
