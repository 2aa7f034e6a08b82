//! Declarative user plugins.
//!
//! Each `*.json` file in the plugin directory describes one parser: its
//! metadata plus a `format` that maps onto the shared table, key/value or
//! regex machinery. Plugins shadow built-ins of the same name.

use crate::base_parser::{streaming, Entrypoint, ParseContext, Parser, RecordIter, StreamingParser};
use crate::descriptor::{ParserInfo, Platform, Tag};
use crate::streaming::{no_finish, LineDriver};
use crate::table::{simple_table, sparse_table};
use crate::types::{JcError, LineIter, ParserData};
use crate::utils::{self, normalize_header, normalize_key};
use crate::value::{Map, ParseValue};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable that overrides the plugin directory.
pub const PLUGIN_DIR_ENV: &str = "JC_PLUGIN_DIR";

/// `$JC_PLUGIN_DIR`, else `<user-config>/jc/jcparsers`.
pub fn plugin_dir() -> Option<PathBuf> {
    if let Some(dir) = env::var_os(PLUGIN_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join("jc").join("jcparsers"))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PluginFormat {
    SimpleTable,
    SparseTable,
    KeyValue {
        #[serde(default = "default_separator")]
        separator: String,
    },
    Regex {
        pattern: String,
    },
}

fn default_separator() -> String {
    "=".to_string()
}

fn default_version() -> String {
    "1.0".to_string()
}

/// On-disk plugin definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub compatible: Vec<Platform>,
    #[serde(default)]
    pub magic_commands: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub streaming: bool,
    pub format: PluginFormat,
    /// Fields converted to integers by the process step.
    #[serde(default)]
    pub integers: Vec<String>,
    #[serde(default)]
    pub floats: Vec<String>,
    #[serde(default)]
    pub booleans: Vec<String>,
}

/// Load every plugin in `dir`. Missing directories are not an error.
pub fn load_dir(dir: &Path) -> (Vec<Entrypoint>, Vec<JcError>) {
    let mut entries = Vec::new();
    let mut errors = Vec::new();

    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No plugin directory at {}", dir.display());
            return (entries, errors);
        }
        Err(e) => {
            errors.push(load_error(dir, e.to_string()));
            return (entries, errors);
        }
    };

    let mut paths: Vec<PathBuf> = read
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    for path in paths {
        match load_file(&path) {
            Ok(entry) => {
                info!("Loaded plugin parser from {}", path.display());
                entries.push(entry);
            }
            Err(e) => errors.push(e),
        }
    }
    (entries, errors)
}

/// Parse one plugin file into an entrypoint.
pub fn load_file(path: &Path) -> Result<Entrypoint, JcError> {
    let text = fs::read_to_string(path).map_err(|e| load_error(path, e.to_string()))?;
    let mut spec: PluginSpec =
        serde_json::from_str(&text).map_err(|e| load_error(path, e.to_string()))?;
    if spec.name.is_none() {
        spec.name = path.file_stem().map(|s| s.to_string_lossy().into_owned());
    }
    build(spec).map_err(|reason| load_error(path, reason))
}

fn load_error(path: &Path, reason: String) -> JcError {
    JcError::PluginLoad {
        path: path.display().to_string(),
        reason,
    }
}

fn build(spec: PluginSpec) -> Result<Entrypoint, String> {
    let name = spec.name.clone().unwrap_or_default();
    if name.trim().is_empty() {
        return Err("plugin has no name".to_string());
    }
    let regex = match &spec.format {
        PluginFormat::Regex { pattern } => {
            let re = Regex::new(pattern).map_err(|e| e.to_string())?;
            if re.capture_names().flatten().next().is_none() {
                return Err("regex format needs at least one named group".to_string());
            }
            Some(re)
        }
        PluginFormat::KeyValue { separator } if separator.is_empty() => {
            return Err("key_value separator must not be empty".to_string());
        }
        _ => None,
    };

    let line_oriented = matches!(
        spec.format,
        PluginFormat::Regex { .. } | PluginFormat::KeyValue { .. }
    );
    let wants_streaming = spec.streaming;
    let plugin = PluginParser { spec, regex };
    match (wants_streaming, line_oriented) {
        (false, _) => Ok(Entrypoint::from(plugin)),
        (true, true) => Ok(streaming(plugin)),
        (true, false) => Err("only regex and key_value plugins can stream".to_string()),
    }
}

/// A parser assembled from a [`PluginSpec`].
pub struct PluginParser {
    spec: PluginSpec,
    regex: Option<Regex>,
}

impl PluginParser {
    fn info(&self) -> ParserInfo {
        let spec = &self.spec;
        let mut info = ParserInfo::new(spec.name.as_deref().unwrap_or_default(), &spec.description)
            .version(&spec.version)
            .tags(&[Tag::Generic]);
        if let Some(author) = &spec.author {
            info = info.author(author, spec.author_email.as_deref().unwrap_or_default());
        }
        if !spec.compatible.is_empty() {
            info = info.compatible(&spec.compatible);
        }
        for m in &spec.magic_commands {
            info = info.magic(m);
        }
        for a in &spec.aliases {
            info = info.alias(a);
        }
        info
    }

    fn process(&self, record: &mut Map) {
        let ints: Vec<&str> = self.spec.integers.iter().map(String::as_str).collect();
        let floats: Vec<&str> = self.spec.floats.iter().map(String::as_str).collect();
        let bools: Vec<&str> = self.spec.booleans.iter().map(String::as_str).collect();
        utils::int_fields(record, &ints);
        utils::float_fields(record, &floats);
        utils::bool_fields(record, &bools);
    }

    fn match_line(&self, line: &str) -> Option<Map> {
        let re = self.regex.as_ref()?;
        let caps = re.captures(line)?;
        let mut record = Map::new();
        for name in re.capture_names().flatten() {
            let value = caps
                .name(name)
                .map(|m| ParseValue::from(m.as_str()))
                .unwrap_or(ParseValue::Null);
            record.insert(name, value);
        }
        Some(record)
    }

    fn pairs(&self, line: &str, separator: &str) -> Map {
        line.split_whitespace()
            .filter_map(|token| token.split_once(separator))
            .map(|(k, v)| (normalize_key(k), ParseValue::from(v)))
            .collect()
    }
}

impl Parser for PluginParser {
    fn info(&self) -> ParserInfo {
        PluginParser::info(self)
    }

    fn parse(&self, data: ParserData, ctx: &ParseContext<'_>) -> Result<ParseValue, JcError> {
        let text = data.text();
        let lines = utils::data_lines(&text);

        if let PluginFormat::KeyValue { separator } = &self.spec.format {
            let mut record = Map::new();
            for line in lines {
                match line.split_once(separator.as_str()) {
                    Some((k, v)) => {
                        record.insert(normalize_key(k), v.trim());
                    }
                    None => ctx.warn(&format!("Skipping line without separator: {}", line.trim())),
                }
            }
            if !ctx.raw() {
                self.process(&mut record);
            }
            return Ok(record.into());
        }

        let mut records = match &self.spec.format {
            PluginFormat::SimpleTable | PluginFormat::SparseTable if lines.is_empty() => Vec::new(),
            PluginFormat::SimpleTable | PluginFormat::SparseTable => {
                let mut table = lines.iter().map(|l| l.to_string()).collect::<Vec<_>>();
                table[0] = normalize_header(&table[0]);
                if matches!(self.spec.format, PluginFormat::SimpleTable) {
                    simple_table(&table)
                } else {
                    sparse_table(&table)
                }
            }
            _ => lines
                .iter()
                .filter_map(|line| {
                    let record = self.match_line(line);
                    if record.is_none() {
                        ctx.warn(&format!("Skipping unmatched line: {}", line.trim()));
                    }
                    record
                })
                .collect(),
        };

        if !ctx.raw() {
            records.iter_mut().for_each(|r| self.process(r));
        }
        Ok(records.into())
    }
}

impl StreamingParser for PluginParser {
    fn info(&self) -> ParserInfo {
        PluginParser::info(self)
    }

    fn parse_lines<'a>(
        &self,
        lines: LineIter<'a>,
        ctx: &ParseContext<'_>,
    ) -> Result<RecordIter<'a>, JcError> {
        let plugin = PluginParser {
            spec: self.spec.clone(),
            regex: self.regex.clone(),
        };
        Ok(Box::new(LineDriver::new(lines, (plugin, ctx.raw()), stream_step, no_finish)))
    }
}

fn stream_step(state: &mut (PluginParser, bool), line: &str) -> Result<Option<Map>, JcError> {
    let (plugin, raw) = (&state.0, state.1);
    if line.trim().is_empty() {
        return Ok(None);
    }
    let mut record = match &plugin.spec.format {
        PluginFormat::KeyValue { separator } => {
            let record = plugin.pairs(line, separator);
            if record.is_empty() {
                return Err(JcError::parse("Line has no key/value pairs"));
            }
            record
        }
        _ => plugin
            .match_line(line)
            .ok_or_else(|| JcError::parse("Line does not match the plugin pattern"))?,
    };
    if !raw {
        plugin.process(&mut record);
    }
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry_parser::ParserRegistry;
    use crate::types::{Input, ParseOptions};
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, file: &str, body: &str) {
        fs::write(dir.path().join(file), body).unwrap();
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let (entries, errors) = load_dir(Path::new("/definitely/not/here"));
        assert!(entries.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_table_plugin_name_from_file_stem() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "widgets.json",
            r#"{"description": "widget table", "format": {"type": "simple_table"}, "integers": ["count"]}"#,
        );
        let registry = ParserRegistry::with_plugins(dir.path());
        let handle = registry.resolve("widgets").unwrap();
        assert!(handle.info().plugin);

        let value = handle
            .parse(Input::from("NAME COUNT\nbolt 12\nnut x"), ParseOptions::default())
            .unwrap()
            .into_value()
            .unwrap();
        let rows = value.as_list().unwrap();
        assert_eq!(rows[0].get("count"), Some(&ParseValue::Int(12)));
        assert_eq!(rows[1].get("count"), Some(&ParseValue::Null));
    }

    #[test]
    fn test_bad_plugin_does_not_affect_others() {
        let dir = TempDir::new().unwrap();
        write(&dir, "broken.json", "{ not json");
        write(
            &dir,
            "good.json",
            r#"{"format": {"type": "key_value", "separator": ":"}}"#,
        );
        let mut registry = ParserRegistry::new();
        let errors = registry.load_plugins(dir.path());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), "PluginLoadError");
        assert!(errors[0].to_string().contains("broken.json"));

        let value = registry
            .parse("good", Input::from("Model Name: x1\nCores: 4"), ParseOptions::default())
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(value.get("model_name"), Some(&ParseValue::from("x1")));
    }

    #[test]
    fn test_plugin_shadows_builtin() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "free.json",
            r#"{"description": "my free", "format": {"type": "sparse_table"}}"#,
        );
        let registry = ParserRegistry::with_plugins(dir.path());
        let info = registry.describe("free").unwrap();
        assert!(info.plugin);
        assert_eq!(info.description, "my free");
    }

    #[test]
    fn test_streaming_regex_plugin() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "events.json",
            r#"{"streaming": true, "format": {"type": "regex", "pattern": "^(?P<level>[A-Z]+) (?P<code>\\d+)$"}, "integers": ["code"]}"#,
        );
        let registry = ParserRegistry::with_plugins(dir.path());
        let options = ParseOptions::quiet().with_ignore_exceptions(true);
        let records: Vec<_> = registry
            .parse("events", Input::lines_of("INFO 1\ngarbage\nWARN 2"), options)
            .unwrap()
            .into_stream()
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("code"), Some(&ParseValue::Int(1)));
        assert!(!records[1].is_success());
        assert_eq!(records[2].get("level"), Some(&ParseValue::from("WARN")));
    }

    #[test]
    fn test_streaming_table_plugin_rejected() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "t.json",
            r#"{"streaming": true, "format": {"type": "simple_table"}}"#,
        );
        let (entries, errors) = load_dir(dir.path());
        assert!(entries.is_empty());
        assert!(errors[0].to_string().contains("only regex and key_value"));
    }
}
