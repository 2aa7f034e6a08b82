//! Convert the text output of common commands, file formats and `/proc`
//! files into JSON-compatible values.
//!
//! ```
//! use jc::{ParseOptions, ParseValue};
//!
//! let out = jc::parse("proc_loadavg", "0.00 0.01 0.03 2/111 2039\n", ParseOptions::default())
//!     .unwrap()
//!     .into_value()
//!     .unwrap();
//! assert_eq!(out.get("running"), Some(&ParseValue::Int(2)));
//! ```

pub mod value;
pub mod types;
pub mod descriptor;
pub mod base_parser;
pub mod registry_parser;
pub mod dispatch;
pub mod streaming;
pub mod plugin;

// Shared helpers for parser implementations
pub mod utils;
pub mod table;

// Built-in parsers
pub mod parsers;

use std::sync::LazyLock;

// Re-export main types
pub use base_parser::{Entrypoint, ParseContext, Parser, StreamError, StreamingParser};
pub use descriptor::{Capability, ParserInfo, Platform, Tag};
pub use registry_parser::{ParserHandle, ParserRegistry};
pub use types::*;
pub use value::{Map, ParseValue};

static REGISTRY: LazyLock<ParserRegistry> = LazyLock::new(ParserRegistry::with_default_plugins);

/// The process-wide registry: built-ins plus user plugins, built on first use.
pub fn registry() -> &'static ParserRegistry {
    &REGISTRY
}

/// Parse `data` with the parser called `name`.
///
/// Batch parsers yield [`Output::Value`]; streaming parsers yield a lazy
/// [`Output::Stream`] that must be fed a line iterator ([`Input::lines_of`]).
pub fn parse<'a>(
    name: &str,
    data: impl Into<Input<'a>>,
    options: ParseOptions,
) -> Result<Output<'a>, JcError> {
    REGISTRY.parse(name, data.into(), options)
}

pub fn get_parser(name: &str) -> Result<ParserHandle<'static>, JcError> {
    REGISTRY.resolve(name)
}

/// Metadata for one parser; `documentation` keeps the docs block.
pub fn parser_info(name: &str, documentation: bool) -> Result<ParserInfo, JcError> {
    let info = REGISTRY.describe(name)?;
    Ok(if documentation { info } else { info.without_docs() })
}

/// Metadata for every visible parser, sorted by name.
pub fn all_parser_info(documentation: bool) -> Vec<ParserInfo> {
    let mut infos: Vec<ParserInfo> = REGISTRY
        .descriptors()
        .filter(|info| !info.hidden)
        .map(|info| if documentation { info.clone() } else { info.without_docs() })
        .collect();
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    infos
}

pub fn parser_mod_list() -> Vec<String> {
    REGISTRY.all_names()
}

pub fn plugin_parser_mod_list() -> Vec<String> {
    REGISTRY.names_with_capability(Capability::Plugin)
}

/// Built-in, visible, batch parsers.
pub fn standard_parser_mod_list() -> Vec<String> {
    REGISTRY.names_with_capability(Capability::Standard)
}

/// Built-in, visible, streaming parsers.
pub fn streaming_parser_mod_list() -> Vec<String> {
    builtin_visible(Capability::Streaming)
}

pub fn slurpable_parser_mod_list() -> Vec<String> {
    REGISTRY.names_with_capability(Capability::Slurpable)
}

fn builtin_visible(cap: Capability) -> Vec<String> {
    let mut names: Vec<String> = REGISTRY
        .descriptors()
        .filter(|info| info.has_capability(cap) && !info.hidden && !info.plugin)
        .map(|info| info.name.clone())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_info_strips_docs_unless_asked() {
        let info = parser_info("--ip-route", false).unwrap();
        assert_eq!(info.name, "ip_route");
        assert_eq!(info.argument, "--ip-route");
        assert!(info.documentation.is_none());
        assert!(parser_info("ip_route", true).unwrap().documentation.is_some());
        assert!(matches!(parser_info("nope", false), Err(JcError::ParserNotFound(_))));
    }

    #[test]
    fn test_all_parser_info_hides_proc_files() {
        let infos = all_parser_info(false);
        assert!(infos.iter().any(|i| i.name == "proc"));
        assert!(infos.iter().all(|i| !i.name.starts_with("proc_")));
        assert!(infos.iter().all(|i| i.documentation.is_none()));
    }

    #[test]
    fn test_get_parser_tolerates_spelling() {
        let handle = get_parser("Ping-S").unwrap();
        assert_eq!(handle.name(), "ping_s");
        assert!(handle.is_streaming());
    }

    #[test]
    fn test_streaming_list_contains_only_streaming_parsers() {
        let names = streaming_parser_mod_list();
        assert!(names.contains(&"ping_s".to_string()));
        for name in &names {
            assert!(get_parser(name).unwrap().is_streaming(), "{name}");
        }
    }
}
