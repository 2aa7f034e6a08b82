use crate::base_parser::Entrypoint;
use crate::descriptor::{normalize_name, Capability, ParserInfo};
use crate::parsers::all_parsers;
use crate::plugin;
use crate::types::{Input, JcError, Output, ParseOptions};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// A registered parser: metadata plus its one entrypoint.
pub struct ParserDescriptor {
    pub(crate) info: ParserInfo,
    pub(crate) entrypoint: Entrypoint,
    deprecation_warned: AtomicBool,
}

impl ParserDescriptor {
    fn new(entrypoint: Entrypoint, plugin: bool) -> Result<Self, JcError> {
        let mut info = entrypoint.info();
        info.name = normalize_name(&info.name);
        info.argument = crate::descriptor::argument_for(&info.name);
        info.streaming = entrypoint.is_streaming();
        info.plugin = plugin;
        if info.name.is_empty() {
            return Err(JcError::parse("parser name must not be empty"));
        }
        if info.slurpable && (info.streaming || info.binary_input_allowed) {
            return Err(JcError::parse(format!(
                "{}: slurpable parsers must be batch, text-only parsers",
                info.name
            )));
        }
        Ok(Self {
            info,
            entrypoint,
            deprecation_warned: AtomicBool::new(false),
        })
    }

    pub fn info(&self) -> &ParserInfo {
        &self.info
    }

    /// Warn once per registry that a deprecated parser was used.
    pub(crate) fn warn_if_deprecated(&self, quiet: bool) {
        if !self.info.deprecated || quiet {
            return;
        }
        if !self.deprecation_warned.swap(true, Ordering::Relaxed) {
            warn!(
                "{} parser is deprecated and may be removed in a future version",
                self.info.name
            );
        }
    }
}

/// ParserRegistry - the single source of truth for which parsers exist
///
/// ## Adding a New Parser
///
/// Built-in parsers are listed in `parsers.rs`; this file does not change
/// when a parser is added. User plugins are loaded by `with_plugins`.
pub struct ParserRegistry {
    parsers: Vec<ParserDescriptor>,
    /// Normalised name or alias -> index into `parsers`.
    index: HashMap<String, usize>,
}

impl ParserRegistry {
    /// Create a registry with every built-in parser from `parsers::all_parsers()`.
    pub fn new() -> Self {
        info!("Initializing ParserRegistry");
        let mut registry = Self::empty();
        for entry in all_parsers() {
            if let Err(e) = registry.register(entry) {
                warn!("Skipping built-in parser: {}", e);
            }
        }

        info!(
            "Registered {} parsers: {}",
            registry.parsers.len(),
            registry.all_names().join(", ")
        );

        registry
    }

    /// Registry with no parsers at all.
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Built-ins plus every plugin found in `dir`. Plugin failures are
    /// reported as warnings and never affect other parsers.
    pub fn with_plugins(dir: &Path) -> Self {
        let mut registry = Self::new();
        registry.load_plugins(dir);
        registry
    }

    /// Built-ins plus plugins from the default per-user plugin directory.
    pub fn with_default_plugins() -> Self {
        match plugin::plugin_dir() {
            Some(dir) => Self::with_plugins(&dir),
            None => Self::new(),
        }
    }

    /// Load plugins from `dir`, returning the errors of files that failed.
    pub fn load_plugins(&mut self, dir: &Path) -> Vec<JcError> {
        let (entries, mut errors) = plugin::load_dir(dir);
        for entry in entries {
            if let Err(e) = self.register_plugin(entry) {
                errors.push(e);
            }
        }
        for e in &errors {
            warn!("{}", e);
        }
        errors
    }

    /// Register a built-in parser. A parser with the same name is replaced in place.
    pub fn register(&mut self, entry: impl Into<Entrypoint>) -> Result<(), JcError> {
        self.insert(ParserDescriptor::new(entry.into(), false)?);
        Ok(())
    }

    /// Register a plugin parser; it shadows any built-in of the same name.
    pub fn register_plugin(&mut self, entry: impl Into<Entrypoint>) -> Result<(), JcError> {
        self.insert(ParserDescriptor::new(entry.into(), true)?);
        Ok(())
    }

    fn insert(&mut self, descriptor: ParserDescriptor) {
        let name = descriptor.info.name.clone();
        debug!("Registering parser: {}", name);
        match self.parsers.iter().position(|p| p.info.name == name) {
            Some(pos) => {
                info!("Parser '{}' replaced by a later registration", name);
                self.parsers[pos] = descriptor;
            }
            None => self.parsers.push(descriptor),
        }
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, p) in self.parsers.iter().enumerate() {
            for alias in &p.info.aliases {
                self.index.entry(normalize_name(alias)).or_insert(i);
            }
        }
        for (i, p) in self.parsers.iter().enumerate() {
            self.index.insert(p.info.name.clone(), i);
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&ParserDescriptor> {
        self.index.get(&normalize_name(name)).map(|&i| &self.parsers[i])
    }

    /// Every registered name, sorted.
    pub fn all_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.parsers.iter().map(|p| p.info.name.clone()).collect();
        names.sort();
        names
    }

    /// Sorted names of parsers with the given capability.
    pub fn names_with_capability(&self, cap: Capability) -> Vec<String> {
        let mut names: Vec<String> = self
            .parsers
            .iter()
            .filter(|p| p.info.has_capability(cap))
            .map(|p| p.info.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Resolve a user-supplied name. Case, `-`/`_` and aliases are tolerated.
    pub fn resolve(&self, name: &str) -> Result<ParserHandle<'_>, JcError> {
        debug!("Looking up parser by name: {}", name);
        match self.lookup(name) {
            Some(descriptor) => Ok(ParserHandle {
                registry: self,
                descriptor,
            }),
            None => {
                debug!("Parser not found: {}", name);
                Err(JcError::ParserNotFound(name.to_string()))
            }
        }
    }

    /// Read-only metadata for a parser, documentation included.
    pub fn describe(&self, name: &str) -> Result<ParserInfo, JcError> {
        self.lookup(name)
            .map(|d| d.info.clone())
            .ok_or_else(|| JcError::ParserNotFound(name.to_string()))
    }

    /// Metadata for every parser in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ParserInfo> {
        self.parsers.iter().map(|p| &p.info)
    }

    /// Find the parser whose magic command is the longest prefix of `argv`.
    ///
    /// The first token is compared by basename (`/usr/bin/free` matches
    /// `free`). A magic command ending in `/` matches any first token that
    /// starts with it. Ties go to the earliest registration.
    pub fn resolve_by_magic<S: AsRef<str>>(&self, argv: &[S]) -> Option<ParserHandle<'_>> {
        let first = argv.first()?.as_ref();
        let basename = Path::new(first)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(first);

        let mut best: Option<(usize, &ParserDescriptor)> = None;
        for descriptor in &self.parsers {
            for tokens in descriptor.info.magic_tokens() {
                let matched = match tokens.as_slice() {
                    [] => 0,
                    [prefix] if prefix.ends_with('/') => usize::from(first.starts_with(prefix)),
                    [head, rest @ ..] => {
                        let head_ok = *head == basename || *head == first;
                        let rest_ok = rest.len() < argv.len()
                            && rest
                                .iter()
                                .zip(&argv[1..])
                                .all(|(want, got)| *want == got.as_ref());
                        if head_ok && rest_ok {
                            tokens.len()
                        } else {
                            0
                        }
                    }
                };
                if matched > 0 && best.map_or(true, |(len, _)| matched > len) {
                    best = Some((matched, descriptor));
                }
            }
        }

        best.map(|(_, descriptor)| {
            debug!("Magic command resolved to parser: {}", descriptor.info.name);
            ParserHandle {
                registry: self,
                descriptor,
            }
        })
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed handle to a registered parser.
#[derive(Clone, Copy)]
pub struct ParserHandle<'r> {
    registry: &'r ParserRegistry,
    descriptor: &'r ParserDescriptor,
}

impl<'r> ParserHandle<'r> {
    pub fn name(&self) -> &'r str {
        &self.descriptor.info.name
    }

    pub fn info(&self) -> &'r ParserInfo {
        &self.descriptor.info
    }

    pub fn is_streaming(&self) -> bool {
        self.descriptor.info.streaming
    }

    /// Run this parser through the dispatch pipeline.
    pub fn parse<'a>(&self, input: Input<'a>, options: ParseOptions) -> Result<Output<'a>, JcError> {
        self.registry.invoke(self.descriptor, input, options)
    }
}

impl std::fmt::Debug for ParserHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserHandle")
            .field("name", &self.descriptor.info.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_parser::{ParseContext, Parser};
    use crate::types::ParserData;
    use crate::value::ParseValue;

    struct Fixed {
        name: &'static str,
        magic: &'static [&'static str],
    }

    impl Parser for Fixed {
        fn info(&self) -> ParserInfo {
            let mut info = ParserInfo::new(self.name, "test parser").alias("fixed-alias");
            for m in self.magic {
                info = info.magic(m);
            }
            info
        }

        fn parse(&self, _: ParserData, _: &ParseContext<'_>) -> Result<ParseValue, JcError> {
            Ok(ParseValue::from(self.name))
        }
    }

    #[test]
    fn test_all_names_sorted_unique_and_resolvable() {
        let registry = ParserRegistry::new();
        let names = registry.all_names();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
        for name in &names {
            assert_eq!(registry.resolve(name).unwrap().name(), name);
        }
    }

    #[test]
    fn test_resolve_tolerates_case_and_hyphens() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.resolve("ip-route").unwrap().name(), "ip_route");
        assert_eq!(registry.resolve("IP_ROUTE").unwrap().name(), "ip_route");
        assert_eq!(registry.resolve("--ip-route").unwrap().name(), "ip_route");
    }

    #[test]
    fn test_resolve_missing_parser() {
        let registry = ParserRegistry::new();
        let err = registry.resolve("no_such_parser").unwrap_err();
        assert!(matches!(err, JcError::ParserNotFound(ref n) if n == "no_such_parser"));
        assert_eq!(err.to_string(), "Parser not found: no_such_parser");
    }

    #[test]
    fn test_describe_round_trips_name() {
        let registry = ParserRegistry::new();
        for name in registry.all_names() {
            let info = registry.describe(&name).unwrap();
            assert_eq!(registry.resolve(&info.name).unwrap().name(), name);
        }
    }

    #[test]
    fn test_magic_longest_prefix_wins() {
        let registry = ParserRegistry::new();
        let handle = registry.resolve_by_magic(&["ip", "route", "show"]).unwrap();
        assert_eq!(handle.name(), "ip_route");
        let handle = registry.resolve_by_magic(&["/usr/bin/free", "-m"]).unwrap();
        assert_eq!(handle.name(), "free");
        assert!(registry.resolve_by_magic(&["ip", "neigh"]).is_none());
        assert!(registry.resolve_by_magic::<&str>(&[]).is_none());
    }

    #[test]
    fn test_magic_path_prefix() {
        let registry = ParserRegistry::new();
        let handle = registry.resolve_by_magic(&["/proc/meminfo"]).unwrap();
        assert_eq!(handle.name(), "proc");
    }

    #[test]
    fn test_magic_ties_go_to_first_registration() {
        let mut registry = ParserRegistry::empty();
        registry.register(Fixed { name: "first", magic: &["tool list"] }).unwrap();
        registry.register(Fixed { name: "second", magic: &["tool list"] }).unwrap();
        registry.register(Fixed { name: "short", magic: &["tool"] }).unwrap();
        assert_eq!(registry.resolve_by_magic(&["tool", "list"]).unwrap().name(), "first");
        assert_eq!(registry.resolve_by_magic(&["tool", "show"]).unwrap().name(), "short");
    }

    #[test]
    fn test_aliases_and_shadowing() {
        let mut registry = ParserRegistry::empty();
        registry.register(Fixed { name: "one", magic: &[] }).unwrap();
        assert_eq!(registry.resolve("fixed_alias").unwrap().name(), "one");

        registry.register_plugin(Fixed { name: "one", magic: &[] }).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("one").unwrap().info().plugin);
        assert_eq!(registry.names_with_capability(Capability::Plugin), vec!["one"]);
    }

    #[test]
    fn test_deprecated_parser_still_resolves() {
        let registry = ParserRegistry::new();
        let handle = registry.resolve("iso-datetime").unwrap();
        assert!(handle.info().deprecated);
        assert!(registry.resolve("iso_datetime").is_ok());
    }

    #[test]
    fn test_deprecation_warning_waits_for_a_loud_parse() {
        let registry = ParserRegistry::new();
        let handle = registry.resolve("iso_datetime").unwrap();
        let warned = |h: &ParserHandle<'_>| h.descriptor.deprecation_warned.load(Ordering::Relaxed);
        assert!(!warned(&handle));

        handle
            .parse(Input::from("2022-07-20T14:52:45Z"), ParseOptions::quiet())
            .unwrap();
        assert!(!warned(&handle));

        handle
            .parse(Input::from("2022-07-20T14:52:45Z"), ParseOptions::default())
            .unwrap();
        assert!(warned(&handle));
    }

    #[test]
    fn test_streaming_and_standard_partition_visible_builtins() {
        let registry = ParserRegistry::new();
        let streaming = registry.names_with_capability(Capability::Streaming);
        let standard = registry.names_with_capability(Capability::Standard);
        assert!(streaming.iter().all(|n| !standard.contains(n)));

        let mut union: Vec<String> = streaming
            .iter()
            .chain(standard.iter())
            .cloned()
            .collect();
        union.sort();
        let visible: Vec<String> = registry
            .descriptors()
            .filter(|i| !i.hidden && !i.plugin)
            .map(|i| i.name.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        assert_eq!(union, visible);
        assert!(streaming.contains(&"ping_s".to_string()));
        assert!(!standard.contains(&"proc_meminfo".to_string()));
    }
}
