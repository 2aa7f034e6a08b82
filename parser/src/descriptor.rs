use serde::{Deserialize, Serialize};
use std::fmt;

/// Platforms a parser declares compatibility with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Darwin,
    Cygwin,
    Win32,
    Aix,
    Freebsd,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Linux,
        Platform::Darwin,
        Platform::Cygwin,
        Platform::Win32,
        Platform::Aix,
        Platform::Freebsd,
    ];

    /// Platform of the running process, if it is one we know about.
    pub fn current() -> Option<Platform> {
        match std::env::consts::OS {
            "linux" | "android" => Some(Platform::Linux),
            "macos" | "ios" => Some(Platform::Darwin),
            "windows" => Some(Platform::Win32),
            "freebsd" => Some(Platform::Freebsd),
            "aix" => Some(Platform::Aix),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
            Platform::Cygwin => "cygwin",
            Platform::Win32 => "win32",
            Platform::Aix => "aix",
            Platform::Freebsd => "freebsd",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Command,
    File,
    String,
    Binary,
    Standard,
    Generic,
    Slurpable,
}

/// Capability used to filter the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Streaming,
    Batch,
    Slurpable,
    Hidden,
    Deprecated,
    Binary,
    Plugin,
    /// Built-in, visible, batch.
    Standard,
}

/// Optional native library a parser depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Library {
    pub name: &'static str,
    #[serde(skip)]
    pub available: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Immutable metadata describing one parser.
///
/// Built-in parsers construct this with the builder methods; the registry
/// fills `streaming` from the entrypoint shape and `plugin` from the origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParserInfo {
    pub name: String,
    pub argument: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub author_email: String,
    pub compatible: Vec<Platform>,
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub magic_commands: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub streaming: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub slurpable: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub binary_input_allowed: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub plugin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<Library>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl ParserInfo {
    pub fn new(name: &str, description: &str) -> Self {
        let name = normalize_name(name);
        Self {
            argument: argument_for(&name),
            name,
            version: "1.0".to_string(),
            description: description.to_string(),
            author: "jc contributors".to_string(),
            author_email: "jc@example.invalid".to_string(),
            compatible: Platform::ALL.to_vec(),
            tags: Vec::new(),
            magic_commands: Vec::new(),
            aliases: Vec::new(),
            streaming: false,
            slurpable: false,
            hidden: false,
            deprecated: false,
            binary_input_allowed: false,
            plugin: false,
            library: None,
            documentation: None,
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn author(mut self, author: &str, email: &str) -> Self {
        self.author = author.to_string();
        self.author_email = email.to_string();
        self
    }

    pub fn compatible(mut self, platforms: &[Platform]) -> Self {
        self.compatible = platforms.to_vec();
        self
    }

    pub fn tags(mut self, tags: &[Tag]) -> Self {
        self.tags = tags.to_vec();
        if tags.contains(&Tag::Slurpable) {
            self.slurpable = true;
        }
        if tags.contains(&Tag::Binary) {
            self.binary_input_allowed = true;
        }
        self
    }

    /// Add a magic command, given as the space-separated command prefix.
    pub fn magic(mut self, command: &str) -> Self {
        self.magic_commands.push(command.to_string());
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(normalize_name(alias));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn requires(mut self, library: &'static str, available: bool) -> Self {
        self.library = Some(Library {
            name: library,
            available,
        });
        self
    }

    pub fn docs(mut self, documentation: &str) -> Self {
        self.documentation = Some(documentation.trim().to_string());
        self
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_compatible_with(&self, platform: Platform) -> bool {
        self.compatible.contains(&platform)
    }

    pub fn has_capability(&self, cap: Capability) -> bool {
        match cap {
            Capability::Streaming => self.streaming,
            Capability::Batch => !self.streaming,
            Capability::Slurpable => self.slurpable,
            Capability::Hidden => self.hidden,
            Capability::Deprecated => self.deprecated,
            Capability::Binary => self.binary_input_allowed,
            Capability::Plugin => self.plugin,
            Capability::Standard => !self.streaming && !self.hidden && !self.plugin,
        }
    }

    /// Missing optional library, if any.
    pub fn missing_library(&self) -> Option<&'static str> {
        self.library.filter(|l| !l.available).map(|l| l.name)
    }

    /// Magic commands split into argv tokens.
    pub fn magic_tokens(&self) -> impl Iterator<Item = Vec<&str>> {
        self.magic_commands
            .iter()
            .map(|m| m.split_whitespace().collect())
    }

    /// Copy without the documentation block.
    pub fn without_docs(&self) -> Self {
        let mut info = self.clone();
        info.documentation = None;
        info
    }
}

/// Canonical parser name: trimmed, leading `--` removed, lowercase, `-` → `_`.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .trim_start_matches("--")
        .to_lowercase()
        .replace('-', "_")
}

/// CLI argument form of a parser name (`ip_route` → `--ip-route`).
pub fn argument_for(name: &str) -> String {
    format!("--{}", name.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("ip-route"), "ip_route");
        assert_eq!(normalize_name("--IP-Route"), "ip_route");
        assert_eq!(normalize_name(" ping_s "), "ping_s");
    }

    #[test]
    fn test_builder_sets_flags_from_tags() {
        let info = ParserInfo::new("ip-address", "IPv4 and IPv6 address string parser")
            .tags(&[Tag::Standard, Tag::String, Tag::Slurpable]);
        assert_eq!(info.name, "ip_address");
        assert_eq!(info.argument, "--ip-address");
        assert!(info.slurpable);
        assert!(info.has_capability(Capability::Standard));
        assert!(!info.has_capability(Capability::Streaming));
    }

    #[test]
    fn test_missing_library() {
        let info = ParserInfo::new("csv", "CSV").requires("csv", false);
        assert_eq!(info.missing_library(), Some("csv"));
        let info = ParserInfo::new("csv", "CSV").requires("csv", true);
        assert_eq!(info.missing_library(), None);
    }

    #[test]
    fn test_serialized_info_omits_false_flags() {
        let info = ParserInfo::new("free", "`free` command parser")
            .compatible(&[Platform::Linux])
            .tags(&[Tag::Command])
            .magic("free");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["argument"], "--free");
        assert_eq!(json["compatible"][0], "linux");
        assert_eq!(json["magic_commands"][0], "free");
        assert!(json.get("streaming").is_none());
        assert!(json.get("documentation").is_none());
    }
}
