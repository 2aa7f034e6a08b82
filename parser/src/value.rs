use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Universal output tree produced by every parser.
///
/// Integers that do not fit in `i64` (IPv6 address integers, host counts)
/// are carried as [`ParseValue::BigUint`]. Byte strings only come from
/// binary parsers and serialize as colon-delimited lowercase hex.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParseValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    BigUint(u128),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<ParseValue>),
    Map(Map),
}

impl ParseValue {
    /// Build an integer value, falling back to the wide variant when needed.
    pub fn from_u128(n: u128) -> Self {
        match i64::try_from(n) {
            Ok(v) => ParseValue::Int(v),
            Err(_) => ParseValue::BigUint(n),
        }
    }

    /// String value, or null for an empty / whitespace-only string.
    pub fn non_empty(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            ParseValue::Null
        } else {
            ParseValue::String(trimmed.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParseValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParseValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParseValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParseValue::Float(f) => Some(*f),
            ParseValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParseValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParseValue]> {
        match self {
            ParseValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            ParseValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            ParseValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Index into a mapping value. Returns `None` for non-maps and missing keys.
    pub fn get(&self, key: &str) -> Option<&ParseValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Empty-output check used by the "empty input" convention.
    pub fn is_empty_container(&self) -> bool {
        match self {
            ParseValue::List(items) => items.is_empty(),
            ParseValue::Map(m) => m.is_empty(),
            _ => false,
        }
    }

    /// Same tree with every leaf replaced by a placeholder, used to compare
    /// the raw and processed shapes of a parser's output.
    pub fn skeleton(&self) -> ParseValue {
        match self {
            ParseValue::List(items) => ParseValue::List(items.iter().map(|v| v.skeleton()).collect()),
            ParseValue::Map(m) => ParseValue::Map(
                m.iter()
                    .map(|(k, v)| (k.clone(), v.skeleton()))
                    .collect(),
            ),
            _ => ParseValue::Null,
        }
    }
}

impl Serialize for ParseValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParseValue::Null => serializer.serialize_unit(),
            ParseValue::Bool(b) => serializer.serialize_bool(*b),
            ParseValue::Int(n) => serializer.serialize_i64(*n),
            ParseValue::BigUint(n) => serializer.serialize_u128(*n),
            ParseValue::Float(f) => serializer.serialize_f64(*f),
            ParseValue::String(s) => serializer.serialize_str(s),
            ParseValue::Bytes(b) => serializer.serialize_str(&colon_hex(b)),
            ParseValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ParseValue::Map(m) => m.serialize(serializer),
        }
    }
}

/// Render bytes as `aa:bb:cc`.
pub fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(":")
}

/// Insertion-ordered string-keyed mapping.
///
/// Records are small, so lookups scan the entry list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Map {
    entries: Vec<(String, ParseValue)>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            entries: Vec::with_capacity(n),
        }
    }

    /// Insert a value. An existing key keeps its position and gets the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParseValue>) -> Option<ParseValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParseValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ParseValue> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParseValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Rename a key in place, keeping its position.
    pub fn rename(&mut self, from: &str, to: &str) {
        if self.contains_key(to) && from != to {
            return;
        }
        if let Some((k, _)) = self.entries.iter_mut().find(|(k, _)| k == from) {
            *k = to.to_string();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParseValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut ParseValue)> {
        self.entries.iter_mut().map(|(k, v)| (&*k, v))
    }

    /// Apply a conversion to the value at `key`, if present.
    pub fn update(&mut self, key: &str, f: impl FnOnce(&ParseValue) -> ParseValue) {
        if let Some(v) = self.get_mut(key) {
            *v = f(v);
        }
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<ParseValue>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for Map {
    type Item = (String, ParseValue);
    type IntoIter = std::vec::IntoIter<(String, ParseValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<&str> for ParseValue {
    fn from(s: &str) -> Self {
        ParseValue::String(s.to_string())
    }
}

impl From<String> for ParseValue {
    fn from(s: String) -> Self {
        ParseValue::String(s)
    }
}

impl From<&String> for ParseValue {
    fn from(s: &String) -> Self {
        ParseValue::String(s.clone())
    }
}

impl From<bool> for ParseValue {
    fn from(b: bool) -> Self {
        ParseValue::Bool(b)
    }
}

impl From<i64> for ParseValue {
    fn from(n: i64) -> Self {
        ParseValue::Int(n)
    }
}

impl From<i32> for ParseValue {
    fn from(n: i32) -> Self {
        ParseValue::Int(n as i64)
    }
}

impl From<u32> for ParseValue {
    fn from(n: u32) -> Self {
        ParseValue::Int(n as i64)
    }
}

impl From<u8> for ParseValue {
    fn from(n: u8) -> Self {
        ParseValue::Int(n as i64)
    }
}

impl From<u64> for ParseValue {
    fn from(n: u64) -> Self {
        ParseValue::from_u128(n as u128)
    }
}

impl From<usize> for ParseValue {
    fn from(n: usize) -> Self {
        ParseValue::from_u128(n as u128)
    }
}

impl From<u128> for ParseValue {
    fn from(n: u128) -> Self {
        ParseValue::from_u128(n)
    }
}

impl From<f64> for ParseValue {
    fn from(f: f64) -> Self {
        ParseValue::Float(f)
    }
}

impl From<Map> for ParseValue {
    fn from(m: Map) -> Self {
        ParseValue::Map(m)
    }
}

impl<T: Into<ParseValue>> From<Vec<T>> for ParseValue {
    fn from(items: Vec<T>) -> Self {
        ParseValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParseValue>> From<Option<T>> for ParseValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => ParseValue::Null,
        }
    }
}

/// Build a [`Map`] from `key => value` pairs, preserving order.
///
/// ```
/// let m = jc::record! { "name" => "sda", "size" => 20i64 };
/// assert_eq!(m.get_str("name"), Some("sda"));
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::value::Map::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::Map::new();
        $( map.insert($key, $value); )+
        map
    }};
}
