//! Structured log records
//!
//! A [`Record`] is one emitted event: a timestamp, a [`Level`], a message and an
//! ordered list of [`Attr`]s. Attribute values are a closed set of variants
//! with one canonical text rendering ([`Value`]'s `Display`), which is what the
//! rule engine compares against and what the text sink prints.

use crate::level::Level;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// An attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 text
    String(String),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    Uint(u64),
    /// Floating point number
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Elapsed time
    Duration(Duration),
    /// Named collection of nested attributes
    Group(Vec<Attr>),
}

impl Value {
    /// Text value, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the canonical rendering equals `text`.
    ///
    /// Avoids rendering for plain strings.
    pub fn renders_as(&self, text: &str) -> bool {
        match self {
            Value::String(s) => s == text,
            other => other.to_string() == text,
        }
    }

    /// Convert to JSON for structured sinks.
    ///
    /// Numbers and booleans keep their type, durations use the canonical
    /// rendering, groups become objects.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Uint(u) => serde_json::Value::from(*u),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Duration(d) => serde_json::Value::String(format!("{:?}", d)),
            Value::Group(attrs) => {
                let mut map = serde_json::Map::with_capacity(attrs.len());
                for attr in attrs {
                    map.insert(attr.key.clone(), attr.value.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Duration(d) => write!(f, "{:?}", d),
            Value::Group(attrs) => {
                f.write_str("[")?;
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", attr)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $target:ty, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::$variant(value as $target)
                }
            }
        )*
    };
}

impl_from_int!(Int, i64, i8, i16, i32, i64, isize);
impl_from_int!(Uint, u64, u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Duration> for Value {
    fn from(value: Duration) -> Self {
        Value::Duration(value)
    }
}

impl From<Vec<Attr>> for Value {
    fn from(value: Vec<Attr>) -> Self {
        Value::Group(value)
    }
}

/// A key/value pair attached to a record
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    /// Attribute name
    pub key: String,
    /// Attribute value
    pub value: Value,
}

impl Attr {
    /// Create an attribute
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a group attribute holding `attrs`
    pub fn group(key: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Self {
            key: key.into(),
            value: Value::Group(attrs),
        }
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// One structured log event
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// When the record was created
    pub time: DateTime<Utc>,
    /// Severity
    pub level: Level,
    /// Message text
    pub message: String,
    /// Attributes in insertion order; keys may repeat
    pub attrs: Vec<Attr>,
}

impl Record {
    /// Create a record stamped with the current time
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            level,
            message: message.into(),
            attrs: Vec::new(),
        }
    }

    /// Append an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.push(Attr::new(key, value));
        self
    }

    /// Append several attributes
    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    /// Override the timestamp
    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    /// Most recently added value for `key`
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs
            .iter()
            .rev()
            .find(|attr| attr.key == key)
            .map(|attr| &attr.value)
    }
}

#[derive(Debug, Clone, Default)]
struct Frame {
    group: Option<String>,
    attrs: Vec<Attr>,
}

/// Fixed attributes and open groups accumulated by sink derivation.
///
/// Attributes added after a group is opened belong to that group, as do the
/// attributes of every record handled afterwards.
#[derive(Debug, Clone, Default)]
pub struct AttrScope {
    frames: Vec<Frame>,
}

impl AttrScope {
    /// An empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope with `attrs` added to the innermost open group
    pub fn with_attrs(&self, attrs: &[Attr]) -> Self {
        let mut scope = self.clone();
        if scope.frames.is_empty() {
            scope.frames.push(Frame::default());
        }
        if let Some(frame) = scope.frames.last_mut() {
            frame.attrs.extend(attrs.iter().cloned());
        }
        scope
    }

    /// Scope with a new group opened inside the current one
    pub fn with_group(&self, name: &str) -> Self {
        let mut scope = self.clone();
        scope.frames.push(Frame {
            group: Some(name.to_string()),
            attrs: Vec::new(),
        });
        scope
    }

    /// Names of the open groups, outermost first
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().filter_map(|frame| frame.group.as_deref())
    }

    /// Whether nothing has been derived
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Full attribute tree for a record: fixed attributes followed by the
    /// record's own, nested under every open group. Empty groups are dropped.
    pub fn resolve(&self, record_attrs: &[Attr]) -> Vec<Attr> {
        let mut tail = record_attrs.to_vec();
        for frame in self.frames.iter().rev() {
            let mut attrs = Vec::with_capacity(frame.attrs.len() + tail.len());
            attrs.extend(frame.attrs.iter().cloned());
            attrs.extend(tail);
            tail = match &frame.group {
                Some(name) if !attrs.is_empty() => vec![Attr::group(name.clone(), attrs)],
                Some(_) => Vec::new(),
                None => attrs,
            };
        }
        tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_rendering() {
        assert_eq!(Value::from("alice").to_string(), "alice");
        assert_eq!(Value::from(-3).to_string(), "-3");
        assert_eq!(Value::from(200u16).to_string(), "200");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(
            Value::from(Duration::from_micros(1500)).to_string(),
            "1.5ms"
        );

        let group = Value::Group(vec![Attr::new("a", 1), Attr::new("b", "x")]);
        assert_eq!(group.to_string(), "[a=1 b=x]");
    }

    #[test]
    fn test_renders_as() {
        assert!(Value::from("bob").renders_as("bob"));
        assert!(Value::from(42).renders_as("42"));
        assert!(!Value::from(42).renders_as("042"));
    }

    #[test]
    fn test_to_json_keeps_types() {
        assert_eq!(Value::from(7).to_json(), serde_json::json!(7));
        assert_eq!(Value::from(false).to_json(), serde_json::json!(false));
        assert_eq!(
            Value::Float(f64::NAN).to_json(),
            serde_json::json!("NaN")
        );
        let group = Value::Group(vec![Attr::new("k", "v")]);
        assert_eq!(group.to_json(), serde_json::json!({"k": "v"}));
    }

    #[test]
    fn test_record_attr_lookup_prefers_latest() {
        let record = Record::new(Level::Info, "m")
            .with_attr("user", "alice")
            .with_attr("user", "bob");
        assert_eq!(record.attr("user"), Some(&Value::from("bob")));
        assert_eq!(record.attr("missing"), None);
        assert_eq!(record.attrs.len(), 2);
    }

    #[test]
    fn test_scope_resolves_fixed_then_record_attrs() {
        let scope = AttrScope::new().with_attrs(&[Attr::new("id", "c1")]);
        let resolved = scope.resolve(&[Attr::new("user", "alice")]);
        assert_eq!(
            resolved,
            vec![Attr::new("id", "c1"), Attr::new("user", "alice")]
        );
    }

    #[test]
    fn test_scope_nests_under_groups() {
        let scope = AttrScope::new()
            .with_attrs(&[Attr::new("service", "api")])
            .with_group("http")
            .with_attrs(&[Attr::new("method", "GET")]);

        let resolved = scope.resolve(&[Attr::new("status", 200)]);
        assert_eq!(
            resolved,
            vec![
                Attr::new("service", "api"),
                Attr::group(
                    "http",
                    vec![Attr::new("method", "GET"), Attr::new("status", 200)]
                ),
            ]
        );
        assert_eq!(scope.groups().collect::<Vec<_>>(), vec!["http"]);
    }

    #[test]
    fn test_scope_drops_empty_groups() {
        let scope = AttrScope::new().with_group("outer").with_group("inner");
        assert!(scope.resolve(&[]).is_empty());
    }

    #[test]
    fn test_derivation_does_not_affect_parent() {
        let parent = AttrScope::new().with_attrs(&[Attr::new("a", 1)]);
        let _child = parent.with_attrs(&[Attr::new("b", 2)]);
        assert_eq!(parent.resolve(&[]), vec![Attr::new("a", 1)]);
    }
}
