//! Filter rules and the rule-matching engine
//!
//! A [`FilterRule`] pairs match criteria with an [`Action`]. Criteria are exact:
//! a level rule matches that level only (it is not a severity threshold), a
//! message rule matches the full message case-sensitively, and attribute
//! criteria must all be present with exactly the given textual rendering.
//!
//! Rules are plain data and can be loaded from JSON:
//!
//! ```json
//! [
//!   { "attributes": { "user": "alice" }, "action": "deny" },
//!   { "action": "shorten", "options": { "shorten": { "limit": 10, "keys": ["body"] } } }
//! ]
//! ```

use crate::error::LogError;
use crate::level::Level;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Default length limit for shortened attributes
pub const DEFAULT_SHORTEN_LIMIT: usize = 100;

/// Marker appended to shortened values
pub const ELLIPSIS: &str = "...";

/// Synthetic attribute key bound to the record message during matching
pub const MESSAGE_KEY: &str = "msg";

/// What happens to a record that matches a rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// No effect; evaluation continues with the next rule
    #[default]
    Allow,
    /// Drop the record; no later rule runs and nothing is forwarded
    Deny,
    /// Truncate the configured attributes, then continue with the next rule
    Shorten,
}

fn default_shorten_limit() -> usize {
    DEFAULT_SHORTEN_LIMIT
}

/// Options of the [`Action::Shorten`] action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenOptions {
    /// Maximum length in characters, marker included
    #[serde(default = "default_shorten_limit")]
    pub limit: usize,
    /// Attribute names to shorten. Empty means shorten nothing.
    #[serde(default)]
    pub keys: BTreeSet<String>,
}

impl Default for ShortenOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SHORTEN_LIMIT,
            keys: BTreeSet::new(),
        }
    }
}

/// Per-rule options bag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOptions {
    /// Settings for [`Action::Shorten`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shorten: Option<ShortenOptions>,
}

/// A match condition plus an action
///
/// A rule without level, message or attribute criteria matches every record.
/// Combined with [`Action::Deny`] it silences all logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRule {
    /// Exact level to match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    /// Exact message to match; empty matches any message
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Required attribute renderings, all of which must match
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Action options
    pub options: RuleOptions,
    /// Action applied on match
    pub action: Action,
}

impl FilterRule {
    /// Match-all rule with the given action
    pub fn new(action: Action) -> Self {
        Self {
            action,
            ..Default::default()
        }
    }

    /// Rule that lets matching records through unchanged
    pub fn allow() -> Self {
        Self::new(Action::Allow)
    }

    /// Rule that drops matching records
    pub fn deny() -> Self {
        Self::new(Action::Deny)
    }

    /// Rule that truncates `keys` of matching records to `limit` characters
    pub fn shorten<I, K>(limit: usize, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            action: Action::Shorten,
            options: RuleOptions {
                shorten: Some(ShortenOptions {
                    limit,
                    keys: keys.into_iter().map(Into::into).collect(),
                }),
            },
            ..Default::default()
        }
    }

    /// Only match records at exactly `level`
    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Only match records with exactly this message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Require attribute `key` to render as `value`
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether this rule has no criteria at all
    pub fn is_match_all(&self) -> bool {
        self.level.is_none() && self.message.is_empty() && self.attributes.is_empty()
    }

    /// Whether this rule would silence every record
    pub fn denies_everything(&self) -> bool {
        self.action == Action::Deny && self.is_match_all()
    }

    /// Check the rule's options. `index` is reported in the error.
    pub fn validate(&self, index: usize) -> Result<(), LogError> {
        if let Some(shorten) = &self.options.shorten {
            if shorten.limit == 0 {
                return Err(LogError::InvalidRule {
                    index,
                    reason: "shorten limit must be positive".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Decide whether `record` satisfies every criterion of `rule`.
pub fn matches(record: &Record, rule: &FilterRule) -> bool {
    if let Some(level) = rule.level {
        if record.level != level {
            return false;
        }
    }

    if !rule.message.is_empty() && record.message != rule.message {
        return false;
    }

    rule.attributes
        .iter()
        .all(|(key, expected)| attr_matches(record, key, expected))
}

// Record attributes shadow the synthetic message key.
fn attr_matches(record: &Record, key: &str, expected: &str) -> bool {
    match record.attr(key) {
        Some(value) => value.renders_as(expected),
        None => key == MESSAGE_KEY && record.message == expected,
    }
}

/// Shorten `value` to at most `limit` characters.
///
/// Values within the limit are returned unchanged. Longer values keep their
/// first `limit - 3` characters followed by [`ELLIPSIS`]; when `limit <= 3`
/// there is no room for the marker and the first `limit` characters are kept.
pub fn truncate(value: &str, limit: usize) -> Cow<'_, str> {
    if value.len() <= limit || value.chars().count() <= limit {
        return Cow::Borrowed(value);
    }

    if limit <= ELLIPSIS.len() {
        return Cow::Borrowed(prefix(value, limit));
    }

    let mut shortened = String::with_capacity(limit + ELLIPSIS.len());
    shortened.push_str(prefix(value, limit - ELLIPSIS.len()));
    shortened.push_str(ELLIPSIS);
    Cow::Owned(shortened)
}

fn prefix(value: &str, chars: usize) -> &str {
    match value.char_indices().nth(chars) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

/// Parse and validate a JSON array of rules.
pub fn parse_rules(json: &str) -> Result<Vec<FilterRule>, LogError> {
    let rules: Vec<FilterRule> = serde_json::from_str(json)?;
    for (index, rule) in rules.iter().enumerate() {
        rule.validate(index)?;
    }
    Ok(rules)
}
