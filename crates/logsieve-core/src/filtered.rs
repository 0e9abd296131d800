//! Rule-evaluating sink
//!
//! [`FilteredSink`] decorates another sink. Every record is checked against an
//! ordered rule list before it is forwarded: `Deny` drops it, `Shorten`
//! truncates selected attributes in a private copy, `Allow` does nothing.
//!
//! # Sharing
//!
//! The rule list lives behind one `Arc<RwLock<..>>` that every sink derived
//! through [`Sink::with_attrs`] or [`Sink::with_group`] shares with its parent.
//! Adding a rule through any of them is visible to all of them immediately,
//! and a rule update briefly blocks `handle` on every sink sharing the list.

use crate::error::SinkResult;
use crate::filter::{matches, truncate, Action, FilterRule, ShortenOptions};
use crate::level::Level;
use crate::record::{Attr, Record, Value};
use crate::sink::Sink;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Counters kept by a filtering sink and its derivatives
#[derive(Debug, Default)]
pub struct FilterStats {
    denied: AtomicU64,
    shortened: AtomicU64,
    forwarded: AtomicU64,
    sink_failures: AtomicU64,
}

impl FilterStats {
    /// Records dropped by a `Deny` rule
    pub fn denied(&self) -> u64 {
        self.denied.load(Ordering::Relaxed)
    }

    /// Records rewritten by at least one `Shorten` rule
    pub fn shortened(&self) -> u64 {
        self.shortened.load(Ordering::Relaxed)
    }

    /// Records handed to the downstream sink
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    /// Forwarded records the downstream sink failed to accept
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }
}

/// Sink that applies filter rules before forwarding
#[derive(Clone)]
pub struct FilteredSink {
    inner: Arc<dyn Sink>,
    rules: Arc<RwLock<Vec<FilterRule>>>,
    stats: Arc<FilterStats>,
}

impl FilteredSink {
    /// Wrap `inner` with an initial rule list
    pub fn new(inner: Arc<dyn Sink>, rules: Vec<FilterRule>) -> Self {
        warn_degenerate(&rules, 0);
        Self {
            inner,
            rules: Arc::new(RwLock::new(rules)),
            stats: Arc::new(FilterStats::default()),
        }
    }

    /// Append a rule; it is evaluated after every existing rule
    pub fn add_rule(&self, rule: FilterRule) {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        warn_degenerate(std::slice::from_ref(&rule), rules.len());
        rules.push(rule);
    }

    /// Replace the whole rule list
    pub fn set_rules(&self, rules: Vec<FilterRule>) {
        warn_degenerate(&rules, 0);
        *self.rules.write().unwrap_or_else(PoisonError::into_inner) = rules;
    }

    /// Snapshot of the current rule list
    pub fn rules(&self) -> Vec<FilterRule> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Counters shared with every derived sink
    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }

    /// Whether `other` evaluates the same rule list
    pub fn shares_rules_with(&self, other: &FilteredSink) -> bool {
        Arc::ptr_eq(&self.rules, &other.rules)
    }

    /// Evaluate the rules against `record` and forward it unless denied.
    ///
    /// Returns whether the record was forwarded. Downstream failures are
    /// counted in [`FilterStats::sink_failures`] and otherwise ignored.
    pub fn forward(&self, record: &Record) -> bool {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);

        let mut current = Cow::Borrowed(record);
        let mut rewritten = false;

        for rule in rules.iter() {
            if !matches(&current, rule) {
                continue;
            }
            match rule.action {
                Action::Allow => {}
                Action::Deny => {
                    self.stats.denied.fetch_add(1, Ordering::Relaxed);
                    return false;
                }
                Action::Shorten => {
                    if let Some(options) = &rule.options.shorten {
                        rewritten |= shorten(&mut current, options);
                    }
                }
            }
        }

        if rewritten {
            self.stats.shortened.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.forwarded.fetch_add(1, Ordering::Relaxed);

        if let Err(err) = self.inner.handle(&current) {
            self.stats.sink_failures.fetch_add(1, Ordering::Relaxed);
            crate::diag_debug!(error = %err, "record dropped by downstream sink");
        }
        true
    }

    fn derive(&self, inner: Arc<dyn Sink>) -> Arc<dyn Sink> {
        Arc::new(Self {
            inner,
            rules: Arc::clone(&self.rules),
            stats: Arc::clone(&self.stats),
        })
    }
}

impl Sink for FilteredSink {
    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    fn handle(&self, record: &Record) -> SinkResult {
        self.forward(record);
        Ok(())
    }

    fn with_attrs(&self, attrs: &[Attr]) -> Arc<dyn Sink> {
        self.derive(self.inner.with_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Sink> {
        self.derive(self.inner.with_group(name))
    }
}

// Rewrites happen on an owned copy; the caller's record is never touched.
fn shorten(record: &mut Cow<'_, Record>, options: &ShortenOptions) -> bool {
    if options.keys.is_empty() {
        return false;
    }

    let replacements: Vec<(usize, String)> = record
        .attrs
        .iter()
        .enumerate()
        .filter(|(_, attr)| options.keys.contains(&attr.key))
        .filter_map(|(index, attr)| {
            let text = attr.value.to_string();
            match truncate(&text, options.limit) {
                Cow::Borrowed(kept) if kept.len() == text.len() => None,
                shortened => Some((index, shortened.into_owned())),
            }
        })
        .collect();

    if replacements.is_empty() {
        return false;
    }

    let owned = record.to_mut();
    for (index, text) in replacements {
        owned.attrs[index].value = Value::String(text);
    }
    true
}

fn warn_degenerate(rules: &[FilterRule], offset: usize) {
    for (index, rule) in rules.iter().enumerate() {
        if rule.denies_everything() {
            crate::diag_warn!(
                rule = offset + index,
                "deny rule without criteria installed; every record will be dropped"
            );
        }
    }
}
