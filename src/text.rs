//! Text resolution: symbolic keys to display strings.
use crate::labels::Label;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const STAFF_USER_TITLE_KEY: &str = "pageTitle.Staff - User";

pub trait TextResolver: Send + Sync {
    fn resolve(&self, key: &str) -> Option<String>;
}

/// Resolve `key`, falling back to `fallback_key`, then to the fallback key's
/// last segment so a label never renders empty.
pub fn resolve_or_fallback(resolver: &dyn TextResolver, key: &str, fallback_key: &str) -> String {
    resolver
        .resolve(key)
        .or_else(|| resolver.resolve(fallback_key))
        .unwrap_or_else(|| last_segment(fallback_key).to_string())
}

pub fn resolve_label(resolver: &dyn TextResolver, label: Label) -> String {
    resolve_or_fallback(resolver, label.key(), label.fallback().key())
}

fn last_segment(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}

static BUILTIN: Lazy<HashMap<&'static str, String>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, String> = Label::ALL
        .iter()
        .map(|label| (label.key(), last_segment(label.key()).to_string()))
        .collect();
    map.insert(STAFF_USER_TITLE_KEY, "Staff - User".to_string());
    map
});

/// Built-in English strings layered with configured overrides.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    overrides: HashMap<String, String>,
}

impl Catalog {
    pub fn new(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    /// A catalog that knows only the given keys, without built-ins.
    pub fn only(entries: HashMap<String, String>) -> OnlyCatalog {
        OnlyCatalog(entries)
    }
}

impl TextResolver for Catalog {
    fn resolve(&self, key: &str) -> Option<String> {
        self.overrides
            .get(key)
            .cloned()
            .or_else(|| BUILTIN.get(key).cloned())
    }
}

#[derive(Debug, Clone, Default)]
pub struct OnlyCatalog(HashMap<String, String>);

impl TextResolver for OnlyCatalog {
    fn resolve(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}
