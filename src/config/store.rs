//! Key/value configuration collaborator.
//!
//! The engines only ever read typed values by `(section, key, default)`.
//! Whatever is missing or unusable is replaced by the default, and the default
//! is written back so the owner of the store can persist the effective values.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Sectioned string store owned by the orchestrator.
pub trait ConfigStore {
    fn get(&self, section: &str, key: &str) -> Option<String>;
    fn set(&mut self, section: &str, key: &str, value: String);
}

/// In-memory store; serializable so callers can persist it with any serde format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStore {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and demos.
    pub fn with(mut self, section: &str, key: &str, value: impl ToString) -> Self {
        self.set(section, key, value.to_string());
        self
    }

    pub fn section(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.sections.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(BTreeMap::is_empty)
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section)?.get(key).cloned()
    }

    fn set(&mut self, section: &str, key: &str, value: String) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}

/// Typed value that can round-trip through the string store.
pub trait ConfigValue: Sized {
    fn parse_value(raw: &str) -> Option<Self>;
    fn format_value(&self) -> String;
}

macro_rules! integer_config_value {
    ($($ty:ty),*) => {
        $(
            impl ConfigValue for $ty {
                fn parse_value(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }

                fn format_value(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_config_value!(i64, u32, u64, usize);

impl ConfigValue for f64 {
    fn parse_value(raw: &str) -> Option<Self> {
        raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

/// Booleans are stored as `0`/`1`; `true`/`false` are accepted on read.
impl ConfigValue for bool {
    fn parse_value(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        }
    }

    fn format_value(&self) -> String {
        let flag = if *self { "1" } else { "0" };
        flag.to_string()
    }
}

/// Reads `section.key`, substituting and persisting `default` when absent or malformed.
pub fn read_value<T: ConfigValue>(
    store: &mut dyn ConfigStore,
    section: &str,
    key: &str,
    default: T,
) -> T {
    read_checked(store, section, key, default, |_| true)
}

/// Like [`read_value`], additionally rejecting values that fail `valid`.
pub fn read_checked<T, F>(
    store: &mut dyn ConfigStore,
    section: &str,
    key: &str,
    default: T,
    valid: F,
) -> T
where
    T: ConfigValue,
    F: Fn(&T) -> bool,
{
    let Some(raw) = store.get(section, key) else {
        debug!("[{section}] {key} missing, using default {}", default.format_value());
        store.set(section, key, default.format_value());
        return default;
    };

    match T::parse_value(&raw) {
        Some(value) if valid(&value) => value,
        _ => {
            warn!(
                "[{section}] {key} = {raw:?} is invalid, using default {}",
                default.format_value()
            );
            store.set(section, key, default.format_value());
            default
        }
    }
}
