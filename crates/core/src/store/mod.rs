//! Read-only access to the engine's hierarchical config database.
//!
//! The engine addresses values with space separated paths such as
//! `cfgWeapons AK74 OpticsInfo distanceZoomMin`. Here a path is split into the
//! config root, the class under that root and the member segments below it.
//! Implementations only provide three primitives; the typed readers and the
//! class hierarchy helpers are derived from them.

mod memory;

pub use memory::MemoryConfigStore;

use std::{collections::HashSet, fmt};

/// `scope` value of publicly spawnable classes.
pub const PUBLIC_SCOPE: i64 = 2;

/// Address of a value inside the config database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigPath<'a> {
    /// Top-level section, e.g. `cfgVehicles`.
    pub root: &'a str,
    /// Class under the root.
    pub class: &'a str,
    /// Member segments below the class; empty addresses the class itself.
    pub members: &'a [&'a str],
}

impl<'a> ConfigPath<'a> {
    /// Address the class node itself.
    pub fn class(root: &'a str, class: &'a str) -> Self {
        Self {
            root,
            class,
            members: &[],
        }
    }

    /// Address a member below `class`.
    pub fn member(root: &'a str, class: &'a str, members: &'a [&'a str]) -> Self {
        Self {
            root,
            class,
            members,
        }
    }
}

impl fmt::Display for ConfigPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root, self.class)?;
        for member in self.members {
            write!(f, " {member}")?;
        }
        Ok(())
    }
}

/// A single config entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Numeric scalar; the engine does not distinguish ints from floats on disk.
    Number(f64),
    /// Text scalar.
    Text(String),
    /// Array of scalars.
    Array(Vec<ConfigValue>),
    /// Nested class node.
    Class,
}

impl ConfigValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(value) => Some(*value),
            ConfigValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            ConfigValue::Text(text) => Some(text.clone()),
            ConfigValue::Number(value) => Some(value.to_string()),
            _ => None,
        }
    }
}

/// Query interface over the config database.
///
/// Every reader returns `None` for absent entries; callers decide the
/// default. Implementations must be usable from the scheduler task.
pub trait ConfigStore: Send + Sync {
    /// Class names directly under `root`, in the database's native order.
    fn class_names(&self, root: &str) -> Vec<String>;

    /// Immediate base class of `class`, if it declares one.
    fn base_name(&self, root: &str, class: &str) -> Option<String>;

    /// Resolve a value, following class inheritance like the engine does.
    fn value(&self, path: &ConfigPath<'_>) -> Option<ConfigValue>;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &ConfigPath<'_>) -> bool {
        self.value(path).is_some()
    }

    /// Read a float scalar.
    fn float(&self, path: &ConfigPath<'_>) -> Option<f64> {
        self.value(path)?.as_f64()
    }

    /// Read an integer scalar; fractional values are truncated.
    fn int(&self, path: &ConfigPath<'_>) -> Option<i64> {
        self.float(path).map(|value| value as i64)
    }

    /// Read a text scalar.
    fn text(&self, path: &ConfigPath<'_>) -> Option<String> {
        self.value(path)?.as_text()
    }

    /// Read an array of floats, skipping non-numeric elements.
    fn float_array(&self, path: &ConfigPath<'_>) -> Option<Vec<f64>> {
        match self.value(path)? {
            ConfigValue::Array(items) => Some(items.iter().filter_map(ConfigValue::as_f64).collect()),
            _ => None,
        }
    }

    /// Read an array of integers.
    fn int_array(&self, path: &ConfigPath<'_>) -> Option<Vec<i64>> {
        self.float_array(path)
            .map(|items| items.into_iter().map(|value| value as i64).collect())
    }

    /// Read an array of strings.
    fn text_array(&self, path: &ConfigPath<'_>) -> Option<Vec<String>> {
        match self.value(path)? {
            ConfigValue::Array(items) => Some(items.iter().filter_map(ConfigValue::as_text).collect()),
            _ => None,
        }
    }

    /// Ordered base classes of `class`, nearest first.
    fn ancestry(&self, root: &str, class: &str) -> Vec<String> {
        ancestry(class, |child| self.base_name(root, child))
    }

    /// Whether `class` is `base` or descends from it.
    fn is_kind_of(&self, root: &str, class: &str, base: &str) -> bool {
        class.eq_ignore_ascii_case(base)
            || self
                .ancestry(root, class)
                .iter()
                .any(|parent| parent.eq_ignore_ascii_case(base))
    }
}

/// Walk the parent relation from `class` upward.
///
/// The walk ends when a class has no parent, names itself as parent, or names
/// any class already visited, so arbitrary cyclic graphs terminate.
pub fn ancestry<F>(class: &str, mut parent_of: F) -> Vec<String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut parents = Vec::new();
    let mut seen = HashSet::new();
    seen.insert(class.to_ascii_lowercase());

    let mut child = class.to_string();
    while let Some(parent) = parent_of(&child) {
        if parent.is_empty() || !seen.insert(parent.to_ascii_lowercase()) {
            break;
        }
        parents.push(parent.clone());
        child = parent;
    }
    parents
}
