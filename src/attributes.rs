use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Name of the implicit primary key attribute every table starts with.
pub const PRIMARY_KEY: &str = "id";

/// An ordered set of attribute names with case-insensitive membership.
///
/// Names keep the case they were declared with (that is what gets displayed
/// and written to disk), while lookups, insertion and removal compare the
/// lowercase form. The lowercase index always mirrors `names`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AttributeSet {
    names: Vec<String>,
    index: HashSet<String>,
}

impl AttributeSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set whose first attribute is the primary key.
    pub fn with_primary_key() -> Self {
        let mut set = Self::new();
        set.insert(PRIMARY_KEY);
        set
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(&name.to_lowercase())
    }

    /// Appends `name` unless an attribute with the same lowercase form is
    /// already present. Returns whether the name was added.
    pub fn insert(&mut self, name: &str) -> bool {
        if !self.index.insert(name.to_lowercase()) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Removes the attribute matching `name` case-insensitively.
    /// Returns whether something was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let key = name.to_lowercase();
        if !self.index.remove(&key) {
            return false;
        }
        self.names.retain(|n| n.to_lowercase() != key);
        true
    }

    /// Position of `name` in declaration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        let key = name.to_lowercase();
        self.names.iter().position(|n| n.to_lowercase() == key)
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl From<Vec<String>> for AttributeSet {
    // Duplicates are dropped; first occurrence wins.
    fn from(names: Vec<String>) -> Self {
        let mut set = Self::new();
        for name in &names {
            set.insert(name);
        }
        set
    }
}

impl From<AttributeSet> for Vec<String> {
    fn from(set: AttributeSet) -> Self {
        set.names
    }
}
