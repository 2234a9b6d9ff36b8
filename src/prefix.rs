//! Vocabulary prefixes declared on the document root.

extern crate alloc;

use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Set of prefix names bound by the root `epub:prefix` attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrefixRegistry {
    declared: BTreeSet<String>,
}

impl PrefixRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `name: URI` list and record every well-formed mapping.
    ///
    /// Returns the tokens that could not be read as a mapping. Parsing
    /// continues past a bad token so one typo does not hide the rest.
    pub fn declare_prefixes(&mut self, raw: &str) -> Vec<String> {
        let mut invalid = Vec::new();
        let mut tokens = raw.split_whitespace();
        while let Some(token) = tokens.next() {
            let Some(name) = token.strip_suffix(':') else {
                invalid.push(token.to_string());
                continue;
            };
            if name.is_empty() || name.contains(':') {
                invalid.push(token.to_string());
                continue;
            }
            match tokens.next() {
                Some(_uri) => {
                    self.declared.insert(name.to_string());
                }
                None => invalid.push(token.to_string()),
            }
        }
        invalid
    }

    /// Record a single prefix name.
    pub fn declare(&mut self, prefix: impl Into<String>) {
        self.declared.insert(prefix.into());
    }

    /// True when `prefix` (trimmed) was declared.
    pub fn is_declared(&self, prefix: &str) -> bool {
        self.declared.contains(prefix.trim())
    }

    /// Declared prefix names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(String::as_str)
    }

    /// Number of declared prefixes.
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// True when nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }
}
