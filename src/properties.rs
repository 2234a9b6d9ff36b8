//! Manifest properties: inference during the pass and reconciliation against
//! the manifest declaration at document end.

extern crate alloc;

use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// Manifest value meaning "validating a lone document, skip reconciliation".
pub const SINGLE_DOCUMENT_SENTINEL: &str = "singleFileValidation";

/// Manifest-only property that content can never exhibit.
const NAV: &str = "nav";

/// Structural property a content document can exhibit.
///
/// Variants are ordered by their manifest token, which is also the order
/// reconciliation walks them in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentProperty {
    /// Contains MathML.
    Mathml,
    /// References resources outside the container.
    RemoteResources,
    /// Contains scripts.
    Scripted,
    /// Embeds or references SVG from a non-SVG document.
    Svg,
    /// Contains `epub:switch`.
    Switch,
}

impl ContentProperty {
    /// Token used for this property in the manifest `properties` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mathml => "mathml",
            Self::RemoteResources => "remote-resources",
            Self::Scripted => "scripted",
            Self::Svg => "svg",
            Self::Switch => "switch",
        }
    }

    /// Parse a manifest token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "mathml" => Some(Self::Mathml),
            "remote-resources" => Some(Self::RemoteResources),
            "scripted" => Some(Self::Scripted),
            "svg" => Some(Self::Svg),
            "switch" => Some(Self::Switch),
            _ => None,
        }
    }
}

impl fmt::Display for ContentProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties inferred during a pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertySet {
    inner: BTreeSet<ContentProperty>,
}

impl PropertySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a property; repeated marks are no-ops.
    pub fn mark(&mut self, property: ContentProperty) {
        if self.inner.insert(property) {
            log::debug!("inferred content property {}", property);
        }
    }

    /// True when `property` was marked.
    pub fn contains(&self, property: ContentProperty) -> bool {
        self.inner.contains(&property)
    }

    /// Marked properties in token order.
    pub fn iter(&self) -> impl Iterator<Item = ContentProperty> + '_ {
        self.inner.iter().copied()
    }

    /// Number of marked properties.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True when nothing was marked.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FromIterator<ContentProperty> for PropertySet {
    fn from_iter<I: IntoIterator<Item = ContentProperty>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// Properties the manifest declares for the document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DeclaredProperties {
    /// Manifest item carries no `properties` attribute.
    #[default]
    Absent,
    /// Single-document validation; reconciliation is skipped.
    SingleDocument,
    /// Raw `properties` attribute value.
    Declared(String),
}

impl DeclaredProperties {
    /// Map a raw manifest value, recognizing the single-document sentinel.
    pub fn from_manifest(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Absent,
            Some(SINGLE_DOCUMENT_SENTINEL) => Self::SingleDocument,
            Some(value) => Self::Declared(value.to_string()),
        }
    }
}

/// How declared and inferred properties are matched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Match whole whitespace-separated tokens.
    #[default]
    Tokens,
    /// Match and remove raw substrings of the declared value.
    ///
    /// Reproduces literal-text behavior: `nav` is removed wherever it
    /// appears and a property is satisfied by any occurrence of its name.
    Substring,
}

/// Result of reconciling inferred against declared properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Inferred properties the manifest fails to declare.
    pub undeclared: Vec<ContentProperty>,
    /// Leftover declared text not backed by the document.
    pub unused: Option<String>,
}

impl ReconcileOutcome {
    /// True when declaration and content agree.
    pub fn is_consistent(&self) -> bool {
        self.undeclared.is_empty() && self.unused.is_none()
    }
}

/// Diff `inferred` against `declared`.
pub fn reconcile(
    declared: &DeclaredProperties,
    inferred: &PropertySet,
    mode: ReconcileMode,
) -> ReconcileOutcome {
    match declared {
        DeclaredProperties::SingleDocument => ReconcileOutcome::default(),
        DeclaredProperties::Absent => ReconcileOutcome {
            undeclared: inferred.iter().collect(),
            unused: None,
        },
        DeclaredProperties::Declared(raw) => match mode {
            ReconcileMode::Tokens => reconcile_tokens(raw, inferred),
            ReconcileMode::Substring => reconcile_substring(raw, inferred),
        },
    }
}

fn reconcile_tokens(raw: &str, inferred: &PropertySet) -> ReconcileOutcome {
    let mut remaining: Vec<&str> = raw.split_whitespace().filter(|t| *t != NAV).collect();
    let mut undeclared = Vec::new();
    for property in inferred.iter() {
        match remaining.iter().position(|t| *t == property.as_str()) {
            Some(idx) => {
                remaining.remove(idx);
            }
            None => undeclared.push(property),
        }
    }
    let unused = if remaining.is_empty() {
        None
    } else {
        Some(remaining.join(" "))
    };
    ReconcileOutcome { undeclared, unused }
}

fn reconcile_substring(raw: &str, inferred: &PropertySet) -> ReconcileOutcome {
    let mut remaining = raw.replace(NAV, "");
    let mut undeclared = Vec::new();
    for property in inferred.iter() {
        match remaining.find(property.as_str()) {
            Some(start) => {
                remaining.replace_range(start..start + property.as_str().len(), "");
            }
            None => undeclared.push(property),
        }
    }
    let remaining = remaining.trim();
    let unused = if remaining.is_empty() {
        None
    } else {
        Some(remaining.to_string())
    };
    ReconcileOutcome { undeclared, unused }
}
