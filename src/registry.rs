//! Cross-reference registry seam.
//!
//! The registry is publication-wide state owned by whoever orchestrates
//! validation of a whole container. A content validation pass only
//! registers the references it sees and asks for manifest media types and
//! binding handlers. Single-document validation runs without a registry.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::diagnostics::Position;

/// Kind of reference recorded in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ReferenceKind {
    /// Embedded resource reference (`src`, `data`, `poster`).
    Generic,
}

/// One reference registered during a pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceReference {
    /// Path of the referring document.
    pub source: String,
    /// Location of the referring element.
    pub position: Position,
    /// Resolved, container-relative target path.
    pub target: String,
    /// Reference classification.
    pub kind: ReferenceKind,
}

/// Publication-wide cross-reference registry.
pub trait ResourceRegistry {
    /// Record that `source` references `target` at `position`.
    fn register_reference(
        &mut self,
        source: &str,
        position: Position,
        target: &str,
        kind: ReferenceKind,
    );

    /// Manifest media type for `target`, if it is a known item.
    fn mime_type(&self, target: &str) -> Option<String>;

    /// Source of the binding handler registered for `mime_type`, if any.
    fn binding_handler(&self, mime_type: &str) -> Option<String>;
}

/// In-memory registry built from manifest items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManifestRegistry {
    items: BTreeMap<String, String>,
    bindings: BTreeMap<String, String>,
    references: Vec<ResourceReference>,
}

impl ManifestRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manifest item path with its media type.
    pub fn with_item(mut self, path: impl Into<String>, mime_type: impl Into<String>) -> Self {
        self.insert_item(path, mime_type);
        self
    }

    /// Register a binding handler for a media type.
    pub fn with_binding(
        mut self,
        mime_type: impl Into<String>,
        handler: impl Into<String>,
    ) -> Self {
        self.insert_binding(mime_type, handler);
        self
    }

    /// Register a manifest item path with its media type.
    pub fn insert_item(&mut self, path: impl Into<String>, mime_type: impl Into<String>) {
        self.items.insert(path.into(), mime_type.into());
    }

    /// Register a binding handler for a media type.
    pub fn insert_binding(&mut self, mime_type: impl Into<String>, handler: impl Into<String>) {
        self.bindings.insert(mime_type.into(), handler.into());
    }

    /// References recorded so far, in registration order.
    pub fn references(&self) -> &[ResourceReference] {
        &self.references
    }

    /// Number of manifest items known to the registry.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

impl ResourceRegistry for ManifestRegistry {
    fn register_reference(
        &mut self,
        source: &str,
        position: Position,
        target: &str,
        kind: ReferenceKind,
    ) {
        self.references.push(ResourceReference {
            source: source.into(),
            position,
            target: target.into(),
            kind,
        });
    }

    fn mime_type(&self, target: &str) -> Option<String> {
        self.items.get(target).cloned()
    }

    fn binding_handler(&self, mime_type: &str) -> Option<String> {
        self.bindings.get(mime_type).cloned()
    }
}

/// Registry handle shareable across threads validating different documents.
///
/// Each clone locks the wrapped registry per call, so validators running in
/// parallel never observe a partially registered reference.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct SharedRegistry<R> {
    inner: std::sync::Arc<std::sync::Mutex<R>>,
}

#[cfg(feature = "std")]
impl<R> Clone for SharedRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            inner: std::sync::Arc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "std")]
impl<R: ResourceRegistry> SharedRegistry<R> {
    /// Wrap a registry for shared use.
    pub fn new(registry: R) -> Self {
        Self {
            inner: std::sync::Arc::new(std::sync::Mutex::new(registry)),
        }
    }

    /// Run `f` with exclusive access to the wrapped registry.
    pub fn with<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(feature = "std")]
impl<R: ResourceRegistry> ResourceRegistry for SharedRegistry<R> {
    fn register_reference(
        &mut self,
        source: &str,
        position: Position,
        target: &str,
        kind: ReferenceKind,
    ) {
        self.with(|registry| registry.register_reference(source, position, target, kind));
    }

    fn mime_type(&self, target: &str) -> Option<String> {
        self.with(|registry| registry.mime_type(target))
    }

    fn binding_handler(&self, mime_type: &str) -> Option<String> {
        self.with(|registry| registry.binding_handler(mime_type))
    }
}
