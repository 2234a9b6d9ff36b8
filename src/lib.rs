//! epub-content-check -- single-pass conformance checks for EPUB 3 content documents
//!
//! Streams one XHTML or SVG content document and reports, in a single pass:
//!
//! - `object`, `audio` and `video` elements without usable fallback
//! - empty `src` attributes and non-image video posters
//! - `epub:type` tokens with undeclared prefixes or unknown terms
//! - manifest `properties` that disagree with what the document contains
//!
//! Resource references are resolved against the document path and handed to a
//! caller-supplied [`ResourceRegistry`], which also answers media-type lookups.
//!
//! # Features
//!
//! - `std` (default) -- file input, [`SharedRegistry`], `std::error::Error` impls
//! - `cli` -- the `epub-content-check` command-line tool

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

extern crate alloc;

pub mod content;
pub mod diagnostics;
pub mod element;
pub mod epub_type;
pub mod error;
pub mod fallback;
pub mod media_type;
pub mod prefix;
pub mod properties;
pub mod reference;
pub mod registry;
pub mod validator;

// Re-export key types for convenience
#[cfg(feature = "std")]
pub use content::validate_content_file;
pub use content::{validate_content_document, validate_content_report};
pub use diagnostics::{
    codes, DiagnosticSink, Position, ValidationDiagnostic, ValidationReport, ValidationSeverity,
};
pub use element::{Attribute, ElementKind, ElementStart, OPS_NAMESPACE};
pub use epub_type::{validate_epub_type, TypeTokenError};
pub use error::ContentError;
pub use fallback::{FallbackCheck, FallbackContext, FallbackTracker};
pub use prefix::PrefixRegistry;
pub use properties::{
    reconcile, ContentProperty, DeclaredProperties, PropertySet, ReconcileMode, ReconcileOutcome,
    SINGLE_DOCUMENT_SENTINEL,
};
pub use reference::{is_remote, resolve_relative};
#[cfg(feature = "std")]
pub use registry::SharedRegistry;
pub use registry::{ManifestRegistry, ReferenceKind, ResourceReference, ResourceRegistry};
pub use validator::{
    ContentDocument, ContentLimits, ContentSummary, ContentValidationOptions, ContentValidator,
};
