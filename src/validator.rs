//! Single-pass conformance validation of one content document.
//!
//! [`ContentValidator`] consumes ordered start/characters/end events and
//! reports violations to a [`DiagnosticSink`] as soon as they are known.
//! Property reconciliation is the exception: it runs once, when the root
//! element closes.
//!
//! ```rust
//! use epub_content_check::{
//!     ContentDocument, ContentValidationOptions, ContentValidator, ElementKind, ElementStart,
//!     Position, ValidationReport,
//! };
//!
//! let document = ContentDocument::new("OEBPS/ch1.xhtml", "application/xhtml+xml");
//! let mut report = ValidationReport::new();
//! let mut validator =
//!     ContentValidator::new(document, None, &mut report, ContentValidationOptions::default());
//! validator.start_element(&ElementStart::new("html"), Position::new(1, 1));
//! validator.start_element(&ElementStart::new("object"), Position::new(2, 1));
//! validator.end_element(ElementKind::Object, Position::new(2, 10));
//! validator.end_element(ElementKind::Html, Position::new(3, 1));
//! validator.finish();
//!
//! assert_eq!(
//!     report.messages().collect::<Vec<_>>(),
//!     vec!["Object element doesn't provide fallback!"]
//! );
//! ```

extern crate alloc;

use alloc::format;
use alloc::string::String;

use crate::diagnostics::{codes, DiagnosticSink, Position, ValidationDiagnostic};
use crate::element::{ElementKind, ElementStart, OPS_NAMESPACE};
use crate::epub_type::{validate_epub_type, TypeTokenError};
use crate::fallback::{FallbackCheck, FallbackTracker};
use crate::media_type::{is_blessed_image_type, is_core_media_type, is_svg};
use crate::prefix::PrefixRegistry;
use crate::properties::{reconcile, ContentProperty, DeclaredProperties, PropertySet, ReconcileMode};
use crate::reference::{resolve_reference, Resolution};
use crate::registry::ResourceRegistry;

/// Manifest-supplied facts about the document being validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentDocument {
    /// Container-relative path of the document.
    pub path: String,
    /// Media type the manifest declares for the document.
    pub mime_type: String,
    /// Manifest `properties` declaration.
    pub declared_properties: DeclaredProperties,
}

impl ContentDocument {
    /// Document with no declared properties.
    pub fn new(path: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
            declared_properties: DeclaredProperties::Absent,
        }
    }

    /// Document validated on its own; reconciliation is skipped.
    pub fn single_document(path: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::new(path, mime_type).with_declared_properties(DeclaredProperties::SingleDocument)
    }

    /// Override the manifest property declaration.
    pub fn with_declared_properties(mut self, declared: DeclaredProperties) -> Self {
        self.declared_properties = declared;
        self
    }

    /// True when the document itself is SVG.
    pub fn is_svg(&self) -> bool {
        is_svg(&self.mime_type)
    }
}

/// Limits for driving a document through the pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentLimits {
    /// Maximum element nesting depth.
    pub max_depth: usize,
    /// Maximum UTF-8 byte length of a single attribute value.
    pub max_attribute_bytes: usize,
    /// Maximum diagnostics stored by reports created by the driver.
    pub max_diagnostics: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_attribute_bytes: 64 * 1024,
            max_diagnostics: 1024,
        }
    }
}

impl ContentLimits {
    /// Embedded-focused preset with smaller bounds.
    pub fn embedded() -> Self {
        Self {
            max_depth: 64,
            max_attribute_bytes: 8 * 1024,
            max_diagnostics: 128,
        }
    }
}

/// Validation pass options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContentValidationOptions {
    /// Hard limits applied by the XML driver.
    pub limits: ContentLimits,
    /// Declared/inferred property matching strategy.
    pub reconcile: ReconcileMode,
}

/// Final state of a completed pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentSummary {
    /// Document path.
    pub path: String,
    /// Properties the document exhibits.
    pub inferred: PropertySet,
    /// Prefixes declared on the root.
    pub prefixes: PrefixRegistry,
    /// Number of fallback checks that ran.
    pub fallback_checks: usize,
    /// Whether property reconciliation ran.
    pub reconciled: bool,
    /// False when an object/audio/video context was still open at the end.
    pub settled: bool,
}

/// Per-document mutable state, owned by exactly one validator.
#[derive(Clone, Debug)]
struct DocumentContext {
    document: ContentDocument,
    prefixes: PrefixRegistry,
    inferred: PropertySet,
    fallback: FallbackTracker,
}

/// Stateful validator for one content document.
pub struct ContentValidator<'a> {
    ctx: DocumentContext,
    registry: Option<&'a mut dyn ResourceRegistry>,
    sink: &'a mut dyn DiagnosticSink,
    options: ContentValidationOptions,
    depth: usize,
    reconciled: bool,
}

impl<'a> ContentValidator<'a> {
    /// Create a validator. Pass `None` as registry for single-document mode;
    /// reference-dependent checks are then skipped.
    pub fn new(
        document: ContentDocument,
        registry: Option<&'a mut dyn ResourceRegistry>,
        sink: &'a mut dyn DiagnosticSink,
        options: ContentValidationOptions,
    ) -> Self {
        Self {
            ctx: DocumentContext {
                document,
                prefixes: PrefixRegistry::new(),
                inferred: PropertySet::new(),
                fallback: FallbackTracker::new(),
            },
            registry,
            sink,
            options,
            depth: 0,
            reconciled: false,
        }
    }

    /// Document under validation.
    pub fn document(&self) -> &ContentDocument {
        &self.ctx.document
    }

    /// Current element nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Fallback state.
    pub fn fallback(&self) -> &FallbackTracker {
        &self.ctx.fallback
    }

    /// Properties inferred so far.
    pub fn inferred(&self) -> &PropertySet {
        &self.ctx.inferred
    }

    /// Prefixes declared so far.
    pub fn prefixes(&self) -> &PrefixRegistry {
        &self.ctx.prefixes
    }

    /// Handle an element start.
    pub fn start_element(&mut self, element: &ElementStart, position: Position) {
        let kind = element.kind();
        let is_root = self.depth == 0;
        self.depth += 1;

        match kind {
            ElementKind::Html if is_root => {
                if let Some(raw) = element.attribute_ns(OPS_NAMESPACE, "prefix") {
                    self.declare_prefixes(raw, position);
                }
            }
            ElementKind::Object => self.process_object(element, position),
            ElementKind::Math => self.ctx.inferred.mark(ContentProperty::Mathml),
            ElementKind::Svg if !self.ctx.document.is_svg() => {
                self.ctx.inferred.mark(ContentProperty::Svg)
            }
            ElementKind::Script => self.ctx.inferred.mark(ContentProperty::Scripted),
            ElementKind::Switch => self.ctx.inferred.mark(ContentProperty::Switch),
            ElementKind::Audio => self.ctx.fallback.enter_audio(),
            ElementKind::Video => self.process_video(element, position),
            ElementKind::Img => {
                self.ctx.fallback.satisfy_nested();
            }
            _ => {}
        }

        self.process_src(kind, element.attribute("src"), position);
        self.check_type(element.attribute_ns(OPS_NAMESPACE, "type"), position);
    }

    /// Handle character data. Only XML whitespace is ignored; a no-break
    /// space still counts as textual fallback.
    pub fn characters(&mut self, text: &str) {
        if text.chars().any(|c| !c.is_ascii_whitespace()) {
            self.ctx.fallback.satisfy_nested();
        }
    }

    /// Handle an element end.
    pub fn end_element(&mut self, kind: ElementKind, position: Position) {
        self.depth = self.depth.saturating_sub(1);

        let check = match kind {
            ElementKind::Object => self.ctx.fallback.exit_object(),
            ElementKind::Video => self.ctx.fallback.exit_video(),
            ElementKind::Audio => self.ctx.fallback.exit_audio(),
            _ => None,
        };
        if let Some(check) = check {
            self.report_fallback(check, position);
        }

        if self.depth == 0 {
            self.reconcile_properties();
        }
    }

    /// End the pass and return its final state.
    pub fn finish(mut self) -> ContentSummary {
        if !self.reconciled {
            log::debug!(
                "{}: root element never closed; reconciling at end of input",
                self.ctx.document.path
            );
            self.reconcile_properties();
        }
        let settled = self.ctx.fallback.is_settled();
        if let Some(context) = self.ctx.fallback.open_context() {
            log::warn!(
                "{}: pass ended inside an unclosed {} context",
                self.ctx.document.path,
                context
            );
            self.sink.report(ValidationDiagnostic::warning(
                codes::UNCLOSED_CONTEXT,
                format!("{} element was not closed; fallback was not checked", context),
                self.ctx.document.path.clone(),
                Position::UNKNOWN,
            ));
        }
        ContentSummary {
            path: self.ctx.document.path,
            inferred: self.ctx.inferred,
            prefixes: self.ctx.prefixes,
            fallback_checks: self.ctx.fallback.checks_performed(),
            reconciled: self.reconciled,
            settled,
        }
    }

    /// True when `prefix` is declared; reports it otherwise.
    pub fn check_prefix(&mut self, prefix: &str, position: Position) -> bool {
        let prefix = prefix.trim();
        if self.ctx.prefixes.is_declared(prefix) {
            return true;
        }
        self.report(
            codes::UNDECLARED_PREFIX,
            format!("Undeclared prefix: {}", prefix),
            position,
        );
        false
    }

    fn declare_prefixes(&mut self, raw: &str, position: Position) {
        for token in self.ctx.prefixes.declare_prefixes(raw) {
            self.report(
                codes::INVALID_PREFIX,
                format!("Invalid prefix mapping: {}", token),
                position,
            );
        }
    }

    fn check_type(&mut self, raw: Option<&str>, position: Position) {
        let Some(raw) = raw else {
            return;
        };
        for err in validate_epub_type(raw, &self.ctx.prefixes) {
            match err {
                TypeTokenError::UndeclaredPrefix(prefix) => {
                    self.check_prefix(&prefix, position);
                }
                TypeTokenError::UndefinedProperty(token) => self.report(
                    codes::UNDEFINED_TYPE,
                    format!("Undefined property: {}", token),
                    position,
                ),
            }
        }
    }

    fn process_video(&mut self, element: &ElementStart, position: Position) {
        self.ctx.fallback.enter_video();
        let Some(poster) = element.attribute("poster") else {
            return;
        };
        let resolution = self.process_src(ElementKind::Video, Some(poster), position);
        self.ctx.fallback.satisfy();
        if let Resolution::Local {
            mime_type: Some(mime_type),
            ..
        } = &resolution
        {
            if !is_blessed_image_type(mime_type) {
                self.report(
                    codes::POSTER_TYPE,
                    "Video poster must have core media image type!".into(),
                    position,
                );
            }
        }
    }

    fn process_object(&mut self, element: &ElementStart, position: Position) {
        self.ctx.fallback.enter_object();

        let type_attr = element
            .attribute("type")
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let data_mime = match element.attribute("data") {
            Some(data) => match self.process_src(ElementKind::Object, Some(data), position) {
                Resolution::Local { mime_type, .. } => mime_type,
                _ => None,
            },
            None => None,
        };

        if let (Some(declared), Some(manifest)) = (type_attr, data_mime.as_deref()) {
            if !declared.eq_ignore_ascii_case(manifest.trim()) {
                self.report(
                    codes::OBJECT_TYPE_MISMATCH,
                    "Object type and the item media-type declared in manifest, do not match!"
                        .into(),
                    position,
                );
            }
        }

        let Some(type_attr) = type_attr else {
            return;
        };
        if is_svg(type_attr) && !self.ctx.document.is_svg() {
            self.ctx.inferred.mark(ContentProperty::Svg);
        }
        if is_core_media_type(type_attr) {
            self.ctx.fallback.satisfy();
        }
        if self.ctx.fallback.has_valid_fallback() {
            return;
        }
        let has_binding = self
            .registry
            .as_deref()
            .is_some_and(|registry| registry.binding_handler(type_attr).is_some());
        if has_binding {
            log::debug!("object type {} handled by a binding", type_attr);
            self.ctx.fallback.satisfy();
        }
    }

    fn process_src(
        &mut self,
        kind: ElementKind,
        raw: Option<&str>,
        position: Position,
    ) -> Resolution {
        let resolution = resolve_reference(
            &self.ctx.document.path,
            position,
            raw,
            self.registry.as_deref_mut(),
        );
        match &resolution {
            Resolution::Skipped => {}
            Resolution::Empty => self.report(
                codes::EMPTY_SRC,
                "The src attribute must not be empty!".into(),
                position,
            ),
            Resolution::Remote => self.ctx.inferred.mark(ContentProperty::RemoteResources),
            Resolution::Local { mime_type, .. } => {
                if let Some(mime_type) = mime_type.as_deref() {
                    if is_svg(mime_type) && !self.ctx.document.is_svg() {
                        self.ctx.inferred.mark(ContentProperty::Svg);
                    }
                    if kind != ElementKind::Track && is_core_media_type(mime_type) {
                        self.ctx.fallback.satisfy_nested();
                    }
                }
            }
        }
        resolution
    }

    fn report_fallback(&mut self, check: FallbackCheck, position: Position) {
        if check.satisfied {
            return;
        }
        self.report(
            codes::MISSING_FALLBACK,
            format!("{} element doesn't provide fallback!", check.context.label()),
            position,
        );
    }

    fn reconcile_properties(&mut self) {
        if self.reconciled {
            return;
        }
        self.reconciled = true;
        let outcome = reconcile(
            &self.ctx.document.declared_properties,
            &self.ctx.inferred,
            self.options.reconcile,
        );
        log::debug!(
            "{}: reconciled properties (undeclared={}, unused={:?})",
            self.ctx.document.path,
            outcome.undeclared.len(),
            outcome.unused
        );
        for property in outcome.undeclared {
            self.report(
                codes::PROPERTY_UNDECLARED,
                format!("This file should declare in opf the property: {}", property),
                Position::UNKNOWN,
            );
        }
        if let Some(unused) = outcome.unused {
            self.report(
                codes::PROPERTY_UNUSED,
                format!(
                    "This file should not declare in opf the properties: {}",
                    unused
                ),
                Position::UNKNOWN,
            );
        }
    }

    fn report(&mut self, code: &'static str, message: String, position: Position) {
        self.sink.report(ValidationDiagnostic::error(
            code,
            message,
            self.ctx.document.path.clone(),
            position,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{ValidationReport, ValidationSeverity};
    use crate::registry::ManifestRegistry;

    const XHTML: &str = "application/xhtml+xml";

    fn at(line: usize) -> Position {
        Position::new(line, 1)
    }

    #[test]
    fn poster_counts_as_fallback_and_is_type_checked() {
        let mut registry = ManifestRegistry::new()
            .with_item("cover.tiff", "image/tiff")
            .with_item("a.ogv", "video/ogg");
        let mut report = ValidationReport::new();
        let mut validator = ContentValidator::new(
            ContentDocument::single_document("ch1.xhtml", XHTML),
            Some(&mut registry),
            &mut report,
            ContentValidationOptions::default(),
        );
        validator.start_element(&ElementStart::new("html"), at(1));
        validator.start_element(
            &ElementStart::new("video")
                .with_attribute("src", "a.ogv")
                .with_attribute("poster", "cover.tiff"),
            at(2),
        );
        validator.end_element(ElementKind::Video, at(2));
        validator.end_element(ElementKind::Html, at(3));
        let summary = validator.finish();

        assert_eq!(
            report.messages().collect::<alloc::vec::Vec<_>>(),
            alloc::vec!["Video poster must have core media image type!"]
        );
        assert_eq!(summary.fallback_checks, 1);
        assert_eq!(registry.references().len(), 2);
    }

    #[test]
    fn binding_handler_satisfies_object_fallback() {
        let mut registry = ManifestRegistry::new()
            .with_item("widget.bin", "application/x-widget")
            .with_binding("application/x-widget", "bindings/widget.xhtml");
        let mut report = ValidationReport::new();
        let mut validator = ContentValidator::new(
            ContentDocument::single_document("ch1.xhtml", XHTML),
            Some(&mut registry),
            &mut report,
            ContentValidationOptions::default(),
        );
        validator.start_element(&ElementStart::new("html"), at(1));
        validator.start_element(
            &ElementStart::new("object")
                .with_attribute("type", "application/x-widget")
                .with_attribute("data", "widget.bin"),
            at(2),
        );
        validator.end_element(ElementKind::Object, at(2));
        validator.end_element(ElementKind::Html, at(3));
        validator.finish();
        assert!(report.is_valid(), "{:?}", report.diagnostics());
    }

    #[test]
    fn inline_svg_end_does_not_reconcile_early() {
        let mut report = ValidationReport::new();
        let document = ContentDocument::new("ch1.xhtml", XHTML)
            .with_declared_properties(DeclaredProperties::Declared("svg scripted".into()));
        let mut validator = ContentValidator::new(
            document,
            None,
            &mut report,
            ContentValidationOptions::default(),
        );
        validator.start_element(&ElementStart::new("html"), at(1));
        validator.start_element(&ElementStart::new("svg"), at(2));
        validator.end_element(ElementKind::Svg, at(2));
        validator.start_element(&ElementStart::new("script"), at(3));
        validator.end_element(ElementKind::Other, at(3));
        validator.end_element(ElementKind::Html, at(4));
        let summary = validator.finish();
        assert!(summary.reconciled);
        assert!(report.is_valid(), "{:?}", report.diagnostics());
    }

    #[test]
    fn svg_document_does_not_infer_svg_property() {
        let mut report = ValidationReport::new();
        let mut validator = ContentValidator::new(
            ContentDocument::new("img.svg", "image/svg+xml"),
            None,
            &mut report,
            ContentValidationOptions::default(),
        );
        validator.start_element(&ElementStart::new("svg"), at(1));
        validator.end_element(ElementKind::Svg, at(1));
        let summary = validator.finish();
        assert!(summary.inferred.is_empty());
        assert!(report.is_valid());
    }

    #[test]
    fn finish_reconciles_unclosed_root() {
        let mut report = ValidationReport::new();
        let mut validator = ContentValidator::new(
            ContentDocument::new("ch1.xhtml", XHTML),
            None,
            &mut report,
            ContentValidationOptions::default(),
        );
        validator.start_element(&ElementStart::new("html"), at(1));
        validator.start_element(&ElementStart::new("math"), at(2));
        let summary = validator.finish();
        assert!(summary.reconciled);
        assert!(report.has_code(codes::PROPERTY_UNDECLARED));
    }

    #[test]
    fn undeclared_prefix_is_reported_once_per_token() {
        let mut report = ValidationReport::new();
        let mut validator = ContentValidator::new(
            ContentDocument::single_document("ch1.xhtml", XHTML),
            None,
            &mut report,
            ContentValidationOptions::default(),
        );
        validator.start_element(
            &ElementStart::new("html").with_attribute_ns(
                OPS_NAMESPACE,
                "prefix",
                "ex: http://example.org/#",
            ),
            at(1),
        );
        validator.start_element(
            &ElementStart::new("section").with_attribute_ns(
                OPS_NAMESPACE,
                "type",
                "ex:widget dc:title chapter",
            ),
            at(2),
        );
        assert!(validator.check_prefix(" ex ", at(2)));
        validator.end_element(ElementKind::Other, at(3));
        validator.end_element(ElementKind::Html, at(4));
        validator.finish();
        assert_eq!(
            report.messages().collect::<alloc::vec::Vec<_>>(),
            alloc::vec!["Undeclared prefix: dc"]
        );
    }

    #[test]
    fn prefix_attribute_only_read_on_root_html() {
        let mut report = ValidationReport::new();
        let mut validator = ContentValidator::new(
            ContentDocument::single_document("ch1.xhtml", XHTML),
            None,
            &mut report,
            ContentValidationOptions::default(),
        );
        validator.start_element(&ElementStart::new("html"), at(1));
        validator.start_element(
            &ElementStart::new("html").with_attribute_ns(OPS_NAMESPACE, "prefix", "ex: urn:x"),
            at(2),
        );
        assert!(validator.prefixes().is_empty());
    }

    #[test]
    fn unclosed_fallback_context_is_a_warning() {
        let mut report = ValidationReport::new();
        let mut validator = ContentValidator::new(
            ContentDocument::single_document("ch1.xhtml", XHTML),
            None,
            &mut report,
            ContentValidationOptions::default(),
        );
        validator.start_element(&ElementStart::new("html"), at(1));
        validator.start_element(&ElementStart::new("video"), at(2));
        let summary = validator.finish();

        assert!(!summary.settled);
        assert_eq!(report.diagnostics().len(), 1);
        let diagnostic = &report.diagnostics()[0];
        assert_eq!(diagnostic.severity, ValidationSeverity::Warning);
        assert_eq!(diagnostic.code, codes::UNCLOSED_CONTEXT);
        assert_eq!(
            diagnostic.message,
            "Video element was not closed; fallback was not checked"
        );
        assert_eq!(diagnostic.position, Position::UNKNOWN);
        assert!(report.is_valid());
        assert!(!report.has_code(codes::MISSING_FALLBACK));
    }
}
