//! XML driver: streams a content document through [`ContentValidator`].
//!
//! # Usage
//!
//! ```rust
//! use epub_content_check::content::validate_content_report;
//! use epub_content_check::{ContentDocument, ContentValidationOptions, ManifestRegistry};
//!
//! # fn example() -> Result<(), epub_content_check::ContentError> {
//! let xhtml = br#"<html xmlns="http://www.w3.org/1999/xhtml"><body>
//! <object type="image/png" data="a.png"/>
//! </body></html>"#;
//! let mut registry = ManifestRegistry::new().with_item("OEBPS/a.png", "image/png");
//! let document = ContentDocument::single_document("OEBPS/ch1.xhtml", "application/xhtml+xml");
//! let report = validate_content_report(
//!     xhtml,
//!     document,
//!     Some(&mut registry),
//!     ContentValidationOptions::default(),
//! )?;
//! assert!(report.is_valid());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

extern crate alloc;

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use smallvec::SmallVec;

use crate::diagnostics::{DiagnosticSink, Position, ValidationReport};
use crate::element::{Attribute, Attributes, ElementKind, ElementStart};
use crate::error::ContentError;
use crate::registry::ResourceRegistry;
use crate::validator::{
    ContentDocument, ContentLimits, ContentSummary, ContentValidationOptions, ContentValidator,
};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Validate `content` and stream diagnostics into `sink`.
pub fn validate_content_document(
    content: &[u8],
    document: ContentDocument,
    registry: Option<&mut dyn ResourceRegistry>,
    sink: &mut dyn DiagnosticSink,
    options: ContentValidationOptions,
) -> Result<ContentSummary, ContentError> {
    let limits = options.limits;
    // Reborrow so the registry and the sink can share one shorter lifetime.
    let registry = registry.map(|r| r as &mut dyn ResourceRegistry);
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(false);

    let lines = LineIndex::new(content);
    let mut scopes = NamespaceScopes::new();
    let mut stack: Vec<ElementKind> = Vec::with_capacity(16);
    let mut validator = ContentValidator::new(document, registry, sink, options);
    let mut buf = Vec::with_capacity(256);

    loop {
        let offset = reader_offset(reader.buffer_position());
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| ContentError::Xml {
                message: err.to_string(),
                offset: reader_offset(reader.error_position()),
            })?;
        match event {
            Event::Start(e) => {
                check_depth(stack.len(), limits)?;
                let element = element_start(&reader, &e, &mut scopes, limits)?;
                let kind = element.kind();
                stack.push(kind);
                validator.start_element(&element, lines.position(offset));
            }
            Event::Empty(e) => {
                check_depth(stack.len(), limits)?;
                let element = element_start(&reader, &e, &mut scopes, limits)?;
                let position = lines.position(offset);
                validator.start_element(&element, position);
                scopes.pop();
                validator.end_element(element.kind(), position);
            }
            Event::End(_) => {
                let kind = stack.pop().unwrap_or(ElementKind::Other);
                scopes.pop();
                validator.end_element(kind, lines.position(offset));
            }
            Event::Text(e) => {
                let text = decode(&reader, &e)?;
                validator.characters(&text);
            }
            Event::CData(e) => {
                let text = decode(&reader, &e)?;
                validator.characters(&text);
            }
            Event::GeneralRef(e) => {
                let name = decode(&reader, &e)?;
                validator.characters(&general_ref_text(&name));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(validator.finish())
}

/// Validate `content` and collect diagnostics into a report capped by
/// [`ContentLimits::max_diagnostics`].
pub fn validate_content_report(
    content: &[u8],
    document: ContentDocument,
    registry: Option<&mut dyn ResourceRegistry>,
    options: ContentValidationOptions,
) -> Result<ValidationReport, ContentError> {
    let mut report = ValidationReport::with_max_diagnostics(options.limits.max_diagnostics);
    validate_content_document(content, document, registry, &mut report, options)?;
    Ok(report)
}

/// Read a content document from disk and validate it.
#[cfg(feature = "std")]
pub fn validate_content_file<P: AsRef<std::path::Path>>(
    path: P,
    document: ContentDocument,
    registry: Option<&mut dyn ResourceRegistry>,
    options: ContentValidationOptions,
) -> Result<ValidationReport, ContentError> {
    let bytes = std::fs::read(path)?;
    validate_content_report(&bytes, document, registry, options)
}

fn check_depth(depth: usize, limits: ContentLimits) -> Result<(), ContentError> {
    if depth >= limits.max_depth {
        return Err(ContentError::limit("max_depth", depth + 1, limits.max_depth));
    }
    Ok(())
}

fn reader_offset<T: TryInto<usize>>(raw: T) -> usize {
    raw.try_into().unwrap_or(usize::MAX)
}

fn decode<'b>(reader: &Reader<&[u8]>, raw: &'b [u8]) -> Result<Cow<'b, str>, ContentError> {
    reader.decoder().decode(raw).map_err(|err| ContentError::Decode {
        message: format!("{:?}", err),
        offset: reader_offset(reader.buffer_position()),
    })
}

fn element_start(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    scopes: &mut NamespaceScopes,
    limits: ContentLimits,
) -> Result<ElementStart, ContentError> {
    let name = e.name();
    let qname = decode(reader, name.as_ref())?;
    let local_name = qname.rsplit(':').next().unwrap_or(&qname).to_string();

    let mut raw_attrs: SmallVec<[(String, String); 8]> = SmallVec::new();
    let mut bindings: Bindings = SmallVec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ContentError::Xml {
            message: err.to_string(),
            offset: reader_offset(reader.buffer_position()),
        })?;
        let key = decode(reader, attr.key.as_ref())?;
        let raw_value = decode(reader, attr.value.as_ref())?;
        if raw_value.len() > limits.max_attribute_bytes {
            return Err(ContentError::limit(
                "max_attribute_bytes",
                raw_value.len(),
                limits.max_attribute_bytes,
            ));
        }
        let value = match quick_xml::escape::unescape(&raw_value) {
            Ok(unescaped) => unescaped.into_owned(),
            Err(_) => raw_value.into_owned(),
        };
        if let Some(prefix) = key.strip_prefix("xmlns:") {
            bindings.push((prefix.to_string(), value));
        } else if key != "xmlns" {
            raw_attrs.push((key.into_owned(), value));
        }
    }
    scopes.push(bindings);

    let attributes: Attributes = raw_attrs
        .into_iter()
        .map(|(key, value)| resolve_attribute(scopes, key, value))
        .collect();

    Ok(ElementStart {
        local_name,
        attributes,
    })
}

// An unbound prefix keeps the qualified name so it never matches a lookup.
fn resolve_attribute(scopes: &NamespaceScopes, key: String, value: String) -> Attribute {
    if let Some((prefix, local)) = key.split_once(':') {
        if let Some(namespace) = scopes.resolve(prefix) {
            return Attribute::namespaced(namespace, local, value);
        }
    }
    Attribute::plain(key, value)
}

/// Text standing in for an entity or character reference.
///
/// Character references resolve to their character so `&#32;` stays
/// whitespace; named entities always count as content.
fn general_ref_text(name: &str) -> String {
    let code = if let Some(hex) = name
        .strip_prefix("#x")
        .or_else(|| name.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse::<u32>().ok()
    } else {
        None
    };
    match code.and_then(char::from_u32) {
        Some(c) => c.to_string(),
        None => format!("&{};", name),
    }
}

type Bindings = SmallVec<[(String, String); 2]>;

/// Prefix bindings per open element.
struct NamespaceScopes {
    scopes: Vec<Bindings>,
}

impl NamespaceScopes {
    fn new() -> Self {
        Self {
            scopes: Vec::with_capacity(16),
        }
    }

    fn push(&mut self, bindings: Bindings) {
        self.scopes.push(bindings);
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn resolve(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(bound, _)| bound == prefix)
            .map(|(_, uri)| uri.as_str())
    }
}

/// Byte offset to line/column mapping.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(content: &[u8]) -> Self {
        let mut starts = Vec::with_capacity(content.len() / 64 + 1);
        starts.push(0);
        starts.extend(
            content
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    fn position(&self, offset: usize) -> Position {
        let line = match self.starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let column = offset.saturating_sub(self.starts[line]) + 1;
        Position::new(line + 1, column)
    }
}
