//! Resource reference resolution.
//!
//! Turns raw `src`/`data`/`poster` attribute values into container-relative
//! targets, registers them with the cross-reference registry and looks up
//! their manifest media type.

extern crate alloc;

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::diagnostics::Position;
use crate::registry::{ReferenceKind, ResourceRegistry};

/// Only this scheme marks a resource as remote.
const REMOTE_SCHEME: &str = "http://";

/// Outcome of resolving one raw reference value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Attribute absent, or no registry to resolve against.
    Skipped,
    /// Attribute present but blank.
    Empty,
    /// Remote resource; never registered.
    Remote,
    /// Local resource registered with the registry.
    Local {
        target: String,
        mime_type: Option<String>,
    },
}

/// True when `raw` points at a remote resource.
pub fn is_remote(raw: &str) -> bool {
    raw.trim_start().starts_with(REMOTE_SCHEME)
}

/// Resolve `raw` against `document_path` and forward it to `registry`.
pub(crate) fn resolve_reference(
    document_path: &str,
    position: Position,
    raw: Option<&str>,
    registry: Option<&mut (dyn ResourceRegistry + '_)>,
) -> Resolution {
    let Some(raw) = raw else {
        return Resolution::Skipped;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Resolution::Empty;
    }
    let Some(registry) = registry else {
        return Resolution::Skipped;
    };
    if is_remote(trimmed) {
        return Resolution::Remote;
    }

    let target = resolve_relative(document_path, trimmed);
    log::trace!("{}: registering reference {} -> {}", document_path, raw, target);
    registry.register_reference(document_path, position, &target, ReferenceKind::Generic);
    let mime_type = registry.mime_type(&target);
    Resolution::Local { target, mime_type }
}

/// Resolve a relative reference against the path of the referring document.
///
/// Fragments and queries are dropped, `%XX` escapes decoded, and `.`/`..`
/// segments collapsed. A leading `/` anchors at the container root.
pub fn resolve_relative(base_path: &str, rel: &str) -> String {
    let rel = resource_path_without_fragment(rel);
    let rel = percent_decode(rel);
    if rel.contains("://") {
        return rel.into_owned();
    }
    if rel.starts_with('/') {
        return normalize_path(rel.trim_start_matches('/'));
    }
    if rel.is_empty() {
        return normalize_path(base_path);
    }
    let base_dir = base_path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
    if base_dir.is_empty() {
        normalize_path(&rel)
    } else {
        normalize_path(&format!("{}/{}", base_dir, rel))
    }
}

fn resource_path_without_fragment(path: &str) -> &str {
    let end = path.find(['#', '?']).unwrap_or(path.len());
    &path[..end]
}

fn percent_decode(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') {
        return Cow::Borrowed(raw);
    }
    let bytes = raw.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    match String::from_utf8(out) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(_) => Cow::Owned(raw.to_string()),
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(8);
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts.join("/")
}
