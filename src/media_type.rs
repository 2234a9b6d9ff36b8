//! Media type classification for EPUB 3 publication resources.

/// Media type of XHTML content documents.
pub const XHTML: &str = "application/xhtml+xml";
/// Media type of SVG content documents and images.
pub const SVG: &str = "image/svg+xml";

/// Core media types a reading system must render without fallback.
const CORE_MEDIA_TYPES: &[&str] = &[
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/svg+xml",
    "application/xhtml+xml",
    "application/x-dtbncx+xml",
    "application/vnd.ms-opentype",
    "application/font-woff",
    "application/smil+xml",
    "application/pls+xml",
    "audio/mpeg",
    "audio/mp4",
    "text/css",
    "text/javascript",
];

/// Image types accepted where a core media image is required.
const BLESSED_IMAGE_TYPES: &[&str] = &["image/gif", "image/jpeg", "image/png", "image/svg+xml"];

/// Strip media type parameters (`; charset=...`) and surrounding whitespace.
fn essence(mime_type: &str) -> &str {
    mime_type.split(';').next().unwrap_or(mime_type).trim()
}

/// True when `mime_type` is an EPUB 3 core media type.
pub fn is_core_media_type(mime_type: &str) -> bool {
    let essence = essence(mime_type);
    CORE_MEDIA_TYPES
        .iter()
        .any(|core| core.eq_ignore_ascii_case(essence))
}

/// True when `mime_type` is a core media image type.
pub fn is_blessed_image_type(mime_type: &str) -> bool {
    let essence = essence(mime_type);
    BLESSED_IMAGE_TYPES
        .iter()
        .any(|image| image.eq_ignore_ascii_case(essence))
}

/// True when `mime_type` denotes SVG.
pub fn is_svg(mime_type: &str) -> bool {
    essence(mime_type).eq_ignore_ascii_case(SVG)
}
