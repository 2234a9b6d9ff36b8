use epub_content_check::{
    validate_content_report, ContentDocument, ContentValidationOptions, DeclaredProperties,
    ManifestRegistry, ResourceRegistry, ValidationReport,
};

pub const CHAPTER_PATH: &str = "OEBPS/text/ch1.xhtml";
pub const XHTML: &str = "application/xhtml+xml";

/// Wrap `body` in a minimal XHTML document with the EPUB namespace bound.
pub fn xhtml(body: &str) -> String {
    xhtml_with_root_attrs("", body)
}

/// Like [`xhtml`], with extra attributes on the root element.
pub fn xhtml_with_root_attrs(root_attrs: &str, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\" \
         xmlns:epub=\"http://www.idpf.org/2007/ops\"{}{}>\n\
         <head><title>t</title></head>\n<body>\n{}\n</body>\n</html>\n",
        if root_attrs.is_empty() { "" } else { " " },
        root_attrs,
        body
    )
}

/// Manifest with the resources the tests reference, relative to
/// [`CHAPTER_PATH`].
pub fn chapter_registry() -> ManifestRegistry {
    ManifestRegistry::new()
        .with_item("OEBPS/images/a.png", "image/png")
        .with_item("OEBPS/images/cover.jpg", "image/jpeg")
        .with_item("OEBPS/images/cover.tiff", "image/tiff")
        .with_item("OEBPS/images/figure.svg", "image/svg+xml")
        .with_item("OEBPS/media/clip.mp4", "video/mp4")
        .with_item("OEBPS/media/song.mp3", "audio/mpeg")
        .with_item("OEBPS/media/subs.vtt", "text/vtt")
        .with_item("OEBPS/widgets/w.bin", "application/x-widget")
}

pub fn chapter(declared: DeclaredProperties) -> ContentDocument {
    ContentDocument::new(CHAPTER_PATH, XHTML).with_declared_properties(declared)
}

/// Validate `content` with a registry, collecting every diagnostic.
pub fn check_with_registry(
    content: &str,
    document: ContentDocument,
    registry: &mut ManifestRegistry,
) -> ValidationReport {
    check_with_options(
        content,
        document,
        Some(registry),
        ContentValidationOptions::default(),
    )
}

/// Validate `content` on its own: no registry, no reconciliation.
pub fn check_single(content: &str) -> ValidationReport {
    check_with_options(
        content,
        chapter(DeclaredProperties::SingleDocument),
        None,
        ContentValidationOptions::default(),
    )
}

pub fn check_with_options(
    content: &str,
    document: ContentDocument,
    registry: Option<&mut ManifestRegistry>,
    options: ContentValidationOptions,
) -> ValidationReport {
    validate_content_report(
        content.as_bytes(),
        document,
        registry.map(|r| r as &mut dyn ResourceRegistry),
        options,
    )
    .unwrap_or_else(|e| panic!("validation of {} failed: {}", CHAPTER_PATH, e))
}

pub fn messages(report: &ValidationReport) -> Vec<&str> {
    report.messages().collect()
}

/// Large synthetic chapter mixing text, media and fallback content.
pub fn synthetic_chapter(sections: usize) -> String {
    let mut body = String::with_capacity(sections * 512);
    for idx in 0..sections {
        body.push_str(&format!(
            "<section epub:type=\"chapter\" id=\"s{idx}\">\n\
             <h2>Section {idx}</h2>\n\
             <p>Paragraph {idx} with <em>inline</em> markup &amp; an entity.</p>\n\
             <object type=\"image/png\" data=\"../images/a.png\"></object>\n\
             <object data=\"../widgets/w.bin\"><img src=\"../images/a.png\" alt=\"\"/></object>\n\
             <video src=\"../media/clip.mp4\" poster=\"../images/cover.jpg\">\
             <track src=\"../media/subs.vtt\"/></video>\n\
             <audio src=\"../media/song.mp3\">Audio fallback text</audio>\n\
             </section>\n"
        ));
    }
    xhtml(&body)
}
