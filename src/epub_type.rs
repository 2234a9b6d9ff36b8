//! `epub:type` token validation.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::prefix::PrefixRegistry;

/// EPUB 3 Structural Semantics Vocabulary terms usable without a prefix.
const STRUCTURAL_SEMANTICS: &[&str] = &[
    "abstract",
    "acknowledgments",
    "afterword",
    "annotation",
    "annoref",
    "answer",
    "answers",
    "appendix",
    "aside",
    "assessment",
    "assessments",
    "backlink",
    "backmatter",
    "balloon",
    "biblioentry",
    "bibliography",
    "biblioref",
    "bodymatter",
    "bridgehead",
    "case-study",
    "chapter",
    "colophon",
    "concluding-sentence",
    "conclusion",
    "contributors",
    "copyright-page",
    "cover",
    "covertitle",
    "credit",
    "credits",
    "dedication",
    "division",
    "endnote",
    "endnotes",
    "epigraph",
    "epilogue",
    "errata",
    "feedback",
    "figure",
    "fill-in-the-blank-problem",
    "footnote",
    "footnotes",
    "foreword",
    "frontmatter",
    "fulltitle",
    "general-problem",
    "glossary",
    "glossdef",
    "glossref",
    "glossterm",
    "halftitle",
    "halftitlepage",
    "help",
    "imprimatur",
    "imprint",
    "index",
    "index-editor-note",
    "index-entry",
    "index-entry-list",
    "index-group",
    "index-headnotes",
    "index-legend",
    "index-locator",
    "index-locator-list",
    "index-locator-range",
    "index-term",
    "index-term-categories",
    "index-term-category",
    "index-xref-preferred",
    "index-xref-related",
    "introduction",
    "keyword",
    "keywords",
    "label",
    "landmarks",
    "learning-objective",
    "learning-objectives",
    "learning-outcome",
    "learning-outcomes",
    "learning-resource",
    "learning-resources",
    "learning-standard",
    "learning-standards",
    "list",
    "list-item",
    "loa",
    "loi",
    "lot",
    "lov",
    "match-problem",
    "multiple-choice-problem",
    "note",
    "noteref",
    "notice",
    "ordinal",
    "other-credits",
    "page-list",
    "pagebreak",
    "panel",
    "panel-group",
    "part",
    "practice",
    "practices",
    "preamble",
    "preface",
    "prologue",
    "pullquote",
    "qna",
    "question",
    "referrer",
    "revision-history",
    "rearnote",
    "rearnotes",
    "seriespage",
    "sidebar",
    "sound-area",
    "subchapter",
    "subtitle",
    "table",
    "table-cell",
    "table-row",
    "text-area",
    "tip",
    "title",
    "titlepage",
    "toc",
    "toc-brief",
    "topic-sentence",
    "true-false-problem",
    "volume",
    "warning",
];

/// Why a single `epub:type` token was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeTokenError {
    /// `prefix:local` where `prefix` is not declared on the root.
    UndeclaredPrefix(String),
    /// Unprefixed token outside the vocabulary, or a prefixed token with an
    /// empty part.
    UndefinedProperty(String),
}

/// True when `token` is a built-in structural semantics term.
pub fn is_vocabulary_term(token: &str) -> bool {
    STRUCTURAL_SEMANTICS.contains(&token)
}

/// Check every whitespace-separated token of an `epub:type` value.
pub fn validate_epub_type(raw: &str, prefixes: &PrefixRegistry) -> Vec<TypeTokenError> {
    raw.split_whitespace()
        .filter_map(|token| check_token(token, prefixes).err())
        .collect()
}

fn check_token(token: &str, prefixes: &PrefixRegistry) -> Result<(), TypeTokenError> {
    match token.split_once(':') {
        Some((prefix, local)) => {
            if prefix.is_empty() || local.is_empty() {
                return Err(TypeTokenError::UndefinedProperty(token.to_string()));
            }
            if !prefixes.is_declared(prefix) {
                return Err(TypeTokenError::UndeclaredPrefix(prefix.to_string()));
            }
            Ok(())
        }
        None if is_vocabulary_term(token) => Ok(()),
        None => Err(TypeTokenError::UndefinedProperty(token.to_string())),
    }
}
