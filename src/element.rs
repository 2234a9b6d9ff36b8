//! Element model fed to the validator by the event driver.

extern crate alloc;

use alloc::string::String;
use smallvec::SmallVec;

/// Namespace of the EPUB `epub:*` attributes.
pub const OPS_NAMESPACE: &str = "http://www.idpf.org/2007/ops";

/// Element kinds the validator reacts to. Everything else is [`Other`].
///
/// [`Other`]: ElementKind::Other
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `html`; the root carries `epub:prefix`.
    Html,
    /// `object`, a fallback context.
    Object,
    /// MathML `math`.
    Math,
    /// `svg`, inline or as document root.
    Svg,
    /// `script`.
    Script,
    /// `epub:switch`.
    Switch,
    /// `audio`, a fallback context.
    Audio,
    /// `video`, a fallback context.
    Video,
    /// `img`; always counts as fallback.
    Img,
    /// `track`; its `src` never counts as fallback.
    Track,
    /// Any element without a rule of its own.
    Other,
}

impl ElementKind {
    /// Classify an element by its local name.
    pub fn from_local_name(name: &str) -> Self {
        match name {
            "html" => Self::Html,
            "object" => Self::Object,
            "math" => Self::Math,
            "svg" => Self::Svg,
            "script" => Self::Script,
            "switch" => Self::Switch,
            "audio" => Self::Audio,
            "video" => Self::Video,
            "img" => Self::Img,
            "track" => Self::Track,
            _ => Self::Other,
        }
    }
}

/// One attribute of a start tag, with its namespace resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI the attribute prefix is bound to, if prefixed.
    pub namespace: Option<String>,
    /// Local part of the attribute name.
    pub local_name: String,
    /// Unescaped value.
    pub value: String,
}

impl Attribute {
    /// Unprefixed attribute.
    pub fn plain(local_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
            value: value.into(),
        }
    }

    /// Attribute in `namespace`.
    pub fn namespaced(
        namespace: impl Into<String>,
        local_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
            value: value.into(),
        }
    }
}

/// Attribute storage; most content elements carry only a handful.
pub type Attributes = SmallVec<[Attribute; 8]>;

/// Start tag as seen by the validator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementStart {
    /// Local element name.
    pub local_name: String,
    /// Attributes in document order.
    pub attributes: Attributes,
}

impl ElementStart {
    /// Start tag without attributes.
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            attributes: Attributes::new(),
        }
    }

    /// Add an unprefixed attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::plain(name, value));
        self
    }

    /// Add a namespaced attribute.
    pub fn with_attribute_ns(
        mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.attributes
            .push(Attribute::namespaced(namespace, name, value));
        self
    }

    /// Classified element kind.
    pub fn kind(&self) -> ElementKind {
        ElementKind::from_local_name(&self.local_name)
    }

    /// Value of the unprefixed attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == name)
            .map(|a| a.value.as_str())
    }

    /// Value of attribute `local_name` in `namespace`.
    pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }
}
