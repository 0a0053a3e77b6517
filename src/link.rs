#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Debug, Default)]
/// A transit link: a hypermedia reference with presentation hints.
///
/// Encodes as `["~#link", ["^ ", "href", …]]`. Only `href` is required on
/// the wire; the remaining fields default to the empty string.
pub struct Link {
    /// Target of the link, as URI text.
    pub href: String,
    /// Relationship of the target to the current context.
    pub rel: String,
    /// Human-readable name.
    pub name: String,
    /// Rendering hint, conventionally `"link"` or `"image"`.
    pub render: String,
    /// Prompt to display when following the link.
    pub prompt: String,
}

impl Link {
    /// Creates a link to `href` with all other fields empty.
    pub fn new(href: impl Into<String>) -> Link {
        Link {
            href: href.into(),
            ..Link::default()
        }
    }
}
