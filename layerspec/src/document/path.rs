//! Key paths identifying entries within a nested document.

use std::fmt;

/// Path from the document root to an entry, one key per level.
///
/// Used in error messages and in the provenance side table produced by
/// [`Document::annotations`](crate::Document::annotations).
///
/// # Examples
///
/// ```
/// use layerspec::KeyPath;
///
/// let path = KeyPath::root().child("figures").child("0");
/// assert_eq!(path.to_string(), "figures.0");
/// assert_eq!(KeyPath::root().to_string(), "<root>");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// The empty path addressing the document root.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Returns a new path extended by `key`.
    #[must_use]
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.to_owned());
        Self { segments }
    }

    /// Whether this path addresses the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path's keys, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.segments.join("."))
        }
    }
}

impl<S: Into<String>> FromIterator<S> for KeyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}
