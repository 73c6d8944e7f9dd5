//! Keys and paths addressing locations inside a [`Value`](crate::Value) tree.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::NestedError;

/// Default separator for string-encoded paths.
pub const DEFAULT_SEPARATOR: &str = ".";

/// One step of a path: a mapping key / record field, or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Mapping key or record field name.
    Name(String),
    /// Position in a list or tuple.
    Index(usize),
}

impl Key {
    /// Key used to look this step up in a mapping.
    #[must_use]
    pub fn as_map_key(&self) -> Cow<'_, str> {
        match self {
            Key::Name(name) => Cow::Borrowed(name),
            Key::Index(index) => Cow::Owned(index.to_string()),
        }
    }

    /// Sequence position, if this step can index a sequence.
    ///
    /// Names made only of digits count, so that string paths such as
    /// `"layers.0"` reach into lists.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(index) => Some(*index),
            Key::Name(name) => name.parse().ok(),
        }
    }

    /// Field name, if this step can address a record field.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

/// Ordered sequence of keys from the root towards a leaf.
///
/// # Example
/// ```
/// use nb_core::path::{Key, Path};
/// let path = Path::parse("c.g.1", ".").unwrap();
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.keys()[2].as_index(), Some(1));
/// assert_eq!(path.to_string(), "c.g.1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    keys: Vec<Key>,
}

impl Path {
    /// The empty path, addressing the root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a string path on `sep`. Every component becomes a [`Key::Name`].
    ///
    /// # Errors
    /// [`NestedError::EmptySeparator`] if `sep` is empty.
    pub fn parse(path: &str, sep: &str) -> Result<Self, NestedError> {
        if sep.is_empty() {
            return Err(NestedError::EmptySeparator);
        }
        Ok(Self::split(path, sep))
    }

    fn split(path: &str, sep: &str) -> Self {
        path.split(sep).map(Key::from).collect()
    }

    /// Return a new path with `key` appended.
    #[must_use]
    pub fn child(&self, key: impl Into<Key>) -> Self {
        let mut keys = self.keys.clone();
        keys.push(key.into());
        Self { keys }
    }

    /// All keys, root first.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True for the root path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Join the keys with `sep`.
    #[must_use]
    pub fn join(&self, sep: &str) -> String {
        self.keys
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(sep)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.keys.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.join(DEFAULT_SEPARATOR))
    }
}

impl FromStr for Path {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::split(s, DEFAULT_SEPARATOR))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Self::split(s, DEFAULT_SEPARATOR)
    }
}

impl From<Vec<Key>> for Path {
    fn from(keys: Vec<Key>) -> Self {
        Self { keys }
    }
}

impl From<&[String]> for Path {
    fn from(keys: &[String]) -> Self {
        keys.iter().map(|k| Key::Name(k.clone())).collect()
    }
}

impl FromIterator<Key> for Path {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_join_roundtrip() {
        let path = Path::parse("a/b/c", "/").unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.join("/"), "a/b/c");
        assert_eq!(path.to_string(), "a.b.c");
    }

    #[test]
    fn empty_separator_is_rejected() {
        assert_eq!(Path::parse("ab", ""), Err(NestedError::EmptySeparator));
        assert_eq!(Path::parse("", ".").unwrap().keys(), &[Key::from("")]);
    }

    #[test]
    fn digit_names_index_sequences() {
        assert_eq!(Key::from("12").as_index(), Some(12));
        assert_eq!(Key::from("x1").as_index(), None);
        assert_eq!(Key::Index(3).as_map_key(), "3");
    }

    #[test]
    fn child_does_not_touch_parent() {
        let root = Path::new();
        let child = root.child("a").child(0usize);
        assert!(root.is_empty());
        assert_eq!(child.keys(), &[Key::from("a"), Key::Index(0)]);
        assert_eq!(root.to_string(), "<root>");
    }
}
