use std::collections::BTreeMap;

/// A node in a tag tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    /// A single text value.
    Scalar(String),
    /// A repeated field (several artists, several genres, …).
    List(Vec<TagValue>),
    /// A named container of further nodes.
    Group(BTreeMap<String, TagValue>),
}

/// Result of looking up a dotted path in a [`TagValue`] tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    /// A non-blank scalar, trimmed of whitespace and NUL padding.
    Present(&'a str),
    /// Missing, blank, or not a scalar.
    Absent,
}
impl<'a> Field<'a> {
    pub fn as_option(self) -> Option<&'a str> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    pub fn is_present(self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl TagValue {
    /// Builds a [`Group`](Self::Group), dropping empty lists and empty
    /// groups so absent fields stay absent.
    pub fn group<K: Into<String>>(entries: impl IntoIterator<Item = (K, TagValue)>) -> Self {
        Self::Group(
            entries
                .into_iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Builds a [`List`](Self::List) of scalars.
    pub fn list<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::List(values.into_iter().map(|v| Self::Scalar(v.into())).collect())
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(_) => false,
            Self::List(items) => items.is_empty(),
            Self::Group(entries) => entries.is_empty(),
        }
    }

    /// Unwraps one level of multiplicity: a list yields its first element.
    fn first(&self) -> Option<&TagValue> {
        match self {
            Self::List(items) => items.first(),
            other => Some(other),
        }
    }

    /// Walks a dotted path (`"common.artist"`) through nested groups.
    ///
    /// At every step, including the last, a list is replaced by its first
    /// element. Anything that does not end on a non-blank scalar is
    /// [`Field::Absent`].
    ///
    /// ```
    /// use podshelf_extract::{Field, TagValue};
    ///
    /// let tags = TagValue::group([(
    ///     "common",
    ///     TagValue::group([
    ///         ("title", TagValue::from("Opening Set")),
    ///         ("artist", TagValue::list(["Bonobo", "Guest"])),
    ///     ]),
    /// )]);
    /// assert_eq!(tags.get("common.title"), Field::Present("Opening Set"));
    /// assert_eq!(tags.get("common.artist"), Field::Present("Bonobo"));
    /// assert_eq!(tags.get("common.album"), Field::Absent);
    /// ```
    pub fn get(&self, path: &str) -> Field<'_> {
        let mut node = self;
        for segment in path.split('.') {
            node = match node.first() {
                Some(Self::Group(entries)) => match entries.get(segment) {
                    Some(child) => child,
                    None => return Field::Absent,
                },
                _ => return Field::Absent,
            };
        }
        match node.first() {
            Some(Self::Scalar(value)) => match value.trim_matches(|c: char| c.is_whitespace() || c == '\0') {
                "" => Field::Absent,
                trimmed => Field::Present(trimmed),
            },
            _ => Field::Absent,
        }
    }
}
impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}
impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}
impl Default for TagValue {
    fn default() -> Self {
        Self::Group(BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tree() -> TagValue {
        TagValue::group([
            (
                "common",
                TagValue::group([
                    ("title", TagValue::from("  Warehouse Set  ")),
                    ("artist", TagValue::list(["First", "Second"])),
                    ("genre", TagValue::list(Vec::<String>::new())),
                    ("comment", TagValue::from("   ")),
                ]),
            ),
            (
                "native",
                TagValue::List(vec![
                    TagValue::group([("id3v2", TagValue::group([("TXXX", TagValue::from("x"))]))]),
                    TagValue::group([("ignored", TagValue::from("y"))]),
                ]),
            ),
        ])
    }

    #[rstest]
    #[case("common.title", Field::Present("Warehouse Set"))]
    #[case("common.artist", Field::Present("First"))]
    #[case("common.genre", Field::Absent)]
    #[case("common.comment", Field::Absent)]
    #[case("common.missing", Field::Absent)]
    #[case("common", Field::Absent)]
    #[case("common.title.deeper", Field::Absent)]
    #[case("native.id3v2.TXXX", Field::Present("x"))]
    #[case("native.ignored", Field::Absent)]
    #[case("", Field::Absent)]
    fn test_get(#[case] path: &str, #[case] expected: Field<'static>) {
        assert_eq!(tree().get(path), expected);
    }

    #[test]
    fn test_group_drops_empty_children() {
        let tags = TagValue::group([("empty", TagValue::list(Vec::<String>::new())), ("kept", TagValue::from("v"))]);
        let TagValue::Group(entries) = tags else { panic!("expected group") };
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["kept"]);
    }

    #[test]
    fn test_field_option() {
        assert_eq!(Field::Present("a").as_option(), Some("a"));
        assert_eq!(Field::Absent.as_option(), None);
        assert!(!Field::Absent.is_present());
    }
}
