use crate::tags::{Field, TagValue};
use std::time::Duration;

/// One raw tag item, as the file stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeformTag {
    pub key: String,
    pub value: String,
}
impl FreeformTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The key reduced to lowercase alphanumerics, with any ID3v2 `TXXX:`
    /// prefix removed, so `"Release Link"`, `"release_link"` and
    /// `"TXXX:RELEASE-LINK"` all compare equal.
    pub fn normalized_key(&self) -> String {
        normalize_key(&self.key)
    }
}

pub(crate) fn normalize_key(key: &str) -> String {
    let key = key.trim();
    let key = match key.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("txxx:") => &key[5..],
        _ => key,
    };
    key.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase).collect()
}

/// Everything read from one audio file's tags and stream properties.
///
/// Derived per pipeline run and never cached across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    /// The tag tree; see the [crate documentation](crate) for its layout.
    pub tags: TagValue,
    /// Every text item from every tag in the file, in file order.
    pub freeform: Vec<FreeformTag>,
    pub duration: Duration,
    /// Embedded cover picture (front cover preferred), still encoded.
    pub picture: Option<Vec<u8>>,
}
impl TrackMetadata {
    /// Looks up a dotted path in [`tags`](Self::tags).
    pub fn field(&self, path: &str) -> Field<'_> {
        self.tags.get(path)
    }

    pub fn title(&self) -> Option<&str> {
        self.field("common.title").as_option()
    }

    pub fn artist(&self) -> Option<&str> {
        self.field("common.artist").as_option()
    }

    pub fn album(&self) -> Option<&str> {
        self.field("common.album").as_option()
    }

    pub fn genre(&self) -> Option<&str> {
        self.field("common.genre").as_option()
    }

    /// Whole seconds of playing time.
    pub fn duration_secs(&self) -> u64 {
        self.duration.as_secs()
    }

    /// Finds a free-form tag by key, trying `aliases` in order.
    ///
    /// Keys are compared after [normalization](FreeformTag::normalized_key),
    /// so aliases should be given in that form (`"releaselink"`). The first
    /// alias with a non-blank match wins; when a file carries the same key
    /// twice, the first occurrence wins. The result therefore never depends
    /// on how the tag format happened to order its items relative to each
    /// other across different keys.
    pub fn find_freeform(&self, aliases: &[&str]) -> Option<&str> {
        let normalized: Vec<(String, &str)> = self
            .freeform
            .iter()
            .map(|tag| (tag.normalized_key(), tag.value.trim()))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        aliases.iter().find_map(|alias| {
            let alias = normalize_key(alias);
            normalized.iter().find(|(key, _)| *key == alias).map(|(_, value)| *value)
        })
    }
}
