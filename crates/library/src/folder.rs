/// Fallback artist and title parsed from a folder name.
///
/// Libraries are often organized as one folder per set or release, named
/// `"{artist}{separator}{title}"`. When a file carries no tags, these are the
/// next best display fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderCredit {
    pub artist: String,
    pub title: String,
}
impl FolderCredit {
    /// Splits on the first occurrence of `separator`. Returns `None` when the
    /// separator is absent or either side is blank.
    pub fn parse(folder: &str, separator: &str) -> Option<Self> {
        if separator.is_empty() {
            return None;
        }
        let (artist, title) = folder.split_once(separator)?;
        let (artist, title) = (artist.trim(), title.trim());
        if artist.is_empty() || title.is_empty() {
            return None;
        }
        Some(Self {
            artist: artist.to_string(),
            title: title.to_string(),
        })
    }
}
