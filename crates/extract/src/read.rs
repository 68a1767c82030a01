use crate::error::{ErrorKind, Result};
use crate::metadata::{FreeformTag, TrackMetadata};
use crate::tags::TagValue;
use exn::ResultExt;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::picture::PictureType;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, ItemValue, Tag};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::instrument;

/// Reads tags, stream properties and embedded artwork from an audio file.
///
/// This is blocking I/O; async callers should run it on a blocking thread.
/// A file without any tags is not an error, it simply yields an empty tag
/// tree and whatever the stream properties say.
///
/// # Errors
///
/// - [`Unreadable`](ErrorKind::Unreadable) if the file cannot be opened.
/// - [`Unsupported`](ErrorKind::Unsupported) if it cannot be parsed.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read(path: impl AsRef<Path>) -> Result<TrackMetadata> {
    let path = path.as_ref();
    let probe = Probe::open(path).or_raise(|| ErrorKind::Unreadable(path.to_path_buf()))?;
    let tagged = probe.read().or_raise(|| ErrorKind::Unsupported(path.to_path_buf()))?;
    let primary = tagged.primary_tag().or_else(|| tagged.first_tag());
    if primary.is_none() {
        tracing::debug!("No tags found in audio file");
    }
    Ok(TrackMetadata {
        tags: TagValue::group([
            ("common", primary.map(common).unwrap_or_default()),
            ("format", format(&tagged)),
            ("native", native(&tagged)),
        ]),
        freeform: freeform(&tagged),
        duration: tagged.properties().duration(),
        picture: picture(&tagged),
    })
}

fn scalar(value: Option<impl Into<String>>) -> TagValue {
    value.map(|v| TagValue::Scalar(v.into())).unwrap_or_else(|| TagValue::list(Vec::<String>::new()))
}

fn strings(tag: &Tag, key: &ItemKey) -> TagValue {
    TagValue::list(tag.get_strings(key))
}

fn common(tag: &Tag) -> TagValue {
    TagValue::group([
        ("title", scalar(tag.title())),
        ("artist", strings(tag, &ItemKey::TrackArtist)),
        ("album", scalar(tag.album())),
        ("genre", strings(tag, &ItemKey::Genre)),
        ("year", scalar(tag.year().map(|y| y.to_string()))),
        ("date", scalar(tag.get_string(&ItemKey::RecordingDate))),
        ("album_artist", scalar(tag.get_string(&ItemKey::AlbumArtist))),
        ("original_artist", scalar(tag.get_string(&ItemKey::OriginalArtist))),
        ("label", scalar(tag.get_string(&ItemKey::Label))),
        ("dj", scalar(tag.get_string(&ItemKey::MixDj))),
        ("credits", strings(tag, &ItemKey::MusicianCredits)),
        ("comment", scalar(tag.comment())),
    ])
}

fn format(tagged: &TaggedFile) -> TagValue {
    let properties = tagged.properties();
    TagValue::group([
        ("duration", scalar(Some(properties.duration().as_secs().to_string()))),
        ("bitrate", scalar(properties.audio_bitrate().map(|b| b.to_string()))),
        ("sample_rate", scalar(properties.sample_rate().map(|r| r.to_string()))),
        ("channels", scalar(properties.channels().map(|c| c.to_string()))),
    ])
}

/// Key under which an item is exposed in `native.*` and in the free-form list.
fn item_key(key: &ItemKey) -> String {
    match key {
        ItemKey::Unknown(raw) => raw.clone(),
        known => format!("{known:?}"),
    }
}

fn text_items(tag: &Tag) -> impl Iterator<Item = (String, &str)> {
    tag.items().filter_map(|item| match item.value() {
        ItemValue::Text(text) | ItemValue::Locator(text) => Some((item_key(item.key()), text.as_str())),
        _ => None,
    })
}

fn native(tagged: &TaggedFile) -> TagValue {
    TagValue::group(tagged.tags().iter().map(|tag| {
        let mut items: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, text) in text_items(tag) {
            items.entry(key).or_default().push(text.to_string());
        }
        let name = format!("{:?}", tag.tag_type()).to_lowercase();
        (name, TagValue::group(items.into_iter().map(|(key, values)| (key, TagValue::list(values)))))
    }))
}

fn freeform(tagged: &TaggedFile) -> Vec<FreeformTag> {
    tagged
        .tags()
        .iter()
        .flat_map(text_items)
        .map(|(key, text)| FreeformTag::new(key, text))
        .collect()
}

fn picture(tagged: &TaggedFile) -> Option<Vec<u8>> {
    let pictures = || tagged.tags().iter().flat_map(|tag| tag.pictures().iter());
    pictures()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures().next())
        .map(|p| p.data().to_vec())
}
