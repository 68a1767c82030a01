//! Embedded tag extraction for audio files.
//!
//! [`read`] turns a file on disk into a [`TrackMetadata`]: a tree of tag
//! values addressed by dotted paths (see [`TagValue`]), the raw free-form tag
//! collection, the playing time and any embedded cover picture.
//!
//! Tags are organized as:
//!
//! | Path                     | Contents                                         |
//! |--------------------------|--------------------------------------------------|
//! | `common.<field>`         | Normalized fields (`title`, `artist`, `album`, `genre`, `year`, `date`, `album_artist`, `original_artist`, `label`, `dj`, `credits`, `comment`) |
//! | `format.<field>`         | Stream properties (`duration`, `bitrate`, `sample_rate`, `channels`) |
//! | `native.<format>.<key>`  | Every text item of each tag, keyed per tag format (`id3v2`, `vorbiscomments`, …) |
//!
//! Multi-valued fields are lists; the accessor unwraps the first element.

pub mod error;
mod metadata;
mod read;
mod tags;

pub use crate::metadata::{FreeformTag, TrackMetadata};
pub use crate::read::read;
pub use crate::tags::{Field, TagValue};
