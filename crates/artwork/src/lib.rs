//! Square cover art for feed items and the channel.
//!
//! Podcast platforms want square artwork of a fixed size; audio files embed
//! whatever the tagger had lying around. [`CoverArtist`] converts any source
//! image into a square JPEG ([`FitMode::Crop`] or [`FitMode::Pad`]) and keeps
//! the result in a content-addressed store: the file name is derived from the
//! source bytes (or source URL) plus the target size, so identical inputs are
//! only ever rendered once.

mod artist;
pub mod error;
mod fetch;
mod geometry;
mod render;

pub use crate::artist::{ContentKey, CoverArtAsset, CoverArtist};
pub use crate::geometry::{CropRegion, FitMode, PadLayout};
pub use crate::render::render_square;
