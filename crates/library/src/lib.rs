//! The audio library: what is on disk, whether it changed, and what each
//! file is called in the feed.
//!
//! - [`scan`] enumerates [`AudioAsset`]s in a root directory (flat, or one
//!   folder level deep) and [`LibrarySignature`] fingerprints that set.
//! - [`FolderCredit`] parses `"{artist}{separator}{title}"` folder names into
//!   fallback display fields.
//! - [`IdentifierGenerator`] hands out stable, opaque item identifiers.

mod asset;
pub mod error;
mod folder;
mod identify;
mod scan;

pub use crate::asset::{AudioAsset, AudioFormat};
pub use crate::folder::FolderCredit;
pub use crate::identify::{Digest, Identifier, IdentifierGenerator};
pub use crate::scan::{LibrarySignature, scan, scan_stream};
