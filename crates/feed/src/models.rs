//! The feed document model.
//!
//! This is the shape a feed consumer needs, not a wire format. Everything
//! derives [`Serialize`] so an outer layer can render RSS, JSON or anything
//! else from it.

use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Owner {
    pub name: String,
    pub email: String,
}

/// Channel-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub copyright: Option<String>,
    pub author: String,
    pub owner: Owner,
    pub explicit: bool,
    pub category: Option<String>,
    /// Square channel image URL.
    pub image: Option<String>,
}

/// Media payload of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enclosure {
    pub url: String,
    pub mime_type: &'static str,
    /// Size in bytes.
    pub length: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guid {
    pub value: String,
    /// Always `false`: identifiers are opaque URNs, not links.
    pub is_permalink: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub guid: Guid,
    pub title: String,
    pub author: String,
    /// `H:MM:SS` or `M:SS`.
    pub duration: String,
    pub explicit: bool,
    pub description: String,
    pub enclosure: Enclosure,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub cover_url: Option<String>,
}

/// A fully materialized feed. Rebuilt wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedDocument {
    pub channel: Channel,
    /// Newest first.
    pub items: Vec<FeedItem>,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}
