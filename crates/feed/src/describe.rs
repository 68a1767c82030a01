//! Item descriptions rendered from [upon] templates.
//!
//! Templates see a closed set of string fields. Each one is resolved through
//! the same chain: a free-form tag whose key matches one of the field's
//! aliases, then the structured tag path, then the caller's fallback, then
//! the placeholder `-`.
//!
//! | Field             | Free-form aliases (in precedence order)        | Structured path          |
//! |-------------------|------------------------------------------------|--------------------------|
//! | `title`           | `title`                                        | `common.title`           |
//! | `author`          | `artist`, `author`                             | `common.artist`          |
//! | `album`           | `album`                                        | `common.album`           |
//! | `genre`           | `genre`                                        | `common.genre`           |
//! | `original_artist` | `originalartist`                               | `common.original_artist` |
//! | `release_date`    | `releasedate`, `recordingdate`, `date`         | `common.date`            |
//! | `label`           | `label`, `publisher`                           | `common.label`           |
//! | `dj`              | `dj`, `mixdj`                                  | `common.dj`              |
//! | `credits`         | `credits`, `musiciancredits`                   | `common.credits`         |
//! | `release_link`    | `releaselink`, `release`, `purchaseurl`, `url` |                          |
//! | `social_links`    | `sociallinks`, `socials`                       |                          |
//!
//! Alias keys are compared case- and punctuation-insensitively, so a TXXX
//! frame called `Release Link` matches `releaselink`. When several aliases
//! are present in one file, the earliest alias in the table wins.
//!
//! A credits block is appended after the rendered template whenever
//! `credits` resolved to something other than the placeholder.

use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use podshelf_extract::TrackMetadata;
use std::collections::BTreeMap;
use std::str::FromStr;
use upon::{Engine, Template};

/// Rendered for any field nothing could resolve.
pub const PLACEHOLDER: &str = "-";

/// Layout used when no template is configured.
pub const DEFAULT_TEMPLATE: &str = "\
{{ title }} by {{ author }}

Album: {{ album }}
Genre: {{ genre }}
Original artist: {{ original_artist }}
Released: {{ release_date }}
Label: {{ label }}
DJ: {{ dj }}
Release: {{ release_link }}

{{ social_links }}";

/// Each field as (name, free-form aliases in precedence order, structured path).
const FIELDS: &[(&str, &[&str], Option<&str>)] = &[
    ("title", &["title"], Some("common.title")),
    ("author", &["artist", "author"], Some("common.artist")),
    ("album", &["album"], Some("common.album")),
    ("genre", &["genre"], Some("common.genre")),
    ("original_artist", &["originalartist"], Some("common.original_artist")),
    ("release_date", &["releasedate", "recordingdate", "date"], Some("common.date")),
    ("label", &["label", "publisher"], Some("common.label")),
    ("dj", &["dj", "mixdj"], Some("common.dj")),
    ("credits", &["credits", "musiciancredits"], Some("common.credits")),
    ("release_link", &["releaselink", "release", "purchaseurl", "url"], None),
    ("social_links", &["sociallinks", "socials"], None),
];

/// Caller-supplied values for fields the file itself may not carry.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fallbacks<'a> {
    pub title: Option<&'a str>,
    pub author: Option<&'a str>,
    pub release_link: Option<&'a str>,
    pub social_links: Option<&'a str>,
}
impl<'a> Fallbacks<'a> {
    fn get(&self, field: &str) -> Option<&'a str> {
        match field {
            "title" => self.title,
            "author" => self.author,
            "release_link" => self.release_link,
            "social_links" => self.social_links,
            _ => None,
        }
    }
}

/// The resolved field values for one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionFields(BTreeMap<&'static str, String>);
impl DescriptionFields {
    pub fn resolve(metadata: &TrackMetadata, fallbacks: &Fallbacks<'_>) -> Self {
        Self(
            FIELDS
                .iter()
                .map(|&(name, aliases, path)| {
                    let value = metadata
                        .find_freeform(aliases)
                        .or_else(|| path.and_then(|path| metadata.field(path).as_option()))
                        .or_else(|| fallbacks.get(name).map(str::trim).filter(|v| !v.is_empty()))
                        .unwrap_or(PLACEHOLDER);
                    (name, value.to_string())
                })
                .collect(),
        )
    }

    fn placeholders() -> Self {
        Self(FIELDS.iter().map(|&(name, ..)| (name, PLACEHOLDER.to_string())).collect())
    }

    /// The resolved value, or [`PLACEHOLDER`].
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(String::as_str).unwrap_or(PLACEHOLDER)
    }

    fn to_value(&self) -> upon::Value {
        upon::Value::Map(
            self.0
                .iter()
                .map(|(name, value)| (name.to_string(), upon::Value::String(value.clone())))
                .collect(),
        )
    }
}

/// A compiled description template.
///
/// Constructed via [`FromStr`], which compiles and test-renders the template
/// so that syntax errors and unknown field names surface at creation time
/// rather than on the first feed build. [`Default`] gives the built-in
/// layout.
pub struct DescriptionTemplate {
    engine: Engine<'static>,
    template: Template<'static>,
}
impl FromStr for DescriptionTemplate {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let engine = Engine::new();
        let template = engine.compile(s.to_string()).or_raise(|| ErrorKind::Template)?;
        let compiled = Self { engine, template };
        compiled.render(&DescriptionFields::placeholders())?;
        Ok(compiled)
    }
}
impl Default for DescriptionTemplate {
    fn default() -> Self {
        let engine = Engine::new();
        let Ok(template) = engine.compile(DEFAULT_TEMPLATE) else {
            unreachable!("built-in description template must compile");
        };
        Self { engine, template }
    }
}
impl DescriptionTemplate {
    /// Compiles `template`, or selects the built-in layout for `None`.
    pub fn new(template: Option<&str>) -> Result<Self> {
        match template {
            Some(template) => template.parse(),
            None => Ok(Self::default()),
        }
    }

    /// Resolves the fields of `metadata` and renders the description.
    pub fn describe(&self, metadata: &TrackMetadata, fallbacks: &Fallbacks<'_>) -> Result<String> {
        self.render(&DescriptionFields::resolve(metadata, fallbacks))
    }

    fn render(&self, fields: &DescriptionFields) -> Result<String> {
        let rendered = self
            .template
            .render(&self.engine, fields.to_value())
            .to_string()
            .or_raise(|| ErrorKind::Template)?;
        let mut description = rendered.trim_end().to_string();
        let credits = fields.get("credits");
        if credits != PLACEHOLDER {
            description.push_str("\n\nCredits:\n");
            description.push_str(credits);
        }
        Ok(description)
    }
}
