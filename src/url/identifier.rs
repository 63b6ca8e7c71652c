use crate::ReferenceError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Length of every gallery and picture key
pub const KEY_LEN: usize = 8;

static GALLERY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/gallery/([0-9a-z]{8})").expect("valid gallery pattern"));

static PIC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/pic/([0-9a-z]{8})").expect("valid pic pattern"));

/// The two kinds of entity the remote service names with a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Gallery,
    Pic,
}

impl EntityKind {
    /// The path segment (and backup file prefix) for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gallery => "gallery",
            Self::Pic => "pic",
        }
    }

    /// The pattern that locates a key of this kind inside a URL or document
    pub fn pattern(&self) -> &'static Regex {
        match self {
            Self::Gallery => &GALLERY_PATTERN,
            Self::Pic => &PIC_PATTERN,
        }
    }
}

/// An 8-character lowercase alphanumeric key naming a gallery or picture
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Wraps `key` if it is a well-formed bare key
    pub fn parse(key: &str) -> Option<Self> {
        if is_bare_key(key) {
            Some(Self(key.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_bare_key(s: &str) -> bool {
    s.len() == KEY_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

/// Extracts an entity key from a bare key or from a URL containing one
///
/// A bare 8-character key is returned as-is. Anything else must contain the
/// kind's path pattern (`/gallery/<key>` or `/pic/<key>`).
///
/// # Arguments
///
/// * `key_or_url` - A bare key or any URL spelling that embeds one
/// * `kind` - Which namespace the key belongs to
///
/// # Returns
///
/// * `Ok(Identifier)` - The extracted key
/// * `Err(ReferenceError)` - Nothing resembling a key was found
///
/// # Examples
///
/// ```
/// use picmirror::url::{find_key, EntityKind};
///
/// let key = find_key("http://www.picpix.com/kelly/gallery/0000abcd.xml", EntityKind::Gallery).unwrap();
/// assert_eq!(key.as_str(), "0000abcd");
///
/// let key = find_key("0000abcd", EntityKind::Pic).unwrap();
/// assert_eq!(key.as_str(), "0000abcd");
/// ```
pub fn find_key(key_or_url: &str, kind: EntityKind) -> Result<Identifier, ReferenceError> {
    let trimmed = key_or_url.trim();
    if let Some(key) = Identifier::parse(trimmed) {
        return Ok(key);
    }

    kind.pattern()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| Identifier(m.as_str().to_string()))
        .ok_or_else(|| ReferenceError::NoMatch(key_or_url.to_string()))
}

/// Finds every key of `kind` embedded anywhere in `text`, in document order
///
/// Duplicates are kept; deduplication is the registry's job.
pub fn find_all_keys(text: &str, kind: EntityKind) -> Vec<Identifier> {
    kind.pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| Identifier(m.as_str().to_string()))
        .collect()
}
