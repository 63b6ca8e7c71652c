//! Parsers for listing pages and gallery metadata documents
//!
//! Listing pages are only scanned for gallery key patterns. Gallery metadata
//! is an XML `mediaSet` document:
//!
//! ```xml
//! <mediaSet>
//!   <mediaSetItems>
//!     <mediaSetItem>
//!       <title>..</title> <description>..</description> <infoURL>..</infoURL>
//!       <file>
//!         <digest type="md5">..</digest>
//!         <mime>image/jpeg</mime> <width>..</width> <height>..</height>
//!         <bytes>12345</bytes> <url>..</url>
//!       </file>
//!     </mediaSetItem>
//!   </mediaSetItems>
//!   <linkedFrom><infoURL>..</infoURL></linkedFrom>
//!   <linkedTo><infoURL>..</infoURL></linkedTo>
//! </mediaSet>
//! ```
//!
//! Element names are matched case-insensitively.

use crate::state::{Digest, FileInfo, MediaRecord};
use crate::url::{find_all_keys, EntityKind, Identifier};
use scraper::{ElementRef, Html, Selector};

/// Everything a gallery's metadata tells us about the reference graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSet {
    /// Pictures contained in the gallery
    pub items: Vec<MediaRecord>,

    /// Metadata URLs of galleries linking to this one
    pub linked_from: Vec<String>,

    /// Metadata URLs of galleries this one links to
    pub linked_to: Vec<String>,
}

impl MediaSet {
    /// All linked gallery URLs, linked-from first
    pub fn linked_galleries(&self) -> impl Iterator<Item = &str> {
        self.linked_from
            .iter()
            .chain(self.linked_to.iter())
            .map(String::as_str)
    }
}

/// Extracts every gallery key referenced by a listing page
///
/// The same key may appear several times.
pub fn parse_listing(html: &str) -> Vec<Identifier> {
    find_all_keys(html, EntityKind::Gallery)
}

fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("bad selector '{}': {:?}", css, e))
}

/// Collects the text nodes directly under `element`, trimmed
///
/// Nested elements are ignored so that an unclosed sibling swallowed by the
/// lenient tree builder cannot leak its text into this field.
fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect::<String>()
        .trim()
        .to_string()
}

fn child_text(parent: ElementRef<'_>, css: &str) -> Result<String, String> {
    let sel = selector(css)?;
    Ok(parent.select(&sel).next().map(own_text).unwrap_or_default())
}

fn parse_file(item: ElementRef<'_>) -> Result<FileInfo, String> {
    let file_sel = selector("file")?;
    let Some(file) = item.select(&file_sel).next() else {
        return Ok(FileInfo::default());
    };

    let digest_sel = selector("digest")?;
    let digest = file
        .select(&digest_sel)
        .next()
        .map(|d| Digest {
            kind: d.value().attr("type").unwrap_or_default().to_string(),
            value: own_text(d),
        })
        .unwrap_or_default();

    Ok(FileInfo {
        digest,
        mime: child_text(file, "mime")?,
        width: child_text(file, "width")?.parse().unwrap_or(0),
        height: child_text(file, "height")?.parse().unwrap_or(0),
        bytes: child_text(file, "bytes")?.parse().ok(),
        url: child_text(file, "url")?,
    })
}

fn parse_item(item: ElementRef<'_>) -> Result<MediaRecord, String> {
    Ok(MediaRecord {
        title: child_text(item, "title")?,
        description: child_text(item, "description")?,
        info_url: child_text(item, "infourl")?,
        file: parse_file(item)?,
    })
}

fn collect_urls(root: ElementRef<'_>, css: &str) -> Result<Vec<String>, String> {
    let sel = selector(css)?;
    Ok(root
        .select(&sel)
        .map(own_text)
        .filter(|url| !url.is_empty())
        .collect())
}

/// Parses a gallery metadata document
///
/// # Arguments
///
/// * `xml` - The saved metadata document
///
/// # Returns
///
/// * `Ok(MediaSet)` - Linked galleries and contained pictures
/// * `Err(String)` - The document has no `mediaSet` element
///
/// # Example
///
/// ```
/// use picmirror::crawler::parse_media_set;
///
/// let xml = r#"<mediaSet><linkedTo><infoURL>http://h/u/gallery/bbbbbbbb.xml</infoURL></linkedTo></mediaSet>"#;
/// let set = parse_media_set(xml).unwrap();
/// assert_eq!(set.linked_to, vec!["http://h/u/gallery/bbbbbbbb.xml".to_string()]);
/// ```
pub fn parse_media_set(xml: &str) -> Result<MediaSet, String> {
    let document = Html::parse_document(xml);

    let root_sel = selector("mediaset")?;
    let root = document
        .select(&root_sel)
        .next()
        .ok_or_else(|| "missing mediaSet element".to_string())?;

    let item_sel = selector("mediasetitem")?;
    let items = root
        .select(&item_sel)
        .map(parse_item)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MediaSet {
        items,
        linked_from: collect_urls(root, "linkedfrom infourl")?,
        linked_to: collect_urls(root, "linkedto infourl")?,
    })
}
