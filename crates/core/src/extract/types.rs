//! Record types produced by the listing and detail extractors.

use serde::{Deserialize, Serialize};

/// A lightweight item record scraped from one catalog listing page.
///
/// Immutable once created; the enrichment stage copies it into an
/// [`EnrichedRecord`] rather than mutating it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Site-unique item id, stable across runs (derived from the detail URL).
    pub id: String,
    /// Display title.
    pub title: String,
    /// Link to the item's detail page, as found on the listing page.
    pub relative_link: String,
    /// Category key this record was collected under.
    #[serde(default)]
    pub category: String,
    /// Listing thumbnail, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    /// Quality tag shown next to the title (e.g. "HD", "1080p").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    /// Short blurb from the listing page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Last-updated date shown on the listing page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_date: Option<String>,
}

impl ListingRecord {
    /// Create a minimal record; optional listing fields start empty.
    pub fn new(id: impl Into<String>, title: impl Into<String>, relative_link: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            relative_link: relative_link.into(),
            category: String::new(),
            poster: None,
            quality: None,
            description: None,
            update_date: None,
        }
    }
}

/// Download link kind, classified by URI scheme at extraction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Magnet,
    Ftp,
    Http,
    /// Anything that is not magnet/ftp/http(s), e.g. web-player or thunder URIs.
    Player,
}

impl LinkKind {
    /// Classify a URI by scheme. The kind is fixed at extraction time and
    /// never recomputed afterwards.
    pub fn from_uri(uri: &str) -> Self {
        if uri.starts_with("magnet:") {
            LinkKind::Magnet
        } else if uri.starts_with("ftp://") {
            LinkKind::Ftp
        } else if uri.starts_with("http://") || uri.starts_with("https://") {
            LinkKind::Http
        } else {
            LinkKind::Player
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Magnet => "magnet",
            LinkKind::Ftp => "ftp",
            LinkKind::Http => "http",
            LinkKind::Player => "player",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "magnet" => Some(LinkKind::Magnet),
            "ftp" => Some(LinkKind::Ftp),
            "http" => Some(LinkKind::Http),
            "player" => Some(LinkKind::Player),
            _ => None,
        }
    }
}

/// One download link belonging to exactly one enriched record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadLink {
    /// Quality label as shown next to the link ("1080p", "HD国语中字", ...).
    pub quality: String,
    pub uri: String,
    pub kind: LinkKind,
}

impl DownloadLink {
    /// Build a link, deriving the kind from the URI scheme.
    pub fn new(quality: impl Into<String>, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let kind = LinkKind::from_uri(&uri);
        Self {
            quality: quality.into(),
            uri,
            kind,
        }
    }
}

/// The open attribute set a detail page may carry. Every field is optional;
/// extractors omit what they cannot find instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cast: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_hd: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<String>,
}

impl MovieAttributes {
    /// Overlay `other` onto `self`: present fields win, absent fields keep
    /// whatever an earlier parse attempt already found.
    pub fn merge_from(&mut self, other: MovieAttributes) {
        fn take(dst: &mut Option<String>, src: Option<String>) {
            if src.is_some() {
                *dst = src;
            }
        }
        take(&mut self.full_title, other.full_title);
        take(&mut self.translated_name, other.translated_name);
        take(&mut self.original_name, other.original_name);
        take(&mut self.year, other.year);
        take(&mut self.country, other.country);
        take(&mut self.genre, other.genre);
        take(&mut self.language, other.language);
        take(&mut self.subtitles, other.subtitles);
        take(&mut self.director, other.director);
        take(&mut self.synopsis, other.synopsis);
        take(&mut self.duration, other.duration);
        take(&mut self.file_size, other.file_size);
        take(&mut self.resolution, other.resolution);
        take(&mut self.format, other.format);
        take(&mut self.release_date, other.release_date);
        take(&mut self.publish_date, other.publish_date);
        take(&mut self.imdb_rating, other.imdb_rating);
        take(&mut self.poster_hd, other.poster_hd);
        if !other.cast.is_empty() {
            self.cast = other.cast;
        }
        if !other.screenshots.is_empty() {
            self.screenshots = other.screenshots;
        }
    }
}

/// Output of one detail-page parse attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailFragment {
    pub attributes: MovieAttributes,
    pub download_links: Vec<DownloadLink>,
}

/// A listing record merged with whatever the detail stage could extract.
///
/// Built fresh per enrichment attempt; it only becomes durable through the
/// store, and a later enrichment of the same id supersedes it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub listing: ListingRecord,
    /// Absolute detail-page URL, set once a detail parse succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_url: Option<String>,
    #[serde(default)]
    pub attributes: MovieAttributes,
    #[serde(default)]
    pub download_links: Vec<DownloadLink>,
}

impl EnrichedRecord {
    /// Pass-through constructor: listing fields only, no attributes, no links.
    pub fn from_listing(listing: ListingRecord) -> Self {
        Self {
            listing,
            movie_url: None,
            attributes: MovieAttributes::default(),
            download_links: Vec::new(),
        }
    }

    /// Fold a parse attempt into the record. Attributes merge field-wise;
    /// links are replaced only when the fragment actually found some, so an
    /// incomplete later attempt cannot erase links from an earlier one.
    pub fn apply_fragment(&mut self, fragment: DetailFragment) {
        self.attributes.merge_from(fragment.attributes);
        if !fragment.download_links.is_empty() {
            self.download_links = fragment.download_links;
        }
    }

    pub fn has_links(&self) -> bool {
        !self.download_links.is_empty()
    }
}

/// One parsed listing page: its records plus the page count the site reports.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub records: Vec<ListingRecord>,
    /// Reported total page count; a hint, defaulting to 1 when pagination
    /// markers are absent or unparsable.
    pub total_pages: u32,
}
