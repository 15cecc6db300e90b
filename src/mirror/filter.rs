//! Classification of links found on an index page.
//!
//! A link is either a file (final segment looks like `<name>.<ext>`), a
//! subdirectory strictly below the current page, or out of scope. Files are
//! further checked against two case-insensitive block-lists: repository
//! metadata file names and detached checksum/signature extensions.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::path_map::{is_within, strip_query};

/// Repository metadata files that are regenerated by the target repository.
pub const DEFAULT_BLOCKED_FILENAMES: &[&str] = &["maven-metadata.xml", "archetype-catalog.xml"];

/// Detached checksum and signature extensions.
pub const DEFAULT_BLOCKED_EXTENSIONS: &[&str] = &["md5", "sha1", "asc", "sha256", "sha512"];

/// Final path segment of a file link: `<name>.<ext>`, ext 1-6 chars without dots.
#[allow(clippy::expect_used)]
static FILE_SEGMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Static pattern, safe to panic
    Regex::new(r"^.*/([^/]+\.([^./]{1,6}))$").expect("file segment regex is valid")
});

/// What a discovered link is, relative to the page it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkClass {
    /// A terminal artifact.
    File {
        /// Percent-decoded final path segment.
        filename: String,
        /// Extension as written in the link.
        extension: String,
    },
    /// A subdirectory page strictly below the current page.
    Directory,
    /// Another host, a back link, or the page itself.
    Ignore,
}

/// Why a file link was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The file name is on the block-list.
    Filename,
    /// The extension is on the block-list.
    Extension,
}

/// Immutable block-lists applied to file links.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    blocked_filenames: HashSet<String>,
    blocked_extensions: HashSet<String>,
}

impl Default for LinkFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_BLOCKED_FILENAMES.iter().copied(),
            DEFAULT_BLOCKED_EXTENSIONS.iter().copied(),
        )
    }
}

impl LinkFilter {
    /// Creates a filter; entries are lowercased.
    pub fn new<F, E>(filenames: F, extensions: E) -> Self
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            blocked_filenames: filenames
                .into_iter()
                .map(|name| name.as_ref().to_lowercase())
                .collect(),
            blocked_extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Classifies `link` as found on `page`.
    ///
    /// `page` must be a directory URL. Only links on the same host that extend
    /// the page URL are in scope; query strings and fragments are ignored so
    /// that column-sorting links do not look like new directories.
    #[must_use]
    pub fn classify(&self, page: &Url, link: &Url) -> LinkClass {
        let link = strip_query(link);
        if !is_within(page, &link) || link.as_str() == page.as_str() {
            return LinkClass::Ignore;
        }

        if let Some(captures) = FILE_SEGMENT_PATTERN.captures(link.path()) {
            let raw_name = &captures[1];
            let filename = urlencoding::decode(raw_name)
                .map_or_else(|_| raw_name.to_string(), |name| name.into_owned());
            return LinkClass::File {
                filename,
                extension: captures[2].to_string(),
            };
        }

        LinkClass::Directory
    }

    /// Returns why a file must not be transferred, if it must not.
    #[must_use]
    pub fn block_reason(&self, filename: &str, extension: &str) -> Option<BlockReason> {
        if self.blocked_filenames.contains(&filename.to_lowercase()) {
            Some(BlockReason::Filename)
        } else if self.blocked_extensions.contains(&extension.to_lowercase()) {
            Some(BlockReason::Extension)
        } else {
            None
        }
    }

}
