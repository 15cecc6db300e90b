//! Mapping between remote URLs under a traversal root and local paths.
//!
//! `local = mirror_root / relative(root, url)`. Within one crawl the mapping is
//! one-to-one: segments are percent-decoded individually and anything that
//! could escape or alias a directory (`.`, `..`, embedded separators) is
//! rejected instead of being mapped.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::ScopeError;

/// Returns `url` with query and fragment removed.
#[must_use]
pub fn strip_query(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);
    stripped
}

/// Returns `url` with a path ending in `/`, so that prefix checks against it
/// only match its descendants.
#[must_use]
pub fn as_directory(url: &Url) -> Url {
    let mut dir = strip_query(url);
    if !dir.path().ends_with('/') {
        let path = format!("{}/", dir.path());
        dir.set_path(&path);
    }
    dir
}

/// Returns true if `url` is on the same host as `root` and extends it.
#[must_use]
pub fn is_within(root: &Url, url: &Url) -> bool {
    root.host_str() == url.host_str() && url.as_str().starts_with(root.as_str())
}

/// Maps `url` to a path relative to `root`.
///
/// `root` must be a directory URL (see [`as_directory`]). The root itself maps
/// to the empty path.
///
/// # Errors
///
/// Returns [`ScopeError::OutOfScope`] for another host or a URL that does not
/// extend `root`, and [`ScopeError::UnsafeSegment`] for segments that decode to
/// `.`/`..` or contain a path separator.
pub fn relative_path(root: &Url, url: &Url) -> Result<PathBuf, ScopeError> {
    let url = strip_query(url);
    if !is_within(root, &url) {
        return Err(ScopeError::out_of_scope(url.as_str(), root.as_str()));
    }

    let remainder = &url.as_str()[root.as_str().len()..];
    let mut relative = PathBuf::new();
    for raw in remainder.split('/').filter(|s| !s.is_empty()) {
        let segment = decode_segment(raw);
        if !is_safe_segment(&segment) {
            return Err(ScopeError::unsafe_segment(url.as_str(), segment));
        }
        relative.push(segment);
    }
    Ok(relative)
}

/// Maps `url` to its location under `mirror_root`.
///
/// # Errors
///
/// Same as [`relative_path`].
pub fn local_path(mirror_root: &Path, root: &Url, url: &Url) -> Result<PathBuf, ScopeError> {
    Ok(mirror_root.join(relative_path(root, url)?))
}

/// Maps a path relative to the mirror root back to a URL under `root`.
///
/// # Errors
///
/// Returns [`ScopeError::UnsafeSegment`] if `relative` is absolute or contains
/// `..`, or if the joined URL cannot be parsed.
pub fn remote_url(root: &Url, relative: &Path) -> Result<Url, ScopeError> {
    let mut url = as_directory(root);
    let components: Vec<_> = relative.components().collect();
    for (index, component) in components.iter().enumerate() {
        let Component::Normal(name) = component else {
            return Err(ScopeError::unsafe_segment(
                root.as_str(),
                relative.display().to_string(),
            ));
        };
        let name = name.to_string_lossy();
        url = if index + 1 == components.len() {
            append_file(&url, &name)?
        } else {
            append_segment(&url, &name)?
        };
    }
    Ok(url)
}

/// Appends a directory segment; the result always ends with `/`.
///
/// # Errors
///
/// Returns [`ScopeError::UnsafeSegment`] for unsafe names.
pub fn append_segment(base: &Url, segment: &str) -> Result<Url, ScopeError> {
    let file = append_file(base, segment)?;
    Ok(as_directory(&file))
}

/// Appends a file name to a directory URL.
///
/// # Errors
///
/// Returns [`ScopeError::UnsafeSegment`] for unsafe names.
pub fn append_file(base: &Url, name: &str) -> Result<Url, ScopeError> {
    if !is_safe_segment(name) {
        return Err(ScopeError::unsafe_segment(base.as_str(), name));
    }
    let base = as_directory(base);
    let joined = format!("{}{}", base.as_str(), urlencoding::encode(name));
    Url::parse(&joined).map_err(|_| ScopeError::unsafe_segment(base.as_str(), name))
}

fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |decoded| decoded.into_owned())
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}
