//! The immutable asset table and path resolution.
//!
//! A [`Bundle`] maps canonical slash-separated keys to asset records. It is
//! built once from generator output, never mutated afterwards, and shared
//! freely across threads; every lookup hands back a fresh
//! [`Handle`](crate::Handle) with its own cursor state.
//!
//! # Examples
//!
//! ```
//! use bundle_manifest::AssetSpec;
//! use bundle_vfs::Bundle;
//!
//! let bundle = Bundle::builder()
//!     .add_asset(AssetSpec::file("index.html", b"<html></html>".as_slice()))
//!     .add_asset(AssetSpec::file("css/site.css", b"body {}".as_slice()))
//!     .build()?;
//!
//! // `css` was never supplied explicitly; it exists as a synthesized
//! // directory because an asset lives beneath it.
//! let mut dir = bundle.open("css")?;
//! let listing = dir.list(0)?;
//! assert_eq!(listing.entries()[0].name(), "site.css");
//! # Ok::<(), bundle_vfs::BundleError>(())
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use bundle_manifest::{DEFAULT_MOD_TIME, FileMode, Manifest};
use tracing::trace;

use crate::builder::BundleBuilder;
use crate::handle::Handle;
use crate::types::{BundleError, Metadata, Result};

/// Where an asset's bytes come from at open time.
///
/// Fixed at construction; the open path never branches on a mode flag,
/// it just asks the content to load itself.
#[derive(Debug)]
pub(crate) enum Content {
    /// Embedded payload, shared between the table and every open handle.
    Inline(Arc<[u8]>),
    /// Dev-mode absolute path, read fresh from disk on every open.
    Lazy(PathBuf),
    /// Directories carry no content.
    Directory,
}

impl Content {
    /// Resolves the bytes for a file asset.
    pub(crate) fn load(&self, key: &str) -> Result<Arc<[u8]>> {
        match self {
            Self::Inline(bytes) => Ok(Arc::clone(bytes)),
            Self::Lazy(abs) => {
                trace!(key, path = %abs.display(), "lazy content load");
                let bytes = fs::read(abs).map_err(|source| BundleError::Io {
                    path: key.to_owned(),
                    source,
                })?;
                Ok(Arc::from(bytes))
            }
            Self::Directory => Err(BundleError::InvalidOperation {
                path: key.to_owned(),
                reason: "cannot read a directory".to_owned(),
            }),
        }
    }
}

/// One immutable asset record.
#[derive(Debug)]
pub(crate) struct AssetRecord {
    pub(crate) key: String,
    pub(crate) name: String,
    pub(crate) size: u64,
    pub(crate) mode: FileMode,
    pub(crate) mod_time: i64,
    pub(crate) content: Content,
}

impl AssetRecord {
    pub(crate) fn metadata(&self) -> Metadata {
        Metadata::new(self.name.clone(), self.size, self.mode, self.mod_time)
    }
}

/// An immutable, openable table of embedded assets.
///
/// `Bundle` is the filesystem root: it resolves paths to records and issues
/// handles. It is `Send + Sync`; concurrent opens need no coordination
/// because nothing in the table ever changes after [`build`] returns.
///
/// [`build`]: BundleBuilder::build
///
/// # Examples
///
/// ```
/// use bundle_manifest::AssetSpec;
/// use bundle_vfs::Bundle;
///
/// let bundle = Bundle::builder()
///     .add_asset(AssetSpec::file("robots.txt", b"User-agent: *\n".as_slice()))
///     .build()?;
///
/// assert!(bundle.contains("robots.txt"));
/// assert!(!bundle.contains("humans.txt"));
/// # Ok::<(), bundle_vfs::BundleError>(())
/// ```
#[derive(Debug)]
pub struct Bundle {
    records: HashMap<String, Arc<AssetRecord>>,
    prefix: Option<String>,
}

impl Bundle {
    /// Starts an empty [`BundleBuilder`].
    #[must_use]
    pub fn builder() -> BundleBuilder {
        BundleBuilder::new()
    }

    /// Builds a bundle straight from a generator manifest.
    ///
    /// Equivalent to `Bundle::builder().add_assets(manifest).build()`.
    ///
    /// # Errors
    ///
    /// Fails on duplicate keys or malformed records, before any handle can
    /// be issued; see [`BundleBuilder::build`].
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_manifest::{AssetSpec, Manifest};
    /// use bundle_vfs::Bundle;
    ///
    /// let manifest = Manifest::from(vec![
    ///     AssetSpec::file("index.html", b"<html></html>".as_slice()),
    /// ]);
    ///
    /// let bundle = Bundle::from_manifest(manifest)?;
    /// assert_eq!(bundle.asset_count(), 1);
    /// # Ok::<(), bundle_vfs::BundleError>(())
    /// ```
    pub fn from_manifest(manifest: Manifest) -> Result<Self> {
        Self::builder().add_assets(manifest).build()
    }

    pub(crate) const fn from_parts(
        records: HashMap<String, Arc<AssetRecord>>,
        prefix: Option<String>,
    ) -> Self {
        Self { records, prefix }
    }

    /// Opens a path and returns a fresh handle bound to it.
    ///
    /// The path is normalized first: `.`/`..` segments collapse, duplicate
    /// and trailing slashes drop, the configured prefix and any leading
    /// slash are stripped. The empty key (from `""`, `"/"`, or a bare
    /// prefix) opens a synthesized root directory listing every top-level
    /// asset.
    ///
    /// # Errors
    ///
    /// [`BundleError::NotFound`] when nothing matches the canonical key;
    /// [`BundleError::Io`] when a dev-mode asset's lazy disk read fails;
    /// the asset exists, so that case is not a `NotFound`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_manifest::AssetSpec;
    /// use bundle_vfs::Bundle;
    ///
    /// let bundle = Bundle::builder()
    ///     .add_asset(AssetSpec::file("css/site.css", b"body {}".as_slice()))
    ///     .build()?;
    ///
    /// // Trailing slashes and leading slashes normalize away.
    /// assert!(bundle.open("/css/").unwrap().stat()?.is_dir());
    ///
    /// let mut file = bundle.open("css/site.css")?;
    /// let mut content = Vec::new();
    /// std::io::Read::read_to_end(&mut file, &mut content).unwrap();
    /// assert_eq!(content, b"body {}");
    /// # Ok::<(), bundle_vfs::BundleError>(())
    /// ```
    pub fn open(&self, path: &str) -> Result<Handle> {
        let key = normalize(path, self.prefix.as_deref());
        trace!(path, key = key.as_str(), "open");

        if key.is_empty() {
            let meta = Metadata::new("/".to_owned(), 0, FileMode::dir(0o755), DEFAULT_MOD_TIME);
            return Ok(Handle::directory("/".to_owned(), meta, self.children_of("")));
        }

        let record = self
            .records
            .get(&key)
            .ok_or_else(|| BundleError::NotFound { path: key.clone() })?;

        if record.mode.is_dir() {
            let children = self.children_of(&key);
            Ok(Handle::directory(key, record.metadata(), children))
        } else {
            let bytes = record.content.load(&record.key)?;
            Ok(Handle::file(key, record.metadata(), bytes))
        }
    }

    /// Whether a path resolves to an asset (file or directory).
    ///
    /// The root always exists.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        let key = normalize(path, self.prefix.as_deref());
        key.is_empty() || self.records.contains_key(&key)
    }

    /// Number of assets in the table, including synthesized intermediate
    /// directories.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no assets at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All canonical keys, sorted.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_manifest::AssetSpec;
    /// use bundle_vfs::Bundle;
    ///
    /// let bundle = Bundle::builder()
    ///     .add_asset(AssetSpec::file("b.txt", b"b".as_slice()))
    ///     .add_asset(AssetSpec::file("a.txt", b"a".as_slice()))
    ///     .build()?;
    ///
    /// assert_eq!(bundle.keys(), ["a.txt", "b.txt"]);
    /// # Ok::<(), bundle_vfs::BundleError>(())
    /// ```
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.records.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Direct children of a directory key (`""` for the root), sorted by
    /// name. One path segment beyond the key, no recursive descent.
    fn children_of(&self, dir_key: &str) -> Vec<Metadata> {
        let mut children: Vec<Metadata> = self
            .records
            .values()
            .filter(|record| is_direct_child(&record.key, dir_key))
            .map(|record| record.metadata())
            .collect();
        children.sort_by(|a, b| a.name().cmp(b.name()));
        children
    }
}

/// Whether `key` names a direct child of `dir_key`.
///
/// Anchors on the full remaining segment: `foo` is not a parent of
/// `foobar`, and `foo/a/b` is not a direct child of `foo`.
fn is_direct_child(key: &str, dir_key: &str) -> bool {
    if dir_key.is_empty() {
        return !key.contains('/');
    }
    key.strip_prefix(dir_key)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}

/// Reduces a request path or construction key to canonical form.
///
/// Collapses `.`, `..` and empty segments (so leading, trailing and
/// duplicate slashes all vanish), then strips the configured prefix. `..`
/// at the root is dropped rather than escaping it. The result is either
/// empty (the root) or a slash-separated key with no leading slash.
pub(crate) fn normalize(path: &str, prefix: Option<&str>) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let key = segments.join("/");

    if let Some(prefix) = prefix {
        if key == prefix {
            return String::new();
        }
        if let Some(rest) = key.strip_prefix(prefix).and_then(|r| r.strip_prefix('/')) {
            return rest.to_owned();
        }
    }
    key
}
