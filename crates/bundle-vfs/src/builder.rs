//! Builder for constructing asset tables.
//!
//! Construction is the only moment a bundle can fail: duplicate keys and
//! malformed records are rejected here, loudly, before any handle is
//! issued. Once [`build`](BundleBuilder::build) returns `Ok`, every later
//! failure is a per-call lookup or I/O error, never a table defect.
//!
//! # Examples
//!
//! ```
//! use bundle_manifest::AssetSpec;
//! use bundle_vfs::BundleBuilder;
//!
//! let bundle = BundleBuilder::new()
//!     .add_asset(AssetSpec::file("index.html", b"<html></html>".as_slice()))
//!     .add_asset(AssetSpec::file("css/site.css", b"body {}".as_slice()))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(bundle.asset_count(), 3); // css synthesized as a directory
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use bundle_manifest::{AssetSource, AssetSpec, DEFAULT_MOD_TIME, FileMode};
use tracing::debug;

use crate::bundle::{AssetRecord, Bundle, Content, normalize};
use crate::types::{BundleError, Result};

/// Fluent builder for a [`Bundle`].
///
/// Records are collected in order and validated together at
/// [`build`](BundleBuilder::build) time. Intermediate directories that no
/// record names explicitly are synthesized so that every ancestor of every
/// asset is openable.
///
/// # Examples
///
/// ```
/// use bundle_manifest::AssetSpec;
/// use bundle_vfs::BundleBuilder;
///
/// // A generator invoked with `-prefix site/` emits keys carrying the
/// // prefix; the builder strips it from keys and open() paths alike.
/// let bundle = BundleBuilder::new()
///     .strip_prefix("site")
///     .add_asset(AssetSpec::file("site/index.html", b"<html></html>".as_slice()))
///     .build()
///     .unwrap();
///
/// assert!(bundle.contains("index.html"));
/// assert!(bundle.contains("/site/index.html"));
/// ```
#[derive(Debug, Default)]
pub struct BundleBuilder {
    specs: Vec<AssetSpec>,
    prefix: Option<String>,
}

impl BundleBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            specs: Vec::new(),
            prefix: None,
        }
    }

    /// Strips the given prefix from construction keys and from every path
    /// later passed to [`Bundle::open`].
    #[must_use]
    pub fn strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Appends one asset record.
    #[must_use]
    pub fn add_asset(mut self, spec: AssetSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Appends every record from an iterator (a
    /// [`Manifest`](bundle_manifest::Manifest), a vector, ...).
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_manifest::{AssetSpec, Manifest};
    /// use bundle_vfs::BundleBuilder;
    ///
    /// let manifest = Manifest::from(vec![
    ///     AssetSpec::file("a.txt", b"a".as_slice()),
    ///     AssetSpec::file("b.txt", b"b".as_slice()),
    /// ]);
    ///
    /// let bundle = BundleBuilder::new().add_assets(manifest).build().unwrap();
    /// assert_eq!(bundle.asset_count(), 2);
    /// ```
    #[must_use]
    pub fn add_assets(mut self, specs: impl IntoIterator<Item = AssetSpec>) -> Self {
        self.specs.extend(specs);
        self
    }

    /// Number of records collected so far (synthesized directories are
    /// added later, at build time).
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.specs.len()
    }

    /// Validates the collected records and constructs the immutable table.
    ///
    /// # Errors
    ///
    /// - [`BundleError::DuplicateKey`] when two records normalize to the
    ///   same key.
    /// - [`BundleError::InvalidRecord`] when a record violates the table
    ///   contract: a file with no content source, a directory carrying
    ///   content, an inline payload whose length contradicts the recorded
    ///   size, a key that normalizes to the root, or an asset nested under
    ///   a regular file.
    pub fn build(self) -> Result<Bundle> {
        let prefix = self
            .prefix
            .map(|p| normalize(&p, None))
            .filter(|p| !p.is_empty());

        let mut records: HashMap<String, Arc<AssetRecord>> =
            HashMap::with_capacity(self.specs.len());

        for spec in self.specs {
            let key = normalize(&spec.key, prefix.as_deref());
            if key.is_empty() {
                return Err(BundleError::InvalidRecord {
                    key: spec.key,
                    reason: "key normalizes to the bundle root".to_owned(),
                });
            }

            let content = match (spec.mode.is_dir(), spec.source) {
                (true, None) => Content::Directory,
                (true, Some(_)) => {
                    return Err(BundleError::InvalidRecord {
                        key,
                        reason: "directory record carries a content source".to_owned(),
                    });
                }
                (false, Some(AssetSource::Inline(bytes))) => {
                    if bytes.len() as u64 != spec.size {
                        return Err(BundleError::InvalidRecord {
                            key,
                            reason: format!(
                                "recorded size {} does not match {} bytes of inline content",
                                spec.size,
                                bytes.len()
                            ),
                        });
                    }
                    Content::Inline(Arc::from(bytes.into_owned()))
                }
                (false, Some(AssetSource::Disk(abs))) => Content::Lazy(abs),
                (false, None) => {
                    return Err(BundleError::InvalidRecord {
                        key,
                        reason: "file record has no content source".to_owned(),
                    });
                }
            };

            let name = if spec.name.is_empty() {
                base_name(&key).to_owned()
            } else {
                spec.name
            };

            let record = Arc::new(AssetRecord {
                key: key.clone(),
                name,
                size: spec.size,
                mode: spec.mode,
                mod_time: spec.mod_time,
                content,
            });
            if records.insert(key.clone(), record).is_some() {
                return Err(BundleError::DuplicateKey { key });
            }
        }

        synthesize_ancestors(&mut records)?;

        debug!(assets = records.len(), "bundle constructed");
        Ok(Bundle::from_parts(records, prefix))
    }
}

/// Inserts a directory record for every missing ancestor of every key, so
/// each level of the tree is openable and shows up in its parent's
/// listing. Explicit generator-supplied directory records are left alone.
fn synthesize_ancestors(records: &mut HashMap<String, Arc<AssetRecord>>) -> Result<()> {
    let keys: Vec<String> = records.keys().cloned().collect();
    for key in keys {
        for (idx, _) in key.match_indices('/') {
            let ancestor = &key[..idx];
            match records.get(ancestor) {
                Some(existing) if !existing.mode.is_dir() => {
                    return Err(BundleError::InvalidRecord {
                        key: key.clone(),
                        reason: format!("nested under regular file `{ancestor}`"),
                    });
                }
                Some(_) => {}
                None => {
                    records.insert(
                        ancestor.to_owned(),
                        Arc::new(AssetRecord {
                            key: ancestor.to_owned(),
                            name: base_name(ancestor).to_owned(),
                            size: 0,
                            mode: FileMode::dir(0o755),
                            mod_time: DEFAULT_MOD_TIME,
                            content: Content::Directory,
                        }),
                    );
                }
            }
        }
    }
    Ok(())
}

/// Last slash-separated segment of a canonical key.
fn base_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
