//! Error taxonomy and stat metadata for the bundle filesystem.
//!
//! All fallible operations in this crate return [`Result`], and every
//! error variant carries the path or key it refers to. Classifier methods
//! (`is_xxx()`) let callers branch without matching on variant fields.
//!
//! # Examples
//!
//! ```
//! use bundle_vfs::BundleError;
//!
//! let error = BundleError::NotFound {
//!     path: "missing.txt".to_string(),
//! };
//!
//! assert!(error.is_not_found());
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bundle_manifest::FileMode;
use thiserror::Error;

/// Errors produced by bundle construction and handle operations.
#[derive(Error, Debug)]
pub enum BundleError {
    /// The path does not resolve to any asset in the table.
    #[error("asset not found: {path}")]
    NotFound {
        /// Canonical key that was looked up
        path: String,
    },

    /// Read attempted on a directory handle, or list on a file handle.
    #[error("{reason}: {path}")]
    InvalidOperation {
        /// Canonical key of the handle the operation was attempted on
        path: String,
        /// What was attempted, e.g. "cannot read a directory"
        reason: String,
    },

    /// Lazy dev-mode content load failed.
    ///
    /// Surfaces the underlying I/O failure (missing file, permission
    /// denied) instead of masking it as [`BundleError::NotFound`] or
    /// substituting empty content.
    #[error("failed to load asset content: {path}")]
    Io {
        /// Canonical key of the asset being loaded
        path: String,
        /// Underlying filesystem error
        #[source]
        source: std::io::Error,
    },

    /// Operation attempted on a handle after [`close`](crate::Handle::close).
    #[error("handle is closed: {path}")]
    Closed {
        /// Canonical key the handle was opened with
        path: String,
    },

    /// Two construction records normalized to the same key.
    #[error("duplicate asset key: {key}")]
    DuplicateKey {
        /// The colliding canonical key
        key: String,
    },

    /// A construction record violates the table contract.
    ///
    /// Examples: a file record with no content source, a directory record
    /// carrying content, a record nested under a regular file.
    #[error("invalid asset record {key}: {reason}")]
    InvalidRecord {
        /// Key of the offending record, as supplied by the generator
        key: String,
        /// Why the record was rejected
        reason: String,
    },
}

impl BundleError {
    /// Returns `true` if this is a lookup miss.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_vfs::BundleError;
    ///
    /// let error = BundleError::NotFound {
    ///     path: "a.txt".to_string(),
    /// };
    ///
    /// assert!(error.is_not_found());
    /// assert!(!error.is_io());
    /// ```
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for a read-on-directory or list-on-file mismatch.
    #[must_use]
    pub const fn is_invalid_operation(&self) -> bool {
        matches!(self, Self::InvalidOperation { .. })
    }

    /// Returns `true` if a lazy disk load failed.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns `true` if the handle had already been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }

    /// Returns `true` for construction-time contract violations.
    ///
    /// These never occur after a table has been built; they are the loud
    /// startup failures for malformed generator output.
    #[must_use]
    pub const fn is_construction(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. } | Self::InvalidRecord { .. })
    }
}

/// Type alias for bundle operation results.
pub type Result<T> = std::result::Result<T, BundleError>;

/// Stat metadata for one asset, as returned by
/// [`Handle::stat`](crate::Handle::stat) and directory listings.
///
/// A plain value type: cloning it never touches the table or the content.
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
/// let meta = bundle.open("css/site.css")?.stat()?;
/// assert_eq!(meta.name(), "site.css");
/// assert_eq!(meta.size(), 7);
/// assert!(!meta.is_dir());
/// # Ok::<(), bundle_vfs::BundleError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    name: String,
    size: u64,
    mode: FileMode,
    mod_time: i64,
}

impl Metadata {
    pub(crate) const fn new(name: String, size: u64, mode: FileMode, mod_time: i64) -> Self {
        Self {
            name,
            size,
            mode,
            mod_time,
        }
    }

    /// Base name of the asset (last path segment; `/` for the root).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content length in bytes; `0` for directories.
    ///
    /// For dev-mode assets this is the size recorded at generation time,
    /// not whatever happens to be on disk right now.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Permission bits plus directory flag.
    #[must_use]
    pub const fn mode(&self) -> FileMode {
        self.mode
    }

    /// Whether the asset is a directory.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }

    /// Modification time.
    ///
    /// Unless the generator preserved real mtimes, this is the fixed
    /// sentinel [`bundle_manifest::DEFAULT_MOD_TIME`].
    #[must_use]
    pub fn modified(&self) -> SystemTime {
        if self.mod_time >= 0 {
            UNIX_EPOCH + Duration::from_secs(self.mod_time.unsigned_abs())
        } else {
            UNIX_EPOCH - Duration::from_secs(self.mod_time.unsigned_abs())
        }
    }
}
