//! Per-open handle objects.
//!
//! Every call to [`Bundle::open`](crate::Bundle::open) produces a fresh
//! [`Handle`] owning its own cursor state: a byte position for files, a
//! pagination offset for directories. Handles never reference the table
//! they came from, so they may outlive it and move freely across threads.
//!
//! # Examples
//!
//! ```
//! use bundle_manifest::AssetSpec;
//! use bundle_vfs::Bundle;
//!
//! let bundle = Bundle::builder()
//!     .add_asset(AssetSpec::file("a.txt", b"hello".as_slice()))
//!     .build()?;
//!
//! let mut handle = bundle.open("a.txt")?;
//! let mut buf = [0u8; 3];
//! assert_eq!(handle.read(&mut buf)?, 3);
//! assert_eq!(&buf, b"hel");
//! assert_eq!(handle.read(&mut buf)?, 2);
//! assert_eq!(&buf[..2], b"lo");
//! assert_eq!(handle.read(&mut buf)?, 0); // end of data
//! # Ok::<(), bundle_vfs::BundleError>(())
//! ```

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use crate::types::{BundleError, Metadata, Result};

/// One page of directory entries, plus the end-of-listing signal.
///
/// Returned by [`Handle::list`]. Once `is_exhausted()` turns true, further
/// calls keep returning an empty, exhausted listing rather than erroring.
#[derive(Debug, Clone)]
pub struct Listing {
    entries: Vec<Metadata>,
    exhausted: bool,
}

impl Listing {
    /// The children returned by this call, ordered by name.
    #[must_use]
    pub fn entries(&self) -> &[Metadata] {
        &self.entries
    }

    /// Number of entries in this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the pagination cursor has reached the end of the child list.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Consumes the listing, yielding the entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<Metadata> {
        self.entries
    }
}

impl IntoIterator for Listing {
    type Item = Metadata;
    type IntoIter = std::vec::IntoIter<Metadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Cursor state; which operations are legal depends on the variant.
#[derive(Debug)]
enum State {
    File { bytes: Arc<[u8]>, pos: u64 },
    Directory { children: Vec<Metadata>, pos: usize },
    Closed,
}

/// A transient, single-owner view of one opened asset.
///
/// File handles support [`read`](Handle::read) (and the [`std::io::Read`] /
/// [`std::io::Seek`] traits); directory handles support
/// [`list`](Handle::list); both support [`stat`](Handle::stat) and
/// [`close`](Handle::close). Mixing them up yields
/// [`BundleError::InvalidOperation`], and anything after `close` yields
/// [`BundleError::Closed`].
///
/// # Examples
///
/// ```
/// use bundle_manifest::AssetSpec;
/// use bundle_vfs::Bundle;
///
/// let bundle = Bundle::builder()
///     .add_asset(AssetSpec::file("css/site.css", b"body {}".as_slice()))
///     .add_asset(AssetSpec::file("css/print.css", b"@media print {}".as_slice()))
///     .build()?;
///
/// let mut dir = bundle.open("css")?;
/// let page = dir.list(1)?;
/// assert_eq!(page.entries()[0].name(), "print.css");
/// assert!(!page.is_exhausted());
///
/// let page = dir.list(1)?;
/// assert_eq!(page.entries()[0].name(), "site.css");
/// assert!(page.is_exhausted());
/// # Ok::<(), bundle_vfs::BundleError>(())
/// ```
#[derive(Debug)]
pub struct Handle {
    path: String,
    meta: Metadata,
    state: State,
}

impl Handle {
    pub(crate) const fn file(path: String, meta: Metadata, bytes: Arc<[u8]>) -> Self {
        Self {
            path,
            meta,
            state: State::File { bytes, pos: 0 },
        }
    }

    pub(crate) const fn directory(path: String, meta: Metadata, children: Vec<Metadata>) -> Self {
        Self {
            path,
            meta,
            state: State::Directory { children, pos: 0 },
        }
    }

    /// Metadata of the asset this handle is bound to.
    ///
    /// # Errors
    ///
    /// Only fails with [`BundleError::Closed`] after [`close`](Handle::close).
    pub fn stat(&self) -> Result<Metadata> {
        if matches!(self.state, State::Closed) {
            return Err(self.closed_error());
        }
        Ok(self.meta.clone())
    }

    /// Whether this handle is bound to a directory.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.meta.is_dir()
    }

    /// Whether [`close`](Handle::close) has been called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Copies bytes from the read cursor into `buf` and advances the
    /// cursor. Returns the number of bytes copied; `Ok(0)` once the
    /// content is exhausted.
    ///
    /// # Errors
    ///
    /// [`BundleError::InvalidOperation`] on a directory handle;
    /// [`BundleError::Closed`] after close.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match &mut self.state {
            State::File { bytes, pos } => {
                let start = usize::try_from(*pos).unwrap_or(usize::MAX);
                if start >= bytes.len() {
                    return Ok(0);
                }
                let n = buf.len().min(bytes.len() - start);
                buf[..n].copy_from_slice(&bytes[start..start + n]);
                *pos += n as u64;
                Ok(n)
            }
            State::Directory { .. } => Err(BundleError::InvalidOperation {
                path: self.path.clone(),
                reason: "cannot read a directory".to_owned(),
            }),
            State::Closed => Err(self.closed_error()),
        }
    }

    /// Returns up to `n` children from the pagination cursor and advances
    /// it; `n == 0` returns every remaining child.
    ///
    /// The returned [`Listing`] signals end-of-listing once the cursor has
    /// reached the end of the child list, so repeated calls on an
    /// exhausted handle stay idempotent instead of erroring.
    ///
    /// # Errors
    ///
    /// [`BundleError::InvalidOperation`] on a file handle;
    /// [`BundleError::Closed`] after close.
    pub fn list(&mut self, n: usize) -> Result<Listing> {
        match &mut self.state {
            State::Directory { children, pos } => {
                let remaining = children.len() - *pos;
                let take = if n == 0 { remaining } else { n.min(remaining) };
                let entries = children[*pos..*pos + take].to_vec();
                *pos += take;
                Ok(Listing {
                    entries,
                    exhausted: *pos >= children.len(),
                })
            }
            State::File { .. } => Err(BundleError::InvalidOperation {
                path: self.path.clone(),
                reason: "cannot list a regular file".to_owned(),
            }),
            State::Closed => Err(self.closed_error()),
        }
    }

    /// Marks the handle unusable. Idempotent; there is no underlying
    /// resource to release, so closing cannot fail.
    pub fn close(&mut self) {
        self.state = State::Closed;
    }

    fn closed_error(&self) -> BundleError {
        BundleError::Closed {
            path: self.path.clone(),
        }
    }

    fn seek_cursor(&mut self, seek: SeekFrom) -> io::Result<u64> {
        match &mut self.state {
            State::File { bytes, pos } => {
                let target = match seek {
                    SeekFrom::Start(offset) => i128::from(offset),
                    SeekFrom::End(delta) => i128::from(bytes.len() as u64) + i128::from(delta),
                    SeekFrom::Current(delta) => i128::from(*pos) + i128::from(delta),
                };
                // Seeking past the end is fine (reads there hit end-of-data);
                // seeking before the start is not.
                let target = u64::try_from(target).map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "cannot seek before the start of the content",
                    )
                })?;
                *pos = target;
                Ok(target)
            }
            State::Directory { .. } => Err(to_io_error(BundleError::InvalidOperation {
                path: self.path.clone(),
                reason: "cannot seek a directory".to_owned(),
            })),
            State::Closed => Err(to_io_error(self.closed_error())),
        }
    }
}

/// Maps handle errors onto `std::io::Error` for the io trait impls.
fn to_io_error(err: BundleError) -> io::Error {
    match &err {
        BundleError::InvalidOperation { .. } => io::Error::new(io::ErrorKind::IsADirectory, err),
        _ => io::Error::other(err),
    }
}

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Handle::read(self, buf).map_err(to_io_error)
    }
}

impl Seek for Handle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek_cursor(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_manifest::FileMode;

    fn file_handle(content: &[u8]) -> Handle {
        let meta = Metadata::new(
            "a.txt".to_string(),
            content.len() as u64,
            FileMode::file(0o644),
            0,
        );
        Handle::file("a.txt".to_string(), meta, Arc::from(content.to_vec()))
    }

    fn dir_handle(names: &[&str]) -> Handle {
        let meta = Metadata::new("d".to_string(), 0, FileMode::dir(0o755), 0);
        let children = names
            .iter()
            .map(|n| Metadata::new((*n).to_string(), 1, FileMode::file(0o644), 0))
            .collect();
        Handle::directory("d".to_string(), meta, children)
    }

    #[test]
    fn test_read_advances_cursor() {
        let mut handle = file_handle(b"abcdef");
        let mut buf = [0u8; 4];
        assert_eq!(handle.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(handle.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(handle.read(&mut buf).unwrap(), 0);
        assert_eq!(handle.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_empty_file() {
        let mut handle = file_handle(b"");
        let mut buf = [0u8; 4];
        assert_eq!(handle.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_on_directory_fails() {
        let mut handle = dir_handle(&["x"]);
        let mut buf = [0u8; 4];
        let err = handle.read(&mut buf).unwrap_err();
        assert!(err.is_invalid_operation());
    }

    #[test]
    fn test_list_unbounded_returns_all() {
        let mut handle = dir_handle(&["a", "b", "c"]);
        let listing = handle.list(0).unwrap();
        assert_eq!(listing.len(), 3);
        assert!(listing.is_exhausted());
    }

    #[test]
    fn test_list_paginates() {
        let mut handle = dir_handle(&["a", "b", "c"]);
        let first = handle.list(2).unwrap();
        assert_eq!(first.len(), 2);
        assert!(!first.is_exhausted());

        let second = handle.list(2).unwrap();
        assert_eq!(second.len(), 1);
        assert!(second.is_exhausted());

        // Idempotent once exhausted.
        let third = handle.list(2).unwrap();
        assert!(third.is_empty());
        assert!(third.is_exhausted());
    }

    #[test]
    fn test_list_empty_directory() {
        let mut handle = dir_handle(&[]);
        let listing = handle.list(0).unwrap();
        assert!(listing.is_empty());
        assert!(listing.is_exhausted());
    }

    #[test]
    fn test_list_on_file_fails() {
        let mut handle = file_handle(b"abc");
        let err = handle.list(0).unwrap_err();
        assert!(err.is_invalid_operation());
    }

    #[test]
    fn test_close_is_idempotent_and_blocks_everything() {
        let mut handle = file_handle(b"abc");
        handle.close();
        handle.close();
        assert!(handle.is_closed());

        assert!(handle.stat().unwrap_err().is_closed());
        let mut buf = [0u8; 1];
        assert!(handle.read(&mut buf).unwrap_err().is_closed());
    }

    #[test]
    fn test_stat_before_close() {
        let handle = file_handle(b"abc");
        let meta = handle.stat().unwrap();
        assert_eq!(meta.size(), 3);
        assert!(!handle.is_dir());
    }

    #[test]
    fn test_seek_from_start_and_current() {
        let mut handle = file_handle(b"abcdef");
        assert_eq!(handle.seek(SeekFrom::Start(4)).unwrap(), 4);
        let mut buf = [0u8; 8];
        assert_eq!(Handle::read(&mut handle, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");

        assert_eq!(handle.seek(SeekFrom::Current(-8)).unwrap_err().kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_seek_from_end() {
        let mut handle = file_handle(b"abcdef");
        assert_eq!(handle.seek(SeekFrom::End(-2)).unwrap(), 4);
        assert_eq!(handle.seek(SeekFrom::End(10)).unwrap(), 16);
        let mut buf = [0u8; 4];
        // Past-the-end cursor just reads as end-of-data.
        assert_eq!(Handle::read(&mut handle, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_seek_on_directory_fails() {
        let mut handle = dir_handle(&["x"]);
        let err = handle.seek(SeekFrom::Start(0)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::IsADirectory);
    }

    #[test]
    fn test_io_read_trait_on_directory() {
        let mut handle = dir_handle(&["x"]);
        let mut buf = Vec::new();
        let err = handle.read_to_end(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::IsADirectory);
    }

    #[test]
    fn test_listing_into_iterator() {
        let mut handle = dir_handle(&["a", "b"]);
        let names: Vec<String> = handle
            .list(0)
            .unwrap()
            .into_iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }
}
