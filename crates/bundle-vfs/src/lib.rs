//! Read-only virtual filesystem over embedded asset bundles.
//!
//! A build-time generator walks a directory tree and emits a
//! [`bundle_manifest::Manifest`]; this crate turns that manifest into an
//! immutable [`Bundle`] served through the same access contract as a real
//! filesystem: open by name, stat, read, and paginated directory listing.
//! In the dev variant, file contents are resolved lazily from absolute
//! paths on disk instead of being embedded, so edits show up without
//! regenerating the bundle.
//!
//! # Features
//!
//! - **Immutable table**: built once, never mutated; share it across
//!   threads without locks
//! - **Per-open handles**: every open gets its own byte or pagination
//!   cursor, never shared
//! - **Synthesized directories**: intermediate directories exist even when
//!   the generator only emitted leaf files
//! - **`std::io` integration**: file handles implement [`std::io::Read`]
//!   and [`std::io::Seek`]
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
//! // The root is synthesized; listing it shows the top level only.
//! let mut root = bundle.open("/")?;
//! let names: Vec<_> = root.list(0)?.into_iter().map(|m| m.name().to_string()).collect();
//! assert_eq!(names, ["css", "index.html"]);
//!
//! // Files read like files.
//! let mut file = bundle.open("css/site.css")?;
//! let mut buf = [0u8; 32];
//! let n = file.read(&mut buf)?;
//! assert_eq!(&buf[..n], b"body {}");
//! # Ok::<(), bundle_vfs::BundleError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod builder;
pub mod bundle;
pub mod handle;
pub mod types;

pub use builder::BundleBuilder;
pub use bundle::Bundle;
pub use handle::{Handle, Listing};
pub use types::{BundleError, Metadata, Result};
