//! Byte-level helpers used by canonicalization and vote keying.
//!
//! ## Byte Scanning (`byte_scan`)
//! - Marker search over raw JSON bodies
//! - Field removal that respects string escapes and nesting
//!
//! ## Content Hashing (`content_hash`)
//! - Fixed-key ahash for exact agreement
//! - Byte-sum key for result sets without a guaranteed order

pub mod byte_scan;
pub mod content_hash;

pub use byte_scan::{find, rfind, strip_field, value_end};
pub use content_hash::{content_hash, unordered_content_key};
