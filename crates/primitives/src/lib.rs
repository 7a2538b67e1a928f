//! Core data types shared by every weir crate: the parsed specification tree, tabular
//! payloads carried by sources, and content fingerprints used for change detection.

/// Content-addressed fingerprints.
pub mod fingerprint;
/// Payloads held by sources and produced by transforms.
pub mod payload;
/// Column-oriented tables.
pub mod table;
/// Generic mapping/sequence/scalar tree.
pub mod value;

pub use fingerprint::{ContentHasher, Fingerprint};
pub use payload::{Payload, PayloadKind};
pub use table::{Column, Table, TableError};
pub use value::Value;
