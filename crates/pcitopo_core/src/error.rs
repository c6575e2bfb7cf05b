//! Error types for enumeration
//!
//! Only [`ListingError`] (wrapped in [`EnumerationError`]) ever reaches the
//! caller of an enumeration. The other kinds are recovered where they happen:
//! a malformed entry is skipped and an unreadable or unparsable attribute is
//! left at its empty default.

use crate::attribute::Attribute;
use crate::topology::Topology;
use compact_str::CompactString;
use std::path::PathBuf;
use winnow::error::ContextError;

/// Which directory of the hierarchy could not be listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ListingLevel {
    /// The root of the hierarchy (usually `/sys/devices`)
    Root,
    /// A `pciDDDD:BB` directory
    Domain,
    /// A `DDDD:BB:DD.F` directory
    Function,
}

/// A directory that must exist could not be listed
#[derive(Debug, thiserror::Error)]
#[error("Failed to list {level} directory {path:?}")]
pub struct ListingError {
    pub level: ListingLevel,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// An enumeration was aborted by a fatal listing error.
///
/// Whatever had been built before the failure is kept in `partial`.
#[derive(Debug, thiserror::Error)]
#[error("PCI enumeration aborted: {error}")]
pub struct EnumerationError {
    pub partial: Topology,
    #[source]
    pub error: ListingError,
}

impl EnumerationError {
    /// Split into the partial topology and the underlying listing error
    #[must_use]
    pub fn into_parts(self) -> (Topology, ListingError) {
        (self.partial, self.error)
    }
}

/// What kind of directory name we tried to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EntryKind {
    /// `pciDDDD:BB`
    Domain,
    /// `DDDD:BB:DD.F`
    Function,
}

/// A directory name did not match the expected address grammar
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind} entry {input:?} at position {pos}: {message}")]
pub struct AddressParseError {
    pub kind: EntryKind,
    pub input: CompactString,
    pub pos: usize,
    pub message: String,
}

impl AddressParseError {
    pub(crate) fn from_parse(
        kind: EntryKind,
        error: &winnow::error::ParseError<&str, ContextError>,
        input: &str,
    ) -> Self {
        Self {
            kind,
            input: input.into(),
            pos: error.offset(),
            message: error.inner().to_string(),
        }
    }
}

/// An attribute file could not be read
#[derive(Debug, thiserror::Error)]
#[error("Failed to read attribute file {path:?}")]
pub struct AttributeReadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// A numeric attribute did not contain a number of the expected width
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid value {value:?} for attribute {attribute}")]
pub struct AttributeParseError {
    pub attribute: Attribute,
    pub value: CompactString,
    #[source]
    pub source: std::num::ParseIntError,
}
