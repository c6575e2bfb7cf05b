//! Best effort reading of one-line sysfs attribute files
//!
//! Attribute files are optional and driver dependent, so a file we can't read
//! is the normal case rather than an error. Only the `try_` functions report
//! why, the rest log it at trace level and fall back to an empty value.

use crate::error::AttributeParseError;
use crate::error::AttributeReadError;
use compact_str::CompactString;
use std::path::Path;

/// The attribute files of a function that we know about.
///
/// See the kernel's `Documentation/ABI/testing/sysfs-bus-pci`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::VariantArray,
)]
#[strum(serialize_all = "snake_case")]
pub enum Attribute {
    /// PCI class code, e.g. `0x0c0330`
    Class,
    Vendor,
    Device,
    /// Whether the function is enabled (decimal)
    Enable,
    Revision,
    SubsystemVendor,
    SubsystemDevice,
    /// Legacy IRQ number
    Irq,
    /// Mask of CPUs local to the function
    LocalCpus,
}

impl Attribute {
    /// Map an attribute file name to the attribute it holds.
    ///
    /// Returns `None` for files we don't know about (`driver_override`,
    /// `resource0` and so on).
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// Name of the file holding this attribute
    #[must_use]
    pub fn file_name(self) -> &'static str {
        self.into()
    }
}

/// Read an attribute file, trimming surrounding whitespace
pub fn try_read_attribute(path: &Path) -> Result<CompactString, AttributeReadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| AttributeReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(contents.trim().into())
}

/// Read an attribute file, or get an empty string if it can't be read
#[must_use]
pub fn read_attribute(path: &Path) -> CompactString {
    try_read_attribute(path).unwrap_or_else(|err| {
        tracing::trace!("{err}: {}", err.source);
        CompactString::default()
    })
}

/// Parse the (already trimmed) contents of the `enable` file
pub fn try_parse_enable(value: &str) -> Result<u16, AttributeParseError> {
    value.parse().map_err(|source| AttributeParseError {
        attribute: Attribute::Enable,
        value: value.into(),
        source,
    })
}

/// Parse the contents of the `enable` file, or get 0 if it isn't a number
#[must_use]
pub fn parse_enable(value: &str) -> u16 {
    try_parse_enable(value).unwrap_or_else(|err| {
        if !value.is_empty() {
            tracing::trace!("{err}");
        }
        0
    })
}
