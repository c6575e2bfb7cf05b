//! Human readable names for vendor and device IDs
//!
//! Resolving names needs an external ID database (such as `pci.ids`), which
//! this crate doesn't ship. The dump code goes through [`NameResolver`] so one
//! can be plugged in; [`NoNames`] resolves nothing.

/// Look up names for the hex IDs found in the attribute files
pub trait NameResolver {
    /// Name of a vendor, given the contents of a `vendor` file (e.g. `0x8086`)
    fn vendor_name(&self, vendor: &str) -> Option<&str>;

    /// Name of a device, given the contents of the `vendor` and `device` files
    fn device_name(&self, vendor: &str, device: &str) -> Option<&str>;
}

/// Resolver without a database
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoNames;

impl NameResolver for NoNames {
    fn vendor_name(&self, _vendor: &str) -> Option<&str> {
        None
    }

    fn device_name(&self, _vendor: &str, _device: &str) -> Option<&str> {
        None
    }
}
