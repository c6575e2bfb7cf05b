//! # `pcitopo_core` - Read-only PCI topology snapshots
//!
//! Walks the PCI hierarchy that Linux exports under `/sys/devices` and builds
//! a nested domain → bus → device → function tree out of it. Every function
//! carries the handful of one-line attributes the kernel exposes for it.
//!
//! Everything here is Linux only and should work without root access.

pub mod address;
pub mod attribute;
pub mod dump;
pub mod enumerate;
pub mod error;
pub mod names;
pub mod snapshot;
pub mod topology;

pub use address::DomainAddress;
pub use address::FunctionAddress;
pub use enumerate::EnumerateConfiguration;
pub use enumerate::enumerate;
#[cfg(feature = "parallel")]
pub use enumerate::enumerate_parallel;
pub use error::EnumerationError;
pub use snapshot::SnapshotCache;
pub use topology::Bus;
pub use topology::Device;
pub use topology::Domain;
pub use topology::Function;
pub use topology::Topology;
