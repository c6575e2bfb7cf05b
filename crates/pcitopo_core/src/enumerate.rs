//! Walking the sysfs hierarchy
//!
//! The layout we expect is:
//!
//! ```text
//! <root>/pciDDDD:BB/DDDD:BB:DD.F/<attribute files>
//! ```
//!
//! Failing to list any of these directories aborts the walk. Everything below
//! that (odd entry names, unreadable or unparsable attribute files) is skipped
//! or left empty.

use crate::address::DOMAIN_PREFIX;
use crate::address::DomainAddress;
use crate::address::FunctionAddress;
use crate::attribute::Attribute;
use crate::attribute::read_attribute;
use crate::error::EnumerationError;
use crate::error::ListingError;
use crate::error::ListingLevel;
use crate::topology::Function;
use crate::topology::Topology;
use std::path::Path;
use std::path::PathBuf;

/// Where Linux exports the PCI host bridges
pub const DEFAULT_ROOT: &str = "/sys/devices";

/// Describes how to enumerate
#[derive(Debug, Clone, PartialEq, Eq, derive_builder::Builder)]
#[builder(setter(into))]
#[non_exhaustive]
pub struct EnumerateConfiguration {
    /// Root of the hierarchy, containing the `pciDDDD:BB` directories
    #[builder(default = "PathBuf::from(DEFAULT_ROOT)")]
    pub root: PathBuf,
    /// Walk each domain on its own worker (needs the `parallel` feature)
    #[builder(default = "false")]
    pub parallel: bool,
}

impl EnumerateConfiguration {
    #[must_use]
    pub fn builder() -> EnumerateConfigurationBuilder {
        EnumerateConfigurationBuilder::default()
    }

    /// Take a snapshot according to this configuration
    pub fn enumerate(&self) -> Result<Topology, EnumerationError> {
        #[cfg(feature = "parallel")]
        {
            if self.parallel {
                return enumerate_parallel(&self.root);
            }
        }
        #[cfg(not(feature = "parallel"))]
        {
            if self.parallel {
                tracing::warn!("Built without parallel enumeration, walking sequentially");
            }
        }
        enumerate(&self.root)
    }
}

impl Default for EnumerateConfiguration {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            parallel: false,
        }
    }
}

/// Take a snapshot of the PCI hierarchy below `root`.
///
/// On a fatal listing error the functions found so far are returned inside
/// the error.
#[tracing::instrument(level = "debug")]
pub fn enumerate(root: &Path) -> Result<Topology, EnumerationError> {
    let mut topology = Topology::new();
    let entries = match list_dir(root, ListingLevel::Root) {
        Ok(entries) => entries,
        Err(error) => {
            return Err(EnumerationError {
                partial: topology,
                error,
            });
        }
    };
    for (domain, path) in domain_entries(entries) {
        if let Err(error) = enumerate_domain(&mut topology, &domain, &path) {
            return Err(EnumerationError {
                partial: topology,
                error,
            });
        }
    }
    Ok(topology)
}

/// Like [`enumerate`], but each domain is walked on a rayon worker.
///
/// Every worker builds its own topology, they are merged in directory order
/// once all are done. Errors behave as in the sequential walk: the first
/// failing domain (in directory order) wins, and only the domains before it
/// plus its own partial result are kept.
#[cfg(feature = "parallel")]
#[tracing::instrument(level = "debug")]
pub fn enumerate_parallel(root: &Path) -> Result<Topology, EnumerationError> {
    use rayon::iter::IntoParallelRefIterator;
    use rayon::iter::ParallelIterator;

    let entries = match list_dir(root, ListingLevel::Root) {
        Ok(entries) => entries,
        Err(error) => {
            return Err(EnumerationError {
                partial: Topology::new(),
                error,
            });
        }
    };
    let domains: Vec<_> = domain_entries(entries).collect();
    let results: Vec<_> = domains
        .par_iter()
        .map(|(domain, path)| {
            let mut partial = Topology::new();
            let result = enumerate_domain(&mut partial, domain, path);
            (partial, result)
        })
        .collect();

    let mut topology = Topology::new();
    for (partial, result) in results {
        topology.merge(partial);
        if let Err(error) = result {
            return Err(EnumerationError {
                partial: topology,
                error,
            });
        }
    }
    Ok(topology)
}

/// Read all known attribute files in a function directory
pub fn read_function(path: &Path) -> Result<Function, ListingError> {
    let mut function = Function::default();
    for (name, path) in list_dir(path, ListingLevel::Function)? {
        match Attribute::from_file_name(&name) {
            Some(attribute) => function.set_attribute(attribute, read_attribute(&path)),
            None => tracing::trace!("Ignoring attribute file {path:?}"),
        }
    }
    Ok(function)
}

/// Pick out and parse the `pciDDDD:BB` entries of the root directory
fn domain_entries(
    entries: Vec<(String, PathBuf)>,
) -> impl Iterator<Item = (DomainAddress, PathBuf)> {
    entries
        .into_iter()
        .filter(|(name, _)| name.starts_with(DOMAIN_PREFIX))
        .filter_map(|(name, path)| match DomainAddress::parse(&name) {
            Ok(domain) => Some((domain, path)),
            Err(err) => {
                tracing::debug!("Skipping {err}");
                None
            }
        })
}

fn enumerate_domain(
    topology: &mut Topology,
    domain: &DomainAddress,
    path: &Path,
) -> Result<(), ListingError> {
    tracing::debug!("Enumerating {domain}");
    topology.domain_mut(&domain.domain);
    for (name, path) in list_dir(path, ListingLevel::Domain)? {
        if !name.starts_with(domain.domain.as_str()) {
            continue;
        }
        let address = match FunctionAddress::parse(&name) {
            Ok(address) => address,
            Err(err) => {
                tracing::debug!("Skipping {err}");
                continue;
            }
        };
        if address.domain != domain.domain {
            tracing::debug!("Skipping {address}, not in domain {}", domain.domain);
            continue;
        }
        let function = read_function(&path)?;
        topology.insert(&address, function);
    }
    Ok(())
}

/// List a directory, sorted by name.
///
/// Entries with names that aren't UTF-8 can't match anything we look for, so
/// they are dropped here.
fn list_dir(path: &Path, level: ListingLevel) -> Result<Vec<(String, PathBuf)>, ListingError> {
    let to_error = |source: std::io::Error| ListingError {
        level,
        path: path.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(path).map_err(to_error)? {
        let entry = entry.map_err(to_error)?;
        match entry.file_name().into_string() {
            Ok(name) => entries.push((name, entry.path())),
            Err(name) => tracing::debug!("Skipping non UTF-8 entry {name:?} in {path:?}"),
        }
    }
    entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::topology::TopologyCounts;
    use pretty_assertions::assert_eq;

    pub(crate) fn write_file(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    /// A small hierarchy with two domains and some noise
    pub(crate) fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        // Host bridge
        write_file(root, "pci0000:00/0000:00:00.0/class", "0x060000\n");
        write_file(root, "pci0000:00/0000:00:00.0/vendor", "0x8086\n");
        write_file(root, "pci0000:00/0000:00:00.0/device", "0x3e30\n");
        write_file(root, "pci0000:00/0000:00:00.0/enable", "1\n");
        // Multi function device
        write_file(root, "pci0000:00/0000:00:1f.0/class", "0x060100\n");
        write_file(root, "pci0000:00/0000:00:1f.0/vendor", "0x8086\n");
        write_file(root, "pci0000:00/0000:00:1f.0/enable", "abc\n");
        write_file(root, "pci0000:00/0000:00:1f.1/vendor", "0x8086\n");
        write_file(root, "pci0000:00/0000:00:1f.1/revision", "0x10\n");
        write_file(root, "pci0000:00/0000:00:1f.1/subsystem_vendor", "0x1028\n");
        write_file(root, "pci0000:00/0000:00:1f.1/subsystem_device", "0x0869\n");
        write_file(root, "pci0000:00/0000:00:1f.1/irq", "16\n");
        write_file(root, "pci0000:00/0000:00:1f.1/local_cpus", "ff\n");
        write_file(root, "pci0000:00/0000:00:1f.1/driver_override", "(null)\n");
        write_file(root, "pci0000:00/0000:00:1f.1/power/control", "auto\n");
        // Noise next to the functions
        write_file(root, "pci0000:00/uevent", "\n");
        write_file(root, "pci0000:00/pci_bus/0000:00/cpuaffinity", "ff\n");
        std::fs::create_dir_all(root.join("pci0000:00/power")).unwrap();
        std::fs::create_dir_all(root.join("pci0000:00/0000:zz")).unwrap();
        // Second domain
        write_file(root, "pci10000:e0/10000:e0:06.0/vendor", "0x8086\n");
        // Noise in the root
        std::fs::create_dir_all(root.join("platform/serial8250")).unwrap();
        std::fs::create_dir_all(root.join("pcibogus")).unwrap();
        write_file(root, "pci_notes", "not a domain\n");
        dir
    }

    fn addr(s: &str) -> FunctionAddress {
        s.parse().unwrap()
    }

    #[test]
    fn test_enumerate() {
        let dir = fixture();
        let topology = enumerate(dir.path()).unwrap();

        assert_eq!(
            topology.counts(),
            TopologyCounts {
                domains: 2,
                buses: 2,
                devices: 3,
                functions: 4,
            }
        );

        let device = &topology.domains["0000"].buses["00"].devices["1f"];
        let mut keys: Vec<_> = device.functions.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["0", "1"]);

        assert_eq!(
            topology.function(&addr("0000:00:00.0")),
            Some(&Function {
                number: "0".into(),
                class: "0x060000".into(),
                vendor: "0x8086".into(),
                device: "0x3e30".into(),
                enable: 1,
                ..Default::default()
            })
        );
        assert_eq!(
            topology.function(&addr("10000:e0:06.0")).unwrap().vendor,
            "0x8086"
        );
    }

    #[test]
    fn test_missing_and_invalid_attributes() {
        let dir = fixture();
        let topology = enumerate(dir.path()).unwrap();

        let func = topology.function(&addr("0000:00:1f.0")).unwrap();
        assert_eq!(func.enable, 0);
        assert_eq!(func.device, "");
        assert_eq!(func.irq, "");
        assert_eq!(func.class, "0x060100");
    }

    #[test]
    fn test_unknown_attribute_ignored() {
        let dir = fixture();
        let topology = enumerate(dir.path()).unwrap();

        assert_eq!(
            topology.function(&addr("0000:00:1f.1")),
            Some(&Function {
                number: "1".into(),
                vendor: "0x8086".into(),
                revision: "0x10".into(),
                subsystem_vendor: "0x1028".into(),
                subsystem_device: "0x0869".into(),
                irq: "16".into(),
                local_cpus: "ff".into(),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_enumerate_is_repeatable() {
        let dir = fixture();
        let first = enumerate(dir.path()).unwrap();
        let second = enumerate(dir.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("does-not-exist");
        let err = enumerate(&root).unwrap_err();
        assert!(err.partial.is_empty());
        assert_eq!(err.error.level, ListingLevel::Root);
        assert_eq!(err.error.path, root);
        assert_eq!(err.error.source.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let topology = enumerate(dir.path()).unwrap();
        assert!(topology.is_empty());
    }

    #[test]
    fn test_domain_without_functions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pci0000:00/power")).unwrap();
        let topology = enumerate(dir.path()).unwrap();
        assert_eq!(topology.counts().domains, 1);
        assert!(topology.domains["0000"].buses.is_empty());
    }

    #[test]
    fn test_unlistable_function_is_fatal() {
        let dir = fixture();
        let root = dir.path();
        // Sorts after 0000:00:00.0 but before 0000:00:1f.0
        write_file(root, "pci0000:00/0000:00:02.0", "not a directory");

        let (partial, error) = enumerate(root).unwrap_err().into_parts();
        assert_eq!(error.level, ListingLevel::Function);
        assert_eq!(error.path, root.join("pci0000:00/0000:00:02.0"));
        assert_eq!(
            partial.counts(),
            TopologyCounts {
                domains: 1,
                buses: 1,
                devices: 1,
                functions: 1,
            }
        );
        assert!(partial.function(&addr("0000:00:00.0")).is_some());
    }

    #[test]
    fn test_unlistable_domain_is_fatal() {
        let dir = fixture();
        let root = dir.path();
        write_file(root, "pci0001:00", "not a directory");

        let (partial, error) = enumerate(root).unwrap_err().into_parts();
        assert_eq!(error.level, ListingLevel::Domain);
        // pci0000:00 was fully walked, pci10000:e0 never reached
        assert_eq!(partial.counts().functions, 3);
        assert!(partial.domains.contains_key("0001"));
        assert!(!partial.domains.contains_key("10000"));
    }

    #[test]
    fn test_configuration() {
        let config = EnumerateConfiguration::builder().build().unwrap();
        assert_eq!(config, EnumerateConfiguration::default());
        assert_eq!(config.root, Path::new(DEFAULT_ROOT));
        assert!(!config.parallel);

        let dir = fixture();
        let config = EnumerateConfiguration::builder()
            .root(dir.path())
            .parallel(true)
            .build()
            .unwrap();
        assert_eq!(
            config.enumerate().unwrap(),
            enumerate(dir.path()).unwrap()
        );
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let dir = fixture();
        assert_eq!(
            enumerate_parallel(dir.path()).unwrap(),
            enumerate(dir.path()).unwrap()
        );
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_errors_match_sequential() {
        let dir = fixture();
        write_file(dir.path(), "pci0001:00", "not a directory");

        let sequential = enumerate(dir.path()).unwrap_err();
        let parallel = enumerate_parallel(dir.path()).unwrap_err();
        assert_eq!(parallel.error.level, sequential.error.level);
        assert_eq!(parallel.error.path, sequential.error.path);
        assert_eq!(parallel.partial, sequential.partial);

        let missing = dir.path().join("missing");
        let err = enumerate_parallel(&missing).unwrap_err();
        assert!(err.partial.is_empty());
        assert_eq!(err.error.level, ListingLevel::Root);
    }
}
