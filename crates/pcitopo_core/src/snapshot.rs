//! Caching of the last snapshot

use crate::enumerate::EnumerateConfiguration;
use crate::error::EnumerationError;
use crate::topology::Topology;

/// Holds the most recent successful snapshot for a configuration.
///
/// Each cache is independent: create one per consumer that needs to share a
/// snapshot rather than relying on any global state.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    config: EnumerateConfiguration,
    snapshot: Option<Topology>,
}

impl SnapshotCache {
    #[must_use]
    pub fn new(config: EnumerateConfiguration) -> Self {
        Self {
            config,
            snapshot: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EnumerateConfiguration {
        &self.config
    }

    /// Get the cached snapshot, enumerating if there is none yet
    pub fn get(&mut self) -> Result<&Topology, EnumerationError> {
        let snapshot = match self.snapshot.take() {
            Some(snapshot) => snapshot,
            None => self.config.enumerate()?,
        };
        Ok(self.snapshot.insert(snapshot))
    }

    /// Enumerate again and replace the cached snapshot.
    ///
    /// On failure the previous snapshot (if any) is kept.
    pub fn refresh(&mut self) -> Result<&Topology, EnumerationError> {
        let snapshot = self.config.enumerate()?;
        Ok(self.snapshot.insert(snapshot))
    }

    /// The cached snapshot, without enumerating
    #[must_use]
    pub fn cached(&self) -> Option<&Topology> {
        self.snapshot.as_ref()
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::FunctionAddress;
    use crate::enumerate::tests::fixture;
    use crate::enumerate::tests::write_file;
    use pretty_assertions::assert_eq;

    fn cache_for(root: &std::path::Path) -> SnapshotCache {
        SnapshotCache::new(
            EnumerateConfiguration::builder()
                .root(root)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_get_is_cached() {
        let dir = fixture();
        let mut cache = cache_for(dir.path());
        assert!(cache.cached().is_none());

        let first = cache.get().unwrap().clone();
        write_file(dir.path(), "pci0000:00/0000:00:02.0/vendor", "0x10de\n");
        let second = cache.get().unwrap().clone();
        assert_eq!(first, second);

        let refreshed = cache.refresh().unwrap();
        assert_eq!(refreshed.counts().functions, first.counts().functions + 1);
        let addr = FunctionAddress::new("0000", "00", "02", "0");
        assert_eq!(refreshed.function(&addr).unwrap().vendor, "0x10de");
    }

    #[test]
    fn test_caches_are_independent() {
        let dir = fixture();
        let mut a = cache_for(dir.path());
        let mut b = cache_for(dir.path());
        a.get().unwrap();
        assert!(b.cached().is_none());
        b.get().unwrap();
        a.clear();
        assert!(a.cached().is_none());
        assert!(b.cached().is_some());
    }

    #[test]
    fn test_failed_refresh_keeps_snapshot() {
        let dir = fixture();
        let mut cache = cache_for(dir.path());
        let before = cache.get().unwrap().clone();

        write_file(dir.path(), "pci0001:00", "not a directory");
        assert!(cache.refresh().is_err());
        assert_eq!(cache.cached(), Some(&before));
    }

    #[test]
    fn test_failed_get_caches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = cache_for(&dir.path().join("missing"));
        assert!(cache.get().is_err());
        assert!(cache.cached().is_none());
    }
}
