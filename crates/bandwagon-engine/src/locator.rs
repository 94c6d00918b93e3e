use crate::{error::DigestError, topology::Topology};
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

/// Finds where an enzyme cleaves a sequence.
///
/// Offsets are 0-based and count the top-strand bases preceding the cut, so a
/// cut between positions 3 and 4 is reported as 4. Circular sequences must be
/// searched across the end/start junction.
pub trait CutSiteLocator: Sync {
    fn find_cut_sites(
        &self,
        sequence: &[u8],
        enzyme: &str,
        topology: Topology,
    ) -> Result<BTreeSet<usize>, DigestError>;
}

impl<T: CutSiteLocator + ?Sized> CutSiteLocator for &T {
    fn find_cut_sites(
        &self,
        sequence: &[u8],
        enzyme: &str,
        topology: Topology,
    ) -> Result<BTreeSet<usize>, DigestError> {
        (**self).find_cut_sites(sequence, enzyme, topology)
    }
}

impl<T: CutSiteLocator + Send + ?Sized> CutSiteLocator for Arc<T> {
    fn find_cut_sites(
        &self,
        sequence: &[u8],
        enzyme: &str,
        topology: Topology,
    ) -> Result<BTreeSet<usize>, DigestError> {
        (**self).find_cut_sites(sequence, enzyme, topology)
    }
}

/// Locator answering from a fixed table of offsets, whatever the sequence.
#[derive(Clone, Debug, Default)]
pub struct StaticCutSites {
    sites: HashMap<String, BTreeSet<usize>>,
}

impl StaticCutSites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enzyme<I>(mut self, name: &str, offsets: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        self.insert(name, offsets);
        self
    }

    pub fn insert<I>(&mut self, name: &str, offsets: I)
    where
        I: IntoIterator<Item = usize>,
    {
        self.sites
            .entry(name.to_string())
            .or_default()
            .extend(offsets);
    }
}

impl CutSiteLocator for StaticCutSites {
    fn find_cut_sites(
        &self,
        _sequence: &[u8],
        enzyme: &str,
        _topology: Topology,
    ) -> Result<BTreeSet<usize>, DigestError> {
        self.sites
            .get(enzyme)
            .cloned()
            .ok_or_else(|| DigestError::unknown_enzyme(enzyme))
    }
}
