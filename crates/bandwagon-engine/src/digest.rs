use crate::{error::DigestError, locator::CutSiteLocator, topology::Topology};
use log::{debug, trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What to do with fragments of length 0, produced by a linear cut at offset 0.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroLengthPolicy {
    #[default]
    Keep,
    Drop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestSettings {
    pub zero_length_fragments: ZeroLengthPolicy,
    pub parallel_lookup: bool,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            zero_length_fragments: ZeroLengthPolicy::Keep,
            parallel_lookup: true,
        }
    }
}

/// A contiguous piece of the digested molecule.
///
/// For the fragment closing a circle, `start > end`: it runs from the last
/// cut through the origin to the first cut.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Fragment {
    pub start: usize,
    pub end: usize,
    pub length: usize,
}

impl Fragment {
    pub fn wraps_origin(&self) -> bool {
        self.start > self.end || (self.start == self.end && self.length > 0)
    }
}

/// Fragments in positional order, from merged, sorted, deduplicated offsets.
pub fn fragments_from_cut_sites(cuts: &[usize], len: usize, topology: Topology) -> Vec<Fragment> {
    let Some((&first, &last)) = cuts.first().zip(cuts.last()) else {
        return vec![Fragment {
            start: 0,
            end: len,
            length: len,
        }];
    };
    let inner = cuts.windows(2).map(|w| Fragment {
        start: w[0],
        end: w[1],
        length: w[1] - w[0],
    });
    match topology {
        Topology::Linear => std::iter::once(Fragment {
            start: 0,
            end: first,
            length: first,
        })
        .chain(inner)
        .chain(std::iter::once(Fragment {
            start: last,
            end: len,
            length: len - last,
        }))
        .collect(),
        Topology::Circular => inner
            .chain(std::iter::once(Fragment {
                start: last,
                end: first,
                length: (len - last) + first,
            }))
            .collect(),
    }
}

/// Sorted fragment lengths for already merged, sorted, deduplicated offsets.
pub fn bands_from_cut_sites(cuts: &[usize], len: usize, topology: Topology) -> Vec<usize> {
    let mut bands = fragments_from_cut_sites(cuts, len, topology)
        .into_iter()
        .map(|f| f.length)
        .collect::<Vec<_>>();
    bands.sort_unstable();
    bands
}

/// One digestion: the merged cut sites and the bands they produce.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Digestion {
    pub cut_sites: Vec<usize>,
    /// Ascending, after the zero-length policy.
    pub bands: Vec<usize>,
}

/// Computes digestion bands with an injected cut-site lookup.
#[derive(Debug, Clone, Default)]
pub struct DigestionEngine<L> {
    locator: L,
    settings: DigestSettings,
}

impl<L: CutSiteLocator> DigestionEngine<L> {
    pub fn new(locator: L) -> Self {
        Self {
            locator,
            settings: DigestSettings::default(),
        }
    }

    pub fn with_settings(locator: L, settings: DigestSettings) -> Self {
        Self { locator, settings }
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    pub fn settings(&self) -> &DigestSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut DigestSettings {
        &mut self.settings
    }

    /// Sorted fragment lengths of `sequence` cut by every enzyme in `enzymes`.
    ///
    /// An empty enzyme list leaves the molecule uncut and yields `[len]`.
    pub fn compute_digestion_bands<S: AsRef<str>>(
        &self,
        sequence: &[u8],
        enzymes: &[S],
        topology: Topology,
    ) -> Result<Vec<usize>, DigestError> {
        Ok(self.compute_digestion(sequence, enzymes, topology)?.bands)
    }

    /// Cut sites and bands from a single round of lookups.
    pub fn compute_digestion<S: AsRef<str>>(
        &self,
        sequence: &[u8],
        enzymes: &[S],
        topology: Topology,
    ) -> Result<Digestion, DigestError> {
        let cut_sites = self.merged_cut_sites(sequence, enzymes, topology)?;
        let mut bands = self
            .fragments_for(&cut_sites, sequence.len(), topology)
            .into_iter()
            .map(|f| f.length)
            .collect::<Vec<_>>();
        bands.sort_unstable();
        Ok(Digestion { cut_sites, bands })
    }

    pub fn compute_digestion_fragments<S: AsRef<str>>(
        &self,
        sequence: &[u8],
        enzymes: &[S],
        topology: Topology,
    ) -> Result<Vec<Fragment>, DigestError> {
        let cuts = self.merged_cut_sites(sequence, enzymes, topology)?;
        Ok(self.fragments_for(&cuts, sequence.len(), topology))
    }

    fn fragments_for(&self, cuts: &[usize], len: usize, topology: Topology) -> Vec<Fragment> {
        let fragments = fragments_from_cut_sites(cuts, len, topology);
        match self.settings.zero_length_fragments {
            ZeroLengthPolicy::Keep => fragments,
            ZeroLengthPolicy::Drop => fragments.into_iter().filter(|f| f.length > 0).collect(),
        }
    }

    /// Union of all enzymes' cut offsets, ascending, each offset once.
    pub fn merged_cut_sites<S: AsRef<str>>(
        &self,
        sequence: &[u8],
        enzymes: &[S],
        topology: Topology,
    ) -> Result<Vec<usize>, DigestError> {
        let len = sequence.len();
        if len == 0 {
            return Err(DigestError::EmptySequence);
        }

        let mut names: Vec<&str> = vec![];
        for name in enzymes.iter().map(|e| e.as_ref()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        let lookup = |name: &&str| self.locator.find_cut_sites(sequence, name, topology);
        let per_enzyme: Vec<Result<BTreeSet<usize>, DigestError>> =
            if self.settings.parallel_lookup && names.len() > 1 {
                names.par_iter().map(lookup).collect()
            } else {
                names.iter().map(lookup).collect()
            };

        let mut merged = BTreeSet::new();
        for (name, sites) in names.iter().zip(per_enzyme) {
            let sites = sites?;
            debug!("{name}: {} cut site(s) on {topology} sequence of {len} bp", sites.len());
            for offset in sites {
                match topology {
                    Topology::Circular => {
                        merged.insert(offset % len);
                    }
                    Topology::Linear if offset < len => {
                        merged.insert(offset);
                    }
                    Topology::Linear => {
                        warn!("{name}: ignoring cut offset {offset} beyond linear end {len}");
                    }
                }
            }
        }
        trace!("merged cut sites: {merged:?}");
        Ok(merged.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::StaticCutSites;
    use proptest::prelude::*;

    const N: usize = 5000;

    fn fixture_engine() -> DigestionEngine<StaticCutSites> {
        DigestionEngine::new(
            StaticCutSites::new()
                .with_enzyme("EcoRI", [400, 1417])
                .with_enzyme("BamHI", [817])
                .with_enzyme("NcoI", [3291])
                .with_enzyme("StyI", [1893, 2611, 2909, 3291])
                .with_enzyme("Origin", [0])
                .with_enzyme("None", []),
        )
    }

    fn seq(len: usize) -> Vec<u8> {
        vec![b'A'; len]
    }

    #[test]
    fn test_linear_single_enzyme() {
        let bands = fixture_engine()
            .compute_digestion_bands(&seq(N), &["EcoRI"], Topology::Linear)
            .unwrap();
        assert_eq!(bands, vec![400, 1017, 3583]);
    }

    #[test]
    fn test_circular_single_enzyme() {
        let bands = fixture_engine()
            .compute_digestion_bands(&seq(N), &["EcoRI"], Topology::Circular)
            .unwrap();
        assert_eq!(bands, vec![1017, 3983]);
    }

    #[test]
    fn test_two_enzymes_default_topology() {
        let bands = fixture_engine()
            .compute_digestion_bands(&seq(N), &["EcoRI", "BamHI"], Topology::default())
            .unwrap();
        assert_eq!(bands, vec![400, 417, 600, 3583]);
    }

    #[test]
    fn test_no_enzymes_is_uncut() {
        let engine = fixture_engine();
        let none: [&str; 0] = [];
        assert_eq!(
            engine
                .compute_digestion_bands(&seq(N), &none, Topology::Circular)
                .unwrap(),
            vec![N]
        );
        assert_eq!(
            engine
                .compute_digestion_bands(&seq(N), &none, Topology::Linear)
                .unwrap(),
            vec![N]
        );
        assert_eq!(
            engine
                .compute_digestion_bands(&seq(N), &["None"], Topology::Circular)
                .unwrap(),
            vec![N]
        );
    }

    #[test]
    fn test_unknown_enzyme_aborts() {
        let err = fixture_engine()
            .compute_digestion_bands(&seq(N), &["EcoRI", "EcoRJ", "Nope"], Topology::Linear)
            .unwrap_err();
        assert_eq!(err, DigestError::unknown_enzyme("EcoRJ"));
    }

    #[test]
    fn test_empty_sequence() {
        let err = fixture_engine()
            .compute_digestion_bands(&[], &["EcoRI"], Topology::Circular)
            .unwrap_err();
        assert_eq!(err, DigestError::EmptySequence);
    }

    #[test]
    fn test_coincident_sites_count_once() {
        let engine = fixture_engine();
        let cuts = engine
            .merged_cut_sites(&seq(N), &["NcoI", "StyI"], Topology::Circular)
            .unwrap();
        assert_eq!(cuts, vec![1893, 2611, 2909, 3291]);
        let bands = engine
            .compute_digestion_bands(&seq(N), &["NcoI", "StyI"], Topology::Circular)
            .unwrap();
        assert_eq!(bands.len(), 4);
        assert_eq!(bands.iter().sum::<usize>(), N);
    }

    #[test]
    fn test_duplicate_enzyme_names_collapse() {
        let engine = fixture_engine();
        let once = engine
            .compute_digestion_bands(&seq(N), &["EcoRI"], Topology::Linear)
            .unwrap();
        let twice = engine
            .compute_digestion_bands(&seq(N), &["EcoRI", "EcoRI"], Topology::Linear)
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_cut_at_origin_linear_keeps_empty_fragment() {
        let engine = fixture_engine();
        let bands = engine
            .compute_digestion_bands(&seq(N), &["Origin", "EcoRI"], Topology::Linear)
            .unwrap();
        assert_eq!(bands, vec![0, 400, 1017, 3583]);
    }

    #[test]
    fn test_cut_at_origin_linear_drop_policy() {
        let mut engine = fixture_engine();
        engine.settings_mut().zero_length_fragments = ZeroLengthPolicy::Drop;
        let bands = engine
            .compute_digestion_bands(&seq(N), &["Origin", "EcoRI"], Topology::Linear)
            .unwrap();
        assert_eq!(bands, vec![400, 1017, 3583]);
    }

    #[test]
    fn test_cut_at_origin_circular() {
        let bands = fixture_engine()
            .compute_digestion_bands(&seq(N), &["Origin", "EcoRI"], Topology::Circular)
            .unwrap();
        assert_eq!(bands, vec![400, 1017, 3583]);
    }

    #[test]
    fn test_single_circular_cut_gives_whole_length() {
        let bands = fixture_engine()
            .compute_digestion_bands(&seq(N), &["BamHI"], Topology::Circular)
            .unwrap();
        assert_eq!(bands, vec![N]);
    }

    #[test]
    fn test_out_of_range_offsets() {
        let engine = DigestionEngine::new(StaticCutSites::new().with_enzyme("Wide", [3, 12, 25]));
        assert_eq!(
            engine
                .merged_cut_sites(&seq(10), &["Wide"], Topology::Linear)
                .unwrap(),
            vec![3]
        );
        assert_eq!(
            engine
                .merged_cut_sites(&seq(10), &["Wide"], Topology::Circular)
                .unwrap(),
            vec![2, 3, 5]
        );
    }

    #[test]
    fn test_fragments_positional() {
        let linear = fragments_from_cut_sites(&[400, 1417], N, Topology::Linear);
        assert_eq!(
            linear,
            vec![
                Fragment {
                    start: 0,
                    end: 400,
                    length: 400,
                },
                Fragment {
                    start: 400,
                    end: 1417,
                    length: 1017,
                },
                Fragment {
                    start: 1417,
                    end: N,
                    length: 3583,
                },
            ]
        );
        let circular = fragments_from_cut_sites(&[400, 1417], N, Topology::Circular);
        assert_eq!(circular.len(), 2);
        assert!(!circular[0].wraps_origin());
        assert!(circular[1].wraps_origin());
        assert_eq!(circular[1].start, 1417);
        assert_eq!(circular[1].end, 400);
        assert_eq!(circular[1].length, 3983);

        let single = fragments_from_cut_sites(&[817], N, Topology::Circular);
        assert_eq!(
            single,
            vec![Fragment {
                start: 817,
                end: 817,
                length: N,
            }]
        );
        assert!(single[0].wraps_origin());
    }

    #[test]
    fn test_compute_digestion_applies_policy_once() {
        let mut engine = fixture_engine();
        let kept = engine
            .compute_digestion(&seq(N), &["Origin", "EcoRI"], Topology::Linear)
            .unwrap();
        assert_eq!(kept.cut_sites, vec![0, 400, 1417]);
        assert_eq!(kept.bands, vec![0, 400, 1017, 3583]);

        engine.settings_mut().zero_length_fragments = ZeroLengthPolicy::Drop;
        let dropped = engine
            .compute_digestion(&seq(N), &["Origin", "EcoRI"], Topology::Linear)
            .unwrap();
        assert_eq!(dropped.cut_sites, vec![0, 400, 1417]);
        assert_eq!(dropped.bands, vec![400, 1017, 3583]);
        assert_eq!(
            dropped.bands,
            engine
                .compute_digestion_bands(&seq(N), &["Origin", "EcoRI"], Topology::Linear)
                .unwrap()
        );
    }

    #[test]
    fn test_serial_and_parallel_lookup_agree() {
        let mut engine = fixture_engine();
        let enzymes = ["StyI", "EcoRI", "BamHI", "NcoI"];
        let parallel = engine
            .compute_digestion_bands(&seq(N), &enzymes, Topology::Circular)
            .unwrap();
        engine.settings_mut().parallel_lookup = false;
        let serial = engine
            .compute_digestion_bands(&seq(N), &enzymes, Topology::Circular)
            .unwrap();
        assert_eq!(parallel, serial);
    }

    #[test]
    fn test_settings_defaults_from_empty_json() {
        let settings: DigestSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.zero_length_fragments, ZeroLengthPolicy::Keep);
        assert!(settings.parallel_lookup);
        let settings: DigestSettings =
            serde_json::from_str(r#"{"zero_length_fragments":"drop"}"#).unwrap();
        assert_eq!(settings.zero_length_fragments, ZeroLengthPolicy::Drop);
    }

    fn sorted_unique(mut v: Vec<usize>) -> Vec<usize> {
        v.sort_unstable();
        v.dedup();
        v
    }

    proptest! {
        #[test]
        fn prop_conservation(
            len in 1usize..3000,
            raw in proptest::collection::vec(0usize..3000, 0..40),
            circular in any::<bool>(),
        ) {
            let topology = Topology::from_linear_flag(!circular);
            let cuts = sorted_unique(raw.into_iter().filter(|c| *c < len).collect());
            let bands = bands_from_cut_sites(&cuts, len, topology);
            prop_assert_eq!(bands.iter().sum::<usize>(), len);
            prop_assert!(bands.windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(bands.iter().all(|b| *b <= len));
            let expected = match (topology, cuts.len()) {
                (_, 0) => 1,
                (Topology::Linear, k) => k + 1,
                (Topology::Circular, k) => k,
            };
            prop_assert_eq!(bands.len(), expected);
        }

        #[test]
        fn prop_order_invariance_and_monotonic_merge(
            a in proptest::collection::btree_set(0usize..1000, 0..10),
            b in proptest::collection::btree_set(0usize..1000, 0..10),
            circular in any::<bool>(),
        ) {
            let topology = Topology::from_linear_flag(!circular);
            let engine = DigestionEngine::new(
                StaticCutSites::new().with_enzyme("A", a).with_enzyme("B", b),
            );
            let sequence = seq(1000);
            let ab = engine.compute_digestion_bands(&sequence, &["A", "B"], topology).unwrap();
            let ba = engine.compute_digestion_bands(&sequence, &["B", "A"], topology).unwrap();
            let only_a = engine.compute_digestion_bands(&sequence, &["A"], topology).unwrap();
            prop_assert_eq!(&ab, &ba);
            prop_assert!(ab.len() >= only_a.len());
            let again = engine.compute_digestion_bands(&sequence, &["A", "B"], topology).unwrap();
            prop_assert_eq!(ab, again);
        }
    }
}
