use crate::{
    band::{BandsPattern, format_dna_size},
    dna_sequence::DNAsequence,
    ladder::Ladder,
};
use bandwagon_engine::{CutSiteLocator, DigestError, DigestionEngine, Topology};
use itertools::Itertools;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

const BAND_LABELS: &str = "abcdefghijkl";

/// Display name of an enzyme mix, e.g. `BamHI + EcoRI`.
pub fn enzymes_label<S: AsRef<str>>(enzymes: &[S]) -> String {
    enzymes.iter().map(|e| e.as_ref()).sorted().join(" + ")
}

/// A fragment of a digested record, labelled by decreasing size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnnotatedBand {
    pub label: char,
    pub start: usize,
    pub end: usize,
    pub size: usize,
    pub formatted_size: String,
    pub wraps_origin: bool,
}

impl AnnotatedBand {
    pub fn feature_label(&self) -> String {
        format!("{} - {}", self.label, self.formatted_size)
    }
}

/// The fragments of `record` cut by `enzymes`, largest first, labelled `a`,
/// `b`, `c`... Only the twelve largest get a label.
///
/// Records without a declared topology are taken as circular.
pub fn annotate_digestion_bands<L: CutSiteLocator, S: AsRef<str>>(
    record: &DNAsequence,
    enzymes: &[S],
    engine: &DigestionEngine<L>,
) -> Result<Vec<AnnotatedBand>, DigestError> {
    let mut fragments =
        engine.compute_digestion_fragments(
            record.forward(),
            enzymes,
            record.topology_or(Topology::Circular),
        )?;
    fragments.sort_by_key(|f| std::cmp::Reverse(f.length));
    if fragments.len() > BAND_LABELS.len() {
        debug!(
            "Only labelling {} of {} fragments",
            BAND_LABELS.len(),
            fragments.len()
        );
    }
    Ok(fragments
        .iter()
        .zip(BAND_LABELS.chars())
        .map(|(fragment, label)| AnnotatedBand {
            label,
            start: fragment.start,
            end: fragment.end,
            size: fragment.length,
            formatted_size: format_dna_size(fragment.length),
            wraps_origin: fragment.wraps_origin(),
        })
        .collect())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// One group per enzyme mix, one lane per record.
    #[default]
    Digestions,
    /// One group per record, one lane per enzyme mix.
    Records,
}

impl GroupBy {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "digestion" | "digestions" => Some(Self::Digestions),
            "record" | "records" | "sequence" | "sequences" => Some(Self::Records),
            _ => None,
        }
    }
}

/// One record digested by one enzyme mix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DigestionLane {
    pub label: String,
    pub record: String,
    pub enzymes: String,
    pub bands: Vec<usize>,
    pub cut_sites: Vec<usize>,
    pub is_uncut: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DigestionGroup {
    pub label: String,
    pub lanes: Vec<DigestionLane>,
}

impl DigestionGroup {
    pub fn patterns(&self, ladder: Option<&Ladder>) -> Vec<BandsPattern> {
        self.lanes
            .iter()
            .map(|lane| {
                let mut pattern =
                    BandsPattern::from_sizes(Some(lane.label.clone()), &lane.bands, ladder);
                pattern.is_uncut = lane.is_uncut;
                pattern
            })
            .collect()
    }
}

/// Digestions of several records by several enzyme mixes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DigestionMatrix {
    pub group_by: GroupBy,
    /// In order of first appearance.
    pub groups: Vec<DigestionGroup>,
}

impl DigestionMatrix {
    /// Records are digested in parallel; lanes keep the input order and the
    /// first failing record in input order decides the error. Records
    /// without a declared topology are digested as linear.
    pub fn compute<L: CutSiteLocator, S: AsRef<str> + Sync>(
        records: &[DNAsequence],
        digestions: &[Vec<S>],
        engine: &DigestionEngine<L>,
        group_by: GroupBy,
    ) -> Result<Self, DigestError> {
        let per_record = records
            .par_iter()
            .enumerate()
            .map(|(i, record)| Self::digest_record(i, record, digestions, engine, group_by))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        let mut ret = Self {
            group_by,
            groups: vec![],
        };
        for lane in per_record.into_iter().flatten() {
            let group_label = match group_by {
                GroupBy::Digestions => lane.enzymes.clone(),
                GroupBy::Records => lane.record.clone(),
            };
            ret.push(group_label, lane);
        }
        Ok(ret)
    }

    fn digest_record<L: CutSiteLocator, S: AsRef<str>>(
        index: usize,
        record: &DNAsequence,
        digestions: &[Vec<S>],
        engine: &DigestionEngine<L>,
        group_by: GroupBy,
    ) -> Result<Vec<DigestionLane>, DigestError> {
        let record_name = match record.name() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => format!("record_{}", index + 1),
        };
        let topology = record.topology_or(Topology::Linear);
        digestions
            .iter()
            .map(|enzymes| {
                let enzymes_label = enzymes_label(enzymes);
                let digestion = engine.compute_digestion(record.forward(), enzymes, topology)?;
                Ok(DigestionLane {
                    label: match group_by {
                        GroupBy::Digestions => record_name.clone(),
                        GroupBy::Records => enzymes_label.clone(),
                    },
                    record: record_name.clone(),
                    enzymes: enzymes_label,
                    is_uncut: digestion.cut_sites.is_empty(),
                    bands: digestion.bands,
                    cut_sites: digestion.cut_sites,
                })
            })
            .collect()
    }

    fn push(&mut self, group_label: String, lane: DigestionLane) {
        match self.groups.iter_mut().find(|g| g.label == group_label) {
            Some(group) => group.lanes.push(lane),
            None => self.groups.push(DigestionGroup {
                label: group_label,
                lanes: vec![lane],
            }),
        }
    }

    pub fn get(&self, group_label: &str) -> Option<&DigestionGroup> {
        self.groups.iter().find(|g| g.label == group_label)
    }

    /// Groups ordered by label.
    pub fn sorted_groups(&self) -> Vec<&DigestionGroup> {
        self.groups.iter().sorted_by(|a, b| a.label.cmp(&b.label)).collect()
    }
}
