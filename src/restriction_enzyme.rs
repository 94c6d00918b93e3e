use crate::iupac_code::IupacCode;
use bandwagon_engine::{DigestError, Topology};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A restriction enzyme as stored in the enzyme catalog.
///
/// `cut` is the top-strand cut, counted from the first base of the
/// recognition site; it may lie outside the site. `overlap` is the length of
/// the overhang: positive for 5' overhangs, negative for 3', zero when blunt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestrictionEnzyme {
    pub name: String,
    pub sequence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub cut: isize,
    pub overlap: isize,
    #[serde(skip_serializing, default)]
    is_palindromic: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestrictionEnzymeSite {
    /// First base of the recognition site on the forward strand.
    pub offset: usize,
    pub forward_strand: bool,
}

impl RestrictionEnzyme {
    pub fn new(name: &str, sequence: &str, cut: isize, overlap: isize) -> Self {
        let mut ret = Self {
            name: name.to_string(),
            sequence: sequence.to_ascii_uppercase(),
            note: None,
            cut,
            overlap,
            is_palindromic: false,
        };
        ret.check_palindromic();
        ret
    }

    pub fn check_palindromic(&mut self) {
        self.sequence = self.sequence.to_ascii_uppercase();
        self.is_palindromic = self.sequence.as_bytes() == self.sequence_rc().as_slice();
    }

    pub fn is_palindromic(&self) -> bool {
        self.is_palindromic
    }

    fn sequence_rc(&self) -> Vec<u8> {
        IupacCode::reverse_complement(self.sequence.as_bytes())
    }

    fn scan(pattern: &[u8], seq: &[u8], topology: Topology) -> Vec<usize> {
        let len = seq.len();
        let recognition_len = pattern.len();
        if recognition_len == 0 || recognition_len > len {
            return vec![];
        }
        let last_start = match topology {
            Topology::Circular => len,
            Topology::Linear => len - recognition_len + 1,
        };
        (0..last_start)
            .filter(|&start| {
                pattern
                    .iter()
                    .enumerate()
                    .all(|(i, letter)| IupacCode::site_matches(*letter, seq[(start + i) % len]))
            })
            .collect()
    }

    /// Recognition sites on both strands; palindromic sites are reported once.
    pub fn get_sites(&self, seq: &[u8], topology: Topology) -> Vec<RestrictionEnzymeSite> {
        let mut ret = Self::scan(self.sequence.as_bytes(), seq, topology)
            .into_iter()
            .map(|offset| RestrictionEnzymeSite {
                offset,
                forward_strand: true,
            })
            .collect::<Vec<_>>();
        if !self.is_palindromic {
            ret.extend(
                Self::scan(&self.sequence_rc(), seq, topology)
                    .into_iter()
                    .map(|offset| RestrictionEnzymeSite {
                        offset,
                        forward_strand: false,
                    }),
            );
        }
        ret
    }

    /// Top-strand cut position of a site, before wrapping or clipping.
    pub fn top_strand_cut(&self, site: &RestrictionEnzymeSite) -> isize {
        let offset = site.offset as isize;
        if site.forward_strand {
            offset + self.cut
        } else {
            offset + self.sequence.len() as isize - self.cut - self.overlap
        }
    }

    /// Cut offsets in `seq`, each the number of top-strand bases before a cut.
    ///
    /// Circular offsets wrap into `0..len`; linear cuts at or beyond either
    /// end do not split the molecule and are left out.
    pub fn cut_positions(
        &self,
        seq: &[u8],
        topology: Topology,
    ) -> Result<BTreeSet<usize>, DigestError> {
        if let Some(pos) = seq.iter().position(|c| !IupacCode::is_valid_letter(*c)) {
            return Err(DigestError::UnsearchableSequence {
                enzyme: self.name.clone(),
                reason: format!(
                    "invalid symbol '{}' at position {pos}",
                    seq[pos].escape_ascii()
                ),
            });
        }
        let len = seq.len() as isize;
        Ok(self
            .get_sites(seq, topology)
            .iter()
            .map(|site| self.top_strand_cut(site))
            .filter_map(|cut| match topology {
                Topology::Circular => Some(cut.rem_euclid(len) as usize),
                Topology::Linear => (cut > 0 && cut < len).then_some(cut as usize),
            })
            .collect())
    }
}
