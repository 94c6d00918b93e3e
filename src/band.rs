use crate::ladder::Ladder;
use serde::Serialize;

/// Short label of a DNA size, e.g. `850`, `3k` or `13.3k`.
pub fn format_dna_size(dna_size: usize) -> String {
    if dna_size < 1000 {
        return dna_size.to_string();
    }
    let kilobases = (dna_size as f64 / 100.0).round_ties_even() / 10.0;
    if kilobases.fract() == 0.0 {
        format!("{kilobases:.0}k")
    } else {
        format!("{kilobases:.1}k")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Band {
    pub dna_size: usize,
    pub migration_distance: Option<f64>,
    pub label: Option<String>,
}

impl Band {
    pub fn new(dna_size: usize) -> Self {
        Self {
            dna_size,
            migration_distance: None,
            label: None,
        }
    }

    pub fn on_ladder(dna_size: usize, ladder: &Ladder) -> Self {
        Self {
            migration_distance: Some(ladder.dna_size_to_migration(dna_size as f64)),
            ..Self::new(dna_size)
        }
    }

    pub fn with_size_label(mut self) -> Self {
        self.label = Some(format_dna_size(self.dna_size));
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

/// The bands of one gel lane.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BandsPattern {
    pub label: Option<String>,
    pub bands: Vec<Band>,
    /// The lane holds an undigested molecule.
    pub is_uncut: bool,
}

impl BandsPattern {
    pub fn new(label: Option<String>, bands: Vec<Band>) -> Self {
        Self {
            label,
            bands,
            is_uncut: false,
        }
    }

    pub fn from_sizes(label: Option<String>, sizes: &[usize], ladder: Option<&Ladder>) -> Self {
        let bands = sizes
            .iter()
            .map(|size| match ladder {
                Some(ladder) => Band::on_ladder(*size, ladder),
                None => Band::new(*size),
            })
            .collect();
        Self::new(label, bands)
    }

    pub fn dna_sizes(&self) -> Vec<usize> {
        self.bands.iter().map(|b| b.dna_size).collect()
    }

    /// This pattern's bands followed by `other`'s, under this pattern's label.
    pub fn merge_with(&self, other: &BandsPattern) -> BandsPattern {
        let mut ret = self.clone();
        ret.bands.extend(other.bands.iter().cloned());
        ret.is_uncut = self.is_uncut && other.is_uncut;
        ret
    }
}
