use anyhow::{Result, anyhow};
use bandwagon_engine::Topology;
use bio::io::fasta;
use gb_io::{reader::SeqReader, seq::Seq};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, fs::File, path::Path};

const DNA_MOLECULE_TYPE: &str = "DNA";

/// How to pick the topology of a loaded record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyHint {
    /// Keep what the file says.
    #[default]
    Auto,
    Linear,
    Circular,
}

impl TopologyHint {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "linear" => Some(Self::Linear),
            "circular" => Some(Self::Circular),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RecordFormat {
    Fasta,
    GenBank,
}

impl RecordFormat {
    fn from_path(path: &str) -> Result<Self> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "fa" | "fasta" | "fna" => Ok(Self::Fasta),
            "gb" | "gbk" | "genbank" => Ok(Self::GenBank),
            _ => Err(anyhow!("Unknown format for file: {path}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DNAsequence {
    seq: Seq,
    topology_known: bool,
}

impl DNAsequence {
    pub fn from_sequence(sequence: &str) -> Result<DNAsequence> {
        let ret = DNAsequence::from_u8(sequence.as_bytes());
        if ret.is_empty() {
            return Err(anyhow!("Empty DNA sequence"));
        }
        Ok(ret)
    }

    pub fn from_fasta_file(filename: &str) -> Result<Vec<DNAsequence>> {
        let file = File::open(filename)?;
        fasta::Reader::new(file)
            .records()
            .map(|record| -> Result<DNAsequence> {
                Ok(DNAsequence::from_fasta_record(&record?))
            })
            .collect()
    }

    /// Records whose LOCUS line names no topology keep it undeclared.
    pub fn from_genbank_file(filename: &str) -> Result<Vec<DNAsequence>> {
        let data = fs::read(filename)?;
        let declared = String::from_utf8_lossy(&data)
            .lines()
            .filter(|line| line.starts_with("LOCUS"))
            .map(locus_declares_topology)
            .collect::<Vec<_>>();
        let seqs = SeqReader::new(data.as_slice()).collect::<Result<Vec<_>, _>>()?;
        Ok(seqs
            .into_iter()
            .enumerate()
            .map(|(i, seq)| {
                DNAsequence::from_genbank_seq(seq, declared.get(i).copied().unwrap_or(false))
            })
            .collect())
    }

    pub fn write_genbank_file(&self, filename: &str) -> Result<()> {
        let file = File::create(filename)?;
        if self.seq.molecule_type.is_some() {
            gb_io::writer::write(file, &self.seq)?;
        } else {
            // gb-io only reads back a LOCUS line that has a molecule type
            let mut seq = self.seq.clone();
            seq.molecule_type = Some(DNA_MOLECULE_TYPE.to_string());
            gb_io::writer::write(file, &seq)?;
        }
        Ok(())
    }

    fn from_genbank_seq(mut seq: Seq, topology_known: bool) -> Self {
        seq.seq = Self::normalize(&seq.seq);
        Self {
            seq,
            topology_known,
        }
    }

    pub fn from_fasta_record(record: &fasta::Record) -> Self {
        let mut ret = Self::from_u8(record.seq());
        ret.seq.name = Some(record.id().to_string());
        if let Some(desc) = record.desc() {
            ret.seq.comments.push(desc.to_string())
        }
        ret
    }

    fn from_u8(s: &[u8]) -> Self {
        let s = Self::normalize(s);
        let seq = Seq {
            name: None,
            topology: gb_io::seq::Topology::Linear,
            date: None,
            len: Some(s.len()),
            molecule_type: Some(DNA_MOLECULE_TYPE.to_string()),
            division: String::new(),
            definition: None,
            accession: None,
            version: None,
            source: None,
            dblink: None,
            keywords: None,
            references: vec![],
            comments: vec![],
            seq: s,
            contig: None,
            features: vec![],
        };
        Self {
            seq,
            topology_known: false,
        }
    }

    /// Uppercase, without whitespace; other symbols are kept for the
    /// cut-site search to reject.
    fn normalize(v: &[u8]) -> Vec<u8> {
        v.iter()
            .filter(|c| !c.is_ascii_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }

    #[inline(always)]
    pub fn forward(&self) -> &[u8] {
        &self.seq.seq
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.forward().len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward().is_empty()
    }

    pub fn name(&self) -> &Option<String> {
        &self.seq.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.seq.name = Some(name.to_string());
    }

    pub fn topology(&self) -> Topology {
        Topology::from_linear_flag(self.seq.topology == gb_io::seq::Topology::Linear)
    }

    pub fn is_circular(&self) -> bool {
        self.topology().is_circular()
    }

    pub fn set_topology(&mut self, topology: Topology) {
        self.seq.topology = match topology {
            Topology::Linear => gb_io::seq::Topology::Linear,
            Topology::Circular => gb_io::seq::Topology::Circular,
        };
        self.topology_known = true;
    }

    /// Whether the source file declared a topology.
    pub fn has_known_topology(&self) -> bool {
        self.topology_known
    }

    /// The declared topology, or `default` when the record has none.
    pub fn record_is_linear(&self, default: bool) -> bool {
        if self.topology_known {
            self.topology().is_linear()
        } else {
            default
        }
    }

    /// The declared topology, or `default` when the record has none.
    pub fn topology_or(&self, default: Topology) -> Topology {
        Topology::from_linear_flag(self.record_is_linear(default.is_linear()))
    }

    pub fn apply_topology_hint(&mut self, hint: TopologyHint) {
        match hint {
            TopologyHint::Auto => {}
            TopologyHint::Linear => self.set_topology(Topology::Linear),
            TopologyHint::Circular => self.set_topology(Topology::Circular),
        }
    }
}

fn locus_declares_topology(line: &str) -> bool {
    line.split_whitespace().any(|word| word == "linear" || word == "circular")
}

/// All records of a FASTA or GenBank file, picked by file extension.
pub fn load_records(path: &str, hint: TopologyHint) -> Result<Vec<DNAsequence>> {
    let mut records = match RecordFormat::from_path(path)? {
        RecordFormat::Fasta => DNAsequence::from_fasta_file(path)?,
        RecordFormat::GenBank => DNAsequence::from_genbank_file(path)?,
    };
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    for (i, record) in records.iter_mut().enumerate() {
        record.apply_topology_hint(hint);
        if record.name().as_deref().is_none_or(str::is_empty) {
            match i {
                0 => record.set_name(&stem),
                i => record.set_name(&format!("{stem}_{i}")),
            }
        }
    }
    debug!("Loaded {} record(s) from '{path}'", records.len());
    Ok(records)
}

/// The first record of a FASTA or GenBank file.
pub fn load_record(path: &str, hint: TopologyHint) -> Result<DNAsequence> {
    load_records(path, hint)?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No sequence record in '{path}'"))
}

impl fmt::Display for DNAsequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.forward()))
    }
}
