use crate::restriction_enzyme::RestrictionEnzyme;
use anyhow::{Context, Result, anyhow};
use bandwagon_engine::{CutSiteLocator, DigestError, Topology};
use log::{debug, warn};
use std::{collections::BTreeSet, fs};

const BUILTIN_ENZYMES_JSON: &str = include_str!("../assets/enzymes.json");

/// Restriction enzymes resolvable by name; the production cut-site locator.
#[derive(Clone, Debug)]
pub struct EnzymeCatalog {
    restriction_enzymes: Vec<RestrictionEnzyme>,
}

impl EnzymeCatalog {
    pub fn from_json_str(json_text: &str) -> Result<Self> {
        let res: serde_json::Value = serde_json::from_str(json_text)?;
        let arr = res
            .as_array()
            .ok_or(anyhow!("Enzymes file is not a JSON array"))?;
        let mut restriction_enzymes = vec![];
        for row in arr {
            match row.get("type").and_then(|t| t.as_str()) {
                Some("restriction") => {
                    let mut re: RestrictionEnzyme = serde_json::from_value(row.clone())
                        .map_err(|e| anyhow!("Bad restriction enzyme {row}: {e}"))?;
                    if re.sequence.is_empty() {
                        return Err(anyhow!("Restriction enzyme '{}' has no site", re.name));
                    }
                    re.check_palindromic();
                    restriction_enzymes.push(re);
                }
                Some(other) => warn!("Skipping enzyme of type '{other}': {row}"),
                None => return Err(anyhow!("Missing enzyme type for {row}")),
            }
        }
        Ok(Self::from_enzymes(restriction_enzymes))
    }

    pub fn from_enzymes(restriction_enzymes: Vec<RestrictionEnzyme>) -> Self {
        Self {
            restriction_enzymes,
        }
    }

    pub fn from_path(path: &str) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("Could not read enzymes '{path}'"))?;
        Self::from_json_str(&text).with_context(|| format!("Could not parse enzymes '{path}'"))
    }

    /// The embedded catalog, replaced by the file at `runtime_path` when that
    /// file exists and holds at least one restriction enzyme.
    pub fn with_runtime_override(runtime_path: Option<&str>) -> Result<Self> {
        if let Some(path) = runtime_path {
            let custom = Self::from_path(path)?;
            if !custom.restriction_enzymes.is_empty() {
                debug!(
                    "Using {} restriction enzymes from '{path}'",
                    custom.restriction_enzymes.len()
                );
                return Ok(custom);
            }
            warn!("No restriction enzymes in '{path}', using the built-in catalog");
        }
        Self::from_json_str(BUILTIN_ENZYMES_JSON)
    }

    pub fn restriction_enzymes(&self) -> &Vec<RestrictionEnzyme> {
        &self.restriction_enzymes
    }

    pub fn names_sorted(&self) -> Vec<&str> {
        let mut names = self
            .restriction_enzymes
            .iter()
            .map(|re| re.name.as_str())
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Names match exactly, case included.
    pub fn get(&self, name: &str) -> Option<&RestrictionEnzyme> {
        self.restriction_enzymes.iter().find(|re| re.name == name)
    }
}

impl CutSiteLocator for EnzymeCatalog {
    fn find_cut_sites(
        &self,
        sequence: &[u8],
        enzyme: &str,
        topology: Topology,
    ) -> Result<BTreeSet<usize>, DigestError> {
        self.get(enzyme)
            .ok_or_else(|| DigestError::unknown_enzyme(enzyme))?
            .cut_positions(sequence, topology)
    }
}

impl Default for EnzymeCatalog {
    fn default() -> Self {
        match Self::from_json_str(BUILTIN_ENZYMES_JSON) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Built-in enzyme catalog is unusable: {e}");
                Self::from_enzymes(vec![])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog() {
        let enzymes = EnzymeCatalog::default();
        assert!(enzymes.get("EcoRI").is_some());
        assert!(enzymes.get("BamHI").is_some());
        assert!(enzymes.get("Clostripain").is_none());
        assert!(enzymes.get("BsaI").is_some_and(|re| !re.is_palindromic()));
        let names = enzymes.names_sorted();
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_lookup_is_exact() {
        let enzymes = EnzymeCatalog::default();
        assert_eq!(enzymes.get("XhoI").unwrap().name, "XhoI");
        assert!(enzymes.get("ecori").is_none());
        assert!(enzymes.get(" XhoI ").is_none());
        assert!(enzymes.get("EcoRJ").is_none());
        assert_eq!(
            enzymes.find_cut_sites(b"GAATTC", "ecori", Topology::Linear),
            Err(DigestError::unknown_enzyme("ecori"))
        );
    }

    #[test]
    fn test_locator_errors() {
        let enzymes = EnzymeCatalog::default();
        assert_eq!(
            enzymes.find_cut_sites(b"GAATTC", "EcoRJ", Topology::Linear),
            Err(DigestError::unknown_enzyme("EcoRJ"))
        );
        assert!(matches!(
            enzymes.find_cut_sites(b"GAATTCX", "EcoRI", Topology::Linear),
            Err(DigestError::UnsearchableSequence { .. })
        ));
    }

    #[test]
    fn test_bad_rows() {
        assert!(EnzymeCatalog::from_json_str("{}").is_err());
        assert!(EnzymeCatalog::from_json_str(r#"[{"name":"X"}]"#).is_err());
        assert!(
            EnzymeCatalog::from_json_str(r#"[{"type":"restriction","name":"X"}]"#).is_err()
        );
        let catalog = EnzymeCatalog::from_json_str(
            r#"[{"type":"protease","name":"Trypsin"},
                {"type":"restriction","name":"Foo","sequence":"acgt","cut":2,"overlap":0}]"#,
        )
        .unwrap();
        assert_eq!(catalog.names_sorted(), vec!["Foo"]);
        assert_eq!(catalog.get("Foo").unwrap().sequence, "ACGT");
        assert!(catalog.get("Foo").unwrap().is_palindromic());
    }

    #[test]
    fn test_runtime_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"[{{"type":"restriction","name":"MyCutter","sequence":"GGCC","cut":2,"overlap":0}}]"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();
        let catalog = EnzymeCatalog::with_runtime_override(Some(&path)).unwrap();
        assert_eq!(catalog.names_sorted(), vec!["MyCutter"]);

        let builtin = EnzymeCatalog::with_runtime_override(None).unwrap();
        assert!(builtin.get("EcoRI").is_some());
        assert!(EnzymeCatalog::with_runtime_override(Some("/nonexistent/enzymes.json")).is_err());
    }
}
