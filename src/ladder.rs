use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use lazy_static::lazy_static;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, fs, io::Read, path::Path};

pub const DEFAULT_LADDER_NAME: &str = "100-4k";

const LADDER_100_TO_4K_BANDS: [(f64, f64); 12] = [
    (100.0, 205.0),
    (200.0, 186.0),
    (300.0, 171.0),
    (400.0, 158.0),
    (500.0, 149.0),
    (650.0, 139.0),
    (850.0, 128.0),
    (1000.0, 121.0),
    (1650.0, 100.0),
    (2000.0, 90.0),
    (3000.0, 73.0),
    (4000.0, 65.0),
];

lazy_static! {
    pub static ref LADDER_100_TO_4K: Ladder =
        Ladder::build(DEFAULT_LADDER_NAME, &LADDER_100_TO_4K_BANDS);
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LadderBand {
    pub size: f64,
    pub migration: f64,
}

/// A size standard: DNA sizes with their migration distance on the gel.
#[derive(Clone, Debug, Serialize)]
pub struct Ladder {
    name: String,
    /// Sorted by increasing size.
    bands: Vec<LadderBand>,
}

impl Ladder {
    /// Builds a ladder from raw (size, migration) calibration pairs.
    ///
    /// Migrations are shifted down by `min - 0.1 * span` unless the smallest
    /// migration is already below a tenth of the migration span.
    pub fn generate(name: &str, sizes_migrations: &[(f64, f64)]) -> Result<Self> {
        if sizes_migrations.len() < 2 {
            return Err(anyhow!("Ladder '{name}' needs at least two bands"));
        }
        if let Some((size, migration)) = sizes_migrations
            .iter()
            .find(|(s, m)| !s.is_finite() || *s <= 0.0 || !m.is_finite())
        {
            return Err(anyhow!(
                "Ladder '{name}' has an invalid band: size {size}, migration {migration}"
            ));
        }
        Ok(Self::build(name, sizes_migrations))
    }

    fn build(name: &str, sizes_migrations: &[(f64, f64)]) -> Self {
        let (min, max) = Self::min_max(sizes_migrations.iter().map(|(_, m)| *m));
        let span = max - min;
        let shift = if min < 0.1 * span { 0.0 } else { min - 0.1 * span };
        let mut bands = sizes_migrations
            .iter()
            .map(|(size, migration)| LadderBand {
                size: *size,
                migration: migration - shift,
            })
            .collect::<Vec<_>>();
        bands.sort_by(|a, b| a.size.total_cmp(&b.size));
        Self {
            name: name.to_owned(),
            bands,
        }
    }

    pub fn new(name: &str, parts: &Value) -> Result<Self> {
        let parts = parts
            .as_array()
            .ok_or_else(|| anyhow!("Ladder '{name}' is not an array"))?
            .iter()
            .map(|p| -> Result<(f64, f64)> {
                let pair = p
                    .as_array()
                    .filter(|pair| pair.len() == 2)
                    .ok_or_else(|| {
                        anyhow!("Ladder '{name}' band {p} is not a [size, migration] pair")
                    })?;
                match (pair[0].as_f64(), pair[1].as_f64()) {
                    (Some(size), Some(migration)) => Ok((size, migration)),
                    _ => Err(anyhow!("Ladder '{name}' band {p} is not numeric")),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Self::generate(name, &parts)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bands(&self) -> &Vec<LadderBand> {
        &self.bands
    }

    /// (smallest, largest) DNA size.
    pub fn size_span(&self) -> (f64, f64) {
        Self::min_max(self.bands.iter().map(|b| b.size))
    }

    /// (smallest, largest) migration distance.
    pub fn migration_span(&self) -> (f64, f64) {
        Self::min_max(self.bands.iter().map(|b| b.migration))
    }

    /// Piecewise-linear migration of a DNA size. Sizes outside the ladder
    /// clamp to the migration of the nearest end.
    pub fn dna_size_to_migration(&self, dna_size: f64) -> f64 {
        let points = self
            .bands
            .iter()
            .map(|b| (b.size, b.migration))
            .collect::<Vec<_>>();
        interpolate(&points, dna_size)
    }

    /// Inverse of [`Self::dna_size_to_migration`], clamped the same way.
    pub fn migration_to_dna_size(&self, migration: f64) -> f64 {
        let mut points = self
            .bands
            .iter()
            .map(|b| (b.migration, b.size))
            .collect::<Vec<_>>();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        interpolate(&points, migration)
    }

    /// `count` evenly spaced migrations across the ladder, as DNA sizes
    /// rounded to the nearest hundred.
    pub fn ticks(&self, count: usize) -> Vec<usize> {
        let (min, max) = self.migration_span();
        let step = match count {
            0 => return vec![],
            1 => 0.0,
            n => (max - min) / (n - 1) as f64,
        };
        (0..count)
            .map(|i| {
                let size = self.migration_to_dna_size(min + step * i as f64);
                ((size / 100.0).round_ties_even() * 100.0).max(0.0) as usize
            })
            .collect()
    }

    fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
        values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
    }
}

/// Linear interpolation over points sorted by x, clamped at both ends.
fn interpolate(points: &[(f64, f64)], x: f64) -> f64 {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return 0.0;
    };
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    points
        .windows(2)
        .find(|w| x <= w[1].0)
        .map(|w| {
            let ((x0, y0), (x1, y1)) = (w[0], w[1]);
            if x1 == x0 {
                y1
            } else {
                y0 + (x - x0) * (y1 - y0) / (x1 - x0)
            }
        })
        .unwrap_or(last.1)
}

#[derive(Debug, Deserialize)]
struct LadderCsvRow {
    size: f64,
    migration: f64,
}

#[derive(Clone, Debug)]
pub struct LadderCatalog {
    ladders: HashMap<String, Ladder>,
}

impl LadderCatalog {
    pub fn from_json_str(data: &str) -> Result<Self> {
        let res: Value = serde_json::from_str(data)?;
        let map = res
            .as_object()
            .ok_or_else(|| anyhow!("Ladder JSON is not an object"))?;
        let ladders = map
            .iter()
            .map(|(name, parts)| -> Result<(String, Ladder)> {
                Ok((name.to_owned(), Ladder::new(name, parts)?))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { ladders })
    }

    /// A single ladder from CSV text with a `size,migration` header.
    pub fn ladder_from_csv_reader<R: Read>(name: &str, reader: R) -> Result<Ladder> {
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let parts = rdr
            .deserialize::<LadderCsvRow>()
            .map(|row| -> Result<(f64, f64)> {
                let row = row.with_context(|| format!("Bad CSV row in ladder '{name}'"))?;
                Ok((row.size, row.migration))
            })
            .collect::<Result<Vec<_>>>()?;
        Ladder::generate(name, &parts)
    }

    /// Adds the ladders of a JSON catalog, or one ladder named after a
    /// `.csv` file's stem.
    pub fn load_path(&mut self, path: &str) -> Result<()> {
        let p = Path::new(path);
        let is_csv = p
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv {
            let name = p
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string());
            let file = fs::File::open(path).with_context(|| format!("Could not open '{path}'"))?;
            self.insert(Self::ladder_from_csv_reader(&name, file)?);
        } else {
            let text =
                fs::read_to_string(path).with_context(|| format!("Could not read '{path}'"))?;
            let other = Self::from_json_str(&text)
                .with_context(|| format!("Could not parse ladders '{path}'"))?;
            self.ladders.extend(other.ladders);
        }
        Ok(())
    }

    pub fn insert(&mut self, ladder: Ladder) {
        self.ladders.insert(ladder.name().to_string(), ladder);
    }

    pub fn get(&self, name: &str) -> Option<&Ladder> {
        self.ladders.get(name)
    }

    pub fn names_sorted(&self) -> Vec<String> {
        let mut names = self.ladders.keys().cloned().collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

impl Default for LadderCatalog {
    fn default() -> Self {
        match Self::from_json_str(include_str!("../assets/ladders.json")) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Built-in ladders are unusable: {e}");
                let mut catalog = Self {
                    ladders: HashMap::new(),
                };
                catalog.insert(LADDER_100_TO_4K.clone());
                catalog
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_generate_shifts_migrations() {
        // span 140, min 65 >= 14, so everything moves down by 51
        let ladder = &*LADDER_100_TO_4K;
        assert_eq!(ladder.name(), "100-4k");
        assert_close(ladder.bands()[0].migration, 154.0);
        assert_close(ladder.bands()[11].migration, 14.0);
        assert_eq!(ladder.migration_span(), (14.0, 154.0));
        assert_eq!(ladder.size_span(), (100.0, 4000.0));
    }

    #[test]
    fn test_generate_keeps_low_migrations() {
        let ladder = Ladder::generate("low", &[(100.0, 100.0), (1000.0, 5.0)]).unwrap();
        assert_close(ladder.bands()[0].migration, 100.0);
        assert_close(ladder.bands()[1].migration, 5.0);
        assert!(Ladder::generate("one", &[(100.0, 1.0)]).is_err());
        assert!(Ladder::generate("bad", &[(0.0, 1.0), (10.0, 2.0)]).is_err());
    }

    #[test]
    fn test_dna_size_to_migration() {
        let ladder = &*LADDER_100_TO_4K;
        assert_close(ladder.dna_size_to_migration(100.0), 154.0);
        assert_close(ladder.dna_size_to_migration(150.0), 144.5);
        assert_close(ladder.dna_size_to_migration(2500.0), 30.5);
        assert_close(ladder.dna_size_to_migration(50.0), 154.0);
        assert_close(ladder.dna_size_to_migration(10000.0), 14.0);
    }

    #[test]
    fn test_migration_to_dna_size() {
        let ladder = &*LADDER_100_TO_4K;
        assert_close(ladder.migration_to_dna_size(144.5), 150.0);
        assert_close(ladder.migration_to_dna_size(30.5), 2500.0);
        assert_close(ladder.migration_to_dna_size(500.0), 100.0);
        assert_close(ladder.migration_to_dna_size(0.0), 4000.0);
    }

    #[test]
    fn test_ticks() {
        let ladder = &*LADDER_100_TO_4K;
        assert_eq!(ladder.ticks(0), Vec::<usize>::new());
        assert_eq!(ladder.ticks(2), vec![4000, 100]);
        let ticks = ladder.ticks(5);
        assert_eq!(ticks.len(), 5);
        assert!(ticks.iter().all(|t| t % 100 == 0));
        assert!(ticks.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_default_catalog() {
        let catalog = LadderCatalog::default();
        assert_eq!(catalog.names_sorted(), vec!["100-4k", "1kb-10k", "50-1k"]);
        let ladder = catalog.get(DEFAULT_LADDER_NAME).unwrap();
        assert_eq!(ladder.bands(), LADDER_100_TO_4K.bands());
        assert_eq!(ladder.size_span(), (100.0, 4000.0));
    }

    #[test]
    fn test_ladder_from_csv() {
        let text = "size,migration\n100, 50\n1000, 10\n500, 20\n";
        let ladder = LadderCatalog::ladder_from_csv_reader("mine", text.as_bytes()).unwrap();
        assert_eq!(ladder.name(), "mine");
        let sizes = ladder.bands().iter().map(|b| b.size).collect::<Vec<_>>();
        assert_eq!(sizes, vec![100.0, 500.0, 1000.0]);
        let bad = "size,migration\nx,1\n";
        assert!(LadderCatalog::ladder_from_csv_reader("bad", bad.as_bytes()).is_err());
    }

    #[test]
    fn test_bad_json() {
        assert!(LadderCatalog::from_json_str("[]").is_err());
        assert!(LadderCatalog::from_json_str(r#"{"x": [[1, 2, 3], [4, 5, 6]]}"#).is_err());
        assert!(LadderCatalog::from_json_str(r#"{"x": [[100, "a"], [200, 1]]}"#).is_err());
    }
}
