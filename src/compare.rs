//! Tolerance-based comparison of band sizes and band patterns.

pub const DEFAULT_SIMILARITY_TOLERANCE: f64 = 0.3;
pub const DEFAULT_MERGE_TOLERANCE: f64 = 0.2;

/// Whether two band sizes differ by less than `tolerance` relative to the
/// smaller one.
pub fn bands_are_similar(band1: f64, band2: f64, tolerance: f64) -> bool {
    let smaller = band1.min(band2);
    if smaller <= 0.0 {
        return band1 == band2;
    }
    (band1 - band2).abs() / smaller < tolerance
}

/// Sorts the bands and averages each band into its predecessor when the two
/// are similar, as unresolvable bands would appear on a gel.
pub fn merge_bands_in_pattern(bands: &[f64], tolerance: f64) -> Vec<f64> {
    let mut sorted = bands.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut merged: Vec<f64> = Vec::with_capacity(sorted.len());
    for band in sorted {
        match merged.last_mut() {
            Some(last) if bands_are_similar(*last, band, tolerance) => {
                *last = (*last + band) / 2.0;
            }
            _ => merged.push(band),
        }
    }
    merged
}

/// Whether two patterns would be told apart on a gel. Empty patterns are
/// never similar to anything.
pub fn bands_patterns_are_similar(
    pattern1: &[f64],
    pattern2: &[f64],
    tolerance: f64,
    merge_tolerance: f64,
) -> bool {
    if pattern1.is_empty() || pattern2.is_empty() {
        return false;
    }
    let merged1 = merge_bands_in_pattern(pattern1, merge_tolerance);
    let merged2 = merge_bands_in_pattern(pattern2, merge_tolerance);
    merged1.len() == merged2.len()
        && merged1
            .iter()
            .zip(merged2.iter())
            .all(|(b1, b2)| bands_are_similar(*b1, *b2, tolerance))
}

/// Integer band sizes, with the default tolerances.
pub fn sizes_patterns_are_similar(pattern1: &[usize], pattern2: &[usize]) -> bool {
    let to_f64 = |p: &[usize]| p.iter().map(|b| *b as f64).collect::<Vec<_>>();
    bands_patterns_are_similar(
        &to_f64(pattern1),
        &to_f64(pattern2),
        DEFAULT_SIMILARITY_TOLERANCE,
        DEFAULT_MERGE_TOLERANCE,
    )
}
