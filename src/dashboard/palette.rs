// src/dashboard/palette.rs

use std::collections::{BTreeMap, HashSet};

/// Assign colors to categories in first-appearance order, wrapping around the
/// palette when there are more categories than colors.
pub fn cycle_colors<'a>(
    categories: impl IntoIterator<Item = &'a str>,
    palette: &[String],
) -> BTreeMap<String, String> {
    let mut seen = HashSet::new();
    let mut out = BTreeMap::new();
    if palette.is_empty() {
        return out;
    }
    for category in categories {
        if seen.insert(category) {
            let color = &palette[(seen.len() - 1) % palette.len()];
            out.insert(category.to_string(), color.clone());
        }
    }
    out
}
