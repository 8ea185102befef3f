//! Project-specific utilities live here.

use std::collections::HashSet;

/// Distinct values in first-seen order.
pub fn unique_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(*value))
        .map(str::to_owned)
        .collect()
}
