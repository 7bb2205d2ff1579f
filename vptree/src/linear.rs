//! Brute-force scans with the same contract as the tree queries.
//!
//! Slow; intended as a reference for tests and benchmarks.

use crate::metric::Metric;
use crate::tree::Match;

/// Returns the first element at minimal distance from `query`.
pub fn nearest<T, D: Metric<T>>(items: &[T], metric: &D, query: &T) -> Option<Match> {
    let mut best: Option<Match> = None;
    for (index, item) in items.iter().enumerate() {
        let distance = metric.distance(query, item);
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(Match { index, distance });
        }
    }
    best
}

/// Returns every element strictly closer than `threshold`, in slice order.
pub fn range<T, D: Metric<T>>(items: &[T], metric: &D, query: &T, threshold: f64) -> Vec<Match> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let distance = metric.distance(query, item);
            (distance < threshold).then_some(Match { index, distance })
        })
        .collect()
}
