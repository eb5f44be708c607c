use std::collections::BTreeSet;

use crate::model::{LinkageScore, MatchGraph, RecordId};

/// Unordered pairs of a graph, each normalized as `(smaller, larger)`.
fn pair_set(graph: &MatchGraph) -> BTreeSet<(&RecordId, &RecordId)> {
    graph
        .iter()
        .flat_map(|(k, vs)| vs.iter().map(move |v| if k <= v { (k, v) } else { (v, k) }))
        .filter(|(a, b)| a != b)
        .collect()
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Score a computed match graph against ground truth over `record_count` records.
///
/// True negatives are whatever remains of the `n choose 2` possible pairs.
/// Every ratio with a zero denominator reports 0.0.
pub fn score_linkage_vs_truth(
    found: &MatchGraph,
    truth: &MatchGraph,
    record_count: usize,
) -> LinkageScore {
    let found_pairs = pair_set(found);
    let true_pairs = pair_set(truth);

    let tp = found_pairs.intersection(&true_pairs).count() as u64;
    let fp = found_pairs.difference(&true_pairs).count() as u64;
    let fn_ = true_pairs.difference(&found_pairs).count() as u64;

    let n = record_count as u64;
    let possible = n * n.saturating_sub(1) / 2;
    let tn = possible.saturating_sub(tp + fp + fn_);

    let sensitivity = ratio(tp as f64, (tp + fn_) as f64);
    let specificity = ratio(tn as f64, (tn + fp) as f64);
    let ppv = ratio(tp as f64, (tp + fp) as f64);
    let f1 = ratio(2.0 * ppv * sensitivity, ppv + sensitivity);

    LinkageScore {
        sensitivity: round3(sensitivity),
        specificity: round3(specificity),
        ppv: round3(ppv),
        f1: round3(f1),
        true_positives: tp,
        false_positives: fp,
        false_negatives: fn_,
        true_negatives: tn,
    }
}
