use std::collections::BTreeSet;

use crate::compare::FeatureSet;
use crate::evaluate::MatchRule;
use crate::model::Record;

fn records_match(a: &Record, b: &Record, features: &FeatureSet, rule: &MatchRule) -> bool {
    rule.evaluate(&features.compare(a, b))
}

/// All matching pairs `(i, j)`, `i < j`, of block-relative positions.
///
/// Cost is quadratic in the block size; blocking is what keeps it tractable.
pub fn match_within_block(
    block: &[&Record],
    features: &FeatureSet,
    rule: &MatchRule,
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in block.iter().enumerate() {
        for (j, b) in block.iter().enumerate().skip(i + 1) {
            if records_match(a, b, features, rule) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Greedy first-fit clustering of block-relative positions.
///
/// Records are taken in block order. Each joins the first existing cluster in
/// which at least `cluster_ratio` of the members match it, or else starts a new
/// cluster. The outcome depends on processing order.
pub fn match_within_block_cluster_ratio(
    block: &[&Record],
    cluster_ratio: f64,
    features: &FeatureSet,
    rule: &MatchRule,
) -> Vec<BTreeSet<usize>> {
    let mut clusters: Vec<BTreeSet<usize>> = Vec::new();

    for (i, record) in block.iter().enumerate() {
        let home = clusters.iter().position(|cluster| {
            let matched = cluster
                .iter()
                .filter(|&&j| records_match(record, block[j], features, rule))
                .count();
            matched as f64 / cluster.len() as f64 >= cluster_ratio
        });

        match home {
            Some(c) => {
                clusters[c].insert(i);
            }
            None => clusters.push(BTreeSet::from([i])),
        }
    }

    clusters
}
