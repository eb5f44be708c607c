use std::collections::{BTreeMap, BTreeSet};

use crate::block::block_data;
use crate::compare::FeatureSet;
use crate::error::LinkageError;
use crate::evaluate::MatchRule;
use crate::matcher::{match_within_block, match_within_block_cluster_ratio};
use crate::model::{BlockKey, Blocks, Dataset, MatchGraph, PassMatches, Record, RecordId};

/// One blocking + matching configuration, resolved against a dataset schema.
#[derive(Debug, Clone)]
pub struct PassSpec {
    pub block_columns: Vec<String>,
    pub features: FeatureSet,
    pub rule: MatchRule,
    /// `Some` switches the pass to clustering mode.
    pub cluster_ratio: Option<f64>,
}

impl PassSpec {
    pub fn new(block_columns: &[&str], features: FeatureSet) -> Self {
        Self {
            block_columns: block_columns.iter().map(|c| c.to_string()).collect(),
            features,
            rule: MatchRule::default(),
            cluster_ratio: None,
        }
    }

    pub fn with_rule(mut self, rule: MatchRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_cluster_ratio(mut self, ratio: f64) -> Self {
        self.cluster_ratio = Some(ratio);
        self
    }

    pub fn validate(&self, dataset: &Dataset) -> Result<(), LinkageError> {
        if self.block_columns.is_empty() {
            return Err(LinkageError::InvalidArgument(
                "at least one block column is required".into(),
            ));
        }
        for col in &self.block_columns {
            dataset.column_index(col)?;
        }
        self.features.validate(dataset.width())?;
        if let Some(ratio) = self.cluster_ratio {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(LinkageError::InvalidArgument(format!(
                    "cluster ratio must be within [0, 1], got {ratio}"
                )));
            }
        }
        Ok(())
    }
}

/// Block the dataset, match inside every block, and report matches in record ids.
pub fn perform_linkage_pass(
    dataset: &Dataset,
    spec: &PassSpec,
) -> Result<PassMatches, LinkageError> {
    perform_linkage_pass_with_sizes(dataset, spec).map(|(matches, _)| matches)
}

/// [`perform_linkage_pass`], also returning every block's size in block-key order.
pub fn perform_linkage_pass_with_sizes(
    dataset: &Dataset,
    spec: &PassSpec,
) -> Result<(PassMatches, Vec<usize>), LinkageError> {
    spec.validate(dataset)?;

    let cols: Vec<&str> = spec.block_columns.iter().map(String::as_str).collect();
    let blocks = block_data(dataset, &cols)?;
    if blocks.len() == 1 && dataset.len() > 1 {
        log::warn!(
            "blocking on {cols:?} put all {} records in one block",
            dataset.len()
        );
    }

    let id_col = dataset.id_column();
    let matches = match spec.cluster_ratio {
        None => PassMatches::Pairs(map_blocks(&blocks, |block| {
            let pairs = match_within_block(block, &spec.features, &spec.rule);
            map_matches_to_record_ids(&pairs, block, id_col)
        })),
        Some(ratio) => PassMatches::Clusters(map_blocks(&blocks, |block| {
            let clusters =
                match_within_block_cluster_ratio(block, ratio, &spec.features, &spec.rule);
            map_clusters_to_record_ids(&clusters, block, id_col)
        })),
    };

    log::debug!(
        "pass on {cols:?}: {} block(s), {} matched edge(s)",
        matches.block_count(),
        matches.edges().len()
    );
    let sizes = blocks.values().map(Vec::len).collect();
    Ok((matches, sizes))
}

/// Apply `f` to every block. Blocks own disjoint keys, so results merge without locking.
#[cfg(not(feature = "parallel"))]
fn map_blocks<'a, T, F>(blocks: &Blocks<'a>, f: F) -> BTreeMap<BlockKey, T>
where
    F: Fn(&[&'a Record]) -> T,
{
    blocks
        .iter()
        .map(|(key, block)| (key.clone(), f(block)))
        .collect()
}

#[cfg(feature = "parallel")]
fn map_blocks<'a, T, F>(blocks: &Blocks<'a>, f: F) -> BTreeMap<BlockKey, T>
where
    F: Fn(&[&'a Record]) -> T + Sync,
    T: Send,
{
    use rayon::prelude::*;

    blocks
        .par_iter()
        .map(|(key, block)| (key.clone(), f(block)))
        .collect()
}

/// Translate block-relative pairs into record-id pairs.
pub fn map_matches_to_record_ids(
    pairs: &[(usize, usize)],
    block: &[&Record],
    id_col: usize,
) -> Vec<(RecordId, RecordId)> {
    pairs
        .iter()
        .map(|&(i, j)| (block[i][id_col].clone(), block[j][id_col].clone()))
        .collect()
}

/// Translate block-relative clusters into record-id clusters.
pub fn map_clusters_to_record_ids(
    clusters: &[BTreeSet<usize>],
    block: &[&Record],
    id_col: usize,
) -> Vec<BTreeSet<RecordId>> {
    clusters
        .iter()
        .map(|cluster| cluster.iter().map(|&i| block[i][id_col].clone()).collect())
        .collect()
}

/// Union the edges of several passes into one graph.
///
/// Every edge is stored under its smaller id. Edges are only copied, never
/// inferred: 1-2 and 2-3 do not produce 1-3. Use [`connected_components`]
/// for transitive entities.
pub fn compile_match_lists(passes: &[PassMatches]) -> MatchGraph {
    let mut graph = MatchGraph::new();
    for pass in passes {
        for (a, b) in pass.edges() {
            if a == b {
                continue;
            }
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            graph.entry(lo).or_default().insert(hi);
        }
    }
    graph
}

/// Number of distinct edges in a graph.
pub fn edge_count(graph: &MatchGraph) -> usize {
    graph.values().map(BTreeSet::len).sum()
}

// ---------------------------------------------------------------------------
// Transitive entities
// ---------------------------------------------------------------------------

struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[i] != root {
            let next = self.parent[i];
            self.parent[i] = root;
            i = next;
        }
        root
    }

    fn union(&mut self, i: usize, j: usize) {
        let ri = self.find(i);
        let rj = self.find(j);
        if ri == rj {
            return;
        }
        if self.size[ri] < self.size[rj] {
            self.parent[ri] = rj;
            self.size[rj] += self.size[ri];
        } else {
            self.parent[rj] = ri;
            self.size[ri] += self.size[rj];
        }
    }
}

/// Groups of ids connected by any path in the graph, ordered by smallest member.
///
/// Only ids that appear in the graph are returned; unmatched records are not.
pub fn connected_components(graph: &MatchGraph) -> Vec<BTreeSet<RecordId>> {
    let ids: Vec<&RecordId> = graph
        .iter()
        .flat_map(|(k, vs)| std::iter::once(k).chain(vs.iter()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index: BTreeMap<&RecordId, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let mut sets = DisjointSet::new(ids.len());
    for (k, vs) in graph {
        for v in vs {
            sets.union(index[k], index[v]);
        }
    }

    let mut groups: BTreeMap<usize, BTreeSet<RecordId>> = BTreeMap::new();
    for (i, id) in ids.iter().enumerate() {
        groups.entry(sets.find(i)).or_default().insert((*id).clone());
    }

    let mut components: Vec<BTreeSet<RecordId>> = groups.into_values().collect();
    components.sort_by(|a, b| a.first().cmp(&b.first()));
    components
}
