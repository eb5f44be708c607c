use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::config::{LinkageConfig, PassConfig, StandardizeConfig};
use crate::error::LinkageError;
use crate::model::{
    Dataset, LinkageMeta, LinkageResult, LinkageSummary, MatchGraph, PassMatches, PassSummary,
    Value,
};
use crate::pass::{
    compile_match_lists, connected_components, edge_count, perform_linkage_pass_with_sizes,
};
use crate::score::score_linkage_vs_truth;
use crate::standardize::standardize_name;

/// Run every configured pass over `dataset` and merge the results.
pub fn run(config: &LinkageConfig, dataset: &Dataset) -> Result<LinkageResult, LinkageError> {
    let id_name = &dataset.columns()[dataset.id_column()];
    if *id_name != config.id_column {
        return Err(LinkageError::InvalidArgument(format!(
            "dataset is keyed by '{id_name}' but config '{}' expects '{}'",
            config.name, config.id_column
        )));
    }

    let dataset: Cow<'_, Dataset> = match &config.standardize {
        Some(opts) => Cow::Owned(standardized(dataset, opts)?),
        None => Cow::Borrowed(dataset),
    };

    let mut all_matches = Vec::with_capacity(config.passes.len());
    let mut passes = Vec::with_capacity(config.passes.len());
    for pass in &config.passes {
        let (matches, summary) = run_pass(pass, &dataset)?;
        log::info!(
            "pass '{}': {} block(s), {} candidate pair(s), {} matched edge(s)",
            summary.name,
            summary.blocks,
            summary.candidate_pairs,
            summary.matched_edges
        );
        all_matches.push(matches);
        passes.push(summary);
    }

    let matches = compile_match_lists(&all_matches);
    let summary = summarize(&matches, dataset.len());
    log::info!(
        "linkage '{}': {} record(s), {} edge(s), {} entit(ies)",
        config.name,
        summary.records,
        summary.edges,
        summary.entities
    );

    Ok(LinkageResult {
        meta: LinkageMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        passes,
        matches,
        score: None,
    })
}

/// [`run`], then score the merged graph against known true matches.
pub fn run_and_score(
    config: &LinkageConfig,
    dataset: &Dataset,
    truth: &MatchGraph,
) -> Result<LinkageResult, LinkageError> {
    let mut result = run(config, dataset)?;
    result.score = Some(score_linkage_vs_truth(&result.matches, truth, dataset.len()));
    Ok(result)
}

fn run_pass(
    pass: &PassConfig,
    dataset: &Dataset,
) -> Result<(PassMatches, PassSummary), LinkageError> {
    let spec = pass.to_spec(dataset)?;
    let (matches, sizes) = perform_linkage_pass_with_sizes(dataset, &spec)?;
    let candidate_pairs = sizes
        .iter()
        .map(|&k| (k as u64) * (k as u64).saturating_sub(1) / 2)
        .sum();

    let summary = PassSummary {
        name: pass.name.clone(),
        cluster_mode: matches.is_cluster_mode(),
        blocks: sizes.len(),
        largest_block: sizes.iter().copied().max().unwrap_or(0),
        candidate_pairs,
        matched_edges: matches.edges().len(),
    };
    Ok((matches, summary))
}

/// Entities are connected groups plus every record no edge touches.
fn summarize(matches: &MatchGraph, records: usize) -> LinkageSummary {
    let components = connected_components(matches);
    let linked: usize = components.iter().map(BTreeSet::len).sum();
    LinkageSummary {
        records,
        edges: edge_count(matches),
        entities: components.len() + records.saturating_sub(linked),
    }
}

fn standardized(dataset: &Dataset, config: &StandardizeConfig) -> Result<Dataset, LinkageError> {
    let cols = config
        .columns
        .iter()
        .map(|c| dataset.column_index(c))
        .collect::<Result<Vec<_>, _>>()?;

    let rows = dataset
        .rows()
        .iter()
        .map(|row| {
            let mut row = row.clone();
            for &c in &cols {
                let cleaned = match &row[c] {
                    Value::Text(s) => standardize_name(s, &config.options),
                    _ => continue,
                };
                row[c] = Value::Text(cleaned);
            }
            row
        })
        .collect();

    log::debug!("standardized name column(s) {:?}", config.columns);
    Dataset::new(
        dataset.columns().to_vec(),
        rows,
        &dataset.columns()[dataset.id_column()],
    )
}
