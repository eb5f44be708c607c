//! `reclink-linkage` — Probabilistic record linkage engine.
//!
//! Pure engine crate: receives pre-loaded records, returns blocks, matches,
//! merged match graphs and quality scores. No CLI or IO dependencies.

pub mod block;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod hash;
pub mod matcher;
pub mod model;
pub mod pass;
pub mod query;
pub mod score;
pub mod standardize;

pub use block::block_data;
pub use compare::{Comparator, FeatureSet, SimilarityMeasure};
pub use config::LinkageConfig;
pub use engine::{run, run_and_score};
pub use error::LinkageError;
pub use evaluate::MatchRule;
pub use model::{BlockKey, Dataset, LinkageResult, MatchGraph, PassMatches, Record, RecordId, Value};
pub use pass::{
    compile_match_lists, connected_components, perform_linkage_pass, perform_linkage_pass_with_sizes,
    PassSpec,
};
pub use score::score_linkage_vs_truth;
