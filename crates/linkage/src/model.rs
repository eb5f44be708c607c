use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Serialize, Serializer};

use crate::error::LinkageError;

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// A single field of a record.
///
/// Totally ordered and hashable so it can serve both as a block-key component
/// and as a record identifier. Variant order defines the cross-type ordering:
/// `Null < Bool < Int < Float < Text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text form used by string comparators. `None` for null.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(Cow::Borrowed(s)),
            other => Some(Cow::Owned(other.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{}", n.0),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(n.0),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(OrderedFloat(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A record is one row of field values; identity lives in the dataset's id column.
pub type Record = Vec<Value>;

/// The value of a record's identifier column.
pub type RecordId = Value;

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Tabular input: named columns, rows of equal width, and an identifier column.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Record>,
    id_column: usize,
}

impl Dataset {
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Record>,
        id_column: &str,
    ) -> Result<Self, LinkageError> {
        let id_idx = columns
            .iter()
            .position(|c| c == id_column)
            .ok_or_else(|| LinkageError::MissingColumn {
                column: id_column.into(),
            })?;

        let mut seen: BTreeSet<&Value> = BTreeSet::new();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(LinkageError::SchemaMismatch {
                    row: i,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            let id = &row[id_idx];
            if id.is_null() {
                return Err(LinkageError::MissingId { row: i });
            }
            if !seen.insert(id) {
                return Err(LinkageError::DuplicateId {
                    id: id.clone(),
                    row: i,
                });
            }
        }

        Ok(Self {
            columns,
            rows,
            id_column: id_idx,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Index of the identifier column.
    pub fn id_column(&self) -> usize {
        self.id_column
    }

    pub fn column_index(&self, name: &str) -> Result<usize, LinkageError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| LinkageError::MissingColumn { column: name.into() })
    }

    pub fn record_id<'a>(&self, record: &'a [Value]) -> &'a RecordId {
        &record[self.id_column]
    }
}

// ---------------------------------------------------------------------------
// Blocking
// ---------------------------------------------------------------------------

/// Values of the block columns shared by every member of a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey(pub Vec<Value>);

impl BlockKey {
    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{single}"),
            values => {
                f.write_str("(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Serialize for BlockKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Records grouped by block key. Members borrow from the dataset, in input order.
pub type Blocks<'a> = BTreeMap<BlockKey, Vec<&'a Record>>;

// ---------------------------------------------------------------------------
// Match results
// ---------------------------------------------------------------------------

/// Matches produced by a single pass, keyed by block and expressed in record ids.
#[derive(Debug, Clone, PartialEq)]
pub enum PassMatches {
    Pairs(BTreeMap<BlockKey, Vec<(RecordId, RecordId)>>),
    Clusters(BTreeMap<BlockKey, Vec<BTreeSet<RecordId>>>),
}

impl PassMatches {
    pub fn is_cluster_mode(&self) -> bool {
        matches!(self, PassMatches::Clusters(_))
    }

    pub fn block_count(&self) -> usize {
        match self {
            PassMatches::Pairs(m) => m.len(),
            PassMatches::Clusters(m) => m.len(),
        }
    }

    /// Every matched pair, as emitted or as implied by cluster co-membership.
    pub fn edges(&self) -> Vec<(RecordId, RecordId)> {
        match self {
            PassMatches::Pairs(m) => m.values().flatten().cloned().collect(),
            PassMatches::Clusters(m) => {
                let mut edges = Vec::new();
                for cluster in m.values().flatten() {
                    let ids: Vec<&RecordId> = cluster.iter().collect();
                    for (i, a) in ids.iter().enumerate() {
                        for b in &ids[i + 1..] {
                            edges.push(((*a).clone(), (*b).clone()));
                        }
                    }
                }
                edges
            }
        }
    }
}

/// Global match graph: each edge stored once, under the smaller identifier.
pub type MatchGraph = BTreeMap<RecordId, BTreeSet<RecordId>>;

/// Emit a graph as `[[id, [ids...]], ...]` so non-string ids survive JSON.
fn serialize_graph<S: Serializer>(graph: &MatchGraph, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(graph.iter())
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkageScore {
    pub sensitivity: f64,
    pub specificity: f64,
    pub ppv: f64,
    pub f1: f64,
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub true_negatives: u64,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub name: String,
    pub cluster_mode: bool,
    pub blocks: usize,
    pub largest_block: usize,
    pub candidate_pairs: u64,
    pub matched_edges: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkageSummary {
    pub records: usize,
    pub edges: usize,
    pub entities: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkageMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkageResult {
    pub meta: LinkageMeta,
    pub summary: LinkageSummary,
    pub passes: Vec<PassSummary>,
    #[serde(serialize_with = "serialize_graph")]
    pub matches: MatchGraph,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<LinkageScore>,
}
