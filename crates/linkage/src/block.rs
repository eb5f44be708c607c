use std::collections::BTreeMap;

use crate::error::LinkageError;
use crate::model::{BlockKey, Blocks, Dataset, Record};

/// Partition a dataset into blocks sharing identical values on `block_columns`.
///
/// Records keep their relative input order inside each block. A record with a
/// null block value lands in the block keyed by that null; it is never dropped,
/// so the blocks always cover the whole dataset.
pub fn block_data<'a>(
    dataset: &'a Dataset,
    block_columns: &[&str],
) -> Result<Blocks<'a>, LinkageError> {
    if block_columns.is_empty() {
        return Err(LinkageError::InvalidArgument(
            "at least one block column is required".into(),
        ));
    }
    let cols = block_columns
        .iter()
        .map(|name| dataset.column_index(name))
        .collect::<Result<Vec<_>, _>>()?;
    block_data_by_index(dataset.rows(), &cols)
}

/// Index-based blocking over raw rows.
pub fn block_data_by_index<'a>(
    rows: &'a [Record],
    cols: &[usize],
) -> Result<Blocks<'a>, LinkageError> {
    if cols.is_empty() {
        return Err(LinkageError::InvalidArgument(
            "at least one block column is required".into(),
        ));
    }

    let mut blocks: Blocks<'a> = BTreeMap::new();
    let mut null_keyed = 0usize;

    for (i, row) in rows.iter().enumerate() {
        let mut key = Vec::with_capacity(cols.len());
        for &col in cols {
            let value = row.get(col).ok_or_else(|| {
                LinkageError::InvalidArgument(format!(
                    "row {i}: block column {col} out of range for {} field(s)",
                    row.len()
                ))
            })?;
            key.push(value.clone());
        }
        if key.iter().any(|v| v.is_null()) {
            null_keyed += 1;
        }
        blocks.entry(BlockKey(key)).or_default().push(row);
    }

    if null_keyed > 0 {
        log::debug!("{null_keyed} record(s) blocked under a null key value");
    }
    log::debug!("blocked {} record(s) into {} block(s)", rows.len(), blocks.len());

    Ok(blocks)
}
