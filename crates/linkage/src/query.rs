use crate::error::LinkageError;
use crate::model::Value;

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn check_identifier(kind: &str, name: &str) -> Result<(), LinkageError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(LinkageError::InvalidArgument(format!(
            "{kind} name '{name}' is not a plain SQL identifier"
        )))
    }
}

fn condition(column: &str, value: &Value) -> String {
    match value {
        Value::Null => format!("{column} IS NULL"),
        Value::Text(s) => format!("{column} = '{}'", s.replace('\'', "''")),
        other => format!("{column} = {other}"),
    }
}

/// Build `SELECT * FROM <table> WHERE <col> = <val> AND ...` for one block key.
///
/// Numbers and booleans are inlined bare, text is single-quoted. An empty
/// `block` is rejected rather than degrading into a full-table scan, and so is
/// a NaN or infinite float.
pub fn build_block_query(table: &str, block: &[(String, Value)]) -> Result<String, LinkageError> {
    if block.is_empty() {
        return Err(LinkageError::InvalidArgument(
            "block data cannot be empty".into(),
        ));
    }
    check_identifier("table", table)?;
    for (column, value) in block {
        check_identifier("column", column)?;
        if let Value::Float(f) = value {
            if !f.0.is_finite() {
                return Err(LinkageError::InvalidArgument(format!(
                    "column '{column}': {} has no SQL literal",
                    f.0
                )));
            }
        }
    }

    let conditions: Vec<String> = block
        .iter()
        .map(|(column, value)| condition(column, value))
        .collect();
    Ok(format!(
        "SELECT * FROM {table} WHERE {}",
        conditions.join(" AND ")
    ))
}

/// Build `SELECT * FROM <table>` for loading a whole table.
pub fn build_table_query(table: &str) -> Result<String, LinkageError> {
    check_identifier("table", table)?;
    Ok(format!("SELECT * FROM {table}"))
}
