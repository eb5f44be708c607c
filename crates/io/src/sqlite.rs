// SQLite record source

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use reclink_linkage::query::{build_block_query, build_table_query};
use reclink_linkage::{Dataset, LinkageError, Record, Value};

fn source_err(e: rusqlite::Error) -> LinkageError {
    LinkageError::Source(e.to_string())
}

/// Open an existing database read-only. A missing file is an error, never a new database.
fn open(path: &Path) -> Result<Connection, LinkageError> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(source_err)
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Int(n),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Text(b.iter().map(|byte| format!("{byte:02x}")).collect()),
    }
}

fn query_rows(conn: &Connection, sql: &str) -> Result<(Vec<String>, Vec<Record>), LinkageError> {
    let mut stmt = conn.prepare(sql).map_err(source_err)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(to_value))
                .collect::<rusqlite::Result<Record>>()
        })
        .map_err(source_err)?
        .collect::<rusqlite::Result<Vec<Record>>>()
        .map_err(source_err)?;

    Ok((columns, rows))
}

/// Fetch the records of one block straight from a table.
///
/// `block` maps column names to the block key's values. An empty mapping is
/// rejected before the database is touched.
pub fn block_data_from_db(
    path: &Path,
    table: &str,
    block: &[(String, Value)],
) -> Result<Vec<Record>, LinkageError> {
    let sql = build_block_query(table, block)?;
    let conn = open(path)?;
    let (_, rows) = query_rows(&conn, &sql)?;
    log::debug!("{sql}: {} record(s)", rows.len());
    Ok(rows)
}

/// Read a whole table into a dataset for in-memory blocking.
pub fn load_table(path: &Path, table: &str, id_column: &str) -> Result<Dataset, LinkageError> {
    let sql = build_table_query(table)?;
    let conn = open(path)?;
    let (columns, rows) = query_rows(&conn, &sql)?;
    log::debug!("loaded {} record(s) from table {table}", rows.len());
    Dataset::new(columns, rows, id_column)
}
