use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tempfile::NamedTempFile;

use reclink_io::{csv, sqlite};
use reclink_linkage::block::block_data;
use reclink_linkage::compare::{Comparator, FeatureSet};
use reclink_linkage::model::{BlockKey, PassMatches};
use reclink_linkage::{
    perform_linkage_pass, run, run_and_score, LinkageConfig, LinkageError, MatchGraph, PassSpec,
    Value,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn ids(values: &[i64]) -> BTreeSet<Value> {
    values.iter().map(|v| Value::Int(*v)).collect()
}

fn zip_key(zip: i64) -> BlockKey {
    BlockKey(vec![Value::Int(zip)])
}

fn name_prefix_pass() -> PassSpec {
    let features = FeatureSet::new()
        .with(1, Comparator::FourChar)
        .with(2, Comparator::FourChar);
    PassSpec::new(&["ZIP"], features)
}

/// Copy the patients fixture into a fresh SQLite table.
fn patients_db() -> NamedTempFile {
    let data = csv::load_dataset(&fixtures_dir().join("patients.csv"), "ID").unwrap();
    let temp_file = NamedTempFile::with_suffix(".db").unwrap();
    let conn = Connection::open(temp_file.path()).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE patients (
            BIRTHDATE TEXT, FIRST TEXT, LAST TEXT, GENDER TEXT, ADDRESS TEXT,
            CITY TEXT, STATE TEXT, ZIP INTEGER, ID INTEGER PRIMARY KEY
        );
        "#,
    )
    .unwrap();

    let mut insert = conn
        .prepare("INSERT INTO patients VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)")
        .unwrap();
    for row in data.rows() {
        let params: Vec<Box<dyn rusqlite::ToSql>> = row
            .iter()
            .map(|v| -> Box<dyn rusqlite::ToSql> {
                match v {
                    Value::Null => Box::new(rusqlite::types::Null),
                    Value::Int(n) => Box::new(*n),
                    other => Box::new(other.to_string()),
                }
            })
            .collect();
        insert
            .execute(rusqlite::params_from_iter(params.iter()))
            .unwrap();
    }
    temp_file
}

// -------------------------------------------------------------------------
// CSV
// -------------------------------------------------------------------------

#[test]
fn csv_fixture_loads_typed_fields() {
    let data = csv::load_dataset(&fixtures_dir().join("patients.csv"), "ID").unwrap();
    assert_eq!(data.len(), 12);
    assert_eq!(data.width(), 9);
    assert_eq!(data.id_column(), 8);

    let first = &data.rows()[0];
    assert_eq!(first[0], Value::from("11-7-2153"));
    assert_eq!(first[3], Value::Null);
    assert_eq!(first[7], Value::Int(90909));
    assert_eq!(data.record_id(first), &Value::Int(1));
}

#[test]
fn csv_pass_blocks_on_integer_zip() {
    let data = csv::load_dataset(&fixtures_dir().join("patients.csv"), "ID").unwrap();
    let matches = perform_linkage_pass(&data, &name_prefix_pass()).unwrap();

    let pair = |a: i64, b: i64| (Value::Int(a), Value::Int(b));
    let expected = PassMatches::Pairs(BTreeMap::from([
        (zip_key(12345), vec![]),
        (zip_key(15935), vec![pair(23, 24), pair(23, 31), pair(24, 31)]),
        (zip_key(23456), vec![]),
        (zip_key(64873), vec![]),
        (zip_key(90909), vec![pair(1, 12)]),
    ]));
    assert_eq!(matches, expected);
}

#[test]
fn csv_config_run() {
    let data = csv::load_dataset(&fixtures_dir().join("patients.csv"), "ID").unwrap();
    let toml = std::fs::read_to_string(fixtures_dir().join("mpi.linkage.toml")).unwrap();
    let config = LinkageConfig::from_toml(&toml).unwrap();

    let truth = MatchGraph::from([
        (Value::Int(1), ids(&[5, 11, 12])),
        (Value::Int(5), ids(&[11, 12])),
        (Value::Int(11), ids(&[12])),
        (Value::Int(23), ids(&[24, 31, 32])),
        (Value::Int(24), ids(&[31, 32])),
        (Value::Int(31), ids(&[32])),
    ]);
    let result = run_and_score(&config, &data, &truth).unwrap();

    assert_eq!(
        result.matches,
        MatchGraph::from([
            (Value::Int(1), ids(&[12])),
            (Value::Int(23), ids(&[24, 31, 32])),
            (Value::Int(24), ids(&[31])),
            (Value::Int(31), ids(&[32])),
        ])
    );
    assert_eq!(result.summary.edges, 6);
    assert_eq!(result.summary.entities, 8);
    assert!(result.passes[1].cluster_mode);

    let score = result.score.unwrap();
    assert_eq!(score.true_positives, 6);
    assert_eq!(score.false_positives, 0);
    assert_eq!(score.false_negatives, 6);
    assert_eq!(score.ppv, 1.0);
    assert_eq!(score.sensitivity, 0.5);
}

// -------------------------------------------------------------------------
// SQLite
// -------------------------------------------------------------------------

#[test]
fn db_block_fetches_matching_rows() {
    let db = patients_db();
    let rows = sqlite::block_data_from_db(
        db.path(),
        "patients",
        &[("ZIP".to_string(), Value::Int(15935))],
    )
    .unwrap();
    let mut got: Vec<Value> = rows.iter().map(|r| r[8].clone()).collect();
    got.sort();
    assert_eq!(got, vec![Value::Int(23), Value::Int(24), Value::Int(31), Value::Int(32)]);

    let rows = sqlite::block_data_from_db(
        db.path(),
        "patients",
        &[
            ("ZIP".to_string(), Value::Int(90909)),
            ("LAST".to_string(), Value::from("Shepard")),
        ],
    )
    .unwrap();
    assert_eq!(rows.len(), 3);
}

#[test]
fn db_block_null_key() {
    let db = patients_db();
    let rows = sqlite::block_data_from_db(
        db.path(),
        "patients",
        &[("LAST".to_string(), Value::Null)],
    )
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], Value::from("Philip"));
}

#[test]
fn db_block_rejects_empty_before_connecting() {
    let err = sqlite::block_data_from_db(Path::new("/nonexistent/dir/db.sqlite"), "patients", &[])
        .unwrap_err();
    assert_eq!(
        err,
        LinkageError::InvalidArgument("block data cannot be empty".into())
    );
}

#[test]
fn db_table_matches_csv_blocks() {
    let db = patients_db();
    let from_db = sqlite::load_table(db.path(), "patients", "ID").unwrap();
    let from_csv = csv::load_dataset(&fixtures_dir().join("patients.csv"), "ID").unwrap();
    assert_eq!(from_db.columns(), from_csv.columns());

    let db_blocks = block_data(&from_db, &["ZIP"]).unwrap();
    let csv_blocks = block_data(&from_csv, &["ZIP"]).unwrap();
    assert_eq!(
        db_blocks.keys().collect::<Vec<_>>(),
        csv_blocks.keys().collect::<Vec<_>>()
    );

    let toml = std::fs::read_to_string(fixtures_dir().join("mpi.linkage.toml")).unwrap();
    let config = LinkageConfig::from_toml(&toml).unwrap();
    assert_eq!(
        run(&config, &from_db).unwrap().matches,
        run(&config, &from_csv).unwrap().matches
    );
}
