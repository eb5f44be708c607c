// CSV/TSV record loading

use std::io::Read;
use std::path::Path;

use reclink_linkage::{Dataset, LinkageError, Record, Value};

pub fn load_dataset(path: &Path, id_column: &str) -> Result<Dataset, LinkageError> {
    let content = read_file_as_utf8(path)?;
    load_dataset_from_str(&content, id_column)
}

pub fn load_dataset_with_delimiter(
    path: &Path,
    id_column: &str,
    delimiter: u8,
) -> Result<Dataset, LinkageError> {
    let content = read_file_as_utf8(path)?;
    parse_dataset(&content, id_column, delimiter)
}

/// Parse CSV text whose first line is the header row.
pub fn load_dataset_from_str(content: &str, id_column: &str) -> Result<Dataset, LinkageError> {
    parse_dataset(content, id_column, sniff_delimiter(content))
}

/// Rows read when guessing the delimiter: the header plus a handful of records.
const SNIFF_ROWS: usize = 8;

/// Guess the field delimiter from the header and the first few records.
///
/// A candidate must split the header into more than one column. Among those,
/// the one whose sampled records most often have the header's width wins, and
/// wider headers break ties. Falls back to comma.
fn sniff_delimiter(content: &str) -> u8 {
    [b'\t', b';', b',', b'|']
        .into_iter()
        .filter_map(|delim| {
            let mut reader = csv::ReaderBuilder::new()
                .delimiter(delim)
                .has_headers(false)
                .flexible(true)
                .from_reader(content.as_bytes());
            let widths: Vec<usize> = reader
                .records()
                .take(SNIFF_ROWS)
                .map_while(Result::ok)
                .map(|r| r.len())
                .collect();

            let (&header, rest) = widths.split_first()?;
            (header > 1).then(|| {
                let agreeing = rest.iter().filter(|&&w| w == header).count();
                (agreeing, header, delim)
            })
        })
        .max_by_key(|&(agreeing, header, _)| (agreeing, header))
        .map_or(b',', |(_, _, delim)| delim)
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, LinkageError> {
    let mut file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn parse_dataset(content: &str, id_column: &str, delimiter: u8) -> Result<Dataset, LinkageError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| LinkageError::Source(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows: Vec<Record> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| LinkageError::Source(e.to_string()))?;
        rows.push(record.iter().map(parse_field).collect());
    }

    log::debug!("loaded {} record(s) with {} column(s)", rows.len(), columns.len());
    // Ragged rows surface as SchemaMismatch with their data-row index.
    Dataset::new(columns, rows, id_column)
}

/// Type a raw CSV field.
///
/// Integers with a leading zero stay text so identifiers like ZIP "02134"
/// keep their digits.
pub fn parse_field(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let leading_zero = int_part.len() > 1 && int_part.starts_with('0');
    if !digits(int_part) || leading_zero {
        return Value::Text(raw.to_string());
    }

    match frac_part {
        None => raw
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(raw.to_string())),
        Some(f) if digits(f) => raw
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::Text(raw.to_string())),
        Some(_) => Value::Text(raw.to_string()),
    }
}
