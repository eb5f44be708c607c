use sha2::{Digest, Sha256};

use crate::model::Value;

/// Salted SHA-256 of an identity string, as 64 lowercase hex chars.
///
/// The salt is appended to the identity before hashing.
pub fn generate_hash_str(identity: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Join the text forms of `columns` into an identity string; nulls contribute "".
pub fn linking_identifier(record: &[Value], columns: &[usize], separator: &str) -> String {
    columns
        .iter()
        .map(|&c| record[c].to_string())
        .collect::<Vec<_>>()
        .join(separator)
}
