//! Record id helpers.

use sha2::{Digest, Sha256};
use uuid::Uuid;

const RECORD_ID_PREFIX: &str = "id";

/// Generates a new random record id (`id-` followed by a v4 UUID).
pub fn new_id() -> String {
    format!("{RECORD_ID_PREFIX}-{}", Uuid::new_v4())
}

/// Derives a fixed-length record id from `value` (`id-` followed by its hex SHA-256).
///
/// The same value always maps to the same id.
pub fn to_id(value: impl AsRef<[u8]>) -> String {
    let digest = Sha256::digest(value.as_ref());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();

    format!("{RECORD_ID_PREFIX}-{hex}")
}
