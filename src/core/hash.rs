use sha2::{Digest, Sha256};

use crate::core::types::AnalysisKind;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Cache key for one analysis: kind-qualified digest of the raw,
/// pre-normalization input.
pub fn fingerprint(kind: AnalysisKind, raw: &str) -> String {
    format!("{}:{}", kind.as_str(), sha256_hex(raw.as_bytes()))
}
