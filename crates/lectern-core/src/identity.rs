//! Deterministic document identity.
//!
//! Computable before any parsing happens, so existence checks can
//! short-circuit the expensive pipeline. Priority: reference-manager id,
//! then URL hash, then content hash.

use sha2::{Digest, Sha256};

use crate::models::SourceInfo;

/// Derive the store key for a document.
pub fn document_id(source: &SourceInfo, data: &[u8]) -> String {
    if !source.zotero_id.is_empty() {
        return format!("ref_{}", source.zotero_id);
    }
    if !source.url.is_empty() {
        return format!("url_{}", short_hash(source.url.as_bytes()));
    }
    format!("data_{}", short_hash(data))
}

/// First 8 bytes of the SHA-256 digest, hex-encoded.
fn short_hash(input: &[u8]) -> String {
    let digest = Sha256::digest(input);
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}
