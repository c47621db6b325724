// [libs/persistence/src/files.rs]
//! Content hashing for the `files` row's identity (§3, §4.G): SHA-256 over
//! the raw ingest bytes, lowercase hex. The insert and dedup-lookup
//! themselves run inside `Persister::record_file`'s single transaction
//! (`lib.rs`'s `insert_file_in_tx`/`find_by_hash_in_tx`) rather than through
//! a standalone repository, since the duplicate check and the insert that
//! follows must observe the same uncommitted view.

use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
