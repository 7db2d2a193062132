//! Content hash computation for integrity reporting.
//!
//! Hashes the entire byte stream in fixed-size chunks so corrupt or
//! truncated files still produce a digest that identifies exactly the
//! bytes that were on disk at check time.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 8192;

/// Compute the SHA-256 of a file's full contents.
///
/// # Returns
///
/// Hash as a lowercase hex string (64 characters).
///
/// # Errors
///
/// Returns an IO error if the file cannot be read.
pub fn compute_content_hash(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_hash_is_stable() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.bin");
        std::fs::write(&file_path, b"Hello, world!").unwrap();

        let hash = compute_content_hash(&file_path).unwrap();
        assert_eq!(hash.len(), 64); // SHA256 hex
        assert_eq!(hash, compute_content_hash(&file_path).unwrap());
    }

    #[test]
    fn test_hash_differs_on_content() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, b"Content A").unwrap();
        std::fs::write(&b, b"Content B").unwrap();

        assert_ne!(
            compute_content_hash(&a).unwrap(),
            compute_content_hash(&b).unwrap()
        );
    }

    #[test]
    fn test_hash_spans_chunk_boundary() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("big.bin");
        std::fs::write(&file_path, vec![0xABu8; CHUNK_SIZE * 2 + 17]).unwrap();

        let hash = compute_content_hash(&file_path).unwrap();
        assert_eq!(hash.len(), 64);
    }
}
