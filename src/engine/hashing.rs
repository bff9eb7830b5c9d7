//! File hashing: xxh64 over a file's head or its whole content.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use xxhash_rust::xxh64::Xxh64;

use crate::utils::config::HashingConsts;

/// Hash the first [`HashingConsts::PREFIX_LEN`] bytes of `path` (all of
/// them for shorter files). Cheap reject for same-size non-duplicates.
pub fn prefix_hash(path: &Path) -> io::Result<u64> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; HashingConsts::PREFIX_LEN];
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    let mut hasher = Xxh64::new(0);
    hasher.update(&buf[..filled]);
    Ok(hasher.digest())
}

/// Hash the whole content of `path`, streaming fixed chunks so peak memory
/// per worker stays one chunk.
pub fn full_hash(path: &Path) -> io::Result<u64> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(HashingConsts::READ_CHUNK_SIZE, file);
    let mut buf = vec![0u8; HashingConsts::READ_CHUNK_SIZE];
    let mut hasher = Xxh64::new(0);
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.digest())
}
