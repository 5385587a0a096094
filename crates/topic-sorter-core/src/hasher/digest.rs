use dashmap::DashMap;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Files are streamed through the hasher in chunks of this size.
pub const CHUNK_SIZE: usize = 4096;

pub type ContentDigest = blake3::Hash;

/// BLAKE3 digest of a file's full content, read in fixed-size chunks.
pub fn digest_file(file: &Path) -> io::Result<ContentDigest> {
    let mut f = File::open(file)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let bytes_read = match f.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize())
}

/// Digest many files in parallel. Every input path gets an entry, failures included.
pub fn digest_files<P>(files: &[P]) -> DashMap<PathBuf, io::Result<ContentDigest>>
where
    P: AsRef<Path> + Sync,
{
    let digests: DashMap<PathBuf, io::Result<ContentDigest>> = DashMap::new();
    files.par_iter().for_each(|file| {
        let file = file.as_ref();
        digests.insert(file.to_path_buf(), digest_file(file));
    });
    digests
}
