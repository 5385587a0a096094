pub mod cache;
pub mod digest;

pub use cache::{DuplicateCache, DuplicateCheck};
pub use digest::{digest_file, digest_files, ContentDigest};
