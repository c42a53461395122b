use md5::{Digest, Md5};
use std::io;
use std::path::Path;

/// Content digest of a file, rendered as lowercase hex.
pub trait ContentHasher {
    fn hash_file(&self, path: &Path) -> io::Result<String>;
}

/// MD5 digests, the form package indexes use for icon file names.
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Hasher;

impl ContentHasher for Md5Hasher {
    fn hash_file(&self, path: &Path) -> io::Result<String> {
        let content = std::fs::read(path)?;
        Ok(format!("{:x}", Md5::digest(&content)))
    }
}
