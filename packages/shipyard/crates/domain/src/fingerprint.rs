use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex SHA-256 of a path's string form.
///
/// Used wherever two projects need to be told apart by location alone
/// (image tags, service name tie-breaks). Paths are expected to be canonical.
pub fn path_digest(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hex::encode(hasher.finalize())
}

/// First `len` hex characters of [`path_digest`].
pub fn short_path_digest(path: &Path, len: usize) -> String {
    let digest = path_digest(path);
    digest[..len.min(digest.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_and_distinct() {
        let a = short_path_digest(Path::new("/work/a/arena"), 8);
        let b = short_path_digest(Path::new("/work/b/arena"), 8);

        assert_eq!(a.len(), 8);
        assert_eq!(a, short_path_digest(Path::new("/work/a/arena"), 8));
        assert_ne!(a, b);
    }
}
