//! Content checksums for registry entries.
//!
//! Checksums detect drift between a live source and its repository copy.
//! MD5 is used as a fast content fingerprint, not for security.

use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const CHUNK_SIZE: usize = 4096;

/// Compute the content checksum for `path`.
///
/// Files are hashed by streaming fixed-size chunks. Directories are hashed
/// over a sorted traversal of relative file paths interleaved with each
/// file's content, so the result is stable across runs and sensitive to
/// both structure and content. A missing path yields the empty string,
/// which is a sentinel rather than an error.
#[must_use]
pub fn checksum(path: &Path) -> String {
    if !path.exists() {
        return String::new();
    }
    let result = if path.is_dir() {
        checksum_dir(path)
    } else {
        checksum_file(path)
    };
    match result {
        Ok(digest) => digest,
        Err(e) => {
            tracing::warn!("failed to checksum {}: {e}", path.display());
            String::new()
        }
    }
}

fn checksum_file(path: &Path) -> std::io::Result<String> {
    let mut hasher = Md5::new();
    digest_file(&mut hasher, path)?;
    Ok(hex_digest(hasher))
}

fn checksum_dir(path: &Path) -> std::io::Result<String> {
    let mut hasher = Md5::new();
    for file in sorted_files(path)? {
        let rel = file.strip_prefix(path).unwrap_or(&file);
        // Forward slashes keep the digest identical across platforms.
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        hasher.update(rel_str.as_bytes());
        digest_file(&mut hasher, &file)?;
    }
    Ok(hex_digest(hasher))
}

/// All regular files below `root`, sorted by full path.
fn sorted_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn digest_file(hasher: &mut Md5, path: &Path) -> std::io::Result<()> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(())
}

fn hex_digest(hasher: Md5) -> String {
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(checksum(&dir.path().join("absent")), "");
    }

    #[test]
    fn file_checksum_is_md5_of_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".bashrc");
        std::fs::write(&file, b"alias ll='ls -la'").unwrap();
        // md5("alias ll='ls -la'")
        assert_eq!(checksum(&file), "12049dbcb70830d04702b8d442e5a6b7");
    }

    #[test]
    fn file_checksum_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"one").unwrap();
        let first = checksum(&file);
        std::fs::write(&file, b"two").unwrap();
        assert_ne!(checksum(&file), first);
    }

    #[test]
    fn large_file_streams_across_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big");
        std::fs::write(&file, vec![0xabu8; CHUNK_SIZE * 3 + 17]).unwrap();
        let digest = checksum(&file);
        assert_eq!(digest.len(), 32);
    }

    #[test]
    fn directory_checksum_is_structure_sensitive() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::write(a.path().join("one.txt"), b"same").unwrap();
        std::fs::write(b.path().join("two.txt"), b"same").unwrap();
        assert_ne!(checksum(a.path()), checksum(b.path()));
    }

    #[test]
    fn identical_directories_produce_identical_checksums() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        for root in [a.path(), b.path()] {
            std::fs::create_dir(root.join("sub")).unwrap();
            std::fs::write(root.join("top.conf"), b"top").unwrap();
            std::fs::write(root.join("sub/inner.conf"), b"inner").unwrap();
        }
        assert_eq!(checksum(a.path()), checksum(b.path()));
    }

    #[test]
    fn directory_checksum_sensitive_to_content() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::write(a.path().join("f"), b"x").unwrap();
        std::fs::write(b.path().join("f"), b"y").unwrap();
        assert_ne!(checksum(a.path()), checksum(b.path()));
    }
}
