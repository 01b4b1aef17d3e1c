use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::VideoError;

const CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 of the file contents as lowercase hex. Independent of the file name.
pub fn fingerprint_file(path: &Path) -> Result<String, VideoError> {
    let io_err = |source| VideoError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(to_hex(&hasher.finalize()))
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{:02x}", b);
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_known_value() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.mp4");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            fingerprint_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_stable_across_rename() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.mp4");
        let b = tmp.path().join("renamed.mp4");
        std::fs::write(&a, vec![7u8; CHUNK_SIZE * 2 + 13]).unwrap();
        let before = fingerprint_file(&a).unwrap();
        std::fs::rename(&a, &b).unwrap();
        assert_eq!(fingerprint_file(&b).unwrap(), before);
    }

    #[test]
    fn test_fingerprint_missing_file_is_io_error() {
        let result = fingerprint_file(Path::new("/nonexistent/video.mp4"));
        assert!(matches!(result, Err(VideoError::Io { .. })));
    }
}
