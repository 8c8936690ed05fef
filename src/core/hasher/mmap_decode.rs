//! File access for the decode path.
//!
//! Only a short header is read to sniff the format. The full contents are
//! loaded after that, and only for formats decoded from memory: large files
//! are memory-mapped, small ones read into a buffer.

use crate::error::HashError;
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes read for format sniffing. Covers an `ftyp` box with eleven
/// compatible brands and every magic number `image` checks.
pub const HEADER_LEN: u64 = 64;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

fn read_error(path: &Path, e: std::io::Error) -> HashError {
    HashError::DecodeError {
        path: path.to_path_buf(),
        reason: format!("cannot read image data: {}", e),
    }
}

/// Read at most [`HEADER_LEN`] bytes from the start of the file
pub fn read_header(path: &Path) -> Result<Vec<u8>, HashError> {
    let file = File::open(path).map_err(|e| read_error(path, e))?;
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    file.take(HEADER_LEN)
        .read_to_end(&mut header)
        .map_err(|e| read_error(path, e))?;
    Ok(header)
}

/// Read the whole file, memory-mapping it when it is large.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, HashError> {
    let mut file = File::open(path).map_err(|e| read_error(path, e))?;
    let len = file.metadata().map_err(|e| read_error(path, e))?.len();

    if len >= MMAP_THRESHOLD {
        // SAFETY: the map is only read and does not outlive this decode.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| read_error(path, e))?;
        Ok(FileBytes::Mmap(mmap))
    } else {
        let mut bytes = Vec::with_capacity(len as usize);
        file.read_to_end(&mut bytes).map_err(|e| read_error(path, e))?;
        Ok(FileBytes::Vec(bytes))
    }
}

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    Vec(Vec<u8>),
    Mmap(Mmap),
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn header_is_capped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mov");
        fs::write(&path, vec![0xAB; 4096]).unwrap();

        let header = read_header(&path).unwrap();
        assert_eq!(header.len(), HEADER_LEN as usize);
    }

    #[test]
    fn short_file_header_is_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.bin");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(read_header(&path).unwrap(), b"abc");
    }

    #[test]
    fn small_files_are_buffered_and_large_files_mapped() {
        let dir = TempDir::new().unwrap();
        let small = dir.path().join("small.bin");
        let large = dir.path().join("large.bin");
        fs::write(&small, vec![1u8; 100]).unwrap();
        fs::write(&large, vec![2u8; MMAP_THRESHOLD as usize + 10]).unwrap();

        let small_bytes = read_file_bytes(&small).unwrap();
        assert!(matches!(small_bytes, FileBytes::Vec(_)));
        assert_eq!(small_bytes.len(), 100);

        let large_bytes = read_file_bytes(&large).unwrap();
        assert!(matches!(large_bytes, FileBytes::Mmap(_)));
        assert_eq!(large_bytes.len(), MMAP_THRESHOLD as usize + 10);
        assert!(large_bytes.iter().all(|&b| b == 2));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        assert!(matches!(
            read_header(Path::new("/nonexistent/a.jpg")),
            Err(HashError::DecodeError { .. })
        ));
    }
}
