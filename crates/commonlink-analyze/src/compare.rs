//! Streaming byte-for-byte file comparison.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Buffer size used for each side of a comparison.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Result of comparing two files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    /// Whether the contents are identical.
    pub equal: bool,
    /// Bytes read from each file before a verdict was reached.
    pub bytes_compared: u64,
}

/// Compare the contents of two regular files.
///
/// Files of different length are reported unequal without reading either.
/// Otherwise both are read in lockstep in `chunk_size` pieces and the
/// comparison stops at the first differing chunk.
pub fn compare_files(a: &Path, b: &Path, chunk_size: usize) -> io::Result<Comparison> {
    let mut file_a = File::open(a)?;
    let mut file_b = File::open(b)?;
    let meta_a = file_a.metadata()?;
    let meta_b = file_b.metadata()?;

    for (path, meta) in [(a, &meta_a), (b, &meta_b)] {
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
    }

    if meta_a.len() != meta_b.len() {
        return Ok(Comparison {
            equal: false,
            bytes_compared: 0,
        });
    }

    let chunk_size = chunk_size.max(1);
    let mut buf_a = vec![0u8; chunk_size];
    let mut buf_b = vec![0u8; chunk_size];
    let mut bytes_compared = 0u64;

    loop {
        let n_a = fill(&mut file_a, &mut buf_a)?;
        let n_b = fill(&mut file_b, &mut buf_b)?;
        bytes_compared += n_a as u64;

        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(Comparison {
                equal: false,
                bytes_compared,
            });
        }
        if n_a == 0 {
            return Ok(Comparison {
                equal: true,
                bytes_compared,
            });
        }
    }
}

/// Read until the buffer is full or EOF.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
