use crate::{ExtractError, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Decompress a gzip-compressed `.pkp` file into one buffer.
///
/// Concatenated gzip members are read as a single stream, the same way
/// `gunzip` does.
pub fn read_container<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let wrap = |source| ExtractError::Decompression {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(wrap)?;
    let mut decoder = MultiGzDecoder::new(BufReader::new(file));
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf).map_err(wrap)?;
    Ok(buf)
}
