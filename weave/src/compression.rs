//! gzip filter applied to whole records.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, BufReader, Read, Write};

pub fn compress(data: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level));
    encoder.write_all(data)?;
    encoder.finish()
}

pub fn decompress(data: &[u8], buffer_size: usize) -> io::Result<Vec<u8>> {
    let mut decoder = BufReader::with_capacity(buffer_size, GzDecoder::new(data));
    let mut out = Vec::with_capacity(data.len() * 2);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
