//! Record streaming on top of the active schema: wire codec, gzip and files.

use crate::compression;
use crate::config::StreamerConfig;
use crate::error::StreamError;
use crate::registry::SchemaView;
use crate::wire;
use log::{debug, trace};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use weave_base::Schematic;

#[derive(Clone)]
pub struct Streamer {
    schema: SchemaView,
    config: StreamerConfig,
}

impl Streamer {
    pub fn new(schema: SchemaView, config: StreamerConfig) -> Self {
        Streamer { schema, config }
    }

    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    /// Encode `value` as a length-prefixed record of type `ty`, optionally gzipped.
    pub fn encode(&self, ty: &str, value: &dyn Schematic, compress: bool) -> Result<Vec<u8>, StreamError> {
        let schema = self.schema.load().ok_or(StreamError::NoSchema)?;
        let record = wire::encode_record(&schema, ty, value)?;
        if compress {
            let compressed = compression::compress(&record, self.config.compression_level)
                .map_err(StreamError::Compression)?;
            trace!("{ty}: {} bytes gzipped to {}", record.len(), compressed.len());
            Ok(compressed)
        } else {
            Ok(record)
        }
    }

    pub fn decode(
        &self,
        ty: &str,
        bytes: &[u8],
        into: Option<Box<dyn Schematic>>,
        decompress: bool,
    ) -> Result<Box<dyn Schematic>, StreamError> {
        let schema = self.schema.load().ok_or(StreamError::NoSchema)?;
        if decompress {
            let record = compression::decompress(bytes, self.config.buffer_size)
                .map_err(StreamError::Compression)?;
            Ok(wire::decode_record(&schema, ty, &record, into)?)
        } else {
            Ok(wire::decode_record(&schema, ty, bytes, into)?)
        }
    }

    /// `{Type}_{bin_name}`, or `{Type}_{compressed_bin_name}` for gzipped output.
    pub fn file_name(&self, ty: &str, compressed: bool) -> String {
        let suffix = if compressed {
            &self.config.compressed_bin_name
        } else {
            &self.config.bin_name
        };
        format!("{ty}_{suffix}")
    }

    pub fn file_path(&self, dir: &Path, ty: &str, compressed: bool) -> Result<PathBuf, StreamError> {
        if dir.as_os_str().is_empty() {
            return Err(StreamError::MissingPath);
        }
        Ok(dir.join(self.file_name(ty, compressed)))
    }

    /// Write `data` to its file under `dir`. The file is replaced atomically, a failed write
    /// leaves any previous content in place.
    pub fn write(&self, dir: &Path, ty: &str, compressed: bool, data: &[u8]) -> Result<PathBuf, StreamError> {
        let path = self.file_path(dir, ty, compressed)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StreamError::Io(dir.to_path_buf(), e))?;
        tmp.write_all(data)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StreamError::Io(tmp.path().to_path_buf(), e))?;
        tmp.persist(&path)
            .map_err(|e| StreamError::Io(path.clone(), e.error))?;
        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(path)
    }

    pub fn read(&self, dir: &Path, ty: &str, compressed: bool) -> Result<(PathBuf, Vec<u8>), StreamError> {
        let path = self.file_path(dir, ty, compressed)?;
        let data = fs::read(&path).map_err(|e| StreamError::Io(path.clone(), e))?;
        trace!("Read {} bytes from {}", data.len(), path.display());
        Ok((path, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::Vector2;
    use crate::catalog::TypeRegistration;
    use crate::error::StreamErrorKind;
    use crate::registry::SchemaRegistry;

    fn streamer() -> (SchemaRegistry, Streamer) {
        let registry = SchemaRegistry::new(&[TypeRegistration::of::<Vector2>()]);
        let streamer = Streamer::new(registry.view(), StreamerConfig::default());
        (registry, streamer)
    }

    #[test]
    fn file_names() {
        let (_r, s) = streamer();
        assert_eq!(s.file_name("Vector2", false), "Vector2_weave.bin");
        assert_eq!(s.file_name("Vector2", true), "Vector2_weave.bin.gz");
    }

    #[test]
    fn compressed_roundtrip() {
        let (_r, s) = streamer();
        let v = Vector2 { x: 3.0, y: -1.0 };
        let bytes = s.encode("Vector2", &v, true).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        let back = s.decode("Vector2", &bytes, None, true).unwrap();
        assert_eq!(back.downcast_ref::<Vector2>(), Some(&v));
    }

    #[test]
    fn empty_dir_is_missing_path() {
        let (_r, s) = streamer();
        let r = s.write(Path::new(""), "Vector2", false, &[1, 2, 3]);
        assert_eq!(r.unwrap_err().kind(), StreamErrorKind::MissingPath);
    }

    #[test]
    fn write_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let (_r, s) = streamer();
        let path = s.write(dir.path(), "Vector2", false, &[1, 2, 3]).unwrap();
        s.write(dir.path(), "Vector2", false, &[4]).unwrap();
        assert_eq!(fs::read(&path).unwrap(), [4]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn no_schema() {
        let registry = SchemaRegistry::empty();
        let s = Streamer::new(registry.view(), StreamerConfig::default());
        let r = s.encode("Vector2", &Vector2::default(), false);
        assert_eq!(r.unwrap_err().kind(), StreamErrorKind::NoSchema);
    }
}
