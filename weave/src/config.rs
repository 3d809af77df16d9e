use crate::consts::{BIN_NAME, BUFFER_SIZE, COMPRESSED_BIN_NAME, COMPRESSION_LEVEL, MANIFEST_FILE};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub manifest_path: PathBuf,
    pub streamer: StreamerConfig,
}

/// File naming and compression settings shared by a serializer/deserializer pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// File name suffix of uncompressed output.
    pub bin_name: String,
    /// File name suffix of compressed output.
    pub compressed_bin_name: String,
    /// gzip level, 0-9.
    pub compression_level: u32,
    pub buffer_size: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            manifest_path: PathBuf::from(MANIFEST_FILE),
            streamer: StreamerConfig::default(),
        }
    }
}

impl Default for StreamerConfig {
    fn default() -> Self {
        StreamerConfig {
            bin_name: BIN_NAME.to_string(),
            compressed_bin_name: COMPRESSED_BIN_NAME.to_string(),
            compression_level: COMPRESSION_LEVEL,
            buffer_size: BUFFER_SIZE,
        }
    }
}

impl ManagerConfig {
    pub fn with_manifest(manifest_path: impl Into<PathBuf>) -> Self {
        ManagerConfig {
            manifest_path: manifest_path.into(),
            ..Default::default()
        }
    }

    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        let config: ManagerConfig =
            ron::from_str(s).map_err(|e| ConfigError::Config(format!("{e}")))?;
        if config.streamer.bin_name == config.streamer.compressed_bin_name {
            return Err(ConfigError::Config(
                "bin_name and compressed_bin_name must differ".to_string(),
            ));
        }
        if config.streamer.compression_level > 9 {
            return Err(ConfigError::Config(format!(
                "compression_level {} is above 9",
                config.streamer.compression_level
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let c = ManagerConfig::from_ron_str(r#"(manifest_path: "types.ron")"#).unwrap();
        assert_eq!(c.manifest_path, PathBuf::from("types.ron"));
        assert_eq!(c.streamer, StreamerConfig::default());
    }

    #[test]
    fn same_file_names_rejected() {
        let r = ManagerConfig::from_ron_str(
            r#"(streamer: (bin_name: "a.bin", compressed_bin_name: "a.bin"))"#,
        );
        assert!(matches!(r, Err(ConfigError::Config(_))));
    }
}
