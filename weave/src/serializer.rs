use crate::config::StreamerConfig;
use crate::consts::SERIALIZER_NAME;
use crate::error::{StreamError, StreamErrorKind};
use crate::registry::SchemaView;
use crate::service::Service;
use crate::streamer::Streamer;
use log::error;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use weave_base::{Reflect, Schematic};

/// Result of a serialize call. Failures are reported through `error`, never panics.
#[derive(Clone, Debug, PartialEq)]
pub struct SerializationOutput {
    pub type_name: String,
    pub error: StreamErrorKind,
    pub data: Option<Vec<u8>>,
    /// Length of the final buffer, after compression if any.
    pub size: usize,
    pub path: Option<PathBuf>,
    pub compressed: bool,
}

impl SerializationOutput {
    pub fn is_ok(&self) -> bool {
        self.error == StreamErrorKind::None
    }

    fn failed(ty: &str, compressed: bool, e: StreamError) -> Self {
        error!("Serialization of {ty} failed: {e}");
        SerializationOutput {
            type_name: ty.to_string(),
            error: e.kind(),
            data: None,
            size: 0,
            path: None,
            compressed,
        }
    }
}

pub trait Serializer: Service {
    /// Encode `value` as a record of type `ty`, which may be a registered base of the value's type.
    fn serialize(&self, ty: &str, value: &dyn Schematic, compress: bool) -> SerializationOutput;

    /// Same as [Serializer::serialize], also writing the result to a file under `dir`.
    fn serialize_to(&self, ty: &str, value: &dyn Schematic, dir: &Path, compress: bool) -> SerializationOutput;
}

/// Statically typed forms of [Serializer] calls.
pub trait SerializerExt: Serializer {
    fn serialize_value<T: Reflect + Schematic>(&self, value: &T, compress: bool) -> SerializationOutput {
        self.serialize(<T as Reflect>::type_name(), value, compress)
    }

    fn serialize_value_to<T: Reflect + Schematic>(
        &self,
        value: &T,
        dir: &Path,
        compress: bool,
    ) -> SerializationOutput {
        self.serialize_to(<T as Reflect>::type_name(), value, dir, compress)
    }
}

impl<S: Serializer + ?Sized> SerializerExt for S {}

/// Serializer over the schema-driven binary record format.
pub struct BinarySerializer {
    id: Uuid,
    streamer: Streamer,
}

impl BinarySerializer {
    pub fn new(schema: SchemaView, config: StreamerConfig) -> Self {
        BinarySerializer {
            id: Uuid::new_v4(),
            streamer: Streamer::new(schema, config),
        }
    }
}

impl Service for BinarySerializer {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        SERIALIZER_NAME
    }
}

impl Serializer for BinarySerializer {
    fn serialize(&self, ty: &str, value: &dyn Schematic, compress: bool) -> SerializationOutput {
        match self.streamer.encode(ty, value, compress) {
            Ok(data) => SerializationOutput {
                type_name: ty.to_string(),
                error: StreamErrorKind::None,
                size: data.len(),
                data: Some(data),
                path: None,
                compressed: compress,
            },
            Err(e) => SerializationOutput::failed(ty, compress, e),
        }
    }

    fn serialize_to(&self, ty: &str, value: &dyn Schematic, dir: &Path, compress: bool) -> SerializationOutput {
        let written = self
            .streamer
            .file_path(dir, ty, compress)
            .and_then(|_| self.streamer.encode(ty, value, compress))
            .and_then(|data| {
                let path = self.streamer.write(dir, ty, compress, &data)?;
                Ok((path, data))
            });
        match written {
            Ok((path, data)) => SerializationOutput {
                type_name: ty.to_string(),
                error: StreamErrorKind::None,
                size: data.len(),
                data: Some(data),
                path: Some(path),
                compressed: compress,
            },
            Err(e) => SerializationOutput::failed(ty, compress, e),
        }
    }
}
