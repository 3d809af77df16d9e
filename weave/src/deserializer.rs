use crate::config::StreamerConfig;
use crate::consts::DESERIALIZER_NAME;
use crate::error::{StreamError, StreamErrorKind};
use crate::registry::SchemaView;
use crate::service::Service;
use crate::streamer::Streamer;
use log::error;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use weave_base::{Reflect, Schematic};

/// Result of a deserialize call. `value` is set only when `error` is `None`.
#[derive(Debug)]
pub struct DeserializationOutput<T: ?Sized = dyn Schematic> {
    pub type_name: String,
    pub error: StreamErrorKind,
    pub value: Option<Box<T>>,
    /// Length of the input as read, before decompression.
    pub size: usize,
    pub path: Option<PathBuf>,
    pub compressed: bool,
}

impl<T: ?Sized> DeserializationOutput<T> {
    pub fn is_ok(&self) -> bool {
        self.error == StreamErrorKind::None
    }

    fn failed(ty: &str, compressed: bool, path: Option<PathBuf>, e: StreamError) -> Self {
        error!("Deserialization of {ty} failed: {e}");
        DeserializationOutput {
            type_name: ty.to_string(),
            error: e.kind(),
            value: None,
            size: 0,
            path,
            compressed,
        }
    }
}

pub trait Deserializer: Service {
    /// Decode a record of type `ty`. The value is of the most derived type found in the record,
    /// filled into `into` when given.
    fn deserialize(
        &self,
        ty: &str,
        bytes: &[u8],
        into: Option<Box<dyn Schematic>>,
        decompress: bool,
    ) -> DeserializationOutput;

    /// Same as [Deserializer::deserialize], reading the file written for `ty` under `dir`.
    fn deserialize_from(
        &self,
        ty: &str,
        dir: &Path,
        into: Option<Box<dyn Schematic>>,
        decompress: bool,
    ) -> DeserializationOutput;
}

/// Statically typed forms of [Deserializer] calls.
///
/// A record holding a subtype of `T` is reported as `TypeMismatch`, use the untyped calls
/// to receive it.
pub trait DeserializerExt: Deserializer {
    fn deserialize_value<T: Reflect + Schematic>(
        &self,
        bytes: &[u8],
        into: Option<T>,
        decompress: bool,
    ) -> DeserializationOutput<T> {
        let into = into.map(|v| Box::new(v) as Box<dyn Schematic>);
        typed(self.deserialize(<T as Reflect>::type_name(), bytes, into, decompress))
    }

    fn deserialize_value_from<T: Reflect + Schematic>(
        &self,
        dir: &Path,
        into: Option<T>,
        decompress: bool,
    ) -> DeserializationOutput<T> {
        let into = into.map(|v| Box::new(v) as Box<dyn Schematic>);
        typed(self.deserialize_from(<T as Reflect>::type_name(), dir, into, decompress))
    }
}

impl<D: Deserializer + ?Sized> DeserializerExt for D {}

fn typed<T: Schematic>(output: DeserializationOutput) -> DeserializationOutput<T> {
    let DeserializationOutput {
        type_name,
        mut error,
        value,
        size,
        path,
        compressed,
    } = output;
    let value = match value.map(|v| v.downcast::<T>()) {
        Some(Ok(v)) => Some(v),
        Some(Err(other)) => {
            error!("Deserialized {} where {type_name} was requested", other.type_name());
            error = StreamErrorKind::TypeMismatch;
            None
        }
        None => None,
    };
    DeserializationOutput {
        type_name,
        error,
        value,
        size,
        path,
        compressed,
    }
}

/// Deserializer over the schema-driven binary record format.
pub struct BinaryDeserializer {
    id: Uuid,
    streamer: Streamer,
}

impl BinaryDeserializer {
    pub fn new(schema: SchemaView, config: StreamerConfig) -> Self {
        BinaryDeserializer {
            id: Uuid::new_v4(),
            streamer: Streamer::new(schema, config),
        }
    }
}

impl Service for BinaryDeserializer {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        DESERIALIZER_NAME
    }
}

impl Deserializer for BinaryDeserializer {
    fn deserialize(
        &self,
        ty: &str,
        bytes: &[u8],
        into: Option<Box<dyn Schematic>>,
        decompress: bool,
    ) -> DeserializationOutput {
        match self.streamer.decode(ty, bytes, into, decompress) {
            Ok(value) => DeserializationOutput {
                type_name: ty.to_string(),
                error: StreamErrorKind::None,
                value: Some(value),
                size: bytes.len(),
                path: None,
                compressed: decompress,
            },
            Err(e) => DeserializationOutput::failed(ty, decompress, None, e),
        }
    }

    fn deserialize_from(
        &self,
        ty: &str,
        dir: &Path,
        into: Option<Box<dyn Schematic>>,
        decompress: bool,
    ) -> DeserializationOutput {
        let (path, bytes) = match self.streamer.read(dir, ty, decompress) {
            Ok(read) => read,
            Err(e) => return DeserializationOutput::failed(ty, decompress, None, e),
        };
        match self.streamer.decode(ty, &bytes, into, decompress) {
            Ok(value) => DeserializationOutput {
                type_name: ty.to_string(),
                error: StreamErrorKind::None,
                value: Some(value),
                size: bytes.len(),
                path: Some(path),
                compressed: decompress,
            },
            Err(e) => DeserializationOutput::failed(ty, decompress, Some(path), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{Transform, Vector3};
    use crate::catalog::TypeRegistration;
    use crate::registry::SchemaRegistry;
    use crate::serializer::{BinarySerializer, SerializerExt};

    fn pair() -> (SchemaRegistry, BinarySerializer, BinaryDeserializer) {
        let registry = SchemaRegistry::new(&[
            TypeRegistration::of::<Vector3>(),
            TypeRegistration::of::<Transform>(),
        ]);
        let s = BinarySerializer::new(registry.view(), StreamerConfig::default());
        let d = BinaryDeserializer::new(registry.view(), StreamerConfig::default());
        (registry, s, d)
    }

    #[test]
    fn typed_roundtrip_into_existing() {
        let (_r, s, d) = pair();
        let v = Vector3 { x: 4.0, y: 5.0, z: 6.0 };
        let out = s.serialize_value(&v, false);
        let back = d.deserialize_value::<Vector3>(out.data.as_ref().unwrap(), Some(Vector3::default()), false);
        assert!(back.is_ok());
        assert_eq!(back.size, out.size);
        assert_eq!(*back.value.unwrap(), v);
    }

    #[test]
    fn typed_request_of_other_type() {
        let (_r, s, d) = pair();
        let out = s.serialize_value(&Vector3::default(), false);
        let back = d.deserialize_value::<Transform>(out.data.as_ref().unwrap(), None, false);
        assert!(!back.is_ok());
        assert!(back.value.is_none());
    }

    #[test]
    fn missing_file_is_access() {
        let dir = tempfile::tempdir().unwrap();
        let (_r, _s, d) = pair();
        let back = d.deserialize_value_from::<Vector3>(dir.path(), None, false);
        assert_eq!(back.error, StreamErrorKind::Access);
    }

    #[test]
    fn garbage_is_codec() {
        let (_r, _s, d) = pair();
        let back = d.deserialize("Vector3", &[3, 1, 2], None, true);
        assert_eq!(back.error, StreamErrorKind::Codec);
    }
}
