pub mod builtin;
pub mod catalog;
pub mod compression;
pub mod config;
pub mod consts;
pub mod context;
pub mod deserializer;
pub mod error;
pub mod manager;
pub mod manifest;
pub mod registry;
pub mod schema;
pub mod serializer;
pub mod service;
pub mod streamer;
pub mod wire;

pub use catalog::{TypeCatalog, TypeRegistration};
pub use config::{ManagerConfig, StreamerConfig};
pub use context::{ManagerContext, SharedManager};
pub use deserializer::{BinaryDeserializer, DeserializationOutput, Deserializer, DeserializerExt};
pub use error::{BindingError, ChangeModelError, ConfigError, StreamError, StreamErrorKind, WireError};
pub use manager::SerializationManager;
pub use manifest::Manifest;
pub use registry::{SchemaRegistry, SchemaView};
pub use schema::{Schema, TypeDescriptor};
pub use serializer::{BinarySerializer, SerializationOutput, Serializer, SerializerExt};
pub use service::{BindingState, BoundService, Service, ServiceRole};
pub use streamer::Streamer;

pub use weave_base::{Dynamic, OpaqueMarker, Reflect, Schematic, TypeInfo};
pub use weave_derive::Reflect;
