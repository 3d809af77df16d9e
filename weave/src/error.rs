use crate::service::ServiceRole;
use std::path::PathBuf;
use thiserror::Error;
use weave_base::CodecError;

/// Fatal errors while constructing a [crate::SerializationManager].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("manifest {} can not be read: {}", .0.display(), .1)]
    ManifestUnreadable(PathBuf, std::io::Error),

    #[error("manifest is malformed: {}", .0)]
    ManifestMalformed(String),

    #[error("manifest lists no types under namespace {}", .0)]
    ManifestEmpty(String),

    #[error("none of the manifest types are known: {:?}", .0)]
    NoTypesResolved(Vec<String>),

    #[error("config: {}", .0)]
    Config(String),
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(value: ron::error::SpannedError) -> Self {
        ConfigError::ManifestMalformed(format!("{value}"))
    }
}

/// Outcome of a schema change.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChangeModelError {
    None,
    NullModel,
    InvalidModelDependencies,
}

/// Misuse of service binding.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BindingError {
    #[error("no services given")]
    NoServices,

    #[error("{:?} is already bound", .0)]
    AlreadyBound(ServiceRole),

    #[error("{:?} is not bound", .0)]
    NotBound(ServiceRole),

    #[error("nothing is bound")]
    NothingBound,
}

/// Errors of the schema-driven wire codec.
#[derive(Error, Debug)]
pub enum WireError {
    #[error("unexpected end of input")]
    Truncated,

    #[error("varint is longer than 5 bytes")]
    VarintOverflow,

    #[error("type {} is not part of the schema", .0)]
    UnknownType(String),

    #[error("{} can not be handled as {}", .found, .expected)]
    TypeMismatch { expected: String, found: String },

    #[error("unknown subtype tag {} under {}", .tag, .ty)]
    UnknownSubtype { ty: String, tag: u32 },

    #[error("{} has no accessor for member {}", .ty, .member)]
    MissingMember { ty: String, member: String },

    #[error("{}.{}: {}", .ty, .member, .source)]
    Member {
        ty: String,
        member: String,
        source: CodecError,
    },

    #[error("subtype nesting deeper than {}", .0)]
    TooDeep(usize),
}

/// What callers of serialize/deserialize get back instead of an error value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StreamErrorKind {
    None,
    MissingPath,
    TypeMismatch,
    Access,
    Codec,
    NoSchema,
}

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("no path given")]
    MissingPath,

    #[error("no active schema")]
    NoSchema,

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("compression: {}", .0)]
    Compression(std::io::Error),

    #[error("{}: {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
}

impl StreamError {
    pub fn kind(&self) -> StreamErrorKind {
        match self {
            StreamError::MissingPath => StreamErrorKind::MissingPath,
            StreamError::NoSchema => StreamErrorKind::NoSchema,
            StreamError::Wire(WireError::UnknownType(_) | WireError::TypeMismatch { .. }) => {
                StreamErrorKind::TypeMismatch
            }
            StreamError::Wire(_) | StreamError::Compression(_) => StreamErrorKind::Codec,
            StreamError::Io(..) => StreamErrorKind::Access,
        }
    }
}
