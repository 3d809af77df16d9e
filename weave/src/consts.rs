/// Index given to the first member of every type.
pub const FIRST_MEMBER_INDEX: u32 = 1;
/// First subtype index under a parent, kept clear of ordinary member indices.
pub const SUBTYPE_INDEX_BASE: u32 = 556;
/// Maximum subtype nesting followed while decoding.
pub const MAX_DEPTH: usize = 100;

pub const MANIFEST_NAMESPACE: &str = "weave/builtin-types/v1";
pub const MANIFEST_FILE: &str = "builtin_types.ron";

pub const BIN_NAME: &str = "weave.bin";
pub const COMPRESSED_BIN_NAME: &str = "weave.bin.gz";
pub const COMPRESSION_LEVEL: u32 = 6;
pub const BUFFER_SIZE: usize = 8 * 1024;

pub const SERIALIZER_NAME: &str = "BinarySerializer";
pub const DESERIALIZER_NAME: &str = "BinaryDeserializer";
