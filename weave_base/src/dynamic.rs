use crate::{CodecError, Reflect, Schematic, TypeInfo};
use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub const DYNAMIC_TYPE_NAME: &str = "Dynamic";
pub const OPAQUE_MARKER_TYPE_NAME: &str = "OpaqueMarker";

/// Fully generic, type-erased value.
///
/// Members of this type cannot be described by a schema and are left out of it, the owner
/// is responsible for carrying them some other way.
#[derive(Clone, Default)]
pub struct Dynamic(Option<Arc<dyn Any + Send + Sync>>);

impl Dynamic {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Dynamic(Some(Arc::new(value)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().and_then(|v| v.downcast_ref::<T>())
    }
}

impl Debug for Dynamic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(_) => write!(f, "Dynamic(..)"),
            None => write!(f, "Dynamic(empty)"),
        }
    }
}

/// Same value, not merely equal contents.
impl PartialEq for Dynamic {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Sentinel base type: types equal to or derived from it only get their fields registered,
/// properties are considered caller-managed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OpaqueMarker;

impl Reflect for OpaqueMarker {
    fn type_name() -> &'static str {
        OPAQUE_MARKER_TYPE_NAME
    }

    fn type_info() -> TypeInfo {
        TypeInfo::new(OPAQUE_MARKER_TYPE_NAME)
    }
}

impl Schematic for OpaqueMarker {
    fn type_name(&self) -> &'static str {
        OPAQUE_MARKER_TYPE_NAME
    }

    fn encode_member(&self, _name: &str) -> Option<Result<Vec<u8>, CodecError>> {
        None
    }

    fn decode_member(&mut self, _name: &str, _bytes: &[u8]) -> Option<Result<(), CodecError>> {
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
