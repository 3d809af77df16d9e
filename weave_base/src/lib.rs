pub mod codec;
pub mod dynamic;
pub mod type_info;

pub use codec::CodecError;
pub use dynamic::{Dynamic, OpaqueMarker};
pub use type_info::*;

use dyn_clone::DynClone;
use std::any::Any;

/// Compile-time member enumeration.
///
/// Implemented by `#[derive(Reflect)]`, or by hand for types the derive cannot handle.
/// The returned [TypeInfo] lists fields first, then properties, each in declaration order.
pub trait Reflect {
    fn type_name() -> &'static str;

    fn type_info() -> TypeInfo;
}

/// Per-instance access to the members listed by [Reflect], by name.
///
/// Object safe, so that values of any registered type can flow through the same
/// encode/decode pipeline as `&dyn Schematic` or `Box<dyn Schematic>`.
pub trait Schematic: Any + DynClone + Send + Sync {
    /// Name of the concrete type, same as `Reflect::type_name`.
    fn type_name(&self) -> &'static str;

    /// Encode a member value. `None` when this type has no member with such a name.
    fn encode_member(&self, name: &str) -> Option<Result<Vec<u8>, CodecError>>;

    /// Decode bytes produced by [Schematic::encode_member] into a member.
    /// `None` when this type has no member with such a name.
    fn decode_member(&mut self, name: &str, bytes: &[u8]) -> Option<Result<(), CodecError>>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

dyn_clone::clone_trait_object!(Schematic);

impl std::fmt::Debug for dyn Schematic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dyn Schematic({})", self.type_name())
    }
}

impl dyn Schematic {
    pub fn is<T: Schematic>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Schematic>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Recover the concrete type, giving the box back on mismatch.
    pub fn downcast<T: Schematic>(self: Box<Self>) -> Result<Box<T>, Box<dyn Schematic>> {
        if self.is::<T>() {
            match self.into_any().downcast::<T>() {
                Ok(value) => Ok(value),
                Err(_) => unreachable!("type checked above"),
            }
        } else {
            Err(self)
        }
    }
}
