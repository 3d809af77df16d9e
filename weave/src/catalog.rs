use crate::builtin::{Quaternion, Transform, Vector2, Vector3};
use crate::schema::Constructor;
use indexmap::IndexMap;
use log::warn;
use weave_base::{OpaqueMarker, Reflect, Schematic, TypeInfo};

/// A type the host knows how to describe and instantiate.
#[derive(Copy, Clone, Debug)]
pub struct TypeRegistration {
    name: &'static str,
    reflect: fn() -> TypeInfo,
    construct: Constructor,
}

fn construct_default<T: Schematic + Default>() -> Box<dyn Schematic> {
    Box::new(T::default())
}

impl TypeRegistration {
    pub fn of<T: Reflect + Schematic + Default>() -> Self {
        TypeRegistration {
            name: <T as Reflect>::type_name(),
            reflect: T::type_info,
            construct: construct_default::<T>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Enumerate members. Called once per registration pass.
    pub fn type_info(&self) -> TypeInfo {
        (self.reflect)()
    }

    pub(crate) fn constructor(&self) -> Constructor {
        self.construct
    }
}

/// Types known to the host, looked up by name when resolving a manifest.
#[derive(Clone, Debug, Default)]
pub struct TypeCatalog {
    entries: IndexMap<&'static str, TypeRegistration>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        TypeCatalog::default()
    }

    /// Catalog of the types this crate ships with.
    pub fn with_builtins() -> Self {
        let mut catalog = TypeCatalog::new();
        catalog
            .register::<OpaqueMarker>()
            .register::<Vector2>()
            .register::<Vector3>()
            .register::<Quaternion>()
            .register::<Transform>();
        catalog
    }

    pub fn register<T: Reflect + Schematic + Default>(&mut self) -> &mut Self {
        self.insert(TypeRegistration::of::<T>());
        self
    }

    pub fn insert(&mut self, registration: TypeRegistration) {
        if self
            .entries
            .insert(registration.name, registration)
            .is_some()
        {
            warn!("Type {} registered in catalog twice", registration.name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeRegistration> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registrations for the given names, in the order given. Unknown names are logged and left out.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Vec<TypeRegistration> {
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            match self.entries.get(name) {
                Some(registration) => {
                    if resolved
                        .iter()
                        .any(|r: &TypeRegistration| r.name == registration.name)
                    {
                        warn!("Type {name} is listed twice, ignoring the repetition");
                        continue;
                    }
                    resolved.push(*registration);
                }
                None => warn!("Type {name} is not known to this runtime"),
            }
        }
        resolved
    }
}
