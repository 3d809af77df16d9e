use crate::catalog::{TypeCatalog, TypeRegistration};
use crate::config::{ManagerConfig, StreamerConfig};
use crate::deserializer::{BinaryDeserializer, Deserializer};
use crate::error::{BindingError, ChangeModelError, ConfigError};
use crate::manifest::Manifest;
use crate::registry::{SchemaRegistry, SchemaView};
use crate::schema::Schema;
use crate::serializer::{BinarySerializer, Serializer};
use crate::service::{BindingState, Bindings, BoundService, ServiceRole};
use log::{error, info};
use std::sync::Arc;

/// Owns the schema registry and the serializer/deserializer bound to it.
pub struct SerializationManager {
    registry: SchemaRegistry,
    bindings: Bindings,
    builtin: Vec<TypeRegistration>,
}

impl SerializationManager {
    /// Load the manifest named by `config` and build the initial schema from it.
    pub fn new(config: &ManagerConfig, catalog: &TypeCatalog) -> Result<Self, ConfigError> {
        let manifest = Manifest::load(&config.manifest_path)?;
        Self::from_manifest(manifest, catalog)
    }

    pub fn from_manifest(manifest: Manifest, catalog: &TypeCatalog) -> Result<Self, ConfigError> {
        let names = manifest.type_names()?;
        let builtin = catalog.resolve(names);
        if builtin.is_empty() {
            return Err(ConfigError::NoTypesResolved(names.to_vec()));
        }
        info!("Serialization manager starting with {} built-in types", builtin.len());
        Ok(SerializationManager {
            registry: SchemaRegistry::new(&builtin),
            bindings: Bindings::default(),
            builtin,
        })
    }

    /// Bind one or both roles. Nothing is bound if any of the given roles is taken.
    pub fn inject_dependencies(
        &mut self,
        serializer: Option<Arc<dyn Serializer>>,
        deserializer: Option<Arc<dyn Deserializer>>,
    ) -> Result<(), BindingError> {
        let names = [
            serializer.as_ref().map(|s| s.name().to_string()),
            deserializer.as_ref().map(|d| d.name().to_string()),
        ];
        self.bindings.bind(serializer, deserializer)?;
        for name in names.into_iter().flatten() {
            info!("{name} was bound to the serialization manager");
        }
        Ok(())
    }

    /// Unbind the given roles, or everything bound when `roles` is empty.
    pub fn extract_dependencies(&mut self, roles: &[ServiceRole]) -> Result<Vec<BoundService>, BindingError> {
        let removed = self.bindings.unbind(roles)?;
        for service in &removed {
            info!("{} was unbound from the serialization manager", service.name());
        }
        Ok(removed)
    }

    pub fn add_type(&self, registration: &TypeRegistration) {
        self.registry.add_type(registration);
    }

    /// Bind the given services, then replace the schema.
    ///
    /// Binding failure leaves the schema untouched. When there is no schema at all, one is
    /// built from the built-in types before the replacement is attempted.
    pub fn change_model(
        &mut self,
        schema: Option<Schema>,
        serializer: Option<Arc<dyn Serializer>>,
        deserializer: Option<Arc<dyn Deserializer>>,
    ) -> ChangeModelError {
        if let Err(e) = self.inject_dependencies(serializer, deserializer) {
            error!("Schema change refused, services could not be bound: {e}");
            return ChangeModelError::InvalidModelDependencies;
        }
        if self.registry.current().is_none() {
            self.registry.reset(&self.builtin);
        }
        self.registry.change_model(schema)
    }

    /// Rebuild the schema from the built-in types, dropping everything added since.
    pub fn reset_factory(&self) {
        self.registry.reset(&self.builtin);
    }

    pub fn schema(&self) -> Option<Arc<Schema>> {
        self.registry.current()
    }

    pub fn schema_snapshot(&self) -> Option<Schema> {
        self.registry.snapshot()
    }

    pub fn schema_view(&self) -> SchemaView {
        self.registry.view()
    }

    pub fn serializer(&self) -> Option<&Arc<dyn Serializer>> {
        self.bindings.serializer()
    }

    pub fn deserializer(&self) -> Option<&Arc<dyn Deserializer>> {
        self.bindings.deserializer()
    }

    pub fn binding_state(&self) -> BindingState {
        self.bindings.state()
    }

    pub fn builtin_types(&self) -> &[TypeRegistration] {
        &self.builtin
    }

    /// Binary serializer/deserializer pair reading this manager's schema, not yet bound.
    pub fn default_services(&self, config: &StreamerConfig) -> (Arc<dyn Serializer>, Arc<dyn Deserializer>) {
        (
            Arc::new(BinarySerializer::new(self.schema_view(), config.clone())),
            Arc::new(BinaryDeserializer::new(self.schema_view(), config.clone())),
        )
    }
}
