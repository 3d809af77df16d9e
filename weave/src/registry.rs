use crate::catalog::TypeRegistration;
use crate::consts::FIRST_MEMBER_INDEX;
use crate::error::ChangeModelError;
use crate::schema::{MemberDescriptor, Schema, SkipReason, SkippedMember, TypeDescriptor};
use arc_swap::ArcSwapOption;
use log::{debug, trace, warn};
use std::sync::Arc;
use weave_base::dynamic::OPAQUE_MARKER_TYPE_NAME;
use weave_base::{MemberInfo, MemberType};

/// Owner of the active schema.
///
/// The schema lives behind an atomically swappable pointer: every change publishes a new
/// `Arc<Schema>`, so readers holding a snapshot through a [SchemaView] never see it mutate.
pub struct SchemaRegistry {
    active: Arc<ArcSwapOption<Schema>>,
}

/// Read-only handle on the schema of a [SchemaRegistry], handed to serializers.
#[derive(Clone)]
pub struct SchemaView {
    active: Arc<ArcSwapOption<Schema>>,
}

impl SchemaView {
    /// Snapshot of the active schema, stable for as long as it is held.
    pub fn load(&self) -> Option<Arc<Schema>> {
        self.active.load_full()
    }
}

impl SchemaRegistry {
    /// Registry with an active schema built from `types`.
    pub fn new(types: &[TypeRegistration]) -> Self {
        let registry = SchemaRegistry::empty();
        registry.reset(types);
        registry
    }

    /// Registry without a schema, `add_type` is a no-op until one is set.
    pub fn empty() -> Self {
        SchemaRegistry {
            active: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Register every type in order and compile the result.
    pub fn build(types: &[TypeRegistration]) -> Schema {
        let mut schema = Schema::default();
        for registration in types {
            register_type(&mut schema, registration, true);
        }
        schema.compile();
        schema
    }

    pub fn current(&self) -> Option<Arc<Schema>> {
        self.active.load_full()
    }

    /// Deep copy of the active schema, to be modified and handed back through `change_model`.
    pub fn snapshot(&self) -> Option<Schema> {
        self.active.load_full().map(|schema| (*schema).clone())
    }

    pub fn view(&self) -> SchemaView {
        SchemaView {
            active: self.active.clone(),
        }
    }

    /// Register one more type against the active schema.
    pub fn add_type(&self, registration: &TypeRegistration) {
        let Some(current) = self.active.load_full() else {
            warn!(
                "Can not add type {} because there is no serialization schema",
                registration.name()
            );
            return;
        };
        let mut schema = (*current).clone();
        register_type(&mut schema, registration, false);
        schema.compile();
        self.active.store(Some(Arc::new(schema)));
    }

    /// Replace the active schema. `None` leaves the current one in place.
    pub fn change_model(&self, schema: Option<Schema>) -> ChangeModelError {
        let Some(mut schema) = schema else {
            warn!("Can not change to an absent serialization schema, keeping the current one");
            return ChangeModelError::NullModel;
        };
        schema.compile();
        self.active.store(Some(Arc::new(schema)));
        debug!("Serialization schema was replaced");
        ChangeModelError::None
    }

    /// Discard the active schema and publish one built from `types`.
    pub fn reset(&self, types: &[TypeRegistration]) {
        let schema = Self::build(types);
        debug!("Serialization schema built with {} types", schema.len());
        self.active.store(Some(Arc::new(schema)));
    }
}

/// Registration of a single type. Member failures are logged and recorded, never fatal.
fn register_type(schema: &mut Schema, registration: &TypeRegistration, ignore_unknown_subtypes: bool) {
    let info = registration.type_info();
    if schema.contains(&info.name) {
        warn!("Type {} is already registered, keeping its layout", info.name);
        return;
    }
    let mut descriptor = TypeDescriptor::new(info.name.clone(), registration.constructor());
    descriptor.set_ignore_unknown_subtypes(ignore_unknown_subtypes);
    debug!("Type {} was configured for [de]serialization", info.name);

    let mut index = FIRST_MEMBER_INDEX;
    for field in &info.fields {
        add_member(&mut descriptor, field, &mut index);
    }

    if let Some(base) = &info.base {
        match schema.get_mut(base) {
            Some(parent) => {
                let subtype_index = parent.link_subtype(info.name.clone());
                descriptor.set_base(base.clone());
                trace!("\tSubtype [{subtype_index}]{} of {base}", info.name);
            }
            None => trace!("\tBase {base} of {} is not registered, no subtype link", info.name),
        }
    }

    let opaque = is_opaque(schema, &info.name, info.base.as_deref());
    descriptor.set_opaque(opaque);
    if opaque {
        for property in &info.properties {
            trace!("\tProperty {} of opaque {} left out", property.name, info.name);
        }
    } else {
        for property in &info.properties {
            add_member(&mut descriptor, property, &mut index);
        }
    }

    schema.insert(descriptor);
}

fn add_member(descriptor: &mut TypeDescriptor, member: &MemberInfo, index: &mut u32) {
    let reason = match &member.ty {
        MemberType::Named(_) if member.ty.is_dynamic() => {
            warn!(
                "{} {:?} is declared Dynamic which can not be described, derive it from OpaqueMarker instead; member left out",
                descriptor.name(),
                member.name
            );
            SkipReason::Dynamic
        }
        MemberType::Named(ty) => {
            descriptor.push_member(MemberDescriptor {
                name: member.name.clone(),
                kind: member.kind,
                index: *index,
            });
            trace!("\t{:?} [{index}]{}[{ty}] of {}", member.kind, member.name, descriptor.name());
            *index += 1;
            return;
        }
        MemberType::Unresolved(reason) => {
            warn!(
                "Can not determine type of {:?} {} of {}: {reason}",
                member.kind,
                member.name,
                descriptor.name()
            );
            SkipReason::Unresolved(reason.clone())
        }
    };
    descriptor.push_skipped(SkippedMember {
        name: member.name.clone(),
        kind: member.kind,
        reason,
    });
}

/// Whether a type named `name` with `declared_base` belongs to the opaque subtree.
/// An unregistered base other than the marker itself counts as not opaque.
fn is_opaque(schema: &Schema, name: &str, declared_base: Option<&str>) -> bool {
    if name == OPAQUE_MARKER_TYPE_NAME {
        return true;
    }
    match declared_base {
        Some(OPAQUE_MARKER_TYPE_NAME) => true,
        Some(base) => schema.get(base).map_or(false, |parent| parent.is_opaque()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{Transform, Vector3};
    use crate::consts::SUBTYPE_INDEX_BASE;
    use serde::{Deserialize, Serialize};
    use weave_base::{Dynamic, MemberKind, OpaqueMarker};
    use weave_derive::Reflect;

    #[derive(Reflect, Clone, Default, Serialize, Deserialize)]
    struct Shape {
        name: String,
    }

    #[derive(Reflect, Clone, Default)]
    #[weave(base = Shape)]
    struct Circle {
        radius: f32,
    }

    #[derive(Reflect, Clone, Default)]
    #[weave(base = Shape)]
    struct Square {
        side: f32,
    }

    #[derive(Reflect, Clone, Default)]
    #[weave(base = Square)]
    struct Tile {
        material: u16,
    }

    #[derive(Reflect, Clone, Default)]
    struct Camera {
        near: f32,
        #[weave(property)]
        fov: f32,
        far: f32,
        payload: Dynamic,
    }

    #[derive(Reflect, Clone, Default)]
    #[weave(base = OpaqueMarker)]
    struct Script {
        source: String,
        #[weave(property)]
        line: u32,
    }

    #[derive(Reflect, Clone, Default)]
    #[weave(base = Script)]
    struct Behaviour {
        enabled: bool,
        #[weave(property)]
        priority: u8,
    }

    #[derive(Reflect, Clone, Default)]
    struct Tagged(u8, &'static str, u16);

    fn indices(schema: &Schema, ty: &str) -> Vec<(String, u32)> {
        schema
            .get(ty)
            .unwrap()
            .members()
            .iter()
            .map(|m| (m.name.clone(), m.index))
            .collect()
    }

    #[test]
    fn manifest_scenario() {
        let schema = SchemaRegistry::build(&[
            TypeRegistration::of::<Vector3>(),
            TypeRegistration::of::<Transform>(),
        ]);
        assert_eq!(schema.type_names(), ["Vector3", "Transform"]);
        assert_eq!(schema.get("Vector3").unwrap().members().len(), 3);
        assert_eq!(schema.get("Transform").unwrap().members().len(), 3);
        assert!(schema.types().all(|d| d.subtypes().is_empty()));
        assert!(schema.is_compiled());
    }

    #[test]
    fn fields_then_properties_contiguous() {
        let schema = SchemaRegistry::build(&[TypeRegistration::of::<Camera>()]);
        assert_eq!(
            indices(&schema, "Camera"),
            [
                ("near".to_string(), 1),
                ("far".to_string(), 2),
                ("fov".to_string(), 3)
            ]
        );
        let camera = schema.get("Camera").unwrap();
        assert_eq!(camera.member("fov").unwrap().kind, MemberKind::Property);
    }

    #[test]
    fn dynamic_member_skipped_with_warning() {
        let schema = SchemaRegistry::build(&[TypeRegistration::of::<Camera>()]);
        let camera = schema.get("Camera").unwrap();
        assert!(camera.member("payload").is_none());
        assert_eq!(
            camera.skipped(),
            [SkippedMember {
                name: "payload".to_string(),
                kind: MemberKind::Field,
                reason: SkipReason::Dynamic,
            }]
        );
    }

    #[test]
    fn subtype_indices() {
        let schema = SchemaRegistry::build(&[
            TypeRegistration::of::<Shape>(),
            TypeRegistration::of::<Circle>(),
            TypeRegistration::of::<Square>(),
            TypeRegistration::of::<Tile>(),
        ]);
        let shape = schema.get("Shape").unwrap();
        let links: Vec<(&str, u32)> = shape
            .subtypes()
            .iter()
            .map(|l| (l.child.as_str(), l.index))
            .collect();
        assert_eq!(
            links,
            [("Circle", SUBTYPE_INDEX_BASE), ("Square", SUBTYPE_INDEX_BASE + 1)]
        );
        assert_eq!(schema.get("Square").unwrap().subtypes()[0].index, SUBTYPE_INDEX_BASE);
        assert_eq!(schema.get("Tile").unwrap().base(), Some("Square"));
        assert_eq!(
            schema.subtype_path("Shape", "Tile"),
            Some(vec![SUBTYPE_INDEX_BASE + 1, SUBTYPE_INDEX_BASE])
        );
        assert_eq!(schema.subtype_path("Shape", "Shape"), Some(vec![]));
        assert_eq!(schema.subtype_path("Circle", "Tile"), None);
    }

    #[test]
    fn derived_before_base_has_no_link() {
        let schema = SchemaRegistry::build(&[
            TypeRegistration::of::<Circle>(),
            TypeRegistration::of::<Shape>(),
        ]);
        assert!(schema.get("Shape").unwrap().subtypes().is_empty());
        assert_eq!(schema.get("Circle").unwrap().base(), None);
    }

    #[test]
    fn opaque_subtree_has_no_properties() {
        let schema = SchemaRegistry::build(&[
            TypeRegistration::of::<OpaqueMarker>(),
            TypeRegistration::of::<Script>(),
            TypeRegistration::of::<Behaviour>(),
        ]);
        assert_eq!(indices(&schema, "Script"), [("source".to_string(), 1)]);
        assert_eq!(indices(&schema, "Behaviour"), [("enabled".to_string(), 1)]);
        assert_eq!(schema.get("OpaqueMarker").unwrap().subtypes().len(), 1);
    }

    #[test]
    fn opaque_subtree_without_marker_registered() {
        let schema = SchemaRegistry::build(&[
            TypeRegistration::of::<Script>(),
            TypeRegistration::of::<Behaviour>(),
        ]);
        assert!(!schema.contains("OpaqueMarker"));
        assert_eq!(schema.get("Script").unwrap().base(), None);
        assert_eq!(indices(&schema, "Script"), [("source".to_string(), 1)]);
        assert_eq!(indices(&schema, "Behaviour"), [("enabled".to_string(), 1)]);
        assert!(schema.get("Behaviour").unwrap().is_opaque());
    }

    #[test]
    fn unresolved_member_skipped_indices_contiguous() {
        let schema = SchemaRegistry::build(&[TypeRegistration::of::<Tagged>()]);
        let tagged = schema.get("Tagged").unwrap();
        assert_eq!(tagged.skipped().len(), 1);
        assert_eq!(tagged.skipped()[0].name, "1");
        assert!(matches!(tagged.skipped()[0].reason, SkipReason::Unresolved(_)));
        assert_eq!(
            indices(&schema, "Tagged"),
            [("0".to_string(), 1), ("2".to_string(), 2)]
        );
    }

    #[test]
    fn add_type_without_schema_is_noop() {
        let registry = SchemaRegistry::empty();
        registry.add_type(&TypeRegistration::of::<Vector3>());
        assert!(registry.current().is_none());
    }

    #[test]
    fn add_type_publishes_new_snapshot() {
        let registry = SchemaRegistry::new(&[TypeRegistration::of::<Shape>()]);
        let before = registry.current().unwrap();
        registry.add_type(&TypeRegistration::of::<Circle>());
        let after = registry.current().unwrap();
        assert!(!before.contains("Circle"));
        assert!(before.get("Shape").unwrap().subtypes().is_empty());
        let circle = after.get("Circle").unwrap();
        assert!(!circle.ignore_unknown_subtypes());
        assert_eq!(after.parent_of("Circle"), Some(("Shape", SUBTYPE_INDEX_BASE)));
    }

    #[test]
    fn add_type_twice_keeps_layout() {
        let registry = SchemaRegistry::new(&[TypeRegistration::of::<Camera>()]);
        registry.add_type(&TypeRegistration::of::<Camera>());
        let schema = registry.current().unwrap();
        assert_eq!(schema.len(), 1);
        assert!(schema.get("Camera").unwrap().ignore_unknown_subtypes());
    }

    #[test]
    fn change_model_null_keeps_schema() {
        let registry = SchemaRegistry::new(&[TypeRegistration::of::<Vector3>()]);
        let before = registry.current().unwrap();
        assert_eq!(registry.change_model(None), ChangeModelError::NullModel);
        assert!(Arc::ptr_eq(&before, &registry.current().unwrap()));
    }

    #[test]
    fn change_model_swaps() {
        let registry = SchemaRegistry::new(&[TypeRegistration::of::<Vector3>()]);
        let view = registry.view();
        let held = view.load().unwrap();
        let next = SchemaRegistry::build(&[TypeRegistration::of::<Camera>()]);
        assert_eq!(registry.change_model(Some(next)), ChangeModelError::None);
        assert_eq!(view.load().unwrap().type_names(), ["Camera"]);
        assert_eq!(held.type_names(), ["Vector3"]);
    }

    #[test]
    fn reset_is_idempotent() {
        let types = [
            TypeRegistration::of::<Shape>(),
            TypeRegistration::of::<Circle>(),
            TypeRegistration::of::<Camera>(),
        ];
        let registry = SchemaRegistry::new(&types);
        registry.add_type(&TypeRegistration::of::<Square>());
        registry.reset(&types);
        let first = registry.current().unwrap();
        registry.reset(&types);
        let second = registry.current().unwrap();
        assert_eq!(first.type_names(), second.type_names());
        for ty in first.type_names() {
            assert_eq!(indices(&first, ty), indices(&second, ty));
            assert_eq!(
                first.get(ty).unwrap().subtypes(),
                second.get(ty).unwrap().subtypes()
            );
        }
        assert!(!second.contains("Square"));
    }
}
