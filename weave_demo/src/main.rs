use anyhow::{anyhow, Result};
use log::info;
use std::sync::{Arc, RwLock};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use weave::builtin::{Quaternion, Transform, Vector3};
use weave::{
    DeserializerExt, ManagerConfig, ManagerContext, Reflect, SerializationManager, SerializerExt,
    TypeCatalog, TypeRegistration,
};

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
struct Waypoint {
    name: String,
    transform: Transform,
}

fn main() -> Result<()> {
    let stdout_printer = tracing_subscriber::fmt::Layer::new();
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(stdout_printer)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ManagerConfig::from_ron_str(&std::fs::read_to_string(path)?)?,
        None => ManagerConfig::with_manifest(concat!(env!("CARGO_MANIFEST_DIR"), "/builtin_types.ron")),
    };

    let mut manager = SerializationManager::new(&config, &TypeCatalog::with_builtins())?;
    let (serializer, deserializer) = manager.default_services(&config.streamer);
    manager.inject_dependencies(Some(serializer), Some(deserializer))?;
    manager.add_type(&TypeRegistration::of::<Waypoint>());

    let context = ManagerContext::new();
    context.install(Arc::new(RwLock::new(manager)));
    let shared = context
        .default_manager()
        .ok_or_else(|| anyhow!("no default manager"))?;
    let manager = shared.read().map_err(|_| anyhow!("manager lock poisoned"))?;
    let serializer = manager.serializer().ok_or_else(|| anyhow!("no serializer bound"))?;
    let deserializer = manager.deserializer().ok_or_else(|| anyhow!("no deserializer bound"))?;

    let waypoint = Waypoint {
        name: "gate".to_string(),
        transform: Transform {
            position: Vector3 { x: 10.0, y: 0.0, z: -4.0 },
            rotation: Quaternion::default(),
            scale: Vector3 { x: 1.0, y: 1.0, z: 1.0 },
        },
    };

    let dir = std::env::temp_dir().join("weave_demo");
    std::fs::create_dir_all(&dir)?;
    for compress in [false, true] {
        let out = serializer.serialize_value_to(&waypoint, &dir, compress);
        if !out.is_ok() {
            return Err(anyhow!("serialize failed: {:?}", out.error));
        }
        info!("{} bytes written to {:?}", out.size, out.path);

        let back = deserializer.deserialize_value_from::<Waypoint>(&dir, None, compress);
        let value = back.value.ok_or_else(|| anyhow!("deserialize failed: {:?}", back.error))?;
        info!("read back {value:?}, equal: {}", *value == waypoint);
    }
    Ok(())
}
