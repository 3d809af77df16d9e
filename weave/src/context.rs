use crate::manager::SerializationManager;
use log::{debug, warn};
use std::sync::{Arc, OnceLock, RwLock};

pub type SharedManager = Arc<RwLock<SerializationManager>>;

/// Holder of the default manager, created once at the composition root and passed down.
#[derive(Default)]
pub struct ManagerContext {
    default: OnceLock<SharedManager>,
}

impl ManagerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `manager` the default. The first installed manager stays, later calls return false.
    pub fn install(&self, manager: SharedManager) -> bool {
        match self.default.set(manager) {
            Ok(()) => {
                debug!("Default serialization manager installed");
                true
            }
            Err(_) => {
                warn!("A default serialization manager is already installed, keeping it");
                false
            }
        }
    }

    pub fn default_manager(&self) -> Option<SharedManager> {
        self.default.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeCatalog;
    use crate::manifest::Manifest;

    fn shared(types: &[&str]) -> SharedManager {
        let m = SerializationManager::from_manifest(Manifest::new(types.iter().copied()), &TypeCatalog::with_builtins())
            .unwrap();
        Arc::new(RwLock::new(m))
    }

    #[test]
    fn first_writer_wins() {
        let ctx = ManagerContext::new();
        assert!(ctx.default_manager().is_none());

        let first = shared(&["Vector2"]);
        assert!(ctx.install(first.clone()));
        assert!(!ctx.install(shared(&["Vector3"])));
        assert!(Arc::ptr_eq(&ctx.default_manager().unwrap(), &first));
    }
}
