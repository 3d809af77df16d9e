use crate::deserializer::Deserializer;
use crate::error::BindingError;
use crate::serializer::Serializer;
use std::sync::Arc;
use uuid::Uuid;

/// Identity shared by everything a manager can bind.
pub trait Service: Send + Sync {
    fn id(&self) -> Uuid;

    fn name(&self) -> &str;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ServiceRole {
    Serializer,
    Deserializer,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BindingState {
    Empty,
    SerializerOnly,
    DeserializerOnly,
    Bound,
}

/// A service removed from [Bindings].
#[derive(Clone)]
pub enum BoundService {
    Serializer(Arc<dyn Serializer>),
    Deserializer(Arc<dyn Deserializer>),
}

impl BoundService {
    pub fn role(&self) -> ServiceRole {
        match self {
            BoundService::Serializer(_) => ServiceRole::Serializer,
            BoundService::Deserializer(_) => ServiceRole::Deserializer,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BoundService::Serializer(s) => s.name(),
            BoundService::Deserializer(d) => d.name(),
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            BoundService::Serializer(s) => s.id(),
            BoundService::Deserializer(d) => d.id(),
        }
    }
}

impl std::fmt::Debug for BoundService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({}, {})", self.role(), self.name(), self.id())
    }
}

/// Role -> bound service table. Every change is checked in full before anything is applied.
#[derive(Default, Clone)]
pub struct Bindings {
    serializer: Option<Arc<dyn Serializer>>,
    deserializer: Option<Arc<dyn Deserializer>>,
}

impl Bindings {
    pub fn state(&self) -> BindingState {
        match (&self.serializer, &self.deserializer) {
            (None, None) => BindingState::Empty,
            (Some(_), None) => BindingState::SerializerOnly,
            (None, Some(_)) => BindingState::DeserializerOnly,
            (Some(_), Some(_)) => BindingState::Bound,
        }
    }

    pub fn serializer(&self) -> Option<&Arc<dyn Serializer>> {
        self.serializer.as_ref()
    }

    pub fn deserializer(&self) -> Option<&Arc<dyn Deserializer>> {
        self.deserializer.as_ref()
    }

    pub fn is_bound(&self, role: ServiceRole) -> bool {
        match role {
            ServiceRole::Serializer => self.serializer.is_some(),
            ServiceRole::Deserializer => self.deserializer.is_some(),
        }
    }

    pub fn bind(
        &mut self,
        serializer: Option<Arc<dyn Serializer>>,
        deserializer: Option<Arc<dyn Deserializer>>,
    ) -> Result<(), BindingError> {
        if serializer.is_none() && deserializer.is_none() {
            return Err(BindingError::NoServices);
        }
        if serializer.is_some() && self.serializer.is_some() {
            return Err(BindingError::AlreadyBound(ServiceRole::Serializer));
        }
        if deserializer.is_some() && self.deserializer.is_some() {
            return Err(BindingError::AlreadyBound(ServiceRole::Deserializer));
        }
        if serializer.is_some() {
            self.serializer = serializer;
        }
        if deserializer.is_some() {
            self.deserializer = deserializer;
        }
        Ok(())
    }

    /// Remove the given roles, or everything bound when `roles` is empty.
    pub fn unbind(&mut self, roles: &[ServiceRole]) -> Result<Vec<BoundService>, BindingError> {
        let roles: Vec<ServiceRole> = if roles.is_empty() {
            [ServiceRole::Serializer, ServiceRole::Deserializer]
                .into_iter()
                .filter(|r| self.is_bound(*r))
                .collect()
        } else {
            roles.to_vec()
        };
        if roles.is_empty() {
            return Err(BindingError::NothingBound);
        }
        if let Some(role) = roles.iter().find(|r| !self.is_bound(**r)) {
            return Err(BindingError::NotBound(*role));
        }
        let mut removed = Vec::with_capacity(roles.len());
        for role in roles {
            let service = match role {
                ServiceRole::Serializer => self.serializer.take().map(BoundService::Serializer),
                ServiceRole::Deserializer => {
                    self.deserializer.take().map(BoundService::Deserializer)
                }
            };
            // a role listed twice is already gone by its second mention
            removed.extend(service);
        }
        Ok(removed)
    }
}
