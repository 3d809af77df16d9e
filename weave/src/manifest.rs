use crate::consts::MANIFEST_NAMESPACE;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// List of built-in type names a manager starts with.
///
/// ```ron
/// BuiltinTypes(
///     namespace: "weave/builtin-types/v1",
///     types: ["Vector3", "Transform"],
/// )
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "BuiltinTypes")]
pub struct Manifest {
    pub namespace: String,
    pub types: Vec<String>,
}

impl Manifest {
    pub fn new<S: Into<String>>(types: impl IntoIterator<Item = S>) -> Self {
        Manifest {
            namespace: MANIFEST_NAMESPACE.to_string(),
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ManifestUnreadable(path.to_path_buf(), e))?;
        Self::parse(&s)
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(s)?)
    }

    /// Entries under the expected namespace. Anything else counts as an empty manifest.
    pub fn type_names(&self) -> Result<&[String], ConfigError> {
        if self.namespace != MANIFEST_NAMESPACE || self.types.is_empty() {
            return Err(ConfigError::ManifestEmpty(MANIFEST_NAMESPACE.to_string()));
        }
        Ok(&self.types)
    }
}
