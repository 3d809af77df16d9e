use crate::dynamic::DYNAMIC_TYPE_NAME;

/// Output of [crate::Reflect::type_info].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: String,
    /// Declared base type, if any. Only becomes a subtype link when the base is registered first.
    pub base: Option<String>,
    pub fields: Vec<MemberInfo>,
    pub properties: Vec<MemberInfo>,
}

impl TypeInfo {
    pub fn new(name: impl Into<String>) -> TypeInfo {
        TypeInfo {
            name: name.into(),
            base: None,
            fields: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> TypeInfo {
        self.base = Some(base.into());
        self
    }

    /// Fields, then properties.
    pub fn members(&self) -> impl Iterator<Item = &MemberInfo> {
        self.fields.iter().chain(self.properties.iter())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberInfo {
    pub name: String,
    pub kind: MemberKind,
    pub ty: MemberType,
}

impl MemberInfo {
    pub fn field(name: impl Into<String>, ty: MemberType) -> MemberInfo {
        MemberInfo {
            name: name.into(),
            kind: MemberKind::Field,
            ty,
        }
    }

    pub fn property(name: impl Into<String>, ty: MemberType) -> MemberInfo {
        MemberInfo {
            name: name.into(),
            kind: MemberKind::Property,
            ty,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    /// Accessor-backed member, enumerated after all fields.
    Property,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberType {
    /// Path of the declared type, as written in the source.
    Named(String),
    /// Declared type could not be determined, with the reason.
    Unresolved(String),
}

impl MemberType {
    pub fn named(path: impl Into<String>) -> MemberType {
        MemberType::Named(path.into())
    }

    /// Whether this is the fully generic [crate::Dynamic] type, whichever path it was named by.
    pub fn is_dynamic(&self) -> bool {
        match self {
            MemberType::Named(path) => path.rsplit("::").next() == Some(DYNAMIC_TYPE_NAME),
            MemberType::Unresolved(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_detected_by_last_segment() {
        assert!(MemberType::named("Dynamic").is_dynamic());
        assert!(MemberType::named("weave_base::Dynamic").is_dynamic());
        assert!(!MemberType::named("DynamicRange").is_dynamic());
        assert!(!MemberType::Unresolved("Dynamic".into()).is_dynamic());
    }

    #[test]
    fn members_are_fields_then_properties() {
        let mut info = TypeInfo::new("Camera");
        info.properties.push(MemberInfo::property("fov", MemberType::named("f32")));
        info.fields.push(MemberInfo::field("near", MemberType::named("f32")));
        let names: Vec<&str> = info.members().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["near", "fov"]);
    }
}
