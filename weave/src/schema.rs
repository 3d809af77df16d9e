use crate::consts::{MAX_DEPTH, SUBTYPE_INDEX_BASE};
use indexmap::IndexMap;
use log::{debug, error};
use std::collections::HashMap;
use weave_base::{MemberKind, Schematic};

pub type Constructor = fn() -> Box<dyn Schematic>;

/// Derived description of every registered type. Built by [crate::SchemaRegistry].
#[derive(Clone, Debug, Default)]
pub struct Schema {
    types: IndexMap<String, TypeDescriptor>,
    /// child -> (parent, subtype index), filled by compile
    parents: HashMap<String, (String, u32)>,
    compiled: bool,
}

#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    name: String,
    members: Vec<MemberDescriptor>,
    base: Option<String>,
    subtypes: Vec<SubtypeLink>,
    ignore_unknown_subtypes: bool,
    opaque: bool,
    skipped: Vec<SkippedMember>,
    construct: Constructor,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub name: String,
    pub kind: MemberKind,
    pub index: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtypeLink {
    pub parent: String,
    pub child: String,
    pub index: u32,
}

/// Member left out of a type, kept as the record of the registration warning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedMember {
    pub name: String,
    pub kind: MemberKind,
    pub reason: SkipReason,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Declared as the fully generic `Dynamic` type.
    Dynamic,
    /// Member type could not be determined.
    Unresolved(String),
}

impl Schema {
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Descriptors in registration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.types.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Registered parent of a type and the subtype index it was linked under.
    pub fn parent_of(&self, child: &str) -> Option<(&str, u32)> {
        self.parents
            .get(child)
            .map(|(parent, index)| (parent.as_str(), *index))
    }

    /// Subtype indices leading from `root` down to `leaf`, outermost first.
    /// Empty when they are the same type, `None` when `leaf` is not below `root`.
    pub fn subtype_path(&self, root: &str, leaf: &str) -> Option<Vec<u32>> {
        let mut path = Vec::new();
        let mut current = leaf;
        while current != root {
            if path.len() >= MAX_DEPTH {
                return None;
            }
            let (parent, index) = self.parent_of(current)?;
            path.push(index);
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut TypeDescriptor> {
        self.compiled = false;
        self.types.get_mut(name)
    }

    pub(crate) fn insert(&mut self, descriptor: TypeDescriptor) {
        self.compiled = false;
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// Resolve subtype links into the child -> parent lookup used while encoding.
    pub(crate) fn compile(&mut self) {
        self.parents.clear();
        for descriptor in self.types.values() {
            let mut seen = Vec::with_capacity(descriptor.members.len());
            for m in &descriptor.members {
                if seen.contains(&m.index) {
                    error!("{}: member index {} is used twice", descriptor.name, m.index);
                }
                seen.push(m.index);
            }
            if let Some(m) = descriptor.member_shadowing_subtypes() {
                error!(
                    "{}: member {} has index {} which collides with subtype tags from {}",
                    descriptor.name, m.name, m.index, SUBTYPE_INDEX_BASE
                );
            }
            for link in &descriptor.subtypes {
                self.parents
                    .insert(link.child.clone(), (link.parent.clone(), link.index));
            }
        }
        self.compiled = true;
        debug!(
            "Schema compiled: {} types, {} subtype links",
            self.types.len(),
            self.parents.len()
        );
    }
}

impl TypeDescriptor {
    pub(crate) fn new(name: impl Into<String>, construct: Constructor) -> Self {
        TypeDescriptor {
            name: name.into(),
            members: Vec::new(),
            base: None,
            subtypes: Vec::new(),
            ignore_unknown_subtypes: true,
            opaque: false,
            skipped: Vec::new(),
            construct,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in index order.
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn member_by_index(&self, index: u32) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.index == index)
    }

    /// Registered base type, if the declared base was known when this type was added.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn subtypes(&self) -> &[SubtypeLink] {
        &self.subtypes
    }

    pub fn subtype_by_index(&self, index: u32) -> Option<&SubtypeLink> {
        self.subtypes.iter().find(|l| l.index == index)
    }

    pub fn ignore_unknown_subtypes(&self) -> bool {
        self.ignore_unknown_subtypes
    }

    /// The opaque marker itself or a type below it. Opaque types have no properties.
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn skipped(&self) -> &[SkippedMember] {
        &self.skipped
    }

    /// Fresh default instance of this type.
    pub fn construct(&self) -> Box<dyn Schematic> {
        (self.construct)()
    }

    /// First member whose index reaches into the subtype tag range, when this type has subtypes.
    pub fn member_shadowing_subtypes(&self) -> Option<&MemberDescriptor> {
        if self.subtypes.is_empty() {
            return None;
        }
        self.members.iter().find(|m| m.index >= SUBTYPE_INDEX_BASE)
    }

    pub(crate) fn push_member(&mut self, member: MemberDescriptor) {
        self.members.push(member);
    }

    pub(crate) fn push_skipped(&mut self, skipped: SkippedMember) {
        self.skipped.push(skipped);
    }

    pub(crate) fn set_base(&mut self, base: impl Into<String>) {
        self.base = Some(base.into());
    }

    pub(crate) fn set_opaque(&mut self, opaque: bool) {
        self.opaque = opaque;
    }

    pub(crate) fn set_ignore_unknown_subtypes(&mut self, ignore: bool) {
        self.ignore_unknown_subtypes = ignore;
    }

    /// Links `child` below this type with the next free subtype index and returns it.
    pub(crate) fn link_subtype(&mut self, child: impl Into<String>) -> u32 {
        let index = SUBTYPE_INDEX_BASE + self.subtypes.len() as u32;
        self.subtypes.push(SubtypeLink {
            parent: self.name.clone(),
            child: child.into(),
            index,
        });
        index
    }
}
