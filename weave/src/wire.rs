//! Schema-driven binary records.
//!
//! A record is a varint length followed by a message. A message is a run of
//! `varint tag | varint length | bytes` entries, where the tag is either a member index
//! (bytes are the member value) or a subtype index (bytes are the nested message of that
//! subtype).

use crate::consts::{MAX_DEPTH, SUBTYPE_INDEX_BASE};
use crate::error::WireError;
use crate::schema::{Schema, TypeDescriptor};
use log::trace;
use weave_base::Schematic;

/// Maximum encoded length of a u32.
pub const MAX_VARINT_LEN: usize = 5;

pub fn write_varint(buf: &mut Vec<u8>, mut value: u32) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Reads a varint from the front of `input`, advancing it.
pub fn read_varint(input: &mut &[u8]) -> Result<u32, WireError> {
    let mut value: u32 = 0;
    for i in 0..MAX_VARINT_LEN {
        let Some((&byte, rest)) = input.split_first() else {
            return Err(WireError::Truncated);
        };
        *input = rest;
        let bits = (byte & 0x7F) as u32;
        if i == MAX_VARINT_LEN - 1 && bits > 0x0F {
            return Err(WireError::VarintOverflow);
        }
        value |= bits << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(WireError::VarintOverflow)
}

fn write_entry(buf: &mut Vec<u8>, tag: u32, bytes: &[u8]) {
    write_varint(buf, tag);
    write_varint(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

fn read_entries(mut input: &[u8]) -> Result<Vec<(u32, &[u8])>, WireError> {
    let mut entries = Vec::new();
    while !input.is_empty() {
        let tag = read_varint(&mut input)?;
        let len = read_varint(&mut input)? as usize;
        if input.len() < len {
            return Err(WireError::Truncated);
        }
        let (bytes, rest) = input.split_at(len);
        entries.push((tag, bytes));
        input = rest;
    }
    Ok(entries)
}

/// Encode `value` as a record of type `ty`, which is either the value's own type or a
/// registered base of it.
pub fn encode_record(schema: &Schema, ty: &str, value: &dyn Schematic) -> Result<Vec<u8>, WireError> {
    if !schema.contains(ty) {
        return Err(WireError::UnknownType(ty.to_string()));
    }
    let concrete = value.type_name();
    let descriptor = schema
        .get(concrete)
        .ok_or_else(|| WireError::UnknownType(concrete.to_string()))?;
    let path = schema
        .subtype_path(ty, concrete)
        .ok_or_else(|| WireError::TypeMismatch {
            expected: ty.to_string(),
            found: concrete.to_string(),
        })?;

    let mut message = encode_members(descriptor, value)?;
    for index in path.iter().rev() {
        let mut outer = Vec::with_capacity(message.len() + 2 * MAX_VARINT_LEN);
        write_entry(&mut outer, *index, &message);
        message = outer;
    }

    let mut record = Vec::with_capacity(message.len() + MAX_VARINT_LEN);
    write_varint(&mut record, message.len() as u32);
    record.extend_from_slice(&message);
    trace!("Encoded {concrete} as {ty}: {} bytes", record.len());
    Ok(record)
}

fn encode_members(descriptor: &TypeDescriptor, value: &dyn Schematic) -> Result<Vec<u8>, WireError> {
    let mut message = Vec::new();
    for member in descriptor.members() {
        let bytes = value
            .encode_member(&member.name)
            .ok_or_else(|| WireError::MissingMember {
                ty: descriptor.name().to_string(),
                member: member.name.clone(),
            })?
            .map_err(|source| WireError::Member {
                ty: descriptor.name().to_string(),
                member: member.name.clone(),
                source,
            })?;
        write_entry(&mut message, member.index, &bytes);
    }
    Ok(message)
}

/// Decode a record of type `ty`. The result is of the most derived type found in the
/// record; `into`, when given, is filled instead of a fresh instance and must be of that type.
/// Bytes after the record are ignored.
pub fn decode_record(
    schema: &Schema,
    ty: &str,
    mut input: &[u8],
    into: Option<Box<dyn Schematic>>,
) -> Result<Box<dyn Schematic>, WireError> {
    if !schema.contains(ty) {
        return Err(WireError::UnknownType(ty.to_string()));
    }
    let len = read_varint(&mut input)? as usize;
    if input.len() < len {
        return Err(WireError::Truncated);
    }
    decode_message(schema, ty, &input[..len], into, 0)
}

fn decode_message(
    schema: &Schema,
    ty: &str,
    message: &[u8],
    into: Option<Box<dyn Schematic>>,
    depth: usize,
) -> Result<Box<dyn Schematic>, WireError> {
    if depth > MAX_DEPTH {
        return Err(WireError::TooDeep(MAX_DEPTH));
    }
    let descriptor = schema
        .get(ty)
        .ok_or_else(|| WireError::UnknownType(ty.to_string()))?;
    let entries = read_entries(message)?;

    for (tag, bytes) in &entries {
        if descriptor.member_by_index(*tag).is_some() {
            continue;
        }
        if let Some(link) = descriptor.subtype_by_index(*tag) {
            return decode_message(schema, &link.child, bytes, into, depth + 1);
        }
        if *tag >= SUBTYPE_INDEX_BASE {
            if descriptor.ignore_unknown_subtypes() {
                trace!("Skipping unknown subtype tag {tag} under {ty}");
            } else {
                return Err(WireError::UnknownSubtype {
                    ty: ty.to_string(),
                    tag: *tag,
                });
            }
        }
    }

    let mut value = match into {
        Some(value) if value.type_name() == ty => value,
        Some(value) => {
            return Err(WireError::TypeMismatch {
                expected: ty.to_string(),
                found: value.type_name().to_string(),
            })
        }
        None => descriptor.construct(),
    };
    for (tag, bytes) in entries {
        let Some(member) = descriptor.member_by_index(tag) else {
            continue;
        };
        value
            .decode_member(&member.name, bytes)
            .ok_or_else(|| WireError::MissingMember {
                ty: ty.to_string(),
                member: member.name.clone(),
            })?
            .map_err(|source| WireError::Member {
                ty: ty.to_string(),
                member: member.name.clone(),
                source,
            })?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{Transform, Vector3};
    use crate::catalog::TypeRegistration;
    use crate::registry::SchemaRegistry;
    use weave_derive::Reflect;

    #[derive(Reflect, Clone, Default, Debug, PartialEq)]
    struct Shape {
        name: String,
    }

    #[derive(Reflect, Clone, Default, Debug, PartialEq)]
    #[weave(base = Shape)]
    struct Circle {
        radius: f32,
    }

    fn schema() -> Schema {
        SchemaRegistry::build(&[
            TypeRegistration::of::<Vector3>(),
            TypeRegistration::of::<Transform>(),
            TypeRegistration::of::<Shape>(),
            TypeRegistration::of::<Circle>(),
        ])
    }

    #[test]
    fn varint_boundaries() {
        for (value, len) in [(0u32, 1usize), (127, 1), (128, 2), (16_383, 2), (16_384, 3), (u32::MAX, 5)] {
            let mut buf = Vec::new();
            write_varint(&mut buf, value);
            assert_eq!(buf.len(), len);
            let mut input = buf.as_slice();
            assert_eq!(read_varint(&mut input).unwrap(), value);
            assert!(input.is_empty());
        }
    }

    #[test]
    fn varint_overflow() {
        let mut input: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        assert!(matches!(read_varint(&mut input), Err(WireError::VarintOverflow)));
        let mut input: &[u8] = &[0x80];
        assert!(matches!(read_varint(&mut input), Err(WireError::Truncated)));
    }

    #[test]
    fn member_entries_use_schema_indices() {
        let schema = schema();
        let v = Vector3 { x: 1.0, y: 2.0, z: 3.0 };
        let record = encode_record(&schema, "Vector3", &v).unwrap();
        let mut input = record.as_slice();
        let len = read_varint(&mut input).unwrap() as usize;
        assert_eq!(len, input.len());
        let tags: Vec<u32> = read_entries(input).unwrap().iter().map(|(t, _)| *t).collect();
        assert_eq!(tags, [1, 2, 3]);

        let back = decode_record(&schema, "Vector3", &record, None).unwrap();
        assert_eq!(back.downcast_ref::<Vector3>(), Some(&v));
    }

    #[test]
    fn subtype_through_base() {
        let schema = schema();
        let c = Circle { radius: 2.5 };
        let record = encode_record(&schema, "Shape", &c).unwrap();
        let mut input = record.as_slice();
        read_varint(&mut input).unwrap();
        let entries = read_entries(input).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, SUBTYPE_INDEX_BASE);

        let back = decode_record(&schema, "Shape", &record, None).unwrap();
        assert_eq!(back.downcast_ref::<Circle>(), Some(&c));
    }

    #[test]
    fn unrelated_type_is_mismatch() {
        let schema = schema();
        let r = encode_record(&schema, "Shape", &Vector3::default());
        assert!(matches!(r, Err(WireError::TypeMismatch { .. })));
        let r = encode_record(&schema, "Nope", &Vector3::default());
        assert!(matches!(r, Err(WireError::UnknownType(_))));
    }

    #[test]
    fn into_of_wrong_type() {
        let schema = schema();
        let record = encode_record(&schema, "Vector3", &Vector3::default()).unwrap();
        let r = decode_record(&schema, "Vector3", &record, Some(Box::new(Shape::default())));
        assert!(matches!(r, Err(WireError::TypeMismatch { .. })));
    }

    #[test]
    fn truncated_record() {
        let schema = schema();
        let record = encode_record(&schema, "Transform", &Transform::default()).unwrap();
        let r = decode_record(&schema, "Transform", &record[..record.len() - 1], None);
        assert!(matches!(r, Err(WireError::Truncated)));
    }

    #[test]
    fn unknown_subtype_tolerance() {
        let schema = schema();
        let mut message = Vec::new();
        write_entry(&mut message, SUBTYPE_INDEX_BASE + 7, &[]);
        let mut record = Vec::new();
        write_varint(&mut record, message.len() as u32);
        record.extend_from_slice(&message);
        assert!(decode_record(&schema, "Shape", &record, None).is_ok());

        let registry = SchemaRegistry::new(&[TypeRegistration::of::<Vector3>()]);
        registry.add_type(&TypeRegistration::of::<Shape>());
        let strict = registry.current().unwrap();
        let r = decode_record(&strict, "Shape", &record, None);
        assert!(matches!(r, Err(WireError::UnknownSubtype { .. })));
    }
}
