use proc_macro2::TokenStream;
use proc_macro_error::abort;
use quote::{quote, ToTokens, TokenStreamExt};
use syn::{Attribute, DataStruct, Member, Path, Type};

/// Member as seen by the derive: what goes into `TypeInfo` and, when the value can be
/// encoded, an accessor arm in the `Schematic` impl.
pub struct StructMember {
    pub name: String,
    pub member: Member,
    pub property: bool,
    pub ty: ResolvedType,
}

pub enum ResolvedType {
    Named { path: String, dynamic: bool },
    Unresolved(String),
}

impl StructMember {
    /// Dynamic and unresolved members never reach a schema, so they get no accessor and
    /// their types are not required to be serde-compatible.
    pub fn is_encodable(&self) -> bool {
        matches!(self.ty, ResolvedType::Named { dynamic: false, .. })
    }

    pub fn info_ts(&self) -> TokenStream {
        let name = &self.name;
        let ty = match &self.ty {
            ResolvedType::Named { path, .. } => quote!(weave_base::MemberType::Named(#path.to_string())),
            ResolvedType::Unresolved(reason) => {
                quote!(weave_base::MemberType::Unresolved(#reason.to_string()))
            }
        };
        if self.property {
            quote!(info.properties.push(weave_base::MemberInfo::property(#name, #ty));)
        } else {
            quote!(info.fields.push(weave_base::MemberInfo::field(#name, #ty));)
        }
    }
}

pub fn collect_members(ds: DataStruct) -> Vec<StructMember> {
    let mut members = Vec::new();
    for (idx, f) in ds.fields.into_iter().enumerate() {
        let (name, member) = match f.ident {
            Some(ident) => (ident.to_string(), Member::Named(ident)),
            None => (idx.to_string(), Member::Unnamed(idx.into())),
        };
        let property = is_property(&f.attrs);
        let ty = resolve_type(&f.ty);
        members.push(StructMember {
            name,
            member,
            property,
            ty,
        });
    }
    members
}

pub fn type_info_body(base: &Option<Path>, members: &[StructMember]) -> TokenStream {
    let mut ts = quote!();
    if let Some(base) = base {
        ts.append_all(quote!(
            info.base = Some(<#base as weave_base::Reflect>::type_name().to_string());
        ));
    }
    for m in members {
        ts.append_all(m.info_ts());
    }
    ts
}

pub fn schematic_arms(members: &[StructMember]) -> (TokenStream, TokenStream) {
    let mut encode = quote!();
    let mut decode = quote!();
    for m in members.iter().filter(|m| m.is_encodable()) {
        let name = &m.name;
        let member = &m.member;
        encode.append_all(quote!(
            #name => Some(weave_base::codec::encode(&self.#member)),
        ));
        decode.append_all(quote!(
            #name => Some(weave_base::codec::decode(bytes).map(|v| self.#member = v)),
        ));
    }
    (encode, decode)
}

/// `#[weave(base = Path)]` on the type.
pub fn base_attr(attrs: &[Attribute]) -> Option<Path> {
    let mut base = None;
    for attr in attrs {
        if !attr.path().is_ident("weave") {
            continue;
        }
        let r = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("base") {
                base = Some(meta.value()?.parse::<Path>()?);
                Ok(())
            } else {
                Err(meta.error("expected `base = Type`"))
            }
        });
        if let Err(e) = r {
            abort!(e.span(), "{}", e);
        }
    }
    base
}

/// `#[weave(property)]` on a field.
fn is_property(attrs: &[Attribute]) -> bool {
    let mut property = false;
    for attr in attrs {
        if !attr.path().is_ident("weave") {
            continue;
        }
        let r = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("property") {
                property = true;
                Ok(())
            } else {
                Err(meta.error("expected `property`"))
            }
        });
        if let Err(e) = r {
            abort!(e.span(), "{}", e);
        }
    }
    property
}

fn resolve_type(ty: &Type) -> ResolvedType {
    match ty {
        Type::Path(p) if p.qself.is_none() => {
            let dynamic = p
                .path
                .segments
                .last()
                .map(|s| s.ident == "Dynamic")
                .unwrap_or(false);
            ResolvedType::Named {
                path: ty_to_str(ty),
                dynamic,
            }
        }
        Type::Array(_) | Type::Tuple(_) | Type::Paren(_) | Type::Group(_) => ResolvedType::Named {
            path: ty_to_str(ty),
            dynamic: false,
        },
        _ => ResolvedType::Unresolved(
            "only owned path, array and tuple types can be described".to_string(),
        ),
    }
}

fn ty_to_str(ty: &Type) -> String {
    let mut s = ty.to_token_stream().to_string();
    s.retain(|c| !c.is_whitespace());
    s
}
