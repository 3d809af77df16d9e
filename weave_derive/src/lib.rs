mod reflect;

use proc_macro::TokenStream;
use proc_macro_error::{abort, proc_macro_error};
use quote::quote;
use syn::spanned::Spanned;
use syn::{parse_macro_input, Data, DeriveInput};

/// Derives `weave_base::Reflect` and `weave_base::Schematic` for a struct.
///
/// * `#[weave(base = Path)]` on the struct declares its base type.
/// * `#[weave(property)]` on a field enumerates it in the property pass, after all fields.
///
/// The struct must be `Clone + Send + Sync + 'static`. Every member except `Dynamic` and
/// non-describable ones (references, trait objects, ...) must be
/// `serde::Serialize + serde::de::DeserializeOwned`.
#[proc_macro_error]
#[proc_macro_derive(Reflect, attributes(weave))]
pub fn reflect_fn(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    if input.generics.lt_token.is_some() {
        abort!(input.generics.span(), "Generics are not supported");
    }
    let base = reflect::base_attr(&input.attrs);
    let members = match input.data {
        Data::Struct(ds) => reflect::collect_members(ds),
        Data::Enum(_) => {
            abort!(
                input.ident.span(),
                "Enums are encoded as member values, derive serde traits for them instead"
            );
        }
        Data::Union(_) => {
            abort!(input.ident.span(), "Unions are not supported");
        }
    };

    let type_info_ts = reflect::type_info_body(&base, &members);
    let (encode_arms, decode_arms) = reflect::schematic_arms(&members);

    let ident = input.ident;
    let ident_str = ident.to_string();
    quote!(
        impl weave_base::Reflect for #ident {
            fn type_name() -> &'static str {
                #ident_str
            }

            #[allow(unused_mut)]
            fn type_info() -> weave_base::TypeInfo {
                let mut info = weave_base::TypeInfo::new(#ident_str);
                #type_info_ts
                info
            }
        }

        impl weave_base::Schematic for #ident {
            fn type_name(&self) -> &'static str {
                #ident_str
            }

            #[allow(unreachable_code, unused_variables)]
            fn encode_member(&self, name: &str) -> Option<Result<Vec<u8>, weave_base::CodecError>> {
                match name {
                    #encode_arms
                    _ => None,
                }
            }

            #[allow(unreachable_code, unused_variables)]
            fn decode_member(
                &mut self,
                name: &str,
                bytes: &[u8],
            ) -> Option<Result<(), weave_base::CodecError>> {
                match name {
                    #decode_arms
                    _ => None,
                }
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
                self
            }
        }
    )
    .into()
}
