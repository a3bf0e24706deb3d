//! `#[derive(WireCodec)]`: turns a `#[wire(...)]`-annotated struct into an
//! implementation of `wire_codec`'s `HasLayout` + `WireCodec` (+, optionally,
//! `Specialise`) traits.
//!
//! Each named field carries exactly one shape directive (`big`, `little`,
//! `bits`, `bytes`, `ascii`, `len_with`, `terminator`, `remaining`, `child`,
//! `count`, or `count_with`), and may additionally carry a
//! `fixed = [..]` constant-value constraint. A `child` field whose type
//! implements `Specialise` may add `specialised` to decode through it,
//! storing a `Specialised<Base, Variant>` instead of a bare `Base`. The
//! struct itself may carry `specialise_with = "method"` and
//! `variant = "OtherType"` to opt into two-pass specialisation.

#![recursion_limit = "256"]
extern crate proc_macro;

use crate::proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, FieldsNamed};

#[derive(Default)]
struct FieldAttr {
    big: Option<u8>,
    little: Option<u8>,
    bits: Option<u8>,
    bytes: Option<usize>,
    ascii: Option<usize>,
    len_with: Option<String>,
    terminator: Option<u8>,
    remaining: bool,
    child: bool,
    specialised: bool,
    child_count: Option<usize>,
    child_count_with: Option<String>,
    fixed: Option<Vec<u8>>,
}

fn parse_field_attr(attrs: &[syn::Attribute]) -> FieldAttr {
    let mut out = FieldAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("wire") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("big") {
                out.big = Some(meta.value()?.parse::<syn::LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("little") {
                out.little = Some(meta.value()?.parse::<syn::LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("bits") {
                out.bits = Some(meta.value()?.parse::<syn::LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("bytes") {
                out.bytes = Some(meta.value()?.parse::<syn::LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("ascii") {
                out.ascii = Some(meta.value()?.parse::<syn::LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("len_with") {
                out.len_with = Some(meta.value()?.parse::<syn::LitStr>()?.value());
            } else if meta.path.is_ident("terminator") {
                out.terminator = Some(meta.value()?.parse::<syn::LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("remaining") {
                out.remaining = true;
            } else if meta.path.is_ident("child") {
                out.child = true;
            } else if meta.path.is_ident("specialised") {
                out.specialised = true;
            } else if meta.path.is_ident("count") {
                out.child_count = Some(meta.value()?.parse::<syn::LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("count_with") {
                out.child_count_with = Some(meta.value()?.parse::<syn::LitStr>()?.value());
            } else if meta.path.is_ident("fixed") {
                let content;
                syn::bracketed!(content in meta.input);
                let items =
                    content.parse_terminated(syn::LitInt::parse, syn::Token![,])?;
                out.fixed = Some(
                    items
                        .iter()
                        .map(|lit| lit.base10_parse::<u8>())
                        .collect::<syn::Result<Vec<u8>>>()?,
                );
            } else {
                return Err(meta.error("unrecognised #[wire(...)] directive"));
            }
            Ok(())
        })
        .expect("invalid #[wire(...)] attribute");
    }
    out
}

#[derive(Default)]
struct StructAttr {
    specialise_with: Option<String>,
    variant: Option<String>,
}

fn parse_struct_attr(attrs: &[syn::Attribute]) -> StructAttr {
    let mut out = StructAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("wire") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("specialise_with") {
                out.specialise_with = Some(meta.value()?.parse::<syn::LitStr>()?.value());
            } else if meta.path.is_ident("variant") {
                out.variant = Some(meta.value()?.parse::<syn::LitStr>()?.value());
            } else {
                return Err(meta.error("unrecognised struct-level #[wire(...)] directive"));
            }
            Ok(())
        })
        .expect("invalid struct-level #[wire(...)] attribute");
    }
    out
}

/// Extracts `T` from a field declared as `Vec<T>`; panics (as a macro
/// compile-time error) for any other field type used with a sequence
/// directive.
fn vec_element_type(ty: &syn::Type) -> syn::Type {
    if let syn::Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Vec" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                        return inner.clone();
                    }
                }
            }
        }
    }
    panic!("field with a sequence directive must be declared as Vec<T>");
}

/// Extracts `(Base, Variant)` from a field declared as `Specialised<Base,
/// Variant>`; panics (as a macro compile-time error) for any other field type
/// used with `#[wire(child, specialised)]`.
fn specialised_type_args(ty: &syn::Type) -> (syn::Type, syn::Type) {
    if let syn::Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Specialised" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    let mut type_args = args.args.iter().filter_map(|arg| match arg {
                        syn::GenericArgument::Type(t) => Some(t.clone()),
                        _ => None,
                    });
                    if let (Some(base), Some(variant)) = (type_args.next(), type_args.next()) {
                        return (base, variant);
                    }
                }
            }
        }
    }
    panic!("a `#[wire(child, specialised)]` field must be declared as Specialised<Base, Variant>");
}

/// Emits the literal-byte encode statement for a `fixed = [..]` constraint:
/// the declared constant is written exactly as given, reversed when the
/// field's own directive is little-endian so the bytes land on the wire in
/// the order the constant names them.
fn fixed_write_stmt(bytes: &[u8], reverse: bool) -> proc_macro2::TokenStream {
    let ordered: Vec<u8> = if reverse { bytes.iter().rev().copied().collect() } else { bytes.to_vec() };
    quote! { #(writer.push_byte(#ordered);)* }
}

struct PlannedField {
    order: usize,
    ident: syn::Ident,
    directive_tokens: proc_macro2::TokenStream,
    fixed_tokens: proc_macro2::TokenStream,
    decode_stmt: proc_macro2::TokenStream,
    encode_stmt: proc_macro2::TokenStream,
    describe_push: proc_macro2::TokenStream,
}

fn plan_field(order: usize, field: &syn::Field) -> PlannedField {
    let ident = field.ident.clone().expect("wire_codec requires named fields");
    let name_str = ident.to_string();
    let ty = &field.ty;
    let attr = parse_field_attr(&field.attrs);

    let fixed_tokens = match &attr.fixed {
        Some(bytes) => quote! { Some(wire_codec::directive::FixedValue(vec![#(#bytes),*])) },
        None => quote! { None },
    };

    if let Some(bytes) = attr.big {
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::BigEndianInt { bytes: #bytes } };
        let decode_stmt = quote! {
            value.#ident = wire_codec::decode::decode_big_endian(reader, #bytes) as #ty;
        };
        let encode_stmt = match &attr.fixed {
            Some(fixed_bytes) => fixed_write_stmt(fixed_bytes, false),
            None => quote! {
                wire_codec::encode::encode_big_endian(writer, self.#ident as u64, #bytes);
            },
        };
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::Int { bits: #bytes * 8, value: self.#ident as u64 }));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    if let Some(bytes) = attr.little {
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::LittleEndianInt { bytes: #bytes } };
        let decode_stmt = quote! {
            value.#ident = wire_codec::decode::decode_little_endian(reader, #bytes) as #ty;
        };
        let encode_stmt = match &attr.fixed {
            Some(fixed_bytes) => fixed_write_stmt(fixed_bytes, true),
            None => quote! {
                wire_codec::encode::encode_little_endian(writer, self.#ident as u64, #bytes);
            },
        };
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::Int { bits: #bytes * 8, value: self.#ident as u64 }));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    if let Some(bits) = attr.bits {
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::PartialBits { bits: #bits } };
        let decode_stmt = quote! {
            value.#ident = wire_codec::decode::decode_partial_bits(reader, #bits) as #ty;
        };
        let encode_stmt = quote! {
            wire_codec::encode::encode_partial_bits(writer, self.#ident as u64, #bits);
        };
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::Int { bits: #bits, value: self.#ident as u64 }));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    if let Some(bytes) = attr.bytes {
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::ByteArrayFixed { bytes: #bytes } };
        let decode_stmt = quote! {
            value.#ident = wire_codec::decode::decode_fixed_bytes(reader, #bytes);
        };
        let encode_stmt = match &attr.fixed {
            Some(fixed_bytes) => fixed_write_stmt(fixed_bytes, false),
            None => quote! {
                wire_codec::encode::encode_fixed_bytes(writer, &self.#ident, #bytes);
            },
        };
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::Bytes(self.#ident.clone())));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    if let Some(bytes) = attr.ascii {
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::AsciiStringFixed { bytes: #bytes } };
        let decode_stmt = quote! {
            value.#ident = wire_codec::decode::decode_ascii_fixed(reader, #bytes);
        };
        let encode_stmt = match &attr.fixed {
            Some(fixed_bytes) => fixed_write_stmt(fixed_bytes, false),
            None => quote! {
                wire_codec::encode::encode_ascii_fixed(writer, &self.#ident, #bytes);
            },
        };
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::Text(self.#ident.clone())));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    if let Some(len_fn) = &attr.len_with {
        let len_fn_ident = syn::Ident::new(len_fn, proc_macro2::Span::call_site());
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::ByteArrayVariable { length_source: #len_fn } };
        let decode_stmt = quote! {
            let __len = value.#len_fn_ident();
            value.#ident = wire_codec::decode::decode_variable_bytes(reader, __len);
        };
        let encode_stmt = quote! {
            wire_codec::encode::encode_variable_bytes(writer, #name_str, &self.#ident, self.#len_fn_ident())?;
        };
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::Bytes(self.#ident.clone())));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    if let Some(stop) = attr.terminator {
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::ByteArrayTerminated { stop: #stop } };
        let decode_stmt = quote! {
            value.#ident = wire_codec::decode::decode_terminated_bytes(reader, #stop);
        };
        let encode_stmt = quote! {
            wire_codec::encode::encode_terminated_bytes(writer, &self.#ident, #stop);
        };
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::Bytes(self.#ident.clone())));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    if attr.remaining {
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::RemainingBytes };
        let decode_stmt = quote! {
            value.#ident = wire_codec::decode::decode_remaining(reader);
        };
        let encode_stmt = quote! {
            wire_codec::encode::encode_remaining(writer, &self.#ident);
        };
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::Bytes(self.#ident.clone())));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    if attr.child && attr.specialised {
        let (base_ty, _variant_ty) = specialised_type_args(ty);
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::ChildSpecialised };
        let decode_stmt = quote! {
            value.#ident = wire_codec::decode::decode_specialised::<#base_ty>(reader);
        };
        let encode_stmt = quote! {
            wire_codec::encode::encode_child_specialised(writer, &self.#ident)?;
        };
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::Nested(match &self.#ident {
                wire_codec::Specialised::Base(base) => base.describe_fields(),
                wire_codec::Specialised::Variant(variant) => variant.describe_fields(),
            })));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    if attr.child {
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::Child };
        let decode_stmt = quote! {
            value.#ident = wire_codec::decode::decode_child::<#ty>(reader);
        };
        let encode_stmt = quote! {
            wire_codec::encode::encode_child(writer, &self.#ident)?;
        };
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::Nested(self.#ident.describe_fields())));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    if let Some(count) = attr.child_count {
        let elem_ty = vec_element_type(ty);
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::ChildFixedRepeat { count: #count } };
        let decode_stmt = quote! {
            value.#ident = wire_codec::decode::decode_child_fixed_repeat::<#elem_ty>(reader, #count);
        };
        let encode_stmt = quote! {
            wire_codec::encode::encode_child_fixed_repeat(writer, #name_str, &self.#ident, #count)?;
        };
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::NestedSeq(
                self.#ident.iter().map(|c| c.describe_fields()).collect()
            )));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    if let Some(count_fn) = &attr.child_count_with {
        let elem_ty = vec_element_type(ty);
        let count_fn_ident = syn::Ident::new(count_fn, proc_macro2::Span::call_site());
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::ChildVariableRepeat { count_source: #count_fn } };
        let decode_stmt = quote! {
            let __count = value.#count_fn_ident();
            value.#ident = wire_codec::decode::decode_child_variable_repeat::<#elem_ty>(reader, __count);
        };
        let encode_stmt = quote! {
            wire_codec::encode::encode_child_variable_repeat(writer, #name_str, &self.#ident, self.#count_fn_ident())?;
        };
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::NestedSeq(
                self.#ident.iter().map(|c| c.describe_fields()).collect()
            )));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    if let Some(bytes) = attr.fixed.clone() {
        // A bare `fixed = [..]` with no other directive implies a big-endian
        // integer whose width is the constant's length (the common "magic
        // number" case).
        let n = bytes.len() as u8;
        let directive_tokens = quote! { wire_codec::directive::FieldDirective::BigEndianInt { bytes: #n } };
        let decode_stmt = quote! {
            value.#ident = wire_codec::decode::decode_big_endian(reader, #n) as #ty;
        };
        let encode_stmt = fixed_write_stmt(&bytes, false);
        let describe_push = quote! {
            fields.push((#name_str, wire_codec::DescribedValue::Int { bits: #n * 8, value: self.#ident as u64 }));
        };
        return PlannedField { order, ident, directive_tokens, fixed_tokens, decode_stmt, encode_stmt, describe_push };
    }

    panic!("field `{name_str}` has no recognised #[wire(...)] directive");
}

#[proc_macro_derive(WireCodec, attributes(wire))]
pub fn wire_codec_derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("failed to parse derive input");
    let name = &ast.ident;
    let type_name = name.to_string();
    let struct_attr = parse_struct_attr(&ast.attrs);

    let fields = match ast.data {
        Data::Struct(syn::DataStruct { fields: Fields::Named(FieldsNamed { named, .. }), .. }) => named,
        _ => panic!("#[derive(WireCodec)] only supports structs with named fields"),
    };

    let planned: Vec<PlannedField> = fields.iter().enumerate().map(|(i, f)| plan_field(i, f)).collect();

    let idents: Vec<&syn::Ident> = planned.iter().map(|p| &p.ident).collect();
    let names: Vec<String> = idents.iter().map(|i| i.to_string()).collect();
    let orders: Vec<usize> = planned.iter().map(|p| p.order).collect();
    let directive_tokens: Vec<&proc_macro2::TokenStream> = planned.iter().map(|p| &p.directive_tokens).collect();
    let fixed_tokens: Vec<&proc_macro2::TokenStream> = planned.iter().map(|p| &p.fixed_tokens).collect();
    let decode_stmts: Vec<&proc_macro2::TokenStream> = planned.iter().map(|p| &p.decode_stmt).collect();
    let encode_stmts: Vec<&proc_macro2::TokenStream> = planned.iter().map(|p| &p.encode_stmt).collect();
    let describe_pushes: Vec<&proc_macro2::TokenStream> = planned.iter().map(|p| &p.describe_push).collect();

    let specialise_with_tokens = match &struct_attr.specialise_with {
        Some(method) => quote! { Some(#method) },
        None => quote! { None },
    };

    let has_layout_impl = quote! {
        impl wire_codec::directive::HasLayout for #name {
            fn build_spec() -> wire_codec::directive::StructSpec {
                wire_codec::directive::StructSpec {
                    type_name: #type_name,
                    fields: vec![
                        #(
                            wire_codec::directive::FieldSpec {
                                order: #orders,
                                name: #names,
                                directive: #directive_tokens,
                                fixed: #fixed_tokens,
                            }
                        ),*
                    ],
                    specialise_with: #specialise_with_tokens,
                }
            }
        }
    };

    let wire_codec_impl = quote! {
        impl wire_codec::WireCodec for #name {
            fn decode_fields(reader: &mut wire_codec::BitReader) -> Self {
                wire_codec::layout_of::<Self>();
                let mut value = Self::default();
                #(#decode_stmts)*
                value
            }

            fn encode_fields(&self, writer: &mut wire_codec::BitWriter) -> wire_codec::CodecResult<()> {
                wire_codec::layout_of::<Self>();
                #(#encode_stmts)*
                Ok(())
            }

            fn describe_fields(&self) -> Vec<(&'static str, wire_codec::DescribedValue)> {
                let mut fields: Vec<(&'static str, wire_codec::DescribedValue)> = Vec::new();
                #(#describe_pushes)*
                fields
            }
        }
    };

    let specialise_impl = match (&struct_attr.specialise_with, &struct_attr.variant) {
        (Some(method), Some(variant_name)) => {
            let method_ident = syn::Ident::new(method, proc_macro2::Span::call_site());
            let variant_ident = syn::Ident::new(variant_name, proc_macro2::Span::call_site());
            quote! {
                impl wire_codec::Specialise for #name {
                    type Variant = #variant_ident;
                    fn should_specialise(&self) -> bool {
                        self.#method_ident()
                    }
                }
            }
        }
        _ => quote! {},
    };

    let gen = quote! {
        #has_layout_impl
        #wire_codec_impl
        #specialise_impl
    };
    gen.into()
}
